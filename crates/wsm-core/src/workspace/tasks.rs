use super::{Collection, TASKS_PATH, Workspace};
use crate::client::RequestOptions;
use crate::error::Result;
use crate::mutation::{InFlight, MutationOutcome, Pending};
use crate::types::{CreateTaskRequest, Task, TaskStatus, UpdateTaskStatusRequest};
use tracing::{debug, info};

const STATUS_FAILED: &str = "Unable to update status.";

impl Workspace {
    /// Create a task in a project and reload the list.
    pub async fn create_task(&self, title: &str, project_id: &str) -> Result<()> {
        self.require_org()?;
        let body = CreateTaskRequest {
            title: title.trim().to_string(),
            project: project_id.to_string(),
        };
        self.gateway
            .request(TASKS_PATH, RequestOptions::post(&body)?)
            .await?
            .into_result("Unable to create task.")?;
        info!("Created task {}", body.title);
        self.reload(Collection::Tasks).await?;
        Ok(())
    }

    /// Delete a task and reload the list. Returns `false` after notifying
    /// when the API refuses.
    pub async fn delete_task(&self, task_id: &str) -> Result<bool> {
        let path = format!("{}{}/", TASKS_PATH, task_id);
        if let Err(e) = self.send_delete(&path, "Unable to delete task.").await {
            return self.report(e);
        }

        info!("Deleted task {}", task_id);
        self.refresh_collection(Collection::Tasks).await;
        self.notify("Task deleted.");
        Ok(true)
    }

    /// Optimistically move a task to `status`.
    ///
    /// The new status is shown while the request is in flight and replaced
    /// by the server's value once it answers. On failure the previous status
    /// comes back and the error is notified. While one update of a task is
    /// in flight, further updates of it are skipped.
    pub async fn update_task_status(&self, task_id: &str, status: TaskStatus) -> Result<MutationOutcome<Task>> {
        let Some(guard) = InFlight::acquire(self.state(), task_id)? else {
            return Ok(MutationOutcome::Skipped);
        };

        let previous = self.set_task_status(task_id, status)?;
        let pending = Pending::new(previous.unwrap_or_default());
        self.render();

        let outcome = match self.send_task_status(task_id, status).await {
            Ok(task) => {
                debug!("Task {} is now {}", task_id, task.status);
                self.set_task_status(task_id, task.status)?;
                pending.commit(task)
            }
            Err(e) => {
                let message = e.user_message();
                let (previous, outcome) = pending.roll_back(message.as_str());
                debug!("Rolling task {} back to {}: {}", task_id, previous, e);
                self.set_task_status(task_id, previous)?;
                self.notify(&message);
                outcome
            }
        };

        drop(guard);
        self.render();
        Ok(outcome)
    }

    async fn send_task_status(&self, task_id: &str, status: TaskStatus) -> Result<Task> {
        let body = UpdateTaskStatusRequest { status: status.wire() };
        self.gateway
            .request(&format!("{}{}/status/", TASKS_PATH, task_id), RequestOptions::patch(&body)?)
            .await?
            .parse(STATUS_FAILED)
    }

    /// Set the cached status, returning the one it replaced.
    fn set_task_status(&self, task_id: &str, status: TaskStatus) -> Result<Option<TaskStatus>> {
        self.state().update(|c| {
            c.tasks
                .iter_mut()
                .find(|t| t.id == task_id)
                .map(|t| std::mem::replace(&mut t.status, status))
        })
    }
}
