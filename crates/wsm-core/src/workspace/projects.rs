use super::{Collection, PROJECTS_PATH, Workspace};
use crate::client::RequestOptions;
use crate::error::Result;
use crate::types::CreateProjectRequest;
use tracing::info;

impl Workspace {
    /// Create a project and reload the list.
    pub async fn create_project(&self, name: &str, description: &str) -> Result<()> {
        self.require_org()?;
        let body = CreateProjectRequest {
            name: name.trim().to_string(),
            description: description.trim().to_string(),
        };
        self.gateway
            .request(PROJECTS_PATH, RequestOptions::post(&body)?)
            .await?
            .into_result("Unable to create project.")?;
        info!("Created project {}", body.name);
        self.reload(Collection::Projects).await?;
        Ok(())
    }

    /// Delete a project, then reload projects and tasks.
    ///
    /// The task list is reloaded whether or not the project had tasks.
    /// Returns `false` after notifying when the API refuses.
    pub async fn delete_project(&self, project_id: &str) -> Result<bool> {
        let path = format!("{}{}/", PROJECTS_PATH, project_id);
        if let Err(e) = self.send_delete(&path, "Unable to delete project.").await {
            return self.report(e);
        }

        info!("Deleted project {}", project_id);
        self.refresh_collection(Collection::Projects).await;
        self.refresh_collection(Collection::Tasks).await;
        self.notify("Project deleted.");
        Ok(true)
    }
}
