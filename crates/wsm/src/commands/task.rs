//! Task commands.
//!
//! Status changes are optimistic: the new status shows immediately and is
//! rolled back if the API refuses it.

use anyhow::{Result, bail};
use colored::Colorize;
use wsm_core::MutationOutcome;
use wsm_core::types::TaskStatus;

use super::{confirm, ensure_applied, report_reload, user_error, with_org};
use crate::cli::{TaskAction, TaskCommand};
use crate::config::Config;
use crate::presenter;

pub async fn execute(cmd: TaskCommand, config: &Config) -> Result<()> {
    match cmd.action {
        TaskAction::List { status } => list(status, config).await,
        TaskAction::Create { title, project } => create(&title, &project, config).await,
        TaskAction::Status { task_id, status } => update_status(&task_id, status, config).await,
        TaskAction::Delete { task_id, yes } => delete(&task_id, yes, config).await,
    }
}

async fn list(only: Option<TaskStatus>, config: &Config) -> Result<()> {
    let workspace = with_org(config).await?;
    // Project names label the task cards.
    report_reload(&workspace.reload_all().await);
    presenter::print_tasks(&workspace.view()?, only);
    Ok(())
}

async fn create(title: &str, project_id: &str, config: &Config) -> Result<()> {
    if title.trim().is_empty() {
        bail!("Task title cannot be empty");
    }
    let workspace = with_org(config).await?;
    if !workspace.view()?.permissions.create_tasks {
        bail!("Viewers cannot create tasks.");
    }

    workspace
        .create_task(title, project_id)
        .await
        .map_err(user_error)?;
    println!("{} Task {} created.", "✓".green(), title.trim().cyan());
    Ok(())
}

async fn update_status(task_id: &str, status: TaskStatus, config: &Config) -> Result<()> {
    let workspace = with_org(config).await?;
    workspace.load_tasks().await.map_err(user_error)?;

    match workspace.update_task_status(task_id, status).await? {
        MutationOutcome::Committed(task) => {
            println!(
                "{} {} is now {}",
                "✓".green(),
                task.title.bold(),
                task.status.label().cyan()
            );
        }
        // The reason was already shown as a notification.
        MutationOutcome::RolledBack { .. } => bail!("Status of {} left unchanged.", task_id),
        MutationOutcome::Skipped => {
            println!("{} An update of {} is already in flight.", "⚠".yellow(), task_id);
        }
    }
    Ok(())
}

async fn delete(task_id: &str, yes: bool, config: &Config) -> Result<()> {
    let workspace = with_org(config).await?;
    if !workspace.view()?.permissions.delete_tasks {
        bail!("Only owners and admins can delete tasks.");
    }
    if !confirm("This task will be permanently removed. Continue?", yes)? {
        return Ok(());
    }

    let applied = workspace.delete_task(task_id).await?;
    ensure_applied(applied, "Task deletion")
}
