//! Project commands.

use anyhow::{Result, bail};
use colored::Colorize;

use super::{confirm, ensure_applied, user_error, with_org};
use crate::cli::{ProjectAction, ProjectCommand};
use crate::config::Config;
use crate::presenter;

pub async fn execute(cmd: ProjectCommand, config: &Config) -> Result<()> {
    match cmd.action {
        ProjectAction::List => list(config).await,
        ProjectAction::Create { name, description } => create(&name, &description, config).await,
        ProjectAction::Delete { project_id, yes } => delete(&project_id, yes, config).await,
    }
}

async fn list(config: &Config) -> Result<()> {
    let workspace = with_org(config).await?;
    workspace.load_projects().await.map_err(user_error)?;
    presenter::print_projects(&workspace.view()?);
    Ok(())
}

async fn create(name: &str, description: &str, config: &Config) -> Result<()> {
    if name.trim().is_empty() {
        bail!("Project name cannot be empty");
    }
    let workspace = with_org(config).await?;
    if !workspace.view()?.permissions.manage_projects {
        bail!("Only owners and admins can create projects.");
    }

    workspace
        .create_project(name, description)
        .await
        .map_err(user_error)?;
    println!("{} Project {} created.", "✓".green(), name.trim().cyan());
    presenter::print_projects(&workspace.view()?);
    Ok(())
}

async fn delete(project_id: &str, yes: bool, config: &Config) -> Result<()> {
    let workspace = with_org(config).await?;
    if !workspace.view()?.permissions.manage_projects {
        bail!("Only owners and admins can delete projects.");
    }
    if !confirm("This will delete the project and its tasks. Continue?", yes)? {
        return Ok(());
    }

    let applied = workspace.delete_project(project_id).await?;
    ensure_applied(applied, "Project deletion")
}
