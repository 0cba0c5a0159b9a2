//! Command implementations for wsm CLI.
//!
//! Each submodule implements the logic for a command group.

pub mod activity;
pub mod auth;
pub mod config;
pub mod member;
pub mod org;
pub mod project;
pub mod status;
pub mod task;

use anyhow::{Context, Result, bail};
use colored::Colorize;
use dialoguer::Confirm;
use std::sync::Arc;
use wsm_core::session::FileStorage;
use wsm_core::workspace::ReloadSummary;
use wsm_core::{ApiGateway, AppState, Workspace};

use crate::config::Config;
use crate::presenter::TerminalPresenter;

/// Build a workspace on the persisted session.
pub fn connect(config: &Config) -> Result<Workspace> {
    config.ensure_dirs()?;
    let storage = Arc::new(FileStorage::new(&config.paths.session_dir));
    let state = Arc::new(AppState::load(storage).context("Failed to load session")?);
    let gateway = ApiGateway::new(&config.api.url, state, config.timeout())
        .context("Failed to create API client")?;
    Ok(Workspace::new(gateway, Arc::new(TerminalPresenter)))
}

/// Build a workspace and load memberships, failing when signed out.
pub async fn signed_in(config: &Config) -> Result<Workspace> {
    let workspace = connect(config)?;
    if !workspace.state().session().get()?.is_authenticated() {
        bail!("Not signed in. Run: wsm auth login");
    }
    workspace.load_me().await.map_err(user_error)?;
    Ok(workspace)
}

/// Like [`signed_in`], and an organization must be active.
pub async fn with_org(config: &Config) -> Result<Workspace> {
    let workspace = signed_in(config).await?;
    if workspace.state().session().get()?.active_org_id.is_none() {
        bail!("No active organization. Create one with: wsm org create <name>");
    }
    Ok(workspace)
}

/// Error carrying the message meant for the user.
pub fn user_error(e: wsm_core::Error) -> anyhow::Error {
    anyhow::anyhow!(e.user_message())
}

/// Turn an action the API refused into a failing exit.
///
/// The reason was already shown as a notification.
pub fn ensure_applied(applied: bool, action: &str) -> Result<()> {
    if !applied {
        bail!("{} was not applied.", action);
    }
    Ok(())
}

/// Ask before a destructive action unless `--yes` was given.
pub fn confirm(prompt: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    let confirmed = Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .context("Failed to read confirmation")?;
    if !confirmed {
        println!("{}", "Cancelled.".yellow());
    }
    Ok(confirmed)
}

/// Print collections that failed to load.
pub fn report_reload(summary: &ReloadSummary) {
    for (collection, error) in &summary.failures {
        println!(
            "{} Could not load {}: {}",
            "⚠".yellow(),
            collection,
            error.user_message()
        );
    }
}
