//! Workspace dashboard command.
//!
//! Provides an overview of the active organization:
//! - Organization count and role
//! - Project, task and membership counts
//! - Recent projects
//! - Tasks per status
//!
//! Supports JSON output for programmatic use.

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use wsm_core::View;

use super::{report_reload, signed_in};
use crate::config::Config;
use crate::presenter;

/// Full dashboard for JSON output.
#[derive(Debug, Serialize)]
pub struct DashboardStatus<'a> {
    pub timestamp: String,
    pub api_url: &'a str,
    #[serde(flatten)]
    pub view: &'a View,
}

pub async fn execute(json: bool, config: &Config) -> Result<()> {
    let workspace = signed_in(config).await?;
    let summary = workspace.reload_all().await;
    let view = workspace.view()?;

    if json {
        let status = DashboardStatus {
            timestamp: Utc::now().to_rfc3339(),
            api_url: &config.api.url,
            view: &view,
        };
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        report_reload(&summary);
        presenter::print_dashboard(&view);
    }

    Ok(())
}
