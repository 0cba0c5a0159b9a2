//! Organization commands.

use anyhow::{Result, bail};
use colored::Colorize;
use wsm_core::types::Membership;

use super::{report_reload, signed_in, user_error};
use crate::cli::{OrgAction, OrgCommand};
use crate::config::Config;
use crate::presenter;

pub async fn execute(cmd: OrgCommand, config: &Config) -> Result<()> {
    match cmd.action {
        OrgAction::List => list(config).await,
        OrgAction::Create { name } => create(&name, config).await,
        OrgAction::Switch { org } => switch(&org, config).await,
    }
}

async fn list(config: &Config) -> Result<()> {
    let workspace = signed_in(config).await?;
    presenter::print_organisations(&workspace.view()?);
    Ok(())
}

async fn create(name: &str, config: &Config) -> Result<()> {
    if name.trim().is_empty() {
        bail!("Organization name cannot be empty");
    }
    let workspace = signed_in(config).await?;
    if !workspace.view()?.permissions.create_organisations {
        bail!("Viewers cannot create organizations.");
    }

    workspace.create_organisation(name).await.map_err(user_error)?;
    println!("{} Organization {} created.", "✓".green(), name.trim().cyan());
    presenter::print_organisations(&workspace.view()?);
    Ok(())
}

/// Match an organization by id, then by case-insensitive name.
fn resolve<'a>(memberships: &'a [Membership], query: &str) -> Option<&'a Membership> {
    memberships
        .iter()
        .find(|m| m.organisation_id == query)
        .or_else(|| {
            memberships
                .iter()
                .find(|m| m.organisation_name.eq_ignore_ascii_case(query.trim()))
        })
}

async fn switch(query: &str, config: &Config) -> Result<()> {
    let workspace = signed_in(config).await?;
    let memberships = workspace.state().read(|c| c.memberships.clone())?;
    let Some(membership) = resolve(&memberships, query) else {
        return Err(user_error(wsm_core::Error::UnknownOrganisation(query.to_string())));
    };

    println!(
        "{} Switching to {}...",
        "→".cyan(),
        membership.organisation_name.bold()
    );
    let summary = workspace
        .switch_organisation(&membership.organisation_id)
        .await
        .map_err(user_error)?;
    report_reload(&summary);
    presenter::print_dashboard(&workspace.view()?);
    Ok(())
}
