//! Member commands.

use anyhow::{Result, bail};
use colored::Colorize;
use wsm_core::types::Role;

use super::{confirm, ensure_applied, user_error, with_org};
use crate::cli::{MemberAction, MemberCommand};
use crate::config::Config;
use crate::presenter;

pub async fn execute(cmd: MemberCommand, config: &Config) -> Result<()> {
    match cmd.action {
        MemberAction::List => list(config).await,
        MemberAction::Add { email, role } => add(&email, role, config).await,
        MemberAction::Role { member_id, role } => change_role(&member_id, role, config).await,
        MemberAction::Remove { member_id, yes } => remove(&member_id, yes, config).await,
    }
}

async fn list(config: &Config) -> Result<()> {
    let workspace = with_org(config).await?;
    workspace.load_members().await.map_err(user_error)?;
    presenter::print_members(&workspace.view()?);
    Ok(())
}

async fn add(email: &str, role: Role, config: &Config) -> Result<()> {
    if !email.contains('@') {
        bail!("Invalid email: {}", email);
    }
    let workspace = with_org(config).await?;
    if !workspace.view()?.permissions.add_members {
        bail!("Only owners and admins can add members.");
    }
    workspace.load_members().await.map_err(user_error)?;

    let member = workspace.add_member(email, role).await.map_err(user_error)?;
    println!(
        "{} Added {} as {}.",
        "✓".green(),
        member.email.cyan(),
        member.role
    );
    presenter::print_members(&workspace.view()?);
    Ok(())
}

async fn change_role(member_id: &str, role: Role, config: &Config) -> Result<()> {
    let workspace = with_org(config).await?;
    workspace.load_members().await.map_err(user_error)?;

    let view = workspace.view()?;
    let Some(row) = view.members.iter().find(|m| m.id == member_id) else {
        bail!("Member not found: {}", member_id);
    };
    if !row.can_change_role {
        bail!("Only owners can change roles, and never another owner's.");
    }

    let applied = workspace.update_member_role(member_id, role).await?;
    ensure_applied(applied, "Role change")
}

async fn remove(member_id: &str, yes: bool, config: &Config) -> Result<()> {
    let workspace = with_org(config).await?;
    workspace.load_members().await.map_err(user_error)?;

    let view = workspace.view()?;
    let Some(row) = view.members.iter().find(|m| m.id == member_id) else {
        bail!("Member not found: {}", member_id);
    };
    if !row.can_remove {
        bail!("Owners cannot be removed, and only owners and admins remove members.");
    }
    let prompt = format!("Remove {} from the workspace?", row.email);
    if !confirm(&prompt, yes)? {
        return Ok(());
    }

    let applied = workspace.remove_member(member_id).await?;
    ensure_applied(applied, "Member removal")
}
