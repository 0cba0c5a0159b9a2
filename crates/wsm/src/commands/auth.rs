//! Authentication commands.
//!
//! Tokens live in the session directory, one file per key, readable only by
//! the owner.

use anyhow::{Context, Result};
use colored::Colorize;
use dialoguer::{Input, Password};
use wsm_core::types::Credentials;

use super::{connect, report_reload, user_error};
use crate::cli::{AuthAction, AuthCommand, CredentialArgs};
use crate::config::Config;

pub async fn execute(cmd: AuthCommand, config: &Config) -> Result<()> {
    match cmd.action {
        AuthAction::Login(args) => login(args, config).await,
        AuthAction::Register(args) => register(args, config).await,
        AuthAction::Logout => logout(config),
        AuthAction::Status => status(config),
    }
}

fn credentials(args: CredentialArgs, confirm_password: bool) -> Result<Credentials> {
    let email = match args.email {
        Some(email) => email,
        None => Input::<String>::new()
            .with_prompt("Email")
            .interact_text()
            .context("Failed to read email")?,
    };
    let password = match args.password {
        Some(password) => password,
        None => {
            let prompt = Password::new().with_prompt("Password");
            let prompt = if confirm_password {
                prompt.with_confirmation("Confirm password", "Passwords do not match")
            } else {
                prompt
            };
            prompt.interact().context("Failed to read password")?
        }
    };
    Ok(Credentials {
        email: email.trim().to_string(),
        password,
    })
}

async fn login(args: CredentialArgs, config: &Config) -> Result<()> {
    let credentials = credentials(args, false)?;
    let workspace = connect(config)?;

    println!("{} Signing in as {}...", "→".cyan(), credentials.email);
    let summary = workspace.login(&credentials).await.map_err(user_error)?;
    println!("{} Login successful.", "✓".green());
    report_reload(&summary);

    let view = workspace.view()?;
    match view.active_org_name {
        Some(name) => println!("  Active organization: {} ({})", name.bold(), view.role_badge),
        None => println!("  No organization yet. Create one with: {}", "wsm org create <name>".cyan()),
    }
    Ok(())
}

async fn register(args: CredentialArgs, config: &Config) -> Result<()> {
    let credentials = credentials(args, true)?;
    let workspace = connect(config)?;

    workspace.register(&credentials).await.map_err(user_error)?;
    println!("{} Account created for {}.", "✓".green(), credentials.email.cyan());
    Ok(())
}

fn logout(config: &Config) -> Result<()> {
    let workspace = connect(config)?;
    if !workspace.state().session().get()?.is_authenticated() {
        println!("{} Not logged in.", "✗".red());
        return Ok(());
    }
    workspace.logout()?;
    println!("{} Logged out successfully!", "✓".green());
    Ok(())
}

fn status(config: &Config) -> Result<()> {
    let workspace = connect(config)?;
    let session = workspace.state().session().get()?;

    println!("{}", "Authentication Status".bold());
    println!("{}", "─".repeat(40));

    if session.is_authenticated() {
        println!("Session:   {}", "Signed in".green());
    } else {
        println!("Session:   {}", "Not logged in".red());
    }
    let refresh = if session.refresh_token.is_some() {
        "Present".green()
    } else {
        "Missing".yellow()
    };
    println!("Refresh:   {}", refresh);
    match session.active_org_id {
        Some(org) => println!("Org:       {}", org.cyan()),
        None => println!("Org:       {}", "None".yellow()),
    }
    println!("API:       {}", config.api.url);
    println!("Stored in: {}", config.paths.session_dir.display());
    Ok(())
}
