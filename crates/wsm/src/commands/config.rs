//! Local configuration commands.

use anyhow::{Result, bail};
use colored::Colorize;

use crate::cli::{ConfigAction, ConfigCommand};
use crate::config::Config;

pub fn execute(cmd: ConfigCommand, config: &Config) -> Result<()> {
    match cmd.action {
        ConfigAction::Show => show(config),
        ConfigAction::SetUrl { url } => set_url(&url),
    }
}

fn show(config: &Config) -> Result<()> {
    println!("{}", "Configuration".cyan().bold());
    println!("{}", "─".repeat(50));
    println!("  File:     {}", Config::config_path().display());
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

fn set_url(url: &str) -> Result<()> {
    let url = url.trim().trim_end_matches('/');
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        bail!("API URL must start with http:// or https://");
    }

    // Start from the file alone so environment overrides are not persisted.
    let path = Config::config_path();
    let mut config = Config::load_from(&path)?;
    config.api.url = url.to_string();
    config.save_to(&path)?;

    println!("{} API URL set to {}", "✓".green(), url.cyan());
    Ok(())
}
