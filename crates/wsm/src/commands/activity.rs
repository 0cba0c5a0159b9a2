//! Activity feed.

use anyhow::Result;
use colored::Colorize;

use super::{user_error, with_org};
use crate::config::Config;

pub async fn execute(config: &Config) -> Result<()> {
    let workspace = with_org(config).await?;
    let feed = workspace.activity().await.map_err(user_error)?;

    println!("{}", "Activity".cyan().bold());
    println!("{}", "─".repeat(50));
    if feed.trim().is_empty() {
        println!("  No activity yet.");
    } else {
        println!("{}", feed.trim_end());
    }
    Ok(())
}
