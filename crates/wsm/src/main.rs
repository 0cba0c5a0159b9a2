//! wsm - Workspace Manager CLI
//!
//! Multi-tenant workspaces from the terminal: organizations, projects,
//! tasks and members.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod cli;
mod commands;
mod config;
mod presenter;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing (stderr keeps `status --json` clean)
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("wsm=info".parse()?))
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = config::Config::load()?;

    // Execute command
    match cli.command {
        Commands::Auth(cmd) => commands::auth::execute(cmd, &config).await,
        Commands::Org(cmd) => commands::org::execute(cmd, &config).await,
        Commands::Project(cmd) => commands::project::execute(cmd, &config).await,
        Commands::Task(cmd) => commands::task::execute(cmd, &config).await,
        Commands::Member(cmd) => commands::member::execute(cmd, &config).await,
        Commands::Activity => commands::activity::execute(&config).await,
        Commands::Status { json } => commands::status::execute(json, &config).await,
        Commands::Config(cmd) => commands::config::execute(cmd, &config),
        Commands::Version => {
            println!("wsm {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
