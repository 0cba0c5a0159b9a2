//! CLI argument definitions using clap derive macros.
//!
//! Command structure for workspace management.

use clap::{Args, Parser, Subcommand};
use wsm_core::types::{Role, TaskStatus};

/// Workspace Manager CLI
///
/// Organizations, projects, tasks and members from the terminal.
#[derive(Parser, Debug)]
#[command(name = "wsm")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in, register, sign out
    Auth(AuthCommand),

    /// Organizations you belong to
    Org(OrgCommand),

    /// Projects of the active organization
    Project(ProjectCommand),

    /// Tasks of the active organization
    Task(TaskCommand),

    /// Members of the active organization
    Member(MemberCommand),

    /// Show the activity feed
    Activity,

    /// Show the workspace dashboard
    Status {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show or change local configuration
    Config(ConfigCommand),

    /// Show version
    Version,
}

// ─────────────────────────────────────────────────────────────────────────────
// Authentication Commands
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct AuthCommand {
    #[command(subcommand)]
    pub action: AuthAction,
}

/// Email and password, prompted for when not given.
#[derive(Args, Debug)]
pub struct CredentialArgs {
    /// Account email
    #[arg(short, long)]
    pub email: Option<String>,

    /// Account password
    #[arg(long, env = "WSM_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum AuthAction {
    /// Sign in and load the workspace
    Login(CredentialArgs),

    /// Create an account
    Register(CredentialArgs),

    /// Sign out and forget the stored session
    Logout,

    /// Show authentication status
    Status,
}

// ─────────────────────────────────────────────────────────────────────────────
// Organization Commands
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct OrgCommand {
    #[command(subcommand)]
    pub action: OrgAction,
}

#[derive(Subcommand, Debug)]
pub enum OrgAction {
    /// List organizations and your role in each
    List,

    /// Create an organization
    Create {
        /// Organization name
        name: String,
    },

    /// Make an organization active (by id or name)
    Switch {
        /// Organization id or name
        org: String,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Project Commands
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct ProjectCommand {
    #[command(subcommand)]
    pub action: ProjectAction,
}

#[derive(Subcommand, Debug)]
pub enum ProjectAction {
    /// List projects
    List,

    /// Create a project
    Create {
        /// Project name
        name: String,

        /// Short description
        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// Delete a project and its tasks
    Delete {
        /// Project ID
        project_id: String,

        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Task Commands
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct TaskCommand {
    #[command(subcommand)]
    pub action: TaskAction,
}

#[derive(Subcommand, Debug)]
pub enum TaskAction {
    /// List tasks grouped by status
    List {
        /// Only show one status (todo, in-progress, done)
        #[arg(short, long)]
        status: Option<TaskStatus>,
    },

    /// Create a task
    Create {
        /// Task title
        title: String,

        /// Project ID
        #[arg(short, long)]
        project: String,
    },

    /// Move a task to another status
    Status {
        /// Task ID
        task_id: String,

        /// New status (todo, in-progress, done)
        status: TaskStatus,
    },

    /// Delete a task
    Delete {
        /// Task ID
        task_id: String,

        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Member Commands
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct MemberCommand {
    #[command(subcommand)]
    pub action: MemberAction,
}

#[derive(Subcommand, Debug)]
pub enum MemberAction {
    /// List members
    List,

    /// Add an existing user by email
    Add {
        /// User email
        email: String,

        /// Role (admin, member, viewer)
        #[arg(short, long, default_value = "member")]
        role: Role,
    },

    /// Change a member's role
    Role {
        /// Member ID
        member_id: String,

        /// New role (admin, member, viewer)
        role: Role,
    },

    /// Remove a member
    Remove {
        /// Member ID
        member_id: String,

        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Config Commands
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Store the API base URL in the config file
    SetUrl {
        /// API origin, e.g. http://127.0.0.1:8000
        url: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_task_status() {
        let cli = Cli::try_parse_from(["wsm", "task", "status", "t1", "in-progress"]).unwrap();
        match cli.command {
            Commands::Task(TaskCommand {
                action: TaskAction::Status { task_id, status },
            }) => {
                assert_eq!(task_id, "t1");
                assert_eq!(status, TaskStatus::InProgress);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_member_add_defaults_to_member_role() {
        let cli = Cli::try_parse_from(["wsm", "member", "add", "alice@example.com"]).unwrap();
        match cli.command {
            Commands::Member(MemberCommand {
                action: MemberAction::Add { email, role },
            }) => {
                assert_eq!(email, "alice@example.com");
                assert_eq!(role, Role::Member);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_role_is_rejected() {
        assert!(Cli::try_parse_from(["wsm", "member", "role", "m1", "superuser"]).is_err());
    }
}
