//! Display model.
//!
//! [`project`] maps a [`Snapshot`] to a [`View`] without touching the
//! network or the state. Whatever draws the view implements [`Presenter`].

use crate::state::Snapshot;
use crate::types::{Member, Membership, Project, Role, Task, TaskStatus};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// Number of projects listed on the dashboard.
pub const RECENT_PROJECTS: usize = 5;

const NO_DESCRIPTION: &str = "No description";
const UNASSIGNED_PROJECT: &str = "Unassigned project";

/// Draws views and shows transient notifications.
pub trait Presenter: Send + Sync {
    fn render(&self, view: &View);

    /// Show a short, non-blocking message.
    fn notify(&self, message: &str);
}

/// Presenter that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn render(&self, _view: &View) {}

    fn notify(&self, _message: &str) {}
}

/// Actions the current role may attempt. The API enforces the real rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Permissions {
    pub manage_projects: bool,
    pub delete_tasks: bool,
    pub add_members: bool,
    pub create_tasks: bool,
    pub create_organisations: bool,
}

impl Permissions {
    pub fn for_role(role: Role) -> Self {
        Self {
            manage_projects: role.can_admin(),
            delete_tasks: role.can_admin(),
            add_members: role.can_admin(),
            create_tasks: role.can_create(),
            create_organisations: role.can_create(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub organisations: usize,
    pub projects: usize,
    pub tasks: usize,
    pub memberships: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrganisationRow {
    pub id: String,
    pub name: String,
    pub role: Role,
    pub joined: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectCard {
    pub id: String,
    pub name: String,
    pub description: String,
    pub created: String,
    pub deletable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskCard {
    pub id: String,
    pub title: String,
    pub status: TaskStatus,
    pub project_name: String,
    /// "Due" or "Created"
    pub date_label: &'static str,
    pub date: String,
    /// Status update in flight; the status control is disabled.
    pub saving: bool,
    pub deletable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskSection {
    pub status: TaskStatus,
    pub label: &'static str,
    pub tasks: Vec<TaskCard>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberRow {
    pub id: String,
    pub initials: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub subtitle: &'static str,
    pub joined: String,
    pub can_change_role: bool,
    pub can_remove: bool,
    /// Optimistic placeholder awaiting the server's record.
    pub pending: bool,
}

/// Everything a presenter needs to draw the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct View {
    pub signed_in: bool,
    pub active_org_id: Option<String>,
    pub active_org_name: Option<String>,
    pub role_badge: String,
    pub permissions: Permissions,
    pub stats: Stats,
    pub organisations: Vec<OrganisationRow>,
    pub recent_projects: Vec<ProjectCard>,
    pub projects: Vec<ProjectCard>,
    pub task_sections: Vec<TaskSection>,
    pub members: Vec<MemberRow>,
}

/// Build the view for a snapshot.
pub fn project(snapshot: &Snapshot) -> View {
    let cache = &snapshot.cache;
    let role = snapshot.current_role();
    let permissions = Permissions::for_role(role);
    let active_org_id = snapshot.session.active_org_id.clone();

    let organisations = cache
        .memberships
        .iter()
        .map(|m| organisation_row(m, active_org_id.as_deref()))
        .collect();

    let projects: Vec<ProjectCard> = cache
        .projects
        .iter()
        .map(|p| project_card(p, permissions))
        .collect();

    View {
        signed_in: snapshot.session.is_authenticated(),
        active_org_name: snapshot
            .active_membership()
            .map(|m| m.organisation_name.clone()),
        active_org_id,
        role_badge: role.badge(),
        permissions,
        stats: Stats {
            organisations: cache.memberships.len(),
            projects: cache.projects.len(),
            tasks: cache.tasks.len(),
            memberships: cache.memberships.len(),
        },
        organisations,
        recent_projects: projects.iter().take(RECENT_PROJECTS).cloned().collect(),
        projects,
        task_sections: task_sections(snapshot, permissions),
        members: cache.members.iter().map(|m| member_row(m, role)).collect(),
    }
}

fn organisation_row(membership: &Membership, active: Option<&str>) -> OrganisationRow {
    OrganisationRow {
        id: membership.organisation_id.clone(),
        name: membership.organisation_name.clone(),
        role: membership.role,
        joined: format_timestamp(&membership.joined_at),
        active: active == Some(membership.organisation_id.as_str()),
    }
}

fn project_card(project: &Project, permissions: Permissions) -> ProjectCard {
    ProjectCard {
        id: project.id.clone(),
        name: project.name.clone(),
        description: project.description().unwrap_or(NO_DESCRIPTION).to_string(),
        created: format_timestamp(&project.created_at),
        deletable: permissions.manage_projects,
    }
}

fn task_sections(snapshot: &Snapshot, permissions: Permissions) -> Vec<TaskSection> {
    let names: HashMap<&str, &str> = snapshot
        .cache
        .projects
        .iter()
        .map(|p| (p.id.as_str(), p.name.as_str()))
        .collect();

    TaskStatus::ALL
        .iter()
        .map(|&status| TaskSection {
            status,
            label: status.label(),
            tasks: snapshot
                .cache
                .tasks
                .iter()
                .filter(|t| t.status == status)
                .map(|t| TaskCard {
                    id: t.id.clone(),
                    title: t.title.clone(),
                    status: t.status,
                    project_name: names
                        .get(t.project_id.as_str())
                        .copied()
                        .unwrap_or(UNASSIGNED_PROJECT)
                        .to_string(),
                    date_label: date_label(t),
                    date: task_date(t),
                    saving: snapshot.cache.saving_tasks.contains(&t.id),
                    deletable: permissions.delete_tasks,
                })
                .collect(),
        })
        .collect()
}

fn date_label(task: &Task) -> &'static str {
    if task.due_date.is_some() { "Due" } else { "Created" }
}

fn task_date(task: &Task) -> String {
    match task.due_date {
        Some(due) => format_date(&due),
        None => format_timestamp(&task.created_at),
    }
}

fn member_row(member: &Member, current: Role) -> MemberRow {
    MemberRow {
        id: member.id.clone(),
        initials: initials(&member.name, &member.email),
        name: member.name.clone(),
        email: member.email.clone(),
        role: member.role,
        subtitle: if member.role == Role::Owner {
            "Workspace owner"
        } else {
            "Member"
        },
        joined: format_timestamp(&member.joined_at),
        can_change_role: current.can_change_role_of(member.role),
        can_remove: current.can_remove(member.role),
        pending: member.is_placeholder(),
    }
}

/// Avatar initials: first letters of up to two name words, else the first
/// two characters of the email, else "U".
pub fn initials(name: &str, email: &str) -> String {
    let letters: String = name
        .split_whitespace()
        .take(2)
        .filter_map(|word| word.chars().next())
        .collect();
    if !letters.is_empty() {
        return letters.to_uppercase();
    }
    let email = email.trim();
    if !email.is_empty() {
        return email.chars().take(2).collect::<String>().to_uppercase();
    }
    "U".to_string()
}

fn format_timestamp(value: &DateTime<Utc>) -> String {
    format_date(&value.date_naive())
}

fn format_date(value: &NaiveDate) -> String {
    value.format("%Y-%m-%d").to_string()
}
