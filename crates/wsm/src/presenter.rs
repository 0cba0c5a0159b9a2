//! Terminal output for workspace views.

use colored::{ColoredString, Colorize};
use tracing::debug;
use wsm_core::types::{Role, TaskStatus};
use wsm_core::view::{MemberRow, ProjectCard, TaskSection};
use wsm_core::{Presenter, View};

/// Prints notifications as they happen. Views are drawn by the command that
/// asked for them, once it is done.
#[derive(Debug, Default)]
pub struct TerminalPresenter;

impl Presenter for TerminalPresenter {
    fn render(&self, view: &View) {
        debug!(
            "View: {} projects, {} tasks, {} members",
            view.stats.projects, view.stats.tasks, view.members.len()
        );
    }

    fn notify(&self, message: &str) {
        println!("{} {}", "→".cyan(), message);
    }
}

fn role_badge(role: Role) -> ColoredString {
    let badge = role.badge();
    match role {
        Role::Owner => badge.magenta().bold(),
        Role::Admin => badge.blue().bold(),
        Role::Member => badge.normal(),
        Role::Viewer => badge.dimmed(),
    }
}

fn status_badge(status: TaskStatus) -> ColoredString {
    match status {
        TaskStatus::Todo => status.label().yellow(),
        TaskStatus::InProgress => status.label().cyan(),
        TaskStatus::Done => status.label().green(),
    }
}

fn header(title: &str) {
    println!("{}", title.cyan().bold());
    println!("{}", "─".repeat(50));
}

pub fn print_organisations(view: &View) {
    header("Organizations");
    if view.organisations.is_empty() {
        println!("  No organizations yet. Create one with: wsm org create <name>");
        return;
    }
    for org in &view.organisations {
        let marker = if org.active { "●".green() } else { "○".normal() };
        println!(
            "  {} {} {} {}",
            marker,
            org.name.bold(),
            role_badge(org.role),
            org.id.dimmed()
        );
        println!("      Joined {}", org.joined);
    }
}

fn print_project(project: &ProjectCard) {
    println!("  {} {}", project.name.bold(), project.id.dimmed());
    println!("      {}  {}", project.description.dimmed(), project.created);
}

pub fn print_projects(view: &View) {
    header("Projects");
    if view.projects.is_empty() {
        println!("  No projects yet.");
        return;
    }
    view.projects.iter().for_each(print_project);
}

fn print_section(section: &TaskSection) {
    println!();
    println!("  {} ({})", status_badge(section.status).bold(), section.tasks.len());
    if section.tasks.is_empty() {
        println!("    No tasks");
        return;
    }
    for task in &section.tasks {
        let saving = if task.saving { " (saving)".yellow() } else { "".normal() };
        println!("    {} {}{}", task.title.bold(), task.id.dimmed(), saving);
        println!("      {}  {}: {}", task.project_name, task.date_label, task.date);
    }
}

pub fn print_tasks(view: &View, only: Option<TaskStatus>) {
    header("Tasks");
    view.task_sections
        .iter()
        .filter(|s| only.is_none_or(|status| s.status == status))
        .for_each(print_section);
}

fn print_member(member: &MemberRow) {
    let pending = if member.pending { " (pending)".yellow() } else { "".normal() };
    println!(
        "  [{}] {} {} {}{}",
        member.initials.bold(),
        member.name.bold(),
        role_badge(member.role),
        member.id.dimmed(),
        pending
    );
    println!("      {}  {}  Joined {}", member.subtitle.dimmed(), member.email, member.joined);
}

pub fn print_members(view: &View) {
    header("Members");
    if view.members.is_empty() {
        println!("  No members yet.");
        return;
    }
    view.members.iter().for_each(print_member);
}

pub fn print_dashboard(view: &View) {
    println!();
    match &view.active_org_name {
        Some(name) => println!("  {} {}", name.bold(), role_badge_label(&view.role_badge)),
        None => println!("  {}", "No active organization".yellow()),
    }
    println!();
    println!("  {}", "Overview:".cyan().bold());
    println!("    Organizations: {}", view.stats.organisations);
    println!("    Projects:      {}", view.stats.projects);
    println!("    Tasks:         {}", view.stats.tasks);
    println!("    Memberships:   {}", view.stats.memberships);

    println!();
    println!("  {}", "Recent projects:".cyan().bold());
    if view.recent_projects.is_empty() {
        println!("    No projects yet.");
    }
    for project in &view.recent_projects {
        println!("    {} {}", "•".green(), project.name);
    }

    println!();
    println!("  {}", "Tasks:".cyan().bold());
    for section in &view.task_sections {
        println!("    {:<12} {}", status_badge(section.status), section.tasks.len());
    }

    println!();
    println!("{}", "─".repeat(50));
    println!("  {}", "Quick Actions:".cyan());
    println!("    wsm task list      - See tasks");
    println!("    wsm member list    - See members");
    println!("    wsm org switch     - Change organization");
    println!();
}

fn role_badge_label(badge: &str) -> ColoredString {
    badge.parse::<Role>().map(role_badge).unwrap_or_else(|_| badge.normal())
}
