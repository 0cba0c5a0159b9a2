//! Workspace controller.
//!
//! Ties the gateway, the shared state and a [`Presenter`] together. Every
//! state transition is followed by a render.
//!
//! - Session: login, registration, logout, current user
//! - Organizations: creation and switching
//! - Collections: fenced reloads of projects, tasks and members
//! - Mutations: see [`projects`], [`tasks`] and [`members`]

pub mod members;
pub mod projects;
pub mod tasks;

use crate::client::{ApiGateway, RequestOptions};
use crate::error::{Error, Result};
use crate::state::{AppState, EntityCache};
use crate::types::{CreateOrganisationRequest, Credentials, MeResponse, Member, MembersResponse, Project, Task, User};
use crate::view::{self, Presenter, View};
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const ME_PATH: &str = "/api/auth/me/";
pub const ORGANISATIONS_PATH: &str = "/api/organisations/";
pub const PROJECTS_PATH: &str = "/api/projects/";
pub const TASKS_PATH: &str = "/api/tasks/";
pub const ACTIVITY_PATH: &str = "/api/activity/";

const ACTIVITY_FAILED: &str = "Unable to load activity.";

/// Members endpoint of one organization.
pub fn members_path(org_id: &str) -> String {
    format!("/api/workspaces/{}/members/", org_id)
}

/// Collections scoped to the active organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Projects,
    Tasks,
    Members,
}

impl Collection {
    /// Reload order after a switch.
    pub const ALL: [Collection; 3] = [Collection::Projects, Collection::Tasks, Collection::Members];

    fn fallback(&self) -> &'static str {
        match self {
            Collection::Projects => "Unable to load projects.",
            Collection::Tasks => "Unable to load tasks.",
            Collection::Members => "Unable to load members.",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Collection::Projects => "projects",
            Collection::Tasks => "tasks",
            Collection::Members => "members",
        })
    }
}

/// Result of reloading every collection. One failure does not stop the rest.
#[derive(Debug, Default)]
pub struct ReloadSummary {
    pub failures: Vec<(Collection, Error)>,
}

impl ReloadSummary {
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Controller for one signed-in client.
#[derive(Clone)]
pub struct Workspace {
    gateway: ApiGateway,
    presenter: Arc<dyn Presenter>,
}

impl Workspace {
    /// The presenter also sees the signed-out view when a rejected token
    /// refresh ends the session mid-request.
    pub fn new(gateway: ApiGateway, presenter: Arc<dyn Presenter>) -> Self {
        let state = gateway.state().clone();
        let on_signed_out = presenter.clone();
        let gateway = gateway.with_signed_out_hook(Arc::new(move || match state.snapshot() {
            Ok(snapshot) => on_signed_out.render(&view::project(&snapshot)),
            Err(e) => warn!("Failed to build view: {}", e),
        }));
        Self { gateway, presenter }
    }

    pub fn gateway(&self) -> &ApiGateway {
        &self.gateway
    }

    pub fn state(&self) -> &Arc<AppState> {
        self.gateway.state()
    }

    /// Project the current state.
    pub fn view(&self) -> Result<View> {
        Ok(view::project(&self.state().snapshot()?))
    }

    /// Hand the current view to the presenter.
    pub fn render(&self) {
        match self.view() {
            Ok(view) => self.presenter.render(&view),
            Err(e) => warn!("Failed to build view: {}", e),
        }
    }

    pub(crate) fn notify(&self, message: &str) {
        self.presenter.notify(message);
    }

    /// Notify a failed action. Local state errors are not the user's to see.
    pub(crate) fn report(&self, error: Error) -> Result<bool> {
        match error {
            Error::LockPoisoned | Error::Io(_) => Err(error),
            other => {
                debug!("Action failed: {}", other);
                self.notify(&other.user_message());
                Ok(false)
            }
        }
    }

    fn active_org(&self) -> Result<Option<String>> {
        Ok(self.state().session().get()?.active_org_id)
    }

    pub(crate) fn require_org(&self) -> Result<String> {
        self.active_org()?.ok_or(Error::NoActiveOrganisation)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Session
    // ─────────────────────────────────────────────────────────────────────────

    /// Sign in, then load the user and every collection.
    pub async fn login(&self, credentials: &Credentials) -> Result<ReloadSummary> {
        self.gateway.login(credentials).await?;
        self.load_me().await?;
        let summary = self.reload_all().await;
        self.render();
        Ok(summary)
    }

    /// Create an account, then load the user.
    pub async fn register(&self, credentials: &Credentials) -> Result<()> {
        self.gateway.register(credentials).await?;
        self.load_me().await?;
        self.render();
        Ok(())
    }

    pub fn logout(&self) -> Result<()> {
        self.state().logout()?;
        self.render();
        Ok(())
    }

    /// Fetch the current user and replace the memberships.
    ///
    /// With no active organization, the first membership's organization is
    /// selected and persisted.
    pub async fn load_me(&self) -> Result<Option<User>> {
        let epoch = self.state().epoch()?;
        let me: MeResponse = self
            .gateway
            .request(ME_PATH, RequestOptions::get())
            .await?
            .parse("Unable to load profile.")?;

        let memberships = me.memberships;
        let first_org = memberships.first().map(|m| m.organisation_id.clone());
        let count = memberships.len();
        if self
            .state()
            .update_if_current(epoch, |c| c.memberships = memberships)?
            .is_none()
        {
            return Ok(me.user);
        }
        debug!("Loaded {} memberships", count);

        if let (None, Some(org_id)) = (self.active_org()?, first_org) {
            self.state().select_organisation(&org_id)?;
        }
        self.render();
        Ok(me.user)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Organizations
    // ─────────────────────────────────────────────────────────────────────────

    /// Make `org_id` active and reload its collections in order.
    ///
    /// The role badge is recomputed from cached memberships before any
    /// request goes out. Selecting the active organization just reloads.
    pub async fn switch_organisation(&self, org_id: &str) -> Result<ReloadSummary> {
        self.state().select_organisation(org_id)?;
        self.render();
        Ok(self.reload_all().await)
    }

    pub async fn create_organisation(&self, name: &str) -> Result<()> {
        let body = CreateOrganisationRequest {
            name: name.trim().to_string(),
        };
        self.gateway
            .request(ORGANISATIONS_PATH, RequestOptions::post(&body)?)
            .await?
            .into_result("Unable to create organization.")?;
        info!("Created organization {}", body.name);
        self.load_me().await?;
        Ok(())
    }

    /// Pre-rendered activity feed.
    pub async fn activity(&self) -> Result<String> {
        let response = self.gateway.request(ACTIVITY_PATH, RequestOptions::get()).await?;
        if !response.is_success() {
            return Err(Error::api(response.status().as_u16(), ACTIVITY_FAILED));
        }
        Ok(response.text().to_string())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Collections
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn load_projects(&self) -> Result<Option<usize>> {
        self.reload(Collection::Projects).await
    }

    pub async fn load_tasks(&self) -> Result<Option<usize>> {
        self.reload(Collection::Tasks).await
    }

    pub async fn load_members(&self) -> Result<Option<usize>> {
        self.reload(Collection::Members).await
    }

    /// Replace one collection with the server's copy.
    ///
    /// Returns `None` without a request when no organization is active, and
    /// `None` when the organization changed while the request was in flight.
    pub async fn reload(&self, collection: Collection) -> Result<Option<usize>> {
        let Some(org_id) = self.active_org()? else {
            debug!("No active organization, skipping {} reload", collection);
            return Ok(None);
        };

        match collection {
            Collection::Projects => {
                self.fetch(collection, PROJECTS_PATH, |c, projects: Vec<Project>| {
                    c.projects = projects;
                    c.projects.len()
                })
                .await
            }
            Collection::Tasks => {
                self.fetch(collection, TASKS_PATH, |c, tasks: Vec<Task>| {
                    c.tasks = tasks;
                    c.tasks.len()
                })
                .await
            }
            Collection::Members => {
                self.fetch(collection, &members_path(&org_id), |c, body: MembersResponse| {
                    c.members = body.members;
                    c.members.len()
                })
                .await
            }
        }
    }

    /// Reload projects, tasks and members one after another.
    pub async fn reload_all(&self) -> ReloadSummary {
        let mut summary = ReloadSummary::default();
        for collection in Collection::ALL {
            if let Err(e) = self.reload(collection).await {
                warn!("Failed to reload {}: {}", collection, e);
                summary.failures.push((collection, e));
            }
        }
        summary
    }

    /// GET `path` and apply it unless the organization changed meanwhile.
    async fn fetch<R, F>(&self, collection: Collection, path: &str, apply: F) -> Result<Option<usize>>
    where
        R: DeserializeOwned,
        F: FnOnce(&mut EntityCache, R) -> usize,
    {
        let epoch = self.state().epoch()?;
        let body: R = self
            .gateway
            .request(path, RequestOptions::get())
            .await?
            .parse(collection.fallback())?;

        let applied = self.state().update_if_current(epoch, |c| apply(c, body))?;
        match applied {
            Some(count) => {
                debug!("Loaded {} {}", count, collection);
                self.render();
            }
            None => debug!("Dropped stale {} response", collection),
        }
        Ok(applied)
    }

    /// Reload after a mutation, logging instead of failing.
    pub(crate) async fn refresh_collection(&self, collection: Collection) {
        if let Err(e) = self.reload(collection).await {
            warn!("Failed to reload {}: {}", collection, e);
        }
    }

    /// DELETE `path`, mapping a refusal to an error.
    pub(crate) async fn send_delete(&self, path: &str, fallback: &str) -> Result<()> {
        self.gateway
            .request(path, RequestOptions::delete())
            .await?
            .into_result(fallback)?;
        Ok(())
    }

    pub(crate) fn find_member(&self, member_id: &str) -> Result<Option<Member>> {
        self.state()
            .read(|c| c.members.iter().find(|m| m.id == member_id).cloned())
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::client::ORG_HEADER;
    use crate::session::{MemoryStorage, SessionKey, SessionStorage};
    use crate::types::Role;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::time::Duration;

    fn project_json(id: &str) -> serde_json::Value {
        json!({ "id": id, "name": id, "description": "", "created_at": "2026-10-01T09:30:00Z" })
    }

    fn task_json(id: &str, project: &str) -> serde_json::Value {
        json!({ "id": id, "title": id, "project": project, "status": "todo", "created_at": "2026-10-01T09:30:00Z" })
    }

    fn member_json(id: &str, role: &str) -> serde_json::Value {
        json!({
            "id": id,
            "name": id,
            "email": format!("{}@example.com", id),
            "role": role,
            "joined_at": "2026-10-01T09:30:00Z"
        })
    }

    async fn mock_org(server: &MockServer, org: &str, project: &str, task: &str, member: &str) {
        let org = org.to_string();
        server
            .mock_async(|when, then| {
                when.method(GET).path(PROJECTS_PATH).header(ORG_HEADER, &org);
                then.status(200).json_body(json!([project_json(project)]));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(TASKS_PATH).header(ORG_HEADER, &org);
                then.status(200).json_body(json!([task_json(task, project)]));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(members_path(&org));
                then.status(200)
                    .json_body(json!({ "members": [member_json(member, "member")] }));
            })
            .await;
    }

    #[tokio::test]
    async fn test_login_selects_first_owner_membership() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path(crate::auth::LOGIN_PATH);
                then.status(200).json_body(json!({ "access": "a1", "refresh": "r1" }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(ME_PATH).header("Authorization", "Bearer a1");
                then.status(200).json_body(json!({
                    "user": { "email": "owner@example.com" },
                    "memberships": [{
                        "organisation_id": "org-1",
                        "organisation_name": "Acme",
                        "role": "owner",
                        "joined_at": "2026-10-01T09:30:00Z"
                    }]
                }));
            })
            .await;
        mock_org(&server, "org-1", "p1", "t1", "m1").await;

        let storage = Arc::new(MemoryStorage::new());
        let (workspace, presenter) = workspace(&server.base_url(), storage.clone());
        let summary = workspace
            .login(&Credentials {
                email: "owner@example.com".into(),
                password: "pw".into(),
            })
            .await
            .unwrap();

        assert!(summary.is_ok());
        assert_eq!(storage.load(SessionKey::OrgId).unwrap().as_deref(), Some("org-1"));
        let view = presenter.last_view();
        assert_eq!(view.stats.organisations, 1);
        assert_eq!(view.role_badge, "OWNER");
        assert_eq!(view.projects.len(), 1);
        assert_eq!(view.members.len(), 1);
    }

    #[tokio::test]
    async fn test_switch_replaces_scoped_collections() {
        let server = MockServer::start_async().await;
        mock_org(&server, "org-a", "pa", "ta", "ma").await;
        mock_org(&server, "org-b", "pb", "tb", "mb").await;

        let (workspace, presenter) = workspace(&server.base_url(), signed_in("org-a"));
        assert!(workspace.reload_all().await.is_ok());

        let summary = workspace.switch_organisation("org-b").await.unwrap();
        assert!(summary.is_ok());

        let cache = workspace.state().read(|c| c.clone()).unwrap();
        let projects: Vec<_> = cache.projects.iter().map(|p| p.id.as_str()).collect();
        let tasks: Vec<_> = cache.tasks.iter().map(|t| t.id.as_str()).collect();
        let members: Vec<_> = cache.members.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(projects, ["pb"]);
        assert_eq!(tasks, ["tb"]);
        assert_eq!(members, ["mb"]);
        assert_eq!(presenter.last_view().active_org_id.as_deref(), Some("org-b"));
    }

    #[tokio::test]
    async fn test_switch_renders_cached_role_before_reloading() {
        let server = MockServer::start_async().await;
        mock_org(&server, "org-b", "pb", "tb", "mb").await;

        let (workspace, presenter) = workspace(&server.base_url(), signed_in("org-a"));
        workspace
            .state()
            .update(|c| {
                c.memberships = vec![
                    crate::types::Membership {
                        organisation_id: "org-a".into(),
                        organisation_name: "A".into(),
                        role: Role::Owner,
                        joined_at: chrono::Utc::now(),
                    },
                    crate::types::Membership {
                        organisation_id: "org-b".into(),
                        organisation_name: "B".into(),
                        role: Role::Viewer,
                        joined_at: chrono::Utc::now(),
                    },
                ]
            })
            .unwrap();

        workspace.switch_organisation("org-b").await.unwrap();

        let first = presenter.views.lock().unwrap()[0].clone();
        assert_eq!(first.role_badge, "VIEWER");
        assert!(first.projects.is_empty());
    }

    #[tokio::test]
    async fn test_one_failed_reload_does_not_block_the_others() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(PROJECTS_PATH);
                then.status(500);
            })
            .await;
        let tasks = server
            .mock_async(|when, then| {
                when.method(GET).path(TASKS_PATH);
                then.status(200).json_body(json!([task_json("t1", "p1")]));
            })
            .await;
        let members = server
            .mock_async(|when, then| {
                when.method(GET).path(members_path("org-1"));
                then.status(200).json_body(json!({ "members": [] }));
            })
            .await;

        let (workspace, _) = workspace(&server.base_url(), signed_in("org-1"));
        let summary = workspace.reload_all().await;

        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].0, Collection::Projects);
        tasks.assert_async().await;
        members.assert_async().await;
    }

    #[tokio::test]
    async fn test_stale_reload_is_discarded_after_switch() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(PROJECTS_PATH).header(ORG_HEADER, "org-a");
                then.status(200)
                    .delay(Duration::from_millis(300))
                    .json_body(json!([project_json("pa")]));
            })
            .await;

        let (workspace, _) = workspace(&server.base_url(), signed_in("org-a"));
        let state = workspace.state().clone();
        let (loaded, _) = tokio::join!(workspace.load_projects(), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            state.select_organisation("org-b").unwrap();
        });

        assert_eq!(loaded.unwrap(), None);
        assert!(state.read(|c| c.projects.is_empty()).unwrap());
    }

    #[tokio::test]
    async fn test_reload_without_org_sends_nothing() {
        let server = MockServer::start_async().await;
        let projects = server
            .mock_async(|when, then| {
                when.method(GET).path(PROJECTS_PATH);
                then.status(200).json_body(json!([]));
            })
            .await;

        let storage = Arc::new(MemoryStorage::with_values([(SessionKey::Access, "a1".to_string())]));
        let (workspace, _) = workspace(&server.base_url(), storage);

        assert_eq!(workspace.load_projects().await.unwrap(), None);
        projects.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn test_activity_failure_uses_fixed_message() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(ACTIVITY_PATH);
                then.status(500).body("boom");
            })
            .await;

        let (workspace, _) = workspace(&server.base_url(), signed_in("org-1"));
        let err = workspace.activity().await.unwrap_err();
        assert_eq!(err.user_message(), ACTIVITY_FAILED);
    }

    #[tokio::test]
    async fn test_forced_logout_renders_signed_out_view() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(PROJECTS_PATH);
                then.status(401);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path(crate::client::REFRESH_PATH);
                then.status(401);
            })
            .await;

        let storage = signed_in("org-1");
        let (workspace, presenter) = workspace(&server.base_url(), storage.clone());

        assert!(workspace.load_projects().await.is_err());
        assert!(storage.is_empty());
        assert_eq!(presenter.render_count(), 1);
        assert!(!presenter.last_view().signed_in);
    }

    #[tokio::test]
    async fn test_logout_renders_signed_out_view() {
        let storage = signed_in("org-1");
        let (workspace, presenter) = workspace("http://127.0.0.1:9", storage.clone());

        workspace.logout().unwrap();

        assert!(storage.is_empty());
        assert!(!presenter.last_view().signed_in);
    }
}
