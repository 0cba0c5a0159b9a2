//! Application state: the session plus the entity caches of the active
//! organization.
//!
//! One `AppState` is shared (behind an `Arc`) by the request gateway and the
//! workspace controller. Locks are held only for the duration of a closure
//! and never across a network call.

use crate::error::Result;
use crate::session::{Session, SessionPatch, SessionStorage, SessionStore};
use crate::types::{Member, Membership, Project, Role, Task};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// In-memory collections for the active organization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityCache {
    pub memberships: Vec<Membership>,
    pub projects: Vec<Project>,
    pub tasks: Vec<Task>,
    pub members: Vec<Member>,
    /// Tasks with a status update in flight.
    pub saving_tasks: HashSet<String>,
}

impl EntityCache {
    /// Drop everything scoped to the active organization.
    fn invalidate_scoped(&mut self) {
        self.projects.clear();
        self.tasks.clear();
        self.members.clear();
    }
}

/// Point-in-time copy of the whole state, input of the view projection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub session: Session,
    pub cache: EntityCache,
}

impl Snapshot {
    /// Membership of the active organization, if any.
    pub fn active_membership(&self) -> Option<&Membership> {
        let org_id = self.session.active_org_id.as_deref()?;
        self.cache
            .memberships
            .iter()
            .find(|m| m.organisation_id == org_id)
    }

    /// Role in the active organization. Unknown memberships fall back to `member`.
    pub fn current_role(&self) -> Role {
        self.active_membership().map(|m| m.role).unwrap_or(Role::Member)
    }
}

struct Inner {
    cache: EntityCache,
    /// Bumped on every organization switch and logout.
    epoch: u64,
}

/// Shared session + cache state.
pub struct AppState {
    session: SessionStore,
    inner: Mutex<Inner>,
}

impl AppState {
    pub fn new(session: SessionStore) -> Self {
        Self {
            session,
            inner: Mutex::new(Inner {
                cache: EntityCache::default(),
                epoch: 0,
            }),
        }
    }

    /// Load the persisted session and start with empty caches.
    pub fn load(storage: Arc<dyn SessionStorage>) -> Result<Self> {
        Ok(Self::new(SessionStore::load(storage)?))
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Read from the caches.
    pub fn read<R>(&self, f: impl FnOnce(&EntityCache) -> R) -> Result<R> {
        let inner = self.inner.lock()?;
        Ok(f(&inner.cache))
    }

    /// Mutate the caches.
    pub fn update<R>(&self, f: impl FnOnce(&mut EntityCache) -> R) -> Result<R> {
        let mut inner = self.inner.lock()?;
        Ok(f(&mut inner.cache))
    }

    /// Current organization epoch.
    pub fn epoch(&self) -> Result<u64> {
        Ok(self.inner.lock()?.epoch)
    }

    /// Mutate the caches only if no switch or logout happened since `epoch`.
    ///
    /// Returns `None` when the update was discarded as stale.
    pub fn update_if_current<R>(
        &self,
        epoch: u64,
        f: impl FnOnce(&mut EntityCache) -> R,
    ) -> Result<Option<R>> {
        let mut inner = self.inner.lock()?;
        if inner.epoch != epoch {
            debug!("Discarding stale update (epoch {} != {})", epoch, inner.epoch);
            return Ok(None);
        }
        Ok(Some(f(&mut inner.cache)))
    }

    /// Make `org_id` the active organization and drop its predecessor's data.
    pub fn select_organisation(&self, org_id: &str) -> Result<u64> {
        self.session.set(SessionPatch::org(org_id))?;
        let mut inner = self.inner.lock()?;
        inner.epoch += 1;
        inner.cache.invalidate_scoped();
        info!("Active organization is now {}", org_id);
        Ok(inner.epoch)
    }

    /// Clear the session, its persisted copies and every cache.
    pub fn logout(&self) -> Result<()> {
        {
            let mut inner = self.inner.lock()?;
            inner.epoch += 1;
            inner.cache = EntityCache::default();
        }
        self.session.clear()?;
        info!("Signed out");
        Ok(())
    }

    pub fn snapshot(&self) -> Result<Snapshot> {
        let session = self.session.get()?;
        let cache = self.read(|c| c.clone())?;
        Ok(Snapshot { session, cache })
    }

    /// Role in the active organization, derived from the membership cache.
    pub fn current_role(&self) -> Result<Role> {
        Ok(self.snapshot()?.current_role())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemoryStorage;
    use chrono::Utc;

    fn project(id: &str) -> Project {
        Project {
            id: id.into(),
            name: id.to_uppercase(),
            description: None,
            created_at: Utc::now(),
        }
    }

    fn membership(org: &str, role: Role) -> Membership {
        Membership {
            organisation_id: org.into(),
            organisation_name: format!("Org {}", org),
            role,
            joined_at: Utc::now(),
        }
    }

    #[test]
    fn test_select_organisation_invalidates_scoped_caches() {
        let state = AppState::load(Arc::new(MemoryStorage::new())).unwrap();
        state
            .update(|c| {
                c.memberships = vec![membership("a", Role::Owner), membership("b", Role::Viewer)];
                c.projects = vec![project("p1")];
            })
            .unwrap();

        state.select_organisation("b").unwrap();

        let snapshot = state.snapshot().unwrap();
        assert!(snapshot.cache.projects.is_empty());
        assert_eq!(snapshot.cache.memberships.len(), 2);
        assert_eq!(snapshot.current_role(), Role::Viewer);
    }

    #[test]
    fn test_stale_epoch_update_is_discarded() {
        let state = AppState::load(Arc::new(MemoryStorage::new())).unwrap();
        let epoch = state.epoch().unwrap();

        state.select_organisation("b").unwrap();
        let applied = state
            .update_if_current(epoch, |c| c.projects = vec![project("old")])
            .unwrap();

        assert!(applied.is_none());
        assert!(state.read(|c| c.projects.is_empty()).unwrap());
    }

    #[test]
    fn test_unknown_membership_defaults_to_member_role() {
        let state = AppState::load(Arc::new(MemoryStorage::new())).unwrap();
        state.select_organisation("missing").unwrap();
        assert_eq!(state.current_role().unwrap(), Role::Member);
    }

    #[test]
    fn test_logout_clears_everything() {
        let storage = Arc::new(MemoryStorage::new());
        let state = AppState::load(storage.clone()).unwrap();
        state.session().set(SessionPatch::access("a1")).unwrap();
        state.select_organisation("a").unwrap();
        state.update(|c| c.tasks.clear()).unwrap();

        state.logout().unwrap();

        assert_eq!(state.snapshot().unwrap(), Snapshot::default());
        assert!(storage.is_empty());
    }
}
