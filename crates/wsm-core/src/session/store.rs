use super::{SessionKey, SessionStorage};
use crate::error::Result;
use crate::types::TokenPair;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Credentials and organization selection for the current user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub active_org_id: Option<String>,
}

impl Session {
    /// Whether an access token is held. Its validity is only known server-side.
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    fn field_mut(&mut self, key: SessionKey) -> &mut Option<String> {
        match key {
            SessionKey::Access => &mut self.access_token,
            SessionKey::Refresh => &mut self.refresh_token,
            SessionKey::OrgId => &mut self.active_org_id,
        }
    }
}

/// Partial session update. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct SessionPatch {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub active_org_id: Option<String>,
}

impl SessionPatch {
    pub fn tokens(pair: TokenPair) -> Self {
        Self {
            access_token: Some(pair.access),
            refresh_token: Some(pair.refresh),
            active_org_id: None,
        }
    }

    pub fn access(token: impl Into<String>) -> Self {
        Self {
            access_token: Some(token.into()),
            ..Self::default()
        }
    }

    pub fn org(org_id: impl Into<String>) -> Self {
        Self {
            active_org_id: Some(org_id.into()),
            ..Self::default()
        }
    }
}

/// Session held in memory and mirrored to durable storage on every change.
pub struct SessionStore {
    current: Mutex<Session>,
    storage: Arc<dyn SessionStorage>,
}

impl SessionStore {
    /// Read every persisted field once.
    pub fn load(storage: Arc<dyn SessionStorage>) -> Result<Self> {
        let session = Session {
            access_token: storage.load(SessionKey::Access)?,
            refresh_token: storage.load(SessionKey::Refresh)?,
            active_org_id: storage.load(SessionKey::OrgId)?,
        };
        debug!(
            "Loaded session (authenticated: {}, org: {:?})",
            session.is_authenticated(),
            session.active_org_id
        );
        Ok(Self {
            current: Mutex::new(session),
            storage,
        })
    }

    /// Snapshot of the current session.
    pub fn get(&self) -> Result<Session> {
        Ok(self.current.lock()?.clone())
    }

    /// Apply a partial update and persist the fields it touches.
    pub fn set(&self, patch: SessionPatch) -> Result<()> {
        let touched: Vec<(SessionKey, String)> = [
            (SessionKey::Access, patch.access_token),
            (SessionKey::Refresh, patch.refresh_token),
            (SessionKey::OrgId, patch.active_org_id),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect();

        {
            let mut session = self.current.lock()?;
            for (key, value) in &touched {
                *session.field_mut(*key) = Some(value.clone());
            }
        }

        for (key, value) in &touched {
            self.storage.save(*key, value)?;
        }
        Ok(())
    }

    /// Reset every field and remove all persisted copies.
    pub fn clear(&self) -> Result<()> {
        *self.current.lock()? = Session::default();
        for key in SessionKey::ALL {
            self.storage.remove(key)?;
        }
        debug!("Session cleared");
        Ok(())
    }
}
