//! Durable key/value backends for session fields.

use crate::error::Result;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

#[cfg(unix)]
use std::{fs::Permissions, os::unix::fs::PermissionsExt};

/// Persisted session field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKey {
    Access,
    Refresh,
    OrgId,
}

impl SessionKey {
    pub const ALL: [SessionKey; 3] = [SessionKey::Access, SessionKey::Refresh, SessionKey::OrgId];

    /// Storage key name
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKey::Access => "access",
            SessionKey::Refresh => "refresh",
            SessionKey::OrgId => "org_id",
        }
    }
}

/// Backend that persists session fields independently of each other.
pub trait SessionStorage: Send + Sync {
    /// Read a field, `None` when it was never written or has been removed.
    fn load(&self, key: SessionKey) -> Result<Option<String>>;

    /// Write a field.
    fn save(&self, key: SessionKey, value: &str) -> Result<()>;

    /// Remove a field. Removing a missing field is not an error.
    fn remove(&self, key: SessionKey) -> Result<()>;
}

/// One file per key inside a directory, readable only by the owner.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: SessionKey) -> PathBuf {
        self.dir.join(key.as_str())
    }
}

impl SessionStorage for FileStorage {
    fn load(&self, key: SessionKey) -> Result<Option<String>> {
        let path = self.path(key);
        if !path.exists() {
            return Ok(None);
        }
        let value = fs::read_to_string(&path)?.trim().to_string();
        Ok((!value.is_empty()).then_some(value))
    }

    fn save(&self, key: SessionKey, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path(key);
        fs::write(&path, value)?;
        #[cfg(unix)]
        fs::set_permissions(&path, Permissions::from_mode(0o600))?;
        debug!("Persisted session key {}", key.as_str());
        Ok(())
    }

    fn remove(&self, key: SessionKey) -> Result<()> {
        let path = self.path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<SessionKey, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-populated with the given fields.
    pub fn with_values(values: impl IntoIterator<Item = (SessionKey, String)>) -> Self {
        Self {
            values: Mutex::new(values.into_iter().collect()),
        }
    }

    /// Number of persisted fields.
    pub fn len(&self) -> usize {
        self.values.lock().map(|v| v.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStorage for MemoryStorage {
    fn load(&self, key: SessionKey) -> Result<Option<String>> {
        Ok(self.values.lock()?.get(&key).cloned())
    }

    fn save(&self, key: SessionKey, value: &str) -> Result<()> {
        self.values.lock()?.insert(key, value.to_string());
        Ok(())
    }

    fn remove(&self, key: SessionKey) -> Result<()> {
        self.values.lock()?.remove(&key);
        Ok(())
    }
}
