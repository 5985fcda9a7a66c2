//! Persistent client storage for bearer credentials
//!
//! This module provides the two opaque string slots the session layer keeps
//! between runs (access token and refresh token), with an in-memory backend
//! and a JSON file backend.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info};

use crate::error::StorageResult;

/// Named credential slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenSlot {
    /// Short-lived access token
    Access,
    /// Long-lived refresh token
    Refresh,
}

impl TokenSlot {
    /// Storage key for the slot
    pub fn key(self) -> &'static str {
        match self {
            TokenSlot::Access => "access_token",
            TokenSlot::Refresh => "refresh_token",
        }
    }
}

/// Synchronous key/value storage for credential slots
pub trait CredentialStore: Send + Sync {
    /// Get the value of a slot, if any
    fn get(&self, slot: TokenSlot) -> StorageResult<Option<String>>;

    /// Set the value of a slot
    fn set(&self, slot: TokenSlot, value: &str) -> StorageResult<()>;

    /// Clear a slot; clearing an empty slot is not an error
    fn remove(&self, slot: TokenSlot) -> StorageResult<()>;
}

/// Volatile storage, shared between clones
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slots: Arc<Mutex<HashMap<TokenSlot, String>>>,
}

impl MemoryStore {
    /// Create an empty memory store
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<TokenSlot, String>> {
        // A poisoned map still holds consistent strings.
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self, slot: TokenSlot) -> StorageResult<Option<String>> {
        Ok(self.slots().get(&slot).cloned())
    }

    fn set(&self, slot: TokenSlot, value: &str) -> StorageResult<()> {
        self.slots().insert(slot, value.to_string());
        Ok(())
    }

    fn remove(&self, slot: TokenSlot) -> StorageResult<()> {
        self.slots().remove(&slot);
        Ok(())
    }
}

/// Storage backed by a small JSON document on disk
///
/// The whole document is rewritten on every change; reads always go to disk so
/// that two processes sharing the file observe each other's logins.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    /// Open a file store at `path`; the file is created on first write
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        info!("Credential storage at {}", path.display());
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_slots(&self) -> StorageResult<HashMap<String, String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(HashMap::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_slots(&self, slots: &HashMap<String, String>) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(slots)?;
        write_private(&self.path, content.as_bytes())?;
        Ok(())
    }

    fn update(&self, f: impl FnOnce(&mut HashMap<String, String>)) -> StorageResult<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut slots = self.read_slots()?;
        f(&mut slots);
        self.write_slots(&slots)
    }
}

/// Write `content` to a file only the current user can read
fn write_private(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    // The mode above only applies when the file is created.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(content)
}

impl CredentialStore for FileStore {
    fn get(&self, slot: TokenSlot) -> StorageResult<Option<String>> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut slots = self.read_slots()?;
        Ok(slots.remove(slot.key()))
    }

    fn set(&self, slot: TokenSlot, value: &str) -> StorageResult<()> {
        debug!("Writing credential slot {}", slot.key());
        self.update(|slots| {
            slots.insert(slot.key().to_string(), value.to_string());
        })
    }

    fn remove(&self, slot: TokenSlot) -> StorageResult<()> {
        debug!("Clearing credential slot {}", slot.key());
        self.update(|slots| {
            slots.remove(slot.key());
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;

    #[test]
    fn test_memory_set_get_remove() -> StorageResult<()> {
        let store = MemoryStore::new();
        assert_eq!(store.get(TokenSlot::Access)?, None);

        store.set(TokenSlot::Access, "a")?;
        store.set(TokenSlot::Refresh, "r")?;
        assert_eq!(store.get(TokenSlot::Access)?, Some("a".to_string()));

        // Clones share the same slots
        let clone = store.clone();
        clone.remove(TokenSlot::Access)?;
        assert_eq!(store.get(TokenSlot::Access)?, None);
        assert_eq!(store.get(TokenSlot::Refresh)?, Some("r".to_string()));

        store.remove(TokenSlot::Access)?;
        Ok(())
    }

    #[test]
    fn test_file_store_persists_between_instances() -> StorageResult<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("credentials.json");

        let store = FileStore::open(&path);
        assert_eq!(store.get(TokenSlot::Refresh)?, None);
        store.set(TokenSlot::Access, "access-1")?;
        store.set(TokenSlot::Refresh, "refresh-1")?;

        let reopened = FileStore::open(&path);
        assert_eq!(reopened.get(TokenSlot::Access)?, Some("access-1".to_string()));
        assert_eq!(
            reopened.get(TokenSlot::Refresh)?,
            Some("refresh-1".to_string())
        );

        reopened.remove(TokenSlot::Access)?;
        assert_eq!(store.get(TokenSlot::Access)?, None);
        assert_eq!(store.get(TokenSlot::Refresh)?, Some("refresh-1".to_string()));
        Ok(())
    }

    #[test]
    fn test_file_store_rejects_garbage() -> StorageResult<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("credentials.json");
        fs::write(&path, "not json")?;

        let store = FileStore::open(&path);
        let result = store.get(TokenSlot::Access);
        assert!(matches!(result, Err(StorageError::Serialization(_))));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_is_private_to_owner() -> StorageResult<()> {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir()?;
        let fresh = dir.path().join("credentials.json");
        FileStore::open(&fresh).set(TokenSlot::Access, "access-1")?;
        assert_eq!(fs::metadata(&fresh)?.permissions().mode() & 0o777, 0o600);

        let existing = dir.path().join("shared.json");
        fs::write(&existing, "{}")?;
        fs::set_permissions(&existing, fs::Permissions::from_mode(0o644))?;
        FileStore::open(&existing).set(TokenSlot::Refresh, "refresh-1")?;
        assert_eq!(fs::metadata(&existing)?.permissions().mode() & 0o777, 0o600);
        Ok(())
    }
}
