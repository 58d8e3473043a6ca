//! Secure-storage contract and reference implementations.
//!
//! The vault core consumes the platform's secure key-value store
//! through the [`SecureStore`] trait and never implements the
//! primitive itself — durability and per-key atomicity are the
//! collaborator's contract. Two implementations ship with the crate:
//!
//! - [`MemorySecureStore`] — in-memory, for tests and examples.
//! - [`FileSecureStore`] — one file per key with atomic
//!   write-to-temp-then-rename, for desktop/daemon hosts that have no
//!   platform keystore.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use snowcap_types::{StorageError, StorageResult};
use tokio::sync::Mutex;

// ---------------------------------------------------------------------------
// SecureStore
// ---------------------------------------------------------------------------

/// Durable, atomic per-key string storage.
///
/// Contract (assumed, not verified, by the vault core):
///
/// - `set_item` is durable and visible to a subsequent `get_item`
///   before it returns.
/// - `remove_item` is idempotent: removing an absent key succeeds.
/// - Individual keys are atomic; there is no cross-key transaction.
#[async_trait]
pub trait SecureStore: Send + Sync {
    /// Returns the stored value for `key`, or `None` if absent.
    async fn get_item(&self, key: &str) -> StorageResult<Option<String>>;

    /// Durably stores `value` under `key`, replacing any prior value.
    async fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Durably removes `key`. Succeeds if the key is already absent.
    async fn remove_item(&self, key: &str) -> StorageResult<()>;
}

// ---------------------------------------------------------------------------
// MemorySecureStore
// ---------------------------------------------------------------------------

/// In-memory [`SecureStore`] for tests and examples. Not durable.
#[derive(Default)]
pub struct MemorySecureStore {
    items: Mutex<HashMap<String, String>>,
}

impl MemorySecureStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SecureStore for MemorySecureStore {
    async fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.items.lock().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        self.items
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> StorageResult<()> {
        self.items.lock().await.remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FileSecureStore
// ---------------------------------------------------------------------------

/// File-backed [`SecureStore`]: one file per key under a directory.
///
/// Writes go to `<key>.tmp` first and are renamed into place, so a
/// crash mid-write never leaves a torn value behind. Keys are
/// restricted to `[A-Za-z0-9_-]` to keep them safe as file names.
pub struct FileSecureStore {
    dir: PathBuf,
}

impl FileSecureStore {
    /// Opens a store rooted at `dir`, creating the directory if needed.
    pub async fn open(dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| StorageError::WriteFailed {
                key: dir.display().to_string(),
                reason: format!("failed to create store directory: {e}"),
            })?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        if key.is_empty()
            || !key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(StorageError::ReadFailed {
                key: key.to_string(),
                reason: "key contains characters unsafe for a file name".into(),
            });
        }
        Ok(self.dir.join(format!("{key}.item")))
    }
}

#[async_trait]
impl SecureStore for FileSecureStore {
    async fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::ReadFailed {
                key: key.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    async fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.path_for(key).map_err(read_as_write)?;
        let tmp = path.with_extension("tmp");

        tokio::fs::write(&tmp, value.as_bytes())
            .await
            .map_err(|e| StorageError::WriteFailed {
                key: key.to_string(),
                reason: format!("failed to write temp file: {e}"),
            })?;

        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(StorageError::WriteFailed {
                key: key.to_string(),
                reason: format!("failed to rename into place: {e}"),
            });
        }

        tracing::debug!(key, "secure store item written");
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> StorageResult<()> {
        let path = self.path_for(key).map_err(read_as_write)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::WriteFailed {
                key: key.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

/// Re-labels a key-validation error for the write path.
fn read_as_write(e: StorageError) -> StorageError {
    StorageError::WriteFailed {
        key: e.key().to_string(),
        reason: e.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// RAII guard that removes a temporary directory on drop.
    struct TempDir(PathBuf);

    impl TempDir {
        fn new(name: &str) -> Self {
            let path = std::env::temp_dir().join(format!(
                "snowcap_store_{name}_{}",
                std::process::id()
            ));
            Self(path)
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.0);
        }
    }

    #[tokio::test]
    async fn memory_store_roundtrip() -> StorageResult<()> {
        let store = MemorySecureStore::new();
        assert_eq!(store.get_item("k").await?, None);

        store.set_item("k", "v1").await?;
        assert_eq!(store.get_item("k").await?.as_deref(), Some("v1"));

        store.set_item("k", "v2").await?;
        assert_eq!(store.get_item("k").await?.as_deref(), Some("v2"));

        store.remove_item("k").await?;
        assert_eq!(store.get_item("k").await?, None);

        // Removing an absent key is idempotent.
        store.remove_item("k").await?;
        Ok(())
    }

    #[tokio::test]
    async fn file_store_roundtrip() -> StorageResult<()> {
        let dir = TempDir::new("roundtrip");
        let store = FileSecureStore::open(&dir.0).await?;

        assert_eq!(store.get_item("seed_phrase").await?, None);
        store.set_item("seed_phrase", "blob-json").await?;
        assert_eq!(
            store.get_item("seed_phrase").await?.as_deref(),
            Some("blob-json")
        );

        store.remove_item("seed_phrase").await?;
        assert_eq!(store.get_item("seed_phrase").await?, None);
        store.remove_item("seed_phrase").await?;
        Ok(())
    }

    #[tokio::test]
    async fn file_store_survives_reopen() -> StorageResult<()> {
        let dir = TempDir::new("reopen");
        {
            let store = FileSecureStore::open(&dir.0).await?;
            store.set_item("accounts", "persisted").await?;
        }
        let store = FileSecureStore::open(&dir.0).await?;
        assert_eq!(store.get_item("accounts").await?.as_deref(), Some("persisted"));
        Ok(())
    }

    #[tokio::test]
    async fn file_store_rejects_unsafe_keys() -> StorageResult<()> {
        let dir = TempDir::new("unsafe_keys");
        let store = FileSecureStore::open(&dir.0).await?;
        assert!(store.get_item("../escape").await.is_err());
        assert!(store.set_item("a/b", "v").await.is_err());
        assert!(store.remove_item("").await.is_err());
        Ok(())
    }
}
