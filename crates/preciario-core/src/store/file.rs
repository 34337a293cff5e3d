use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{Store, StoreError};

/// Extension of every blob file this store owns.
const BLOB_EXTENSION: &str = "json";

/// Stores each key as `<dir>/<key>.json`.
///
/// Writes go to a hidden temp file first and are renamed into place, so a
/// crash mid-write leaves the previous value readable.
pub struct FileStore {
    dir: PathBuf,
    quota_bytes: Option<usize>,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Result<Self, StoreError> {
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            quota_bytes: None,
        })
    }

    /// Cap the total size of all blobs. A `set` that would exceed it fails
    /// with `StoreError::QuotaExceeded`.
    pub fn with_quota(mut self, quota_bytes: Option<usize>) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn blob_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.{}", key, BLOB_EXTENSION)))
    }

    fn blob_files(&self) -> Result<Vec<PathBuf>, StoreError> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_blob = path.is_file()
                && path.extension().and_then(|e| e.to_str()) == Some(BLOB_EXTENSION)
                && !path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.starts_with('.'))
                    .unwrap_or(true);
            if is_blob {
                files.push(path);
            }
        }
        Ok(files)
    }

    /// Bytes used by every blob except the one at `exclude`.
    fn used_bytes_excluding(&self, exclude: &Path) -> Result<usize, StoreError> {
        let mut total = 0usize;
        for path in self.blob_files()? {
            if path != exclude {
                total += fs::metadata(&path)?.len() as usize;
            }
        }
        Ok(total)
    }
}

impl Store for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.blob_path(key)?;
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(&path)?))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.blob_path(key)?;

        if let Some(limit) = self.quota_bytes {
            let size = self.used_bytes_excluding(&path)? + value.len();
            if size > limit {
                return Err(StoreError::QuotaExceeded {
                    key: key.to_string(),
                    size,
                    limit,
                });
            }
        }

        let tmp_path = self.dir.join(format!(".{}.{}.tmp", key, BLOB_EXTENSION));
        fs::write(&tmp_path, value)?;
        if let Err(e) = fs::rename(&tmp_path, &path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        debug!(key = key, bytes = value.len(), "Blob written");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.blob_path(key)?;
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        for path in self.blob_files()? {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, FileStore) {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("data")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_set_then_get() {
        let (_dir, store) = temp_store();
        store.set("history.entries", "[]").unwrap();
        assert_eq!(store.get("history.entries").unwrap().as_deref(), Some("[]"));
        assert!(store.dir().join("history.entries.json").exists());
    }

    #[test]
    fn test_get_absent() {
        let (_dir, store) = temp_store();
        assert!(store.get("inventory.snapshot").unwrap().is_none());
    }

    #[test]
    fn test_survives_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = FileStore::new(dir.path().to_path_buf()).unwrap();
            store.set("inventory.snapshot", "[1,2]").unwrap();
        }
        let reopened = FileStore::new(dir.path().to_path_buf()).unwrap();
        assert_eq!(reopened.get("inventory.snapshot").unwrap().as_deref(), Some("[1,2]"));
    }

    #[test]
    fn test_overwrite_leaves_no_temp_file() {
        let (_dir, store) = temp_store();
        store.set("k", "one").unwrap();
        store.set("k", "two").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("two"));
        let names: Vec<_> = fs::read_dir(store.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["k.json".to_string()]);
    }

    #[test]
    fn test_quota_exceeded() {
        let (_dir, store) = temp_store();
        let store = store.with_quota(Some(10));
        store.set("a", "12345").unwrap();

        let err = store.set("b", "123456").unwrap_err();
        assert!(err.is_quota_exceeded());
        assert!(store.get("b").unwrap().is_none());

        // Replacing a key does not count its old value against the quota
        store.set("a", "1234567890").unwrap();
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let (_dir, store) = temp_store();
        assert!(matches!(store.set("../escape", "x"), Err(StoreError::InvalidKey(_))));
        assert!(matches!(store.get(""), Err(StoreError::InvalidKey(_))));
    }

    #[test]
    fn test_remove_and_clear() {
        let (_dir, store) = temp_store();
        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();
        fs::write(store.dir().join("preciario.log"), "keep me").unwrap();

        store.remove("a").unwrap();
        assert!(store.get("a").unwrap().is_none());
        store.remove("a").unwrap();

        store.clear().unwrap();
        assert!(store.get("b").unwrap().is_none());
        assert!(store.dir().join("preciario.log").exists());
    }
}
