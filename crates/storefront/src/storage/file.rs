//! Directory-backed store: one `<key>.json` file per key.
//!
//! Writes hold a `<key>.lock` file created with `create_new` for the whole
//! read-compare-write, and land through a temp file plus rename so readers
//! never see a partial value. Every call blocks, including the lock wait.
//! A lock left behind by a crashed writer is renamed aside before removal,
//! so only one of several waiting writers can take it over.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, SystemTime};

use tracing::{debug, warn};
use uuid::Uuid;

use super::{KeyValueStore, StorageError};

const VALUE_EXT: &str = "json";
const LOCK_EXT: &str = "lock";
const LOCK_RETRIES: u32 = 50;
const LOCK_RETRY_DELAY: Duration = Duration::from_millis(20);
/// Locks older than this are assumed to belong to a crashed writer.
const STALE_LOCK_AGE: Duration = Duration::from_secs(10);

/// A [`KeyValueStore`] persisted under a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

/// Removes the key's lock file when dropped.
struct KeyLockGuard {
    lock_path: PathBuf,
}

impl Drop for KeyLockGuard {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str, ext: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.root.join(format!("{key}.{ext}")))
    }

    fn read_value(path: &Path) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_value(path: &Path, value: &str) -> Result<(), StorageError> {
        let tmp = path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, path)?;
        Ok(())
    }

    fn remove_value(path: &Path) -> Result<(), StorageError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn acquire_lock(&self, key: &str) -> Result<KeyLockGuard, StorageError> {
        let lock_path = self.path_for(key, LOCK_EXT)?;
        for attempt in 1..=LOCK_RETRIES {
            match OpenOptions::new()
                .create_new(true)
                .write(true)
                .open(&lock_path)
            {
                Ok(_) => return Ok(KeyLockGuard { lock_path }),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    if is_stale(&lock_path) && clear_stale_lock(&lock_path) {
                        warn!(key, "removed stale lock file");
                        continue;
                    }
                    debug!(key, attempt, "key locked by another writer, waiting");
                    thread::sleep(LOCK_RETRY_DELAY);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(StorageError::Contention {
            key: key.to_string(),
            attempts: LOCK_RETRIES,
        })
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Self::read_value(&self.path_for(key, VALUE_EXT)?)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key, VALUE_EXT)?;
        let _guard = self.acquire_lock(key)?;
        Self::write_value(&path, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key, VALUE_EXT)?;
        let _guard = self.acquire_lock(key)?;
        Self::remove_value(&path)
    }

    fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&str>,
        new: Option<&str>,
    ) -> Result<bool, StorageError> {
        let path = self.path_for(key, VALUE_EXT)?;
        let _guard = self.acquire_lock(key)?;

        let current = Self::read_value(&path)?;
        if current.as_deref() != expected {
            return Ok(false);
        }
        match new {
            Some(value) => Self::write_value(&path, value)?,
            None => Self::remove_value(&path)?,
        }
        Ok(true)
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(VALUE_EXT) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

/// Move a stale lock aside and delete it. `true` when this caller cleared it.
///
/// The rename is atomic, so of several writers racing for one stale lock only
/// one moves it. If the moved file turns out to be fresh, another writer
/// re-created the lock in between; it is linked back in place.
fn clear_stale_lock(lock_path: &Path) -> bool {
    let aside = lock_path.with_extension(format!("{LOCK_EXT}.stale-{}", Uuid::new_v4()));
    if fs::rename(lock_path, &aside).is_err() {
        return false;
    }
    let cleared = is_stale(&aside);
    if !cleared && let Err(e) = fs::hard_link(&aside, lock_path) {
        warn!(path = %lock_path.display(), error = %e, "failed to restore a live lock file");
    }
    let _ = fs::remove_file(&aside);
    cleared
}

fn is_stale(lock_path: &Path) -> bool {
    fs::metadata(lock_path)
        .and_then(|meta| meta.modified())
        .ok()
        .and_then(|modified| SystemTime::now().duration_since(modified).ok())
        .is_some_and(|age| age > STALE_LOCK_AGE)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn store() -> (TempDir, FileStore) {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        (dir, store)
    }

    fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_set_get_remove() {
        let (dir, store) = store();

        assert!(store.get("cart").unwrap().is_none());
        store.set("cart", "[1]").unwrap();
        assert_eq!(store.get("cart").unwrap().as_deref(), Some("[1]"));
        assert!(dir.path().join("cart.json").exists());
        assert!(!dir.path().join("cart.lock").exists());

        store.remove("cart").unwrap();
        store.remove("cart").unwrap();
        assert!(store.get("cart").unwrap().is_none());
    }

    #[test]
    fn test_compare_and_swap_and_keys() {
        let (_dir, store) = store();

        assert!(store.compare_and_swap("session", None, Some("{}")).unwrap());
        assert!(!store.compare_and_swap("session", Some("[]"), Some("x")).unwrap());
        store.set("cart", "[]").unwrap();
        assert_eq!(store.keys().unwrap(), vec!["cart", "session"]);
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let (_dir, store) = store();
        assert!(matches!(
            store.get("../escape"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(store.set("", "x"), Err(StorageError::InvalidKey(_))));
    }

    #[test]
    fn test_held_lock_times_out() {
        let (dir, store) = store();
        fs::write(dir.path().join("cart.lock"), b"").unwrap();

        assert!(matches!(
            store.set("cart", "[]"),
            Err(StorageError::Contention { .. })
        ));
        assert!(dir.path().join("cart.lock").exists());
    }

    #[test]
    fn test_stale_lock_is_taken_over() {
        let (dir, store) = store();
        let lock = fs::File::create(dir.path().join("cart.lock")).unwrap();
        lock.set_modified(SystemTime::now() - STALE_LOCK_AGE * 2).unwrap();
        drop(lock);

        store.set("cart", "[1]").unwrap();
        assert_eq!(store.get("cart").unwrap().as_deref(), Some("[1]"));
        assert_eq!(file_names(dir.path()), vec!["cart.json"]);
    }

    #[test]
    fn test_fresh_lock_moved_aside_is_restored() {
        let (dir, _store) = store();
        let lock_path = dir.path().join("cart.lock");
        fs::write(&lock_path, b"").unwrap();

        assert!(!clear_stale_lock(&lock_path));
        assert_eq!(file_names(dir.path()), vec!["cart.lock"]);
    }

    #[test]
    fn test_missing_lock_is_not_cleared() {
        let (dir, _store) = store();
        assert!(!clear_stale_lock(&dir.path().join("cart.lock")));
        assert!(file_names(dir.path()).is_empty());
    }
}
