//! Local key-value store.
//!
//! Stands in for browser local storage: string keys, JSON string values.
//! Writers go through [`update_json`] (or [`update_list`] for arrays), a
//! compare-and-swap loop that re-reads and retries when another writer changed
//! the key underneath it.
//!
//! Every call here is synchronous. Async callers reach the store through
//! [`crate::AppState::with_store`], which runs it on the blocking pool.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

/// Attempts made by [`update_json`] before giving up.
pub const MAX_UPDATE_ATTEMPTS: u32 = 8;

/// Errors from the local store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem failure.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A value could not be serialized.
    #[error("failed to serialize value: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The key kept changing between read and write.
    #[error("key {key} still contended after {attempts} attempts")]
    Contention { key: String, attempts: u32 },

    /// The key contains characters the backend cannot store.
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    /// The blocking task running a store call panicked or was cancelled.
    #[error("storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// A string-keyed store with atomic conditional writes.
pub trait KeyValueStore: Send + Sync {
    /// Read the raw value under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Unconditionally write `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Missing keys are not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Replace the value under `key` with `new` only if it currently equals
    /// `expected`. `None` means absent on either side.
    ///
    /// Returns `false` without writing when the current value differs.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read or written.
    fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&str>,
        new: Option<&str>,
    ) -> Result<bool, StorageError>;

    /// All keys currently present, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be listed.
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

/// Read and decode the JSON value under `key`.
///
/// Missing, unreadable and malformed values all yield `T::default()`; the
/// last two are logged.
pub fn read_json<T>(store: &dyn KeyValueStore, key: &str) -> T
where
    T: DeserializeOwned + Default,
{
    match store.get(key) {
        Ok(Some(raw)) => decode_or_default(key, Some(&raw)),
        Ok(None) => T::default(),
        Err(e) => {
            warn!(key, error = %e, "failed to read local store, using empty value");
            T::default()
        }
    }
}

/// Encode `value` and write it under `key`.
///
/// # Errors
///
/// Returns an error if encoding or the write fails.
pub fn write_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}

/// Read the JSON array under `key`, decoding each element on its own.
///
/// Elements that are not a valid `T` are skipped and logged, so one corrupt
/// record never hides the rest. Missing, unreadable and non-array values
/// yield an empty list.
pub fn read_list<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Vec<T> {
    match store.get(key) {
        Ok(raw) => decode_list_or_empty(key, raw.as_deref()),
        Err(e) => {
            warn!(key, error = %e, "failed to read local store, using empty list");
            Vec::new()
        }
    }
}

/// Decode a JSON array element by element, skipping elements that are not a
/// valid `T`. `context` names the source in the log lines.
///
/// # Errors
///
/// Returns an error if `raw` is not a JSON array.
pub fn decode_list<T: DeserializeOwned>(context: &str, raw: &str) -> Result<Vec<T>, serde_json::Error> {
    let elements: Vec<serde_json::Value> = serde_json::from_str(raw)?;
    let total = elements.len();
    let decoded: Vec<T> = elements
        .into_iter()
        .enumerate()
        .filter_map(|(index, element)| match serde_json::from_value(element) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(context, index, error = %e, "skipping malformed list element");
                None
            }
        })
        .collect();
    if decoded.len() < total {
        debug!(context, kept = decoded.len(), total, "decoded list with skipped elements");
    }
    Ok(decoded)
}

/// Read-modify-write the JSON value under `key`.
///
/// `apply` receives the decoded value (or `T::default()` when missing or
/// malformed) and may mutate it. If it returns `Err`, nothing is written and
/// the error is returned. Otherwise the new value is written with
/// [`KeyValueStore::compare_and_swap`]; on a lost race the value is re-read
/// and `apply` runs again.
///
/// # Errors
///
/// Returns the closure's error, a storage error, or
/// [`StorageError::Contention`] after [`MAX_UPDATE_ATTEMPTS`] lost races.
pub fn update_json<T, R, E, F>(store: &dyn KeyValueStore, key: &str, apply: F) -> Result<R, E>
where
    T: Serialize + DeserializeOwned + Default,
    E: From<StorageError>,
    F: FnMut(&mut T) -> Result<R, E>,
{
    update_with(store, key, decode_or_default::<T>, apply)
}

/// [`update_json`] for a JSON array, decoded as by [`read_list`].
///
/// Corrupt elements are skipped on read, so the written value keeps every
/// valid element and drops only the corrupt ones.
///
/// # Errors
///
/// As [`update_json`].
pub fn update_list<T, R, E, F>(store: &dyn KeyValueStore, key: &str, apply: F) -> Result<R, E>
where
    T: Serialize + DeserializeOwned,
    E: From<StorageError>,
    F: FnMut(&mut Vec<T>) -> Result<R, E>,
{
    update_with(store, key, decode_list_or_empty::<T>, apply)
}

fn update_with<T, R, E, F>(
    store: &dyn KeyValueStore,
    key: &str,
    decode: fn(&str, Option<&str>) -> T,
    mut apply: F,
) -> Result<R, E>
where
    T: Serialize,
    E: From<StorageError>,
    F: FnMut(&mut T) -> Result<R, E>,
{
    for attempt in 1..=MAX_UPDATE_ATTEMPTS {
        let current = store.get(key).map_err(E::from)?;
        let mut value = decode(key, current.as_deref());
        let result = apply(&mut value)?;
        let encoded = serde_json::to_string(&value).map_err(|e| E::from(StorageError::from(e)))?;

        if store
            .compare_and_swap(key, current.as_deref(), Some(&encoded))
            .map_err(E::from)?
        {
            return Ok(result);
        }
        debug!(key, attempt, "local store value changed during update, retrying");
    }

    Err(E::from(StorageError::Contention {
        key: key.to_string(),
        attempts: MAX_UPDATE_ATTEMPTS,
    }))
}

fn decode_or_default<T>(key: &str, raw: Option<&str>) -> T
where
    T: DeserializeOwned + Default,
{
    let Some(raw) = raw else {
        return T::default();
    };
    serde_json::from_str(raw).unwrap_or_else(|e| {
        warn!(key, error = %e, "malformed value in local store, using empty value");
        T::default()
    })
}

fn decode_list_or_empty<T: DeserializeOwned>(key: &str, raw: Option<&str>) -> Vec<T> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    decode_list(key, raw).unwrap_or_else(|e| {
        warn!(key, error = %e, "local store value is not a list, using empty list");
        Vec::new()
    })
}
