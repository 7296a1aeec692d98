//! Application state shared across services.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::StorefrontConfig;
use crate::fixtures::FixtureClient;
use crate::models::{SessionSnapshot, SessionState, UserProfile, keys};
use crate::storage::{FileStore, KeyValueStore, StorageError, read_json, read_list, write_json};

/// Application state shared by every service.
///
/// Cheaply cloneable via `Arc`. Owns the configuration, the fixture client,
/// the local store and the current session.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    fixtures: FixtureClient,
    storage: Arc<dyn KeyValueStore>,
    session: RwLock<SessionState>,
}

impl AppState {
    /// Create the state with a file-backed store under `config.storage_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage directory cannot be created.
    pub fn new(config: StorefrontConfig) -> Result<Self, StorageError> {
        let storage = FileStore::open(&config.storage_dir)?;
        let fixtures = FixtureClient::new(config.fixtures.clone(), config.fixture_cache_ttl);
        Ok(Self::with_parts(config, fixtures, Arc::new(storage)))
    }

    /// Create the state from explicit parts, restoring any persisted session.
    ///
    /// The snapshot is read synchronously; call this before serving requests.
    #[must_use]
    pub fn with_parts(
        config: StorefrontConfig,
        fixtures: FixtureClient,
        storage: Arc<dyn KeyValueStore>,
    ) -> Self {
        let restored: Option<SessionSnapshot> = read_json(storage.as_ref(), keys::SESSION);
        let session = match restored {
            Some(snapshot) => {
                debug!(user_id = %snapshot.user.id, "restored persisted session");
                SessionState::Authenticated(snapshot.user)
            }
            None => SessionState::Anonymous,
        };

        Self {
            inner: Arc::new(AppStateInner {
                config,
                fixtures,
                storage,
                session: RwLock::new(session),
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the seed fixture client.
    #[must_use]
    pub fn fixtures(&self) -> &FixtureClient {
        &self.inner.fixtures
    }

    /// Get a reference to the local store.
    ///
    /// Its calls block; async code goes through [`Self::with_store`].
    #[must_use]
    pub fn storage(&self) -> &dyn KeyValueStore {
        self.inner.storage.as_ref()
    }

    /// Run `op` against the local store on the blocking thread pool.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Task`] if the blocking task panicked.
    pub async fn with_store<T, F>(&self, op: F) -> Result<T, StorageError>
    where
        F: FnOnce(&dyn KeyValueStore) -> T + Send + 'static,
        T: Send + 'static,
    {
        let storage = Arc::clone(&self.inner.storage);
        Ok(tokio::task::spawn_blocking(move || op(storage.as_ref())).await?)
    }

    /// Decode the JSON value under `key` off the runtime threads.
    ///
    /// Soft like [`read_json`]: every failure yields `T::default()`.
    pub async fn load_json<T>(&self, key: &'static str) -> T
    where
        T: DeserializeOwned + Default + Send + 'static,
    {
        self.with_store(move |store| read_json(store, key))
            .await
            .unwrap_or_else(|e| {
                warn!(key, error = %e, "local store read failed, using empty value");
                T::default()
            })
    }

    /// Decode the JSON array under `key` element by element, as [`read_list`].
    pub async fn load_list<T>(&self, key: &'static str) -> Vec<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.with_store(move |store| read_list(store, key))
            .await
            .unwrap_or_else(|e| {
                warn!(key, error = %e, "local store read failed, using empty list");
                Vec::new()
            })
    }

    /// Current session state.
    pub async fn session(&self) -> SessionState {
        self.inner.session.read().await.clone()
    }

    /// The logged-in user, if any.
    pub async fn current_user(&self) -> Option<UserProfile> {
        self.inner.session.read().await.user().cloned()
    }

    /// Persist and install an authenticated session.
    ///
    /// The in-memory state only changes once the snapshot is written.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be written.
    pub async fn begin_session(&self, user: UserProfile) -> Result<(), StorageError> {
        let mut session = self.inner.session.write().await;
        let snapshot = SessionSnapshot { user: user.clone() };
        self.with_store(move |store| write_json(store, keys::SESSION, &snapshot))
            .await??;
        *session = SessionState::Authenticated(user);
        Ok(())
    }

    /// Drop the session and wipe the locally stored working state.
    ///
    /// Storage failures are logged; the in-memory session always ends.
    pub async fn end_session(&self) {
        let mut session = self.inner.session.write().await;
        let cleared = self
            .with_store(|store| {
                for key in keys::WORKING_STATE {
                    if let Err(e) = store.remove(key) {
                        warn!(key, error = %e, "failed to clear local store key");
                    }
                }
            })
            .await;
        if let Err(e) = cleared {
            warn!(error = %e, "failed to clear local working state");
        }
        *session = SessionState::Anonymous;
    }

    /// Log teardown. Nothing is buffered, so there is nothing to flush.
    pub async fn shutdown(&self) {
        let authenticated = self.inner.session.read().await.is_authenticated();
        info!(authenticated, "storefront state shut down");
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.inner.config)
            .field("fixtures", &self.inner.fixtures)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use marketstall_core::{Email, UserId};

    use super::*;
    use crate::fixtures::FixtureSource;
    use crate::storage::MemoryStore;

    fn profile() -> UserProfile {
        UserProfile {
            id: UserId::new("u1"),
            email: Email::parse("kim@example.com").unwrap(),
            nickname: "kim".to_string(),
            name: "Kim".to_string(),
            phone: String::new(),
            postal_code: String::new(),
            basic_address: String::new(),
            detail_address: String::new(),
            image: String::new(),
        }
    }

    fn state_over(storage: Arc<dyn KeyValueStore>) -> AppState {
        let fixtures = FixtureClient::new(FixtureSource::in_memory::<_, String, String>([]), Duration::ZERO);
        AppState::with_parts(StorefrontConfig::default(), fixtures, storage)
    }

    #[tokio::test]
    async fn test_session_restored_from_store() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let first = state_over(Arc::clone(&storage));
        first.begin_session(profile()).await.unwrap();

        let second = state_over(storage);
        assert_eq!(second.current_user().await, Some(profile()));
    }

    #[tokio::test]
    async fn test_end_session_wipes_working_state() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let state = state_over(Arc::clone(&storage));
        state.begin_session(profile()).await.unwrap();
        storage.set(keys::CART, "[]").unwrap();
        storage.set(keys::LOCAL_USERS, "[]").unwrap();

        state.end_session().await;

        assert_eq!(state.session().await, SessionState::Anonymous);
        assert_eq!(storage.keys().unwrap(), vec![keys::LOCAL_USERS.to_string()]);
    }

    /// Records the thread each read runs on.
    struct ThreadRecordingStore {
        inner: MemoryStore,
        readers: std::sync::Mutex<Vec<std::thread::ThreadId>>,
    }

    impl KeyValueStore for ThreadRecordingStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.readers.lock().unwrap().push(std::thread::current().id());
            self.inner.get(key)
        }
        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.inner.set(key, value)
        }
        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.inner.remove(key)
        }
        fn compare_and_swap(
            &self,
            key: &str,
            expected: Option<&str>,
            new: Option<&str>,
        ) -> Result<bool, StorageError> {
            self.inner.compare_and_swap(key, expected, new)
        }
        fn keys(&self) -> Result<Vec<String>, StorageError> {
            self.inner.keys()
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_store_reads_leave_the_runtime_thread() {
        let storage = Arc::new(ThreadRecordingStore {
            inner: MemoryStore::new(),
            readers: std::sync::Mutex::new(Vec::new()),
        });
        storage.set(keys::CART, "[1,2]").unwrap();
        let state = state_over(Arc::clone(&storage) as Arc<dyn KeyValueStore>);
        storage.readers.lock().unwrap().clear();

        let list: Vec<u32> = state.load_list(keys::CART).await;
        assert_eq!(list, vec![1, 2]);

        let readers = storage.readers.lock().unwrap();
        assert_eq!(readers.len(), 1);
        assert_ne!(readers[0], std::thread::current().id());
    }

    #[tokio::test]
    async fn test_malformed_snapshot_starts_anonymous() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        storage.set(keys::SESSION, "not json").unwrap();
        let state = state_over(storage);
        assert_eq!(state.session().await, SessionState::Anonymous);
    }
}
