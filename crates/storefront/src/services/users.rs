//! User catalog: seed fixture users merged with local registrations.

use tracing::{instrument, warn};

use marketstall_core::UserId;

use crate::models::{UserRecord, keys};
use crate::state::AppState;

use super::merge::merge_by_id;

/// Read access to the merged user catalog.
pub struct UserCatalog<'a> {
    state: &'a AppState,
}

impl<'a> UserCatalog<'a> {
    /// Create a catalog over the application's fixtures and local store.
    #[must_use]
    pub const fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Seed users. Fetch and parse failures yield an empty list.
    pub async fn seed_users(&self) -> Vec<UserRecord> {
        match self.state.fixtures().seed_users().await {
            Ok(users) => users,
            Err(e) => {
                warn!(error = %e, "failed to load seed users, continuing without them");
                Vec::new()
            }
        }
    }

    /// Locally registered users in storage order. Corrupt rows are skipped.
    pub async fn local_users(&self) -> Vec<UserRecord> {
        self.state.load_list(keys::LOCAL_USERS).await
    }

    /// Seed users followed by local users, ids unique.
    #[instrument(skip(self))]
    pub async fn load_all_users(&self) -> Vec<UserRecord> {
        let seed = self.seed_users().await;
        merge_by_id(seed, self.local_users().await, "user")
    }

    /// Whether no user in the merged catalog has `email`.
    pub async fn check_email_availability(&self, email: &str) -> bool {
        let email = email.trim();
        !self
            .load_all_users()
            .await
            .iter()
            .any(|user| user.email.as_str() == email)
    }

    /// Whether no user in the merged catalog has `nickname`.
    pub async fn check_nickname_availability(&self, nickname: &str) -> bool {
        let nickname = nickname.trim();
        !self
            .load_all_users()
            .await
            .iter()
            .any(|user| user.nickname == nickname)
    }

    /// Look up a user by id.
    pub async fn find_by_id(&self, id: &UserId) -> Option<UserRecord> {
        self.load_all_users()
            .await
            .into_iter()
            .find(|user| &user.id == id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::config::StorefrontConfig;
    use crate::fixtures::{FixtureClient, FixtureSource, USERS_FIXTURE};
    use crate::storage::MemoryStore;

    const SEED: &str = r#"[
        {"id":"1","email":"a@example.com","password":"pw-a","nickname":"alpha"},
        {"id":"2","email":"b@example.com","password":"pw-b","nickname":"beta"}
    ]"#;

    fn state(users_fixture: Option<&str>) -> AppState {
        let files: Vec<(String, String)> = users_fixture
            .map(|body| vec![(USERS_FIXTURE.to_string(), body.to_string())])
            .unwrap_or_default();
        AppState::with_parts(
            StorefrontConfig::default(),
            FixtureClient::new(FixtureSource::in_memory(files), Duration::ZERO),
            Arc::new(MemoryStore::new()),
        )
    }

    #[tokio::test]
    async fn test_seed_then_local_order() {
        let state = state(Some(SEED));
        state
            .storage()
            .set(
                keys::LOCAL_USERS,
                r#"[{"id":"9","email":"c@example.com","password":"pw","nickname":"gamma"}]"#,
            )
            .unwrap();

        let ids: Vec<String> = UserCatalog::new(&state)
            .load_all_users()
            .await
            .into_iter()
            .map(|u| u.id.into_inner())
            .collect();
        assert_eq!(ids, vec!["1", "2", "9"]);
    }

    #[tokio::test]
    async fn test_missing_fixture_and_malformed_store_are_empty() {
        let state = state(None);
        state.storage().set(keys::LOCAL_USERS, "{oops").unwrap();
        assert!(UserCatalog::new(&state).load_all_users().await.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_local_user_keeps_the_others() {
        let state = state(Some(SEED));
        state
            .storage()
            .set(
                keys::LOCAL_USERS,
                r#"[{"id":"8","email":42},
                    {"id":"9","email":"c@example.com","password":"pw","nickname":"gamma"}]"#,
            )
            .unwrap();

        let catalog = UserCatalog::new(&state);
        assert_eq!(catalog.local_users().await.len(), 1);
        assert!(!catalog.check_nickname_availability("gamma").await);
    }

    #[tokio::test]
    async fn test_availability() {
        let state = state(Some(SEED));
        let catalog = UserCatalog::new(&state);
        assert!(!catalog.check_email_availability("a@example.com").await);
        assert!(catalog.check_email_availability("new@example.com").await);
        assert!(!catalog.check_nickname_availability(" beta ").await);
        assert!(catalog.check_nickname_availability("delta").await);
        assert!(catalog.find_by_id(&UserId::new("2")).await.is_some());
        assert!(catalog.find_by_id(&UserId::new("3")).await.is_none());
    }
}
