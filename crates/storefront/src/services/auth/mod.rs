//! Authentication service.
//!
//! Mock login against the merged user catalog. Passwords are compared in
//! plaintext; this is fixture data, not a security model.

mod error;

pub use error::AuthError;

use std::collections::HashSet;

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, instrument};

use marketstall_core::{Email, Password, UserId};

use crate::models::{ProfilePatch, Registration, UserProfile, UserRecord, keys};
use crate::state::AppState;
use crate::storage::update_list;

use super::users::UserCatalog;

/// Authentication service.
///
/// Handles login, logout, registration and profile edits.
pub struct AuthService<'a> {
    state: &'a AppState,
    users: UserCatalog<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub fn new(state: &'a AppState) -> Self {
        Self {
            state,
            users: UserCatalog::new(state),
        }
    }

    /// The logged-in user, if any.
    pub async fn current_user(&self) -> Option<UserProfile> {
        self.state.current_user().await
    }

    /// The logged-in user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotLoggedIn` when anonymous.
    pub async fn require_user(&self) -> Result<UserProfile, AuthError> {
        self.current_user().await.ok_or(AuthError::NotLoggedIn)
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Log in with email and password.
    ///
    /// The first merged user whose email and password both match becomes the
    /// session user. The returned profile never carries the password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if no user matches, or a
    /// storage error if the session cannot be persisted. The session is
    /// unchanged on error.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<UserProfile, AuthError> {
        let email = email.trim();
        let password = password.expose_secret();

        let profile = self
            .users
            .load_all_users()
            .await
            .iter()
            .find(|user| user.email.as_str() == email && user.password.matches(password))
            .map(UserProfile::from)
            .ok_or(AuthError::InvalidCredentials)?;

        self.state.begin_session(profile.clone()).await?;
        info!(user_id = %profile.id, "user logged in");
        Ok(profile)
    }

    /// Log out and wipe the session, cart and last order.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        let user = self.current_user().await;
        self.state.end_session().await;
        if let Some(user) = user {
            info!(user_id = %user.id, "user logged out");
        }
    }

    /// Register a new local user. Does not log in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail`, `AuthError::InvalidNickname` or
    /// `AuthError::WeakPassword` for bad input, `AuthError::EmailTaken` or
    /// `AuthError::NicknameTaken` if either is already used in the merged
    /// catalog, or a storage error. Nothing is written on error.
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(&self, registration: &Registration) -> Result<UserProfile, AuthError> {
        let email = Email::parse(registration.email.trim())?;
        let nickname = registration.nickname.trim();
        if nickname.is_empty() {
            return Err(AuthError::InvalidNickname);
        }
        let password = registration.password.expose_secret();
        if password.is_empty() {
            return Err(AuthError::WeakPassword);
        }

        let candidate = UserRecord {
            id: UserId::default(),
            email,
            password: Password::new(password),
            nickname: nickname.to_string(),
            name: registration.name.trim().to_string(),
            phone: registration.phone.trim().to_string(),
            postal_code: registration.postal_code.trim().to_string(),
            basic_address: registration.basic_address.trim().to_string(),
            detail_address: registration.detail_address.trim().to_string(),
            image: String::new(),
        };
        let seed = self.users.seed_users().await;

        let record = self
            .state
            .with_store(move |store| {
                update_list(store, keys::LOCAL_USERS, |local: &mut Vec<UserRecord>| {
                    let everyone = || seed.iter().chain(local.iter());
                    if everyone().any(|user| user.email == candidate.email) {
                        return Err(AuthError::EmailTaken);
                    }
                    if everyone().any(|user| user.nickname == candidate.nickname) {
                        return Err(AuthError::NicknameTaken);
                    }

                    let taken: HashSet<&UserId> = everyone().map(|user| &user.id).collect();
                    let record = UserRecord {
                        id: next_user_id(&taken),
                        ..candidate.clone()
                    };
                    local.push(record.clone());
                    Ok(record)
                })
            })
            .await??;

        info!(user_id = %record.id, "user registered");
        Ok(UserProfile::from(&record))
    }

    /// Whether `password` is the session user's current password.
    ///
    /// False when anonymous or when the user can no longer be found.
    #[instrument(skip(self, password))]
    pub async fn check_password(&self, password: &SecretString) -> bool {
        let Some(user) = self.current_user().await else {
            return false;
        };
        self.users
            .find_by_id(&user.id)
            .await
            .is_some_and(|record| record.password.matches(password.expose_secret()))
    }

    /// Apply `patch` to the session user's record and session.
    ///
    /// The first edit of a seed user stores a local copy that shadows the
    /// seed record from then on.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotLoggedIn` when anonymous (nothing is written),
    /// `AuthError::UserNotFound` if the session user is in neither list, or a
    /// storage error.
    #[instrument(skip(self, patch))]
    pub async fn update_user_profile(&self, patch: &ProfilePatch) -> Result<UserProfile, AuthError> {
        let user = self.require_user().await?;
        let seed = self.users.seed_users().await;

        let patch = patch.clone();
        let user_id = user.id;
        let updated = self
            .state
            .with_store(move |store| {
                update_list(store, keys::LOCAL_USERS, |local: &mut Vec<UserRecord>| {
                    if let Some(record) = local.iter_mut().find(|record| record.id == user_id) {
                        patch.apply_to_record(record);
                        return Ok(record.clone());
                    }
                    let Some(mut shadow) = seed.iter().find(|record| record.id == user_id).cloned()
                    else {
                        return Err(AuthError::UserNotFound);
                    };
                    patch.apply_to_record(&mut shadow);
                    local.push(shadow.clone());
                    Ok(shadow)
                })
            })
            .await??;

        let profile = UserProfile::from(&updated);
        self.state.begin_session(profile.clone()).await?;
        info!(user_id = %profile.id, "profile updated");
        Ok(profile)
    }
}

/// Timestamp-based user id not present in `taken`.
fn next_user_id(taken: &HashSet<&UserId>) -> UserId {
    let mut candidate = Utc::now().timestamp_millis();
    loop {
        let id = UserId::new(candidate.to_string());
        if !taken.contains(&id) {
            return id;
        }
        candidate += 1;
    }
}
