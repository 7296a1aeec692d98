//! Authentication error types.

use thiserror::Error;

use crate::storage::StorageError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] marketstall_core::EmailError),

    /// No user matches the email and password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Email already used by another account.
    #[error("email already registered")]
    EmailTaken,

    /// Nickname already used by another account.
    #[error("nickname already taken")]
    NicknameTaken,

    /// Nickname is blank.
    #[error("nickname must not be empty")]
    InvalidNickname,

    /// Password is blank.
    #[error("password must not be empty")]
    WeakPassword,

    /// The action requires a logged-in user.
    #[error("not logged in")]
    NotLoggedIn,

    /// The session user no longer exists in the catalog.
    #[error("user not found")]
    UserNotFound,

    /// Local store failure.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
