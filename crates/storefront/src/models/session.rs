//! Session-related types.
//!
//! The session state lives in [`crate::state::AppState`]; its snapshot is
//! persisted under [`keys::SESSION`] so it survives a restart.

use serde::{Deserialize, Serialize};

use super::user::UserProfile;

/// Authentication state of the running application.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Anonymous,
    Authenticated(UserProfile),
}

impl SessionState {
    /// The logged-in user, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&UserProfile> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(user) => Some(user),
        }
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

/// Persisted form of an authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub user: UserProfile,
}

/// Local store keys.
pub mod keys {
    /// Persisted session snapshot.
    pub const SESSION: &str = "session";

    /// Users registered locally (and shadow copies of edited seed users).
    pub const LOCAL_USERS: &str = "local_users";

    /// Products created by sellers.
    pub const LOCAL_PRODUCTS: &str = "local_products";

    /// Cart entries.
    pub const CART: &str = "cart";

    /// Summary of the most recent checkout.
    pub const LAST_ORDER: &str = "last_order";

    /// Keys wiped on logout.
    pub const WORKING_STATE: &[&str] = &[SESSION, CART, LAST_ORDER];
}
