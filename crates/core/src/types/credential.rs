//! Credential types.
//!
//! Mock accounts keep their password in plaintext, exactly as the seed
//! fixtures ship it. [`Password`] never prints its contents.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A plaintext account password.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Password(String);

impl Password {
    /// Wrap a plaintext password.
    #[must_use]
    pub fn new(password: impl Into<String>) -> Self {
        Self(password.into())
    }

    /// Exact comparison against a candidate.
    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        self.0 == candidate
    }

    /// Whether the password is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts() {
        let password = Password::new("hunter22");
        let debug = format!("{password:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("hunter22"));
    }

    #[test]
    fn test_matches_is_exact() {
        let password = Password::new("abc123");
        assert!(password.matches("abc123"));
        assert!(!password.matches("ABC123"));
        assert!(!password.matches("abc123 "));
    }
}
