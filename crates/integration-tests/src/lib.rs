//! Integration test harness for the Marketstall storefront.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p marketstall-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `auth_session` - Registration, login and profile edits across restarts
//! - `catalog_listing` - Merged catalog, listing windows and seller products
//! - `cart_checkout` - Cart grouping, selection and checkout
//!
//! Every test gets its own temporary storage directory, removed when the
//! harness is dropped, and reads the seed fixtures shipped in
//! `crates/storefront/data`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::SecretString;
use tempfile::TempDir;

use marketstall_storefront::fixtures::FixtureSource;
use marketstall_storefront::{AppState, StorefrontConfig};

/// Seed buyer account from `mockUsers.json`.
pub const BUYER_EMAIL: &str = "buyer@example.com";
pub const BUYER_PASSWORD: &str = "buyerpass";

/// Seed seller accounts from `mockUsers.json`.
pub const SHOP1_EMAIL: &str = "shop1@example.com";
pub const SHOP1_PASSWORD: &str = "shop1pass";
pub const SHOP2_EMAIL: &str = "shop2@example.com";
pub const SHOP2_PASSWORD: &str = "shop2pass";

/// A storefront backed by a throwaway file store.
///
/// [`TestStorefront::boot`] builds a fresh [`AppState`] over the same
/// directory, which is how tests simulate a page reload or process restart.
pub struct TestStorefront {
    config: StorefrontConfig,
    _storage: TempDir,
}

impl TestStorefront {
    /// Create a storefront with an empty store and the bundled fixtures.
    ///
    /// # Panics
    ///
    /// Panics if the temporary storage directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        let storage = TempDir::new().expect("Failed to create temp dir");
        let config = StorefrontConfig {
            fixtures: FixtureSource::Directory(fixtures_dir()),
            storage_dir: storage.path().to_path_buf(),
            fixture_cache_ttl: Duration::ZERO,
            ..StorefrontConfig::default()
        };
        Self {
            config,
            _storage: storage,
        }
    }

    /// Start a new "page load" over the shared store.
    ///
    /// # Panics
    ///
    /// Panics if the storage directory cannot be created.
    #[must_use]
    pub fn boot(&self) -> AppState {
        AppState::new(self.config.clone()).expect("Failed to open test storage")
    }
}

impl Default for TestStorefront {
    fn default() -> Self {
        Self::new()
    }
}

/// Wrap a test password.
#[must_use]
pub fn secret(value: &str) -> SecretString {
    SecretString::from(value.to_string())
}

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../storefront/data")
}
