//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `MARKET_FIXTURES` - Fixture directory or `http(s)://` base URL
//!   (default: `crates/storefront/data`)
//! - `MARKET_STORAGE_DIR` - Local store directory (default: `.marketstall`)
//! - `MARKET_PAGE_SIZE` - Items per listing page (default: 12)
//! - `MARKET_SELLER_PAGE_SIZE` - Items per "my products" page (default: 6)
//! - `MARKET_FIXTURE_CACHE_TTL_SECS` - Fixture cache lifetime, 0 disables
//!   (default: 300)
//! - `MARKET_MAX_IMAGE_BYTES` - Largest accepted image upload (default: 5 MiB)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::fixtures::{FixtureError, FixtureSource};

const DEFAULT_FIXTURES: &str = "crates/storefront/data";
const DEFAULT_STORAGE_DIR: &str = ".marketstall";
const DEFAULT_PAGE_SIZE: usize = 12;
const DEFAULT_SELLER_PAGE_SIZE: usize = 6;
const DEFAULT_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Where seed fixtures are read from
    pub fixtures: FixtureSource,
    /// Directory of the file-backed local store
    pub storage_dir: PathBuf,
    /// Product listing page size
    pub page_size: usize,
    /// Seller "my products" page size
    pub seller_page_size: usize,
    /// Fixture cache lifetime
    pub fixture_cache_ttl: Duration,
    /// Largest accepted image, in bytes
    pub max_image_bytes: usize,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            fixtures: FixtureSource::Directory(PathBuf::from(DEFAULT_FIXTURES)),
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            page_size: DEFAULT_PAGE_SIZE,
            seller_page_size: DEFAULT_SELLER_PAGE_SIZE,
            fixture_cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Loads `.env` first when present.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an invalid value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let fixtures_location = get_env_or_default(&lookup, "MARKET_FIXTURES", DEFAULT_FIXTURES);
        let fixtures = FixtureSource::parse(&fixtures_location).map_err(|e: FixtureError| {
            ConfigError::InvalidEnvVar("MARKET_FIXTURES".to_string(), e.to_string())
        })?;

        let storage_dir =
            PathBuf::from(get_env_or_default(&lookup, "MARKET_STORAGE_DIR", DEFAULT_STORAGE_DIR));

        let page_size = parse_positive(&lookup, "MARKET_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        let seller_page_size =
            parse_positive(&lookup, "MARKET_SELLER_PAGE_SIZE", DEFAULT_SELLER_PAGE_SIZE)?;
        let cache_ttl_secs =
            parse_or_default(&lookup, "MARKET_FIXTURE_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS)?;
        let max_image_bytes =
            parse_positive(&lookup, "MARKET_MAX_IMAGE_BYTES", DEFAULT_MAX_IMAGE_BYTES)?;

        Ok(Self {
            fixtures,
            storage_dir,
            page_size,
            seller_page_size,
            fixture_cache_ttl: Duration::from_secs(cache_ttl_secs),
            max_image_bytes,
        })
    }
}

/// Get a variable with a default value.
fn get_env_or_default<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    get_optional_env(lookup, key).unwrap_or_else(|| default.to_string())
}

/// Get an optional variable, treating blank values as unset.
fn get_optional_env<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|value| !value.trim().is_empty())
}

fn parse_or_default<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(lookup, key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

fn parse_positive<F>(lookup: &F, key: &str, default: usize) -> Result<usize, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match parse_or_default(lookup, key, default)? {
        0 => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be greater than zero".to_string(),
        )),
        value => Ok(value),
    }
}
