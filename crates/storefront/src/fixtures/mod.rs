//! Seed fixture client.
//!
//! Reads the read-only JSON fixtures (`mockUsers.json`, `mockItems.json`,
//! `carousel.json`) from a directory, an HTTP base URL, or an in-memory
//! table. Raw bodies are cached with `moka` for the configured TTL.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::models::{CarouselItem, SeedProduct, UserRecord};
use crate::storage::decode_list;

/// Seed user list.
pub const USERS_FIXTURE: &str = "mockUsers.json";
/// Seed product list.
pub const ITEMS_FIXTURE: &str = "mockItems.json";
/// Home page banners.
pub const CAROUSEL_FIXTURE: &str = "carousel.json";

/// Errors fetching or decoding a fixture.
#[derive(Debug, Error)]
pub enum FixtureError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("fixture {name} returned HTTP {status}")]
    Status { name: String, status: u16 },

    /// Reading the fixture file failed.
    #[error("failed to read fixture {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// No fixture with this name exists.
    #[error("fixture not found: {0}")]
    NotFound(String),

    /// The fixture body is not the expected JSON.
    #[error("failed to parse fixture {name}: {source}")]
    Parse {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    /// The fixture URL could not be built.
    #[error("invalid fixture URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Where fixtures are read from.
#[derive(Debug, Clone)]
pub enum FixtureSource {
    Directory(PathBuf),
    Http(Url),
    InMemory(HashMap<String, String>),
}

impl FixtureSource {
    /// Interpret a configured location: `http(s)://` URLs are fetched over
    /// HTTP, anything else is a directory path.
    ///
    /// # Errors
    ///
    /// Returns an error if an `http(s)://` value is not a valid URL.
    pub fn parse(location: &str) -> Result<Self, FixtureError> {
        if location.starts_with("http://") || location.starts_with("https://") {
            let mut url = Url::parse(location)?;
            // Url::join drops the last path segment without a trailing slash.
            if !url.path().ends_with('/') {
                let path = format!("{}/", url.path());
                url.set_path(&path);
            }
            Ok(Self::Http(url))
        } else {
            Ok(Self::Directory(PathBuf::from(location)))
        }
    }

    /// In-memory fixtures keyed by file name.
    #[must_use]
    pub fn in_memory<I, K, V>(files: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::InMemory(
            files
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

// =============================================================================
// FixtureClient
// =============================================================================

/// Client for the seed fixtures.
///
/// Cheap to clone; clones share the HTTP client and cache.
#[derive(Clone)]
pub struct FixtureClient {
    inner: Arc<FixtureClientInner>,
}

struct FixtureClientInner {
    source: FixtureSource,
    http: reqwest::Client,
    cache: Option<Cache<String, Arc<str>>>,
}

impl FixtureClient {
    /// Create a client. A zero `cache_ttl` disables caching.
    #[must_use]
    pub fn new(source: FixtureSource, cache_ttl: Duration) -> Self {
        let cache = (!cache_ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(16)
                .time_to_live(cache_ttl)
                .build()
        });

        Self {
            inner: Arc::new(FixtureClientInner {
                source,
                http: reqwest::Client::new(),
                cache,
            }),
        }
    }

    /// The configured source.
    #[must_use]
    pub fn source(&self) -> &FixtureSource {
        &self.inner.source
    }

    /// Fetch the raw body of fixture `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the fixture is missing or cannot be read.
    #[instrument(skip(self))]
    pub async fn fetch_raw(&self, name: &str) -> Result<Arc<str>, FixtureError> {
        if let Some(cache) = &self.inner.cache
            && let Some(body) = cache.get(name).await
        {
            debug!(name, "fixture cache hit");
            return Ok(body);
        }

        let body: Arc<str> = match &self.inner.source {
            FixtureSource::Directory(dir) => {
                let path = dir.join(name);
                match tokio::fs::read_to_string(&path).await {
                    Ok(body) => body.into(),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                        return Err(FixtureError::NotFound(name.to_string()));
                    }
                    Err(source) => {
                        return Err(FixtureError::Io {
                            name: name.to_string(),
                            source,
                        });
                    }
                }
            }
            FixtureSource::Http(base) => {
                let url = base.join(name)?;
                let response = self.inner.http.get(url).send().await?;
                let status = response.status();
                if status == reqwest::StatusCode::NOT_FOUND {
                    return Err(FixtureError::NotFound(name.to_string()));
                }
                if !status.is_success() {
                    return Err(FixtureError::Status {
                        name: name.to_string(),
                        status: status.as_u16(),
                    });
                }
                response.text().await?.into()
            }
            FixtureSource::InMemory(files) => files
                .get(name)
                .map(|body| Arc::from(body.as_str()))
                .ok_or_else(|| FixtureError::NotFound(name.to_string()))?,
        };

        if let Some(cache) = &self.inner.cache {
            cache.insert(name.to_string(), Arc::clone(&body)).await;
        }
        Ok(body)
    }

    /// Fetch a JSON array fixture, decoding each row on its own.
    ///
    /// Rows that are not a valid `T` are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the fixture cannot be fetched or is not an array.
    pub async fn fetch_list<T: DeserializeOwned>(&self, name: &str) -> Result<Vec<T>, FixtureError> {
        let body = self.fetch_raw(name).await?;
        decode_list(name, &body).map_err(|source| FixtureError::Parse {
            name: name.to_string(),
            source,
        })
    }

    /// Seed users.
    ///
    /// # Errors
    ///
    /// Returns an error if `mockUsers.json` cannot be fetched or is not an array.
    pub async fn seed_users(&self) -> Result<Vec<UserRecord>, FixtureError> {
        self.fetch_list(USERS_FIXTURE).await
    }

    /// Seed products.
    ///
    /// # Errors
    ///
    /// Returns an error if `mockItems.json` cannot be fetched or is not an array.
    pub async fn seed_products(&self) -> Result<Vec<SeedProduct>, FixtureError> {
        self.fetch_list(ITEMS_FIXTURE).await
    }

    /// Carousel banners.
    ///
    /// # Errors
    ///
    /// Returns an error if `carousel.json` cannot be fetched or is not an array.
    pub async fn carousel(&self) -> Result<Vec<CarouselItem>, FixtureError> {
        self.fetch_list(CAROUSEL_FIXTURE).await
    }

    /// Drop every cached body.
    pub fn invalidate_all(&self) {
        if let Some(cache) = &self.inner.cache {
            cache.invalidate_all();
        }
    }
}

impl std::fmt::Debug for FixtureClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixtureClient")
            .field("source", &self.inner.source)
            .field("cached", &self.inner.cache.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_source() {
        match FixtureSource::parse("https://cdn.example.com/mock").unwrap() {
            FixtureSource::Http(url) => {
                assert_eq!(url.join(ITEMS_FIXTURE).unwrap().as_str(),
                    "https://cdn.example.com/mock/mockItems.json");
            }
            other => panic!("unexpected source: {other:?}"),
        }
        assert!(matches!(
            FixtureSource::parse("crates/storefront/data").unwrap(),
            FixtureSource::Directory(_)
        ));
        assert!(FixtureSource::parse("http://").is_err());
    }

    #[tokio::test]
    async fn test_in_memory_fetch() {
        let client = FixtureClient::new(
            FixtureSource::in_memory([(CAROUSEL_FIXTURE, r#"[{"id":"1","image":"/a.png"}]"#)]),
            Duration::ZERO,
        );
        let banners = client.carousel().await.unwrap();
        assert_eq!(banners.len(), 1);
        assert!(matches!(
            client.seed_users().await,
            Err(FixtureError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_parse_error_names_fixture() {
        let client = FixtureClient::new(
            FixtureSource::in_memory([(ITEMS_FIXTURE, "{")]),
            Duration::from_secs(60),
        );
        let err = client.seed_products().await.unwrap_err();
        assert!(err.to_string().contains(ITEMS_FIXTURE));
    }

    #[tokio::test]
    async fn test_malformed_user_row_keeps_the_others() {
        let client = FixtureClient::new(
            FixtureSource::in_memory([(
                USERS_FIXTURE,
                r#"[{"id":"1","email":"one@example.com","password":"pw","nickname":"one"},
                    {"id":"2","email":42},
                    {"id":"3","email":"three@example.com","password":"pw","nickname":"three"}]"#,
            )]),
            Duration::ZERO,
        );
        let nicknames: Vec<String> = client
            .seed_users()
            .await
            .unwrap()
            .into_iter()
            .map(|user| user.nickname)
            .collect();
        assert_eq!(nicknames, vec!["one", "three"]);
    }

    #[tokio::test]
    async fn test_directory_fetch_is_cached() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(USERS_FIXTURE), "[]").unwrap();

        let client = FixtureClient::new(
            FixtureSource::Directory(dir.path().to_path_buf()),
            Duration::from_secs(60),
        );
        assert!(client.seed_users().await.unwrap().is_empty());

        std::fs::remove_file(dir.path().join(USERS_FIXTURE)).unwrap();
        assert!(client.seed_users().await.unwrap().is_empty());

        client.invalidate_all();
        client.inner.cache.as_ref().unwrap().run_pending_tasks().await;
        assert!(matches!(
            client.seed_users().await,
            Err(FixtureError::NotFound(_))
        ));
    }
}
