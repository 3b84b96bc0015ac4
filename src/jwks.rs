//! Fetching and caching Google's JSON Web Key Set (JWKS).
//!
//! Google rotates the keys that sign IDTokens and publishes the current set at
//! `https://www.googleapis.com/oauth2/v3/certs`. `KeyCache` fetches that set and,
//! when a `CacheStore` is configured, keeps it for the configured TTL so that a
//! login does not cost an extra round trip.
//!
//! The set is always replaced as a whole, never merged with an older copy.
use http::Request;
use jsonwebtoken::get_current_timestamp;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::{
    config::{CacheConfig, Config},
    error::Error,
    executer::Executer,
    store::{CacheStore, NoCache},
};

/// A single JSON Web Key as published by Google (RFC 7517).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Jwk {
    pub kid: String,
    pub kty: String,
    pub alg: Option<String>,
    #[serde(rename = "use")]
    pub use_purpose: Option<String>,
    pub n: Option<String>,
    pub e: Option<String>,
}

/// The JSON Web Key Set, looked up by key id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JwkSet {
    pub keys: Vec<Jwk>,
}

impl JwkSet {
    /// Returns the key whose `kid` matches.
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|key| key.kid == kid)
    }
}

/// What is written to the cache backend: the set plus when it was fetched.
///
/// The entry is only served while `now < fetched_at + ttl`, whatever the
/// backend's own expiry policy is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedKeySetEntry {
    pub key_set: JwkSet,
    pub fetched_at: u64,
    pub ttl: u64,
}

impl CachedKeySetEntry {
    pub fn is_fresh(&self, now: u64) -> bool {
        now < self.fetched_at.saturating_add(self.ttl)
    }
}

/// Fetches Google's key set, optionally through a `CacheStore`.
///
/// Concurrent misses may both fetch and both write; the value written is the
/// same upstream document, so the last write simply wins.
pub struct KeyCache<E, C = NoCache> {
    executer: E,
    jwks_uri: String,
    cache: Option<(C, CacheConfig)>,
}

impl<E> KeyCache<E>
where
    E: Executer,
{
    /// A key cache without a backend: every call fetches.
    pub fn new(config: &Config, executer: E) -> Self {
        Self {
            executer,
            jwks_uri: config.jwks_uri().to_string(),
            cache: None,
        }
    }
}

impl<E, C> KeyCache<E, C>
where
    E: Executer,
    C: CacheStore,
{
    /// A key cache backed by `store`, using the key and TTL from `config.cache()`.
    pub fn with_cache(config: &Config, executer: E, store: C) -> Self {
        Self {
            executer,
            jwks_uri: config.jwks_uri().to_string(),
            cache: Some((store, config.cache().to_owned())),
        }
    }

    /// Returns the current key set.
    ///
    /// A fetch failure is returned as is and nothing is written to the cache.
    pub async fn get_key_set(&self) -> Result<JwkSet, Error> {
        let Some((store, cache_config)) = &self.cache else {
            return self.fetch().await;
        };

        let cached = store.get(cache_config.key()).await.map_err(|e| {
            error!("Failed to read JWKS from cache: {}", e);
            Error::Cache(Box::new(e))
        })?;

        if let Some(bytes) = cached {
            match serde_json::from_slice::<CachedKeySetEntry>(&bytes) {
                Ok(entry) if entry.is_fresh(get_current_timestamp()) => {
                    debug!("JWKS cache hit for key {}", cache_config.key());
                    return Ok(entry.key_set);
                }
                Ok(_) => debug!("JWKS cache entry expired"),
                Err(e) => warn!("Discarding undecodable JWKS cache entry: {}", e),
            }
        }

        debug!("JWKS cache miss. Fetching from {}", self.jwks_uri);
        let key_set = self.fetch().await?;
        let entry = CachedKeySetEntry {
            key_set,
            fetched_at: get_current_timestamp(),
            ttl: cache_config.ttl().as_secs(),
        };

        let bytes = serde_json::to_vec(&entry).map_err(|e| {
            error!("Failed to serialize JWKS cache entry: {}", e);
            Error::Cache(Box::new(e))
        })?;
        store
            .set(cache_config.key(), bytes, cache_config.ttl())
            .await
            .map_err(|e| {
                error!("Failed to write JWKS to cache: {}", e);
                Error::Cache(Box::new(e))
            })?;

        Ok(entry.key_set)
    }

    async fn fetch(&self) -> Result<JwkSet, Error> {
        let req = Request::get(self.jwks_uri.as_str())
            .body(Vec::new())
            .map_err(|e| {
                error!("Failed to build JWKS request: {}", e);
                Error::URL
            })?;

        let res = self.executer.execute(req).await.map_err(|e| {
            error!("Failed to fetch JWKS: {}", e);
            Error::Transport(Box::new(e))
        })?;

        let status = res.status().as_u16();
        let key_set = serde_json::from_slice::<JwkSet>(res.body()).map_err(|e| {
            error!("Failed to parse JWKS: {}", e);
            Error::UnexpectedResponse {
                status,
                body: String::from_utf8_lossy(res.body()).into_owned(),
            }
        })?;
        debug!("Fetched {} keys", key_set.keys.len());
        Ok(key_set)
    }
}
