//! Storage collaborators used by the sign-in flow.
//!
//! - `CacheStore`: a shared byte cache with per-entry TTL, used for Google's key set.
//! - `SessionStore`: string storage scoped to one browser session, used for the CSRF token.
//!
//! Both are traits so applications can back them with Redis, a cookie session layer, etc.
//! In-memory implementations are bundled for single-process servers and tests.
use std::{
    collections::HashMap,
    convert::Infallible,
    sync::{Arc, RwLock},
    time::{Duration, Instant},
};

use thiserror::Error;
use tracing::error;

/// A cache backend shared by every request.
///
/// Must tolerate concurrent `get`/`set`; the crate never locks around a
/// miss, so two callers may both `set` the same key.
pub trait CacheStore: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns the stored bytes, or `None` on a miss.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>, Self::Error>> + Send;

    /// Stores `value` under `key` for at most `ttl`.
    fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Storage scoped to the current user's browser session.
pub trait SessionStore: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send;

    fn set(&self, key: &str, value: String) -> impl Future<Output = Result<(), Self::Error>> + Send;

    fn remove(&self, key: &str) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Store lock poisoned")]
    Poisoned,
}

/// A cache that never holds anything; every lookup is a miss.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl CacheStore for NoCache {
    type Error = Infallible;

    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, Self::Error> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// In-process cache honouring each entry's TTL. Clones share the same entries.
///
/// A TTL too large to represent as an `Instant` keeps the entry forever.
#[derive(Debug, Clone, Default)]
pub struct MemoryCacheStore {
    entries: Arc<RwLock<HashMap<String, (Vec<u8>, Option<Instant>)>>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryCacheStore {
    type Error = StoreError;

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Self::Error> {
        let entries = self.entries.read().map_err(|_| {
            error!("Cache store lock poisoned");
            StoreError::Poisoned
        })?;
        Ok(entries
            .get(key)
            .filter(|(_, expires_at)| expires_at.is_none_or(|at| Instant::now() < at))
            .map(|(value, _)| value.clone()))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), Self::Error> {
        let mut entries = self.entries.write().map_err(|_| {
            error!("Cache store lock poisoned");
            StoreError::Poisoned
        })?;
        entries.insert(key.to_string(), (value, Instant::now().checked_add(ttl)));
        Ok(())
    }
}

/// In-process session storage for one browser session. Clones share the same values.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    values: Arc<RwLock<HashMap<String, String>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    type Error = StoreError;

    async fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
        let values = self.values.read().map_err(|_| StoreError::Poisoned)?;
        Ok(values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), Self::Error> {
        let mut values = self.values.write().map_err(|_| StoreError::Poisoned)?;
        values.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), Self::Error> {
        let mut values = self.values.write().map_err(|_| StoreError::Poisoned)?;
        values.remove(key);
        Ok(())
    }
}
