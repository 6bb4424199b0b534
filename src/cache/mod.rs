//! Cache layer: a Redis wrapper with an in-memory fallback.
//!
//! Cache failures never reach callers; they are logged and treated as misses.

use crate::config::RedisConfig;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("Cache is not connected")]
    Disconnected,
}

#[async_trait::async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError>;
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
    async fn exists(&self, key: &str) -> Result<bool, CacheError>;
    async fn clear(&self) -> Result<(), CacheError>;
    /// Short backend name for health output
    fn backend(&self) -> &'static str;
}

// In-memory cache implementation as fallback
#[derive(Debug, Clone, Default)]
pub struct InMemoryCache {
    store: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn new(value: String, ttl: Option<Duration>) -> Self {
        Self {
            value,
            expires_at: ttl.map(|d| Instant::now() + d),
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl CacheBackend for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        {
            let store = self.store.read().await;
            match store.get(key) {
                Some(entry) if !entry.is_expired() => return Ok(Some(entry.value.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }
        self.store.write().await.remove(key);
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        self.store
            .write()
            .await
            .insert(key.to_string(), CacheEntry::new(value.to_string(), ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.store.write().await.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        let store = self.store.read().await;
        Ok(store.get(key).is_some_and(|entry| !entry.is_expired()))
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.store.write().await.clear();
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// Thin wrapper over a Redis connection manager.
///
/// Every operation checks the connected flag first and swallows errors into
/// `None`/`false`. Reconnection is left to the connection manager.
#[derive(Clone)]
pub struct RedisCache {
    url: String,
    connection: Option<ConnectionManager>,
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache")
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl RedisCache {
    /// Creates a disconnected wrapper for the configured server
    pub fn new(config: &RedisConfig) -> Self {
        Self {
            url: config.url(),
            connection: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Opens the connection. Failure is logged and leaves the wrapper disconnected.
    pub async fn connect(&mut self) -> bool {
        let client = match redis::Client::open(self.url.as_str()) {
            Ok(client) => client,
            Err(e) => {
                warn!(error = %e, "Invalid Redis URL");
                return false;
            }
        };

        match tokio::time::timeout(CONNECT_TIMEOUT, ConnectionManager::new(client)).await {
            Ok(Ok(manager)) => {
                info!("Connected to Redis");
                self.connection = Some(manager);
                true
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Redis connection failed");
                false
            }
            Err(_) => {
                warn!("Redis connection timed out after {:?}", CONNECT_TIMEOUT);
                false
            }
        }
    }

    /// Drops the connection and clears the connected flag
    pub fn disconnect(&mut self) {
        self.connection = None;
    }

    fn conn(&self) -> Result<ConnectionManager, CacheError> {
        self.connection.clone().ok_or(CacheError::Disconnected)
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        swallow("get", key, self.try_get(key).await).flatten()
    }

    pub async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> bool {
        swallow("set", key, self.try_set(key, value, ttl).await).is_some()
    }

    pub async fn del(&self, key: &str) -> bool {
        swallow("del", key, self.try_del(key).await).is_some()
    }

    pub async fn exists(&self, key: &str) -> bool {
        swallow("exists", key, self.try_exists(key).await).unwrap_or(false)
    }

    pub async fn flush_all(&self) -> bool {
        swallow("flushall", "*", self.try_flush_all().await).is_some()
    }

    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get(key).await?;
        swallow("get_json", key, serde_json::from_str(&raw).map_err(CacheError::from))
    }

    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl: Option<Duration>) -> bool {
        match serde_json::to_string(value) {
            Ok(raw) => self.set(key, &raw, ttl).await,
            Err(e) => {
                warn!(key, error = %e, "Failed to serialize cache value");
                false
            }
        }
    }

    async fn try_get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn()?;
        Ok(conn.get(key).await?)
    }

    async fn try_set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        let mut conn = self.conn()?;
        match ttl {
            Some(ttl) => {
                let secs = ttl.as_secs().max(1) as usize;
                conn.set_ex::<_, _, ()>(key, value, secs).await?
            }
            None => conn.set::<_, _, ()>(key, value).await?,
        }
        Ok(())
    }

    async fn try_del(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn()?;
        conn.del::<_, i64>(key).await?;
        Ok(())
    }

    async fn try_exists(&self, key: &str) -> Result<bool, CacheError> {
        let mut conn = self.conn()?;
        Ok(conn.exists(key).await?)
    }

    async fn try_flush_all(&self) -> Result<(), CacheError> {
        let mut conn = self.conn()?;
        redis::cmd("FLUSHALL")
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }
}

fn swallow<T>(op: &str, key: &str, result: Result<T, CacheError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(CacheError::Disconnected) => {
            debug!(op, key, "Redis not connected, skipping");
            None
        }
        Err(e) => {
            warn!(op, key, error = %e, "Redis operation failed");
            None
        }
    }
}

#[async_trait::async_trait]
impl CacheBackend for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.try_get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        self.try_set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.try_del(key).await
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        self.try_exists(key).await
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.try_flush_all().await
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

/// Reads and decodes a JSON value; any failure is a miss
pub async fn read_json<T: DeserializeOwned>(cache: &dyn CacheBackend, key: &str) -> Option<T> {
    let raw = swallow("get", key, cache.get(key).await).flatten()?;
    swallow("decode", key, serde_json::from_str(&raw).map_err(CacheError::from))
}

/// Encodes and stores a JSON value; failures are logged only
pub async fn write_json<T: Serialize>(
    cache: &dyn CacheBackend,
    key: &str,
    value: &T,
    ttl: Option<Duration>,
) {
    let raw = match serde_json::to_string(value) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(key, error = %e, "Failed to serialize cache value");
            return;
        }
    };
    swallow("set", key, cache.set(key, &raw, ttl).await);
}

/// Removes a key; failures are logged only
pub async fn invalidate(cache: &dyn CacheBackend, key: &str) {
    swallow("del", key, cache.delete(key).await);
}

// Cache factory
pub struct CacheFactory;

impl CacheFactory {
    /// Redis when enabled and reachable, otherwise the in-memory cache
    pub async fn create_cache(config: &RedisConfig) -> Arc<dyn CacheBackend> {
        if !config.enabled {
            info!("Redis disabled; using in-memory cache");
            return Arc::new(InMemoryCache::new());
        }

        let mut redis = RedisCache::new(config);
        if redis.connect().await {
            Arc::new(redis)
        } else {
            warn!("Falling back to in-memory cache");
            Arc::new(InMemoryCache::new())
        }
    }
}
