//! Ports for collaborators the core talks to but does not own
//!
//! The storage pool is used directly by the repositories; the secondary
//! cache and health reporting are expressed as traits so the bootstrap code
//! can plug in whichever adapter the deployment provides.
//!
//! ```rust,ignore
//! let cache: Arc<dyn CachePort> = Arc::new(InMemoryCache::new());
//! let repo = UserRepository::new(pool, cache, hasher);
//! ```

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::CoreResult;

/// Key-value cache used for invalidation and reset
///
/// Implementations must be safe to share between concurrent requests.
#[async_trait]
pub trait CachePort: Send + Sync + 'static {
    /// Reads a cached value
    async fn get(&self, key: &str) -> CoreResult<Option<Vec<u8>>>;

    /// Stores a value, replacing any previous one
    async fn set(&self, key: &str, value: Vec<u8>) -> CoreResult<()>;

    /// Removes a single key; removing a missing key is not an error
    async fn invalidate(&self, key: &str) -> CoreResult<()>;

    /// Drops every cached entry
    async fn reset(&self) -> CoreResult<()>;
}

/// Builds the cache key for an entity, e.g. `user:42`
pub fn cache_key(prefix: &str, id: impl std::fmt::Display) -> String {
    format!("{}:{}", prefix, id)
}

/// Process-local cache adapter
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached entries
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl CachePort for InMemoryCache {
    async fn get(&self, key: &str) -> CoreResult<Option<Vec<u8>>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> CoreResult<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn invalidate(&self, key: &str) -> CoreResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn reset(&self) -> CoreResult<()> {
        self.entries.write().await.clear();
        Ok(())
    }
}

/// Health status for an adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterHealth {
    Healthy,
    Unhealthy,
}

/// Health check result for an adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    /// Adapter identifier
    pub adapter_id: String,
    /// Current health status
    pub status: AdapterHealth,
    /// Latency of the health check in milliseconds
    pub latency_ms: u64,
    /// Optional message with additional details
    pub message: Option<String>,
    /// Timestamp of the health check
    pub checked_at: DateTime<Utc>,
}

impl HealthCheckResult {
    pub fn is_healthy(&self) -> bool {
        self.status == AdapterHealth::Healthy
    }
}

/// Trait for adapters that support health checks
#[async_trait]
pub trait HealthCheckable: Send + Sync {
    /// Performs a health check on the adapter
    async fn health_check(&self) -> HealthCheckResult;
}
