//! TTL caches keyed by rounded coordinates.
//!
//! Two implementations share the [`TtlCache`] interface: [`PersistentCache`]
//! (fjall + postcard, survives restarts) for weather snapshots and
//! [`MemoryCache`] (dashmap) for air quality records. Both read time from an
//! injected [`Clock`] and expire entries on read.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use fjall::Keyspace;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fmt::Debug;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task;

use crate::SafetyError;

/// Source of the current time
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *now += chrono::Duration::from_std(by).unwrap_or(chrono::Duration::MAX);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Cache with per-entry time-to-live
#[async_trait]
pub trait TtlCache<V>: Send + Sync {
    /// Returns the value if present and fresh. Expired entries are removed.
    async fn get(&self, key: &str) -> Result<Option<V>>;

    /// Stores a value that expires `ttl` after now. Last writer wins.
    async fn put(&self, key: &str, value: V, ttl: Duration) -> Result<()>;
}

#[derive(Serialize, Deserialize, Clone)]
struct StoredEntry<T> {
    value: T,
    expires_at: i64, // Unix timestamp (milliseconds)
}

fn expiry(clock: &dyn Clock, ttl: Duration) -> Result<i64> {
    let ttl = chrono::Duration::from_std(ttl)?;
    let expires_at = clock
        .now()
        .checked_add_signed(ttl)
        .ok_or(anyhow!("TTL overflow"))?;
    Ok(expires_at.timestamp_millis())
}

/// Durable cache backed by a fjall keyspace
pub struct PersistentCache {
    store: Keyspace,
    clock: Arc<dyn Clock>,
}

fn get_from_store(store: Keyspace, key: Vec<u8>) -> anyhow::Result<Option<Vec<u8>>> {
    Ok(store.get(key)?.map(|v| v.to_vec()))
}

fn open_failed(path: &Path, e: impl std::fmt::Display) -> SafetyError {
    SafetyError::cache(format!("Failed to open cache at {}: {e}", path.display()))
}

impl PersistentCache {
    /// Opens (or creates) the cache database under `path`
    pub fn open(path: impl AsRef<Path>, clock: Arc<dyn Clock>) -> crate::Result<Self> {
        let path = path.as_ref();
        let db = fjall::Database::builder(path)
            .open()
            .map_err(|e| open_failed(path, e))?;
        let items = db
            .keyspace("cache", fjall::KeyspaceCreateOptions::default)
            .map_err(|e| open_failed(path, e))?;
        Ok(PersistentCache {
            store: items,
            clock,
        })
    }

    /// Manually removes a key from the cache.
    pub async fn remove(&self, key: &str) -> Result<()> {
        let key = key.as_bytes().to_vec();
        let store = self.store.clone();
        task::spawn_blocking(move || store.remove(key)).await??;
        Ok(())
    }
}

#[async_trait]
impl<V> TtlCache<V> for PersistentCache
where
    V: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    #[tracing::instrument(name = "query_cache", level = "debug", skip(self))]
    async fn get(&self, key: &str) -> Result<Option<V>> {
        let store = self.store.clone();
        let key_bytes = key.as_bytes().to_vec();

        let maybe_bytes: Option<Vec<u8>> =
            task::spawn_blocking(move || get_from_store(store, key_bytes)).await??;

        let Some(bytes) = maybe_bytes else {
            tracing::debug!("Key not found");
            return Ok(None);
        };

        let entry: StoredEntry<V> = match postcard::from_bytes(&bytes) {
            Ok(entry) => entry,
            Err(err) => {
                // written by an older build with a different layout
                tracing::warn!("Dropping undecodable cache entry: {err}");
                self.remove(key).await?;
                return Ok(None);
            }
        };

        if self.clock.now().timestamp_millis() < entry.expires_at {
            tracing::debug!("Key found and still fresh");
            Ok(Some(entry.value))
        } else {
            tracing::debug!("Key found but expired");
            self.remove(key).await?;
            Ok(None)
        }
    }

    #[tracing::instrument(name = "put_cache", level = "debug", skip(self, value))]
    async fn put(&self, key: &str, value: V, ttl: Duration) -> Result<()> {
        let store = self.store.clone();
        let key = key.as_bytes().to_vec();
        let entry = StoredEntry {
            value,
            expires_at: expiry(self.clock.as_ref(), ttl)?,
        };
        let bytes = postcard::to_stdvec(&entry)?;

        task::spawn_blocking(move || store.insert(key, bytes)).await??;
        Ok(())
    }
}

/// Entries kept by a [`MemoryCache`] unless configured otherwise
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// Process-local cache.
///
/// Expired entries are pruned on every `put`; past `max_entries` the entries
/// closest to expiry are evicted first.
pub struct MemoryCache<V> {
    entries: DashMap<String, StoredEntry<V>>,
    clock: Arc<dyn Clock>,
    max_entries: usize,
}

impl<V> MemoryCache<V> {
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_max_entries(clock, DEFAULT_MAX_ENTRIES)
    }

    #[must_use]
    pub fn with_max_entries(clock: Arc<dyn Clock>, max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
            max_entries: max_entries.max(1),
        }
    }

    /// Number of stored entries, fresh or not
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn prune(&self, now: i64) {
        self.entries.retain(|_, entry| now < entry.expires_at);
        if self.entries.len() <= self.max_entries {
            return;
        }

        let mut by_expiry: Vec<(String, i64)> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().expires_at))
            .collect();
        by_expiry.sort_by_key(|(_, expires_at)| *expires_at);

        let excess = by_expiry.len().saturating_sub(self.max_entries);
        for (key, _) in by_expiry.into_iter().take(excess) {
            self.entries.remove(&key);
        }
        tracing::debug!(evicted = excess, "Memory cache over capacity");
    }
}

#[async_trait]
impl<V> TtlCache<V> for MemoryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Result<Option<V>> {
        let now = self.clock.now().timestamp_millis();

        if let Some(entry) = self.entries.get(key) {
            if now < entry.expires_at {
                tracing::debug!(key, "Memory cache hit");
                return Ok(Some(entry.value.clone()));
            }
        }

        if self
            .entries
            .remove_if(key, |_, entry| now >= entry.expires_at)
            .is_some()
        {
            tracing::debug!(key, "Memory cache entry expired");
        }
        Ok(None)
    }

    async fn put(&self, key: &str, value: V, ttl: Duration) -> Result<()> {
        let expires_at = expiry(self.clock.as_ref(), ttl)?;
        self.entries
            .insert(key.to_string(), StoredEntry { value, expires_at });
        self.prune(self.clock.now().timestamp_millis());
        Ok(())
    }
}
