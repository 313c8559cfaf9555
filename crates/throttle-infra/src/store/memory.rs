//! In-memory counter store - used when Redis is unavailable and in tests.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use throttle_core::ports::{CounterStore, StoreError};

/// Entry count above which starting a new window also sweeps lapsed counters.
const DEFAULT_PURGE_THRESHOLD: usize = 10_000;

/// In-memory store configuration.
#[derive(Debug, Clone)]
pub struct MemoryStoreConfig {
    /// Whether throttling is switched on.
    pub enabled: bool,
    /// Sweep lapsed counters when a write finds at least this many entries.
    pub purge_threshold: usize,
}

impl Default for MemoryStoreConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            purge_threshold: DEFAULT_PURGE_THRESHOLD,
        }
    }
}

impl MemoryStoreConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            enabled: super::enabled_from_env(),
            purge_threshold: std::env::var("THROTTLE_MEMORY_PURGE_THRESHOLD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_PURGE_THRESHOLD),
        }
    }
}

struct CounterEntry {
    value: u64,
    expires_at: Option<Instant>,
}

impl CounterEntry {
    /// A window too long to represent never lapses.
    fn starting(value: u64, now: Instant, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: now.checked_add(ttl),
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map(|exp| now >= exp).unwrap_or(false)
    }
}

/// Process-local counter store backed by a `HashMap` behind an async `RwLock`.
///
/// Note: counters are per-process, not shared across instances, and are lost
/// on restart. Lapsed counters are dropped lazily: on the next increment of
/// the same key, or in a sweep once a write finds `purge_threshold` or more
/// entries. [`InMemoryCounterStore::purge_expired`] runs
/// the sweep on demand.
pub struct InMemoryCounterStore {
    store: RwLock<HashMap<String, CounterEntry>>,
    config: MemoryStoreConfig,
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self::with_config(MemoryStoreConfig::default())
    }

    pub fn with_config(config: MemoryStoreConfig) -> Self {
        Self {
            store: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Create from environment configuration.
    pub fn from_env() -> Self {
        Self::with_config(MemoryStoreConfig::from_env())
    }

    /// Current value of a live counter.
    pub async fn get(&self, key: &str) -> Option<u64> {
        let store = self.store.read().await;
        store
            .get(key)
            .filter(|entry| !entry.is_expired(Instant::now()))
            .map(|entry| entry.value)
    }

    /// Number of entries held, including lapsed ones not yet purged.
    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop every lapsed counter. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let mut store = self.store.write().await;
        Self::sweep(&mut store, Instant::now())
    }

    fn sweep(store: &mut HashMap<String, CounterEntry>, now: Instant) -> usize {
        let before = store.len();
        store.retain(|_, entry| !entry.is_expired(now));
        let purged = before - store.len();

        if purged > 0 {
            tracing::debug!(purged, "Purged expired throttle counters");
        }
        purged
    }

    fn maybe_sweep(&self, store: &mut HashMap<String, CounterEntry>, now: Instant) {
        if store.len() >= self.config.purge_threshold {
            Self::sweep(store, now);
        }
    }
}

impl Default for InMemoryCounterStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn increment(&self, key: &str) -> Result<Option<u64>, StoreError> {
        let now = Instant::now();
        let mut store = self.store.write().await;

        match store.get_mut(key) {
            Some(entry) if !entry.is_expired(now) => {
                entry.value += 1;
                Ok(Some(entry.value))
            }
            Some(_) => {
                // Lapsed window, clean up and report as absent
                store.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn write_with_expiry(
        &self,
        key: &str,
        value: u64,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let now = Instant::now();
        let mut store = self.store.write().await;

        self.maybe_sweep(&mut store, now);
        store.insert(key.to_string(), CounterEntry::starting(value, now, ttl));

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut store = self.store.write().await;
        store.remove(key);
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Increment-or-start under one write lock, so concurrent first calls
    /// on a key cannot both open a window.
    async fn increment_with_expiry(&self, key: &str, ttl: Duration) -> Result<u64, StoreError> {
        let now = Instant::now();
        let mut store = self.store.write().await;

        if let Some(entry) = store.get_mut(key) {
            if !entry.is_expired(now) {
                entry.value += 1;
                return Ok(entry.value);
            }
        }

        self.maybe_sweep(&mut store, now);
        store.insert(key.to_string(), CounterEntry::starting(1, now, ttl));
        tracing::debug!(key = %key, ttl_ms = ttl.as_millis() as u64, "Started throttle window");

        Ok(1)
    }
}
