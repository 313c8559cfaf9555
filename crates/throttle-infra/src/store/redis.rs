//! Redis counter store with connection management and an atomic Lua path.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisError, Script};

use throttle_core::ports::{CounterStore, StoreError, increment_then_expire};

/// Redis connection configuration.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis URL (e.g., redis://localhost:6379)
    pub url: String,
    /// Connection timeout
    pub connect_timeout: Duration,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl RedisConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            connect_timeout: Duration::from_secs(
                std::env::var("REDIS_CONNECT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
        }
    }
}

/// Redis counter store configuration.
#[derive(Debug, Clone)]
pub struct RedisStoreConfig {
    /// Redis connection config
    pub redis: RedisConfig,
    /// Whether throttling is switched on
    pub enabled: bool,
    /// Start windows with a single Lua call instead of INCR then SET
    pub atomic: bool,
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            redis: RedisConfig::default(),
            enabled: true,
            atomic: true,
        }
    }
}

impl RedisStoreConfig {
    pub fn from_env() -> Self {
        Self {
            redis: RedisConfig::from_env(),
            enabled: super::enabled_from_env(),
            atomic: super::parse_enabled(std::env::var("THROTTLE_ATOMIC").ok().as_deref()),
        }
    }
}

/// Redis-backed counter store.
///
/// Counters are plain integer keys; expiry is the Redis TTL.
pub struct RedisCounterStore {
    conn: ConnectionManager,
    config: RedisStoreConfig,
    /// Lua script for atomic increment with expiry
    script: Script,
}

impl RedisCounterStore {
    pub async fn new(config: RedisStoreConfig) -> Result<Self, StoreError> {
        let client = Client::open(config.redis.url.as_str())
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        // Use timeout to prevent hanging if Redis is unreachable
        let conn_manager_fut = ConnectionManager::new(client);
        let conn = tokio::time::timeout(config.redis.connect_timeout, conn_manager_fut)
            .await
            .map_err(|_| StoreError::Timeout)?
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        // Returns the post-increment count
        let script = Script::new(
            r#"
            local current = redis.call('INCR', KEYS[1])
            if current == 1 then
                redis.call('PEXPIRE', KEYS[1], tonumber(ARGV[1]))
            end
            return current
            "#,
        );

        tracing::info!(
            url = %config.redis.url,
            atomic = config.atomic,
            enabled = config.enabled,
            "Connected to Redis counter store"
        );

        Ok(Self {
            conn,
            config,
            script,
        })
    }

    /// Create from environment configuration.
    pub async fn from_env() -> Result<Self, StoreError> {
        Self::new(RedisStoreConfig::from_env()).await
    }
}

/// Redis rejects a zero expiry, so the shortest window is one millisecond.
/// Windows beyond what Redis accepts (a signed 64-bit PX) saturate.
fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis())
        .unwrap_or(u64::MAX)
        .min(i64::MAX as u64)
        .max(1)
}

fn map_err(e: RedisError) -> StoreError {
    if e.is_timeout() {
        StoreError::Timeout
    } else if e.is_connection_refusal() || e.is_connection_dropped() || e.is_io_error() {
        StoreError::Connection(e.to_string())
    } else {
        StoreError::Operation(e.to_string())
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn increment(&self, key: &str) -> Result<Option<u64>, StoreError> {
        let mut conn = self.conn.clone();
        let count: i64 = conn.incr(key, 1).await.map_err(map_err)?;

        // INCR creates missing keys at 1 without a TTL
        if count == 1 {
            Ok(None)
        } else {
            Ok(Some(count as u64))
        }
    }

    async fn write_with_expiry(
        &self,
        key: &str,
        value: u64,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        conn.pset_ex::<_, _, ()>(key, value, ttl_millis(ttl))
            .await
            .map_err(map_err)
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await.map_err(map_err)
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    async fn increment_with_expiry(&self, key: &str, ttl: Duration) -> Result<u64, StoreError> {
        if !self.config.atomic {
            return increment_then_expire(self, key, ttl).await;
        }

        let mut conn = self.conn.clone();
        let count: i64 = self
            .script
            .key(key)
            .arg(ttl_millis(ttl))
            .invoke_async(&mut conn)
            .await
            .map_err(map_err)?;

        Ok(count as u64)
    }
}
