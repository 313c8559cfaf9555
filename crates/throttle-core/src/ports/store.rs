//! Counter store port.

use async_trait::async_trait;
use std::time::Duration;

/// Counter store trait - abstraction over the shared key-value backend
/// (Redis, in-memory) that owns every throttle counter and its expiry.
///
/// Implementations must make [`CounterStore::increment`] atomic across
/// concurrent callers; the limiter holds no locks of its own.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Atomically increment the counter at `key`.
    ///
    /// Returns `Ok(None)` when no live counter existed before this call.
    async fn increment(&self, key: &str) -> Result<Option<u64>, StoreError>;

    /// Unconditionally set `key` to `value`, expiring after `ttl`.
    async fn write_with_expiry(&self, key: &str, value: u64, ttl: Duration)
    -> Result<(), StoreError>;

    /// Delete a key. Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Process-wide switch; when false every throttle is a no-op.
    fn is_enabled(&self) -> bool {
        true
    }

    /// Increment `key`, starting a fresh window of length `ttl` when no
    /// counter existed. Returns the post-increment count.
    ///
    /// The provided implementation issues two separate store calls, so two
    /// callers racing on first use may both write the initial expiry. Both
    /// write `1`, last write wins. Backends with a single atomic primitive
    /// should override this.
    async fn increment_with_expiry(&self, key: &str, ttl: Duration) -> Result<u64, StoreError> {
        increment_then_expire(self, key, ttl).await
    }
}

/// Two-step increment: bump the counter, and when it did not exist write `1`
/// with a fresh expiry.
pub async fn increment_then_expire<S>(store: &S, key: &str, ttl: Duration) -> Result<u64, StoreError>
where
    S: CounterStore + ?Sized,
{
    match store.increment(key).await? {
        Some(count) => Ok(count),
        None => {
            store.write_with_expiry(key, 1, ttl).await?;
            tracing::debug!(key = %key, ttl_ms = ttl.as_millis() as u64, "Started throttle window");
            Ok(1)
        }
    }
}

/// Counter store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Store operation timed out")]
    Timeout,

    #[error("Operation failed: {0}")]
    Operation(String),
}
