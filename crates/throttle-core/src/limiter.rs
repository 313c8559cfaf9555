//! Fixed-window rate limiter over a [`CounterStore`].

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::{Identifier, Limit, StorageKey};
use crate::error::{Result, ThrottleError};
use crate::ports::CounterStore;

/// Throttles one keyed operation.
///
/// Stateless between calls: the counter and its expiry live in the store, so
/// any number of limiters built from the same identifier share one window.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    identifier: Identifier,
    key: Option<StorageKey>,
    limit: Limit,
}

impl RateLimiter {
    /// Build a limiter. Does not touch the store.
    pub fn new(store: Arc<dyn CounterStore>, identifier: impl Into<Identifier>, limit: Limit) -> Self {
        let identifier = identifier.into();
        let key = identifier.storage_key();

        Self {
            store,
            identifier,
            key,
            limit,
        }
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    pub fn storage_key(&self) -> Option<&StorageKey> {
        self.key.as_ref()
    }

    pub fn limit(&self) -> Limit {
        self.limit
    }

    /// False when the identifier is blank or the store is switched off.
    pub fn is_active(&self) -> bool {
        self.key.is_some() && self.store.is_enabled()
    }

    /// Count this invocation and fail once the window's maximum is exceeded.
    ///
    /// Always increments; there is no read-only check.
    pub async fn check_and_increment(&self) -> Result<()> {
        let Some(key) = self.active_key() else {
            return Ok(());
        };

        let count = self
            .store
            .increment_with_expiry(key.as_str(), self.limit.window)
            .await?;

        if self.limit.allows(count) {
            return Ok(());
        }

        warn!(
            identifier = %self.identifier,
            count,
            max = self.limit.max,
            "Throttle limit exceeded"
        );

        Err(ThrottleError::LimitExceeded {
            identifier: self.identifier.to_string(),
        })
    }

    /// Drop the current window for this identifier.
    ///
    /// Returns `Ok(false)` without touching the store when the limiter is
    /// inactive.
    pub async fn clear(&self) -> Result<bool> {
        let Some(key) = self.active_key() else {
            return Ok(false);
        };

        self.store.delete(key.as_str()).await?;
        debug!(key = %key, "Cleared throttle window");

        Ok(true)
    }

    /// Run `work` under this throttle.
    ///
    /// The call is counted first; on `LimitExceeded` the work never runs.
    /// The work receives the limiter so it can [`RateLimiter::clear`] once
    /// its outcome warrants forgiving the attempt.
    pub async fn run<F, Fut, T>(self, work: F) -> Result<T>
    where
        F: FnOnce(RateLimiter) -> Fut,
        Fut: Future<Output = T>,
    {
        self.check_and_increment().await?;
        Ok(work(self).await)
    }

    fn active_key(&self) -> Option<&StorageKey> {
        if !self.store.is_enabled() {
            return None;
        }
        self.key.as_ref()
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("identifier", &self.identifier)
            .field("key", &self.key)
            .field("limit", &self.limit)
            .finish_non_exhaustive()
    }
}
