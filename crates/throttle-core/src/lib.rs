//! # Throttle Core
//!
//! The domain layer of the throttle workspace.
//! Counts invocations of a keyed operation within a fixed window and rejects
//! them once the configured maximum is exceeded. All counter state lives in an
//! external [`ports::CounterStore`]; this crate has no infrastructure
//! dependencies of its own.
//!
//! ```rust,ignore
//! let limiter = RateLimiter::new(store, format!("feed:{ip}"), Limit::per_minute(20));
//! limiter.run(|_| async { render_feed().await }).await?;
//! ```

pub mod domain;
pub mod error;
pub mod limiter;
pub mod ports;

pub use domain::{Identifier, Limit, StorageKey};
pub use error::{Result, ThrottleError};
pub use limiter::RateLimiter;
pub use ports::{CounterStore, StoreError};
