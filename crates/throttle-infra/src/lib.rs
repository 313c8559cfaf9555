//! # Throttle Infrastructure
//!
//! Concrete implementations of the [`throttle_core::CounterStore`] port.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external dependencies, in-memory only
//! - `redis` - Redis-backed counter store

pub mod store;

// Re-exports - In-Memory
pub use store::{InMemoryCounterStore, MemoryStoreConfig};

// Re-exports - Redis
#[cfg(feature = "redis")]
pub use store::{RedisConfig, RedisCounterStore, RedisStoreConfig};
