//! Counter store implementations - Redis and in-memory fallback.

mod memory;

pub use memory::{InMemoryCounterStore, MemoryStoreConfig};

#[cfg(feature = "redis")]
mod redis;
#[cfg(feature = "redis")]
pub use self::redis::{RedisConfig, RedisCounterStore, RedisStoreConfig};

/// Read the global `THROTTLE_ENABLED` switch. Anything but `false`/`0`
/// (or an unset variable) leaves throttling on.
pub(crate) fn enabled_from_env() -> bool {
    parse_enabled(std::env::var("THROTTLE_ENABLED").ok().as_deref())
}

pub(crate) fn parse_enabled(value: Option<&str>) -> bool {
    value
        .map(|v| {
            let v = v.trim().to_lowercase();
            v != "false" && v != "0"
        })
        .unwrap_or(true)
}

#[cfg(test)]
mod tests;
