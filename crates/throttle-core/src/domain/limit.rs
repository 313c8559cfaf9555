//! Per-call throttle limit.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Maximum number of calls allowed within one window.
///
/// Not persisted; callers supply it on every use. `max = 0` rejects every
/// call, a zero `window` lets each counter lapse immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limit {
    pub max: u64,
    #[serde(rename = "window_secs", with = "duration_secs")]
    pub window: Duration,
}

impl Limit {
    pub fn new(max: u64, window: Duration) -> Self {
        Self { max, window }
    }

    pub fn per_second(max: u64) -> Self {
        Self::new(max, Duration::from_secs(1))
    }

    pub fn per_minute(max: u64) -> Self {
        Self::new(max, Duration::from_secs(60))
    }

    pub fn per_hour(max: u64) -> Self {
        Self::new(max, Duration::from_secs(3600))
    }

    /// Whether the `count`-th call of a window is still allowed.
    pub fn allows(&self, count: u64) -> bool {
        count <= self.max
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
