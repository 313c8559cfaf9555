//! Subcommand implementations.

use std::io::Write;

use serde::Serialize;

use throttle_core::{RateLimiter, ThrottleError};

#[derive(Debug, Serialize)]
struct Attempt {
    attempt: u32,
    allowed: bool,
}

/// Run `count` guarded calls, printing one JSON line per attempt.
///
/// Returns whether the last attempt was allowed. Store failures abort.
pub async fn hit(limiter: &RateLimiter, count: u32, out: &mut impl Write) -> anyhow::Result<bool> {
    let mut allowed = true;

    for attempt in 1..=count {
        allowed = match limiter.check_and_increment().await {
            Ok(()) => true,
            Err(ThrottleError::LimitExceeded { .. }) => false,
            Err(e) => return Err(e.into()),
        };

        serde_json::to_writer(&mut *out, &Attempt { attempt, allowed })?;
        writeln!(out)?;
    }

    Ok(allowed)
}

#[derive(Debug, Serialize)]
struct Cleared<'a> {
    identifier: &'a str,
    cleared: bool,
}

pub async fn clear(limiter: &RateLimiter, out: &mut impl Write) -> anyhow::Result<bool> {
    let cleared = limiter.clear().await?;

    serde_json::to_writer(
        &mut *out,
        &Cleared {
            identifier: limiter.identifier().as_str(),
            cleared,
        },
    )?;
    writeln!(out)?;

    Ok(cleared)
}
