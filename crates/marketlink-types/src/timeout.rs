//! Packet timeout arithmetic.
//!
//! Timeouts are absolute UNIX timestamps in nanoseconds. A timeout has
//! elapsed once the observed time is greater than or equal to it; that is
//! the same rule the relay uses to refuse sending and to accept a timeout.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Absolute deadline `window` after `now_ns`, saturating at `u64::MAX`.
#[must_use]
pub fn deadline_after(now_ns: u64, window: Duration) -> u64 {
    let window_ns = u64::try_from(window.as_nanos()).unwrap_or(u64::MAX);
    now_ns.saturating_add(window_ns)
}

/// Whether `timeout_ns` has elapsed at `now_ns`.
#[must_use]
pub fn has_elapsed(timeout_ns: u64, now_ns: u64) -> bool {
    now_ns >= timeout_ns
}

/// Timeout as a `DateTime`, for logs. `None` if it does not fit an `i64`.
#[must_use]
pub fn to_datetime(timeout_ns: u64) -> Option<DateTime<Utc>> {
    i64::try_from(timeout_ns)
        .ok()
        .map(DateTime::<Utc>::from_timestamp_nanos)
}
