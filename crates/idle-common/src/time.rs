//! Wall-clock timestamps.
//!
//! Every timer in the simulation is expressed in milliseconds since the Unix
//! epoch so that a value written to storage can be compared against the clock
//! after the game has been closed and reopened.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch.
pub type Millis = u64;

/// Milliseconds in one second.
pub const MILLIS_PER_SECOND: Millis = 1_000;

/// Returns the current wall-clock time in milliseconds.
#[must_use]
pub fn now_millis() -> Millis {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as Millis
}

/// Milliseconds elapsed from `since` to `now`, zero if the clock went backwards.
#[must_use]
pub const fn elapsed_since(since: Millis, now: Millis) -> Millis {
    now.saturating_sub(since)
}

/// Converts whole seconds to milliseconds.
#[must_use]
pub const fn seconds(secs: u64) -> Millis {
    secs * MILLIS_PER_SECOND
}
