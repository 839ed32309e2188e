//! Timer authority.
//!
//! The answer window is a pure function of the shared `question_started_at`
//! instant broadcast by the session store. Every reader derives the same
//! remaining time from that instant, so countdowns stay synchronized across
//! participants regardless of join time or network latency. A countdown
//! seeded from local observation time would drift and is never used.

use chrono::{DateTime, Utc};

/// Whole seconds left in the answer window at `now`. Saturates at 0.
///
/// A `now` before `started_at` (clock skew between readers) is treated as
/// zero elapsed time.
pub fn remaining_seconds(
    time_limit_seconds: u32,
    started_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> u32 {
    let elapsed = (now - started_at).num_seconds().max(0);
    u64::from(time_limit_seconds)
        .saturating_sub(elapsed as u64)
        .min(u64::from(time_limit_seconds)) as u32
}

/// Whether the answer window is still open at `now`.
pub fn window_open(time_limit_seconds: u32, started_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    remaining_seconds(time_limit_seconds, started_at, now) > 0
}

/// Bonus points for answering with `remaining` seconds left: one point per
/// started 3-second block.
pub fn time_bonus(remaining: u32) -> u32 {
    remaining.div_ceil(3)
}
