//! Adaptive poll timing.
//!
//! Running operations advance one unfollow per interval; the next poll is
//! armed just after the next expected unfollow.
use std::time::Duration;

use crate::{EpochMillis, RemoteOperation};

/// Slack added after the expected unfollow for server-side timing drift.
pub const SAFETY_BUFFER_MS: EpochMillis = 60_000;

/// Checks due sooner than this are not armed; a later poll re-evaluates.
pub const MIN_LEAD_MS: EpochMillis = 30_000;

/// Delay after a completion notification before re-reading rate limits.
pub const COMPLETION_SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Delay before retrying a user-info lookup that returned a placeholder.
pub const USER_INFO_RETRY_DELAY: Duration = Duration::from_secs(10);

const MS_PER_MINUTE: EpochMillis = 60_000;

/// Delay until the next poll, or `None` when no running operation needs one.
///
/// The first running operation with a known start, outstanding work and a
/// check time more than [`MIN_LEAD_MS`] away decides the delay.
pub fn next_check_delay(operations: &[RemoteOperation], now: EpochMillis) -> Option<Duration> {
    operations
        .iter()
        .filter(|operation| operation.is_running())
        .filter(|operation| operation.completed_count < operation.total_count)
        .filter_map(|operation| {
            let start = operation.start_ms?;
            // Counts come from the server; an overflowing check time is no check.
            let wait = EpochMillis::from(operation.completed_count)
                .checked_mul(EpochMillis::from(operation.interval_minutes))?
                .checked_mul(MS_PER_MINUTE)?
                .checked_add(start)?
                .checked_add(SAFETY_BUFFER_MS)?
                .checked_sub(now)?;
            (wait > MIN_LEAD_MS).then(|| Duration::from_millis(wait as u64))
        })
        .next()
}
