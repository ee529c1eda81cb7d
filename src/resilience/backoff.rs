//! Exponential backoff.

use std::time::Duration;

/// Calculate the exponential backoff delay before the next attempt.
///
/// Attempt 1 waits `base_ms`, attempt 2 waits `2 * base_ms`, and so on,
/// capped at `max_ms`.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);

    Duration::from_millis(delay_ms.min(max_ms))
}
