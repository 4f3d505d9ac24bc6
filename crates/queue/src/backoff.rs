//! Capped exponential backoff for requeued events (distinct from the
//! per-action [`retry`] manager — this governs queue-level redelivery).

use std::time::Duration;

const BASE_MS: u64 = 1000;
const CEILING_MS: u64 = 30_000;

/// `min(1000 * 2^(retryCount-1), 30000)` ms. `retry_count` is the count
/// *after* incrementing for this attempt; `retry_count == 0` is never
/// passed to this function (the first attempt is never delayed).
pub fn requeue_delay(retry_count: u32) -> Duration {
    debug_assert!(retry_count >= 1);
    let exponent = retry_count.saturating_sub(1);
    let multiplier = 1u64.checked_shl(exponent).unwrap_or(u64::MAX);
    let ms = BASE_MS.saturating_mul(multiplier);
    Duration::from_millis(ms.min(CEILING_MS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_retry_is_base_delay() {
        assert_eq!(requeue_delay(1), Duration::from_millis(1000));
    }

    #[test]
    fn doubles_each_attempt() {
        assert_eq!(requeue_delay(2), Duration::from_millis(2000));
        assert_eq!(requeue_delay(3), Duration::from_millis(4000));
    }

    #[test]
    fn caps_at_ceiling() {
        assert_eq!(requeue_delay(10), Duration::from_millis(30_000));
    }
}
