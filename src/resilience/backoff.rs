//! Exponential backoff with jitter between dispatch retries.

use std::time::Duration;

use rand::Rng;

use crate::config::RetryConfig;

/// Delay before the retry that follows failed attempt number `attempt`.
///
/// Zero when `base_delay_ms` is zero.
pub fn retry_delay(attempt: u32, config: &RetryConfig) -> Duration {
    if attempt == 0 || config.base_delay_ms == 0 {
        return Duration::ZERO;
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let capped_delay = config
        .base_delay_ms
        .saturating_mul(exponential_base)
        .min(config.max_delay_ms);

    // Jitter of 0 to 10% of the delay
    let jitter_range = capped_delay / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}
