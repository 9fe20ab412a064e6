//! Exponential backoff with jitter.

use rand::Rng;
use std::time::Duration;

use crate::config::RetryConfig;

/// Delay before retry number `attempt` (1-based): `base * 2^(attempt-1)`,
/// capped at `max`, plus up to 10% jitter.
pub fn calculate_backoff(attempt: u32, config: &RetryConfig) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let capped_delay = config
        .base_delay_ms
        .saturating_mul(exponential_base)
        .min(config.max_delay_ms);

    let jitter_range = capped_delay / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_delay_ms: u64, max_delay_ms: u64) -> RetryConfig {
        RetryConfig {
            base_delay_ms,
            max_delay_ms,
            ..RetryConfig::default()
        }
    }

    #[test]
    fn test_backoff_calculation() {
        let c = config(100, 2000);
        assert_eq!(calculate_backoff(0, &c), Duration::ZERO);

        let b1 = calculate_backoff(1, &c);
        assert!(b1.as_millis() >= 100 && b1.as_millis() < 110);

        let b2 = calculate_backoff(2, &c);
        assert!(b2.as_millis() >= 200);

        let capped = calculate_backoff(10, &config(100, 1000));
        assert!(capped.as_millis() >= 1000 && capped.as_millis() < 1100);
    }
}
