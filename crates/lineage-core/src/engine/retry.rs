use rand::Rng;
use std::time::Duration;

/// Retry and throttling knobs for the dispatch runner.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries allowed for rate limits and transport errors.
    pub max_retries: u32,
    pub base_delay: Duration,
    /// Relative jitter; 0.25 means the delay is scaled by a factor in `[0.75, 1.25]`.
    pub jitter: f64,
    /// Fixed wait before retrying 502/504; these are retried without limit.
    pub gateway_wait: Duration,
    /// Pause before every attempt.
    pub throttle: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay: Duration::from_secs(1),
            jitter: 0.25,
            gateway_wait: Duration::from_secs(60),
            throttle: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// No waits at all. Retry counts are unchanged.
    pub fn immediate() -> Self {
        Self {
            base_delay: Duration::ZERO,
            gateway_wait: Duration::ZERO,
            throttle: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (1-based):
    /// `base * 2^(retry-1) * (1 + U(-jitter, jitter))`.
    pub fn backoff_delay<R: Rng + ?Sized>(&self, retry: u32, rng: &mut R) -> Duration {
        let exp = 2f64.powi(retry.saturating_sub(1).min(30) as i32);
        let factor = if self.jitter > 0.0 {
            1.0 + rng.gen_range(-self.jitter..=self.jitter)
        } else {
            1.0
        };
        self.base_delay.mul_f64((exp * factor).max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_backoff_doubles_within_jitter_bounds() {
        let policy = RetryPolicy::default();
        let mut rng = StdRng::seed_from_u64(3);
        for retry in 1..=5u32 {
            let nominal = 2f64.powi(retry as i32 - 1);
            let d = policy.backoff_delay(retry, &mut rng).as_secs_f64();
            assert!(d >= nominal * 0.75 - 1e-9, "retry {retry}: {d}");
            assert!(d <= nominal * 1.25 + 1e-9, "retry {retry}: {d}");
        }
    }

    #[test]
    fn test_backoff_without_jitter_is_exact() {
        let policy = RetryPolicy {
            jitter: 0.0,
            ..RetryPolicy::default()
        };
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(policy.backoff_delay(1, &mut rng), Duration::from_secs(1));
        assert_eq!(policy.backoff_delay(4, &mut rng), Duration::from_secs(8));
    }

    #[test]
    fn test_immediate_policy_never_waits() {
        let policy = RetryPolicy::immediate();
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(policy.backoff_delay(3, &mut rng), Duration::ZERO);
        assert_eq!(policy.max_retries, 5);
    }
}
