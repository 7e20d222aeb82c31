//! Inter-job throttling.
//!
//! A job that succeeded from server-rendered markup is followed by a short
//! fixed pause; everything else gets a delay drawn uniformly from a wider
//! window so request cadence does not form a fingerprint. Sleeping goes
//! through [`Sleeper`] so tests can observe delays without waiting.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use crate::config::TimingConfig;

use super::types::JobOutcome;

/// Suspension abstraction used for throttling and settle waits.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real wall-clock sleeper backed by `tokio::time::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        if duration > Duration::ZERO {
            tokio::time::sleep(duration).await;
        }
    }
}

/// Chooses the pause between consecutive jobs of a batch.
#[derive(Debug, Clone)]
pub struct ThrottlePolicy {
    fast_path_delay: Duration,
    delay_min: Duration,
    delay_max: Duration,
}

impl ThrottlePolicy {
    pub fn new(fast_path_delay: Duration, delay_min: Duration, delay_max: Duration) -> Self {
        Self {
            fast_path_delay,
            delay_min,
            delay_max: if delay_max < delay_min { delay_min } else { delay_max },
        }
    }

    pub fn from_config(config: &TimingConfig) -> Self {
        let (min, max) = config.throttle_window();
        Self::new(config.fast_path_delay(), min, max)
    }

    pub fn window(&self) -> (Duration, Duration) {
        (self.delay_min, self.delay_max)
    }

    pub fn fast_path_delay(&self) -> Duration {
        self.fast_path_delay
    }

    /// Delay to apply after `outcome` when another job follows, or `None`
    /// when the job never reached the network.
    pub fn delay_after(&self, outcome: &JobOutcome) -> Option<Duration> {
        if !outcome.incurs_delay() {
            return None;
        }
        if outcome.is_fast_path_success() {
            return Some(self.fast_path_delay);
        }
        Some(self.random_delay())
    }

    /// Delay used when the outcome could not be determined (store failure).
    pub fn fallback_delay(&self) -> Duration {
        self.random_delay()
    }

    fn random_delay(&self) -> Duration {
        if self.delay_max <= self.delay_min {
            return self.delay_min;
        }
        let mut rng = rand::thread_rng();
        let min = self.delay_min.as_millis() as u64;
        let max = self.delay_max.as_millis() as u64;
        Duration::from_millis(rng.gen_range(min..=max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::core::types::{ExtractionResult, HeaderFields, SourceStrategy};

    fn success(strategy: SourceStrategy) -> JobOutcome {
        JobOutcome::Success(ExtractionResult {
            description: "text".into(),
            fields: HeaderFields::default(),
            source_strategy: strategy,
            expand_heuristic: None,
            cleaned: false,
        })
    }

    fn policy() -> ThrottlePolicy {
        ThrottlePolicy::new(
            Duration::from_millis(1_500),
            Duration::from_secs(4),
            Duration::from_secs(8),
        )
    }

    #[test]
    fn fast_path_uses_fixed_delay() {
        let policy = policy();
        assert_eq!(
            policy.delay_after(&success(SourceStrategy::JsonLd)),
            Some(Duration::from_millis(1_500))
        );
        assert_eq!(
            policy.delay_after(&success(SourceStrategy::SsrSelector)),
            Some(Duration::from_millis(1_500))
        );
    }

    #[test]
    fn slow_path_and_failures_use_window() {
        let policy = policy();
        for outcome in [
            success(SourceStrategy::DomHeading),
            JobOutcome::NoDescription,
            JobOutcome::AuthRequired { reason: "login".into() },
        ] {
            let delay = policy.delay_after(&outcome).expect("delay");
            assert!(delay >= Duration::from_secs(4) && delay <= Duration::from_secs(8));
        }
    }

    #[test]
    fn skipped_jobs_have_no_delay() {
        assert_eq!(policy().delay_after(&JobOutcome::NoUrl), None);
    }

    #[test]
    fn inverted_window_collapses_to_minimum() {
        let policy = ThrottlePolicy::new(
            Duration::ZERO,
            Duration::from_secs(5),
            Duration::from_secs(1),
        );
        assert_eq!(
            policy.delay_after(&JobOutcome::NoDescription),
            Some(Duration::from_secs(5))
        );
    }
}
