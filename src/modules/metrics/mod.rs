//! Metrics collection utilities.
//!
//! Aggregates per-strategy successes, per-failure-kind counts and per-job
//! latency percentiles across batches.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::extraction::core::{OutcomeKind, SourceStrategy};

/// Aggregated enrichment statistics.
#[derive(Debug, Clone)]
pub struct EnrichmentStats {
    pub started_at: DateTime<Utc>,
    pub jobs_total: u64,
    pub successes: u64,
    pub failures: u64,
    pub by_strategy: HashMap<SourceStrategy, u64>,
    pub by_outcome: HashMap<OutcomeKind, u64>,
    pub heuristics: HashMap<&'static str, u64>,
    pub session_invalid: u64,
    pub total_throttle: Duration,
    pub average_latency: Option<Duration>,
    pub p95_latency: Option<Duration>,
}

#[derive(Debug)]
struct MetricsState {
    started_at: DateTime<Utc>,
    jobs_total: u64,
    successes: u64,
    failures: u64,
    by_strategy: HashMap<SourceStrategy, u64>,
    by_outcome: HashMap<OutcomeKind, u64>,
    heuristics: HashMap<&'static str, u64>,
    session_invalid: u64,
    total_throttle: Duration,
    latencies: VecDeque<Duration>,
    max_window: usize,
}

impl MetricsState {
    fn new(max_window: usize) -> Self {
        Self {
            started_at: Utc::now(),
            jobs_total: 0,
            successes: 0,
            failures: 0,
            by_strategy: HashMap::new(),
            by_outcome: HashMap::new(),
            heuristics: HashMap::new(),
            session_invalid: 0,
            total_throttle: Duration::ZERO,
            latencies: VecDeque::with_capacity(max_window),
            max_window,
        }
    }

    fn latency_stats(&self) -> (Option<Duration>, Option<Duration>) {
        if self.latencies.is_empty() {
            return (None, None);
        }
        let mut samples: Vec<_> = self.latencies.iter().cloned().collect();
        samples.sort_unstable();
        let avg = samples.iter().map(|d| d.as_secs_f64()).sum::<f64>() / samples.len() as f64;
        let p95_index = ((samples.len() as f64 * 0.95).ceil() as usize).saturating_sub(1);
        (Some(Duration::from_secs_f64(avg)), Some(samples[p95_index]))
    }
}

/// Thread-safe metrics collector fed by the metrics event handler.
#[derive(Clone, Debug)]
pub struct MetricsCollector {
    inner: Arc<Mutex<MetricsState>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::with_window(128)
    }

    pub fn with_window(window: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MetricsState::new(window.max(16)))),
        }
    }

    fn state(&self) -> MutexGuard<'_, MetricsState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record_job(&self, outcome: OutcomeKind, strategy: Option<SourceStrategy>, latency: Duration) {
        let mut state = self.state();
        state.jobs_total += 1;
        *state.by_outcome.entry(outcome).or_default() += 1;

        match strategy {
            Some(strategy) if outcome == OutcomeKind::Success => {
                state.successes += 1;
                *state.by_strategy.entry(strategy).or_default() += 1;
            }
            _ => state.failures += 1,
        }

        if state.latencies.len() == state.max_window {
            state.latencies.pop_front();
        }
        state.latencies.push_back(latency);
    }

    pub fn record_heuristic(&self, heuristic: &'static str) {
        *self.state().heuristics.entry(heuristic).or_default() += 1;
    }

    pub fn record_session_invalid(&self) {
        self.state().session_invalid += 1;
    }

    pub fn record_throttle(&self, delay: Duration) {
        self.state().total_throttle += delay;
    }

    pub fn snapshot(&self) -> EnrichmentStats {
        let state = self.state();
        let (average_latency, p95_latency) = state.latency_stats();
        EnrichmentStats {
            started_at: state.started_at,
            jobs_total: state.jobs_total,
            successes: state.successes,
            failures: state.failures,
            by_strategy: state.by_strategy.clone(),
            by_outcome: state.by_outcome.clone(),
            heuristics: state.heuristics.clone(),
            session_invalid: state.session_invalid,
            total_throttle: state.total_throttle,
            average_latency,
            p95_latency,
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_success_and_failure() {
        let metrics = MetricsCollector::new();
        metrics.record_job(OutcomeKind::Success, Some(SourceStrategy::JsonLd), Duration::from_millis(150));
        metrics.record_job(OutcomeKind::Success, Some(SourceStrategy::DomHeading), Duration::from_millis(4_000));
        metrics.record_job(OutcomeKind::AuthRequired, None, Duration::from_millis(200));
        metrics.record_throttle(Duration::from_millis(1_500));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.jobs_total, 3);
        assert_eq!(snapshot.successes, 2);
        assert_eq!(snapshot.failures, 1);
        assert_eq!(snapshot.by_outcome.get(&OutcomeKind::AuthRequired), Some(&1));
        assert_eq!(snapshot.p95_latency, Some(Duration::from_millis(4_000)));
        assert_eq!(snapshot.total_throttle, Duration::from_millis(1_500));
    }
}
