//! Event system for the enrichment pipeline.
//!
//! Provides hooks for metrics, logging, and host reactions (such as prompting
//! a re-login on `SessionInvalid`) around batch activity.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

use crate::extraction::core::{OutcomeKind, SourceStrategy};

use super::metrics::MetricsCollector;

#[derive(Debug, Clone)]
pub struct JobStartedEvent {
    pub job_id: String,
    pub index: usize,
    pub total: usize,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct JobFinishedEvent {
    pub job_id: String,
    pub outcome: OutcomeKind,
    pub strategy: Option<SourceStrategy>,
    pub error: Option<String>,
    pub latency: Duration,
    pub timestamp: DateTime<Utc>,
}

/// The stored session no longer authenticates; the host should prompt a
/// re-login.
#[derive(Debug, Clone)]
pub struct SessionInvalidEvent {
    pub job_id: String,
    pub url: String,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct HeuristicFiredEvent {
    pub job_id: String,
    pub heuristic: &'static str,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ThrottleEvent {
    pub after_job: String,
    pub delay: Duration,
    pub fast_path: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum EnrichmentEvent {
    JobStarted(JobStartedEvent),
    JobFinished(JobFinishedEvent),
    SessionInvalid(SessionInvalidEvent),
    HeuristicFired(HeuristicFiredEvent),
    ThrottleApplied(ThrottleEvent),
}

/// Trait implemented by event handlers.
pub trait EventHandler: Send + Sync {
    fn handle(&self, event: &EnrichmentEvent);
}

/// Dispatcher that broadcasts events to registered handlers.
#[derive(Default, Clone)]
pub struct EventDispatcher {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self { handlers: Vec::new() }
    }

    pub fn register_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    pub fn dispatch(&self, event: EnrichmentEvent) {
        for handler in &self.handlers {
            handler.handle(&event);
        }
    }
}

/// Logs events using the `log` crate.
#[derive(Debug)]
pub struct LoggingHandler;

impl EventHandler for LoggingHandler {
    fn handle(&self, event: &EnrichmentEvent) {
        match event {
            EnrichmentEvent::JobStarted(started) => {
                log::debug!(
                    "job {} started ({}/{})",
                    started.job_id,
                    started.index + 1,
                    started.total
                );
            }
            EnrichmentEvent::JobFinished(finished) => match (&finished.strategy, &finished.error) {
                (Some(strategy), _) => log::info!(
                    "job {} enriched via {} ({:.2}s)",
                    finished.job_id,
                    strategy,
                    finished.latency.as_secs_f64()
                ),
                (None, Some(error)) => log::info!(
                    "job {} not enriched: {} ({:.2}s)",
                    finished.job_id,
                    error,
                    finished.latency.as_secs_f64()
                ),
                (None, None) => log::info!("job {} finished", finished.job_id),
            },
            EnrichmentEvent::SessionInvalid(invalid) => {
                log::warn!(
                    "session invalid at {} (job {}): {}",
                    invalid.url,
                    invalid.job_id,
                    invalid.reason
                );
            }
            EnrichmentEvent::HeuristicFired(fired) => {
                log::info!("heuristic {} fired for job {}", fired.heuristic, fired.job_id);
            }
            EnrichmentEvent::ThrottleApplied(throttle) => {
                log::debug!(
                    "throttling {:.2}s after job {} (fast path: {})",
                    throttle.delay.as_secs_f64(),
                    throttle.after_job,
                    throttle.fast_path
                );
            }
        }
    }
}

/// Metrics handler that feeds the metrics collector.
#[derive(Clone, Debug)]
pub struct MetricsHandler {
    metrics: MetricsCollector,
}

impl MetricsHandler {
    pub fn new(metrics: MetricsCollector) -> Self {
        Self { metrics }
    }
}

impl EventHandler for MetricsHandler {
    fn handle(&self, event: &EnrichmentEvent) {
        match event {
            EnrichmentEvent::JobFinished(finished) => {
                self.metrics
                    .record_job(finished.outcome, finished.strategy, finished.latency);
            }
            EnrichmentEvent::SessionInvalid(_) => self.metrics.record_session_invalid(),
            EnrichmentEvent::HeuristicFired(fired) => self.metrics.record_heuristic(fired.heuristic),
            EnrichmentEvent::ThrottleApplied(throttle) => self.metrics.record_throttle(throttle.delay),
            EnrichmentEvent::JobStarted(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingHandler(std::sync::Mutex<usize>);

    impl EventHandler for CountingHandler {
        fn handle(&self, _event: &EnrichmentEvent) {
            *self.0.lock().unwrap() += 1;
        }
    }

    #[test]
    fn dispatches_to_handlers() {
        let mut dispatcher = EventDispatcher::new();
        let counter = Arc::new(CountingHandler(std::sync::Mutex::new(0)));
        dispatcher.register_handler(counter.clone());
        dispatcher.register_handler(Arc::new(LoggingHandler));
        dispatcher.dispatch(EnrichmentEvent::SessionInvalid(SessionInvalidEvent {
            job_id: "7".into(),
            url: "https://www.linkedin.com/authwall".into(),
            reason: "login-path".into(),
            timestamp: Utc::now(),
        }));
        assert_eq!(*counter.0.lock().unwrap(), 1);
    }

    #[test]
    fn metrics_handler_counts_outcomes() {
        let metrics = MetricsCollector::new();
        let handler = MetricsHandler::new(metrics.clone());
        handler.handle(&EnrichmentEvent::JobFinished(JobFinishedEvent {
            job_id: "1".into(),
            outcome: OutcomeKind::Success,
            strategy: Some(SourceStrategy::JsonLd),
            error: None,
            latency: Duration::from_millis(300),
            timestamp: Utc::now(),
        }));
        handler.handle(&EnrichmentEvent::HeuristicFired(HeuristicFiredEvent {
            job_id: "2".into(),
            heuristic: "exact-text",
            timestamp: Utc::now(),
        }));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.jobs_total, 1);
        assert_eq!(snapshot.by_strategy.get(&SourceStrategy::JsonLd), Some(&1));
        assert_eq!(snapshot.heuristics.get("exact-text"), Some(&1));
    }
}
