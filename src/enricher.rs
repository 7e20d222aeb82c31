//! Batch orchestration.
//!
//! Wires the session provider, job store, extraction pipeline, throttling,
//! and event subsystems into a single entry point that enriches a bounded
//! list of stored job postings, one job at a time.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::{ConfigError, EnrichmentSettings};
use crate::extraction::core::{
	FetchError, JobOutcome, PageFetcher, ReqwestPageFetcher, Sleeper, ThrottlePolicy,
	TokioSleeper,
};
use crate::extraction::pipeline::ExtractionPipeline;
use crate::extraction::rendered::{RenderError, RenderSurface};
use crate::external_deps::browser::launch_chromium_surface;
use crate::external_deps::cleanup::{
	CleanupError, CompletionProvider, ContentCleaner, OpenAiCompletionProvider,
};
use crate::modules::events::{
	EnrichmentEvent, EventDispatcher, EventHandler, JobFinishedEvent, JobStartedEvent,
	LoggingHandler, MetricsHandler, ThrottleEvent,
};
use crate::modules::metrics::MetricsCollector;
use crate::modules::session::{CookieSet, SessionProvider, StaticSessionProvider};
use crate::modules::store::{InMemoryJobStore, JobStore, JobUpdate, StoreError};

/// Result alias used across the orchestration layer.
pub type EnricherResult<T> = Result<T, EnricherError>;

/// Errors that abort a whole batch or prevent the enricher from being built.
/// Per-job failures are reported in the result map instead.
#[derive(Debug, Error)]
pub enum EnricherError {
	#[error("batch of {size} jobs exceeds the limit of {max}")]
	BatchTooLarge { size: usize, max: usize },
	#[error("no rendering surface is available")]
	RenderSurfaceUnavailable,
	#[error("invalid settings: {0}")]
	Config(#[from] ConfigError),
	#[error("fetcher initialisation failed: {0}")]
	Fetch(#[from] FetchError),
	#[error("cleanup provider initialisation failed: {0}")]
	Cleanup(#[from] CleanupError),
	#[error("browser launch failed: {0}")]
	Render(#[from] RenderError),
}

/// Per-job entry of the batch result map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobReport {
	pub success: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

impl JobReport {
	pub fn from_outcome(outcome: &JobOutcome) -> Self {
		Self {
			success: outcome.is_success(),
			error: outcome.error_message(),
		}
	}

	fn failure(error: impl Into<String>) -> Self {
		Self {
			success: false,
			error: Some(error.into()),
		}
	}
}

/// Fluent builder for [`BatchEnricher`].
pub struct BatchEnricherBuilder {
	settings: EnrichmentSettings,
	store: Option<Arc<dyn JobStore>>,
	session: Option<Arc<dyn SessionProvider>>,
	fetcher: Option<Arc<dyn PageFetcher>>,
	surface: Option<RenderSurface>,
	sleeper: Option<Arc<dyn Sleeper>>,
	completion_provider: Option<Arc<dyn CompletionProvider>>,
	handlers: Vec<Arc<dyn EventHandler>>,
	enable_metrics: bool,
}

impl BatchEnricherBuilder {
	pub fn new() -> Self {
		Self {
			settings: EnrichmentSettings::default(),
			store: None,
			session: None,
			fetcher: None,
			surface: None,
			sleeper: None,
			completion_provider: None,
			handlers: Vec::new(),
			enable_metrics: true,
		}
	}

	pub fn with_settings(mut self, settings: EnrichmentSettings) -> Self {
		self.settings = settings;
		self
	}

	pub fn with_store(mut self, store: Arc<dyn JobStore>) -> Self {
		self.store = Some(store);
		self
	}

	pub fn with_session_provider(mut self, provider: Arc<dyn SessionProvider>) -> Self {
		self.session = Some(provider);
		self
	}

	/// Replace the default reqwest fetcher.
	pub fn with_fetcher(mut self, fetcher: Arc<dyn PageFetcher>) -> Self {
		self.fetcher = Some(fetcher);
		self
	}

	pub fn with_surface(mut self, surface: RenderSurface) -> Self {
		self.surface = Some(surface);
		self
	}

	/// Launch a headless Chromium using the browser settings and use it as the
	/// rendering surface.
	pub async fn with_chromium(mut self) -> EnricherResult<Self> {
		self.surface = Some(launch_chromium_surface(&self.settings.browser).await?);
		Ok(self)
	}

	pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
		self.sleeper = Some(sleeper);
		self
	}

	/// Use `provider` for cleanup instead of the configured OpenAI endpoint.
	pub fn with_completion_provider(mut self, provider: Arc<dyn CompletionProvider>) -> Self {
		self.completion_provider = Some(provider);
		self
	}

	pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
		self.handlers.push(handler);
		self
	}

	pub fn disable_metrics(mut self) -> Self {
		self.enable_metrics = false;
		self
	}

	pub fn build(self) -> EnricherResult<BatchEnricher> {
		BatchEnricher::with_builder(self)
	}
}

impl Default for BatchEnricherBuilder {
	fn default() -> Self {
		Self::new()
	}
}

/// Main enrichment orchestrator.
pub struct BatchEnricher {
	settings: EnrichmentSettings,
	store: Arc<dyn JobStore>,
	session: Arc<dyn SessionProvider>,
	surface: Option<RenderSurface>,
	throttle: ThrottlePolicy,
	sleeper: Arc<dyn Sleeper>,
	metrics: Option<MetricsCollector>,
	events: Arc<EventDispatcher>,
	pipeline: Mutex<ExtractionPipeline>,
}

impl BatchEnricher {
	/// Obtain a builder to customise the enricher instance.
	pub fn builder() -> BatchEnricherBuilder {
		BatchEnricherBuilder::new()
	}

	fn with_builder(builder: BatchEnricherBuilder) -> EnricherResult<Self> {
		let settings = builder.settings;
		settings.validate()?;

		let fetcher: Arc<dyn PageFetcher> = match builder.fetcher {
			Some(fetcher) => fetcher,
			None => Arc::new(ReqwestPageFetcher::new(&settings.fetch)?),
		};

		let provider: Option<Arc<dyn CompletionProvider>> = match builder.completion_provider {
			Some(provider) => Some(provider),
			None => OpenAiCompletionProvider::from_config(&settings.cleanup)?
				.map(|provider| Arc::new(provider) as Arc<dyn CompletionProvider>),
		};
		if provider.is_none() {
			log::debug!("no cleanup credential configured; descriptions are stored raw");
		}
		let cleaner = ContentCleaner::new(provider, settings.thresholds.min_cleanup_chars);

		let sleeper = builder.sleeper.unwrap_or_else(|| Arc::new(TokioSleeper));
		let metrics = builder.enable_metrics.then(MetricsCollector::new);

		let mut events = EventDispatcher::new();
		events.register_handler(Arc::new(LoggingHandler));
		if let Some(ref collector) = metrics {
			events.register_handler(Arc::new(MetricsHandler::new(collector.clone())));
		}
		for handler in builder.handlers {
			events.register_handler(handler);
		}
		let events = Arc::new(events);

		let pipeline = ExtractionPipeline::new(&settings, fetcher, cleaner, sleeper.clone())
			.with_events(events.clone());

		Ok(Self {
			throttle: ThrottlePolicy::from_config(&settings.timing),
			store: builder.store.unwrap_or_else(|| Arc::new(InMemoryJobStore::new())),
			session: builder
				.session
				.unwrap_or_else(|| Arc::new(StaticSessionProvider::empty())),
			surface: builder.surface,
			sleeper,
			metrics,
			events,
			pipeline: Mutex::new(pipeline),
			settings,
		})
	}

	pub fn settings(&self) -> &EnrichmentSettings {
		&self.settings
	}

	pub fn store(&self) -> &Arc<dyn JobStore> {
		&self.store
	}

	/// Metrics collector, unless disabled on the builder.
	pub fn metrics(&self) -> Option<&MetricsCollector> {
		self.metrics.as_ref()
	}

	/// Enrich the stored postings named by `job_ids`, strictly in order.
	///
	/// Fails only for an oversized batch or a missing rendering surface, both
	/// checked before any job is touched. Concurrent calls queue behind one
	/// another.
	pub async fn enrich_batch(
		&self,
		job_ids: &[String],
		cancel: &CancellationToken,
	) -> EnricherResult<BTreeMap<String, JobReport>> {
		let max = self.settings.thresholds.max_batch_size;
		if job_ids.len() > max {
			return Err(EnricherError::BatchTooLarge {
				size: job_ids.len(),
				max,
			});
		}
		let Some(surface) = self.surface.as_ref() else {
			return Err(EnricherError::RenderSurfaceUnavailable);
		};

		let mut pipeline = self.pipeline.lock().await;
		let cookies = self.session.cookies().await;
		let total = job_ids.len();
		let mut results = BTreeMap::new();

		for (index, job_id) in job_ids.iter().enumerate() {
			if cancel.is_cancelled() {
				results.insert(job_id.clone(), JobReport::from_outcome(&JobOutcome::Cancelled));
				continue;
			}

			self.events.dispatch(EnrichmentEvent::JobStarted(JobStartedEvent {
				job_id: job_id.clone(),
				index,
				total,
				timestamp: Utc::now(),
			}));
			let started = Instant::now();

			let delay = match self
				.process(&mut pipeline, job_id, cookies.as_ref(), surface)
				.await
			{
				Ok(outcome) => {
					self.events.dispatch(EnrichmentEvent::JobFinished(JobFinishedEvent {
						job_id: job_id.clone(),
						outcome: outcome.kind(),
						strategy: outcome.strategy(),
						error: outcome.error_message(),
						latency: started.elapsed(),
						timestamp: Utc::now(),
					}));
					results.insert(job_id.clone(), JobReport::from_outcome(&outcome));
					self.throttle
						.delay_after(&outcome)
						.map(|delay| (delay, outcome.is_fast_path_success()))
				}
				Err(err) => {
					log::warn!("job {job_id}: store error: {err}");
					results.insert(job_id.clone(), JobReport::failure(err.to_string()));
					Some((self.throttle.fallback_delay(), false))
				}
			};

			if index + 1 < total
				&& !cancel.is_cancelled()
				&& let Some((delay, fast_path)) = delay
			{
				self.events.dispatch(EnrichmentEvent::ThrottleApplied(ThrottleEvent {
					after_job: job_id.clone(),
					delay,
					fast_path,
					timestamp: Utc::now(),
				}));
				self.sleeper.sleep(delay).await;
			}
		}

		Ok(results)
	}

	async fn process(
		&self,
		pipeline: &mut ExtractionPipeline,
		job_id: &str,
		cookies: Option<&CookieSet>,
		surface: &RenderSurface,
	) -> Result<JobOutcome, StoreError> {
		let Some(posting) = self.store.get(job_id).await? else {
			return Ok(JobOutcome::NotFound);
		};
		let Some(raw_url) = posting.enrichment_url() else {
			return Ok(JobOutcome::NoUrl);
		};
		let url = match Url::parse(raw_url) {
			Ok(url) => url,
			Err(err) => {
				log::warn!("job {job_id}: ignoring unparseable URL `{raw_url}`: {err}");
				return Ok(JobOutcome::NoUrl);
			}
		};

		let outcome = pipeline.run(job_id, &url, cookies, surface).await;
		self.persist(job_id, &outcome).await?;
		Ok(outcome)
	}

	/// Single write-back step. Failures only flip the status; no partial
	/// description is ever written.
	async fn persist(&self, job_id: &str, outcome: &JobOutcome) -> Result<(), StoreError> {
		let update = match outcome {
			JobOutcome::Success(result) => JobUpdate::from_extraction(result),
			outcome if outcome.is_terminal_failure() => JobUpdate::failed(),
			_ => return Ok(()),
		};
		self.store.update(job_id, update).await?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn report_mirrors_outcome() {
		let report = JobReport::from_outcome(&JobOutcome::NoUrl);
		assert!(!report.success);
		assert_eq!(report.error.as_deref(), Some("No URL"));

		let json = serde_json::to_value(JobReport {
			success: true,
			error: None,
		})
		.unwrap();
		assert_eq!(json, serde_json::json!({"success": true}));
	}

	#[tokio::test]
	async fn missing_surface_is_fatal() {
		let enricher = BatchEnricher::builder()
			.with_fetcher(Arc::new(ReqwestPageFetcher::new(&Default::default()).unwrap()))
			.build()
			.unwrap();
		let err = enricher
			.enrich_batch(&["1".to_string()], &CancellationToken::new())
			.await
			.unwrap_err();
		assert!(matches!(err, EnricherError::RenderSurfaceUnavailable));
	}

	#[test]
	fn invalid_settings_fail_the_build() {
		let mut settings = EnrichmentSettings::default();
		settings.thresholds.max_batch_size = 0;
		let err = BatchEnricher::builder().with_settings(settings).build().err();
		assert!(matches!(err, Some(EnricherError::Config(_))));
	}
}
