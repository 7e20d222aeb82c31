//! Per-job extraction pipeline.
//!
//! Runs the authenticated fetch, the auth-wall check and the structured
//! extractors, falling back to the rendered DOM only when tier 1 finds no
//! description. The result is a single [`JobOutcome`] that the orchestrator
//! turns into one store update.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use url::Url;

use crate::config::EnrichmentSettings;
use crate::extraction::core::{
    ExtractionResult, FetchError, HeaderFields, JobOutcome, PageFetcher, Sleeper, SourceStrategy,
};
use crate::extraction::detectors::{AuthStatus, AuthWallDetection, AuthWallDetector};
use crate::extraction::rendered::{
    RenderError, RenderSurface, RenderedDomExtractor, RenderedOutcome,
};
use crate::extraction::structured::StructuredExtractor;
use crate::external_deps::cleanup::ContentCleaner;
use crate::modules::events::{
    EnrichmentEvent, EventDispatcher, HeuristicFiredEvent, SessionInvalidEvent,
};
use crate::modules::session::CookieSet;

/// Coordinates fetching, detection and both extraction tiers for one job at
/// a time.
pub struct ExtractionPipeline {
    fetcher: Arc<dyn PageFetcher>,
    detector: AuthWallDetector,
    structured: StructuredExtractor,
    rendered: RenderedDomExtractor,
    cleaner: ContentCleaner,
    sleeper: Arc<dyn Sleeper>,
    lease_timeout: Duration,
    events: Arc<EventDispatcher>,
}

impl ExtractionPipeline {
    pub fn new(
        settings: &EnrichmentSettings,
        fetcher: Arc<dyn PageFetcher>,
        cleaner: ContentCleaner,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            fetcher,
            detector: AuthWallDetector::new(),
            structured: StructuredExtractor::new(&settings.thresholds),
            rendered: RenderedDomExtractor::new(&settings.timing, &settings.thresholds),
            cleaner,
            sleeper,
            lease_timeout: settings.timing.lease_timeout(),
            events: Arc::new(EventDispatcher::new()),
        }
    }

    pub fn with_events(mut self, events: Arc<EventDispatcher>) -> Self {
        self.events = events;
        self
    }

    pub fn with_structured(mut self, structured: StructuredExtractor) -> Self {
        self.structured = structured;
        self
    }

    pub fn with_rendered(mut self, rendered: RenderedDomExtractor) -> Self {
        self.rendered = rendered;
        self
    }

    pub fn detector(&self) -> &AuthWallDetector {
        &self.detector
    }

    /// Run both tiers for `url`. Never fails: every error is folded into the
    /// returned outcome.
    pub async fn run(
        &mut self,
        job_id: &str,
        url: &Url,
        cookies: Option<&CookieSet>,
        surface: &RenderSurface,
    ) -> JobOutcome {
        let Some(cookies) = cookies.filter(|set| !set.is_empty()) else {
            let detection = self.detector.missing_session(url);
            return self.auth_required(job_id, detection);
        };

        let mut tier_one_fields = HeaderFields::default();
        let fetch_failure = match self.fetcher.fetch(url, cookies).await {
            Ok(page) => {
                if let AuthStatus::LoginRedirected(detection) = self.detector.inspect(&page) {
                    return self.auth_required(job_id, detection);
                }

                let structured = self.structured.extract(&page.body);
                if let Some((description, strategy)) = structured.description {
                    return self.succeed(description, structured.fields, strategy, None).await;
                }
                tier_one_fields = structured.fields;
                None
            }
            Err(err) => {
                log::warn!("fetch of {url} failed, trying rendered DOM: {err}");
                Some(err)
            }
        };

        let rendered = match self.render(url, cookies, surface).await {
            Ok(rendered) => rendered,
            Err(err) => return JobOutcome::FetchError(failure_reason(fetch_failure.as_ref(), &err)),
        };

        match rendered {
            RenderedOutcome::AuthWall(detection) => self.auth_required(job_id, detection),
            RenderedOutcome::Extracted {
                description,
                mut fields,
                expand_heuristic,
            } => {
                if let Some(heuristic) = expand_heuristic {
                    self.events.dispatch(EnrichmentEvent::HeuristicFired(HeuristicFiredEvent {
                        job_id: job_id.to_string(),
                        heuristic,
                        timestamp: Utc::now(),
                    }));
                }

                let Some((description, strategy)) = description else {
                    if let Some(err) = fetch_failure {
                        log::warn!("job {job_id}: no description after fetch failure ({err})");
                    }
                    return JobOutcome::NoDescription;
                };
                fields.merge_missing(tier_one_fields);
                self.succeed(description, fields, strategy, expand_heuristic).await
            }
        }
    }

    async fn render(
        &mut self,
        url: &Url,
        cookies: &CookieSet,
        surface: &RenderSurface,
    ) -> Result<RenderedOutcome, RenderError> {
        let mut lease = surface.acquire(self.lease_timeout).await?;
        self.rendered
            .extract(&mut *lease, url, cookies, self.sleeper.as_ref(), &mut self.detector)
            .await
    }

    async fn succeed(
        &self,
        description: String,
        fields: HeaderFields,
        strategy: SourceStrategy,
        expand_heuristic: Option<&'static str>,
    ) -> JobOutcome {
        let cleaned = self.cleaner.clean(&description).await;
        JobOutcome::Success(ExtractionResult {
            description: cleaned.text,
            fields,
            source_strategy: strategy,
            expand_heuristic,
            cleaned: cleaned.cleaned,
        })
    }

    fn auth_required(&self, job_id: &str, detection: AuthWallDetection) -> JobOutcome {
        let reason = detection.reason();
        self.events.dispatch(EnrichmentEvent::SessionInvalid(SessionInvalidEvent {
            job_id: job_id.to_string(),
            url: detection.url.to_string(),
            reason: reason.clone(),
            timestamp: Utc::now(),
        }));
        JobOutcome::AuthRequired { reason }
    }
}

fn failure_reason(fetch: Option<&FetchError>, render: &RenderError) -> String {
    match fetch {
        Some(fetch) => format!("{fetch}; rendered fallback failed: {render}"),
        None => render.to_string(),
    }
}
