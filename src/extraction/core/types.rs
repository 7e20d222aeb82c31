//! Core data structures shared across fetching, detection, and extraction layers.

use std::fmt;

use http::HeaderMap;
use serde::{Deserialize, Serialize};
use url::Url;

use super::text::page_title;

/// Minimal representation of a page returned by the HTML fetcher.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub requested_url: Url,
    /// Final URL after redirects.
    pub url: Url,
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

impl FetchedPage {
    /// Contents of the `<title>` element, whitespace-normalised.
    pub fn title(&self) -> Option<String> {
        page_title(&self.body)
    }

    pub fn was_redirected(&self) -> bool {
        self.requested_url != self.url
    }
}

/// Which strategy produced the description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceStrategy {
    JsonLd,
    SsrSelector,
    DomHeading,
    DomSelector,
}

impl SourceStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceStrategy::JsonLd => "json-ld",
            SourceStrategy::SsrSelector => "ssr-selector",
            SourceStrategy::DomHeading => "dom-heading",
            SourceStrategy::DomSelector => "dom-selector",
        }
    }

    /// Tier 1 strategies only need the server-rendered HTML.
    pub fn is_fast_path(self) -> bool {
        matches!(self, SourceStrategy::JsonLd | SourceStrategy::SsrSelector)
    }
}

impl fmt::Display for SourceStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Best-effort header fields. Every field stays `None` when the page does not
/// expose it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderFields {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub salary: Option<String>,
    pub job_type: Option<String>,
    pub seniority_level: Option<String>,
    pub workplace_type: Option<String>,
    pub num_applicants: Option<u32>,
    pub easy_apply: Option<bool>,
}

impl HeaderFields {
    /// Fill fields that are still empty from `other`. Existing values win.
    pub fn merge_missing(&mut self, other: HeaderFields) {
        fn fill<T>(slot: &mut Option<T>, value: Option<T>) {
            if slot.is_none() {
                *slot = value;
            }
        }

        fill(&mut self.title, other.title);
        fill(&mut self.company, other.company);
        fill(&mut self.location, other.location);
        fill(&mut self.salary, other.salary);
        fill(&mut self.job_type, other.job_type);
        fill(&mut self.seniority_level, other.seniority_level);
        fill(&mut self.workplace_type, other.workplace_type);
        fill(&mut self.num_applicants, other.num_applicants);
        fill(&mut self.easy_apply, other.easy_apply);
    }

    pub fn is_empty(&self) -> bool {
        *self == HeaderFields::default()
    }
}

/// Successful extraction for a single job. Never persisted as-is; the
/// orchestrator maps it onto a store update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    pub description: String,
    pub fields: HeaderFields,
    pub source_strategy: SourceStrategy,
    /// Name of the expand heuristic that fired during tier 2, if any.
    pub expand_heuristic: Option<&'static str>,
    /// True when the cleanup stage rewrote the description.
    pub cleaned: bool,
}

/// Terminal state of one job within a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Success(ExtractionResult),
    AuthRequired { reason: String },
    NoUrl,
    NotFound,
    NoDescription,
    FetchError(String),
    Cancelled,
}

/// Field-free discriminant of [`JobOutcome`], used for events and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Success,
    AuthRequired,
    NoUrl,
    NotFound,
    NoDescription,
    FetchError,
    Cancelled,
}

impl JobOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            JobOutcome::Success(_) => OutcomeKind::Success,
            JobOutcome::AuthRequired { .. } => OutcomeKind::AuthRequired,
            JobOutcome::NoUrl => OutcomeKind::NoUrl,
            JobOutcome::NotFound => OutcomeKind::NotFound,
            JobOutcome::NoDescription => OutcomeKind::NoDescription,
            JobOutcome::FetchError(_) => OutcomeKind::FetchError,
            JobOutcome::Cancelled => OutcomeKind::Cancelled,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Success(_))
    }

    pub fn strategy(&self) -> Option<SourceStrategy> {
        match self {
            JobOutcome::Success(result) => Some(result.source_strategy),
            _ => None,
        }
    }

    /// Succeeded without touching the rendering surface.
    pub fn is_fast_path_success(&self) -> bool {
        self.strategy().is_some_and(SourceStrategy::is_fast_path)
    }

    /// Jobs skipped before any network activity are not followed by a delay.
    pub fn incurs_delay(&self) -> bool {
        !matches!(
            self,
            JobOutcome::NoUrl | JobOutcome::NotFound | JobOutcome::Cancelled
        )
    }

    /// Whether the outcome marks the stored job as `enrichment_failed`.
    pub fn is_terminal_failure(&self) -> bool {
        matches!(
            self,
            JobOutcome::AuthRequired { .. } | JobOutcome::NoDescription | JobOutcome::FetchError(_)
        )
    }

    /// Message reported to the caller for unsuccessful jobs.
    pub fn error_message(&self) -> Option<String> {
        match self {
            JobOutcome::Success(_) => None,
            JobOutcome::AuthRequired { .. } => Some("Authentication required".into()),
            JobOutcome::NoUrl => Some("No URL".into()),
            JobOutcome::NotFound => Some("Job not found".into()),
            JobOutcome::NoDescription => Some("No description found".into()),
            JobOutcome::FetchError(reason) => Some(format!("Fetch failed: {reason}")),
            JobOutcome::Cancelled => Some("Cancelled".into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_keeps_existing_values() {
        let mut fields = HeaderFields {
            salary: Some("$100k".into()),
            ..Default::default()
        };
        fields.merge_missing(HeaderFields {
            salary: Some("$90k".into()),
            job_type: Some("Full-time".into()),
            ..Default::default()
        });

        assert_eq!(fields.salary.as_deref(), Some("$100k"));
        assert_eq!(fields.job_type.as_deref(), Some("Full-time"));
    }

    #[test]
    fn skipped_jobs_do_not_delay() {
        assert!(!JobOutcome::NoUrl.incurs_delay());
        assert!(!JobOutcome::Cancelled.incurs_delay());
        assert!(JobOutcome::NoDescription.incurs_delay());
        assert_eq!(JobOutcome::NoUrl.error_message().as_deref(), Some("No URL"));
    }
}
