//! Persisted job posting and the update applied by write-back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::extraction::core::ExtractionResult;

/// Enrichment state of a stored posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    NeedsEnrichment,
    /// Enriched; waiting on the applicant's next step.
    NoResponse,
    EnrichmentFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: String,
    pub url: Option<String>,
    pub status: JobStatus,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub workplace_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub salary: Option<String>,
    #[serde(default)]
    pub job_type: Option<String>,
    #[serde(default)]
    pub seniority_level: Option<String>,
    #[serde(default)]
    pub num_applicants: Option<u32>,
    #[serde(default)]
    pub easy_apply: Option<bool>,
    pub updated_at: DateTime<Utc>,
}

impl JobPosting {
    /// A fresh stub awaiting enrichment.
    pub fn new(id: impl Into<String>, url: Option<String>) -> Self {
        Self {
            id: id.into(),
            url,
            status: JobStatus::NeedsEnrichment,
            title: None,
            company: None,
            location: None,
            workplace_type: None,
            description: None,
            salary: None,
            job_type: None,
            seniority_level: None,
            num_applicants: None,
            easy_apply: None,
            updated_at: Utc::now(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    /// URL to enrich from; blank URLs count as missing.
    pub fn enrichment_url(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|url| !url.is_empty())
    }

    /// Merge `update` into the posting. `None` never clears a stored value.
    pub fn apply(&mut self, update: JobUpdate, now: DateTime<Utc>) {
        fn replace<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }
        fn fill<T>(slot: &mut Option<T>, value: Option<T>) {
            if slot.is_none() {
                *slot = value;
            }
        }

        if let Some(status) = update.status {
            self.status = status;
        }
        replace(&mut self.description, update.description);
        replace(&mut self.salary, update.salary);
        replace(&mut self.job_type, update.job_type);
        replace(&mut self.seniority_level, update.seniority_level);
        replace(&mut self.num_applicants, update.num_applicants);
        replace(&mut self.easy_apply, update.easy_apply);
        fill(&mut self.location, update.location);
        fill(&mut self.workplace_type, update.workplace_type);
        self.updated_at = now;
    }
}

/// Fields written back by the pipeline. Every `None` is left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub description: Option<String>,
    pub salary: Option<String>,
    pub job_type: Option<String>,
    pub seniority_level: Option<String>,
    pub num_applicants: Option<u32>,
    pub easy_apply: Option<bool>,
    /// Only written when the stored value is empty.
    pub location: Option<String>,
    /// Only written when the stored value is empty.
    pub workplace_type: Option<String>,
}

impl JobUpdate {
    /// Marks the job re-triggerable without touching extracted fields.
    pub fn failed() -> Self {
        Self {
            status: Some(JobStatus::EnrichmentFailed),
            ..Default::default()
        }
    }

    pub fn from_extraction(result: &ExtractionResult) -> Self {
        let fields = &result.fields;
        Self {
            status: Some(JobStatus::NoResponse),
            description: Some(result.description.clone()),
            salary: fields.salary.clone(),
            job_type: fields.job_type.clone(),
            seniority_level: fields.seniority_level.clone(),
            num_applicants: fields.num_applicants,
            easy_apply: fields.easy_apply,
            location: fields.location.clone(),
            workplace_type: fields.workplace_type.clone(),
        }
    }
}
