//! Tier 1: extraction from server-rendered HTML.
//!
//! Extractors run in strict priority order over one parsed document. The
//! first non-empty description wins; header fields are merged from every
//! extractor, earlier extractors taking precedence.

pub mod header_fields;
pub mod json_ld;
pub mod ssr_selector;

use scraper::Html;

use crate::config::ThresholdConfig;
use crate::extraction::core::{HeaderFields, SourceStrategy};

pub use header_fields::HeaderFieldScanner;
pub use json_ld::JsonLdExtractor;
pub use ssr_selector::SsrSelectorExtractor;

/// What a single extractor found in a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuredMatch {
    pub description: Option<String>,
    pub fields: HeaderFields,
}

/// One tier-1 extraction strategy.
pub trait DescriptionExtractor: Send + Sync {
    fn name(&self) -> &'static str;

    /// Strategy recorded when this extractor supplies the description.
    /// Field-only extractors return `None`.
    fn strategy(&self) -> Option<SourceStrategy>;

    fn extract(&self, document: &Html) -> StructuredMatch;
}

/// Combined tier-1 result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuredOutcome {
    pub description: Option<(String, SourceStrategy)>,
    pub fields: HeaderFields,
}

impl StructuredOutcome {
    pub fn found_description(&self) -> bool {
        self.description.is_some()
    }
}

/// Runs the tier-1 extractors in priority order.
pub struct StructuredExtractor {
    extractors: Vec<Box<dyn DescriptionExtractor>>,
}

impl StructuredExtractor {
    /// JSON-LD, then server-rendered selectors, then the header-field scan.
    pub fn new(thresholds: &ThresholdConfig) -> Self {
        Self::with_extractors(vec![
            Box::new(JsonLdExtractor::new()),
            Box::new(SsrSelectorExtractor::new(thresholds.min_ssr_description_chars)),
            Box::new(HeaderFieldScanner::new(thresholds.max_header_field_chars)),
        ])
    }

    pub fn with_extractors(extractors: Vec<Box<dyn DescriptionExtractor>>) -> Self {
        Self { extractors }
    }

    /// Parse `body` and run every extractor. The parsed document never
    /// outlives this call.
    pub fn extract(&self, body: &str) -> StructuredOutcome {
        let document = Html::parse_document(body);
        let mut outcome = StructuredOutcome::default();

        for extractor in &self.extractors {
            let found = extractor.extract(&document);
            outcome.fields.merge_missing(found.fields);

            if outcome.description.is_some() {
                continue;
            }
            let Some(strategy) = extractor.strategy() else {
                continue;
            };
            if let Some(description) = found.description.filter(|text| !text.trim().is_empty()) {
                log::debug!("{} matched a description", extractor.name());
                outcome.description = Some((description, strategy));
            }
        }

        outcome
    }
}

impl Default for StructuredExtractor {
    fn default() -> Self {
        Self::new(&ThresholdConfig::default())
    }
}
