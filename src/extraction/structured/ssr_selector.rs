//! Description containers present in server-rendered markup.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use crate::extraction::core::SourceStrategy;
use crate::extraction::core::text::{char_len, compile_selectors, element_text};

use super::{DescriptionExtractor, StructuredMatch};

/// Ordered from the most specific container to the loosest.
const DESCRIPTION_SELECTORS: &[&str] = &[
    ".show-more-less-html__markup",
    ".description__text--rich",
    ".description__text",
    ".jobs-description__content",
    ".jobs-description-content__text",
    ".jobs-box__html-content",
    "#job-details",
    "[class*='job-description']",
];

static SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| compile_selectors(DESCRIPTION_SELECTORS));

#[derive(Debug, Clone)]
pub struct SsrSelectorExtractor {
    min_chars: usize,
}

impl SsrSelectorExtractor {
    pub fn new(min_chars: usize) -> Self {
        Self { min_chars }
    }
}

impl DescriptionExtractor for SsrSelectorExtractor {
    fn name(&self) -> &'static str {
        "ssr-selector"
    }

    fn strategy(&self) -> Option<SourceStrategy> {
        Some(SourceStrategy::SsrSelector)
    }

    fn extract(&self, document: &Html) -> StructuredMatch {
        let description = SELECTORS.iter().find_map(|selector| {
            document
                .select(selector)
                .map(element_text)
                .find(|text| char_len(text) > self.min_chars)
        });

        StructuredMatch {
            description,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_short_containers() {
        let body = "Responsibilities include designing services and mentoring engineers. ".repeat(3);
        let html = format!(
            r#"<div class="show-more-less-html__markup">Loading…</div>
               <section class="description__text"><h2>Role</h2><p>{body}</p></section>"#
        );

        let found = SsrSelectorExtractor::new(100).extract(&Html::parse_document(&html));
        let description = found.description.expect("description");
        assert!(description.starts_with("Role\nResponsibilities include"));
    }

    #[test]
    fn nothing_above_threshold_is_a_miss() {
        let html = r#"<div class="description__text">Too short</div>"#;
        let found = SsrSelectorExtractor::new(100).extract(&Html::parse_document(html));
        assert!(found.description.is_none());
    }
}
