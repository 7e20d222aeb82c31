//! Strategies isolating the description section of a rendered page.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use crate::config::ThresholdConfig;
use crate::extraction::core::SourceStrategy;
use crate::extraction::core::text::{char_len, compile_selectors, element_text, own_text, text_after};

/// One way of locating the description in a rendered snapshot.
pub trait SectionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn strategy(&self) -> SourceStrategy;

    fn extract(&self, document: &Html) -> Option<String>;
}

const SECTION_HEADINGS: &[&str] = &[
    "About the job",
    "Job description",
    "About the role",
    "About this role",
    "Role description",
    "Description",
];

/// Text that follows the description on a rendered posting.
const NOISE_MARKERS: &[&str] = &[
    "Show less",
    "See less",
    "See more jobs",
    "Report this job",
    "Set alert for similar jobs",
    "About the company",
    "Similar jobs",
    "People also viewed",
    "Looking for talent?",
    "Seniority level",
];

/// Ancestors climbed while looking for the element holding the body text.
const MAX_ANCESTOR_DEPTH: usize = 6;

static ANY_ELEMENT: Lazy<Selector> =
    Lazy::new(|| Selector::parse("*").expect("invalid universal selector"));

/// Anchors on an element whose own text is exactly a known section heading
/// and keeps what follows it.
#[derive(Debug, Clone)]
pub struct HeadingSection {
    headings: Vec<String>,
    min_chars: usize,
    min_noise_offset: usize,
}

impl HeadingSection {
    pub fn new(min_chars: usize, min_noise_offset: usize) -> Self {
        Self {
            headings: SECTION_HEADINGS.iter().map(|h| h.to_ascii_lowercase()).collect(),
            min_chars,
            min_noise_offset,
        }
    }

    pub fn from_thresholds(thresholds: &ThresholdConfig) -> Self {
        Self::new(thresholds.min_section_chars, thresholds.min_noise_offset_chars)
    }

    fn is_heading(&self, element: ElementRef<'_>) -> Option<String> {
        let text = own_text(element);
        let lowered = text.to_ascii_lowercase();
        self.headings.contains(&lowered).then_some(lowered)
    }

    /// Nearest ancestor whose text extends beyond the heading itself.
    fn container<'a>(&self, heading: ElementRef<'a>, heading_len: usize) -> Option<ElementRef<'a>> {
        heading
            .ancestors()
            .filter_map(ElementRef::wrap)
            .take(MAX_ANCESTOR_DEPTH)
            .find(|ancestor| char_len(&element_text(*ancestor)) > heading_len + self.min_noise_offset)
    }

    /// Cut `remainder` (the text following the heading element) at the
    /// first noise marker far enough from its start.
    fn trim_noise(&self, remainder: &str) -> Option<String> {
        let lowered_remainder = remainder.to_ascii_lowercase();

        let end = NOISE_MARKERS
            .iter()
            .filter_map(|marker| {
                let marker = marker.to_ascii_lowercase();
                let mut from = 0;
                while let Some(offset) = lowered_remainder[from..].find(&marker) {
                    let at = from + offset;
                    if char_len(&remainder[..at]) >= self.min_noise_offset {
                        return Some(at);
                    }
                    from = at + marker.len();
                }
                None
            })
            .min()
            .unwrap_or(remainder.len());

        let section = remainder[..end].trim();
        (char_len(section) >= self.min_chars).then(|| section.to_string())
    }
}

impl SectionStrategy for HeadingSection {
    fn name(&self) -> &'static str {
        "heading-anchor"
    }

    fn strategy(&self) -> SourceStrategy {
        SourceStrategy::DomHeading
    }

    fn extract(&self, document: &Html) -> Option<String> {
        document.select(&ANY_ELEMENT).find_map(|element| {
            let heading = self.is_heading(element)?;
            let container = self.container(element, heading.len())?;
            self.trim_noise(&text_after(container, element))
        })
    }
}

const CONTAINER_SELECTORS: &[&str] = &[
    ".jobs-description__content",
    ".jobs-description-content__text",
    ".jobs-box__html-content",
    "#job-details",
    ".jobs-description",
    ".show-more-less-html__markup",
    ".description__text",
    "[class*='description']",
    "article",
    "main",
];

static CONTAINERS: Lazy<Vec<Selector>> = Lazy::new(|| compile_selectors(CONTAINER_SELECTORS));

/// Broader containers, accepted when long and multi-line.
#[derive(Debug, Clone)]
pub struct ContainerSelectorSection {
    min_chars: usize,
    min_line_breaks: usize,
}

impl ContainerSelectorSection {
    pub fn new(min_chars: usize, min_line_breaks: usize) -> Self {
        Self {
            min_chars,
            min_line_breaks,
        }
    }

    pub fn from_thresholds(thresholds: &ThresholdConfig) -> Self {
        Self::new(thresholds.min_fallback_chars, thresholds.min_fallback_line_breaks)
    }

    fn qualifies(&self, text: &str) -> bool {
        char_len(text) > self.min_chars && text.matches('\n').count() >= self.min_line_breaks
    }
}

impl SectionStrategy for ContainerSelectorSection {
    fn name(&self) -> &'static str {
        "container-selector"
    }

    fn strategy(&self) -> SourceStrategy {
        SourceStrategy::DomSelector
    }

    fn extract(&self, document: &Html) -> Option<String> {
        CONTAINERS.iter().find_map(|selector| {
            document
                .select(selector)
                .map(element_text)
                .find(|text| self.qualifies(text))
        })
    }
}

/// Heading anchor first, then container selectors.
pub fn default_sections(thresholds: &ThresholdConfig) -> Vec<Box<dyn SectionStrategy>> {
    vec![
        Box::new(HeadingSection::from_thresholds(thresholds)),
        Box::new(ContainerSelectorSection::from_thresholds(thresholds)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = "You will design distributed systems, review code, and mentor engineers across three teams. \
        We expect strong Rust experience and a habit of writing things down.";

    #[test]
    fn heading_section_keeps_text_after_heading_until_noise() {
        let html = format!(
            r#"<main><div class="jobs-box">
                <h2><span>About the job</span></h2>
                <div><p>{BODY}</p><p>{BODY}</p></div>
                <button>Show less</button>
                <footer>Report this job</footer>
            </div></main>"#
        );

        let section = HeadingSection::new(150, 50)
            .extract(&Html::parse_document(&html))
            .expect("section");

        assert!(section.starts_with("You will design"));
        assert!(section.ends_with("writing things down."));
        assert!(!section.contains("Show less"));
    }

    #[test]
    fn noise_close_to_the_heading_is_ignored() {
        let html = format!(
            r#"<section><h2>Job description</h2><p>See less of the busywork here.</p><p>{BODY}</p><p>See more jobs</p></section>"#
        );

        let section = HeadingSection::new(150, 50)
            .extract(&Html::parse_document(&html))
            .expect("section");

        assert!(section.starts_with("See less of the busywork"));
        assert!(!section.contains("See more jobs"));
    }

    #[test]
    fn heading_phrase_in_earlier_text_does_not_shift_the_section() {
        let html = format!(
            r#"<section><h1>Product Description Writer</h1><h2>Description</h2><p>You will write and maintain product copy. {BODY}</p></section>"#
        );

        let section = HeadingSection::new(100, 50)
            .extract(&Html::parse_document(&html))
            .expect("section");

        assert!(section.starts_with("You will write and maintain product copy."));
        assert!(!section.contains("Writer"));
        assert!(!section.contains("Description"));
    }

    #[test]
    fn heading_must_be_exact_own_text() {
        let html = format!(r#"<div><h2>More about the job market</h2><p>{BODY}</p></div>"#);
        assert!(HeadingSection::new(150, 50).extract(&Html::parse_document(&html)).is_none());
    }

    #[test]
    fn short_sections_are_rejected() {
        let html = r#"<div><h2>About the job</h2><p>Short blurb that is long enough to pass the noise offset.</p></div>"#;
        assert!(HeadingSection::new(150, 50).extract(&Html::parse_document(html)).is_none());
    }

    #[test]
    fn container_fallback_needs_multiple_lines() {
        let one_line = format!(r#"<div id="job-details"><span>{BODY} {BODY}</span></div>"#);
        let multi_line = format!(
            r#"<div id="job-details"><p>{BODY}</p><p>{BODY}</p><ul><li>Rust</li></ul></div>"#
        );
        let strategy = ContainerSelectorSection::new(200, 2);

        assert!(strategy.extract(&Html::parse_document(&one_line)).is_none());
        let text = strategy
            .extract(&Html::parse_document(&multi_line))
            .expect("fallback text");
        assert!(text.ends_with("Rust"));
    }
}
