//! Heuristics locating the control that expands truncated description text.
//!
//! All heuristics scan the same interactive-element selector so a match can
//! be addressed on the live page by its position in document order.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use scraper::{ElementRef, Html, Selector};

use crate::extraction::core::text::inline_text;

use super::ClickTarget;

/// Elements considered clickable.
pub const INTERACTIVE_SELECTOR: &str = "button, a, [role='button']";

static INTERACTIVE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(INTERACTIVE_SELECTOR).expect("invalid interactive selector"));

/// One way of recognising an expand control.
pub trait ExpandHeuristic: Send + Sync {
    fn name(&self) -> &'static str;

    fn matches(&self, element: ElementRef<'_>) -> bool;

    /// First matching interactive element in `document`.
    fn find(&self, document: &Html) -> Option<ClickTarget> {
        document
            .select(&INTERACTIVE)
            .position(|element| self.matches(element))
            .map(|index| ClickTarget::new(INTERACTIVE_SELECTOR, index))
    }
}

/// Exact, normalised label such as "Show more" or "… see more".
#[derive(Debug, Clone)]
pub struct ExactTextExpander {
    labels: Vec<String>,
}

impl Default for ExactTextExpander {
    fn default() -> Self {
        Self::new(["show more", "see more", "read more", "show full description"])
    }
}

impl ExactTextExpander {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(|label| label.into().to_lowercase()).collect(),
        }
    }
}

impl ExpandHeuristic for ExactTextExpander {
    fn name(&self) -> &'static str {
        "exact-text"
    }

    fn matches(&self, element: ElementRef<'_>) -> bool {
        let label = normalize_label(&inline_text(element));
        !label.is_empty() && self.labels.iter().any(|known| *known == label)
    }
}

/// Collapsed controls (`aria-expanded="false"`) whose label talks about
/// showing more.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExpandStateExpander;

impl ExpandHeuristic for ExpandStateExpander {
    fn name(&self) -> &'static str {
        "expand-state"
    }

    fn matches(&self, element: ElementRef<'_>) -> bool {
        if element.value().attr("aria-expanded") != Some("false") {
            return false;
        }
        let label = format!(
            "{} {}",
            inline_text(element),
            element.value().attr("aria-label").unwrap_or_default()
        );
        EXPAND_WORDS_RE.is_match(&label)
    }
}

/// Class names following "show more"/"expand" conventions.
#[derive(Debug, Default, Clone, Copy)]
pub struct ClassPatternExpander;

impl ExpandHeuristic for ClassPatternExpander {
    fn name(&self) -> &'static str {
        "class-pattern"
    }

    fn matches(&self, element: ElementRef<'_>) -> bool {
        let Some(class) = element.value().attr("class") else {
            return false;
        };
        EXPAND_CLASS_RE.is_match(class) && !COLLAPSE_CLASS_RE.is_match(class)
    }
}

/// Exact text, then expand state, then class pattern.
pub fn default_expanders() -> Vec<Box<dyn ExpandHeuristic>> {
    vec![
        Box::new(ExactTextExpander::default()),
        Box::new(ExpandStateExpander),
        Box::new(ClassPatternExpander),
    ]
}

/// Lowercase and strip ellipses so "…see more" and "See more..." compare equal.
fn normalize_label(raw: &str) -> String {
    raw.replace('…', " ")
        .replace("...", " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

static EXPAND_WORDS_RE: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(r"\b(?:more|expand|full description|see all)\b")
        .case_insensitive(true)
        .build()
        .expect("invalid expand words regex")
});

static EXPAND_CLASS_RE: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(r"(?:show-more|see-more|read-more|expand|truncate|more-button)")
        .case_insensitive(true)
        .build()
        .expect("invalid expand class regex")
});

static COLLAPSE_CLASS_RE: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(r"(?:show-less|see-less|collapse)")
        .case_insensitive(true)
        .build()
        .expect("invalid collapse class regex")
});
