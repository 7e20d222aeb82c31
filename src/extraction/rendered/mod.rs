//! Tier 2: extraction from a fully rendered DOM.
//!
//! A real browser surface renders the posting, an expand heuristic reveals
//! truncated text, and section strategies isolate the description from the
//! resulting snapshot. The surface itself only navigates, returns HTML and
//! clicks; all markup matching happens on parsed snapshots.

pub mod expand;
pub mod extractor;
pub mod fields;
pub mod section;
pub mod surface;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

use crate::modules::session::CookieSet;

pub use expand::{
    ClassPatternExpander, ExactTextExpander, ExpandHeuristic, ExpandStateExpander,
    default_expanders,
};
pub use extractor::{RenderedDomExtractor, RenderedOutcome};
pub use fields::RenderedFieldScanner;
pub use section::{ContainerSelectorSection, HeadingSection, SectionStrategy, default_sections};
pub use surface::{RenderLease, RenderSurface};

/// The `index`-th element (document order) matching `selector`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClickTarget {
    pub selector: String,
    pub index: usize,
}

impl ClickTarget {
    pub fn new(selector: impl Into<String>, index: usize) -> Self {
        Self {
            selector: selector.into(),
            index,
        }
    }
}

/// Failures of the rendering surface.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("rendering surface unavailable: {0}")]
    Unavailable(String),
    #[error("rendering surface busy for {0:?}")]
    SurfaceBusy(Duration),
    #[error("navigation failed: {0}")]
    Navigation(String),
    #[error("navigation timed out after {0:?}")]
    Timeout(Duration),
    #[error("page script failed: {0}")]
    Script(String),
    #[error("no element #{index} for selector `{selector}`")]
    ElementMissing { selector: String, index: usize },
}

/// A browser tab driven by the rendered extractor.
#[async_trait]
pub trait RenderPage: Send {
    /// Install `cookies`, navigate to `url` and wait for the load to finish.
    /// Returns the resolved URL.
    async fn open(
        &mut self,
        url: &Url,
        cookies: &CookieSet,
        timeout: Duration,
    ) -> Result<Url, RenderError>;

    /// Serialized HTML of the current document.
    async fn html(&mut self) -> Result<String, RenderError>;

    async fn click(&mut self, target: &ClickTarget) -> Result<(), RenderError>;
}
