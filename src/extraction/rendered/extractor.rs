//! Drives one tier-2 attempt on a leased page.

use std::time::Duration;

use scraper::Html;
use url::Url;

use crate::config::{ThresholdConfig, TimingConfig};
use crate::extraction::core::text::page_title;
use crate::extraction::core::{HeaderFields, Sleeper, SourceStrategy};
use crate::extraction::detectors::{AuthStatus, AuthWallDetection, AuthWallDetector};
use crate::modules::session::CookieSet;

use super::expand::{ExpandHeuristic, default_expanders};
use super::fields::RenderedFieldScanner;
use super::section::{SectionStrategy, default_sections};
use super::{ClickTarget, RenderError, RenderPage};

/// Result of a tier-2 attempt that reached the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderedOutcome {
    AuthWall(AuthWallDetection),
    Extracted {
        description: Option<(String, SourceStrategy)>,
        fields: HeaderFields,
        expand_heuristic: Option<&'static str>,
    },
}

pub struct RenderedDomExtractor {
    expanders: Vec<Box<dyn ExpandHeuristic>>,
    sections: Vec<Box<dyn SectionStrategy>>,
    fields: RenderedFieldScanner,
    render_timeout: Duration,
    render_settle: Duration,
    expand_settle: Duration,
}

impl RenderedDomExtractor {
    pub fn new(timing: &TimingConfig, thresholds: &ThresholdConfig) -> Self {
        Self {
            expanders: default_expanders(),
            sections: default_sections(thresholds),
            fields: RenderedFieldScanner::new(thresholds.max_header_field_chars),
            render_timeout: timing.render_timeout(),
            render_settle: timing.render_settle(),
            expand_settle: timing.expand_settle(),
        }
    }

    pub fn with_expanders(mut self, expanders: Vec<Box<dyn ExpandHeuristic>>) -> Self {
        self.expanders = expanders;
        self
    }

    pub fn with_sections(mut self, sections: Vec<Box<dyn SectionStrategy>>) -> Self {
        self.sections = sections;
        self
    }

    /// Navigate, check for an auth wall, expand truncated text and analyse
    /// the final snapshot.
    pub async fn extract(
        &self,
        page: &mut dyn RenderPage,
        url: &Url,
        cookies: &CookieSet,
        sleeper: &dyn Sleeper,
        detector: &mut AuthWallDetector,
    ) -> Result<RenderedOutcome, RenderError> {
        let resolved = page.open(url, cookies, self.render_timeout).await?;
        sleeper.sleep(self.render_settle).await;

        let mut html = page.html().await?;
        if let AuthStatus::LoginRedirected(detection) =
            detector.classify(&resolved, page_title(&html).as_deref())
        {
            return Ok(RenderedOutcome::AuthWall(detection));
        }

        let mut expand_heuristic = None;
        if let Some((name, target)) = self.find_expand_target(&html) {
            match page.click(&target).await {
                Ok(()) => {
                    log::info!("expand heuristic `{name}` fired on {url}");
                    expand_heuristic = Some(name);
                    sleeper.sleep(self.expand_settle).await;
                    html = page.html().await?;
                }
                Err(err) => log::warn!("expand click via `{name}` failed on {url}: {err}"),
            }
        }

        let (description, fields) = self.analyse(&html);
        Ok(RenderedOutcome::Extracted {
            description,
            fields,
            expand_heuristic,
        })
    }

    fn find_expand_target(&self, html: &str) -> Option<(&'static str, ClickTarget)> {
        let document = Html::parse_document(html);
        self.expanders
            .iter()
            .find_map(|heuristic| heuristic.find(&document).map(|target| (heuristic.name(), target)))
    }

    /// Section strategies in order, plus independent header fields.
    pub fn analyse(&self, html: &str) -> (Option<(String, SourceStrategy)>, HeaderFields) {
        let document = Html::parse_document(html);
        let description = self.sections.iter().find_map(|section| {
            let text = section.extract(&document)?;
            log::debug!("section strategy `{}` matched", section.name());
            Some((text, section.strategy()))
        });
        (description, self.fields.scan(&document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingSleeper {
        slept: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.slept.lock().unwrap().push(duration);
        }
    }

    /// Serves `before` until a click lands, then `after`.
    struct ScriptedPage {
        resolved: Url,
        before: String,
        after: String,
        clicks: Arc<Mutex<Vec<ClickTarget>>>,
    }

    #[async_trait]
    impl RenderPage for ScriptedPage {
        async fn open(
            &mut self,
            _url: &Url,
            _cookies: &CookieSet,
            _timeout: Duration,
        ) -> Result<Url, RenderError> {
            Ok(self.resolved.clone())
        }

        async fn html(&mut self) -> Result<String, RenderError> {
            if self.clicks.lock().unwrap().is_empty() {
                Ok(self.before.clone())
            } else {
                Ok(self.after.clone())
            }
        }

        async fn click(&mut self, target: &ClickTarget) -> Result<(), RenderError> {
            self.clicks.lock().unwrap().push(target.clone());
            Ok(())
        }
    }

    fn paragraph() -> String {
        "Own the ingestion pipeline end to end and partner with product on the roadmap. ".repeat(3)
    }

    fn extractor() -> RenderedDomExtractor {
        RenderedDomExtractor::new(&TimingConfig::default(), &ThresholdConfig::default())
    }

    #[tokio::test]
    async fn expands_then_extracts_heading_section() {
        let clicks = Arc::new(Mutex::new(Vec::new()));
        let mut page = ScriptedPage {
            resolved: Url::parse("https://www.linkedin.com/jobs/view/9").unwrap(),
            before: r#"<title>Data Engineer | Acme</title><div><h2>About the job</h2><p>Own the…</p><button>…see more</button></div>"#.into(),
            after: format!(
                r#"<title>Data Engineer | Acme</title><div class="jobs-box"><h2>About the job</h2><p>{}</p><p>{}</p><button>Show less</button></div>"#,
                paragraph(),
                paragraph()
            ),
            clicks: Arc::clone(&clicks),
        };
        let sleeper = RecordingSleeper::default();
        let mut detector = AuthWallDetector::new();
        let url = Url::parse("https://www.linkedin.com/jobs/view/9").unwrap();

        let outcome = extractor()
            .extract(&mut page, &url, &CookieSet::default(), &sleeper, &mut detector)
            .await
            .unwrap();

        let RenderedOutcome::Extracted {
            description: Some((text, strategy)),
            expand_heuristic,
            ..
        } = outcome
        else {
            panic!("expected an extracted description");
        };
        assert_eq!(strategy, SourceStrategy::DomHeading);
        assert_eq!(expand_heuristic, Some("exact-text"));
        assert!(text.starts_with("Own the ingestion pipeline"));
        assert!(!text.contains("Show less"));
        assert_eq!(clicks.lock().unwrap().len(), 1);
        assert_eq!(
            *sleeper.slept.lock().unwrap(),
            vec![Duration::from_millis(3_000), Duration::from_millis(1_000)]
        );
    }

    #[tokio::test]
    async fn login_redirect_inside_browser_is_an_auth_wall() {
        let mut page = ScriptedPage {
            resolved: Url::parse("https://www.linkedin.com/login?session_redirect=x").unwrap(),
            before: "<title>LinkedIn Login</title>".into(),
            after: String::new(),
            clicks: Arc::default(),
        };
        let url = Url::parse("https://www.linkedin.com/jobs/view/9").unwrap();

        let outcome = extractor()
            .extract(
                &mut page,
                &url,
                &CookieSet::default(),
                &RecordingSleeper::default(),
                &mut AuthWallDetector::new(),
            )
            .await
            .unwrap();

        assert!(matches!(outcome, RenderedOutcome::AuthWall(_)));
    }

    #[test]
    fn analyse_reports_nothing_on_empty_snapshot() {
        let (description, fields) = extractor().analyse("<html><body><nav>Home</nav></body></html>");
        assert!(description.is_none());
        assert!(fields.is_empty());
    }
}
