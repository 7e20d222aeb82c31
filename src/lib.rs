//! # posting-enricher
//!
//! Enriches low-fidelity job-posting stubs (title, company, URL) with the
//! full description and best-effort header fields scraped from the posting
//! page.
//!
//! Each job goes through an authenticated fetch and an auth-wall check, then
//! two extraction tiers:
//!
//! - Tier 1 reads server-rendered markup: JSON-LD `JobPosting` payloads, then
//!   description container selectors, plus a header-field scan.
//! - Tier 2 drives a real browser surface, expands truncated text, and
//!   isolates the description section by heading or container selector.
//!
//! An optional model-assisted cleanup strips boilerplate, failing open to the
//! raw text. Jobs run strictly sequentially with randomized throttling.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use posting_enricher::{
//!     BatchEnricher, CookieSet, EnrichmentSettings, RedbJobStore, StaticSessionProvider,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = EnrichmentSettings::default().with_env_overrides();
//!     let enricher = BatchEnricher::builder()
//!         .with_settings(settings)
//!         .with_store(Arc::new(RedbJobStore::open("jobs.redb")?))
//!         .with_session_provider(Arc::new(StaticSessionProvider::new(
//!             CookieSet::from_header("li_at=...; JSESSIONID=..."),
//!         )))
//!         .with_chromium()
//!         .await?
//!         .build()?;
//!
//!     let ids = vec!["4012345678".to_string()];
//!     let report = enricher.enrich_batch(&ids, &CancellationToken::new()).await?;
//!     println!("{report:?}");
//!     Ok(())
//! }
//! ```

mod enricher;

pub mod config;
pub mod external_deps;
pub mod extraction;
pub mod modules;

pub use crate::enricher::{
    BatchEnricher,
    BatchEnricherBuilder,
    EnricherError,
    EnricherResult,
    JobReport,
};

pub use crate::config::{
    BrowserConfig,
    CleanupConfig,
    ConfigError,
    EnrichmentSettings,
    FetchConfig,
    ThresholdConfig,
    TimingConfig,
};

pub use crate::extraction::core::{
    ExtractionResult,
    FetchError,
    FetchedPage,
    HeaderFields,
    JobOutcome,
    OutcomeKind,
    PageFetcher,
    ReqwestPageFetcher,
    Sleeper,
    SourceStrategy,
    ThrottlePolicy,
    TokioSleeper,
};

pub use crate::extraction::detectors::{
    AuthStatus,
    AuthWallDetection,
    AuthWallDetector,
    AuthWallSignal,
};

pub use crate::extraction::pipeline::ExtractionPipeline;

pub use crate::extraction::rendered::{
    ClickTarget,
    ExpandHeuristic,
    RenderError,
    RenderLease,
    RenderPage,
    RenderSurface,
    RenderedDomExtractor,
    SectionStrategy,
};

pub use crate::extraction::structured::{DescriptionExtractor, StructuredExtractor};

pub use crate::extraction::user_agents::{
    UserAgentError,
    UserAgentOptions,
    UserAgentProfile,
    get_user_agent_profile,
};

pub use crate::external_deps::{
    ChromiumPage,
    CleanupError,
    CompletionProvider,
    ContentCleaner,
    OpenAiCompletionProvider,
    launch_chromium_surface,
};

pub use crate::modules::{
    CookieSet,
    EnrichmentEvent,
    EnrichmentStats,
    EventDispatcher,
    EventHandler,
    InMemoryJobStore,
    JobPosting,
    JobStatus,
    JobStore,
    JobUpdate,
    LoggingHandler,
    MetricsCollector,
    MetricsHandler,
    RedbJobStore,
    SessionCookie,
    SessionProvider,
    StaticSessionProvider,
    StoreError,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
