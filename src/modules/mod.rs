//! Cross-cutting services module
//!
//! Session input, job persistence, events, and metrics shared by the
//! orchestrator and the extraction pipeline.

pub mod events;
pub mod metrics;
pub mod session;
pub mod store;

// Re-export commonly used types
pub use events::{
    EnrichmentEvent, EventDispatcher, EventHandler, HeuristicFiredEvent, JobFinishedEvent,
    JobStartedEvent, LoggingHandler, MetricsHandler, SessionInvalidEvent, ThrottleEvent,
};
pub use metrics::{EnrichmentStats, MetricsCollector};
pub use session::{CookieSet, SessionCookie, SessionProvider, StaticSessionProvider};
pub use store::{
    InMemoryJobStore, JobPosting, JobStatus, JobStore, JobUpdate, RedbJobStore, StoreError,
};
