//! Core utilities shared by fetching, detection, and extraction layers.

pub mod fetcher;
pub mod reqwest_client;
pub mod text;
pub mod timing;
pub mod types;

pub use fetcher::{FetchError, PageFetcher};
pub use reqwest_client::ReqwestPageFetcher;
pub use timing::{Sleeper, ThrottlePolicy, TokioSleeper};
pub use types::{
    ExtractionResult, FetchedPage, HeaderFields, JobOutcome, OutcomeKind, SourceStrategy,
};
