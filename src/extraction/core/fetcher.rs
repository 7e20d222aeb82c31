//! Abstraction over the single authenticated GET performed per job.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

use crate::modules::session::CookieSet;

use super::types::FetchedPage;

/// Transport-level failure of the HTML fetch.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("unexpected status {status} for {url}")]
    Status { status: u16, url: String },
    #[error("invalid request header: {0}")]
    InvalidHeader(String),
    #[error("transport error: {0}")]
    Transport(String),
}

/// Fetches server-rendered HTML for a job posting.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url, cookies: &CookieSet) -> Result<FetchedPage, FetchError>;
}
