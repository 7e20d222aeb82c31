//! Model-assisted description cleanup.
//!
//! Extracted text often drags in navigation labels, footer links and other
//! page chrome. When a completion provider is configured the description is
//! rewritten without that noise. Any failure returns the input unchanged, so
//! this stage can never fail a job.

mod openai;

pub use openai::OpenAiCompletionProvider;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::extraction::core::text::char_len;

pub const CLEANUP_SYSTEM_PROMPT: &str = "You clean up job descriptions scraped from web pages. \
Remove navigation labels, button text, footer links, cookie notices, similar-job lists and any other \
page boilerplate. Keep every sentence about the role, responsibilities, qualifications, benefits and \
compensation, in the original wording and order. Return only the cleaned description as plain text.";

/// Errors surfaced by completion providers. Never propagated past the cleaner.
#[derive(Debug, Error)]
pub enum CleanupError {
    #[error("cleanup provider misconfigured: {0}")]
    Configuration(String),
    #[error("cleanup request failed: {0}")]
    Request(String),
    #[error("cleanup request timed out after {0:?}")]
    Timeout(Duration),
    #[error("cleanup provider returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("cleanup provider returned an empty completion")]
    EmptyOutput,
    #[error("cleanup output shrank from {input} to {output} characters")]
    Truncated { input: usize, output: usize },
}

/// Shared interface implemented by chat-completion backends.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    fn name(&self) -> &'static str;
    async fn complete(&self, system: &str, user: &str) -> Result<String, CleanupError>;
}

/// Result of a cleanup pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedText {
    pub text: String,
    /// True only when the provider's output replaced the input.
    pub cleaned: bool,
}

impl CleanedText {
    fn unchanged(text: &str) -> Self {
        Self {
            text: text.to_string(),
            cleaned: false,
        }
    }
}

/// Fail-open post-processor around an optional provider.
#[derive(Clone, Default)]
pub struct ContentCleaner {
    provider: Option<Arc<dyn CompletionProvider>>,
    min_chars: usize,
}

impl std::fmt::Debug for ContentCleaner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentCleaner")
            .field("provider", &self.provider.as_ref().map(|p| p.name()))
            .field("min_chars", &self.min_chars)
            .finish()
    }
}

impl ContentCleaner {
    pub fn new(provider: Option<Arc<dyn CompletionProvider>>, min_chars: usize) -> Self {
        Self {
            provider,
            min_chars,
        }
    }

    /// Cleaner that always returns its input.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    pub async fn clean(&self, raw: &str) -> CleanedText {
        let input_len = char_len(raw);
        if input_len < self.min_chars {
            return CleanedText::unchanged(raw);
        }
        let Some(provider) = &self.provider else {
            return CleanedText::unchanged(raw);
        };

        match self.request(provider.as_ref(), raw, input_len).await {
            Ok(text) => CleanedText {
                text,
                cleaned: true,
            },
            Err(err) => {
                log::warn!("cleanup via {} failed, keeping raw text: {err}", provider.name());
                CleanedText::unchanged(raw)
            }
        }
    }

    async fn request(
        &self,
        provider: &dyn CompletionProvider,
        raw: &str,
        input_len: usize,
    ) -> Result<String, CleanupError> {
        let output = provider.complete(CLEANUP_SYSTEM_PROMPT, raw).await?;
        let output = output.trim();
        if output.is_empty() {
            return Err(CleanupError::EmptyOutput);
        }
        let output_len = char_len(output);
        if output_len * 4 < input_len {
            return Err(CleanupError::Truncated {
                input: input_len,
                output: output_len,
            });
        }
        Ok(output.to_string())
    }
}
