//! Integrations that rely on third-party services.
//!
//! This module groups the headless browser adapter and the completion
//! provider used for cleanup, keeping vendor details out of the pipeline.

pub mod browser;
pub mod cleanup;

pub use browser::{ChromiumPage, find_chromium, launch_chromium_surface};
pub use cleanup::{CleanupError, CompletionProvider, ContentCleaner, OpenAiCompletionProvider};
