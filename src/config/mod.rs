//! Settings and configuration module
//!
//! Provides unified configuration with:
//! - Serde-backed defaults for every knob
//! - JSON file loading
//! - Environment overrides for credentials and binaries

pub mod settings;

pub use settings::{
    BrowserConfig, CleanupConfig, ConfigError, EnrichmentSettings, FetchConfig, ThresholdConfig,
    TimingConfig,
};
