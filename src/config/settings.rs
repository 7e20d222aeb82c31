//! Enrichment settings.
//!
//! Every delay, threshold, and endpoint used by the pipeline lives here so
//! hosts can tune them without touching extraction code.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or validating settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid settings JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Top-level settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentSettings {
    pub timing: TimingConfig,
    pub fetch: FetchConfig,
    pub thresholds: ThresholdConfig,
    pub cleanup: CleanupConfig,
    pub browser: BrowserConfig,
}

/// Delays and settle periods, all in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Pause after a job that succeeded from server-rendered markup.
    pub fast_path_delay_ms: u64,
    /// Lower bound of the randomized pause after any other job.
    pub throttle_min_ms: u64,
    /// Upper bound of the randomized pause after any other job.
    pub throttle_max_ms: u64,
    /// Wait after navigation for client-side rendering to finish.
    pub render_settle_ms: u64,
    /// Extra wait after clicking an expand control.
    pub expand_settle_ms: u64,
    pub render_timeout_ms: u64,
    /// Maximum wait for exclusive access to the browser surface.
    pub lease_timeout_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            fast_path_delay_ms: 1_500,
            throttle_min_ms: 4_000,
            throttle_max_ms: 8_000,
            render_settle_ms: 3_000,
            expand_settle_ms: 1_000,
            render_timeout_ms: 30_000,
            lease_timeout_ms: 60_000,
        }
    }
}

impl TimingConfig {
    pub fn fast_path_delay(&self) -> Duration {
        Duration::from_millis(self.fast_path_delay_ms)
    }

    pub fn throttle_window(&self) -> (Duration, Duration) {
        (
            Duration::from_millis(self.throttle_min_ms),
            Duration::from_millis(self.throttle_max_ms),
        )
    }

    pub fn render_settle(&self) -> Duration {
        Duration::from_millis(self.render_settle_ms)
    }

    pub fn expand_settle(&self) -> Duration {
        Duration::from_millis(self.expand_settle_ms)
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_millis(self.render_timeout_ms)
    }

    pub fn lease_timeout(&self) -> Duration {
        Duration::from_millis(self.lease_timeout_ms)
    }
}

/// HTTP fetcher options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub max_redirects: usize,
    /// Fixed user agent; a desktop profile is picked at random when unset.
    pub user_agent: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            max_redirects: 10,
            user_agent: None,
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Length thresholds used to reject false-positive matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub max_batch_size: usize,
    pub min_ssr_description_chars: usize,
    pub min_section_chars: usize,
    /// Noise markers closer than this to the heading are ignored.
    pub min_noise_offset_chars: usize,
    pub min_fallback_chars: usize,
    pub min_fallback_line_breaks: usize,
    pub max_header_field_chars: usize,
    pub min_cleanup_chars: usize,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 10,
            min_ssr_description_chars: 100,
            min_section_chars: 150,
            min_noise_offset_chars: 50,
            min_fallback_chars: 200,
            min_fallback_line_breaks: 2,
            max_header_field_chars: 200,
            min_cleanup_chars: 100,
        }
    }
}

/// Model-assisted cleanup. Disabled while `api_key` is unset.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".into(),
            model: "gpt-4o-mini".into(),
            max_tokens: 2_048,
            timeout_secs: 30,
        }
    }
}

impl std::fmt::Debug for CleanupConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CleanupConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Headless browser options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub executable: Option<PathBuf>,
    pub headless: bool,
    pub window_width: u32,
    pub window_height: u32,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            executable: None,
            headless: true,
            window_width: 1366,
            window_height: 900,
        }
    }
}

impl EnrichmentSettings {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_json::from_str(raw)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Apply `ENRICHER_*` environment overrides.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(key) = non_empty("ENRICHER_OPENAI_API_KEY") {
            self.cleanup.api_key = Some(key);
        }
        if let Some(model) = non_empty("ENRICHER_CLEANUP_MODEL") {
            self.cleanup.model = model;
        }
        if let Some(base_url) = non_empty("ENRICHER_CLEANUP_BASE_URL") {
            self.cleanup.base_url = base_url;
        }
        if let Some(agent) = non_empty("ENRICHER_USER_AGENT") {
            self.fetch.user_agent = Some(agent);
        }
        if let Some(path) = non_empty("ENRICHER_CHROME_PATH") {
            self.browser.executable = Some(PathBuf::from(path));
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.thresholds.max_batch_size == 0 {
            return Err(ConfigError::Invalid("max_batch_size must be positive".into()));
        }
        if self.timing.throttle_min_ms > self.timing.throttle_max_ms {
            return Err(ConfigError::Invalid(format!(
                "throttle window is inverted ({}ms > {}ms)",
                self.timing.throttle_min_ms, self.timing.throttle_max_ms
            )));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(ConfigError::Invalid("fetch timeout must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let settings =
            EnrichmentSettings::from_json_str(r#"{"timing": {"fast_path_delay_ms": 10}}"#).unwrap();

        assert_eq!(settings.timing.fast_path_delay(), Duration::from_millis(10));
        assert_eq!(settings.timing.throttle_max_ms, 8_000);
        assert_eq!(settings.fetch.timeout(), Duration::from_secs(15));
        assert_eq!(settings.thresholds.max_batch_size, 10);
    }

    #[test]
    fn rejects_inverted_window() {
        let err = EnrichmentSettings::from_json_str(
            r#"{"timing": {"throttle_min_ms": 9000, "throttle_max_ms": 1000}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn overrides_apply_non_empty_values() {
        let settings = EnrichmentSettings::default().with_overrides_from(|key| match key {
            "ENRICHER_OPENAI_API_KEY" => Some("sk-test".into()),
            "ENRICHER_USER_AGENT" => Some("   ".into()),
            _ => None,
        });

        assert_eq!(settings.cleanup.api_key.as_deref(), Some("sk-test"));
        assert!(settings.fetch.user_agent.is_none());
        assert!(!format!("{:?}", settings.cleanup).contains("sk-test"));
    }
}
