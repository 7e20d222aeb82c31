//! Browser-realistic request header profiles.
//!
//! Responsibilities:
//! - Keep a small table of current desktop browser identities.
//! - Pair each user agent with the accept/fetch-metadata headers that browser
//!   actually sends, so header sets stay internally consistent.
//! - Allow a custom user agent while falling back to sensible defaults.

use std::borrow::Cow;
use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::thread_rng;

/// Static description of one browser identity.
#[derive(Debug, Clone, Copy)]
struct BrowserIdentity {
    browser: &'static str,
    platform: &'static str,
    user_agent: &'static str,
    accept: &'static str,
    sec_ch_ua: Option<&'static str>,
}

const CHROMIUM_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7";
const FIREFOX_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";

static IDENTITIES: &[BrowserIdentity] = &[
    BrowserIdentity {
        browser: "chrome",
        platform: "windows",
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36",
        accept: CHROMIUM_ACCEPT,
        sec_ch_ua: Some(r#""Google Chrome";v="129", "Not=A?Brand";v="8", "Chromium";v="129""#),
    },
    BrowserIdentity {
        browser: "chrome",
        platform: "darwin",
        user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36",
        accept: CHROMIUM_ACCEPT,
        sec_ch_ua: Some(r#""Google Chrome";v="129", "Not=A?Brand";v="8", "Chromium";v="129""#),
    },
    BrowserIdentity {
        browser: "edge",
        platform: "windows",
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36 Edg/129.0.0.0",
        accept: CHROMIUM_ACCEPT,
        sec_ch_ua: Some(r#""Microsoft Edge";v="129", "Not=A?Brand";v="8", "Chromium";v="129""#),
    },
    BrowserIdentity {
        browser: "firefox",
        platform: "linux",
        user_agent: "Mozilla/5.0 (X11; Linux x86_64; rv:131.0) Gecko/20100101 Firefox/131.0",
        accept: FIREFOX_ACCEPT,
        sec_ch_ua: None,
    },
    BrowserIdentity {
        browser: "safari",
        platform: "darwin",
        user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.6 Safari/605.1.15",
        accept: "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        sec_ch_ua: None,
    },
];

/// Options to filter/select a profile.
#[derive(Debug, Clone, Default)]
pub struct UserAgentOptions {
    pub custom: Option<String>,
    pub browser: Option<String>,
    pub platform: Option<String>,
}

/// Final selected profile: header name to value.
#[derive(Debug, Clone)]
pub struct UserAgentProfile {
    pub headers: HashMap<String, String>,
}

impl UserAgentProfile {
    pub fn user_agent(&self) -> Option<&str> {
        self.headers.get("User-Agent").map(String::as_str)
    }
}

/// Retrieve a profile using the given options.
pub fn get_user_agent_profile(opts: UserAgentOptions) -> Result<UserAgentProfile, UserAgentError> {
    if let Some(custom) = opts.custom {
        return Ok(custom_profile(custom));
    }

    let candidates: Vec<&BrowserIdentity> = IDENTITIES
        .iter()
        .filter(|identity| {
            opts.browser
                .as_deref()
                .is_none_or(|browser| identity.browser.eq_ignore_ascii_case(browser))
        })
        .filter(|identity| {
            opts.platform
                .as_deref()
                .is_none_or(|platform| identity.platform.eq_ignore_ascii_case(platform))
        })
        .collect();

    let identity = candidates
        .choose(&mut thread_rng())
        .ok_or_else(|| {
            UserAgentError::InvalidOptions(
                format!(
                    "no identity for browser={:?} platform={:?}",
                    opts.browser, opts.platform
                )
                .into(),
            )
        })?;

    Ok(UserAgentProfile {
        headers: identity_headers(identity),
    })
}

fn identity_headers(identity: &BrowserIdentity) -> HashMap<String, String> {
    let mut map = navigation_headers();
    map.insert("User-Agent".into(), identity.user_agent.into());
    map.insert("Accept".into(), identity.accept.into());
    if let Some(brands) = identity.sec_ch_ua {
        map.insert("Sec-Ch-Ua".into(), brands.into());
        map.insert("Sec-Ch-Ua-Mobile".into(), "?0".into());
        let platform = match identity.platform {
            "windows" => "\"Windows\"",
            "darwin" => "\"macOS\"",
            _ => "\"Linux\"",
        };
        map.insert("Sec-Ch-Ua-Platform".into(), platform.into());
    }
    map
}

fn custom_profile(custom: String) -> UserAgentProfile {
    let matched = IDENTITIES
        .iter()
        .find(|identity| identity.user_agent == custom);

    let mut headers = match matched {
        Some(identity) => identity_headers(identity),
        None => {
            let mut map = navigation_headers();
            map.insert("Accept".into(), CHROMIUM_ACCEPT.into());
            map
        }
    };
    headers.insert("User-Agent".into(), custom);
    UserAgentProfile { headers }
}

/// Headers every top-level document navigation carries.
fn navigation_headers() -> HashMap<String, String> {
    let mut map = HashMap::new();
    map.insert("Accept-Language".into(), "en-US,en;q=0.9".into());
    map.insert("Accept-Encoding".into(), "gzip, deflate, br".into());
    map.insert("Upgrade-Insecure-Requests".into(), "1".into());
    map.insert("Sec-Fetch-Dest".into(), "document".into());
    map.insert("Sec-Fetch-Mode".into(), "navigate".into());
    map.insert("Sec-Fetch-Site".into(), "none".into());
    map.insert("Sec-Fetch-User".into(), "?1".into());
    map.insert("Cache-Control".into(), "max-age=0".into());
    map
}

#[derive(Debug, thiserror::Error)]
pub enum UserAgentError {
    #[error("invalid user-agent options: {0}")]
    InvalidOptions(Cow<'static, str>),
}
