//! Auth-wall detection.
//!
//! Classifies a fetched (or rendered) page as authenticated content, a login
//! interstitial, or ambiguous. Two independent signals are checked: the
//! resolved URL path and the document title. Either one alone is enough to
//! call the page an auth wall.

use std::collections::VecDeque;
use std::fmt;
use std::time::SystemTime;

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use url::Url;

use crate::extraction::core::FetchedPage;

/// Which signal identified the auth wall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthWallSignal {
    /// Resolved URL contains a login/challenge path fragment.
    LoginPath,
    /// Title reads like a sign-in page and names no role.
    SignInTitle,
    /// No session cookies were available at all.
    MissingSession,
}

impl AuthWallSignal {
    pub fn as_str(self) -> &'static str {
        match self {
            AuthWallSignal::LoginPath => "login-path",
            AuthWallSignal::SignInTitle => "sign-in-title",
            AuthWallSignal::MissingSession => "missing-session",
        }
    }
}

impl fmt::Display for AuthWallSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detection output returned to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthWallDetection {
    pub signal: AuthWallSignal,
    pub url: String,
    /// The path fragment or title text that matched.
    pub matched: String,
}

impl AuthWallDetection {
    pub fn reason(&self) -> String {
        format!("{} ({})", self.signal, self.matched)
    }
}

/// Classification of a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStatus {
    Authenticated,
    LoginRedirected(AuthWallDetection),
    /// No title to judge by and no login path; treated as authenticated by
    /// callers, extraction decides the rest.
    Ambiguous,
}

impl AuthStatus {
    pub fn detection(&self) -> Option<&AuthWallDetection> {
        match self {
            AuthStatus::LoginRedirected(detection) => Some(detection),
            _ => None,
        }
    }

    pub fn is_auth_wall(&self) -> bool {
        matches!(self, AuthStatus::LoginRedirected(_))
    }
}

static LOGIN_PATH_RE: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(r"^/(?:uas/login(?:-submit)?|login|authwall|checkpoint|signup|challenge)(?:/|$)")
        .case_insensitive(true)
        .build()
        .expect("invalid login path regex")
});

static SIGN_IN_TITLE_RE: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(r"\b(?:sign[ -]?in|log[ -]?in|sign[ -]?up|join now|security verification|authwall)\b")
        .case_insensitive(true)
        .build()
        .expect("invalid sign-in title regex")
});

static ROLE_KEYWORD_RE: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(
        r"\b(?:engineer|developer|manager|analyst|designer|scientist|specialist|consultant|director|architect|intern|lead|administrator|coordinator|associate|officer|technician|representative|hiring|job|jobs|career|position|role)\b",
    )
    .case_insensitive(true)
    .build()
    .expect("invalid role keyword regex")
});

#[derive(Debug, Clone)]
struct DetectionRecord {
    timestamp: SystemTime,
    signal: AuthWallSignal,
    url: String,
}

/// Public view of a recorded detection.
#[derive(Debug, Clone)]
pub struct DetectionLogEntry {
    pub timestamp: SystemTime,
    pub signal: AuthWallSignal,
    pub url: String,
}

impl From<&DetectionRecord> for DetectionLogEntry {
    fn from(record: &DetectionRecord) -> Self {
        Self {
            timestamp: record.timestamp,
            signal: record.signal,
            url: record.url.clone(),
        }
    }
}

/// URL/title based auth-wall detector with a bounded detection history.
#[derive(Debug)]
pub struct AuthWallDetector {
    history: VecDeque<DetectionRecord>,
    max_history: usize,
}

impl Default for AuthWallDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthWallDetector {
    pub fn new() -> Self {
        Self::with_history_limit(256)
    }

    pub fn with_history_limit(max_history: usize) -> Self {
        Self {
            history: VecDeque::with_capacity(max_history.min(64)),
            max_history: max_history.max(1),
        }
    }

    /// Classify a server-rendered fetch result.
    pub fn inspect(&mut self, page: &FetchedPage) -> AuthStatus {
        self.classify(&page.url, page.title().as_deref())
    }

    /// Classify an arbitrary resolved URL and title, e.g. after a browser
    /// navigation.
    pub fn classify(&mut self, url: &Url, title: Option<&str>) -> AuthStatus {
        let status = classify_signals(url, title);
        if let AuthStatus::LoginRedirected(ref detection) = status {
            log::debug!("auth wall at {}: {}", detection.url, detection.reason());
            self.record(detection.signal, &detection.url);
        }
        status
    }

    /// Auth wall caused by the absence of any session cookies.
    pub fn missing_session(&mut self, url: &Url) -> AuthWallDetection {
        let detection = AuthWallDetection {
            signal: AuthWallSignal::MissingSession,
            url: url.to_string(),
            matched: "no session cookies".into(),
        };
        self.record(detection.signal, &detection.url);
        detection
    }

    fn record(&mut self, signal: AuthWallSignal, url: &str) {
        if self.history.len() == self.max_history {
            self.history.pop_front();
        }
        self.history.push_back(DetectionRecord {
            timestamp: SystemTime::now(),
            signal,
            url: url.to_string(),
        });
    }

    /// Iterate over historical detections (oldest -> newest).
    pub fn detection_history(&self) -> impl Iterator<Item = DetectionLogEntry> + '_ {
        self.history.iter().map(DetectionLogEntry::from)
    }
}

fn classify_signals(url: &Url, title: Option<&str>) -> AuthStatus {
    if let Some(found) = LOGIN_PATH_RE.find(url.path()) {
        return AuthStatus::LoginRedirected(AuthWallDetection {
            signal: AuthWallSignal::LoginPath,
            url: url.to_string(),
            matched: found.as_str().trim_end_matches('/').to_string(),
        });
    }

    let Some(title) = title.map(str::trim).filter(|title| !title.is_empty()) else {
        return AuthStatus::Ambiguous;
    };

    if SIGN_IN_TITLE_RE.is_match(title) && !ROLE_KEYWORD_RE.is_match(title) {
        return AuthStatus::LoginRedirected(AuthWallDetection {
            signal: AuthWallSignal::SignInTitle,
            url: url.to_string(),
            matched: title.to_string(),
        });
    }

    AuthStatus::Authenticated
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderMap;

    struct PageFixture {
        url: &'static str,
        body: String,
    }

    impl PageFixture {
        fn new(url: &'static str, title: &str) -> Self {
            Self {
                url,
                body: format!("<html><head><title>{title}</title></head><body></body></html>"),
            }
        }

        fn page(&self) -> FetchedPage {
            FetchedPage {
                requested_url: Url::parse("https://www.linkedin.com/jobs/view/42").unwrap(),
                url: Url::parse(self.url).unwrap(),
                status: 200,
                headers: HeaderMap::new(),
                body: self.body.clone(),
            }
        }
    }

    #[test]
    fn login_path_is_an_auth_wall() {
        let mut detector = AuthWallDetector::new();
        let fixture = PageFixture::new(
            "https://www.linkedin.com/authwall?trk=gf&sessionRedirect=x",
            "Senior Engineer | Acme",
        );

        let status = detector.inspect(&fixture.page());
        let detection = status.detection().expect("should detect");
        assert_eq!(detection.signal, AuthWallSignal::LoginPath);
        assert_eq!(detection.matched, "/authwall");
        assert_eq!(detector.detection_history().count(), 1);
    }

    #[test]
    fn uas_login_and_checkpoint_are_recognised() {
        let mut detector = AuthWallDetector::new();
        for url in [
            "https://www.linkedin.com/uas/login?session_redirect=1",
            "https://www.linkedin.com/checkpoint/lg/login-submit",
            "https://www.linkedin.com/signup/cold-join",
        ] {
            let fixture = PageFixture::new(url, "LinkedIn");
            assert!(detector.inspect(&fixture.page()).is_auth_wall(), "{url}");
        }
    }

    #[test]
    fn sign_in_title_without_role_is_an_auth_wall() {
        let mut detector = AuthWallDetector::new();
        let fixture = PageFixture::new(
            "https://www.linkedin.com/jobs/view/42",
            "LinkedIn Login, Sign in | LinkedIn",
        );

        let status = detector.inspect(&fixture.page());
        assert_eq!(
            status.detection().map(|detection| detection.signal),
            Some(AuthWallSignal::SignInTitle)
        );
    }

    #[test]
    fn role_titles_mentioning_sign_in_are_content() {
        let mut detector = AuthWallDetector::new();
        let fixture = PageFixture::new(
            "https://www.linkedin.com/jobs/view/42",
            "Login Systems Engineer - Acme | LinkedIn",
        );
        assert_eq!(detector.inspect(&fixture.page()), AuthStatus::Authenticated);
    }

    #[test]
    fn missing_title_is_ambiguous() {
        let mut detector = AuthWallDetector::new();
        let url = Url::parse("https://www.linkedin.com/jobs/view/42").unwrap();
        assert_eq!(detector.classify(&url, None), AuthStatus::Ambiguous);
        assert_eq!(detector.classify(&url, Some("   ")), AuthStatus::Ambiguous);
    }

    #[test]
    fn job_paths_containing_login_words_are_not_flagged() {
        let mut detector = AuthWallDetector::new();
        let url = Url::parse("https://www.linkedin.com/jobs/view/loginradius-engineer-42").unwrap();
        assert_eq!(
            detector.classify(&url, Some("Engineer at LoginRadius")),
            AuthStatus::Authenticated
        );
    }

    #[test]
    fn job_slugs_starting_with_login_words_are_not_flagged() {
        let mut detector = AuthWallDetector::new();
        for (url, title) in [
            (
                "https://www.linkedin.com/jobs/view/challenge-coordinator-at-acme-4012345678",
                "Challenge Coordinator - Acme hiring | LinkedIn",
            ),
            (
                "https://www.linkedin.com/jobs/view/login-security-engineer-at-acme-4012345679",
                "Login Security Engineer - Acme | LinkedIn",
            ),
            (
                "https://www.linkedin.com/jobs/view/signup-flow-designer-4012345680/",
                "Signup Flow Designer | LinkedIn",
            ),
        ] {
            let url = Url::parse(url).unwrap();
            assert_eq!(detector.classify(&url, Some(title)), AuthStatus::Authenticated, "{url}");
        }
        assert_eq!(detector.detection_history().count(), 0);
    }

    #[test]
    fn login_submit_and_nested_checkpoint_paths_match_whole_segments() {
        let mut detector = AuthWallDetector::new();
        let submit = Url::parse("https://www.linkedin.com/uas/login-submit").unwrap();
        let checkpoint = Url::parse("https://www.linkedin.com/checkpoint/challenge/AgF3x").unwrap();

        let detection = detector.classify(&submit, None);
        assert_eq!(detection.detection().map(|d| d.matched.as_str()), Some("/uas/login-submit"));
        let detection = detector.classify(&checkpoint, None);
        assert_eq!(detection.detection().map(|d| d.matched.as_str()), Some("/checkpoint"));
    }

    #[test]
    fn history_is_bounded() {
        let mut detector = AuthWallDetector::with_history_limit(2);
        let url = Url::parse("https://www.linkedin.com/jobs/view/1").unwrap();
        for _ in 0..5 {
            detector.missing_session(&url);
        }
        assert_eq!(detector.detection_history().count(), 2);
    }
}
