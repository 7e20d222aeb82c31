//! Reqwest-based implementation of the `PageFetcher` trait.
//!
//! One client is built per fetcher with a browser header profile baked in as
//! default headers; the session cookie is attached per request so the same
//! client can serve several sessions.

use std::time::Duration;

use async_trait::async_trait;
use http::{HeaderMap as HttpHeaderMap, HeaderName as HttpHeaderName, HeaderValue as HttpHeaderValue};
use reqwest::{
    Client,
    header::{COOKIE, HeaderMap, HeaderName, HeaderValue},
    redirect::Policy,
};
use url::Url;

use crate::config::FetchConfig;
use crate::extraction::user_agents::{UserAgentOptions, UserAgentProfile, get_user_agent_profile};
use crate::modules::session::CookieSet;

use super::fetcher::{FetchError, PageFetcher};
use super::types::FetchedPage;

/// Reqwest-backed fetcher following a bounded number of redirects.
#[derive(Debug, Clone)]
pub struct ReqwestPageFetcher {
    client: Client,
    timeout: Duration,
}

impl ReqwestPageFetcher {
    /// Build a fetcher from config, picking a desktop header profile unless a
    /// custom user agent is configured.
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let profile = get_user_agent_profile(UserAgentOptions {
            custom: config.user_agent.clone(),
            ..Default::default()
        })
        .map_err(|err| FetchError::InvalidHeader(err.to_string()))?;

        Self::with_profile(config, &profile)
    }

    pub fn with_profile(config: &FetchConfig, profile: &UserAgentProfile) -> Result<Self, FetchError> {
        let client = Client::builder()
            .redirect(Policy::limited(config.max_redirects))
            .default_headers(profile_headers(profile)?)
            .timeout(config.timeout())
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|err| FetchError::Transport(err.to_string()))?;

        Ok(Self {
            client,
            timeout: config.timeout(),
        })
    }

    /// Wrap an existing reqwest client. Redirect and timeout policy are taken
    /// from the client as configured.
    pub fn from_client(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    fn map_error(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else if err.is_connect() {
            FetchError::Connect(err.to_string())
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl PageFetcher for ReqwestPageFetcher {
    async fn fetch(&self, url: &Url, cookies: &CookieSet) -> Result<FetchedPage, FetchError> {
        let mut request = self.client.get(url.as_str());
        if let Some(cookie) = cookies.header_value() {
            let value = HeaderValue::from_str(&cookie)
                .map_err(|err| FetchError::InvalidHeader(err.to_string()))?;
            request = request.header(COOKIE, value);
        }

        log::debug!("GET {url}");
        let response = request.send().await.map_err(|err| self.map_error(err))?;

        let status = response.status();
        let final_url = response.url().clone();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: final_url.to_string(),
            });
        }

        let headers = convert_back_headers(response.headers());
        let body = response.text().await.map_err(|err| self.map_error(err))?;
        log::debug!(
            "fetched {} ({} bytes, status {})",
            final_url,
            body.len(),
            status.as_u16()
        );

        Ok(FetchedPage {
            requested_url: url.clone(),
            url: final_url,
            status: status.as_u16(),
            headers,
            body,
        })
    }
}

fn profile_headers(profile: &UserAgentProfile) -> Result<HeaderMap, FetchError> {
    let mut map = HeaderMap::new();
    for (name, value) in &profile.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|err| FetchError::InvalidHeader(err.to_string()))?;
        let value =
            HeaderValue::from_str(value).map_err(|err| FetchError::InvalidHeader(err.to_string()))?;
        map.insert(name, value);
    }
    Ok(map)
}

// Response headers that fail to convert are dropped; only the body matters downstream.
fn convert_back_headers(map: &HeaderMap) -> HttpHeaderMap {
    let mut headers = HttpHeaderMap::new();
    for (name, value) in map.iter() {
        if let (Ok(name), Ok(value)) = (
            HttpHeaderName::from_bytes(name.as_str().as_bytes()),
            HttpHeaderValue::from_bytes(value.as_bytes()),
        ) {
            headers.append(name, value);
        }
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::session::SessionCookie;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config() -> FetchConfig {
        FetchConfig {
            timeout_secs: 2,
            max_redirects: 3,
            user_agent: Some("EnricherTest/1.0".into()),
        }
    }

    fn cookies() -> CookieSet {
        CookieSet::new(vec![SessionCookie::new("li_at", "token")])
    }

    #[tokio::test]
    async fn sends_profile_and_cookie_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jobs/view/1"))
            .and(header("user-agent", "EnricherTest/1.0"))
            .and(header("cookie", "li_at=token"))
            .and(header("sec-fetch-mode", "navigate"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<html><head><title>Engineer</title></head></html>"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = ReqwestPageFetcher::new(&config()).unwrap();
        let url = Url::parse(&format!("{}/jobs/view/1", server.uri())).unwrap();
        let page = fetcher.fetch(&url, &cookies()).await.unwrap();

        assert_eq!(page.status, 200);
        assert_eq!(page.title().as_deref(), Some("Engineer"));
        assert!(!page.was_redirected());
    }

    #[tokio::test]
    async fn follows_redirects_to_final_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jobs/view/2"))
            .respond_with(
                ResponseTemplate::new(302).insert_header("location", "/authwall?trk=login"),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/authwall"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<title>Sign In</title>"))
            .mount(&server)
            .await;

        let fetcher = ReqwestPageFetcher::new(&config()).unwrap();
        let url = Url::parse(&format!("{}/jobs/view/2", server.uri())).unwrap();
        let page = fetcher.fetch(&url, &cookies()).await.unwrap();

        assert!(page.was_redirected());
        assert_eq!(page.url.path(), "/authwall");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let fetcher = ReqwestPageFetcher::new(&config()).unwrap();
        let url = Url::parse(&format!("{}/jobs/view/3", server.uri())).unwrap();
        let err = fetcher.fetch(&url, &cookies()).await.unwrap_err();

        assert!(matches!(err, FetchError::Status { status: 429, .. }));
    }

    #[tokio::test]
    async fn slow_responses_time_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let fetcher = ReqwestPageFetcher::new(&FetchConfig {
            timeout_secs: 1,
            ..config()
        })
        .unwrap();
        let url = Url::parse(&format!("{}/jobs/view/4", server.uri())).unwrap();
        let err = fetcher.fetch(&url, &cookies()).await.unwrap_err();

        assert_eq!(err, FetchError::Timeout(Duration::from_secs(1)));
    }
}
