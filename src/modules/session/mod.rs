//! Authenticated session cookies.
//!
//! The pipeline never logs in on its own; a host supplies a cookie set through
//! [`SessionProvider`] and the pipeline only reads it.

use std::fmt;

use async_trait::async_trait;

/// A single session cookie. The value is redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    pub domain: Option<String>,
    pub path: Option<String>,
}

impl SessionCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: None,
            path: None,
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl fmt::Debug for SessionCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCookie")
            .field("name", &self.name)
            .field("value", &"<redacted>")
            .field("domain", &self.domain)
            .field("path", &self.path)
            .finish()
    }
}

/// Cookies sent with every fetch and installed into the browser surface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieSet {
    cookies: Vec<SessionCookie>,
}

impl CookieSet {
    pub fn new(cookies: Vec<SessionCookie>) -> Self {
        Self { cookies }
    }

    /// Parse a raw `Cookie` header (`a=1; b=2`).
    pub fn from_header(raw: &str) -> Self {
        let cookies = raw
            .split(';')
            .filter_map(|pair| {
                let (name, value) = pair.split_once('=')?;
                let name = name.trim();
                (!name.is_empty()).then(|| SessionCookie::new(name, value.trim()))
            })
            .collect();
        Self { cookies }
    }

    pub fn push(&mut self, cookie: SessionCookie) {
        self.cookies.push(cookie);
    }

    pub fn iter(&self) -> impl Iterator<Item = &SessionCookie> {
        self.cookies.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    /// Value for the `Cookie` request header, or `None` when empty.
    pub fn header_value(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|cookie| format!("{}={}", cookie.name, cookie.value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// Source of the authenticated cookie set. `None` means no session exists.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn cookies(&self) -> Option<CookieSet>;
}

/// Provider returning a fixed cookie set.
#[derive(Debug, Clone, Default)]
pub struct StaticSessionProvider {
    cookies: Option<CookieSet>,
}

impl StaticSessionProvider {
    pub fn new(cookies: CookieSet) -> Self {
        Self {
            cookies: Some(cookies),
        }
    }

    pub fn empty() -> Self {
        Self { cookies: None }
    }
}

#[async_trait]
impl SessionProvider for StaticSessionProvider {
    async fn cookies(&self) -> Option<CookieSet> {
        self.cookies.clone().filter(|set| !set.is_empty())
    }
}
