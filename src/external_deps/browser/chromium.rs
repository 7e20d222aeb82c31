//! Chromium-backed render page using chromiumoxide.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as ChromeConfig};
use chromiumoxide::cdp::browser_protocol::network::CookieParam;
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use url::Url;

use crate::config::BrowserConfig;
use crate::extraction::rendered::{ClickTarget, RenderError, RenderPage};
use crate::modules::session::CookieSet;

/// Locate a Chrome/Chromium binary on `PATH` or in the usual install places.
pub fn find_chromium() -> Option<PathBuf> {
    for name in [
        "google-chrome",
        "google-chrome-stable",
        "chromium",
        "chromium-browser",
    ] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    if cfg!(target_os = "macos") {
        let common = PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// A single long-lived tab in a launched Chromium instance.
pub struct ChromiumPage {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

impl ChromiumPage {
    /// Launch Chromium and open a blank tab.
    pub async fn launch(config: &BrowserConfig) -> Result<Self, RenderError> {
        let executable = config
            .executable
            .clone()
            .or_else(find_chromium)
            .ok_or_else(|| RenderError::Unavailable("no Chromium executable found".into()))?;

        let mut builder = ChromeConfig::builder()
            .chrome_executable(executable)
            .window_size(config.window_width, config.window_height)
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions");
        if !config.headless {
            builder = builder.with_head();
        }
        let chrome_config = builder.build().map_err(RenderError::Unavailable)?;

        let (browser, mut handler) = Browser::launch(chrome_config)
            .await
            .map_err(|err| RenderError::Unavailable(format!("failed to launch Chromium: {err}")))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    log::debug!("chromium handler error: {err}");
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|err| RenderError::Unavailable(format!("failed to open tab: {err}")))?;

        Ok(Self {
            browser,
            page,
            handler,
        })
    }

    /// Close the browser and stop its event handler.
    pub async fn shutdown(mut self) {
        if let Err(err) = self.browser.close().await {
            log::warn!("failed to close Chromium cleanly: {err}");
        }
        self.handler.abort();
    }

    async fn install_cookies(&self, url: &Url, cookies: &CookieSet) -> Result<(), RenderError> {
        let params = cookies
            .iter()
            .map(|cookie| {
                let mut builder = CookieParam::builder()
                    .name(cookie.name.clone())
                    .value(cookie.value.clone());
                builder = match &cookie.domain {
                    Some(domain) => builder.domain(domain.clone()),
                    None => builder.url(url.as_str()),
                };
                if let Some(path) = &cookie.path {
                    builder = builder.path(path.clone());
                }
                builder.build().map_err(RenderError::Navigation)
            })
            .collect::<Result<Vec<_>, _>>()?;

        if params.is_empty() {
            return Ok(());
        }
        self.page
            .set_cookies(params)
            .await
            .map_err(|err| RenderError::Navigation(format!("failed to set cookies: {err}")))?;
        Ok(())
    }
}

#[async_trait]
impl RenderPage for ChromiumPage {
    async fn open(
        &mut self,
        url: &Url,
        cookies: &CookieSet,
        timeout: Duration,
    ) -> Result<Url, RenderError> {
        self.install_cookies(url, cookies).await?;

        match tokio::time::timeout(timeout, self.page.goto(url.as_str())).await {
            Ok(Ok(_)) => {}
            Ok(Err(err)) => return Err(RenderError::Navigation(err.to_string())),
            Err(_) => return Err(RenderError::Timeout(timeout)),
        }
        if let Err(err) = self.page.wait_for_navigation().await {
            log::debug!("wait_for_navigation on {url}: {err}");
        }

        let resolved = self
            .page
            .url()
            .await
            .map_err(|err| RenderError::Script(err.to_string()))?
            .and_then(|raw| Url::parse(&raw).ok())
            .unwrap_or_else(|| url.clone());
        log::debug!("rendered {url} -> {resolved}");
        Ok(resolved)
    }

    async fn html(&mut self) -> Result<String, RenderError> {
        self.page
            .content()
            .await
            .map_err(|err| RenderError::Script(err.to_string()))
    }

    async fn click(&mut self, target: &ClickTarget) -> Result<(), RenderError> {
        let elements = self
            .page
            .find_elements(target.selector.as_str())
            .await
            .map_err(|err| RenderError::Script(err.to_string()))?;
        let element = elements
            .get(target.index)
            .ok_or_else(|| RenderError::ElementMissing {
                selector: target.selector.clone(),
                index: target.index,
            })?;
        element
            .click()
            .await
            .map_err(|err| RenderError::Script(err.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn renders_data_url_and_clicks() {
        let mut page = ChromiumPage::launch(&BrowserConfig::default())
            .await
            .expect("failed to launch Chromium");
        let url = Url::parse("data:text/html,<h1>Hello</h1><button>Show more</button>").unwrap();

        page.open(&url, &CookieSet::default(), Duration::from_secs(10))
            .await
            .expect("navigation failed");
        assert!(page.html().await.unwrap().contains("Hello"));
        page.click(&ClickTarget::new("button", 0)).await.unwrap();

        page.shutdown().await;
    }
}
