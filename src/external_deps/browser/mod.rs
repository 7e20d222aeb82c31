//! Real browser surfaces for tier-2 rendering.

mod chromium;

pub use chromium::{ChromiumPage, find_chromium};

use crate::config::BrowserConfig;
use crate::extraction::rendered::{RenderError, RenderSurface};

/// Launch Chromium and wrap its tab in a shareable surface.
pub async fn launch_chromium_surface(config: &BrowserConfig) -> Result<RenderSurface, RenderError> {
    let page = ChromiumPage::launch(config).await?;
    Ok(RenderSurface::new(page))
}
