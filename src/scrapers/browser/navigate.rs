//! Page navigation: retrying loads, readiness waits, and screenshots.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use chromiumoxide::cdp::browser_protocol::page::{CaptureScreenshotFormat, NavigateParams};
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{BrowserEngineConfig, BrowserSession};
use crate::scrapers::dom::RawElement;
use crate::scrapers::ScrapeError;

/// JavaScript to wait for page ready state.
const WAIT_FOR_READY_SCRIPT: &str = r#"
    new Promise((resolve) => {
        if (document.readyState === 'complete' || document.readyState === 'interactive') {
            resolve(document.readyState);
        } else {
            document.addEventListener('DOMContentLoaded', () => resolve(document.readyState));
            setTimeout(() => resolve('timeout'), 10000);
        }
    })
"#;

/// Counts interactive form elements currently in the DOM.
const FORM_ELEMENT_COUNT_SCRIPT: &str =
    "document.querySelectorAll('input, select, textarea').length";

/// Interval between element-presence polls.
const ELEMENT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Navigation retry and wait parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationConfig {
    /// Navigation attempts before escalating to fallback.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed wait between failed attempts, in seconds.
    #[serde(default = "default_backoff_secs")]
    pub backoff_secs: u64,

    /// Wait after a successful load before touching the DOM, in seconds.
    #[serde(default = "default_settle_secs")]
    pub settle_secs: u64,

    /// Upper bound on waiting for form elements to appear, in seconds.
    /// Expiry is non-fatal and yields an empty element set.
    #[serde(default = "default_element_wait_secs")]
    pub element_wait_secs: u64,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_secs: default_backoff_secs(),
            settle_secs: default_settle_secs(),
            element_wait_secs: default_element_wait_secs(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_secs() -> u64 {
    2
}

fn default_settle_secs() -> u64 {
    3
}

fn default_element_wait_secs() -> u64 {
    10
}

/// Drives one page of a [`BrowserSession`] through load, stabilization, and
/// capture.
pub struct PageNavigator {
    nav: NavigationConfig,
    page_timeout: Duration,
    screenshots_dir: PathBuf,
}

impl PageNavigator {
    pub fn new(
        browser: &BrowserEngineConfig,
        nav: NavigationConfig,
        screenshots_dir: PathBuf,
    ) -> Self {
        Self {
            nav,
            page_timeout: Duration::from_secs(browser.timeout),
            screenshots_dir,
        }
    }

    /// Open `url` in a fresh page and wait for it to stabilize.
    ///
    /// Navigation is retried up to the configured attempt budget with a
    /// fixed backoff; exhausting it escalates to the caller, which triggers
    /// fallback.
    pub async fn open(&self, session: &BrowserSession, url: &str) -> Result<Page, ScrapeError> {
        let page = session
            .new_page()
            .await
            .map_err(|e| ScrapeError::Session(e.to_string()))?;

        with_retries(
            self.nav.max_attempts,
            Duration::from_secs(self.nav.backoff_secs),
            |attempt| self.navigate_once(&page, url, attempt),
        )
        .await
        .map_err(|e| ScrapeError::Navigation {
            url: url.to_string(),
            attempts: self.nav.max_attempts,
            message: e.to_string(),
        })?;

        tokio::time::sleep(Duration::from_secs(self.nav.settle_secs)).await;
        Ok(page)
    }

    /// One navigation attempt, bounded by the page timeout.
    async fn navigate_once(&self, page: &Page, url: &str, attempt: u32) -> Result<()> {
        debug!(
            "Navigating to {} (attempt {}/{})",
            url, attempt, self.nav.max_attempts
        );

        let nav_params = NavigateParams::builder()
            .url(url)
            .build()
            .map_err(|e| anyhow::anyhow!("Invalid URL: {}", e))?;

        tokio::time::timeout(self.page_timeout, page.execute(nav_params))
            .await
            .map_err(|_| {
                anyhow::anyhow!(
                    "Navigation timed out after {}s for {}",
                    self.page_timeout.as_secs(),
                    url
                )
            })?
            .map_err(|e| anyhow::anyhow!("Navigation failed for {}: {}", url, e))?;

        self.wait_for_page_ready(page).await;
        Ok(())
    }

    /// Wait for the page to reach a ready state. Best-effort.
    async fn wait_for_page_ready(&self, page: &Page) {
        match tokio::time::timeout(
            self.page_timeout,
            page.evaluate(WAIT_FOR_READY_SCRIPT.to_string()),
        )
        .await
        {
            Ok(Ok(result)) => {
                let state: String = result
                    .into_value()
                    .unwrap_or_else(|_| "unknown".to_string());
                debug!("Page ready state: {}", state);
            }
            Ok(Err(e)) => debug!("Could not check ready state: {}", e),
            Err(_) => warn!("Timeout waiting for page ready state"),
        }
    }

    /// Block until at least one form element exists in the DOM, bounded by
    /// the configured wait. Timing out is non-fatal and returns zero.
    pub async fn wait_for_form_elements(&self, page: &Page) -> usize {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(self.nav.element_wait_secs);

        loop {
            let count = page
                .evaluate(FORM_ELEMENT_COUNT_SCRIPT.to_string())
                .await
                .ok()
                .and_then(|r| r.into_value::<u64>().ok())
                .unwrap_or(0);
            if count > 0 {
                debug!("Found {} form elements", count);
                return count as usize;
            }
            if tokio::time::Instant::now() >= deadline {
                warn!(
                    "No form elements appeared within {}s, continuing with empty set",
                    self.nav.element_wait_secs
                );
                return 0;
            }
            tokio::time::sleep(ELEMENT_POLL_INTERVAL).await;
        }
    }

    /// Snapshot every interactive element currently in the DOM.
    ///
    /// Elements the page-side script could not read come back as `None`;
    /// the walker logs and skips them.
    pub async fn harvest_form_elements(
        &self,
        page: &Page,
    ) -> Result<Vec<Option<RawElement>>, ScrapeError> {
        let result = tokio::time::timeout(
            self.page_timeout,
            page.evaluate(crate::scrapers::dom::HARVEST_SCRIPT.to_string()),
        )
        .await
        .map_err(|_| {
            ScrapeError::Evaluation(format!(
                "element harvest timed out after {}s",
                self.page_timeout.as_secs()
            ))
        })?
        .map_err(|e| ScrapeError::Evaluation(e.to_string()))?;

        result
            .into_value()
            .map_err(|e| ScrapeError::Evaluation(format!("malformed element snapshot: {}", e)))
    }

    /// Read the document title, if any.
    pub async fn page_title(&self, page: &Page) -> Option<String> {
        page.get_title()
            .await
            .ok()
            .flatten()
            .filter(|t| !t.trim().is_empty())
    }

    /// Capture a full-page screenshot under the screenshots directory.
    ///
    /// Purely observational; any failure is logged and swallowed.
    pub async fn capture_screenshot(&self, page: &Page, label: &str) {
        if let Err(e) = self.try_capture_screenshot(page, label).await {
            warn!("Screenshot '{}' failed: {}", label, e);
        }
    }

    async fn try_capture_screenshot(&self, page: &Page, label: &str) -> Result<()> {
        std::fs::create_dir_all(&self.screenshots_dir)?;

        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();
        let png = page.screenshot(params).await?;

        let path = self
            .screenshots_dir
            .join(screenshot_filename(label, Utc::now()));
        std::fs::write(&path, png)?;
        debug!("Saved screenshot to {}", path.display());
        Ok(())
    }
}

/// Timestamped screenshot filename, safe for any filesystem.
fn screenshot_filename(label: &str, taken_at: DateTime<Utc>) -> String {
    let stamp = taken_at
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("{}-{}.png", label, stamp)
}

/// Run `op` up to `max_attempts` times with a fixed backoff between
/// failures, returning the last error once the budget is exhausted.
///
/// The attempt counter and backoff are explicit parameters so retry
/// behavior stays test-visible.
pub(crate) async fn with_retries<T, E, F, Fut>(
    max_attempts: u32,
    backoff: Duration,
    mut op: F,
) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut(u32) -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
{
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= max_attempts => return Err(e),
            Err(e) => {
                warn!(
                    "Attempt {}/{} failed: {}; retrying in {}s",
                    attempt,
                    max_attempts,
                    e,
                    backoff.as_secs()
                );
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[tokio::test(start_paused = true)]
    async fn test_with_retries_exhausts_attempt_budget() {
        let calls = Cell::new(0u32);
        let result: Result<(), String> = with_retries(3, Duration::from_secs(2), |_| {
            calls.set(calls.get() + 1);
            async { Err("no route to host".to_string()) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_retries_stops_on_success() {
        let calls = Cell::new(0u32);
        let result = with_retries(3, Duration::from_secs(2), |attempt| {
            calls.set(calls.get() + 1);
            async move {
                if attempt < 2 {
                    Err("connection reset")
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(2));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_screenshot_filename_has_no_reserved_characters() {
        let taken_at: DateTime<Utc> = "2025-01-15T10:30:45.123Z".parse().unwrap();
        let name = screenshot_filename("udyam-main-page", taken_at);
        assert_eq!(name, "udyam-main-page-2025-01-15T10-30-45-123Z.png");
        assert!(!name[..name.len() - 4].contains([':', '.']));
    }

    #[test]
    fn test_navigation_defaults_match_retry_budget() {
        let nav = NavigationConfig::default();
        assert_eq!(nav.max_attempts, 3);
        assert_eq!(nav.backoff_secs, 2);
        assert_eq!(nav.element_wait_secs, 10);
    }
}
