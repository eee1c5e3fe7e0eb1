//! Live form scraping against the registration site.
//!
//! The browser session and page navigation live in [`browser`]; the DOM is
//! read into plain [`dom`] snapshots so that field extraction and step
//! classification run without any dependency on the automation library.

pub mod browser;
pub mod dom;
pub mod extract;
pub mod walker;

pub use browser::{BrowserEngineConfig, BrowserSession, NavigationConfig, PageNavigator};

use thiserror::Error;

/// Failures that escalate a live scrape to the fallback path.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("browser session could not be acquired: {0}")]
    Session(String),

    #[error("navigation to {url} failed after {attempts} attempts: {message}")]
    Navigation {
        url: String,
        attempts: u32,
        message: String,
    },

    #[error("page evaluation failed: {0}")]
    Evaluation(String),

    #[error("form walk produced no usable fields")]
    EmptyForm,
}
