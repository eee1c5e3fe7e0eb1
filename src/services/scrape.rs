//! Top-level scrape pipeline.
//!
//! Init → Navigating → Extracting → Merging → Persisting, with a single
//! fallback attempt when navigation or extraction fails. The browser
//! session is released on every exit path before merge and persist run.

use anyhow::Context;
use chrono::Utc;
use tracing::{info, warn};

use crate::config::Settings;
use crate::models::{FormSchema, SchemaMetadata};
use crate::scrapers::{walker, BrowserSession, PageNavigator, ScrapeError};
use crate::services::{fallback, merge, persist};

/// Title used when the page provides none.
const DEFAULT_TITLE: &str = "Udyam Registration";

/// Outcome of one pipeline run.
pub struct ScrapeSummary {
    pub schema: FormSchema,
    pub fallback_used: bool,
}

/// Run the full pipeline against the configured target.
///
/// A live failure downgrades to the fallback schema; only fallback-load
/// and persistence failures abort the run. With `merge_existing` off, the
/// persisted schema is discarded instead of merged.
pub async fn run(settings: &Settings, merge_existing: bool) -> anyhow::Result<ScrapeSummary> {
    let live = scrape_live(settings).await;
    let fresh = resolve_fresh_schema(live, settings)?;
    let fallback_used = fresh.metadata.fallback_used == Some(true);

    let existing = if merge_existing {
        persist::load_existing(&settings.output_dir)
    } else {
        None
    };
    if existing.is_some() {
        info!("Merging with previously persisted schema");
    }
    let merged = merge::merge_schemas(existing, fresh, Utc::now());

    persist::write_schema(&settings.output_dir, &merged).context("persisting schema failed")?;

    Ok(ScrapeSummary {
        schema: merged,
        fallback_used,
    })
}

/// Acquire a browser session, scrape, and always tear the session down.
async fn scrape_live(settings: &Settings) -> Result<FormSchema, ScrapeError> {
    let session = BrowserSession::acquire(&settings.browser)
        .await
        .map_err(|e| ScrapeError::Session(e.to_string()))?;

    // Teardown must run on success and failure alike, so the fallible part
    // lives in an inner function.
    let result = scrape_live_inner(&session, settings).await;
    session.close().await;
    result
}

async fn scrape_live_inner(
    session: &BrowserSession,
    settings: &Settings,
) -> Result<FormSchema, ScrapeError> {
    let navigator = PageNavigator::new(
        &settings.browser,
        settings.navigation.clone(),
        settings.screenshots_dir.clone(),
    );

    info!("Scraping {}", settings.target_url);
    let page = navigator.open(session, &settings.target_url).await?;
    navigator.capture_screenshot(&page, "udyam-main-page").await;

    if navigator.wait_for_form_elements(&page).await == 0 {
        warn!("Page settled without any form elements");
    }

    let elements = navigator.harvest_form_elements(&page).await?;
    let fields = walker::walk(&elements);
    if fields.is_empty() {
        return Err(ScrapeError::EmptyForm);
    }

    let steps = walker::group_steps(fields);
    let validation_rules = walker::derive_validation_rules(&steps);
    let title = navigator
        .page_title(&page)
        .await
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());

    navigator.capture_screenshot(&page, "udyam-form-fields").await;

    info!(
        "Live scrape extracted {} fields across {} steps",
        steps.iter().map(|s| s.fields.len()).sum::<usize>(),
        steps.len()
    );

    Ok(FormSchema {
        title,
        steps,
        validation_rules,
        metadata: SchemaMetadata {
            scraped_at: Utc::now(),
            url: settings.target_url.clone(),
            version: settings.schema_version.clone(),
            fallback_used: None,
            last_updated: None,
        },
    })
}

/// Downgrade a live-scrape failure to the fallback schema. A fallback that
/// cannot be loaded is fatal; there is no second fallback.
fn resolve_fresh_schema(
    live: Result<FormSchema, ScrapeError>,
    settings: &Settings,
) -> anyhow::Result<FormSchema> {
    match live {
        Ok(schema) => Ok(schema),
        Err(e) => {
            warn!("Live scrape failed, loading fallback schema: {}", e);
            fallback::load(settings.fallback_schema.as_deref())
                .context("fallback schema load failed")
        }
    }
}
