//! Runtime settings.
//!
//! Defaults live in code; a TOML file can override any subset, and the CLI
//! applies per-flag overrides on top.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::scrapers::{BrowserEngineConfig, NavigationConfig};

/// The registration form this scraper targets.
pub const DEFAULT_TARGET_URL: &str = "https://udyamregistration.gov.in/UdyamRegistration.aspx";

/// Settings for one scraper invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_target_url")]
    pub target_url: String,

    /// Directory receiving the schema output files.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Directory receiving page screenshots.
    #[serde(default = "default_screenshots_dir")]
    pub screenshots_dir: PathBuf,

    /// Version stamped into schema metadata.
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Override for the bundled fallback schema document.
    #[serde(default)]
    pub fallback_schema: Option<PathBuf>,

    #[serde(default)]
    pub browser: BrowserEngineConfig,

    #[serde(default)]
    pub navigation: NavigationConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            target_url: default_target_url(),
            output_dir: default_output_dir(),
            screenshots_dir: default_screenshots_dir(),
            schema_version: default_schema_version(),
            fallback_schema: None,
            browser: BrowserEngineConfig::default(),
            navigation: NavigationConfig::default(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file, or defaults when none is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut settings: Settings = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read settings from {}", path.display()))?;
                toml::from_str(&raw)
                    .with_context(|| format!("invalid settings file {}", path.display()))?
            }
            None => Self::default(),
        };
        settings.expand_paths();
        Ok(settings)
    }

    fn expand_paths(&mut self) {
        self.output_dir = expand_path(&self.output_dir);
        self.screenshots_dir = expand_path(&self.screenshots_dir);
        if let Some(ref path) = self.fallback_schema {
            self.fallback_schema = Some(expand_path(path));
        }
    }
}

fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(raw.as_ref()).into_owned())
}

fn default_target_url() -> String {
    DEFAULT_TARGET_URL.to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_screenshots_dir() -> PathBuf {
    PathBuf::from("screenshots")
}

fn default_schema_version() -> String {
    "1.0.0".to_string()
}
