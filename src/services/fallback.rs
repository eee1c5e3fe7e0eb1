//! Last-known-good schema used when live scraping is impossible.

use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;
use tracing::info;

use crate::models::FormSchema;

/// Schema document bundled into the binary at build time.
const BUNDLED_SCHEMA: &str = include_str!("../../fallback-schema.json");

/// Errors loading the fallback schema. These are fatal for the run; there
/// is no second fallback.
#[derive(Debug, Error)]
pub enum FallbackError {
    #[error("failed to read fallback schema from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("fallback schema is not a valid form schema: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Load the fallback schema, stamped as a fallback result.
///
/// Reads the bundled document, or `override_path` when the operator has
/// configured one. `scrapedAt` is set to now and `fallbackUsed` to true so
/// downstream consumers can tell this apart from a live scrape.
pub fn load(override_path: Option<&Path>) -> Result<FormSchema, FallbackError> {
    let raw = match override_path {
        Some(path) => {
            info!("Loading fallback schema from {}", path.display());
            std::fs::read_to_string(path).map_err(|source| FallbackError::Read {
                path: path.to_path_buf(),
                source,
            })?
        }
        None => {
            info!("Loading bundled fallback schema");
            BUNDLED_SCHEMA.to_string()
        }
    };

    let mut schema: FormSchema = serde_json::from_str(&raw)?;
    schema.metadata.scraped_at = Utc::now();
    schema.metadata.fallback_used = Some(true);
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_schema_loads_and_is_stamped() {
        let schema = load(None).unwrap();
        assert_eq!(schema.metadata.fallback_used, Some(true));
        assert!(schema.total_fields() > 0);
        assert!(schema.step(1).is_some());
        assert!(schema.step(2).is_some());
    }

    #[test]
    fn test_bundled_fields_satisfy_invariant() {
        let schema = load(None).unwrap();
        for step in &schema.steps {
            for field in &step.fields {
                assert!(field.is_complete(), "incomplete field {:?}", field.name);
                assert_eq!(field.step, step.step_number);
            }
        }
    }

    #[test]
    fn test_missing_override_is_fatal() {
        let err = load(Some(Path::new("/nonexistent/fallback.json"))).unwrap_err();
        assert!(matches!(err, FallbackError::Read { .. }));
    }

    #[test]
    fn test_corrupt_override_is_fatal() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "{not json").unwrap();
        let err = load(Some(file.path())).unwrap_err();
        assert!(matches!(err, FallbackError::Parse(_)));
    }
}
