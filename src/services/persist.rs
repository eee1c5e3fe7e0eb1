//! Schema persistence: pretty and compact serializations of the merged
//! schema, written atomically so consumers never observe a partial file.

use std::io::Write;
use std::path::Path;

use anyhow::Context;
use tracing::{info, warn};

use crate::models::FormSchema;

/// Pretty-printed schema consumed by the rendering client.
pub const SCHEMA_FILENAME: &str = "udyam-form-schema.json";
/// Compact serialization of the same data.
pub const SCHEMA_MIN_FILENAME: &str = "udyam-form-schema.min.json";

/// Load the currently persisted schema, if any.
///
/// A missing file yields `None`. A corrupt file is logged and also yields
/// `None` rather than aborting the scrape; the next successful write
/// replaces it.
pub fn load_existing(output_dir: &Path) -> Option<FormSchema> {
    let path = output_dir.join(SCHEMA_FILENAME);
    if !path.exists() {
        return None;
    }

    match std::fs::read_to_string(&path)
        .map_err(anyhow::Error::from)
        .and_then(|raw| serde_json::from_str(&raw).map_err(anyhow::Error::from))
    {
        Ok(schema) => Some(schema),
        Err(e) => {
            warn!(
                "Could not load existing schema from {}: {}",
                path.display(),
                e
            );
            None
        }
    }
}

/// Write both schema serializations to the output directory.
///
/// Each file is written to a temp path in the same directory and renamed
/// into place. Any failure here is fatal for the run.
pub fn write_schema(output_dir: &Path, schema: &FormSchema) -> anyhow::Result<()> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output directory {}", output_dir.display()))?;

    let pretty = serde_json::to_string_pretty(schema).context("failed to serialize schema")?;
    let compact = serde_json::to_string(schema).context("failed to serialize schema")?;

    write_atomic(&output_dir.join(SCHEMA_FILENAME), pretty.as_bytes())?;
    write_atomic(&output_dir.join(SCHEMA_MIN_FILENAME), compact.as_bytes())?;

    info!(
        "Saved schema to {} ({} steps, {} fields)",
        output_dir.join(SCHEMA_FILENAME).display(),
        schema.steps.len(),
        schema.total_fields()
    );
    Ok(())
}

fn write_atomic(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temp file in {}", dir.display()))?;
    tmp.write_all(bytes)
        .with_context(|| format!("failed to write {}", path.display()))?;
    tmp.persist(path)
        .with_context(|| format!("failed to replace {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FormSchema, SchemaMetadata};

    fn minimal_schema() -> FormSchema {
        FormSchema {
            title: "Udyam Registration".to_string(),
            steps: vec![],
            validation_rules: vec![],
            metadata: SchemaMetadata {
                scraped_at: "2025-01-15T10:30:00Z".parse().unwrap(),
                url: "https://udyamregistration.gov.in/UdyamRegistration.aspx".to_string(),
                version: "1.0.0".to_string(),
                fallback_used: None,
                last_updated: None,
            },
        }
    }

    #[test]
    fn test_write_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let schema = minimal_schema();
        write_schema(dir.path(), &schema).unwrap();

        let loaded = load_existing(dir.path()).unwrap();
        assert_eq!(loaded, schema);
    }

    #[test]
    fn test_both_serializations_written() {
        let dir = tempfile::tempdir().unwrap();
        write_schema(dir.path(), &minimal_schema()).unwrap();

        let pretty = std::fs::read_to_string(dir.path().join(SCHEMA_FILENAME)).unwrap();
        let compact = std::fs::read_to_string(dir.path().join(SCHEMA_MIN_FILENAME)).unwrap();
        assert!(pretty.contains('\n'));
        assert!(!compact.contains('\n'));

        let a: FormSchema = serde_json::from_str(&pretty).unwrap();
        let b: FormSchema = serde_json::from_str(&compact).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_missing_file_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_existing(dir.path()).is_none());
    }

    #[test]
    fn test_corrupt_file_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SCHEMA_FILENAME), "{broken").unwrap();
        assert!(load_existing(dir.path()).is_none());
    }
}
