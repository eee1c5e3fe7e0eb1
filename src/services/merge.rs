//! Deterministic merge of a freshly scraped schema with the persisted one.
//!
//! Merge is a pure transform over two immutable schema values. Neither input
//! is mutated in place; the caller replaces the persisted artifact with the
//! returned value.

use chrono::{DateTime, Utc};

use crate::models::FormSchema;

/// Combine `fresh` scrape results with the `existing` persisted schema.
///
/// Steps are unioned by step number, fields within a matched step by
/// canonical name. A field present in both is wholesale-replaced by the
/// fresh field while keeping its position in the existing sequence; fields
/// and steps present only on one side are retained (existing) or appended
/// (fresh). Title, validation rules, and metadata come from `fresh`, except
/// `lastUpdated` which is stamped with `merged_at`.
///
/// With no existing schema, `fresh` is returned unchanged.
pub fn merge_schemas(
    existing: Option<FormSchema>,
    fresh: FormSchema,
    merged_at: DateTime<Utc>,
) -> FormSchema {
    let Some(existing) = existing else {
        return fresh;
    };

    let mut steps = existing.steps;
    for fresh_step in fresh.steps {
        match steps
            .iter_mut()
            .find(|s| s.step_number == fresh_step.step_number)
        {
            Some(step) => {
                step.title = fresh_step.title;
                for fresh_field in fresh_step.fields {
                    match step.fields.iter_mut().find(|f| f.name == fresh_field.name) {
                        Some(slot) => *slot = fresh_field,
                        None => step.fields.push(fresh_field),
                    }
                }
            }
            None => steps.push(fresh_step),
        }
    }

    let mut metadata = fresh.metadata;
    metadata.last_updated = Some(merged_at);

    FormSchema {
        title: fresh.title,
        steps,
        validation_rules: fresh.validation_rules,
        metadata,
    }
}
