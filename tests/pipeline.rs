//! Browserless end-to-end checks: a harvested element snapshot walked into
//! a schema, merged with a persisted one, written, and read back.

use chrono::Utc;

use udyamscrape::models::{FieldType, FormSchema, SchemaMetadata};
use udyamscrape::scrapers::dom::RawElement;
use udyamscrape::scrapers::walker;
use udyamscrape::services::{fallback, merge, persist};

/// Snapshot shaped like the harvest script's output for a two-step form.
fn harvested_elements() -> Vec<Option<RawElement>> {
    let json = r#"[
        {
            "tag": "input",
            "attrs": { "type": "text", "id": "aadhaar1", "maxlength": "12", "required": "" },
            "labels": { "explicit": "Aadhaar Number" }
        },
        {
            "tag": "input",
            "attrs": { "type": "tel", "name": "txtmobile", "placeholder": "Enter 10 digit mobile number" }
        },
        null,
        {
            "tag": "input",
            "attrs": { "type": "text", "name": "txtpan", "maxlength": "10" },
            "labels": { "preceding": "PAN Number" }
        },
        {
            "tag": "select",
            "attrs": { "name": "ddlcategory" },
            "labels": { "preceding": "Social Category" },
            "options": [
                { "value": "", "text": "--Select--" },
                { "value": "general", "text": "General" },
                { "value": "obc", "text": "OBC" }
            ]
        }
    ]"#;
    serde_json::from_str(json).unwrap()
}

fn scraped_schema() -> FormSchema {
    let steps = walker::group_steps(walker::walk(&harvested_elements()));
    let validation_rules = walker::derive_validation_rules(&steps);
    FormSchema {
        title: "Udyam Registration".to_string(),
        steps,
        validation_rules,
        metadata: SchemaMetadata {
            scraped_at: Utc::now(),
            url: "https://udyamregistration.gov.in/UdyamRegistration.aspx".to_string(),
            version: "1.0.0".to_string(),
            fallback_used: None,
            last_updated: None,
        },
    }
}

#[test]
fn walk_builds_both_steps_from_snapshot() {
    let schema = scraped_schema();

    assert_eq!(schema.steps.len(), 2);
    let step1 = schema.step(1).unwrap();
    assert_eq!(
        step1.fields.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(),
        ["aadhaarNumber", "mobileNumber"]
    );
    assert_eq!(step1.title, "Aadhaar Verification");

    let step2 = schema.step(2).unwrap();
    assert_eq!(
        step2.fields.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(),
        ["panNumber", "category"]
    );

    let aadhaar = &step1.fields[0];
    assert!(aadhaar.required);
    assert_eq!(
        aadhaar.validation.as_ref().unwrap().pattern.as_deref(),
        Some("^[0-9]{12}$")
    );

    let category = &step2.fields[1];
    assert_eq!(category.field_type, FieldType::Select);
    // The blank placeholder option is dropped
    assert_eq!(category.options.as_ref().unwrap().len(), 2);

    // Every patterned field surfaced a rule
    assert_eq!(schema.validation_rules.len(), 3);
}

#[test]
fn scrape_merge_persist_reload_round_trips() {
    let dir = tempfile::tempdir().unwrap();

    // First run: nothing persisted yet, fresh schema lands as-is
    let first = merge::merge_schemas(None, scraped_schema(), Utc::now());
    persist::write_schema(dir.path(), &first).unwrap();

    let reloaded = persist::load_existing(dir.path()).unwrap();
    assert_eq!(reloaded, first);

    // Second run: a re-scrape of the same form merges idempotently
    let mut second = scraped_schema();
    second.metadata.scraped_at = first.metadata.scraped_at;
    let merged_at = Utc::now();
    let merged = merge::merge_schemas(Some(reloaded), second.clone(), merged_at);

    assert_eq!(merged.metadata.last_updated, Some(merged_at));
    let mut stripped = merged.clone();
    stripped.metadata.last_updated = None;
    assert_eq!(stripped, second);

    persist::write_schema(dir.path(), &merged).unwrap();
    assert_eq!(persist::load_existing(dir.path()).unwrap(), merged);
}

#[test]
fn fallback_schema_merges_over_persisted_live_scrape() {
    let dir = tempfile::tempdir().unwrap();

    let live = merge::merge_schemas(None, scraped_schema(), Utc::now());
    persist::write_schema(dir.path(), &live).unwrap();

    // A failed run degrades to the bundled fallback, then merges as usual
    let fallback_schema = fallback::load(None).unwrap();
    assert_eq!(fallback_schema.metadata.fallback_used, Some(true));

    let existing = persist::load_existing(dir.path());
    let merged = merge::merge_schemas(existing, fallback_schema, Utc::now());
    persist::write_schema(dir.path(), &merged).unwrap();

    let reloaded = persist::load_existing(dir.path()).unwrap();
    assert_eq!(reloaded.metadata.fallback_used, Some(true));
    // Live-scraped fields absent from the fallback survive the merge
    assert!(reloaded
        .step(2)
        .unwrap()
        .fields
        .iter()
        .any(|f| f.name == "category"));
}
