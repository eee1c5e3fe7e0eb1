//! Form walking: element enumeration, step classification, and assembly of
//! step groups and validation rules.

use tracing::{debug, warn};

use super::dom::RawElement;
use super::extract;
use crate::models::{FieldDescriptor, FieldType, StepGroup, ValidationRule};

/// Canonical fields belonging to the Aadhaar verification step.
const STEP1_FIELDS: &[&str] = &["aadhaarNumber", "mobileNumber", "aadhaarOtp"];

/// Canonical fields belonging to the PAN verification step.
const STEP2_FIELDS: &[&str] = &[
    "panNumber",
    "applicantName",
    "fatherName",
    "dateOfBirth",
    "gender",
    "category",
];

/// Classify a field into a registration step.
///
/// Membership lists first, then label keywords for fields the lists do not
/// know. Anything still unmatched lands in step 1.
pub fn classify_step(canonical_name: &str, label: &str) -> u32 {
    if STEP1_FIELDS.contains(&canonical_name) {
        return 1;
    }
    if STEP2_FIELDS.contains(&canonical_name) {
        return 2;
    }

    let label = label.to_lowercase();
    if label.contains("aadhaar") || label.contains("otp") {
        return 1;
    }
    if label.contains("pan") || label.contains("name") || label.contains("birth") {
        return 2;
    }

    debug!(
        "No step match for field {:?}, defaulting to step 1",
        canonical_name
    );
    1
}

/// Walk every harvested element through the extractor, in discovery order.
///
/// Per-element failures are logged and skipped; one bad element never
/// aborts the walk. Radio inputs sharing a canonical name are collapsed
/// into a single field afterwards.
pub fn walk(elements: &[Option<RawElement>]) -> Vec<FieldDescriptor> {
    let mut fields = Vec::new();

    for (index, element) in elements.iter().enumerate() {
        let Some(element) = element else {
            warn!("Skipping element {}: page-side snapshot failed", index);
            continue;
        };
        match extract::extract(element) {
            Some(field) => fields.push(field),
            None => debug!(
                "Skipping element {} (<{}>): no usable descriptor",
                index, element.tag
            ),
        }
    }

    let grouped = group_radio_fields(fields);
    debug!("Extracted {} form fields", grouped.len());
    grouped
}

/// Collapse radio inputs with the same canonical name into one field whose
/// options accumulate in discovery order.
fn group_radio_fields(fields: Vec<FieldDescriptor>) -> Vec<FieldDescriptor> {
    let mut out: Vec<FieldDescriptor> = Vec::new();

    for field in fields {
        if field.field_type == FieldType::Radio {
            if let Some(group) = out
                .iter_mut()
                .find(|g| g.field_type == FieldType::Radio && g.name == field.name)
            {
                let options = group.options.get_or_insert_with(Vec::new);
                for option in field.options.into_iter().flatten() {
                    if !options.iter().any(|o| o.value == option.value) {
                        options.push(option);
                    }
                }
                group.required = group.required || field.required;
                continue;
            }
        }
        out.push(field);
    }

    out
}

/// Group fields into step groups, producing groups only for steps that
/// have at least one field. Field order within a group is discovery order.
pub fn group_steps(fields: Vec<FieldDescriptor>) -> Vec<StepGroup> {
    let mut groups: Vec<StepGroup> = Vec::new();

    for field in fields {
        match groups.iter_mut().find(|g| g.step_number == field.step) {
            Some(group) => group.fields.push(field),
            None => groups.push(StepGroup {
                step_number: field.step,
                title: step_title(field.step),
                fields: vec![field],
            }),
        }
    }

    groups.sort_by_key(|g| g.step_number);
    groups
}

/// Display title for a registration step.
pub fn step_title(step: u32) -> String {
    match step {
        1 => "Aadhaar Verification".to_string(),
        2 => "PAN Verification".to_string(),
        n => format!("Step {}", n),
    }
}

/// Flatten every field carrying a pattern into a validation rule for the
/// rendering client.
pub fn derive_validation_rules(steps: &[StepGroup]) -> Vec<ValidationRule> {
    steps
        .iter()
        .flat_map(|group| group.fields.iter())
        .filter_map(|field| {
            let validation = field.validation.as_ref()?;
            let pattern = validation.pattern.as_ref()?;
            Some(ValidationRule {
                field: field.name.clone(),
                rule: pattern.clone(),
                message: validation
                    .message
                    .clone()
                    .unwrap_or_else(|| format!("Invalid {}", field.label)),
            })
        })
        .collect()
}
