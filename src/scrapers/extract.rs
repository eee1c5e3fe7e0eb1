//! Field extraction: one DOM element snapshot in, one canonical
//! [`FieldDescriptor`] out.
//!
//! Label discovery, canonical naming, and validation inference are all
//! table-driven so precedence stays visible and each strategy can be
//! tested in isolation.

use regex::Regex;
use tracing::debug;

use super::dom::{QueryableElement, RawOption};
use super::walker;
use crate::models::{FieldDescriptor, FieldOption, FieldType, FieldValidation};

/// Ordered keyword table resolving raw attribute text to canonical field
/// names. First matching entry wins, so earlier rows take precedence when
/// an element mentions several keywords.
const NAME_KEYWORDS: &[(&[&str], &str)] = &[
    (&["aadhaar", "aadhar"], "aadhaarNumber"),
    (&["pan"], "panNumber"),
    (&["mobile", "phone"], "mobileNumber"),
    (&["otp"], "aadhaarOtp"),
    (&["father"], "fatherName"),
    (&["applicant", "name"], "applicantName"),
    (&["birth", "dob"], "dateOfBirth"),
    (&["gender"], "gender"),
    (&["category"], "category"),
    (&["email"], "emailId"),
    (&["pin", "postal"], "pinCode"),
    (&["address"], "address"),
    (&["city"], "city"),
    (&["state"], "state"),
    (&["district"], "district"),
];

/// Validation patterns for fields the registration domain knows, applied
/// when the element carries no usable `pattern` attribute.
const INFERRED_PATTERNS: &[(&str, &str, &str)] = &[
    (
        "aadhaarNumber",
        "^[0-9]{12}$",
        "Aadhaar number must be exactly 12 digits",
    ),
    (
        "panNumber",
        "^[A-Z]{5}[0-9]{4}[A-Z]{1}$",
        "PAN must be in format: ABCDE1234F (5 letters, 4 numbers, 1 letter)",
    ),
    (
        "mobileNumber",
        "^[6-9][0-9]{9}$",
        "Mobile number must be 10 digits starting with 6, 7, 8, or 9",
    ),
    (
        "pinCode",
        "^[0-9]{6}$",
        "PIN code must be exactly 6 digits",
    ),
    (
        "emailId",
        "^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\\.[a-zA-Z]{2,}$",
        "Please enter a valid email address",
    ),
];

type LabelLookup = fn(&dyn QueryableElement) -> Option<String>;

/// Label lookup strategies, tried in order; the first non-blank result
/// wins. Explicit `for`-association always beats the heuristics below it.
const LABEL_STRATEGIES: &[(&str, LabelLookup)] = &[
    ("label-for", |el| non_blank(&el.labels().explicit)),
    ("ancestor-label", |el| non_blank(&el.labels().ancestor)),
    ("preceding-label", |el| non_blank(&el.labels().preceding)),
    ("container-text", |el| non_blank(&el.labels().container)),
];

/// Infer a canonical field descriptor from one element snapshot.
///
/// Returns `None` when no descriptor satisfying the presence invariant can
/// be built; the caller logs and moves on.
pub fn extract(el: &dyn QueryableElement) -> Option<FieldDescriptor> {
    let field_type = FieldType::from_raw(el.tag(), el.attr("type"));

    let raw_name = el
        .attr("name")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or_else(|| el.attr("id").map(str::trim).filter(|s| !s.is_empty()))
        .unwrap_or("");

    let placeholder = el
        .attr("placeholder")
        .map(clean_text)
        .filter(|s| !s.is_empty());

    let label = resolve_label(el, placeholder.as_deref(), raw_name);
    let name = canonical_name(raw_name, placeholder.as_deref().unwrap_or(""), &label);
    let step = walker::classify_step(&name, &label);
    let validation = build_validation(el, &name);

    let options = match field_type {
        FieldType::Select => {
            let opts = select_options(el.options());
            (!opts.is_empty()).then_some(opts)
        }
        FieldType::Radio => radio_option(el, &label).map(|opt| vec![opt]),
        _ => None,
    };

    let descriptor = FieldDescriptor {
        name,
        field_type,
        label,
        placeholder,
        required: el.has_attr("required"),
        step,
        validation,
        options,
    };

    if descriptor.is_complete() {
        Some(descriptor)
    } else {
        debug!(
            "Discarding incomplete descriptor from <{}> (name={:?})",
            el.tag(),
            descriptor.name
        );
        None
    }
}

/// Resolve a human-readable label through the strategy chain, falling back
/// to placeholder, then the raw name attribute.
fn resolve_label(el: &dyn QueryableElement, placeholder: Option<&str>, raw_name: &str) -> String {
    for (strategy, lookup) in LABEL_STRATEGIES {
        if let Some(label) = lookup(el) {
            debug!("Resolved label {:?} via {} strategy", label, strategy);
            return label;
        }
    }
    if let Some(placeholder) = placeholder {
        return placeholder.to_string();
    }
    clean_text(raw_name)
}

/// Map raw attribute text to the stable internal field name.
fn canonical_name(raw_name: &str, placeholder: &str, label: &str) -> String {
    let combined = format!("{} {} {}", raw_name, placeholder, label).to_lowercase();

    for (keywords, canonical) in NAME_KEYWORDS {
        if keywords.iter().any(|kw| combined.contains(kw)) {
            return (*canonical).to_string();
        }
    }

    let source = [raw_name, label, placeholder]
        .into_iter()
        .find(|s| !s.trim().is_empty())
        .unwrap_or("");
    synthesize_name(source)
}

/// Generic name for fields outside the keyword table: lower-cased, with
/// non-alphanumerics stripped and whitespace collapsed to underscores.
fn synthesize_name(source: &str) -> String {
    let lower = source.to_lowercase();
    let cleaned: String = lower
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join("_")
}

fn build_validation(el: &dyn QueryableElement, canonical: &str) -> Option<FieldValidation> {
    let min_length = el.attr("minlength").and_then(|v| v.trim().parse().ok());
    let max_length = el.attr("maxlength").and_then(|v| v.trim().parse().ok());
    let (pattern, message) = resolve_pattern(el, canonical);

    let validation = FieldValidation {
        pattern,
        min_length,
        max_length,
        message,
    };
    (!validation.is_empty()).then_some(validation)
}

/// An explicit `pattern` attribute wins when it compiles as a regex;
/// otherwise the canonical name decides.
fn resolve_pattern(el: &dyn QueryableElement, canonical: &str) -> (Option<String>, Option<String>) {
    if let Some(attr) = el.attr("pattern").map(str::trim).filter(|s| !s.is_empty()) {
        match Regex::new(attr) {
            Ok(_) => return (Some(attr.to_string()), inferred_message(canonical)),
            Err(e) => debug!(
                "Ignoring non-compiling pattern attribute {:?} on {}: {}",
                attr, canonical, e
            ),
        }
    }

    match INFERRED_PATTERNS
        .iter()
        .find(|(name, _, _)| *name == canonical)
    {
        Some((_, pattern, message)) => {
            (Some((*pattern).to_string()), Some((*message).to_string()))
        }
        None => (None, None),
    }
}

fn inferred_message(canonical: &str) -> Option<String> {
    INFERRED_PATTERNS
        .iter()
        .find(|(name, _, _)| *name == canonical)
        .map(|(_, _, message)| (*message).to_string())
}

/// Select options, keeping only entries with non-blank value and text, in
/// document order.
fn select_options(raw: &[RawOption]) -> Vec<FieldOption> {
    raw.iter()
        .filter(|opt| !opt.value.trim().is_empty() && !opt.text.trim().is_empty())
        .map(|opt| FieldOption {
            value: opt.value.trim().to_string(),
            text: clean_text(&opt.text),
        })
        .collect()
}

/// A lone radio input contributes one option; the walker groups inputs
/// sharing a canonical name into a single radio field.
fn radio_option(el: &dyn QueryableElement, label: &str) -> Option<FieldOption> {
    let value = el.attr("value").map(str::trim).filter(|v| !v.is_empty())?;
    if label.trim().is_empty() {
        return None;
    }
    Some(FieldOption {
        value: value.to_string(),
        text: label.to_string(),
    })
}

/// Collapse runs of whitespace and trim.
fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn non_blank(text: &str) -> Option<String> {
    let cleaned = clean_text(text);
    (!cleaned.is_empty()).then_some(cleaned)
}
