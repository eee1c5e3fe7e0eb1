//! Form schema models.
//!
//! These types are the wire contract with the form-rendering client: they
//! serialize to camelCase JSON and must round-trip losslessly through the
//! persisted schema files.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of form control a field was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Tel,
    Email,
    Date,
    Number,
    Select,
    Radio,
    Checkbox,
    Textarea,
}

impl FieldType {
    /// Map a raw tag name and `type` attribute to a field type.
    ///
    /// Unknown input types collapse to `Text`, matching how browsers render
    /// them.
    pub fn from_raw(tag: &str, type_attr: Option<&str>) -> Self {
        match tag {
            "select" => Self::Select,
            "textarea" => Self::Textarea,
            _ => match type_attr.unwrap_or("text") {
                "tel" => Self::Tel,
                "email" => Self::Email,
                "date" => Self::Date,
                "number" => Self::Number,
                "radio" => Self::Radio,
                "checkbox" => Self::Checkbox,
                _ => Self::Text,
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Tel => "tel",
            Self::Email => "email",
            Self::Date => "date",
            Self::Number => "number",
            Self::Select => "select",
            Self::Radio => "radio",
            Self::Checkbox => "checkbox",
            Self::Textarea => "textarea",
        }
    }
}

/// One choice of a select or radio field, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
    pub value: String,
    pub text: String,
}

/// Validation constraints attached to a field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldValidation {
    /// Regular expression the value must match (as understood by the
    /// rendering client).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FieldValidation {
    pub fn is_empty(&self) -> bool {
        self.pattern.is_none()
            && self.min_length.is_none()
            && self.max_length.is_none()
            && self.message.is_none()
    }
}

/// Canonical metadata for a single form field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    /// Stable internal identifier (e.g. `aadhaarNumber`), independent of the
    /// raw HTML attribute names.
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Human-readable label, whitespace-normalized.
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    pub required: bool,
    /// Registration phase this field belongs to.
    pub step: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<FieldValidation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<FieldOption>>,
}

impl FieldDescriptor {
    /// Whether the descriptor satisfies the presence invariant: `name`,
    /// `label` non-blank and `step` positive. Incomplete descriptors are
    /// discarded, never persisted.
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty() && !self.label.trim().is_empty() && self.step >= 1
    }
}

/// One registration step and its fields, in discovery order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepGroup {
    pub step_number: u32,
    pub title: String,
    pub fields: Vec<FieldDescriptor>,
}

/// A flat validation rule for the rendering client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRule {
    pub field: String,
    pub rule: String,
    pub message: String,
}

/// Provenance of a schema document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaMetadata {
    pub scraped_at: DateTime<Utc>,
    pub url: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_used: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

/// The normalized, versioned description of the registration form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSchema {
    pub title: String,
    pub steps: Vec<StepGroup>,
    pub validation_rules: Vec<ValidationRule>,
    pub metadata: SchemaMetadata,
}

impl FormSchema {
    /// Total number of fields across all steps.
    pub fn total_fields(&self) -> usize {
        self.steps.iter().map(|s| s.fields.len()).sum()
    }

    /// Look up a step group by its number.
    pub fn step(&self, step_number: u32) -> Option<&StepGroup> {
        self.steps.iter().find(|s| s.step_number == step_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schema() -> FormSchema {
        FormSchema {
            title: "Udyam Registration".to_string(),
            steps: vec![StepGroup {
                step_number: 1,
                title: "Aadhaar Verification".to_string(),
                fields: vec![FieldDescriptor {
                    name: "aadhaarNumber".to_string(),
                    field_type: FieldType::Text,
                    label: "Aadhaar Number".to_string(),
                    placeholder: Some("Enter 12 digit Aadhaar".to_string()),
                    required: true,
                    step: 1,
                    validation: Some(FieldValidation {
                        pattern: Some("^[0-9]{12}$".to_string()),
                        min_length: Some(12),
                        max_length: Some(12),
                        message: Some("Aadhaar number must be exactly 12 digits".to_string()),
                    }),
                    options: None,
                }],
            }],
            validation_rules: vec![ValidationRule {
                field: "aadhaarNumber".to_string(),
                rule: "^[0-9]{12}$".to_string(),
                message: "Aadhaar number must be exactly 12 digits".to_string(),
            }],
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
    fn test_field_type_from_raw() {
        assert_eq!(FieldType::from_raw("select", None), FieldType::Select);
        assert_eq!(FieldType::from_raw("textarea", Some("text")), FieldType::Textarea);
        assert_eq!(FieldType::from_raw("input", Some("tel")), FieldType::Tel);
        assert_eq!(FieldType::from_raw("input", Some("radio")), FieldType::Radio);
        assert_eq!(FieldType::from_raw("input", None), FieldType::Text);
        // Unknown input types render as text boxes
        assert_eq!(FieldType::from_raw("input", Some("month")), FieldType::Text);
    }

    #[test]
    fn test_descriptor_completeness() {
        let mut field = sample_schema().steps[0].fields[0].clone();
        assert!(field.is_complete());

        field.label = "   ".to_string();
        assert!(!field.is_complete());

        field.label = "Aadhaar Number".to_string();
        field.step = 0;
        assert!(!field.is_complete());
    }

    #[test]
    fn test_camel_case_wire_shape() {
        let json = serde_json::to_value(sample_schema()).unwrap();
        assert!(json.get("validationRules").is_some());
        assert!(json["metadata"].get("scrapedAt").is_some());
        assert_eq!(json["steps"][0]["stepNumber"], 1);
        assert_eq!(json["steps"][0]["fields"][0]["type"], "text");
        assert_eq!(
            json["steps"][0]["fields"][0]["validation"]["maxLength"],
            12
        );
        // Absent optionals are omitted, not null
        assert!(json["metadata"].get("fallbackUsed").is_none());
        assert!(json["steps"][0]["fields"][0].get("options").is_none());
    }

    #[test]
    fn test_pretty_round_trip() {
        let schema = sample_schema();
        let pretty = serde_json::to_string_pretty(&schema).unwrap();
        let parsed: FormSchema = serde_json::from_str(&pretty).unwrap();
        assert_eq!(parsed, schema);
    }
}
