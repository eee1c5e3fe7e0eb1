//! Data models for the scraped form schema.

mod schema;

pub use schema::{
    FieldDescriptor, FieldOption, FieldType, FieldValidation, FormSchema, SchemaMetadata,
    StepGroup, ValidationRule,
};
