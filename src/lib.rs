//! udyamscrape - Udyam registration form schema scraper.
//!
//! Drives a headless browser against the Udyam registration page, extracts
//! form field metadata, and persists a normalized, versioned schema
//! document used to drive dynamic form rendering. When the live page
//! cannot be read, a bundled last-known-good schema takes its place.

pub mod cli;
pub mod config;
pub mod models;
pub mod scrapers;
pub mod services;
