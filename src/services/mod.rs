//! Schema services: merge, fallback, persistence, and the scrape pipeline.

pub mod fallback;
pub mod merge;
pub mod persist;
pub mod scrape;
