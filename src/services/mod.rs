//! Service layer for the aggregator.
//!
//! This module contains the normalization logic for:
//! - Page fetching sessions (`Browser`, `PageSession`)
//! - Field extraction per source (`FieldExtractor`)
//! - Category inference (`Categorizer`)
//! - Identity and deduplication (`event_id`, `dedup`)

mod categorizer;
pub mod dedup;
mod extractor;
pub mod fetcher;
pub mod fields;

pub use categorizer::Categorizer;
pub use dedup::{dedup, event_id};
pub use extractor::{ExtractionStrategy, FieldExtractor};
pub use fetcher::{Browser, HttpBrowser, PageSession, SessionGuard};
