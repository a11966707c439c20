//! Pipeline entry points for aggregation.
//!
//! - `Aggregator`: run one fetch, extract, categorize and dedup pass
//! - `ResultCache`: hold the last envelope for a fixed time-to-live

pub mod aggregate;
pub mod cache;

pub use aggregate::{Aggregator, CollectOutcome};
pub use cache::{CacheEntry, CacheStatus, ResultCache};
