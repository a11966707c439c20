// src/models/mod.rs

//! Domain models for the aggregator.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod category;
mod config;
mod envelope;
mod event;

// Re-export all public types
pub use category::Category;
pub use config::{
    ApiConfig, CacheConfig, CategorizerConfig, CategoryRule, CategoryUrl, Config, FetcherConfig,
    OutputConfig, SourceConfig,
};
pub use envelope::{ApiInfo, CategoryGroups, Envelope, Statistics, empty_groups};
pub use event::{Event, Source};
