// src/lib.rs

//! Sydney events aggregator library.
//!
//! Fetches event listings from several sites, normalizes them into
//! [`models::Event`] records, assigns each a category, removes duplicates and
//! serves the result through [`api::EventsApi`] with a time-bounded cache.

pub mod api;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
