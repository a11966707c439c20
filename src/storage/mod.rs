//! Snapshot persistence.
//!
//! The aggregator keeps results in memory only; this module offers a
//! one-shot dump of an envelope for offline use.

pub mod local;

pub use local::{LocalStorage, snapshot_file_name};
