// src/services/dedup.rs

//! Event identity and deduplication.

use std::collections::HashSet;

use sha2::{Digest, Sha256};

use crate::models::Event;

/// Length of an event fingerprint in hex characters.
pub const EVENT_ID_LEN: usize = 12;

/// Deterministic fingerprint of an event's identifying fields.
///
/// Fields are separated by a unit separator so that moving text between
/// fields changes the id.
pub fn event_id(title: &str, location: &str, ticket_link: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update(b"\x1f");
    hasher.update(location.as_bytes());
    hasher.update(b"\x1f");
    hasher.update(ticket_link.as_bytes());
    let mut id = hex::encode(hasher.finalize());
    id.truncate(EVENT_ID_LEN);
    id
}

/// Keep the first occurrence of every `event_id`, preserving order.
///
/// Events without an id are dropped.
pub fn dedup(events: Vec<Event>) -> Vec<Event> {
    let mut seen = HashSet::new();
    events
        .into_iter()
        .filter(|event| !event.event_id.is_empty() && seen.insert(event.event_id.clone()))
        .collect()
}
