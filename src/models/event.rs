//! Event and source data structures.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Origin provider of event listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Source {
    #[serde(rename = "Sydney.com", alias = "sydney_com")]
    SydneyCom,
    #[serde(rename = "Visit NSW", alias = "visit_nsw")]
    VisitNsw,
}

impl Source {
    /// Every known source, in aggregation order.
    pub const ALL: [Source; 2] = [Source::SydneyCom, Source::VisitNsw];

    /// Stable snake_case identifier used in config files and statistics keys.
    pub fn id(&self) -> &'static str {
        match self {
            Source::SydneyCom => "sydney_com",
            Source::VisitNsw => "visit_nsw",
        }
    }

    /// Human-readable name, as serialized into events.
    pub fn display_name(&self) -> &'static str {
        match self {
            Source::SydneyCom => "Sydney.com",
            Source::VisitNsw => "Visit NSW",
        }
    }

    /// Key of this source's event count in the statistics block.
    pub fn count_key(&self) -> String {
        format!("{}_count", self.id())
    }

    /// Location assigned when none can be extracted.
    pub fn location_fallback(&self) -> &'static str {
        match self {
            Source::SydneyCom => "Sydney",
            Source::VisitNsw => "NSW, Australia",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One normalized listing drawn from one source page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Event {
    /// Listing title (never empty)
    pub title: String,

    /// Venue or area, or the source's fallback location
    pub location: String,

    /// Short description, truncated with "..." when long
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Matched date text, or the unknown-date sentinel
    pub date_time: String,

    /// Matched price text, or the unknown-price sentinel
    pub price: String,

    /// Absolute image URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// Alt text of the image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_alt: Option<String>,

    /// Absolute URL of the listing's detail or ticket page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_link: Option<String>,

    /// Which origin produced the listing
    pub source: Source,

    /// Category of the URL the listing was fetched from
    pub source_category: String,

    /// Fingerprint of (title, location, ticket_link)
    pub event_id: String,

    /// Extraction time
    pub scraped_at: DateTime<Utc>,
}

impl Event {
    /// Case-insensitive substring match over title, description and location.
    ///
    /// `needle` must already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.location.to_lowercase().contains(needle)
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(needle))
    }
}
