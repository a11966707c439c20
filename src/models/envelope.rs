//! Response envelope produced by one aggregation pass.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Category, Event, Source};

/// Events grouped by final category, in [`Category`] declaration order.
pub type CategoryGroups = BTreeMap<Category, Vec<Event>>;

/// A group map with every category present and empty.
pub fn empty_groups() -> CategoryGroups {
    Category::ALL.into_iter().map(|c| (c, Vec::new())).collect()
}

/// API metadata attached to every successful envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiInfo {
    pub name: String,
    pub version: String,
    /// Generation timestamp of the envelope
    pub scraped_at: DateTime<Utc>,
    pub sources: Vec<String>,
}

/// Aggregate counts over the deduplicated groups.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Statistics {
    pub total_events: usize,

    /// One `<source>_count` entry per source
    #[serde(flatten)]
    pub source_counts: BTreeMap<String, usize>,

    pub categories_with_events: usize,
}

impl Statistics {
    /// Compute statistics from deduplicated groups.
    pub fn from_groups(groups: &CategoryGroups, sources: &[Source]) -> Self {
        let mut source_counts: BTreeMap<String, usize> =
            sources.iter().map(|s| (s.count_key(), 0)).collect();

        for event in groups.values().flatten() {
            *source_counts.entry(event.source.count_key()).or_insert(0) += 1;
        }

        Self {
            total_events: groups.values().map(Vec::len).sum(),
            source_counts,
            categories_with_events: groups.values().filter(|e| !e.is_empty()).count(),
        }
    }

    pub fn source_count(&self, source: Source) -> usize {
        self.source_counts
            .get(&source.count_key())
            .copied()
            .unwrap_or(0)
    }
}

/// Top-level response of an aggregation pass.
///
/// A failure envelope carries only `success: false`, `error` and an empty
/// `category_groups`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Envelope {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_info: Option<ApiInfo>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<Statistics>,

    /// Counts of non-empty categories only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_counts: Option<BTreeMap<Category, usize>>,

    #[serde(default)]
    pub category_groups: CategoryGroups,
}

impl Envelope {
    /// Build a successful envelope from deduplicated groups.
    pub fn success(api_info: ApiInfo, groups: CategoryGroups, sources: &[Source]) -> Self {
        let statistics = Statistics::from_groups(&groups, sources);
        let category_counts = groups
            .iter()
            .filter(|(_, events)| !events.is_empty())
            .map(|(category, events)| (*category, events.len()))
            .collect();

        Self {
            success: true,
            error: None,
            api_info: Some(api_info),
            statistics: Some(statistics),
            category_counts: Some(category_counts),
            category_groups: groups,
        }
    }

    /// Build a failure envelope carrying an error message.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            api_info: None,
            statistics: None,
            category_counts: None,
            category_groups: CategoryGroups::new(),
        }
    }

    /// Generation timestamp, if this is a successful envelope.
    pub fn generated_at(&self) -> Option<DateTime<Utc>> {
        self.api_info.as_ref().map(|info| info.scraped_at)
    }

    /// Events of one category, empty when the category has none.
    pub fn events_in(&self, category: Category) -> &[Event] {
        self.category_groups
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(title: &str, source: Source) -> Event {
        Event {
            title: title.to_string(),
            location: "Sydney".to_string(),
            description: None,
            date_time: "12 Oct".to_string(),
            price: "free".to_string(),
            image_url: None,
            image_alt: None,
            ticket_link: None,
            source,
            source_category: "events".to_string(),
            event_id: title.to_lowercase(),
            scraped_at: Utc::now(),
        }
    }

    fn api_info() -> ApiInfo {
        ApiInfo {
            name: "Sydney Events API".to_string(),
            version: "1.0.0".to_string(),
            scraped_at: Utc::now(),
            sources: vec!["Sydney.com".to_string(), "Visit NSW".to_string()],
        }
    }

    #[test]
    fn test_success_envelope_statistics() {
        let mut groups = empty_groups();
        groups.insert(
            Category::Food,
            vec![event("Night Noodle Markets", Source::SydneyCom)],
        );
        groups.insert(
            Category::Sport,
            vec![
                event("City2Surf", Source::VisitNsw),
                event("Harbour Regatta", Source::SydneyCom),
            ],
        );

        let envelope = Envelope::success(api_info(), groups, &Source::ALL);
        let stats = envelope.statistics.as_ref().unwrap();
        assert_eq!(stats.total_events, 3);
        assert_eq!(stats.source_count(Source::SydneyCom), 2);
        assert_eq!(stats.source_count(Source::VisitNsw), 1);
        assert_eq!(stats.categories_with_events, 2);

        let counts = envelope.category_counts.as_ref().unwrap();
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[&Category::Sport], 2);
        assert_eq!(envelope.category_groups.len(), Category::ALL.len());
    }

    #[test]
    fn test_statistics_serialize_flat_source_counts() {
        let envelope = Envelope::success(api_info(), empty_groups(), &Source::ALL);
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["statistics"]["sydney_com_count"], 0);
        assert_eq!(json["statistics"]["visit_nsw_count"], 0);
        assert_eq!(json["statistics"]["total_events"], 0);
        assert!(json["category_groups"]["general"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_failure_envelope_omits_statistics() {
        let json = serde_json::to_value(Envelope::failure("no sources reachable")).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "no sources reachable");
        assert!(json.get("statistics").is_none());
        assert!(json.get("api_info").is_none());
        assert!(json["category_groups"].as_object().unwrap().is_empty());
    }
}
