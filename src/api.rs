// src/api.rs

//! Query surface over the aggregator.
//!
//! Each method corresponds to one endpoint and returns a serializable
//! response body. Routing and transport belong to the embedding HTTP layer;
//! errors returned as [`AppError`] map to a status class through
//! [`AppError::is_client_error`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{Category, Config, Envelope, Event, Statistics};
use crate::pipeline::{Aggregator, CacheStatus, ResultCache};
use crate::services::{Browser, dedup};

/// Parameters of the all-events endpoint.
#[derive(Debug, Clone, Copy)]
pub struct AllEventsQuery {
    /// Accepted for compatibility; every category page is fetched once.
    pub max_pages: Option<u32>,
    /// Serve a fresh cached envelope when available
    pub use_cache: bool,
}

impl Default for AllEventsQuery {
    fn default() -> Self {
        Self {
            max_pages: None,
            use_cache: true,
        }
    }
}

/// Body of the single-category endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_events: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub events: Vec<Event>,
}

impl CategoryResponse {
    fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            category: None,
            total_events: None,
            error: Some(error.into()),
            events: Vec::new(),
        }
    }
}

/// Body of the category list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoriesResponse {
    pub success: bool,
    pub categories: Vec<Category>,
}

/// Body of the search endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchResponse {
    pub success: bool,
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    pub total_results: usize,
    pub events: Vec<Event>,
}

/// Body of the stats endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatsResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<Statistics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_counts: Option<std::collections::BTreeMap<Category, usize>>,
    pub cache: CacheStatus,
}

/// Events API owning the browser, the aggregator and the result cache.
pub struct EventsApi<B: Browser> {
    aggregator: Aggregator,
    browser: B,
    cache: ResultCache,
}

impl<B: Browser> EventsApi<B> {
    pub fn new(config: Arc<Config>, browser: B) -> Self {
        let cache = ResultCache::from_config(&config.cache);
        Self {
            aggregator: Aggregator::new(config),
            browser,
            cache,
        }
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// `GET /events/all`: cached envelope or a fresh pass.
    ///
    /// Only successful envelopes are cached.
    pub fn all_events(&mut self, query: AllEventsQuery) -> Envelope {
        if let Some(pages) = query.max_pages {
            log::debug!("max_pages={pages} requested; category pages are fetched once per pass");
        }

        if query.use_cache {
            if let Some(envelope) = self.cache.get() {
                log::debug!("Serving cached envelope");
                return envelope.clone();
            }
        }

        let envelope = self.aggregator.run(&self.browser);
        if envelope.success {
            self.cache.put(envelope.clone());
        }
        envelope
    }

    /// `POST /events/refresh`: invalidate and force a fresh pass.
    pub fn refresh(&mut self) -> Envelope {
        self.cache.invalidate();
        self.all_events(AllEventsQuery {
            max_pages: None,
            use_cache: false,
        })
    }

    /// `GET /events/category/{name}`.
    pub fn category_events(&mut self, name: &str) -> CategoryResponse {
        let Some(category) = Category::parse(name) else {
            return CategoryResponse::failure(format!("Category {name} not found"));
        };

        let envelope = self.all_events(AllEventsQuery::default());
        if !envelope.success {
            return CategoryResponse::failure(envelope.error.unwrap_or_default());
        }

        let events = envelope.events_in(category).to_vec();
        CategoryResponse {
            success: true,
            category: Some(category),
            total_events: Some(events.len()),
            error: None,
            events,
        }
    }

    /// `GET /events/categories`.
    pub fn categories() -> CategoriesResponse {
        CategoriesResponse {
            success: true,
            categories: Category::ALL.to_vec(),
        }
    }

    /// `GET /events/search?q=&category=`.
    pub fn search(&mut self, query: Option<&str>, category: Option<&str>) -> Result<SearchResponse> {
        let query = query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| AppError::bad_request("missing query parameter 'q'"))?;
        let category = category.map(str::parse::<Category>).transpose()?;

        let envelope = self.all_events(AllEventsQuery::default());
        if !envelope.success {
            return Err(AppError::aggregation(envelope.error.unwrap_or_default()));
        }

        let needle = query.to_lowercase();
        let events: Vec<Event> = match category {
            Some(category) => envelope.events_in(category).to_vec(),
            // A listing fetched from several category pages sits in several groups.
            None => dedup(envelope.category_groups.into_values().flatten().collect()),
        }
        .into_iter()
        .filter(|event| event.matches(&needle))
        .collect();

        Ok(SearchResponse {
            success: true,
            query: query.to_string(),
            category,
            total_results: events.len(),
            events,
        })
    }

    /// `GET /events/stats`.
    pub fn stats(&mut self) -> StatsResponse {
        let envelope = self.all_events(AllEventsQuery::default());
        StatsResponse {
            success: envelope.success,
            error: envelope.error,
            statistics: envelope.statistics,
            category_counts: envelope.category_counts,
            cache: self.cache.status(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Source;
    use crate::models::CategoryUrl;
    use crate::pipeline::aggregate::testing::{
        FakeBrowser, SYDNEY_FOOD_URL, SYDNEY_PAGE, standard_setup,
    };

    fn api() -> EventsApi<FakeBrowser> {
        let (config, browser) = standard_setup();
        EventsApi::new(Arc::new(config), browser)
    }

    #[test]
    fn test_cached_envelope_is_identical() {
        let mut api = api();
        let first = api.all_events(AllEventsQuery::default());
        let second = api.all_events(AllEventsQuery::default());

        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
        assert_eq!(api.browser.opened.get(), 2);
    }

    #[test]
    fn test_bypass_forces_new_pass() {
        let mut api = api();
        let first = api.all_events(AllEventsQuery::default());
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = api.all_events(AllEventsQuery {
            max_pages: Some(2),
            use_cache: false,
        });

        assert_ne!(first.generated_at(), second.generated_at());
        assert_eq!(api.browser.opened.get(), 4);
        assert_eq!(api.cache().get(), Some(&second));
    }

    #[test]
    fn test_refresh_replaces_cache() {
        let mut api = api();
        let first = api.all_events(AllEventsQuery::default());
        std::thread::sleep(std::time::Duration::from_millis(5));
        let refreshed = api.refresh();

        assert!(refreshed.success);
        assert_ne!(first.generated_at(), refreshed.generated_at());
        assert_eq!(api.cache().get(), Some(&refreshed));
    }

    #[test]
    fn test_failed_pass_is_not_cached() {
        let (config, mut browser) = standard_setup();
        browser.broken_sources = Source::ALL.to_vec();
        let mut api = EventsApi::new(Arc::new(config), browser);

        let envelope = api.all_events(AllEventsQuery::default());
        assert!(!envelope.success);
        assert!(api.cache().get().is_none());
        assert!(!api.stats().cache.is_cached);
    }

    #[test]
    fn test_category_events() {
        let mut api = api();
        let response = api.category_events("Festivals");
        assert!(response.success);
        assert_eq!(response.category, Some(Category::Festivals));
        assert_eq!(response.total_events, Some(1));
        assert_eq!(response.events[0].title, "Blue Mountains Winter Festival");
    }

    #[test]
    fn test_unknown_category_is_not_found() {
        let mut api = api();
        let response = api.category_events("nightlife");
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("Category nightlife not found"));
        assert!(response.events.is_empty());
        // No pass is needed to reject an unknown name.
        assert_eq!(api.browser.opened.get(), 0);
    }

    #[test]
    fn test_categories_lists_all_ten() {
        let response = EventsApi::<FakeBrowser>::categories();
        assert_eq!(response.categories.len(), 10);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["categories"][0], "events");
        assert_eq!(json["categories"][9], "general");
    }

    #[test]
    fn test_search_all_categories() {
        let mut api = api();
        let response = api.search(Some("HARBOUR"), None).unwrap();
        assert_eq!(response.total_results, 1);
        assert_eq!(response.events[0].title, "Harbour Cruise");

        let response = api.search(Some("opera"), None).unwrap();
        assert_eq!(response.total_results, 1);
    }

    #[test]
    fn test_search_lists_cross_category_listing_once() {
        let (mut config, mut browser) = standard_setup();
        config.sources[0].categories.push(CategoryUrl {
            category: "food".to_string(),
            url: SYDNEY_FOOD_URL.to_string(),
        });
        browser
            .pages
            .insert(SYDNEY_FOOD_URL.to_string(), SYDNEY_PAGE.to_string());
        let mut api = EventsApi::new(Arc::new(config), browser);

        let envelope = api.all_events(AllEventsQuery::default());
        assert_eq!(envelope.events_in(Category::Events).len(), 1);
        assert_eq!(envelope.events_in(Category::Food).len(), 3);

        let response = api.search(Some("harbour cruise"), None).unwrap();
        assert_eq!(response.total_results, 1);
        assert_eq!(response.events[0].source_category, "events");
    }

    #[test]
    fn test_search_within_category() {
        let mut api = api();
        let response = api.search(Some("festival"), Some("food")).unwrap();
        assert_eq!(response.total_results, 0);
        let response = api.search(Some("festival"), Some("festivals")).unwrap();
        assert_eq!(response.total_results, 1);
    }

    #[test]
    fn test_search_client_errors() {
        let mut api = api();
        let missing = api.search(None, None).unwrap_err();
        assert!(matches!(missing, AppError::BadRequest(_)));
        assert!(api.search(Some("   "), None).unwrap_err().is_client_error());

        let unknown = api.search(Some("jazz"), Some("nightlife")).unwrap_err();
        assert!(matches!(unknown, AppError::NotFound(_)));
    }

    #[test]
    fn test_stats_reports_cache_status() {
        let mut api = api();
        let stats = api.stats();
        assert!(stats.success);
        assert_eq!(stats.statistics.as_ref().unwrap().total_events, 4);
        assert!(stats.cache.is_cached);
        assert!(stats.cache.cache_timestamp.is_some());
        assert_eq!(stats.cache.ttl_secs, 3600);
    }
}
