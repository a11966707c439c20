// src/services/extractor.rs

//! Field extraction service.
//!
//! Turns one listing fragment into an [`Event`] using ordered selector rules
//! that differ per source. Each source is a variant of
//! [`ExtractionStrategy`]; adding a source means adding a variant.

use std::sync::LazyLock;

use chrono::Utc;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::models::{Event, Source};
use crate::services::dedup::event_id;
use crate::services::fields::{self, parse_selectors};

/// Minimum location length (exclusive).
const LOCATION_MIN_LEN: usize = 2;

/// Minimum description length (exclusive).
const DESCRIPTION_MIN_LEN: usize = 20;

/// Compiled selectors and thresholds for one source.
struct SourceRules {
    /// Where listing fragments live on a page
    layout: PageLayout,
    title: Vec<Selector>,
    /// Titles must be longer than this to be accepted by a selector
    title_min_len: usize,
    location: Vec<Selector>,
    description: Vec<Selector>,
}

enum PageLayout {
    /// Items inside the first matching results wrapper
    Wrapped { wrapper: Selector, items: Selector },
    /// Generic container selectors tried in priority order; the first with
    /// any hits is used exclusively, capped at `limit` containers.
    Scan {
        candidates: Vec<Selector>,
        limit: usize,
        /// Accepted titles must be longer than this
        page_title_min_len: usize,
    },
}

fn compile(list: &[&str]) -> Vec<Selector> {
    parse_selectors(list).expect("valid built-in selectors")
}

static SYDNEY_COM_RULES: LazyLock<SourceRules> = LazyLock::new(|| SourceRules {
    layout: PageLayout::Wrapped {
        wrapper: compile(&["div.product-list__results-wrapper"]).remove(0),
        items: compile(&[r#"div[itemprop="Event"], div[data-type="Event"]"#]).remove(0),
    },
    title: compile(&["h3.title__product-list-title-heading", "h3"]),
    title_min_len: 0,
    location: compile(&["span.title__area-name"]),
    description: compile(&[r#"div[itemprop="description"]"#]),
});

static VISIT_NSW_RULES: LazyLock<SourceRules> = LazyLock::new(|| SourceRules {
    layout: PageLayout::Scan {
        candidates: compile(&[
            r#"div[class*="event"]"#,
            r#"div[class*="listing"]"#,
            r#"div[class*="card"]"#,
            "article",
            ".event-item",
            ".listing-item",
            ".product-item",
        ]),
        limit: 15,
        page_title_min_len: 5,
    },
    title: compile(&["h1", "h2", "h3", "h4", ".title", r#"[class*="title"]"#]),
    title_min_len: 3,
    location: compile(&[".location", r#"[class*="location"]"#, r#"[class*="venue"]"#]),
    description: compile(&[".description", r#"[class*="description"]"#, "p"]),
});

/// Per-source extraction strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStrategy {
    /// Structured product-list markup
    SydneyCom,
    /// Loosely structured card markup, scanned heuristically
    VisitNsw,
}

impl ExtractionStrategy {
    pub fn for_source(source: Source) -> Self {
        match source {
            Source::SydneyCom => Self::SydneyCom,
            Source::VisitNsw => Self::VisitNsw,
        }
    }

    pub fn source(&self) -> Source {
        match self {
            Self::SydneyCom => Source::SydneyCom,
            Self::VisitNsw => Source::VisitNsw,
        }
    }

    fn rules(&self) -> &'static SourceRules {
        match self {
            Self::SydneyCom => &SYDNEY_COM_RULES,
            Self::VisitNsw => &VISIT_NSW_RULES,
        }
    }
}

/// Extracts events from one source's pages.
pub struct FieldExtractor {
    strategy: ExtractionStrategy,
    base_url: Url,
}

impl FieldExtractor {
    /// Create an extractor for a source, resolving links against `base_url`.
    pub fn new(source: Source, base_url: Url) -> Self {
        Self {
            strategy: ExtractionStrategy::for_source(source),
            base_url,
        }
    }

    /// Extract every event on a page, tagging each with `hint`.
    pub fn extract_page(&self, html: &str, hint: &str) -> Vec<Event> {
        let document = Html::parse_document(html);

        match &self.strategy.rules().layout {
            PageLayout::Wrapped { wrapper, items } => {
                let Some(wrapper) = document.select(wrapper).next() else {
                    log::debug!("{}: no results wrapper on '{hint}' page", self.source());
                    return Vec::new();
                };
                wrapper
                    .select(items)
                    .filter_map(|item| self.extract(&item, hint))
                    .collect()
            }
            PageLayout::Scan {
                candidates,
                limit,
                page_title_min_len,
            } => {
                let Some(containers) = candidates
                    .iter()
                    .map(|selector| document.select(selector).take(*limit).collect::<Vec<_>>())
                    .find(|hits| !hits.is_empty())
                else {
                    log::debug!("{}: no listing containers on '{hint}' page", self.source());
                    return Vec::new();
                };
                containers
                    .iter()
                    .filter_map(|item| self.extract(item, hint))
                    .filter(|event| event.title.chars().count() > *page_title_min_len)
                    .collect()
            }
        }
    }

    /// Extract one event from a listing fragment.
    ///
    /// Returns `None` when the fragment has no usable title.
    pub fn extract(&self, item: &ElementRef<'_>, hint: &str) -> Option<Event> {
        let rules = self.strategy.rules();
        let source = self.source();

        let title = fields::first_text(item, &rules.title, rules.title_min_len)?;
        let ticket_link = fields::first_link(item, &self.base_url);
        let location = fields::first_text(item, &rules.location, LOCATION_MIN_LEN)
            .unwrap_or_else(|| source.location_fallback().to_string());
        let description = fields::first_text(item, &rules.description, DESCRIPTION_MIN_LEN)
            .map(|text| fields::truncate_description(&text));
        let (image_url, image_alt) = match fields::primary_image(item, &self.base_url) {
            Some((url, alt)) => (Some(url), Some(alt)),
            None => (None, None),
        };

        let text = fields::inner_text(item);
        let id = event_id(&title, &location, ticket_link.as_deref().unwrap_or(""));

        Some(Event {
            title,
            location,
            description,
            date_time: fields::extract_date(&text),
            price: fields::extract_price(&text),
            image_url,
            image_alt,
            ticket_link,
            source,
            source_category: hint.to_string(),
            event_id: id,
            scraped_at: Utc::now(),
        })
    }

    fn source(&self) -> Source {
        self.strategy.source()
    }
}
