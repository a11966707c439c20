// src/pipeline/aggregate.rs

//! Aggregation pass.
//!
//! Fetches every category page of every source, extracts events, classifies
//! them, deduplicates per category and builds the response envelope.
//! Failures are contained at the narrowest level: a bad item is skipped, a
//! bad URL is skipped, a source whose session cannot be opened is skipped.
//! Only a pass that produces nothing while something failed is reported as a
//! failure envelope.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::Utc;

use crate::error::{AppError, Result};
use crate::models::{ApiInfo, CategoryGroups, Config, Envelope, Event, Source, SourceConfig, empty_groups};
use crate::services::{Browser, Categorizer, FieldExtractor, PageSession, SessionGuard, dedup};

/// Raw result of fetching and extracting every configured page.
#[derive(Debug, Default)]
pub struct CollectOutcome {
    pub events: Vec<Event>,
    pub url_total: usize,
    pub url_failures: usize,
    /// Sources skipped entirely, with the reason
    pub source_failures: Vec<(Source, String)>,
}

impl CollectOutcome {
    fn has_failures(&self) -> bool {
        self.url_failures > 0 || !self.source_failures.is_empty()
    }

    fn failure_summary(&self) -> String {
        let mut parts: Vec<String> = self
            .source_failures
            .iter()
            .map(|(source, reason)| format!("{}: {reason}", source.id()))
            .collect();
        if self.url_failures > 0 {
            parts.push(format!(
                "{} of {} page fetches failed",
                self.url_failures, self.url_total
            ));
        }
        parts.join("; ")
    }
}

/// Orchestrates one aggregation pass.
pub struct Aggregator {
    config: Arc<Config>,
    categorizer: Categorizer,
}

impl Aggregator {
    /// Create an aggregator with the given configuration.
    pub fn new(config: Arc<Config>) -> Self {
        let categorizer = Categorizer::new(&config.categorizer);
        Self {
            config,
            categorizer,
        }
    }

    /// Run a full pass. Never fails: errors become a failure envelope.
    pub fn run<B: Browser>(&self, browser: &B) -> Envelope {
        match self.try_run(browser) {
            Ok(envelope) => envelope,
            Err(e) => {
                log::error!("Aggregation pass failed: {e}");
                Envelope::failure(e.to_string())
            }
        }
    }

    fn try_run<B: Browser>(&self, browser: &B) -> Result<Envelope> {
        if self.config.sources.is_empty() {
            return Err(AppError::aggregation("no sources configured"));
        }

        log::info!("Starting aggregation of {} sources", self.config.sources.len());
        let outcome = self.collect(browser);

        if outcome.events.is_empty() && outcome.has_failures() {
            return Err(AppError::aggregation(format!(
                "no events collected ({})",
                outcome.failure_summary()
            )));
        }
        if outcome.has_failures() {
            log::warn!("Partial aggregation: {}", outcome.failure_summary());
        }

        let groups = self.group(outcome.events);
        let envelope = Envelope::success(self.api_info(), groups, &self.config.source_list());

        if let Some(stats) = &envelope.statistics {
            log::info!(
                "Aggregation complete: {} events in {} categories",
                stats.total_events,
                stats.categories_with_events
            );
            for source in self.config.source_list() {
                log::info!("  {}: {}", source, stats.source_count(source));
            }
        }

        Ok(envelope)
    }

    /// Fetch and extract every configured page, source by source.
    pub fn collect<B: Browser>(&self, browser: &B) -> CollectOutcome {
        let mut outcome = CollectOutcome::default();

        for source_config in &self.config.sources {
            let source = source_config.source;
            match self.collect_source(browser, source_config, &mut outcome) {
                Ok(count) => log::info!("{source} total: {count} events"),
                Err(e) => {
                    log::warn!("Skipping {source}: {e}");
                    outcome.source_failures.push((source, e.to_string()));
                }
            }
        }

        outcome
    }

    /// Fetch one source's category pages through a single scoped session.
    fn collect_source<B: Browser>(
        &self,
        browser: &B,
        source_config: &SourceConfig,
        outcome: &mut CollectOutcome,
    ) -> Result<usize> {
        let source = source_config.source;
        let extractor = FieldExtractor::new(source, source_config.base()?);
        let mut session = SessionGuard::new(browser.open_session(source)?, source);

        let settle = Duration::from_millis(self.config.fetcher.settle_delay_ms);
        let delay = Duration::from_millis(self.config.fetcher.request_delay_ms);
        let mut count = 0;

        for entry in &source_config.categories {
            outcome.url_total += 1;
            log::debug!("Fetching {source} {}: {}", entry.category, entry.url);

            match session.fetch(&entry.url) {
                Ok(html) => {
                    pause(settle);
                    let events = extractor.extract_page(&html, &entry.category);
                    log::debug!("  Found {} events in {}", events.len(), entry.category);
                    count += events.len();
                    outcome.events.extend(events);
                }
                Err(e) => {
                    outcome.url_failures += 1;
                    log::warn!("Failed to fetch {source} {} ({}): {e}", entry.category, entry.url);
                }
            }

            pause(delay);
        }

        Ok(count)
    }

    /// Classify, partition and deduplicate events.
    pub fn group(&self, events: Vec<Event>) -> CategoryGroups {
        let mut groups = empty_groups();
        for event in events {
            let category = self.categorizer.categorize(&event);
            groups.entry(category).or_default().push(event);
        }
        for events in groups.values_mut() {
            *events = dedup(std::mem::take(events));
        }
        groups
    }

    fn api_info(&self) -> ApiInfo {
        ApiInfo {
            name: self.config.api.name.clone(),
            version: self.config.api.version.clone(),
            scraped_at: Utc::now(),
            sources: self
                .config
                .source_list()
                .iter()
                .map(|s| s.display_name().to_string())
                .collect(),
        }
    }
}

fn pause(duration: Duration) {
    if !duration.is_zero() {
        thread::sleep(duration);
    }
}
