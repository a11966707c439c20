//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::Source;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Page fetching and politeness settings
    #[serde(default)]
    pub fetcher: FetcherConfig,

    /// Result cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// API metadata
    #[serde(default)]
    pub api: ApiConfig,

    /// Output paths
    #[serde(default)]
    pub output: OutputConfig,

    /// Sources and their category URLs, in aggregation order
    #[serde(default = "defaults::default_sources")]
    pub sources: Vec<SourceConfig>,

    /// Category inference rules
    #[serde(default)]
    pub categorizer: CategorizerConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.fetcher.user_agent.trim().is_empty() {
            return Err(AppError::validation("fetcher.user_agent is empty"));
        }
        if self.fetcher.timeout_secs == 0 {
            return Err(AppError::validation("fetcher.timeout_secs must be > 0"));
        }
        if self.cache.ttl_secs == 0 {
            return Err(AppError::validation("cache.ttl_secs must be > 0"));
        }
        if self.sources.is_empty() {
            return Err(AppError::validation("No sources defined"));
        }
        for source in &self.sources {
            source.validate()?;
        }
        Ok(())
    }

    /// Sources configured for aggregation, in order.
    pub fn source_list(&self) -> Vec<Source> {
        self.sources.iter().map(|s| s.source).collect()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fetcher: FetcherConfig::default(),
            cache: CacheConfig::default(),
            api: ApiConfig::default(),
            output: OutputConfig::default(),
            sources: defaults::default_sources(),
            categorizer: CategorizerConfig::default(),
        }
    }
}

/// Page fetching settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Pause after every fetch in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Pause after a page load before extraction, in milliseconds
    #[serde(default)]
    pub settle_delay_ms: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: defaults::request_delay(),
            settle_delay_ms: 0,
        }
    }
}

/// Result cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Time-to-live of a cached envelope in seconds
    #[serde(default = "defaults::cache_ttl")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: defaults::cache_ttl(),
        }
    }
}

/// Metadata reported in every envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "defaults::api_name")]
    pub name: String,

    #[serde(default = "defaults::api_version")]
    pub version: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            name: defaults::api_name(),
            version: defaults::api_version(),
        }
    }
}

/// Output paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for JSON dumps
    #[serde(default = "defaults::dump_dir")]
    pub dump_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dump_dir: defaults::dump_dir(),
        }
    }
}

/// One origin and the category pages fetched from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub source: Source,

    /// Base URL relative links are resolved against
    pub base_url: String,

    /// Category pages, fetched in order
    #[serde(default)]
    pub categories: Vec<CategoryUrl>,
}

impl SourceConfig {
    /// Parsed base URL.
    pub fn base(&self) -> Result<Url> {
        Ok(Url::parse(&self.base_url)?)
    }

    fn validate(&self) -> Result<()> {
        self.base().map_err(|e| {
            AppError::validation(format!("{}: invalid base_url: {e}", self.source.id()))
        })?;
        if self.categories.is_empty() {
            return Err(AppError::validation(format!(
                "{}: no category URLs defined",
                self.source.id()
            )));
        }
        for entry in &self.categories {
            Url::parse(&entry.url).map_err(|e| {
                AppError::validation(format!(
                    "{}: invalid URL for category '{}': {e}",
                    self.source.id(),
                    entry.category
                ))
            })?;
        }
        Ok(())
    }
}

/// A category page URL and the hint its events are tagged with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryUrl {
    pub category: String,
    pub url: String,
}

/// Priority-ordered category inference rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorizerConfig {
    /// Source-category hint synonyms, checked first
    #[serde(default = "defaults::hint_rules")]
    pub hints: Vec<CategoryRule>,

    /// Keyword groups over title and description, checked in order
    #[serde(default = "defaults::keyword_rules")]
    pub keywords: Vec<CategoryRule>,
}

impl Default for CategorizerConfig {
    fn default() -> Self {
        Self {
            hints: defaults::hint_rules(),
            keywords: defaults::keyword_rules(),
        }
    }
}

/// Terms that select a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRule {
    /// Category code; unknown codes resolve to `events`
    pub category: String,

    /// Terms matched case-insensitively; `synonyms` in hint rules and
    /// `keywords` in keyword rules
    #[serde(alias = "synonyms", alias = "keywords")]
    pub terms: Vec<String>,
}

mod defaults {
    use super::{CategoryRule, CategoryUrl, SourceConfig};
    use crate::models::Source;

    // Fetcher defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn request_delay() -> u64 {
        2000
    }

    // Cache defaults
    pub fn cache_ttl() -> u64 {
        3600
    }

    // API defaults
    pub fn api_name() -> String {
        "Sydney Events API".into()
    }
    pub fn api_version() -> String {
        "1.0.0".into()
    }

    pub fn dump_dir() -> String {
        ".".into()
    }

    fn category_urls(prefix: &str, entries: &[(&str, &str)]) -> Vec<CategoryUrl> {
        entries
            .iter()
            .map(|(category, query)| CategoryUrl {
                category: (*category).to_string(),
                url: format!("{prefix}{query}"),
            })
            .collect()
    }

    // Source defaults
    pub fn default_sources() -> Vec<SourceConfig> {
        vec![
            SourceConfig {
                source: Source::SydneyCom,
                base_url: "https://www.sydney.com".to_string(),
                categories: category_urls(
                    "https://www.sydney.com/destinations/sydney/sydney-city/city-centre/events",
                    &[
                        ("events", ""),
                        ("festivals", "?19346-classification[]=FESTIVAL"),
                        ("performance", "?19346-classification[]=PERFORMANC"),
                        ("exhibit", "?19346-classification[]=EXHIBIT"),
                        ("food", "?19346-classification[]=EVTFOOD"),
                        ("sport", "?19346-classification[]=SPORT"),
                        ("community", "?19346-classification[]=EVTCOMNTY"),
                    ],
                ),
            },
            SourceConfig {
                source: Source::VisitNsw,
                base_url: "https://www.visitnsw.com".to_string(),
                categories: category_urls(
                    "https://www.visitnsw.com/events",
                    &[
                        ("events", ""),
                        ("general", "?17896-classification[]=EVTCLASS"),
                        ("community", "?17896-classification[]=EVTCOMNTY"),
                        ("performance", "?17896-classification[]=PERFORMANC"),
                        ("exhibit", "?17896-classification[]=EXHIBIT"),
                        ("festivals", "?17896-classification[]=FESTIVAL"),
                        ("food", "?17896-classification[]=EVTFOOD"),
                        ("markets", "?17896-classification[]=EVTMARKET"),
                        ("sport", "?17896-classification[]=SPORT"),
                        ("business", "?17896-classification[]=EVTBUS"),
                    ],
                ),
            },
        ]
    }

    fn rule(category: &str, terms: &[&str]) -> CategoryRule {
        CategoryRule {
            category: category.to_string(),
            terms: terms.iter().map(|t| (*t).to_string()).collect(),
        }
    }

    // Categorizer defaults
    pub fn hint_rules() -> Vec<CategoryRule> {
        vec![
            rule("festivals", &["festivals", "festival"]),
            rule("performance", &["performance", "performanc"]),
            rule("exhibit", &["exhibit", "exhibition"]),
            rule("food", &["food", "evtfood"]),
            rule("sport", &["sport", "sports"]),
            rule("community", &["community", "evtcomnty"]),
            rule("markets", &["markets", "evtmarket"]),
            rule("business", &["business", "evtbus"]),
        ]
    }

    pub fn keyword_rules() -> Vec<CategoryRule> {
        vec![
            rule("festivals", &["festival", "fest", "carnival"]),
            rule(
                "performance",
                &[
                    "concert",
                    "music",
                    "band",
                    "singer",
                    "performance",
                    "show",
                    "theatre",
                    "theater",
                ],
            ),
            rule(
                "exhibit",
                &["exhibition", "exhibit", "gallery", "museum", "art"],
            ),
            rule(
                "food",
                &["food", "wine", "dining", "restaurant", "cuisine", "cooking"],
            ),
            rule(
                "sport",
                &["sport", "game", "match", "race", "competition"],
            ),
            rule("markets", &["market", "farmers", "craft", "vendor"]),
            rule(
                "business",
                &["business", "conference", "workshop", "seminar", "networking"],
            ),
            rule(
                "community",
                &["community", "local", "neighborhood", "volunteer"],
            ),
        ]
    }
}
