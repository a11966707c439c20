//! The closed set of event categories.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Classification bucket assigned to every event.
///
/// Declaration order is the order groups appear in responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Events,
    Festivals,
    Performance,
    Exhibit,
    Food,
    Sport,
    Community,
    Markets,
    Business,
    General,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Events,
        Category::Festivals,
        Category::Performance,
        Category::Exhibit,
        Category::Food,
        Category::Sport,
        Category::Community,
        Category::Markets,
        Category::Business,
        Category::General,
    ];

    /// Bucket for anything no rule claims.
    pub const DEFAULT: Category = Category::Events;

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Events => "events",
            Category::Festivals => "festivals",
            Category::Performance => "performance",
            Category::Exhibit => "exhibit",
            Category::Food => "food",
            Category::Sport => "sport",
            Category::Community => "community",
            Category::Markets => "markets",
            Category::Business => "business",
            Category::General => "general",
        }
    }

    /// Parse a category code, ignoring case and surrounding whitespace.
    pub fn parse(code: &str) -> Option<Self> {
        let code = code.trim().to_lowercase();
        Self::ALL.into_iter().find(|c| c.as_str() == code)
    }

    /// Parse a category code, coercing unknown codes to [`Category::DEFAULT`].
    pub fn parse_or_default(code: &str) -> Self {
        Self::parse(code).unwrap_or_else(|| {
            log::warn!("Unknown category code '{code}', using '{}'", Self::DEFAULT);
            Self::DEFAULT
        })
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| AppError::not_found(format!("Category {s} not found")))
    }
}
