// src/services/fields.rs

//! Text heuristics shared by every extraction strategy.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::utils::absolute_url;

/// Stored when no date pattern matches.
pub const DATE_UNKNOWN: &str = "Check event page for dates";

/// Stored when no price pattern matches.
pub const PRICE_UNKNOWN: &str = "See event page for pricing";

/// Maximum description length before truncation.
pub const DESCRIPTION_MAX: usize = 300;

const ELLIPSIS: &str = "...";

const MONTHS: &str = "(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)";

// Checked in order; the first pattern with any match wins.
static DATE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        format!(r"(?i)\d{{1,2}}\s+{MONTHS}(?:\s*-\s*\d{{1,2}}\s+{MONTHS})?"),
        r"\d{1,2}/\d{1,2}/\d{4}".to_string(),
        r"\d{4}-\d{2}-\d{2}".to_string(),
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid date pattern"))
    .collect()
});

static PRICE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"(?i)from\s*\$\d+", r"\$\d+(?:\.\d{2})?", r"(?i)free"]
        .iter()
        .map(|p| Regex::new(p).expect("valid price pattern"))
        .collect()
});

static LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("link selector"));
static IMAGE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img").expect("image selector"));

/// Parse a CSS selector, reporting failures as [`AppError::Selector`].
pub fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// Parse a list of selectors, preserving order.
pub fn parse_selectors(list: &[&str]) -> Result<Vec<Selector>> {
    list.iter().map(|s| parse_selector(s)).collect()
}

/// Collapse runs of whitespace into single spaces.
pub fn clean_text(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// All visible text of an element, whitespace-normalized.
pub fn inner_text(element: &ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<Vec<_>>().join(" "))
}

/// Try selectors in order; the first one whose first match has more than
/// `min_len` characters of text wins.
pub fn first_text(item: &ElementRef<'_>, selectors: &[Selector], min_len: usize) -> Option<String> {
    selectors.iter().find_map(|selector| {
        let text = inner_text(&item.select(selector).next()?);
        (text.chars().count() > min_len).then_some(text)
    })
}

/// Truncate to [`DESCRIPTION_MAX`] characters, appending an ellipsis when cut.
pub fn truncate_description(text: &str) -> String {
    match text.char_indices().nth(DESCRIPTION_MAX) {
        Some((cut, _)) => format!("{}{ELLIPSIS}", &text[..cut]),
        None => text.to_string(),
    }
}

fn first_match(patterns: &[Regex], text: &str) -> Option<String> {
    patterns
        .iter()
        .find_map(|pattern| pattern.find(text))
        .map(|m| m.as_str().to_string())
}

/// First date-like substring, or [`DATE_UNKNOWN`].
pub fn extract_date(text: &str) -> String {
    first_match(&DATE_PATTERNS, text).unwrap_or_else(|| DATE_UNKNOWN.to_string())
}

/// First price-like substring, or [`PRICE_UNKNOWN`].
pub fn extract_price(text: &str) -> String {
    first_match(&PRICE_PATTERNS, text).unwrap_or_else(|| PRICE_UNKNOWN.to_string())
}

/// Absolute URL of the first link in the item.
pub fn first_link(item: &ElementRef<'_>, base: &Url) -> Option<String> {
    item.select(&LINK_SELECTOR)
        .next()
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| absolute_url(base, href))
}

/// Absolute URL and alt text of the item's primary image.
///
/// Prefers `src`, falling back to the lazy-load `data-src` attribute.
pub fn primary_image(item: &ElementRef<'_>, base: &Url) -> Option<(String, String)> {
    let img = item.select(&IMAGE_SELECTOR).next()?;
    let attrs = img.value();
    let src = attrs
        .attr("src")
        .filter(|s| !s.trim().is_empty())
        .or_else(|| attrs.attr("data-src"))?;
    let url = absolute_url(base, src)?;
    Some((url, attrs.attr("alt").unwrap_or_default().to_string()))
}

#[cfg(test)]
mod tests {
    use scraper::Html;

    use super::*;

    #[test]
    fn test_date_day_month_range() {
        assert_eq!(extract_date("On 12 Oct - 15 Nov at the Rocks"), "12 Oct - 15 Nov");
        assert_eq!(extract_date("Opens 3 march"), "3 mar");
    }

    #[test]
    fn test_date_pattern_order_wins() {
        let text = "Updated 2025-01-04, runs 5 Jan";
        assert_eq!(extract_date(text), "5 Jan");
        assert_eq!(extract_date("Held on 4/1/2025 or 2025-01-04"), "4/1/2025");
        assert_eq!(extract_date("Held on 2025-01-04"), "2025-01-04");
    }

    #[test]
    fn test_date_unknown() {
        assert_eq!(extract_date("Every weekend"), DATE_UNKNOWN);
    }

    #[test]
    fn test_price_pattern_order_wins() {
        assert_eq!(extract_price("Tickets from $45, free entry after 6pm"), "from $45");
        assert_eq!(extract_price("Adults $29.50, kids free"), "$29.50");
        assert_eq!(extract_price("FREE for members"), "FREE");
        assert_eq!(extract_price("Bookings essential"), PRICE_UNKNOWN);
    }

    #[test]
    fn test_truncate_description() {
        let long = "a".repeat(310);
        let truncated = truncate_description(&long);
        assert_eq!(truncated, format!("{}...", "a".repeat(300)));

        let exact = "b".repeat(300);
        assert_eq!(truncate_description(&exact), exact);
        assert_eq!(truncate_description("short"), "short");
    }

    #[test]
    fn test_truncate_counts_characters_not_graphemes() {
        // 155 base letters each followed by a combining accent: 310 chars.
        let accented = "e\u{301}".repeat(155);
        let truncated = truncate_description(&accented);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.chars().count(), DESCRIPTION_MAX + 3);
        assert_eq!(&truncated[..truncated.len() - 3], &"e\u{301}".repeat(150));

        let cjk = "悉".repeat(301);
        assert_eq!(truncate_description(&cjk), format!("{}...", "悉".repeat(300)));
    }

    #[test]
    fn test_first_text_respects_min_len_and_order() {
        let html = Html::parse_fragment(
            r#"<div><h2>Hi</h2><h3>Vivid Sydney</h3><span class="title">Other</span></div>"#,
        );
        let root = html.root_element();
        let selectors = parse_selectors(&["h2", "h3", ".title"]).unwrap();
        assert_eq!(first_text(&root, &selectors, 3).as_deref(), Some("Vivid Sydney"));
        assert_eq!(first_text(&root, &selectors, 0).as_deref(), Some("Hi"));
        assert_eq!(first_text(&root, &selectors, 20), None);
    }

    #[test]
    fn test_primary_image_falls_back_to_data_src() {
        let base = Url::parse("https://www.visitnsw.com").unwrap();
        let html = Html::parse_fragment(r#"<div><img data-src="/img/lazy.jpg" alt="Lanterns"></div>"#);
        let (url, alt) = primary_image(&html.root_element(), &base).unwrap();
        assert_eq!(url, "https://www.visitnsw.com/img/lazy.jpg");
        assert_eq!(alt, "Lanterns");
    }

    #[test]
    fn test_first_link_resolves_relative() {
        let base = Url::parse("https://www.sydney.com").unwrap();
        let html = Html::parse_fragment(r#"<div><a>no href</a><a href="/events/x">X</a></div>"#);
        assert_eq!(
            first_link(&html.root_element(), &base).as_deref(),
            Some("https://www.sydney.com/events/x")
        );
    }

    #[test]
    fn test_parse_selector_invalid() {
        assert!(parse_selector("[[invalid").is_err());
        assert!(parse_selector(r#"div[class*="event"]"#).is_ok());
    }
}
