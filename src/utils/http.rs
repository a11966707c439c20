// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use reqwest::blocking::Client;

use crate::error::{AppError, Result};
use crate::models::FetcherConfig;

/// Create a configured blocking HTTP client.
pub fn create_client(config: &FetcherConfig) -> Result<Client> {
    let client = Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Fetch a page and return its body as text.
///
/// Non-success statuses are reported as fetch errors.
pub fn fetch_text(client: &Client, url: &str) -> Result<String> {
    let response = client.get(url).send()?;
    let status = response.status();
    if !status.is_success() {
        return Err(AppError::fetch(url, format!("HTTP status {status}")));
    }
    Ok(response.text()?)
}
