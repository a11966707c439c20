// src/services/fetcher.rs

//! Page fetching abstraction.
//!
//! A [`Browser`] opens one [`PageSession`] per source per aggregation pass.
//! Sessions are held through a [`SessionGuard`], which closes them on every
//! exit path.

use std::ops::{Deref, DerefMut};

use reqwest::blocking::Client;

use crate::error::Result;
use crate::models::{FetcherConfig, Source};
use crate::utils::http;

/// An open page-rendering session.
pub trait PageSession {
    /// Fetch a URL and return its rendered markup.
    fn fetch(&mut self, url: &str) -> Result<String>;

    /// Release the session. Called exactly once by [`SessionGuard`].
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Factory for page sessions.
pub trait Browser {
    type Session: PageSession;

    /// Open a session for fetching one source's pages.
    fn open_session(&self, source: Source) -> Result<Self::Session>;
}

/// Scoped session handle; closes the session when dropped.
pub struct SessionGuard<S: PageSession> {
    session: S,
    source: Source,
}

impl<S: PageSession> SessionGuard<S> {
    pub fn new(session: S, source: Source) -> Self {
        Self { session, source }
    }
}

impl<S: PageSession> Deref for SessionGuard<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.session
    }
}

impl<S: PageSession> DerefMut for SessionGuard<S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.session
    }
}

impl<S: PageSession> Drop for SessionGuard<S> {
    fn drop(&mut self) {
        match self.session.close() {
            Ok(()) => log::debug!("Closed fetch session for {}", self.source),
            Err(e) => log::warn!("Failed to close fetch session for {}: {}", self.source, e),
        }
    }
}

/// Plain HTTP implementation of [`Browser`].
///
/// Returns server-rendered markup only; pages that need script execution
/// require a rendering backend behind the same trait.
pub struct HttpBrowser {
    config: FetcherConfig,
}

impl HttpBrowser {
    pub fn new(config: FetcherConfig) -> Self {
        Self { config }
    }
}

impl Browser for HttpBrowser {
    type Session = HttpSession;

    fn open_session(&self, source: Source) -> Result<HttpSession> {
        log::debug!("Opening HTTP session for {source}");
        Ok(HttpSession {
            client: http::create_client(&self.config)?,
        })
    }
}

/// Session backed by a blocking `reqwest` client.
pub struct HttpSession {
    client: Client,
}

impl PageSession for HttpSession {
    fn fetch(&mut self, url: &str) -> Result<String> {
        http::fetch_text(&self.client, url)
    }
}
