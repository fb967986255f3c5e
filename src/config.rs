//! Client configuration.
//!
//! A [`ClientConfig`] is built once per client and never mutated. It can be
//! assembled in code or loaded from `PELICAN_*` environment variables.

use std::time::Duration;

use crate::error::Error;

pub const BASE_URL_ENV: &str = "PELICAN_BASE_URL";
pub const API_KEY_ENV: &str = "PELICAN_API_KEY";
pub const TIMEOUT_ENV: &str = "PELICAN_TIMEOUT_SECS";

/// Connection settings shared by every request a client issues.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: String,
    api_key: String,
    timeout: Option<Duration>,
}

impl ClientConfig {
    /// Build a config, stripping trailing slashes from `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBaseUrl`] unless the URL uses `http` or `https`.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, Error> {
        let base_url = base_url.into();
        let trimmed = base_url.trim().trim_end_matches('/');
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(Error::InvalidBaseUrl(base_url));
        }

        Ok(Self {
            base_url: trimmed.to_owned(),
            api_key: api_key.into(),
            timeout: None,
        })
    }

    /// Load from `PELICAN_BASE_URL`, `PELICAN_API_KEY` and the optional
    /// `PELICAN_TIMEOUT_SECS`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingConfig`] when a required variable is unset or
    /// empty, and [`Error::InvalidBaseUrl`] for a malformed base URL.
    pub fn from_env() -> Result<Self, Error> {
        let base_url = env_nonempty(BASE_URL_ENV).ok_or(Error::MissingConfig(BASE_URL_ENV))?;
        let api_key = env_nonempty(API_KEY_ENV).ok_or(Error::MissingConfig(API_KEY_ENV))?;
        let config = Self::new(base_url, api_key)?;

        let timeout = env_nonempty(TIMEOUT_ENV)
            .and_then(|value| value.parse::<u64>().ok())
            .map(Duration::from_secs);
        Ok(config.with_timeout(timeout))
    }

    /// Set or clear the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
