//! Service configuration.
//!
//! Fixed at construction and never mutated; every search call reads it.

use search::{ApiKey, BaseUrl, SampleSize, SearchError};

/// Used when `NICEBOARD_BASE_URL` is not set.
pub const DEFAULT_BASE_URL: &str = "https://jobs.auditfriendly.co/api/v1/";

pub const API_KEY_ENV: &str = "NICEBOARD_API_KEY";
pub const BASE_URL_ENV: &str = "NICEBOARD_BASE_URL";
pub const SAMPLE_SIZE_ENV: &str = "NICEBOARD_SAMPLE_SIZE";

/// Immutable configuration of a [`crate::SearchService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub api_key: ApiKey,
    pub base_url: BaseUrl,
    /// Default number of entries for `show_n` results.
    pub sample_size: SampleSize,
}

impl ServiceConfig {
    /// Validates the raw key and URL.
    ///
    /// # Errors
    ///
    /// [`SearchError::Configuration`] if the key is empty or the URL is not an
    /// absolute `http(s)` URL.
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self, SearchError> {
        let api_key = ApiKey::new(api_key).ok_or_else(|| SearchError::configuration("an API key is required"))?;
        let base_url = base_url.into();
        let base_url = BaseUrl::new(base_url.as_str())
            .ok_or_else(|| SearchError::configuration(format!("invalid base URL '{base_url}'")))?;
        Ok(Self {
            api_key,
            base_url,
            sample_size: SampleSize::default(),
        })
    }

    pub fn with_sample_size(mut self, sample_size: usize) -> Result<Self, SearchError> {
        self.sample_size = SampleSize::new(sample_size)
            .ok_or_else(|| SearchError::configuration("sample size must be at least 1"))?;
        Ok(self)
    }

    /// Reads `NICEBOARD_API_KEY`, `NICEBOARD_BASE_URL`, and
    /// `NICEBOARD_SAMPLE_SIZE`.
    pub fn from_env() -> Result<Self, SearchError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env) with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SearchError> {
        let api_key = lookup(API_KEY_ENV)
            .ok_or_else(|| SearchError::configuration(format!("{API_KEY_ENV} is not set")))?;
        let base_url = lookup(BASE_URL_ENV)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
        let config = Self::new(api_key, base_url)?;

        match lookup(SAMPLE_SIZE_ENV) {
            Some(raw) => {
                let size = raw.trim().parse::<usize>().map_err(|_| {
                    SearchError::configuration(format!("{SAMPLE_SIZE_ENV} must be a positive integer, got '{raw}'"))
                })?;
                config.with_sample_size(size)
            }
            None => Ok(config),
        }
    }
}
