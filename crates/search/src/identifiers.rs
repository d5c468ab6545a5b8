//! Newtype identifiers and configuration primitives.
//!
//! Values that carry meaning beyond "a string" are wrapped so they cannot be
//! swapped by accident: an [`ApiKey`] is never passed where a [`BaseUrl`] is
//! expected, and the key never leaks into `Debug` output.

use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Identifies a single search call.
///
/// Generated fresh for every search; recorded on the `search` tracing span and
/// on the result envelope so log lines and results can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchId(Uuid);

impl SearchId {
    /// Generates a new random search identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a [`SearchId`] from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for SearchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// The job-board API key, sent upstream as the `key` query parameter.
///
/// `Debug` and `Display` mask the value; use [`ApiKey::expose`] only when
/// building the outgoing request.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Creates a new key, returning `None` if the value is empty or whitespace.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let v = value.into();
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_owned()))
        }
    }

    /// Returns the raw key.
    pub fn expose(&self) -> &str {
        &self.0
    }

    fn masked(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() <= 8 {
            "*".repeat(chars.len())
        } else {
            let head: String = chars[..4].iter().collect();
            let tail: String = chars[chars.len() - 4..].iter().collect();
            format!("{head}...{tail}")
        }
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ApiKey").field(&self.masked()).finish()
    }
}

impl std::fmt::Display for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.masked())
    }
}

// ---------------------------------------------------------------------------
// Endpoints
// ---------------------------------------------------------------------------

/// Root URL of the job-board REST API (e.g. `https://jobs.example.com/api/v1/`).
///
/// Only `http` and `https` URLs with a host are accepted. Embedded
/// credentials are rejected: the API key travels as a query parameter, and
/// the origin ends up in public job links. The path is stored without a
/// trailing slash; a query string is kept and carried onto every request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BaseUrl(Url);

impl BaseUrl {
    /// Parses a base URL, returning `None` if it is malformed or not an
    /// acceptable API root.
    pub fn new(value: impl AsRef<str>) -> Option<Self> {
        let mut url = Url::parse(value.as_ref().trim()).ok()?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none_or(str::is_empty) {
            return None;
        }
        if !url.username().is_empty() || url.password().is_some() {
            return None;
        }
        url.set_fragment(None);
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&path);
        Some(Self(url))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// Appends an endpoint path below the API root. Empty segments are
    /// skipped and any query string on the root is preserved.
    pub fn join(&self, path: &str) -> Url {
        let mut url = self.0.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(path.split('/').filter(|s| !s.is_empty()));
        }
        url
    }

    /// Returns `scheme://host[:port]`, dropping the API path prefix.
    ///
    /// Public job pages live under the site origin rather than the API root.
    pub fn origin(&self) -> String {
        self.0.origin().ascii_serialization()
    }
}

impl std::fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
