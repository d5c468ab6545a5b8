//! Error and retry-classification types for the search domain.
//!
//! [`SearchError`] is what a caller of the search service sees. It is built
//! from two narrower types:
//!
//! - [`ValidationError`]: the request was rejected before any network call.
//! - [`TransportError`]: the upstream call failed; each variant knows its
//!   [`Retryability`].
//!
//! ## Classification rules
//!
//! - Transient: network failures, timeouts, HTTP 5xx, HTTP 429.
//! - Permanent: every other 4xx, and payloads that cannot be decoded.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ResourceType;

// ---------------------------------------------------------------------------
// Retry semantics
// ---------------------------------------------------------------------------

/// Whether a failed call is safe to retry and, if so, after what delay.
///
/// Produced by [`TransportError::retryability`]; consumed by retry policies
/// that decide whether to re-issue a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Retryability {
    /// The call may be retried.
    Retryable {
        /// Minimum back-off before the next attempt (e.g. from a `Retry-After`
        /// header). `None` means the policy's own schedule applies.
        after: Option<Duration>,
    },
    /// The call will not succeed on retry.
    NonRetryable,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// A search request that cannot be sent upstream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The resource name does not parse to a known resource type.
    #[error("unknown resource type '{name}'; expected one of job, company, location, category, jobtype")]
    UnknownResourceType { name: String },

    /// The resource type parsed but the registry has no entry for it.
    #[error("resource type '{resource}' is not searchable with this registry")]
    UnsupportedResource { resource: ResourceType },

    /// The filter key is not declared for this resource.
    #[error("unknown filter '{key}' for {resource}")]
    UnknownFilter { resource: ResourceType, key: String },

    /// Two filter keys map to the same upstream parameter.
    #[error("filters '{first}' and '{second}' both set '{param}' for {resource}")]
    ConflictingFilters {
        resource: ResourceType,
        param: String,
        first: String,
        second: String,
    },

    /// The filter value does not have the declared shape.
    #[error("filter '{key}' for {resource} expects {expected}")]
    InvalidFilterValue {
        resource: ResourceType,
        key: String,
        expected: &'static str,
    },

    /// The field path is not part of the resource's projection schema.
    #[error("unknown field '{path}' for {resource}; nested fields use dot notation (e.g. 'company.slug')")]
    UnknownField { resource: ResourceType, path: String },

    /// The display mode string is not recognised.
    #[error("unknown display mode '{value}'; expected one of summary, show_n, all")]
    UnknownDisplayMode { value: String },

    /// Page numbers start at 1.
    #[error("page must be >= 1, got {page}")]
    PageOutOfRange { page: u32 },

    /// The page size is outside `[1, max]`.
    #[error("limit must be between 1 and {max}, got {limit}")]
    LimitOutOfRange { limit: u32, max: u32 },

    /// A sample size of zero would always return nothing.
    #[error("sample size must be >= 1, got {sample_size}")]
    SampleSizeOutOfRange { sample_size: usize },
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// A failure that is expected to clear up on its own.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransientHttpError {
    /// Connection refused, reset, DNS failure, and similar.
    #[error("network error: {message}")]
    Network { message: String },

    /// The request did not complete within the client timeout.
    #[error("request timed out: {message}")]
    Timeout { message: String },

    /// HTTP 5xx.
    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },

    /// HTTP 429.
    #[error("rate limited: {message}")]
    RateLimited {
        retry_after: Option<Duration>,
        message: String,
    },
}

/// A 4xx response other than 429.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("HTTP {status}: {message}")]
pub struct PermanentHttpError {
    /// HTTP status code.
    pub status: u16,
    /// Upstream error message, or the response body when none was given.
    pub message: String,
}

/// Errors produced by a [`crate::Transport`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error(transparent)]
    Transient(#[from] TransientHttpError),

    #[error(transparent)]
    Permanent(#[from] PermanentHttpError),

    /// The response body was not the JSON the caller expected.
    #[error("could not decode response: {message}")]
    Decode { message: String },

    /// The request could not be built or its redirects could not be
    /// followed. Sending it again fails the same way.
    #[error("request failed: {message}")]
    Request { message: String },

    /// A retrying transport gave up.
    #[error("gave up after {attempts} attempts: {last}")]
    RetryExhausted {
        attempts: u32,
        last: Box<TransportError>,
    },
}

impl TransportError {
    /// Classifies a non-success HTTP status.
    ///
    /// `retry_after` is only kept for 429 responses.
    pub fn from_status(status: u16, message: impl Into<String>, retry_after: Option<Duration>) -> Self {
        let message = message.into();
        match status {
            429 => TransientHttpError::RateLimited {
                retry_after,
                message,
            }
            .into(),
            500..=599 => TransientHttpError::Server { status, message }.into(),
            _ => PermanentHttpError { status, message }.into(),
        }
    }

    /// Default retry classification for this error.
    pub fn retryability(&self) -> Retryability {
        match self {
            TransportError::Transient(TransientHttpError::RateLimited { retry_after, .. }) => {
                Retryability::Retryable {
                    after: *retry_after,
                }
            }
            TransportError::Transient(_) => Retryability::Retryable { after: None },
            TransportError::Permanent(_)
            | TransportError::Decode { .. }
            | TransportError::Request { .. }
            | TransportError::RetryExhausted { .. } => Retryability::NonRetryable,
        }
    }

    /// Returns `true` for network, timeout, 5xx, and 429 failures.
    pub fn is_transient(&self) -> bool {
        matches!(self, TransportError::Transient(_))
    }
}

// ---------------------------------------------------------------------------
// Search-level errors
// ---------------------------------------------------------------------------

/// Errors returned by search operations.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Invalid construction arguments (missing API key, malformed base URL).
    ///
    /// Produced at construction time; a service never starts with a bad config.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// The request was rejected before any network call.
    #[error("invalid search request: {0}")]
    Validation(#[from] ValidationError),

    /// Every attempt failed with a retryable error.
    #[error("search failed after {attempts} attempts: {last}")]
    RetryExhausted {
        attempts: u32,
        #[source]
        last: TransportError,
    },

    /// Upstream rejected the request; retrying will not help.
    #[error("upstream rejected the request with HTTP {status}: {message}")]
    PermanentHttp { status: u16, message: String },

    /// The request could not be sent (malformed URL, redirect loop).
    #[error("could not send request: {message}")]
    Request { message: String },

    /// The upstream payload did not have the expected shape.
    #[error("could not decode upstream response: {message}")]
    Decode { message: String },

    /// The caller's overall deadline elapsed before the search completed.
    #[error("search deadline exceeded after {elapsed:?}")]
    DeadlineExceeded { elapsed: Duration },
}

impl SearchError {
    /// Creates a [`SearchError::Configuration`].
    pub fn configuration(message: impl Into<String>) -> Self {
        SearchError::Configuration {
            message: message.into(),
        }
    }

    /// Returns the HTTP status for permanent upstream failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            SearchError::PermanentHttp { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<TransportError> for SearchError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Permanent(PermanentHttpError { status, message }) => {
                SearchError::PermanentHttp { status, message }
            }
            TransportError::Decode { message } => SearchError::Decode { message },
            TransportError::Request { message } => SearchError::Request { message },
            TransportError::RetryExhausted { attempts, last } => SearchError::RetryExhausted {
                attempts,
                last: *last,
            },
            // A transport without a retry policy makes exactly one attempt.
            transient @ TransportError::Transient(_) => SearchError::RetryExhausted {
                attempts: 1,
                last: transient,
            },
        }
    }
}
