//! Job-board search service.
//!
//! Sequences one search: registry lookup, validation, query building, the
//! retried upstream call, and result shaping. Configuration and the retry
//! policy live here because they are properties of a running service rather
//! than of the search domain.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** [`SearchService`] wires business logic from the
//! [`search`] crate to any [`search::Transport`] implementation. It contains
//! no search rules of its own.

pub mod config;
pub mod retry;
pub mod service;

pub use config::{ServiceConfig, API_KEY_ENV, BASE_URL_ENV, DEFAULT_BASE_URL, SAMPLE_SIZE_ENV};
pub use retry::{
    RetryClassifier, RetryPolicy, RetryingTransport, DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY,
};
pub use service::SearchService;
