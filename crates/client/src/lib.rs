//! Job-board API transport adapter.
//!
//! Implements [`search::Transport`] over HTTPS with `reqwest`: URL
//! construction, the per-request timeout, response decoding, and the mapping
//! from HTTP outcomes onto [`search::TransportError`].
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Connection handling and status classification live
//! here. The [`search`] crate sees only [`search::Transport`]; retries are
//! applied by the `service` crate around whatever transport it is given.

pub mod http;

pub use http::{ClientConfig, HttpTransport, DEFAULT_CONNECT_TIMEOUT, DEFAULT_TIMEOUT, USER_AGENT};
