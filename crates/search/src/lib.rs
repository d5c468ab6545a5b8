//! Search domain for the job-board API client.
//!
//! This crate contains every search concept: identifiers, the resource
//! registry, query building, field projection, display formatting, and the
//! error taxonomy. Infrastructure crates implement [`Transport`]; they never
//! add search rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; the `client` crate defines *how* to reach the
//! API and the `service` crate sequences the calls.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | `SearchId`, `ApiKey`, `BaseUrl` |
//! | [`types`] | `ResourceType`, `DisplayMode`, pagination, result envelope |
//! | [`errors`] | `SearchError`, `ValidationError`, `TransportError`, `Retryability` |
//! | [`registry`] | Resource definitions, filter specs, projection schemas |
//! | [`query`] | Filter + pagination -> query parameters |
//! | [`projection`] | Dot-path field projection |
//! | [`response`] | Upstream page decoding |
//! | [`format`] | Display modes and breakdown statistics |
//! | [`enrich`] | Derived fields on raw entries |
//! | [`request`] | Caller-facing request values |
//! | [`transport`] | The `Transport` port |

pub mod enrich;
pub mod errors;
pub mod format;
pub mod identifiers;
pub mod projection;
pub mod query;
pub mod registry;
pub mod request;
pub mod response;
pub mod transport;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use enrich::enrich_job;
pub use errors::{
    PermanentHttpError, Retryability, SearchError, TransientHttpError, TransportError, ValidationError,
};
pub use format::{breakdown, DisplayFormatter, ResultHeader, BREAKDOWN_TOP_N};
pub use identifiers::{ApiKey, BaseUrl, SearchId};
pub use projection::{FieldPath, Projection};
pub use query::{build_query, QueryParams, SearchQuery};
pub use registry::{
    FilterDef, FilterKind, FilterSpec, Normalize, ProjectionSchema, Registry, RegistryBuilder, ResourceDef,
    DEFAULT_LIMIT, MAX_LIMIT, RESERVED_PARAMS,
};
pub use request::{SearchOptions, SearchRequest};
pub use response::FetchedPage;
pub use transport::{HttpMethod, Transport};
pub use types::{
    Breakdown, DisplayMode, Entry, FacetCount, Page, Pagination, ResourceType, ResultStats, SampleSize,
    SearchResult, Timestamp, DEFAULT_SAMPLE_SIZE,
};
