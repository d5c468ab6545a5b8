//! Shared value types for the search domain.
//!
//! Unlike the identifiers in [`crate::identifiers`], these types carry values
//! with invariants (page numbers start at 1, sample sizes are non-zero) and
//! participate in search computations.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{SearchId, ValidationError};

/// One record as returned by the API: a string-keyed, arbitrarily nested
/// JSON object.
pub type Entry = Map<String, Value>;

// ---------------------------------------------------------------------------
// Resource types
// ---------------------------------------------------------------------------

/// The searchable entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Job,
    Company,
    Location,
    Category,
    JobType,
}

impl ResourceType {
    /// Every resource type, in registry order.
    pub const ALL: [ResourceType; 5] = [
        ResourceType::Job,
        ResourceType::Company,
        ResourceType::Location,
        ResourceType::Category,
        ResourceType::JobType,
    ];

    /// Canonical lowercase name (`"job"`, `"jobtype"`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Job => "job",
            ResourceType::Company => "company",
            ResourceType::Location => "location",
            ResourceType::Category => "category",
            ResourceType::JobType => "jobtype",
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = ValidationError;

    /// Accepts singular and plural names, case-insensitively
    /// (`"job"`, `"Jobs"`, `"job_types"`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "job" | "jobs" => Ok(ResourceType::Job),
            "company" | "companies" => Ok(ResourceType::Company),
            "location" | "locations" => Ok(ResourceType::Location),
            "category" | "categories" => Ok(ResourceType::Category),
            "jobtype" | "jobtypes" | "job_type" | "job_types" => Ok(ResourceType::JobType),
            _ => Err(ValidationError::UnknownResourceType { name: s.to_owned() }),
        }
    }
}

// ---------------------------------------------------------------------------
// Display modes
// ---------------------------------------------------------------------------

/// How many entries accompany the stats in a result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    /// Stats only.
    #[default]
    Summary,
    /// Stats plus the first `sample_size` entries of the page.
    ShowN,
    /// Stats plus every entry of the page.
    All,
}

impl DisplayMode {
    /// Returns `true` if results in this mode carry entries.
    ///
    /// Projection is skipped entirely when this is `false`.
    pub fn returns_entries(self) -> bool {
        !matches!(self, DisplayMode::Summary)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DisplayMode::Summary => "summary",
            DisplayMode::ShowN => "show_n",
            DisplayMode::All => "all",
        }
    }
}

impl std::fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisplayMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "summary" => Ok(DisplayMode::Summary),
            "show_n" => Ok(DisplayMode::ShowN),
            "all" => Ok(DisplayMode::All),
            other => Err(ValidationError::UnknownDisplayMode {
                value: other.to_owned(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

/// Pagination as requested by the caller; absent values take defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// 1-based page number. Defaults to 1.
    pub page: Option<u32>,
    /// Page size. Defaults to the resource's default limit.
    pub limit: Option<u32>,
}

/// Pagination after defaults and range checks have been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
}

// ---------------------------------------------------------------------------

/// Default number of entries returned in [`DisplayMode::ShowN`].
pub const DEFAULT_SAMPLE_SIZE: usize = 5;

/// Number of entries returned in [`DisplayMode::ShowN`]; always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SampleSize(usize);

impl SampleSize {
    /// Creates a [`SampleSize`], returning `None` for zero.
    #[must_use]
    pub fn new(size: usize) -> Option<Self> {
        if size == 0 {
            None
        } else {
            Some(Self(size))
        }
    }

    /// Returns the underlying value.
    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for SampleSize {
    fn default() -> Self {
        Self(DEFAULT_SAMPLE_SIZE)
    }
}

impl std::fmt::Display for SampleSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// When a result envelope was assembled. Serialises as RFC 3339.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0.to_rfc3339())
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Counts and pagination metadata for one fetched page.
///
/// `total`, `page`, and `total_pages` are as reported by the server (with the
/// fallbacks described on [`crate::FetchedPage`]); `fetched` is the number of
/// entries actually received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultStats {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,
    pub fetched: usize,
}

/// One value of a categorical breakdown and how often it occurred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetCount {
    pub name: String,
    pub count: usize,
}

/// Most frequent related entities across a fetched page of jobs.
///
/// Empty for every other resource type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakdown {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub companies: Vec<FacetCount>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<FacetCount>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<FacetCount>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub job_types: Vec<FacetCount>,
}

impl Breakdown {
    pub fn is_empty(&self) -> bool {
        self.companies.is_empty()
            && self.categories.is_empty()
            && self.locations.is_empty()
            && self.job_types.is_empty()
    }
}

/// The envelope returned by every search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: SearchId,
    pub timestamp: Timestamp,
    pub resource: ResourceType,
    pub display: DisplayMode,
    pub stats: ResultStats,
    #[serde(default, skip_serializing_if = "Breakdown::is_empty")]
    pub breakdown: Breakdown,
    /// Projected entries; always empty for [`DisplayMode::Summary`].
    pub entries: Vec<Entry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_type_parses_singular_and_plural() {
        assert_eq!("job".parse::<ResourceType>().unwrap(), ResourceType::Job);
        assert_eq!("Jobs".parse::<ResourceType>().unwrap(), ResourceType::Job);
        assert_eq!(
            "companies".parse::<ResourceType>().unwrap(),
            ResourceType::Company
        );
        assert_eq!(
            "job_types".parse::<ResourceType>().unwrap(),
            ResourceType::JobType
        );
    }

    #[test]
    fn unknown_resource_type_is_a_validation_error() {
        let err = "recruiters".parse::<ResourceType>().unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnknownResourceType {
                name: "recruiters".into()
            }
        );
    }

    #[test]
    fn display_mode_round_trips_through_str() {
        for mode in [DisplayMode::Summary, DisplayMode::ShowN, DisplayMode::All] {
            assert_eq!(mode.as_str().parse::<DisplayMode>().unwrap(), mode);
        }
        assert!(matches!(
            "everything".parse::<DisplayMode>(),
            Err(ValidationError::UnknownDisplayMode { .. })
        ));
    }

    #[test]
    fn display_mode_serialises_snake_case() {
        assert_eq!(
            serde_json::to_value(DisplayMode::ShowN).unwrap(),
            serde_json::json!("show_n")
        );
    }

    #[test]
    fn only_summary_skips_entries() {
        assert!(!DisplayMode::Summary.returns_entries());
        assert!(DisplayMode::ShowN.returns_entries());
        assert!(DisplayMode::All.returns_entries());
    }

    #[test]
    fn sample_size_rejects_zero() {
        assert!(SampleSize::new(0).is_none());
        assert_eq!(SampleSize::new(3).unwrap().get(), 3);
        assert_eq!(SampleSize::default().get(), DEFAULT_SAMPLE_SIZE);
    }
}
