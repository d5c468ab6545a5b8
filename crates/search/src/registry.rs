//! The resource registry: what can be searched, filtered, and projected.
//!
//! A [`Registry`] is built once and then only read. The service receives it
//! at construction, so tests can substitute a smaller or different table via
//! [`Registry::builder`].
//!
//! ## Built-in table
//!
//! | Resource | Endpoint | Filters |
//! |----------|----------|---------|
//! | job | `jobs` | company, category, jobtype, location, remote_ok, remote_only, is_featured, tags |
//! | company | `companies` | keyword |
//! | location | `locations` | none |
//! | category | `categories` | none |
//! | jobtype | `jobtypes` | none |
//!
//! Each of the four job facets also accepts a `<facet>.slug` alias.

use std::collections::{BTreeMap, HashMap};

use crate::{FieldPath, Page, Pagination, Projection, ResourceType, SearchError, ValidationError};

/// Default page size when the caller does not set one.
pub const DEFAULT_LIMIT: u32 = 30;

/// Largest page size the upstream API serves.
pub const MAX_LIMIT: u32 = 100;

/// Query parameters managed by the query builder; never valid filter keys.
pub const RESERVED_PARAMS: [&str; 3] = ["key", "page", "limit"];

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// The value shape a filter accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    /// A string or number, sent as-is.
    Scalar,
    /// A boolean, sent as `"true"` / `"false"`.
    Boolean,
    /// A list of scalars, sent as a JSON-encoded string.
    Array,
}

impl FilterKind {
    /// Human-readable shape, used in validation messages.
    pub fn expected(self) -> &'static str {
        match self {
            FilterKind::Scalar => "a string or number",
            FilterKind::Boolean => "a boolean",
            FilterKind::Array => "a list of strings or numbers",
        }
    }
}

/// Normalisation applied to string filter values before they are sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Normalize {
    #[default]
    None,
    /// Slugs are lowercase upstream.
    Lowercase,
    Trim,
}

impl Normalize {
    pub fn apply(self, value: &str) -> String {
        match self {
            Normalize::None => value.to_owned(),
            Normalize::Lowercase => value.trim().to_lowercase(),
            Normalize::Trim => value.trim().to_owned(),
        }
    }
}

/// One accepted filter key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterDef {
    /// Key as the caller writes it (e.g. `"company.slug"`).
    pub key: String,
    /// Query parameter sent upstream (e.g. `"company"`).
    pub param: String,
    pub kind: FilterKind,
    pub normalize: Normalize,
}

impl FilterDef {
    /// A filter whose key and upstream parameter coincide.
    pub fn new(key: &str, kind: FilterKind) -> Self {
        Self {
            key: key.to_owned(),
            param: key.to_owned(),
            kind,
            normalize: Normalize::None,
        }
    }

    /// Sends this key upstream under a different parameter name.
    pub fn alias_of(mut self, param: &str) -> Self {
        self.param = param.to_owned();
        self
    }

    pub fn normalized(mut self, normalize: Normalize) -> Self {
        self.normalize = normalize;
        self
    }
}

/// The filter keys a resource accepts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    filters: BTreeMap<String, FilterDef>,
}

impl FilterSpec {
    pub fn new(filters: impl IntoIterator<Item = FilterDef>) -> Self {
        Self {
            filters: filters.into_iter().map(|f| (f.key.clone(), f)).collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&FilterDef> {
        self.filters.get(key)
    }

    /// Returns `true` if `key` is an accepted filter (e.g. `"keyword"`).
    pub fn declares(&self, key: &str) -> bool {
        self.filters.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.filters.keys().map(String::as_str)
    }

    /// Every upstream parameter these filters can produce.
    pub fn params(&self) -> impl Iterator<Item = &str> {
        self.filters.values().map(|f| f.param.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Projection schema
// ---------------------------------------------------------------------------

/// The field paths a resource allows in projections, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectionSchema {
    paths: Vec<FieldPath>,
}

impl ProjectionSchema {
    /// Builds a schema from path strings. Strings that are not valid dot
    /// paths, and duplicates, are skipped.
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<FieldPath> = Vec::new();
        for path in paths.into_iter().filter_map(|p| FieldPath::parse(p.as_ref())) {
            if !out.contains(&path) {
                out.push(path);
            }
        }
        Self { paths: out }
    }

    pub fn paths(&self) -> &[FieldPath] {
        &self.paths
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.iter().any(|p| p.as_str() == path)
    }

    /// Validates requested paths and returns the projection to apply.
    ///
    /// An empty request selects every schema path. Requested order is kept.
    pub fn resolve(&self, resource: ResourceType, requested: &[String]) -> Result<Projection, ValidationError> {
        if requested.is_empty() {
            return Ok(Projection::new(self.paths.clone()));
        }
        let paths = requested
            .iter()
            .map(|raw| {
                self.paths
                    .iter()
                    .find(|p| p.as_str() == raw.trim())
                    .cloned()
                    .ok_or_else(|| ValidationError::UnknownField {
                        resource,
                        path: raw.clone(),
                    })
            })
            .collect::<Result<_, _>>()?;
        Ok(Projection::new(paths))
    }
}

// ---------------------------------------------------------------------------
// Resource definitions
// ---------------------------------------------------------------------------

/// Everything the search layer knows about one resource type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDef {
    pub resource: ResourceType,
    /// Path relative to the API base URL (e.g. `"jobs"`).
    pub endpoint: String,
    /// Key of the entry list inside the response's `results` object.
    pub collection_key: String,
    pub filters: FilterSpec,
    pub fields: ProjectionSchema,
    pub default_limit: u32,
    pub max_limit: u32,
}

impl ResourceDef {
    /// A definition with no filters, no fields, and the default limits.
    pub fn new(resource: ResourceType, endpoint: &str, collection_key: &str) -> Self {
        Self {
            resource,
            endpoint: endpoint.to_owned(),
            collection_key: collection_key.to_owned(),
            filters: FilterSpec::default(),
            fields: ProjectionSchema::default(),
            default_limit: DEFAULT_LIMIT,
            max_limit: MAX_LIMIT,
        }
    }

    pub fn with_filters(mut self, filters: impl IntoIterator<Item = FilterDef>) -> Self {
        self.filters = FilterSpec::new(filters);
        self
    }

    pub fn with_fields<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.fields = ProjectionSchema::new(paths);
        self
    }

    pub fn with_limits(mut self, default_limit: u32, max_limit: u32) -> Self {
        self.default_limit = default_limit;
        self.max_limit = max_limit;
        self
    }

    /// Applies pagination defaults and range checks. Out-of-range values are
    /// rejected, never clamped.
    pub fn resolve_pagination(&self, pagination: Pagination) -> Result<Page, ValidationError> {
        let page = pagination.page.unwrap_or(1);
        if page < 1 {
            return Err(ValidationError::PageOutOfRange { page });
        }
        let limit = pagination.limit.unwrap_or(self.default_limit);
        if limit < 1 || limit > self.max_limit {
            return Err(ValidationError::LimitOutOfRange {
                limit,
                max: self.max_limit,
            });
        }
        Ok(Page { page, limit })
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Immutable lookup from resource type to its definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
    resources: HashMap<ResourceType, ResourceDef>,
}

impl Registry {
    /// The job-board API's resources.
    pub fn builtin() -> Self {
        let resources = builtin_resources()
            .into_iter()
            .map(|def| (def.resource, def))
            .collect();
        Self { resources }
    }

    /// Starts an empty registry for substitute tables.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Looks up a resource, failing before any network call if it is absent.
    pub fn get(&self, resource: ResourceType) -> Result<&ResourceDef, ValidationError> {
        self.resources
            .get(&resource)
            .ok_or(ValidationError::UnsupportedResource { resource })
    }

    /// Registered definitions in [`ResourceType::ALL`] order.
    pub fn resources(&self) -> impl Iterator<Item = &ResourceDef> {
        ResourceType::ALL
            .into_iter()
            .filter_map(|r| self.resources.get(&r))
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Assembles a [`Registry`], checking each definition on [`build`](Self::build).
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    resources: Vec<ResourceDef>,
}

impl RegistryBuilder {
    /// Adds (or replaces) a resource definition.
    pub fn resource(mut self, def: ResourceDef) -> Self {
        self.resources.retain(|d| d.resource != def.resource);
        self.resources.push(def);
        self
    }

    /// Validates limits and filter names and freezes the table.
    pub fn build(self) -> Result<Registry, SearchError> {
        let mut resources = HashMap::new();
        for def in self.resources {
            if def.max_limit == 0 || def.default_limit == 0 || def.default_limit > def.max_limit {
                return Err(SearchError::configuration(format!(
                    "{}: default limit {} must be within 1..={}",
                    def.resource, def.default_limit, def.max_limit
                )));
            }
            if let Some(reserved) = def
                .filters
                .keys()
                .chain(def.filters.params())
                .find(|k| RESERVED_PARAMS.contains(k))
            {
                return Err(SearchError::configuration(format!(
                    "{}: '{reserved}' is reserved and cannot be a filter",
                    def.resource
                )));
            }
            resources.insert(def.resource, def);
        }
        Ok(Registry { resources })
    }
}

fn builtin_resources() -> Vec<ResourceDef> {
    use FilterKind::{Array, Boolean, Scalar};

    let job = ResourceDef::new(ResourceType::Job, "jobs", "jobs")
        .with_filters([
            FilterDef::new("company", Scalar).normalized(Normalize::Lowercase),
            FilterDef::new("company.slug", Scalar)
                .alias_of("company")
                .normalized(Normalize::Lowercase),
            FilterDef::new("category", Scalar),
            FilterDef::new("category.slug", Scalar).alias_of("category"),
            FilterDef::new("jobtype", Scalar),
            FilterDef::new("jobtype.slug", Scalar).alias_of("jobtype"),
            FilterDef::new("location", Scalar).normalized(Normalize::Trim),
            FilterDef::new("location.slug", Scalar)
                .alias_of("location")
                .normalized(Normalize::Trim),
            FilterDef::new("remote_ok", Boolean),
            FilterDef::new("remote_only", Boolean),
            FilterDef::new("is_featured", Boolean),
            FilterDef::new("tags", Array),
        ])
        .with_fields([
            "id",
            "title",
            "slug",
            "company",
            "company.name",
            "company.slug",
            "location",
            "location.name",
            "location.slug",
            "category",
            "category.name",
            "category.slug",
            "jobtype",
            "jobtype.name",
            "jobtype.slug",
            "salary_min",
            "salary_max",
            "remote_only",
            "remote_ok",
            "remote_required_location",
            "apply_url",
            "published_at",
            "description_html",
            "is_featured",
            "tags",
            "published_url",
        ]);

    let company = ResourceDef::new(ResourceType::Company, "companies", "companies")
        .with_filters([FilterDef::new("keyword", Scalar).normalized(Normalize::Trim)])
        .with_fields([
            "id",
            "name",
            "site_url",
            "description",
            "logo",
            "linkedin_url",
            "twitter_handle",
            "active_jobs",
        ]);

    let taxonomy = ["id", "name", "slug", "job_count"];
    let location = ResourceDef::new(ResourceType::Location, "locations", "locations").with_fields(taxonomy);
    let category = ResourceDef::new(ResourceType::Category, "categories", "categories").with_fields(taxonomy);
    let jobtype = ResourceDef::new(ResourceType::JobType, "jobtypes", "jobtypes").with_fields(taxonomy);

    vec![job, company, location, category, jobtype]
}
