//! Search requests as callers build them.
//!
//! Nothing here is validated on construction; the service checks the request
//! against the registry before any network call.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{DisplayMode, Pagination, ResourceType};

/// Everything about a search except which resource it targets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    /// Filter key -> value. Keys and value shapes are checked against the
    /// resource's filter spec.
    pub filters: BTreeMap<String, Value>,
    /// Dot-notation field paths to keep. Empty means every schema field.
    pub fields: Vec<String>,
    pub display: DisplayMode,
    pub pagination: Pagination,
    /// Overrides the service's sample size for [`DisplayMode::ShowN`].
    pub sample_size: Option<usize>,
}

impl SearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    pub fn field(mut self, path: impl Into<String>) -> Self {
        self.fields.push(path.into());
        self
    }

    pub fn fields<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn display(mut self, display: DisplayMode) -> Self {
        self.display = display;
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.pagination.page = Some(page);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.pagination.limit = Some(limit);
        self
    }

    pub fn sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = Some(sample_size);
        self
    }
}

/// A search against one resource type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub resource: ResourceType,
    #[serde(flatten)]
    pub options: SearchOptions,
}

impl SearchRequest {
    pub fn new(resource: ResourceType, options: SearchOptions) -> Self {
        Self { resource, options }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder_collects_options() {
        let options = SearchOptions::new()
            .filter("remote_ok", true)
            .fields(["title", "company.name"])
            .display(DisplayMode::ShowN)
            .page(2)
            .limit(10)
            .sample_size(3);

        assert_eq!(options.filters["remote_ok"], json!(true));
        assert_eq!(options.fields, vec!["title", "company.name"]);
        assert_eq!(options.pagination, Pagination { page: Some(2), limit: Some(10) });
        assert_eq!(options.sample_size, Some(3));
    }

    #[test]
    fn request_deserialises_from_flat_json() {
        let request: SearchRequest = serde_json::from_value(json!({
            "resource": "company",
            "filters": {"keyword": "acme"},
            "display": "all"
        }))
        .unwrap();
        assert_eq!(request.resource, ResourceType::Company);
        assert_eq!(request.options.display, DisplayMode::All);
        assert!(request.options.fields.is_empty());
    }
}
