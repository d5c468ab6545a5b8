//! Query builder: filters + pagination -> upstream query parameters.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::{ApiKey, FilterDef, FilterKind, Page, Pagination, ResourceDef, ValidationError, RESERVED_PARAMS};

/// Flat query parameters, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct QueryParams(BTreeMap<String, String>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A validated query: the outgoing parameters and the page they request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub params: QueryParams,
    pub page: Page,
}

/// Builds the query parameters for one search.
///
/// Adds `key`, `page`, and `limit`, then one parameter per non-null filter.
/// Fails on the first unknown key, mis-shaped value, or out-of-range page.
pub fn build_query(
    def: &ResourceDef,
    filters: &BTreeMap<String, Value>,
    pagination: Pagination,
    api_key: &ApiKey,
) -> Result<SearchQuery, ValidationError> {
    let resolved = def.resolve_pagination(pagination)?;
    let Page { page, limit } = resolved;

    let mut params = QueryParams::new();
    params.insert("key", api_key.expose());
    params.insert("page", page.to_string());
    params.insert("limit", limit.to_string());

    // Upstream parameter -> filter key that set it, for alias conflicts.
    let mut claimed: BTreeMap<&str, &str> = BTreeMap::new();

    for (key, value) in filters {
        let filter = def
            .filters
            .get(key)
            .filter(|_| !RESERVED_PARAMS.contains(&key.as_str()))
            .ok_or_else(|| ValidationError::UnknownFilter {
                resource: def.resource,
                key: key.clone(),
            })?;

        let Some(encoded) = encode_value(filter, value).ok_or_else(|| ValidationError::InvalidFilterValue {
            resource: def.resource,
            key: key.clone(),
            expected: filter.kind.expected(),
        })?
        else {
            continue;
        };

        if let Some(first) = claimed.insert(filter.param.as_str(), key.as_str()) {
            return Err(ValidationError::ConflictingFilters {
                resource: def.resource,
                param: filter.param.clone(),
                first: first.to_owned(),
                second: key.clone(),
            });
        }
        params.insert(filter.param.clone(), encoded);
    }

    debug!(resource = %def.resource, page, limit, filters = claimed.len(), "built query parameters");
    Ok(SearchQuery {
        params,
        page: resolved,
    })
}

/// Encodes one filter value.
///
/// `None` means the shape is wrong; `Some(None)` means the value is null and
/// the filter is dropped.
fn encode_value(filter: &FilterDef, value: &Value) -> Option<Option<String>> {
    if value.is_null() {
        return Some(None);
    }
    let encoded = match filter.kind {
        FilterKind::Scalar => encode_scalar(filter, value)?,
        FilterKind::Boolean => match value {
            Value::Bool(b) => b.to_string(),
            Value::String(s) if s.trim().eq_ignore_ascii_case("true") => "true".to_owned(),
            Value::String(s) if s.trim().eq_ignore_ascii_case("false") => "false".to_owned(),
            _ => return None,
        },
        FilterKind::Array => {
            let items: Vec<Value> = match value {
                Value::Array(items) => items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => Some(Value::String(filter.normalize.apply(s))),
                        Value::Number(_) | Value::Bool(_) => Some(item.clone()),
                        _ => None,
                    })
                    .collect::<Option<_>>()?,
                Value::String(s) => vec![Value::String(filter.normalize.apply(s))],
                _ => return None,
            };
            Value::Array(items).to_string()
        }
    };
    Some(Some(encoded))
}

fn encode_scalar(filter: &FilterDef, value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(filter.normalize.apply(s)),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Registry, ResourceType, DEFAULT_LIMIT};
    use serde_json::json;

    fn key() -> ApiKey {
        ApiKey::new("test-key").unwrap()
    }

    fn filters(value: Value) -> BTreeMap<String, Value> {
        serde_json::from_value(value).unwrap()
    }

    fn build(resource: ResourceType, f: Value) -> Result<QueryParams, ValidationError> {
        let registry = Registry::builtin();
        let def = registry.get(resource).unwrap();
        build_query(def, &filters(f), Pagination::default(), &key()).map(|q| q.params)
    }

    #[test]
    fn always_sets_key_page_and_limit() {
        let params = build(ResourceType::Location, json!({})).unwrap();
        assert_eq!(params.get("key"), Some("test-key"));
        assert_eq!(params.get("page"), Some("1"));
        assert_eq!(params.get("limit"), Some(DEFAULT_LIMIT.to_string().as_str()));
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn unknown_filter_fails_fast() {
        let err = build(ResourceType::Job, json!({"salary": 100})).unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnknownFilter {
                resource: ResourceType::Job,
                key: "salary".into()
            }
        );
    }

    #[test]
    fn reserved_names_are_not_filters() {
        let registry = Registry::builtin();
        let def = registry.get(ResourceType::Job).unwrap();
        for reserved in ["page", "limit", "key"] {
            let f = BTreeMap::from([(reserved.to_owned(), json!(2))]);
            let err = build_query(def, &f, Pagination::default(), &key()).unwrap_err();
            assert!(matches!(err, ValidationError::UnknownFilter { .. }), "{reserved}");
        }
    }

    #[test]
    fn keyword_only_accepted_for_companies() {
        let params = build(ResourceType::Company, json!({"keyword": " acme "})).unwrap();
        assert_eq!(params.get("keyword"), Some("acme"));

        let err = build(ResourceType::Job, json!({"keyword": "acme"})).unwrap_err();
        assert!(matches!(err, ValidationError::UnknownFilter { .. }));
    }

    #[test]
    fn array_filters_are_json_encoded() {
        let params = build(ResourceType::Job, json!({"tags": ["soc2", "iso27001"]})).unwrap();
        assert_eq!(params.get("tags"), Some(r#"["soc2","iso27001"]"#));

        let params = build(ResourceType::Job, json!({"tags": "soc2"})).unwrap();
        assert_eq!(params.get("tags"), Some(r#"["soc2"]"#));

        let err = build(ResourceType::Job, json!({"tags": [{"name": "soc2"}]})).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFilterValue { .. }));
    }

    #[test]
    fn boolean_filters_use_canonical_strings() {
        let params = build(ResourceType::Job, json!({"remote_ok": true, "is_featured": "FALSE"})).unwrap();
        assert_eq!(params.get("remote_ok"), Some("true"));
        assert_eq!(params.get("is_featured"), Some("false"));

        let err = build(ResourceType::Job, json!({"remote_only": "yes"})).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidFilterValue {
                resource: ResourceType::Job,
                key: "remote_only".into(),
                expected: "a boolean"
            }
        );
    }

    #[test]
    fn aliases_map_to_upstream_param_with_normalisation() {
        let params = build(
            ResourceType::Job,
            json!({"company.slug": "AcmeCorp", "location": "  Berlin "}),
        )
        .unwrap();
        assert_eq!(params.get("company"), Some("acmecorp"));
        assert_eq!(params.get("location"), Some("Berlin"));
        assert!(!params.contains("company.slug"));
    }

    #[test]
    fn alias_and_canonical_key_conflict() {
        let err = build(ResourceType::Job, json!({"company": "a", "company.slug": "b"})).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::ConflictingFilters { ref param, .. } if param == "company"
        ));
    }

    #[test]
    fn null_filters_are_dropped() {
        let params = build(ResourceType::Job, json!({"company": null})).unwrap();
        assert!(!params.contains("company"));
    }

    #[test]
    fn scalar_filters_reject_objects() {
        let err = build(ResourceType::Job, json!({"category": {"slug": "audit"}})).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFilterValue { .. }));
    }

    #[test]
    fn resolved_page_matches_the_sent_parameters() {
        let registry = Registry::builtin();
        let def = registry.get(ResourceType::Company).unwrap();
        let query = build_query(
            def,
            &BTreeMap::new(),
            Pagination { page: Some(3), limit: None },
            &key(),
        )
        .unwrap();
        assert_eq!(query.page, Page { page: 3, limit: DEFAULT_LIMIT });
        assert_eq!(query.params.get("page"), Some("3"));
        assert_eq!(query.params.get("limit"), Some(DEFAULT_LIMIT.to_string().as_str()));
    }

    #[test]
    fn out_of_range_limit_is_rejected() {
        let registry = Registry::builtin();
        let def = registry.get(ResourceType::Job).unwrap();
        let err = build_query(
            def,
            &BTreeMap::new(),
            Pagination { page: None, limit: Some(1000) },
            &key(),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::LimitOutOfRange { limit: 1000, .. }));
    }
}
