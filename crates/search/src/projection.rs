//! Dot-path field projection over nested entries.
//!
//! A [`Projection`] reduces an [`Entry`] to a set of [`FieldPath`]s and
//! rebuilds the nesting in the output:
//!
//! ```text
//! paths:  ["title", "company.name", "company.slug"]
//! source: {"id": 1, "title": "Engineer", "company": {"name": "Acme", "slug": "acme", "logo": "..."}}
//! output: {"title": "Engineer", "company": {"name": "Acme", "slug": "acme"}}
//! ```
//!
//! Projection is total. A path whose segments cannot be followed in the
//! source (missing key, or a non-object on the way down) is left out of the
//! output; nothing else is affected.

use serde_json::{Map, Value};

use crate::Entry;

/// A validated dot-separated field path such as `"company.name"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldPath(String);

impl FieldPath {
    /// Parses a path, returning `None` if it is empty or has an empty segment
    /// (`".name"`, `"company..name"`, `"company."`).
    pub fn parse(path: &str) -> Option<Self> {
        let path = path.trim();
        if path.is_empty() || path.split('.').any(str::is_empty) {
            return None;
        }
        Some(Self(path.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path segments in order, outermost first.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// Returns `true` for paths with more than one segment.
    pub fn is_nested(&self) -> bool {
        self.0.contains('.')
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An ordered set of field paths to keep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection {
    paths: Vec<FieldPath>,
}

impl Projection {
    pub fn new(paths: Vec<FieldPath>) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &[FieldPath] {
        &self.paths
    }

    /// Returns a new entry holding only the projected paths.
    pub fn apply(&self, entry: &Entry) -> Entry {
        let mut out = Map::new();
        for path in &self.paths {
            let segments: Vec<&str> = path.segments().collect();
            if let Some(value) = lookup(entry, &segments) {
                insert(&mut out, &segments, value);
            }
        }
        out
    }
}

/// Follows `segments` through nested objects.
fn lookup<'a>(entry: &'a Entry, segments: &[&str]) -> Option<&'a Value> {
    let (last, parents) = segments.split_last()?;
    let mut current = entry;
    for segment in parents {
        current = current.get(*segment)?.as_object()?;
    }
    current.get(*last)
}

/// Writes `value` at `segments`, creating intermediate objects as needed.
///
/// A whole sub-object copied by a shorter path always contains every child a
/// longer path would add, so overwriting at the final segment and walking
/// into existing objects on the way down give the same result in any order.
fn insert(out: &mut Entry, segments: &[&str], value: &Value) {
    let Some((last, parents)) = segments.split_last() else {
        return;
    };
    let mut current = out;
    for segment in parents {
        let slot = current
            .entry((*segment).to_owned())
            .or_insert_with(|| Value::Object(Map::new()));
        current = match slot {
            Value::Object(map) => map,
            _ => return,
        };
    }
    current.insert((*last).to_owned(), value.clone());
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(value: Value) -> Entry {
        match value {
            Value::Object(map) => map,
            other => panic!("fixture must be an object, got {other}"),
        }
    }

    fn projection(paths: &[&str]) -> Projection {
        Projection::new(paths.iter().map(|p| FieldPath::parse(p).unwrap()).collect())
    }

    fn job() -> Entry {
        entry(json!({
            "id": 7,
            "title": "Auditor",
            "company": {"name": "Acme", "slug": "acme", "site_url": "https://acme.test"},
            "location": null,
            "tags": ["soc2", "iso"]
        }))
    }

    #[test]
    fn field_path_rejects_empty_segments() {
        assert!(FieldPath::parse("").is_none());
        assert!(FieldPath::parse(".name").is_none());
        assert!(FieldPath::parse("company..name").is_none());
        assert!(FieldPath::parse("company.").is_none());
        assert!(FieldPath::parse("company.name").unwrap().is_nested());
        assert!(!FieldPath::parse("title").unwrap().is_nested());
    }

    #[test]
    fn top_level_paths_copy_unchanged() {
        let out = projection(&["title", "tags"]).apply(&job());
        assert_eq!(
            Value::Object(out),
            json!({"title": "Auditor", "tags": ["soc2", "iso"]})
        );
    }

    #[test]
    fn shared_prefixes_merge_into_one_object() {
        let out = projection(&["company.name", "company.site_url"]).apply(&job());
        assert_eq!(
            Value::Object(out),
            json!({"company": {"name": "Acme", "site_url": "https://acme.test"}})
        );
    }

    #[test]
    fn missing_paths_are_omitted() {
        let out = projection(&["title", "salary_min", "company.logo", "location.name"]).apply(&job());
        assert_eq!(Value::Object(out), json!({"title": "Auditor"}));
    }

    #[test]
    fn null_leaf_values_are_kept() {
        let out = projection(&["location"]).apply(&job());
        assert_eq!(Value::Object(out), json!({"location": null}));
    }

    #[test]
    fn walking_through_a_scalar_is_omitted() {
        let out = projection(&["title.length", "tags.0"]).apply(&job());
        assert!(out.is_empty());
    }

    #[test]
    fn whole_object_wins_regardless_of_order() {
        let full = json!({"company": {"name": "Acme", "slug": "acme", "site_url": "https://acme.test"}});

        let out = projection(&["company.name", "company"]).apply(&job());
        assert_eq!(Value::Object(out), full);

        let out = projection(&["company", "company.name"]).apply(&job());
        assert_eq!(Value::Object(out), full);
    }

    #[test]
    fn projection_is_idempotent() {
        let p = projection(&["title", "company.name", "location.slug"]);
        let once = p.apply(&job());
        let twice = p.apply(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_projection_yields_empty_entry() {
        assert!(Projection::default().apply(&job()).is_empty());
    }
}
