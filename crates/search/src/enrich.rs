//! Derived fields added to raw entries before projection.

use serde_json::Value;

use crate::{BaseUrl, Entry};

/// Adds `published_url` (`{origin}/job/{id}-{slug}`) to a raw job entry.
///
/// Entries without an `id` or `slug` are left unchanged.
pub fn enrich_job(entry: &mut Entry, base_url: &BaseUrl) {
    let id = match entry.get("id") {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        _ => return,
    };
    let Some(slug) = entry.get("slug").and_then(Value::as_str).filter(|s| !s.is_empty()) else {
        return;
    };
    let url = format!("{}/job/{id}-{slug}", base_url.origin());
    entry.insert("published_url".to_owned(), Value::String(url));
}
