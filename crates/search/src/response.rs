//! Decoding of upstream list responses.
//!
//! The API wraps every list in a `results` object:
//!
//! ```json
//! {"results": {"jobs": [ ... ], "total_count": 120, "page": 2, "total_pages": 4}}
//! ```
//!
//! Pagination fields are optional. A missing list is an empty page; a
//! `results` value that is not an object, or list items that are not
//! objects, are decode errors.

use serde_json::Value;

use crate::{Entry, Page, ResultStats, SearchError};

/// One page of raw entries plus whatever pagination metadata the server sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchedPage {
    pub entries: Vec<Entry>,
    pub total: Option<u64>,
    pub page: Option<u32>,
    pub total_pages: Option<u32>,
}

impl FetchedPage {
    /// Extracts the entry list stored under `results.<collection_key>`.
    pub fn decode(payload: Value, collection_key: &str) -> Result<Self, SearchError> {
        let mut results = match payload {
            Value::Object(mut root) => match root.remove("results") {
                Some(Value::Object(results)) => results,
                None | Some(Value::Null) => return Ok(Self::default()),
                Some(other) => return Err(decode_error(format!("'results' is {}, expected an object", kind(&other)))),
            },
            other => return Err(decode_error(format!("response is {}, expected an object", kind(&other)))),
        };

        let entries = match results.remove(collection_key) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .into_iter()
                .enumerate()
                .map(|(idx, item)| match item {
                    Value::Object(entry) => Ok(entry),
                    other => Err(decode_error(format!(
                        "'{collection_key}[{idx}]' is {}, expected an object",
                        kind(&other)
                    ))),
                })
                .collect::<Result<_, _>>()?,
            Some(other) => {
                return Err(decode_error(format!(
                    "'{collection_key}' is {}, expected a list",
                    kind(&other)
                )))
            }
        };

        let number = |name: &str| results.get(name).and_then(Value::as_u64);
        Ok(Self {
            entries,
            total: number("total_count").or_else(|| number("total")),
            page: number("page").and_then(|p| u32::try_from(p).ok()),
            total_pages: number("total_pages").and_then(|p| u32::try_from(p).ok()),
        })
    }

    /// Stats for this page, falling back to the request for anything the
    /// server did not report.
    pub fn stats(&self, requested: Page) -> ResultStats {
        ResultStats {
            total: self.total.unwrap_or(self.entries.len() as u64),
            page: self.page.unwrap_or(requested.page),
            limit: requested.limit,
            total_pages: self.total_pages,
            fetched: self.entries.len(),
        }
    }
}

fn decode_error(message: String) -> SearchError {
    SearchError::Decode { message }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
