//! The transport port.
//!
//! The search domain never performs I/O itself. It asks a [`Transport`] to
//! execute a request and receives the decoded JSON body or a classified
//! [`TransportError`]. Infrastructure crates supply the implementation
//! (reqwest over HTTPS); tests supply scripted stubs.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::{QueryParams, TransportError};

/// HTTP methods the job-board API uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Executes one request against the API.
///
/// Implementations return the decoded JSON payload unmodified and classify
/// failures per [`TransportError::from_status`]. They must be safe to call
/// concurrently.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(
        &self,
        method: HttpMethod,
        path: &str,
        query: &QueryParams,
        body: Option<&Value>,
    ) -> Result<Value, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn execute(
        &self,
        method: HttpMethod,
        path: &str,
        query: &QueryParams,
        body: Option<&Value>,
    ) -> Result<Value, TransportError> {
        (**self).execute(method, path, query, body).await
    }
}
