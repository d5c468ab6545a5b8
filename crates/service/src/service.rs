//! The search service: one validated, retried, shaped search per call.

use std::sync::Arc;
use std::time::Duration;

use search::{
    breakdown, build_query, enrich_job, DisplayFormatter, FetchedPage, HttpMethod, Registry, ResourceType,
    ResultHeader, SampleSize, SearchError, SearchId, SearchOptions, SearchRequest, SearchResult, Transport,
    ValidationError,
};
use tokio::time::Instant;
use tracing::{debug, info, info_span, Instrument};

use crate::{RetryPolicy, RetryingTransport, ServiceConfig};

/// Runs searches against the job-board API.
///
/// Holds only immutable configuration, the registry, and the transport, so a
/// single instance can serve concurrent callers. Every call follows the same
/// sequence:
///
/// 1. Resolve the resource in the registry.
/// 2. Validate requested fields and the sample size.
/// 3. Build query parameters (unknown filters and bad pagination fail here).
/// 4. Execute the request through the retrying transport.
/// 5. Decode the page, enrich jobs, compute stats and the breakdown.
/// 6. Project only the entries the display mode returns and assemble the
///    envelope.
///
/// Steps 1-3 never touch the network.
#[derive(Debug)]
pub struct SearchService<T> {
    config: ServiceConfig,
    registry: Arc<Registry>,
    transport: RetryingTransport<T>,
}

impl<T: Transport> SearchService<T> {
    /// Wraps `transport` in `policy` and binds it to the configuration and
    /// registry.
    pub fn new(config: ServiceConfig, registry: impl Into<Arc<Registry>>, transport: T, policy: RetryPolicy) -> Self {
        Self {
            config,
            registry: registry.into(),
            transport: RetryingTransport::new(transport, policy),
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn transport(&self) -> &RetryingTransport<T> {
        &self.transport
    }

    /// Runs one search.
    ///
    /// # Errors
    ///
    /// - [`SearchError::Validation`] for anything the registry rejects; no
    ///   request is sent.
    /// - [`SearchError::PermanentHttp`] after a single 4xx (other than 429).
    /// - [`SearchError::RetryExhausted`] when every attempt failed transiently.
    /// - [`SearchError::Decode`] when the payload is not a result list.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResult, SearchError> {
        let id = SearchId::new_random();
        let span = info_span!("search", search_id = %id, resource = %request.resource);
        self.run(id, request).instrument(span).await
    }

    /// Like [`search`](Self::search), but gives up once `deadline` has elapsed.
    ///
    /// The deadline covers validation, every attempt, and every backoff sleep.
    /// A request already in flight is abandoned at the deadline.
    pub async fn search_with_deadline(
        &self,
        request: &SearchRequest,
        deadline: Duration,
    ) -> Result<SearchResult, SearchError> {
        let started = Instant::now();
        match tokio::time::timeout(deadline, self.search(request)).await {
            Ok(result) => result,
            Err(_) => Err(SearchError::DeadlineExceeded {
                elapsed: started.elapsed(),
            }),
        }
    }

    pub async fn search_jobs(&self, options: SearchOptions) -> Result<SearchResult, SearchError> {
        self.search(&SearchRequest::new(ResourceType::Job, options)).await
    }

    pub async fn search_companies(&self, options: SearchOptions) -> Result<SearchResult, SearchError> {
        self.search(&SearchRequest::new(ResourceType::Company, options)).await
    }

    pub async fn search_locations(&self, options: SearchOptions) -> Result<SearchResult, SearchError> {
        self.search(&SearchRequest::new(ResourceType::Location, options)).await
    }

    pub async fn search_categories(&self, options: SearchOptions) -> Result<SearchResult, SearchError> {
        self.search(&SearchRequest::new(ResourceType::Category, options)).await
    }

    pub async fn search_jobtypes(&self, options: SearchOptions) -> Result<SearchResult, SearchError> {
        self.search(&SearchRequest::new(ResourceType::JobType, options)).await
    }

    async fn run(&self, id: SearchId, request: &SearchRequest) -> Result<SearchResult, SearchError> {
        let options = &request.options;

        // Validation: nothing below this block runs for a rejected request.
        let def = self.registry.get(request.resource)?;
        let projection = def.fields.resolve(request.resource, &options.fields)?;
        let formatter = DisplayFormatter::new(self.sample_size(options)?);
        let query = build_query(def, &options.filters, options.pagination, &self.config.api_key)?;

        debug!(endpoint = %def.endpoint, display = %options.display, "sending search request");
        let payload = self
            .transport
            .execute(HttpMethod::Get, &def.endpoint, &query.params, None)
            .await?;

        let mut fetched = FetchedPage::decode(payload, &def.collection_key)?;
        if request.resource == ResourceType::Job {
            for entry in &mut fetched.entries {
                enrich_job(entry, &self.config.base_url);
            }
        }

        let stats = fetched.stats(query.page);
        let header = ResultHeader {
            id,
            resource: request.resource,
            display: options.display,
        };
        let result = formatter.assemble(
            header,
            stats,
            breakdown(request.resource, &fetched.entries),
            &fetched.entries,
            &projection,
        );

        info!(
            total = result.stats.total,
            fetched = result.stats.fetched,
            returned = result.entries.len(),
            "search completed"
        );
        Ok(result)
    }

    fn sample_size(&self, options: &SearchOptions) -> Result<SampleSize, ValidationError> {
        match options.sample_size {
            None => Ok(self.config.sample_size),
            Some(n) => SampleSize::new(n).ok_or(ValidationError::SampleSizeOutOfRange { sample_size: n }),
        }
    }
}
