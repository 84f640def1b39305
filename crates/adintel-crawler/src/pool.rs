//! Bounded pool of concurrent crawls.
//!
//! A crawl owns one browser context for its whole life. At most
//! `max_contexts` contexts are open at once across every caller sharing a
//! [`Crawler`]; the semaphore enforces this even when several batches run
//! concurrently.

use std::sync::Arc;

use adintel_core::SearchFilters;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::browser::BrowserEngine;
use crate::discovery::SelectorDiscovery;
use crate::error::CrawlerError;
use crate::pagination::{CrawlOptions, CrawlOutcome, PaginationCrawler};
use crate::search::SearchRequest;

/// Anything that can run one search request to completion.
#[async_trait]
pub trait AdSearch: Send + Sync {
    async fn search(
        &self,
        request: &SearchRequest,
        options: &CrawlOptions,
        cancel: &CancellationToken,
    ) -> Result<CrawlOutcome, CrawlerError>;

    /// How many searches may usefully run at once.
    fn max_concurrency(&self) -> usize;
}

pub struct Crawler {
    engine: Arc<dyn BrowserEngine>,
    permits: Arc<Semaphore>,
    max_contexts: usize,
    filters: SearchFilters,
    discovery: SelectorDiscovery,
}

impl Crawler {
    #[must_use]
    pub fn new(engine: Arc<dyn BrowserEngine>, max_contexts: usize, filters: SearchFilters) -> Self {
        let max_contexts = max_contexts.max(1);
        Self {
            engine,
            permits: Arc::new(Semaphore::new(max_contexts)),
            max_contexts,
            filters,
            discovery: SelectorDiscovery::default(),
        }
    }

    #[must_use]
    pub fn filters(&self) -> &SearchFilters {
        &self.filters
    }
}

#[async_trait]
impl AdSearch for Crawler {
    async fn search(
        &self,
        request: &SearchRequest,
        options: &CrawlOptions,
        cancel: &CancellationToken,
    ) -> Result<CrawlOutcome, CrawlerError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| CrawlerError::ContextOpen(e.to_string()))?;

        let url = request.url(&self.filters);
        tracing::debug!(request = %request.label(), url = %url, "opening browser context");
        let mut ctx = self.engine.open_context().await?;

        let result = PaginationCrawler::new(&self.discovery, options, cancel)
            .run(ctx.as_mut(), request, &url)
            .await;

        if let Err(e) = ctx.close().await {
            tracing::debug!(request = %request.label(), error = %e, "failed to close browser context");
        }
        result
    }

    fn max_concurrency(&self) -> usize {
        self.max_contexts
    }
}

/// Run every request, at most `max_concurrency` at a time, returning results
/// in request order. Failures are returned per request, never short-circuit.
pub async fn crawl_many(
    search: &dyn AdSearch,
    requests: Vec<SearchRequest>,
    options: &CrawlOptions,
    cancel: &CancellationToken,
) -> Vec<(SearchRequest, Result<CrawlOutcome, CrawlerError>)> {
    let concurrency = search.max_concurrency().max(1);
    let mut results: Vec<(usize, SearchRequest, Result<CrawlOutcome, CrawlerError>)> =
        stream::iter(requests.into_iter().enumerate())
            .map(|(idx, request)| async move {
                let result = if cancel.is_cancelled() {
                    Err(CrawlerError::Cancelled)
                } else {
                    search.search(&request, options, cancel).await
                };
                if let Err(e) = &result {
                    tracing::warn!(request = %request.label(), error = %e, "search request failed");
                }
                (idx, request, result)
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

    results.sort_by_key(|(idx, _, _)| *idx);
    results
        .into_iter()
        .map(|(_, request, result)| (request, result))
        .collect()
}
