//! Single-keyword scan result.

use adintel_core::{AdRecord, AdvertiserEntry};
use adintel_crawler::{
    AdSearch, CrawlOptions, CrawlOutcome, CrawlState, CrawlerError, SearchRequest, StopReason,
};
use adintel_select::{aggregate_by_advertiser, rank_advertisers};
use chrono::NaiveDate;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    pub keyword: String,
    pub country: String,
    pub scan_date: NaiveDate,
    pub records: Vec<AdRecord>,
    /// Ranked best first.
    pub advertisers: Vec<AdvertiserEntry>,
    pub total_fetched: usize,
    pub selector_strategy: Option<String>,
    pub crawl_state: CrawlState,
    /// `None` when the crawl failed before it could run.
    pub stop_reason: Option<StopReason>,
    pub error: Option<String>,
}

impl ScanResult {
    /// Rank the advertisers of a finished crawl. Recency is measured from
    /// the newest launch date in the crawl, not from `scan_date`.
    #[must_use]
    pub fn from_outcome(
        outcome: CrawlOutcome,
        country: &str,
        scan_date: NaiveDate,
        recent_window_days: i64,
    ) -> Self {
        let advertisers = rank_advertisers(aggregate_by_advertiser(
            &outcome.records,
            None,
            recent_window_days,
        ));
        Self {
            keyword: outcome.request.label(),
            country: country.to_string(),
            scan_date,
            total_fetched: outcome.records.len(),
            selector_strategy: outcome.selector_strategy().map(str::to_string),
            crawl_state: outcome.state,
            stop_reason: Some(outcome.stop),
            error: None,
            advertisers,
            records: outcome.records,
        }
    }

    /// An empty, aborted scan carrying the crawl failure.
    #[must_use]
    pub fn failed(keyword: &str, country: &str, scan_date: NaiveDate, error: &CrawlerError) -> Self {
        Self {
            keyword: keyword.to_string(),
            country: country.to_string(),
            scan_date,
            records: Vec::new(),
            advertisers: Vec::new(),
            total_fetched: 0,
            selector_strategy: None,
            crawl_state: CrawlState::Aborted,
            stop_reason: None,
            error: Some(error.to_string()),
        }
    }
}

/// Crawl one keyword and rank its advertisers. A recoverable crawl failure
/// yields an empty scan, as it does inside a market run.
///
/// # Errors
///
/// Returns the crawler error only when it is not recoverable.
pub async fn scan_keyword(
    search: &dyn AdSearch,
    keyword: &str,
    options: &CrawlOptions,
    country: &str,
    scan_date: NaiveDate,
    recent_window_days: i64,
    cancel: &CancellationToken,
) -> Result<ScanResult, CrawlerError> {
    match search
        .search(&SearchRequest::keyword(keyword), options, cancel)
        .await
    {
        Ok(outcome) => Ok(ScanResult::from_outcome(
            outcome,
            country,
            scan_date,
            recent_window_days,
        )),
        Err(e) if e.is_recoverable() => {
            tracing::warn!(keyword = %keyword, error = %e, "keyword scan failed; no ads collected");
            Ok(ScanResult::failed(keyword, country, scan_date, &e))
        }
        Err(e) => Err(e),
    }
}
