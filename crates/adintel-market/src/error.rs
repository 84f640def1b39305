use adintel_crawler::CrawlerError;
use thiserror::Error;

/// Failures reported by an [`crate::AnalysisService`] backend.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("analysis backend unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum MarketError {
    #[error("market keyword must not be empty")]
    EmptyKeyword,

    /// A browser-level failure. Per-query crawl failures never surface here.
    #[error("crawler failed: {0}")]
    Crawler(#[from] CrawlerError),
}
