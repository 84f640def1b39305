//! Browser abstraction.
//!
//! The crawl loop only needs a handful of page operations, so it is written
//! against [`PageContext`] and never touches a browser driver directly. The
//! Chromium implementation lives in [`crate::chromium`]; tests drive the loop
//! with scripted contexts.

use async_trait::async_trait;
use std::time::Duration;

use crate::dom::DomSnapshot;
use crate::error::CrawlerError;

/// Button labels that dismiss cookie and consent dialogs.
pub const CONSENT_LABELS: [&str; 5] = [
    "Allow all cookies",
    "Accept All",
    "Allow essential and optional cookies",
    "Only allow essential cookies",
    "Decline optional cookies",
];

/// Text or aria-labels of controls that load another page of results.
pub const LOAD_MORE_LABELS: [&str; 5] = [
    "See more results",
    "See more",
    "Load more",
    "Show more",
    "More results",
];

/// A browser that hands out isolated page contexts.
#[async_trait]
pub trait BrowserEngine: Send + Sync {
    async fn open_context(&self) -> Result<Box<dyn PageContext>, CrawlerError>;
}

/// One isolated tab. Owned by exactly one crawl at a time.
#[async_trait]
pub trait PageContext: Send {
    /// Navigate and wait for the document to load.
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), CrawlerError>;

    async fn snapshot(&mut self) -> Result<DomSnapshot, CrawlerError>;

    async fn scroll_to_bottom(&mut self) -> Result<(), CrawlerError>;

    /// Click the first visible control whose text or aria-label matches one
    /// of `labels` (case-insensitive). Returns whether anything was clicked.
    async fn click_by_label(&mut self, labels: &[&str]) -> Result<bool, CrawlerError>;

    async fn close(self: Box<Self>) -> Result<(), CrawlerError>;
}
