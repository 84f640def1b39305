use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("browser executable not found; set ADINTEL_CHROMIUM_PATH")]
    BrowserNotFound,

    #[error("failed to launch browser: {0}")]
    BrowserLaunch(String),

    #[error("failed to open browser context: {0}")]
    ContextOpen(String),

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("navigation to {url} timed out after {timeout_secs}s")]
    NavigationTimeout { url: String, timeout_secs: u64 },

    #[error("page script failed: {0}")]
    Script(String),

    #[error("failed to decode DOM snapshot: {0}")]
    SnapshotDecode(#[from] serde_json::Error),

    #[error("invalid DOM snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("crawl cancelled before it started")]
    Cancelled,
}

impl CrawlerError {
    /// Errors that end the current crawl but leave the browser usable.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::BrowserNotFound | Self::BrowserLaunch(_))
    }
}
