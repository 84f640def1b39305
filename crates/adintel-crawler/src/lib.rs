pub mod browser;
pub mod chromium;
pub mod discovery;
pub mod dom;
pub mod error;
pub mod extract;
pub mod pagination;
pub mod pool;
pub mod search;
pub mod session;

#[cfg(test)]
mod test_support;

pub use browser::{BrowserEngine, PageContext};
pub use chromium::{find_chromium, BrowserSettings, ChromiumEngine};
pub use discovery::{CardSelector, Discovery, DiscoveryStrategy, SelectorDiscovery};
pub use dom::DomSnapshot;
pub use error::CrawlerError;
pub use extract::extract_records;
pub use pagination::{CrawlOptions, CrawlOutcome, CrawlState, PaginationCrawler, StopReason};
pub use pool::{crawl_many, AdSearch, Crawler};
pub use search::SearchRequest;
pub use session::CrawlSession;
