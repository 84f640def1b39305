//! Integration tests for `Crawler` and `crawl_many` against a fake browser.
//!
//! The fake engine serves canned result pages keyed on the search URL, so the
//! full path from request to URL to discovery to extraction runs without
//! Chromium.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use adintel_core::SearchFilters;
use adintel_crawler::{
    crawl_many, AdSearch, BrowserEngine, CrawlOptions, Crawler, CrawlerError, DomSnapshot,
    PageContext, SearchRequest, StopReason,
};

const COPY: &str = "Our blend of magnesium and botanicals helps you fall asleep faster and \
wake up rested. Thousands of customers switched this year and they are not looking back.";

fn card(ad_id: &str, page_name: &str) -> String {
    format!(
        r#"<div class="xh8yej3">
  <span>Library ID: {ad_id}</span>
  <span>Started running on Mar 2, 2025</span>
  <a href="https://www.facebook.com/p/?view_all_page_id=4242424242">{page_name}</a>
  <div style="white-space: pre-wrap">{COPY}</div>
  <a href="https://shop.example.com/p"><img src="https://cdn.example.net/{ad_id}.jpg"></a>
  <a href="https://www.facebook.com/ads/library/?id={ad_id}">See ad details</a>
</div>"#
    )
}

fn results_page(ids: &[&str], page_name: &str) -> String {
    let cards: Vec<String> = ids.iter().map(|id| card(id, page_name)).collect();
    format!(
        "<html><body><div class=\"x78zum5\">{}</div></body></html>",
        cards.join("\n")
    )
}

#[derive(Default)]
struct Gauge {
    active: AtomicUsize,
    peak: AtomicUsize,
    opened: AtomicUsize,
}

/// Serves one fixed page per query; queries containing "broken" fail to load.
/// Pages need at least two cards for the ad-link strategy to find them.
struct FakeEngine {
    pages: HashMap<String, String>,
    gauge: Arc<Gauge>,
}

impl FakeEngine {
    fn new(pages: &[(&str, String)]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|(q, html)| ((*q).to_string(), html.clone()))
                .collect(),
            gauge: Arc::new(Gauge::default()),
        }
    }
}

#[async_trait]
impl BrowserEngine for FakeEngine {
    async fn open_context(&self) -> Result<Box<dyn PageContext>, CrawlerError> {
        let now = self.gauge.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.gauge.peak.fetch_max(now, Ordering::SeqCst);
        self.gauge.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakePage {
            pages: self.pages.clone(),
            html: String::new(),
            gauge: Arc::clone(&self.gauge),
        }))
    }
}

struct FakePage {
    pages: HashMap<String, String>,
    html: String,
    gauge: Arc<Gauge>,
}

#[async_trait]
impl PageContext for FakePage {
    async fn navigate(&mut self, url: &str, _timeout: Duration) -> Result<(), CrawlerError> {
        tokio::time::sleep(Duration::from_millis(20)).await;
        if url.contains("broken") {
            return Err(CrawlerError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_CONNECTION_RESET".to_string(),
            });
        }
        self.html = self
            .pages
            .iter()
            .find(|(q, _)| url.contains(&format!("q={q}&")))
            .map_or_else(|| "<html><body></body></html>".to_string(), |(_, h)| h.clone());
        Ok(())
    }

    async fn snapshot(&mut self) -> Result<DomSnapshot, CrawlerError> {
        Ok(DomSnapshot::from_html(&self.html))
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), CrawlerError> {
        Ok(())
    }

    async fn click_by_label(&mut self, _labels: &[&str]) -> Result<bool, CrawlerError> {
        Ok(false)
    }

    async fn close(self: Box<Self>) -> Result<(), CrawlerError> {
        self.gauge.active.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

fn options() -> CrawlOptions {
    CrawlOptions {
        max_ads: 50,
        max_scroll_attempts: 5,
        max_stale_rounds: 1,
        scroll_pause: Duration::ZERO,
        step_timeout: Duration::from_secs(5),
    }
}

// ---------------------------------------------------------------------------
// Single search
// ---------------------------------------------------------------------------

#[tokio::test]
async fn search_extracts_records_from_results_page() {
    let engine = FakeEngine::new(&[(
        "sleep",
        results_page(&["1111111111111", "2222222222222"], "Sleep Well Co"),
    )]);
    let gauge = Arc::clone(&engine.gauge);
    let crawler = Crawler::new(Arc::new(engine), 2, SearchFilters::default());

    let outcome = crawler
        .search(
            &SearchRequest::keyword("sleep"),
            &options(),
            &CancellationToken::new(),
        )
        .await
        .expect("search should succeed");

    assert_eq!(outcome.records.len(), 2);
    assert_eq!(outcome.records[0].ad_id, "1111111111111");
    assert_eq!(outcome.records[0].page_name, "Sleep Well Co");
    assert_eq!(outcome.stop, StopReason::StaleRounds);
    assert_eq!(gauge.active.load(Ordering::SeqCst), 0, "context must be closed");
}

#[tokio::test]
async fn navigation_failure_still_closes_context() {
    let engine = FakeEngine::new(&[]);
    let gauge = Arc::clone(&engine.gauge);
    let crawler = Crawler::new(Arc::new(engine), 1, SearchFilters::default());

    let err = crawler
        .search(
            &SearchRequest::keyword("broken"),
            &options(),
            &CancellationToken::new(),
        )
        .await
        .expect_err("navigation should fail");

    assert!(matches!(err, CrawlerError::Navigation { .. }));
    assert_eq!(gauge.active.load(Ordering::SeqCst), 0);
}

// ---------------------------------------------------------------------------
// crawl_many
// ---------------------------------------------------------------------------

#[tokio::test]
async fn crawl_many_preserves_order_and_bounds_contexts() {
    let queries = ["alpha", "bravo", "charlie", "delta", "echo"];
    let pages: Vec<(&str, String)> = queries
        .iter()
        .enumerate()
        .map(|(i, q)| {
            let first = format!("{}", 5_000_000_000_000_u64 + i as u64);
            let second = format!("{}", 6_000_000_000_000_u64 + i as u64);
            (*q, results_page(&[first.as_str(), second.as_str()], "Sleep Well Co"))
        })
        .collect();
    let engine = FakeEngine::new(&pages);
    let gauge = Arc::clone(&engine.gauge);
    let crawler = Crawler::new(Arc::new(engine), 2, SearchFilters::default());

    let requests = queries.iter().map(|q| SearchRequest::keyword(*q)).collect();
    let results = crawl_many(&crawler, requests, &options(), &CancellationToken::new()).await;

    let labels: Vec<String> = results.iter().map(|(r, _)| r.label()).collect();
    assert_eq!(labels, queries);
    for (i, (_, result)) in results.iter().enumerate() {
        let outcome = result.as_ref().expect("every search should succeed");
        assert_eq!(
            outcome.records[0].ad_id,
            format!("{}", 5_000_000_000_000_u64 + i as u64)
        );
    }
    assert!(gauge.peak.load(Ordering::SeqCst) <= 2);
    assert_eq!(gauge.opened.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn crawl_many_isolates_failures() {
    let engine = FakeEngine::new(&[("sleep", results_page(&["3333333333333", "4444444444444"], "Sleep Well Co"))]);
    let crawler = Crawler::new(Arc::new(engine), 3, SearchFilters::default());

    let requests = vec![
        SearchRequest::keyword("sleep"),
        SearchRequest::keyword("broken"),
        SearchRequest::keyword("unknown"),
    ];
    let results = crawl_many(&crawler, requests, &options(), &CancellationToken::new()).await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].1.as_ref().unwrap().records.len(), 2);
    assert!(results[1].1.is_err());
    assert!(results[2].1.as_ref().unwrap().records.is_empty());
}

#[tokio::test]
async fn crawl_many_after_cancel_starts_nothing() {
    let engine = FakeEngine::new(&[]);
    let gauge = Arc::clone(&engine.gauge);
    let crawler = Crawler::new(Arc::new(engine), 2, SearchFilters::default());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let requests = vec![SearchRequest::keyword("a"), SearchRequest::keyword("b")];
    let results = crawl_many(&crawler, requests, &options(), &cancel).await;

    assert!(results
        .iter()
        .all(|(_, r)| matches!(r, Err(CrawlerError::Cancelled))));
    assert_eq!(gauge.opened.load(Ordering::SeqCst), 0);
}
