//! Infinite-scroll crawl loop for one search request.
//!
//! ```text
//! Initializing -> Loading -> Extracting <-> ScrollingForMore -> Exhausted
//!                                  \                              Aborted
//! ```
//!
//! Each round extracts the visible cards, merges them into the session and
//! scrolls. A round that surfaces no unseen ids tries a "load more" control;
//! a successful click resets the stale counter, otherwise it grows. The
//! crawl ends on the target count, on `max_stale_rounds` consecutive stale
//! rounds, on the scroll cap, or on cancellation.

use std::time::Duration;

use adintel_core::{AdRecord, CrawlerSettings};
use chrono::Utc;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::browser::{PageContext, CONSENT_LABELS, LOAD_MORE_LABELS};
use crate::discovery::{CardSelector, Discovery, SelectorDiscovery};
use crate::error::CrawlerError;
use crate::extract::extract_records;
use crate::search::SearchRequest;
use crate::session::CrawlSession;

#[derive(Debug, Clone, PartialEq)]
pub struct CrawlOptions {
    pub max_ads: usize,
    pub max_scroll_attempts: u32,
    pub max_stale_rounds: u32,
    pub scroll_pause: Duration,
    /// Bound on navigation and on every individual page operation.
    pub step_timeout: Duration,
}

impl CrawlOptions {
    /// Options for a broad keyword scan.
    #[must_use]
    pub fn scan(settings: &CrawlerSettings, step_timeout: Duration) -> Self {
        Self {
            max_ads: settings.max_ads,
            max_scroll_attempts: settings.max_scroll_attempts,
            max_stale_rounds: settings.max_stale_rounds,
            scroll_pause: Duration::from_millis(settings.scroll_pause_ms),
            step_timeout,
        }
    }

    /// Options for deep brand searches, with the elevated cap and scroll budget.
    #[must_use]
    pub fn deep(settings: &CrawlerSettings, step_timeout: Duration) -> Self {
        Self {
            max_ads: settings.deep_max_ads,
            max_scroll_attempts: settings.deep_max_scroll_attempts,
            ..Self::scan(settings, step_timeout)
        }
    }

    #[must_use]
    pub fn with_max_ads(mut self, max_ads: usize) -> Self {
        self.max_ads = max_ads;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlState {
    Initializing,
    Loading,
    Extracting,
    ScrollingForMore,
    Exhausted,
    Aborted,
}

/// Why a crawl stopped. Every reason but `Cancelled` ends `Exhausted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    TargetReached,
    StaleRounds,
    ScrollCap,
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub request: SearchRequest,
    /// Ordered by `scrape_position`, truncated to `max_ads`.
    pub records: Vec<AdRecord>,
    pub state: CrawlState,
    pub stop: StopReason,
    /// `None` when no strategy ever located cards on the page.
    pub discovery: Option<Discovery>,
    pub scroll_rounds: u32,
}

impl CrawlOutcome {
    #[must_use]
    pub fn selector_strategy(&self) -> Option<&'static str> {
        self.discovery.as_ref().map(|d| d.strategy.name())
    }
}

/// Drives one request against one page context.
pub struct PaginationCrawler<'a> {
    discovery: &'a SelectorDiscovery,
    options: &'a CrawlOptions,
    cancel: &'a CancellationToken,
    state: CrawlState,
    found: Option<Discovery>,
    session: CrawlSession,
}

impl<'a> PaginationCrawler<'a> {
    #[must_use]
    pub fn new(
        discovery: &'a SelectorDiscovery,
        options: &'a CrawlOptions,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            discovery,
            options,
            cancel,
            state: CrawlState::Initializing,
            found: None,
            session: CrawlSession::new(),
        }
    }

    /// Run the loop to completion.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlerError::Navigation`] when the search page cannot be
    /// loaded at all. A navigation timeout is not an error; it counts as a
    /// stale round.
    pub async fn run(
        mut self,
        ctx: &mut dyn PageContext,
        request: &SearchRequest,
        url: &str,
    ) -> Result<CrawlOutcome, CrawlerError> {
        let label = request.label();
        let mut stale_rounds: u32 = 0;
        let mut scroll_rounds: u32 = 0;

        match ctx.navigate(url, self.options.step_timeout).await {
            Ok(()) => {}
            Err(CrawlerError::NavigationTimeout { .. }) => {
                tracing::warn!(request = %label, "navigation timed out; treating as stale round");
                stale_rounds += 1;
            }
            Err(e) => return Err(e),
        }
        self.state = CrawlState::Loading;

        match self.step(ctx.click_by_label(&CONSENT_LABELS)).await {
            Some(Ok(true)) => tracing::debug!(request = %label, "dismissed consent dialog"),
            Some(Err(e)) => tracing::debug!(request = %label, error = %e, "consent dismissal failed"),
            _ => {}
        }

        self.extract_round(ctx).await;

        let stop = loop {
            if self.session.len() >= self.options.max_ads {
                break StopReason::TargetReached;
            }
            if self.cancel.is_cancelled() {
                break StopReason::Cancelled;
            }
            if stale_rounds >= self.options.max_stale_rounds {
                break StopReason::StaleRounds;
            }
            if scroll_rounds >= self.options.max_scroll_attempts {
                break StopReason::ScrollCap;
            }

            self.state = CrawlState::ScrollingForMore;
            if let Some(Err(e)) = self.step(ctx.scroll_to_bottom()).await {
                tracing::debug!(request = %label, error = %e, "scroll failed");
            }
            scroll_rounds += 1;
            if !self.pause().await {
                break StopReason::Cancelled;
            }

            let new = self.extract_round(ctx).await;
            if new > 0 {
                stale_rounds = 0;
            } else if matches!(
                self.step(ctx.click_by_label(&LOAD_MORE_LABELS)).await,
                Some(Ok(true))
            ) {
                tracing::debug!(request = %label, "clicked load-more control");
                stale_rounds = 0;
            } else {
                stale_rounds += 1;
            }

            tracing::debug!(
                request = %label,
                round = scroll_rounds,
                new,
                total = self.session.len(),
                stale_rounds,
                "scroll round complete"
            );
        };

        self.state = if stop == StopReason::Cancelled {
            CrawlState::Aborted
        } else {
            CrawlState::Exhausted
        };

        if self.found.is_none() {
            tracing::warn!(request = %label, "no ad cards located on page");
        }
        tracing::info!(
            request = %label,
            ads = self.session.len().min(self.options.max_ads),
            rounds = scroll_rounds,
            stop = ?stop,
            "crawl finished"
        );

        Ok(CrawlOutcome {
            request: request.clone(),
            records: self.session.into_records(self.options.max_ads),
            state: self.state,
            stop,
            discovery: self.found,
            scroll_rounds,
        })
    }

    /// Extract visible cards into the session and return how many were new.
    async fn extract_round(&mut self, ctx: &mut dyn PageContext) -> usize {
        self.state = CrawlState::Extracting;
        let snap = match self.step(ctx.snapshot()).await {
            Some(Ok(snap)) => snap,
            Some(Err(e)) => {
                tracing::debug!(error = %e, "snapshot failed");
                return 0;
            }
            None => return 0,
        };

        if self.found.is_none() {
            self.found = self.discovery.discover(&snap).found();
        }
        let Some(selector) = self.found.as_ref().map(|d| &d.selector) else {
            return 0;
        };

        let cards = CardSelector::select(selector, &snap);
        let records = extract_records(&snap, &cards, Utc::now());
        self.session.merge(records)
    }

    /// Await a page operation under the step timeout. `None` means it timed out.
    async fn step<T>(
        &self,
        fut: impl std::future::Future<Output = Result<T, CrawlerError>>,
    ) -> Option<Result<T, CrawlerError>> {
        if let Ok(result) = tokio::time::timeout(self.options.step_timeout, fut).await {
            Some(result)
        } else {
            tracing::debug!(
                timeout_ms = self.options.step_timeout.as_millis(),
                "page operation timed out"
            );
            None
        }
    }

    /// Sleep for the scroll pause with ±25% jitter. Returns `false` if cancelled.
    async fn pause(&self) -> bool {
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let pause_ms = (self.options.scroll_pause.as_millis() as f64
            * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
        tokio::select! {
            () = self.cancel.cancelled() => false,
            () = tokio::time::sleep(Duration::from_millis(pause_ms)) => true,
        }
    }
}

#[cfg(test)]
#[path = "pagination_test.rs"]
mod tests;
