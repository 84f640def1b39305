//! End-to-end market run.
//!
//! ```text
//! scan keyword ──► sparse? ──► expand + crawl related keywords ──► merge
//!      │                                                            │
//!      └──────────────────────────► categorize ◄────────────────────┘
//!                                       │
//!                  filter to dominant category, rank advertisers
//!                                       │
//!                 deep search top N ──► qualifying counts ──► tier
//!                                       │
//!                        select + analyze per brand ──► MarketResult
//! ```
//!
//! Brands and keywords are processed one at a time with a cancellation
//! check between each; whatever finished before cancellation stays in the
//! result.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use adintel_core::{
    AdRecord, AdvertiserEntry, BrandDensity, BrandReport, Clock, CompetitionLevel,
    KeywordContribution, MarketDiagnostics, MarketResult, MarketSettings, ProductCategory,
    SelectionThresholds,
};
use adintel_crawler::{crawl_many, AdSearch, CrawlOptions, SearchRequest};
use adintel_select::{
    aggregate_by_advertiser, group_pages_by_domain, rank_advertisers, select_ads_for_brand,
};
use chrono::NaiveDate;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::analysis::AnalysisService;
use crate::category::{categorize_records, dominant_category, filter_to_category};
use crate::competition::classify_competition;
use crate::deep_search::DeepBrandSearcher;
use crate::error::MarketError;
use crate::expansion::{is_sparse, merge_keyword_batches, normalize_expansions, KeywordBatch};

/// Everything a market run needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct MarketOptions {
    pub country: String,
    pub market: MarketSettings,
    pub thresholds: SelectionThresholds,
    /// Crawl budget for the keyword scan and its expansions.
    pub scan: CrawlOptions,
    /// Elevated crawl budget for deep brand searches.
    pub deep: CrawlOptions,
}

pub struct MarketOrchestrator {
    search: Arc<dyn AdSearch>,
    analysis: Arc<dyn AnalysisService>,
    clock: Arc<dyn Clock>,
}

impl MarketOrchestrator {
    #[must_use]
    pub fn new(
        search: Arc<dyn AdSearch>,
        analysis: Arc<dyn AnalysisService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            search,
            analysis,
            clock,
        }
    }

    /// Run the full market pipeline for `keyword`.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::EmptyKeyword`] for a blank keyword and
    /// [`MarketError::Crawler`] when the browser itself fails. Failed
    /// queries, failed analyses and empty scans are reported in the result.
    pub async fn run(
        &self,
        keyword: &str,
        options: &MarketOptions,
        cancel: &CancellationToken,
    ) -> Result<MarketResult, MarketError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(MarketError::EmptyKeyword);
        }
        let run_id = Uuid::new_v4();
        let today = self.clock.today();
        let settings = &options.market;
        let mut diagnostics = MarketDiagnostics::default();

        tracing::info!(%run_id, keyword = %keyword, country = %options.country, "market run started");

        let (mut records, keyword_contributions) =
            self.scan_market(keyword, options, cancel, &mut diagnostics).await?;

        categorize_records(&mut records, self.analysis.as_ref()).await;
        let category = dominant_category(&records);
        let filtered = filter_to_category(&records, category);
        diagnostics.merged_ads = records.len();
        diagnostics.category_filtered_ads = filtered.len();

        let advertisers = rank_advertisers(aggregate_by_advertiser(
            &filtered,
            None,
            options.thresholds.recent_window_days,
        ));
        let page_networks = group_pages_by_domain(&filtered);
        tracing::info!(
            keyword = %keyword,
            category = %category,
            ads = filtered.len(),
            advertisers = advertisers.len(),
            "market scan ranked"
        );

        let top: Vec<&AdvertiserEntry> = advertisers.iter().take(settings.top_brands).collect();
        let (densities, brand_records) = self
            .measure_density(&top, &filtered, category, options, today, cancel, &mut diagnostics)
            .await?;

        let competition_level = classify_competition(&densities, settings.qualifying_threshold);
        tracing::info!(keyword = %keyword, level = %competition_level, "competition classified");

        // Blue-ocean markets get the single-brand narrative only.
        let report_targets = if competition_level == CompetitionLevel::BlueOcean {
            &top[..top.len().min(1)]
        } else {
            &top[..]
        };
        let brand_reports = self
            .report_brands(report_targets, &brand_records, &filtered, options, today, cancel)
            .await;

        diagnostics.cancelled = cancel.is_cancelled();
        tracing::info!(
            %run_id,
            keyword = %keyword,
            brands = brand_reports.len(),
            cancelled = diagnostics.cancelled,
            "market run complete"
        );

        Ok(MarketResult {
            run_id,
            keyword: keyword.to_string(),
            country: options.country.clone(),
            scan_date: today,
            competition_level,
            low_confidence: competition_level == CompetitionLevel::Thin,
            dominant_category: category,
            total_advertisers: advertisers.len(),
            brands_analyzed: brand_reports.len(),
            densities,
            brand_reports,
            keyword_contributions,
            page_networks,
            diagnostics,
        })
    }

    /// Initial keyword scan, expanded with related keywords when sparse.
    async fn scan_market(
        &self,
        keyword: &str,
        options: &MarketOptions,
        cancel: &CancellationToken,
        diagnostics: &mut MarketDiagnostics,
    ) -> Result<(Vec<AdRecord>, Vec<KeywordContribution>), MarketError> {
        let primary = match self
            .search
            .search(&SearchRequest::keyword(keyword), &options.scan, cancel)
            .await
        {
            Ok(outcome) => {
                diagnostics.selector_strategy = outcome.selector_strategy().map(str::to_string);
                KeywordBatch {
                    keyword: keyword.to_string(),
                    records: outcome.records,
                    failed: false,
                }
            }
            Err(e) if e.is_recoverable() => {
                tracing::warn!(keyword = %keyword, error = %e, "initial scan failed");
                diagnostics.failed_queries += 1;
                KeywordBatch {
                    keyword: keyword.to_string(),
                    records: Vec::new(),
                    failed: true,
                }
            }
            Err(e) => return Err(e.into()),
        };

        diagnostics.initial_ads = primary.records.len();
        diagnostics.initial_brands = primary
            .records
            .iter()
            .map(|r| r.page_name.as_str())
            .collect::<HashSet<_>>()
            .len();

        let mut batches = vec![primary];
        if is_sparse(&batches[0].records, &options.market) && !cancel.is_cancelled() {
            let mut seed = batches[0].records.clone();
            categorize_records(&mut seed, self.analysis.as_ref()).await;
            let hint = dominant_category(&seed);

            let suggested = match self.analysis.expand(keyword, hint).await {
                Ok(list) => list,
                Err(e) => {
                    tracing::warn!(keyword = %keyword, error = %e, "keyword expansion failed");
                    Vec::new()
                }
            };
            let related =
                normalize_expansions(keyword, suggested, options.market.expansion_keywords);
            tracing::info!(
                keyword = %keyword,
                ads = diagnostics.initial_ads,
                brands = diagnostics.initial_brands,
                related = ?related,
                "sparse scan; expanding keywords"
            );

            if !related.is_empty() {
                diagnostics.expanded = true;
                let requests = related.into_iter().map(SearchRequest::Keyword).collect();
                for (request, result) in
                    crawl_many(self.search.as_ref(), requests, &options.scan, cancel).await
                {
                    let keyword = request.label();
                    match result {
                        Ok(outcome) => batches.push(KeywordBatch {
                            keyword,
                            records: outcome.records,
                            failed: false,
                        }),
                        Err(e) if e.is_recoverable() => {
                            tracing::warn!(keyword = %keyword, error = %e, "related keyword scan failed");
                            diagnostics.failed_queries += 1;
                            batches.push(KeywordBatch {
                                keyword,
                                records: Vec::new(),
                                failed: true,
                            });
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
            }
        }

        Ok(merge_keyword_batches(batches))
    }

    /// Deep-search each top brand and count its qualifying ads.
    #[allow(clippy::too_many_arguments)]
    async fn measure_density(
        &self,
        top: &[&AdvertiserEntry],
        filtered: &[AdRecord],
        category: ProductCategory,
        options: &MarketOptions,
        today: NaiveDate,
        cancel: &CancellationToken,
        diagnostics: &mut MarketDiagnostics,
    ) -> Result<(Vec<BrandDensity>, HashMap<String, Vec<AdRecord>>), MarketError> {
        let searcher =
            DeepBrandSearcher::new(self.search.as_ref(), self.analysis.as_ref(), &options.deep);
        let mut densities = Vec::with_capacity(top.len());
        let mut brand_records = HashMap::new();

        for advertiser in top {
            if cancel.is_cancelled() {
                tracing::warn!(brand = %advertiser.page_name, "cancelled before deep search");
                break;
            }
            let outcome = searcher
                .search(&advertiser.page_name, filtered, category, cancel)
                .await?;
            diagnostics.failed_queries += outcome.variants.iter().filter(|v| v.failed).count();

            let qualifying = select_ads_for_brand(
                &outcome.records,
                &advertiser.page_name,
                None,
                &options.thresholds,
                today,
            )
            .stats
            .total_selected;
            tracing::info!(
                brand = %advertiser.page_name,
                deep_ads = outcome.records.len(),
                qualifying,
                "brand density measured"
            );

            densities.push(BrandDensity {
                page_name: advertiser.page_name.clone(),
                deep_search_ads: outcome.records.len(),
                qualifying_ads: qualifying,
                variants: outcome.variants,
            });
            brand_records.insert(advertiser.page_name.clone(), outcome.records);
        }

        Ok((densities, brand_records))
    }

    /// Select and analyze each target brand. A brand with nothing selected
    /// is skipped; an analysis failure leaves its analysis empty.
    async fn report_brands(
        &self,
        targets: &[&AdvertiserEntry],
        brand_records: &HashMap<String, Vec<AdRecord>>,
        filtered: &[AdRecord],
        options: &MarketOptions,
        today: NaiveDate,
        cancel: &CancellationToken,
    ) -> Vec<BrandReport> {
        let mut reports = Vec::with_capacity(targets.len());
        for advertiser in targets {
            if cancel.is_cancelled() {
                tracing::warn!(brand = %advertiser.page_name, "cancelled before brand analysis");
                break;
            }

            // Deep results supersede the scan; fall back when the deep search found nothing.
            let records = brand_records
                .get(&advertiser.page_name)
                .filter(|r| !r.is_empty())
                .map_or(filtered, Vec::as_slice);
            let selection = select_ads_for_brand(
                records,
                &advertiser.page_name,
                Some(options.market.ads_per_brand),
                &options.thresholds,
                today,
            );
            if selection.selected.is_empty() {
                tracing::warn!(brand = %advertiser.page_name, "no ads passed selection; skipping brand");
                continue;
            }

            let selected: Vec<AdRecord> = selection.selected.iter().map(|ca| ca.ad.clone()).collect();
            let analysis = match self.analysis.analyze(&selected).await {
                Ok(result) => Some(result),
                Err(e) => {
                    tracing::warn!(brand = %advertiser.page_name, error = %e, "brand analysis failed");
                    None
                }
            };
            tracing::info!(
                brand = %advertiser.page_name,
                selected = selection.selected.len(),
                "brand analyzed"
            );

            reports.push(BrandReport {
                advertiser: (*advertiser).clone(),
                selection_stats: selection.stats,
                selected: selection.selected,
                analysis,
            });
        }
        reports
    }
}

#[cfg(test)]
#[path = "orchestrator_test.rs"]
mod tests;
