//! Subcommand handlers.
//!
//! Each handler owns one crawl or market run end to end and writes its
//! result to the output directory. The browser is launched once by `main`
//! and shared.

use std::sync::Arc;

use adintel_core::{AppConfig, ProductCategory, SystemClock, Tuning};
use adintel_crawler::{AdSearch, CrawlOptions, Crawler};
use adintel_market::{
    scan_keyword, DeepBrandSearcher, HeuristicAnalysis, MarketOptions, MarketOrchestrator,
};
use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::output::write_json;

/// Shared state for one CLI invocation.
pub(crate) struct Context {
    pub(crate) config: AppConfig,
    pub(crate) tuning: Tuning,
    pub(crate) crawler: Arc<Crawler>,
    pub(crate) cancel: CancellationToken,
}

pub(crate) async fn run_scan(
    ctx: &Context,
    keyword: &str,
    max_ads: Option<usize>,
) -> anyhow::Result<()> {
    let mut options = CrawlOptions::scan(&ctx.tuning.crawler, ctx.config.nav_timeout());
    if let Some(max_ads) = max_ads {
        options = options.with_max_ads(max_ads);
    }

    let scan = scan_keyword(
        ctx.crawler.as_ref(),
        keyword,
        &options,
        &ctx.crawler.filters().country,
        Utc::now().date_naive(),
        ctx.tuning.selection.recent_window_days,
        &ctx.cancel,
    )
    .await?;
    if let Some(error) = &scan.error {
        println!("scan '{keyword}' failed: {error}");
    }

    println!(
        "scan '{keyword}': {} ads from {} advertisers (selector: {})",
        scan.total_fetched,
        scan.advertisers.len(),
        scan.selector_strategy.as_deref().unwrap_or("none")
    );
    for (rank, advertiser) in scan.advertisers.iter().take(10).enumerate() {
        println!(
            "  {:>2}. {} ({} ads, score {:.1})",
            rank + 1,
            advertiser.page_name,
            advertiser.ad_count,
            advertiser.relevance_score
        );
    }

    let path = write_json(&ctx.config.output_dir, "scan", keyword, Utc::now(), &scan)?;
    println!("wrote {}", path.display());
    Ok(())
}

pub(crate) async fn run_deep(
    ctx: &Context,
    page_name: &str,
    seed_keyword: Option<&str>,
) -> anyhow::Result<()> {
    // A seed scan surfaces the brand's domains and page ids for extra
    // variants. A failed seed scan leaves the seed empty.
    let seed = match seed_keyword {
        Some(keyword) => {
            let options = CrawlOptions::scan(&ctx.tuning.crawler, ctx.config.nav_timeout());
            scan_keyword(
                ctx.crawler.as_ref(),
                keyword,
                &options,
                &ctx.crawler.filters().country,
                Utc::now().date_naive(),
                ctx.tuning.selection.recent_window_days,
                &ctx.cancel,
            )
            .await?
            .records
        }
        None => Vec::new(),
    };

    let options = CrawlOptions::deep(&ctx.tuning.crawler, ctx.config.nav_timeout());
    let analysis = HeuristicAnalysis;
    let outcome = DeepBrandSearcher::new(ctx.crawler.as_ref(), &analysis, &options)
        .search(page_name, &seed, ProductCategory::Unknown, &ctx.cancel)
        .await?;

    println!(
        "deep '{page_name}': {} ads across {} queries ({} failed)",
        outcome.records.len(),
        outcome.variants.len(),
        outcome.variants.iter().filter(|v| v.failed).count()
    );
    for variant in &outcome.variants {
        println!(
            "  [{}] {}: {} found, {} new",
            variant.kind, variant.query, variant.ads_found, variant.new_ads
        );
    }

    let path = write_json(&ctx.config.output_dir, "deep", page_name, Utc::now(), &outcome)?;
    println!("wrote {}", path.display());
    Ok(())
}

pub(crate) async fn run_market(
    ctx: &Context,
    keyword: &str,
    top_brands: Option<usize>,
    ads_per_brand: Option<usize>,
) -> anyhow::Result<()> {
    let mut market = ctx.tuning.market.clone();
    if let Some(n) = top_brands {
        market.top_brands = n;
    }
    if let Some(n) = ads_per_brand {
        market.ads_per_brand = n;
    }
    let options = MarketOptions {
        country: ctx.crawler.filters().country.clone(),
        market,
        thresholds: ctx.tuning.selection.clone(),
        scan: CrawlOptions::scan(&ctx.tuning.crawler, ctx.config.nav_timeout()),
        deep: CrawlOptions::deep(&ctx.tuning.crawler, ctx.config.nav_timeout()),
    };

    let orchestrator = MarketOrchestrator::new(
        Arc::clone(&ctx.crawler) as Arc<dyn AdSearch>,
        Arc::new(HeuristicAnalysis),
        Arc::new(SystemClock),
    );
    let result = orchestrator.run(keyword, &options, &ctx.cancel).await?;

    println!(
        "market '{keyword}': {} ({}{}), {} advertisers, {} brands analyzed",
        result.competition_level,
        result.dominant_category,
        if result.low_confidence { ", low confidence" } else { "" },
        result.total_advertisers,
        result.brands_analyzed
    );
    for density in &result.densities {
        println!(
            "  {}: {} qualifying of {} deep-search ads",
            density.page_name, density.qualifying_ads, density.deep_search_ads
        );
    }
    if result.diagnostics.cancelled {
        println!("run was cancelled; results are partial");
    }

    let path = write_json(&ctx.config.output_dir, "market", keyword, Utc::now(), &result)?;
    println!("wrote {}", path.display());
    Ok(())
}
