//! Multi-query approximation of one brand's full inventory.
//!
//! The library has no "all ads of brand X" view reachable by name, so the
//! brand is searched under every name it plausibly goes by. Pass one runs
//! the keyword variants; pass two crawls each advertiser page id those
//! results surfaced. Only records whose `page_name` equals the target are
//! kept, since keyword results are full of other advertisers.

use std::collections::BTreeSet;

use adintel_core::{AdRecord, ProductCategory, VariantContribution};
use adintel_crawler::{
    crawl_many, AdSearch, CrawlOptions, CrawlOutcome, CrawlSession, CrawlerError, SearchRequest,
};
use adintel_select::link_domain;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::analysis::AnalysisService;
use crate::category::{categorize_records, filter_to_category};

/// Leading words brands put in front of their name.
pub const MARKETING_PREFIXES: [&str; 7] = ["Try", "Get", "Buy", "Shop", "Meet", "Discover", "The"];

#[derive(Debug, Clone, Serialize)]
pub struct DeepSearchOutcome {
    pub page_name: String,
    /// Deduplicated by `ad_id`, filtered to the market category.
    pub records: Vec<AdRecord>,
    pub variants: Vec<VariantContribution>,
    pub page_ids: Vec<String>,
}

/// Search strings for a brand, deduplicated case-sensitively in
/// generation order.
///
/// `records` are the brand's own records from an earlier scan; their
/// outbound domains and brand names become extra variants.
#[must_use]
pub fn query_variants(page_name: &str, records: &[AdRecord]) -> Vec<String> {
    let mut variants: Vec<String> = Vec::new();
    let mut push = |v: &str| {
        let v = v.trim();
        if !v.is_empty() && !variants.iter().any(|existing| existing == v) {
            variants.push(v.to_string());
        }
    };

    push(page_name);
    if let Some(stripped) = strip_marketing_prefix(page_name) {
        push(stripped);
        push(&stripped.to_lowercase());
    }

    let own = records.iter().filter(|r| r.page_name == page_name);
    for domain in own.clone().filter_map(|r| r.link_url.as_deref().and_then(link_domain)) {
        if let Some(stem) = domain_stem(&domain) {
            push(stem);
        }
        push(&domain);
    }
    for brand in own.filter_map(|r| r.brand_name.as_deref()) {
        if brand != page_name {
            push(brand);
        }
    }

    variants
}

/// `"Try Sleepwell"` becomes `"Sleepwell"`. Only one prefix is removed and
/// the remainder must be non-empty.
fn strip_marketing_prefix(name: &str) -> Option<&str> {
    let (first, rest) = name.trim().split_once(char::is_whitespace)?;
    let rest = rest.trim_start();
    (MARKETING_PREFIXES
        .iter()
        .any(|p| p.eq_ignore_ascii_case(first))
        && !rest.is_empty())
    .then_some(rest)
}

/// Second-level label of a host: `shop.sleepwell.co` gives `sleepwell`.
fn domain_stem(domain: &str) -> Option<&str> {
    let labels: Vec<&str> = domain.split('.').filter(|l| !l.is_empty()).collect();
    (labels.len() >= 2).then(|| labels[labels.len() - 2])
}

pub struct DeepBrandSearcher<'a> {
    search: &'a dyn AdSearch,
    analysis: &'a dyn AnalysisService,
    options: &'a CrawlOptions,
}

impl<'a> DeepBrandSearcher<'a> {
    #[must_use]
    pub fn new(
        search: &'a dyn AdSearch,
        analysis: &'a dyn AnalysisService,
        options: &'a CrawlOptions,
    ) -> Self {
        Self {
            search,
            analysis,
            options,
        }
    }

    /// Run both passes for `page_name`.
    ///
    /// Failed variants contribute zero ads and are flagged in the
    /// diagnostics.
    ///
    /// # Errors
    ///
    /// Returns the crawler error only when it is not recoverable, i.e. the
    /// browser itself is gone.
    pub async fn search(
        &self,
        page_name: &str,
        seed: &[AdRecord],
        category: ProductCategory,
        cancel: &CancellationToken,
    ) -> Result<DeepSearchOutcome, CrawlerError> {
        let mut session = CrawlSession::new();
        let mut variants = Vec::new();
        let mut page_ids: BTreeSet<String> = seed
            .iter()
            .filter(|r| r.page_name == page_name)
            .filter_map(|r| r.page_id.clone())
            .collect();

        let keyword_requests: Vec<SearchRequest> = query_variants(page_name, seed)
            .into_iter()
            .map(SearchRequest::Keyword)
            .collect();
        tracing::debug!(brand = %page_name, variants = keyword_requests.len(), "deep search pass one");
        let results = crawl_many(self.search, keyword_requests, self.options, cancel).await;
        for (request, result) in results {
            let own = absorb(page_name, &request, result, &mut session, &mut variants)?;
            page_ids.extend(own.into_iter().filter_map(|r| r.page_id));
        }

        if !cancel.is_cancelled() && !page_ids.is_empty() {
            let page_requests: Vec<SearchRequest> =
                page_ids.iter().map(SearchRequest::page).collect();
            tracing::debug!(brand = %page_name, pages = page_requests.len(), "deep search pass two");
            let results = crawl_many(self.search, page_requests, self.options, cancel).await;
            for (request, result) in results {
                absorb(page_name, &request, result, &mut session, &mut variants)?;
            }
        }

        let mut records = session.into_records(usize::MAX);
        categorize_records(&mut records, self.analysis).await;
        let found = records.len();
        let records = filter_to_category(&records, category);

        tracing::info!(
            brand = %page_name,
            found,
            kept = records.len(),
            category = %category,
            failed = variants.iter().filter(|v| v.failed).count(),
            "deep search complete"
        );

        Ok(DeepSearchOutcome {
            page_name: page_name.to_string(),
            records,
            variants,
            page_ids: page_ids.into_iter().collect(),
        })
    }
}

/// Merge one request's own-brand records and record its contribution.
/// Returns the own-brand records that were found.
fn absorb(
    page_name: &str,
    request: &SearchRequest,
    result: Result<CrawlOutcome, CrawlerError>,
    session: &mut CrawlSession,
    variants: &mut Vec<VariantContribution>,
) -> Result<Vec<AdRecord>, CrawlerError> {
    let (query, kind) = match request {
        SearchRequest::Keyword(q) => (q.clone(), "keyword"),
        SearchRequest::Page { page_id } => (page_id.clone(), "page"),
    };

    let own: Vec<AdRecord> = match result {
        Ok(outcome) => outcome
            .records
            .into_iter()
            .filter(|r| r.page_name == page_name)
            .collect(),
        Err(e) if e.is_recoverable() => {
            tracing::warn!(brand = %page_name, query = %query, error = %e, "query variant failed");
            variants.push(VariantContribution {
                query,
                kind: kind.to_string(),
                ads_found: 0,
                new_ads: 0,
                failed: true,
            });
            return Ok(Vec::new());
        }
        Err(e) => return Err(e),
    };

    let new_ads = session.merge(own.clone());
    variants.push(VariantContribution {
        query,
        kind: kind.to_string(),
        ads_found: own.len(),
        new_ads,
        failed: false,
    });
    Ok(own)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn own(page: &str, link: Option<&str>, brand: Option<&str>) -> AdRecord {
        let mut r = AdRecord::new("1", page);
        r.link_url = link.map(str::to_string);
        r.brand_name = brand.map(str::to_string);
        r
    }

    #[test]
    fn variants_in_generation_order() {
        let records = vec![
            own("Try Sleepwell", Some("https://www.sleepwell.com/offer"), None),
            own("Try Sleepwell", Some("https://shop.sleepwell.com/a"), Some("SleepWell+")),
            own("Someone Else", Some("https://other.test/"), Some("Other")),
        ];
        assert_eq!(
            query_variants("Try Sleepwell", &records),
            vec![
                "Try Sleepwell",
                "Sleepwell",
                "sleepwell",
                "sleepwell.com",
                "shop.sleepwell.com",
                "SleepWell+",
            ]
        );
    }

    #[test]
    fn only_one_prefix_is_stripped() {
        assert_eq!(strip_marketing_prefix("The Get Fit Club"), Some("Get Fit Club"));
        assert_eq!(strip_marketing_prefix("shop Lumen"), Some("Lumen"));
        assert_eq!(strip_marketing_prefix("Lumen Labs"), None);
        assert_eq!(strip_marketing_prefix("Try"), None);
    }

    #[test]
    fn plain_name_yields_itself() {
        assert_eq!(query_variants("Lumen", &[]), vec!["Lumen"]);
    }

    #[test]
    fn stem_needs_two_labels() {
        assert_eq!(domain_stem("shop.sleepwell.co"), Some("sleepwell"));
        assert_eq!(domain_stem("localhost"), None);
    }
}
