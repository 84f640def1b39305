//! Interface to the content-analysis collaborator.
//!
//! Production deployments plug in an LLM-backed service; this crate only
//! depends on the trait. [`HeuristicAnalysis`] runs fully offline.

use std::collections::BTreeMap;

use adintel_core::{AdRecord, AdType, AnalysisResult, ProductCategory};
use async_trait::async_trait;

use crate::category::classify_text;
use crate::error::AnalysisError;

#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Summarize a set of selected records, usually one brand's.
    async fn analyze(&self, records: &[AdRecord]) -> Result<AnalysisResult, AnalysisError>;

    /// Product category of a piece of ad text.
    async fn classify(&self, text: &str) -> Result<ProductCategory, AnalysisError>;

    /// Related search keywords for a sparse market.
    async fn expand(
        &self,
        keyword: &str,
        category: ProductCategory,
    ) -> Result<Vec<String>, AnalysisError>;
}

/// Offline analysis: lexicon classification, no keyword expansion, and a
/// count-based summary.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicAnalysis;

#[async_trait]
impl AnalysisService for HeuristicAnalysis {
    async fn analyze(&self, records: &[AdRecord]) -> Result<AnalysisResult, AnalysisError> {
        Ok(summarize(records))
    }

    async fn classify(&self, text: &str) -> Result<ProductCategory, AnalysisError> {
        Ok(classify_text(text))
    }

    async fn expand(
        &self,
        _keyword: &str,
        _category: ProductCategory,
    ) -> Result<Vec<String>, AnalysisError> {
        Ok(Vec::new())
    }
}

fn summarize(records: &[AdRecord]) -> AnalysisResult {
    let brand = records.first().map(|r| r.page_name.clone()).filter(|name| {
        records.iter().all(|r| &r.page_name == name)
    });

    let mut formats: BTreeMap<&'static str, usize> = BTreeMap::new();
    let mut ctas: BTreeMap<&str, usize> = BTreeMap::new();
    for record in records {
        let format = match record.ad_type {
            AdType::Video => "video",
            AdType::Static => "static",
            AdType::Carousel => "carousel",
            AdType::Unknown => "unknown",
        };
        *formats.entry(format).or_default() += 1;
        if let Some(cta) = record.cta_text.as_deref() {
            *ctas.entry(cta).or_default() += 1;
        }
    }

    let format_mix = formats
        .iter()
        .map(|(f, n)| format!("{n} {f}"))
        .collect::<Vec<_>>()
        .join(", ");
    let summary = match &brand {
        Some(name) => format!("{} ads from {name} ({format_mix})", records.len()),
        None => format!("{} ads ({format_mix})", records.len()),
    };

    let mut key_insights = Vec::new();
    if let Some((cta, n)) = ctas.iter().max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0))) {
        key_insights.push(format!("most common call to action: {cta} ({n} ads)"));
    }
    let mut headlines: Vec<&str> = Vec::new();
    for headline in records.iter().filter_map(|r| r.headline.as_deref()) {
        if !headlines.contains(&headline) {
            headlines.push(headline);
        }
    }
    if !headlines.is_empty() {
        key_insights.push(format!("{} distinct headlines", headlines.len()));
    }
    let undated = records.iter().filter(|r| r.launch_date().is_none()).count();
    if undated > 0 {
        key_insights.push(format!("{undated} ads without a launch date"));
    }

    AnalysisResult {
        brand,
        ads_analyzed: records.len(),
        summary,
        key_insights,
    }
}
