//! Market-level result types emitted by the orchestrator.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ads::ProductCategory;
use crate::advertiser::{AdvertiserEntry, PageNetwork};
use crate::selection::{ClassifiedAd, SelectionStats};

/// Competitive density of a market keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompetitionLevel {
    /// Three or more brands meet the qualifying-ad threshold.
    Normal,
    /// One or two brands meet the threshold.
    Thin,
    /// No brand meets the threshold.
    BlueOcean,
}

impl std::fmt::Display for CompetitionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Thin => write!(f, "thin"),
            Self::BlueOcean => write!(f, "blue_ocean"),
        }
    }
}

/// Output of the external analysis service for a set of records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub brand: Option<String>,
    pub ads_analyzed: usize,
    pub summary: String,
    pub key_insights: Vec<String>,
}

/// How many ads one deep-search query variant contributed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantContribution {
    pub query: String,
    /// `"keyword"` for text variants, `"page"` for direct page-id crawls.
    pub kind: String,
    pub ads_found: usize,
    pub new_ads: usize,
    pub failed: bool,
}

/// Qualifying-ad count for one brand after deep search and filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandDensity {
    pub page_name: String,
    pub deep_search_ads: usize,
    pub qualifying_ads: usize,
    pub variants: Vec<VariantContribution>,
}

/// Unique contribution of one keyword to an expanded market scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordContribution {
    pub keyword: String,
    pub ads_found: usize,
    pub unique_ads: usize,
    pub failed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandReport {
    pub advertiser: AdvertiserEntry,
    pub selection_stats: SelectionStats,
    pub selected: Vec<ClassifiedAd>,
    pub analysis: Option<AnalysisResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketDiagnostics {
    pub initial_ads: usize,
    pub initial_brands: usize,
    pub expanded: bool,
    pub merged_ads: usize,
    pub category_filtered_ads: usize,
    pub failed_queries: usize,
    pub selector_strategy: Option<String>,
    pub cancelled: bool,
}

/// Complete result of one market run. A zero-ad scan is still a valid result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketResult {
    pub run_id: Uuid,
    pub keyword: String,
    pub country: String,
    pub scan_date: NaiveDate,
    pub competition_level: CompetitionLevel,
    /// Set for thin markets: the pipeline ran but on few qualifying brands.
    pub low_confidence: bool,
    pub dominant_category: ProductCategory,
    pub total_advertisers: usize,
    pub brands_analyzed: usize,
    pub densities: Vec<BrandDensity>,
    pub brand_reports: Vec<BrandReport>,
    pub keyword_contributions: Vec<KeywordContribution>,
    pub page_networks: Vec<PageNetwork>,
    pub diagnostics: MarketDiagnostics,
}
