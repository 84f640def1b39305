//! Tunable thresholds for selection, crawling and market orchestration.
//!
//! Every field has a default, so an absent or partial `tuning.yaml` is valid.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionThresholds {
    pub min_primary_text_words: usize,
    pub skip_older_than_days: i64,
    pub failed_test_max_impressions: u64,
    pub failed_test_min_days: i64,
    pub active_winner_max_days: i64,
    pub active_winner_min_impressions: u64,
    pub proven_recent_max_days: i64,
    pub proven_recent_min_impressions: u64,
    pub strategic_direction_max_days: i64,
    pub recent_moderate_max_days: i64,
    pub recent_moderate_min_impressions: u64,
    /// Window used by the aggregator for `recent_count`.
    pub recent_window_days: i64,
}

impl Default for SelectionThresholds {
    fn default() -> Self {
        Self {
            min_primary_text_words: 50,
            skip_older_than_days: 180,
            failed_test_max_impressions: 1_000,
            failed_test_min_days: 30,
            active_winner_max_days: 14,
            active_winner_min_impressions: 50_000,
            proven_recent_max_days: 30,
            proven_recent_min_impressions: 10_000,
            strategic_direction_max_days: 7,
            recent_moderate_max_days: 60,
            recent_moderate_min_impressions: 50_000,
            recent_window_days: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveStatus {
    #[default]
    Active,
    Inactive,
    All,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdCategoryFilter {
    #[default]
    All,
    PoliticalAndIssueAds,
    HousingAds,
    EmploymentAds,
    CreditAds,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaTypeFilter {
    #[default]
    All,
    Image,
    Video,
    Meme,
    None,
}

impl ActiveStatus {
    #[must_use]
    pub fn as_query(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::All => "all",
        }
    }
}

impl AdCategoryFilter {
    #[must_use]
    pub fn as_query(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::PoliticalAndIssueAds => "political_and_issue_ads",
            Self::HousingAds => "housing_ads",
            Self::EmploymentAds => "employment_ads",
            Self::CreditAds => "credit_ads",
        }
    }
}

impl MediaTypeFilter {
    #[must_use]
    pub fn as_query(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Image => "image",
            Self::Video => "video",
            Self::Meme => "meme",
            Self::None => "none",
        }
    }
}

/// Ad Library search filters applied to every generated search URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchFilters {
    pub country: String,
    pub status: ActiveStatus,
    pub ad_type: AdCategoryFilter,
    pub media_type: MediaTypeFilter,
}

impl Default for SearchFilters {
    fn default() -> Self {
        Self {
            country: "US".to_string(),
            status: ActiveStatus::default(),
            ad_type: AdCategoryFilter::default(),
            media_type: MediaTypeFilter::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerSettings {
    pub max_ads: usize,
    pub max_scroll_attempts: u32,
    pub max_stale_rounds: u32,
    pub scroll_pause_ms: u64,
    /// Cap used by deep brand searches.
    pub deep_max_ads: usize,
    pub deep_max_scroll_attempts: u32,
    pub filters: SearchFilters,
}

impl Default for CrawlerSettings {
    fn default() -> Self {
        Self {
            max_ads: 100,
            max_scroll_attempts: 50,
            max_stale_rounds: 3,
            scroll_pause_ms: 2_000,
            deep_max_ads: 500,
            deep_max_scroll_attempts: 120,
            filters: SearchFilters::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketSettings {
    /// Qualifying ads a brand needs to count toward market density.
    pub qualifying_threshold: usize,
    pub top_brands: usize,
    pub ads_per_brand: usize,
    pub sparse_min_ads: usize,
    pub sparse_min_brands: usize,
    pub expansion_keywords: usize,
}

impl Default for MarketSettings {
    fn default() -> Self {
        Self {
            qualifying_threshold: 50,
            top_brands: 5,
            ads_per_brand: 10,
            sparse_min_ads: 20,
            sparse_min_brands: 5,
            expansion_keywords: 4,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub selection: SelectionThresholds,
    pub crawler: CrawlerSettings,
    pub market: MarketSettings,
}

/// Load and validate tuning from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_tuning(path: &Path) -> Result<Tuning, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::TuningFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_tuning(&content)
}

/// Like [`load_tuning`], but a missing file yields the defaults.
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read, parsed, or validated.
pub fn load_tuning_or_default(path: &Path) -> Result<Tuning, ConfigError> {
    if !path.exists() {
        return Ok(Tuning::default());
    }
    load_tuning(path)
}

fn parse_tuning(content: &str) -> Result<Tuning, ConfigError> {
    // An empty document deserializes to unit, not to a defaulted struct.
    let tuning: Tuning = if content.trim().is_empty() {
        Tuning::default()
    } else {
        serde_yaml::from_str(content).map_err(ConfigError::TuningFileParse)?
    };

    validate_tuning(&tuning)?;

    Ok(tuning)
}

fn validate_tuning(tuning: &Tuning) -> Result<(), ConfigError> {
    let crawler = &tuning.crawler;
    if crawler.max_scroll_attempts == 0 || crawler.deep_max_scroll_attempts == 0 {
        return Err(ConfigError::Validation(
            "crawler scroll attempts must be greater than zero".to_string(),
        ));
    }
    if crawler.max_stale_rounds == 0 {
        return Err(ConfigError::Validation(
            "crawler.max_stale_rounds must be greater than zero".to_string(),
        ));
    }
    if crawler.filters.country.trim().is_empty() {
        return Err(ConfigError::Validation(
            "crawler.filters.country must be non-empty".to_string(),
        ));
    }

    if tuning.market.top_brands == 0 {
        return Err(ConfigError::Validation(
            "market.top_brands must be greater than zero".to_string(),
        ));
    }

    let s = &tuning.selection;
    let ordered = s.strategic_direction_max_days <= s.active_winner_max_days
        && s.active_winner_max_days <= s.proven_recent_max_days
        && s.proven_recent_max_days <= s.recent_moderate_max_days
        && s.recent_moderate_max_days < s.skip_older_than_days;
    if !ordered {
        return Err(ConfigError::Validation(format!(
            "selection tier windows must be ordered: strategic ({}) <= active ({}) <= proven ({}) <= moderate ({}) < legacy ({})",
            s.strategic_direction_max_days,
            s.active_winner_max_days,
            s.proven_recent_max_days,
            s.recent_moderate_max_days,
            s.skip_older_than_days
        )));
    }

    Ok(())
}

#[cfg(test)]
#[path = "tuning_test.rs"]
mod tests;
