use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Per-advertiser roll-up of one scan's records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvertiserEntry {
    pub page_name: String,
    pub page_id: Option<String>,
    pub ad_count: usize,
    /// Records carrying a launch date.
    pub active_count: usize,
    /// Records launched within the recency window before the reference date.
    pub recent_count: usize,
    pub total_impression_lower: u64,
    pub max_impression_upper: u64,
    pub earliest_launch: Option<NaiveDate>,
    pub latest_launch: Option<NaiveDate>,
    /// Distinct headlines in first-seen order.
    pub headlines: Vec<String>,
    pub relevance_score: f64,
}

impl AdvertiserEntry {
    #[must_use]
    pub fn new(page_name: impl Into<String>) -> Self {
        Self {
            page_name: page_name.into(),
            page_id: None,
            ad_count: 0,
            active_count: 0,
            recent_count: 0,
            total_impression_lower: 0,
            max_impression_upper: 0,
            earliest_launch: None,
            latest_launch: None,
            headlines: Vec::new(),
            relevance_score: 0.0,
        }
    }
}

/// Pages that advertise to the same outbound domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageNetwork {
    pub domain: String,
    pub pages: Vec<String>,
    pub total_ads: usize,
}
