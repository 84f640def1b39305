//! Ad records as extracted from the ad library surface.
//!
//! ## Observed field availability
//!
//! The library withholds data unpredictably, so almost every field beyond
//! `ad_id` and `page_name` is optional:
//!
//! - `started_running` is missing on a large share of cards and uses
//!   several textual formats when present (see [`crate::dates`]).
//! - Impression ranges are shown only for some regions and ad categories;
//!   when absent, `impression_lower` is `0` and `impression_upper` is `None`.
//! - Spend ranges follow the same rule as impressions.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::dates::parse_launch_date;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdType {
    Video,
    Static,
    Carousel,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Facebook,
    Instagram,
    Messenger,
    AudienceNetwork,
}

impl Platform {
    /// Display labels as they appear on ad cards, paired with their variant.
    pub const LABELS: [(&'static str, Platform); 4] = [
        ("Facebook", Platform::Facebook),
        ("Instagram", Platform::Instagram),
        ("Messenger", Platform::Messenger),
        ("Audience Network", Platform::AudienceNetwork),
    ];
}

/// Product category used to keep a market scan on one kind of offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductCategory {
    Supplement,
    Device,
    Service,
    Skincare,
    Tool,
    Apparel,
    Software,
    InfoProduct,
    FoodBeverage,
    Other,
    #[default]
    Unknown,
}

impl ProductCategory {
    /// Parses a snake_case category label, falling back to `Unknown`.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "supplement" => Self::Supplement,
            "device" => Self::Device,
            "service" => Self::Service,
            "skincare" => Self::Skincare,
            "tool" => Self::Tool,
            "apparel" => Self::Apparel,
            "software" => Self::Software,
            "info_product" => Self::InfoProduct,
            "food_beverage" => Self::FoodBeverage,
            "other" => Self::Other,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Supplement => "supplement",
            Self::Device => "device",
            Self::Service => "service",
            Self::Skincare => "skincare",
            Self::Tool => "tool",
            Self::Apparel => "apparel",
            Self::Software => "software",
            Self::InfoProduct => "info_product",
            Self::FoodBeverage => "food_beverage",
            Self::Other => "other",
            Self::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// One advertisement card as seen in a single crawl session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdRecord {
    /// Library ad id parsed from the detail link, or a 16-hex-char content
    /// hash when the card exposes no id.
    pub ad_id: String,
    /// Advertiser page display name. `"Unknown"` when the card has none.
    pub page_name: String,
    #[serde(default)]
    pub page_id: Option<String>,
    /// Brand name found in the ad copy when it differs from the page name.
    #[serde(default)]
    pub brand_name: Option<String>,
    #[serde(default)]
    pub ad_type: AdType,
    #[serde(default)]
    pub product_category: ProductCategory,
    #[serde(default)]
    pub primary_text: Option<String>,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub cta_text: Option<String>,
    #[serde(default)]
    pub link_url: Option<String>,
    #[serde(default)]
    pub media_url: Option<String>,
    /// Raw launch date text, e.g. `"Jan 5, 2025"` or `"2025-01-05"`.
    #[serde(default)]
    pub started_running: Option<String>,
    #[serde(default)]
    pub platforms: BTreeSet<Platform>,
    /// 0-based first-seen index within the crawl session.
    #[serde(default)]
    pub scrape_position: usize,
    #[serde(default)]
    pub impression_lower: u64,
    #[serde(default)]
    pub impression_upper: Option<u64>,
    #[serde(default)]
    pub spend_lower: f64,
    #[serde(default)]
    pub spend_upper: Option<f64>,
    #[serde(default = "default_currency")]
    pub spend_currency: String,
    pub scraped_at: DateTime<Utc>,
}

fn default_currency() -> String {
    "USD".to_string()
}

impl AdRecord {
    /// Creates a record with only the identifying fields set.
    #[must_use]
    pub fn new(ad_id: impl Into<String>, page_name: impl Into<String>) -> Self {
        Self {
            ad_id: ad_id.into(),
            page_name: page_name.into(),
            page_id: None,
            brand_name: None,
            ad_type: AdType::Unknown,
            product_category: ProductCategory::Unknown,
            primary_text: None,
            headline: None,
            cta_text: None,
            link_url: None,
            media_url: None,
            started_running: None,
            platforms: BTreeSet::new(),
            scrape_position: 0,
            impression_lower: 0,
            impression_upper: None,
            spend_lower: 0.0,
            spend_upper: None,
            spend_currency: default_currency(),
            scraped_at: Utc::now(),
        }
    }

    /// Whitespace-separated word count of the primary text.
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.primary_text
            .as_deref()
            .map_or(0, |t| t.split_whitespace().count())
    }

    /// Parsed launch date, or `None` when absent or malformed.
    #[must_use]
    pub fn launch_date(&self) -> Option<NaiveDate> {
        self.started_running.as_deref().and_then(parse_launch_date)
    }
}
