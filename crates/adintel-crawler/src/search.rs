//! Ad library search URLs.

use adintel_core::SearchFilters;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

pub const LIBRARY_URL: &str = "https://www.facebook.com/ads/library/";

/// What one crawl pass looks at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SearchRequest {
    /// Free-text keyword search.
    Keyword(String),
    /// Every ad of one advertiser page.
    Page { page_id: String },
}

impl SearchRequest {
    #[must_use]
    pub fn keyword(query: impl Into<String>) -> Self {
        Self::Keyword(query.into())
    }

    #[must_use]
    pub fn page(page_id: impl Into<String>) -> Self {
        Self::Page {
            page_id: page_id.into(),
        }
    }

    /// Short label for logs and diagnostics.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Keyword(q) => q.clone(),
            Self::Page { page_id } => format!("page:{page_id}"),
        }
    }

    /// Build the search URL for this request under the given filters.
    #[must_use]
    pub fn url(&self, filters: &SearchFilters) -> String {
        let country = utf8_percent_encode(&filters.country, NON_ALPHANUMERIC);
        let mut url = format!(
            "{LIBRARY_URL}?active_status={}&ad_type={}&country={country}",
            filters.status.as_query(),
            filters.ad_type.as_query(),
        );
        match self {
            Self::Keyword(query) => {
                let encoded = utf8_percent_encode(query, NON_ALPHANUMERIC);
                url.push_str(&format!("&q={encoded}&search_type=keyword_unordered"));
            }
            Self::Page { page_id } => {
                let encoded = utf8_percent_encode(page_id, NON_ALPHANUMERIC);
                url.push_str(&format!("&view_all_page_id={encoded}&search_type=page"));
            }
        }
        url.push_str(&format!("&media_type={}", filters.media_type.as_query()));
        url
    }
}
