//! Keyword expansion for sparse markets.

use std::collections::HashSet;

use adintel_core::{AdRecord, KeywordContribution, MarketSettings};
use adintel_crawler::CrawlSession;

/// Records found for one keyword. `failed` batches carry no records.
#[derive(Debug, Clone)]
pub struct KeywordBatch {
    pub keyword: String,
    pub records: Vec<AdRecord>,
    pub failed: bool,
}

/// A scan is sparse when it has too few ads or too few distinct advertisers
/// to rank meaningfully.
#[must_use]
pub fn is_sparse(records: &[AdRecord], settings: &MarketSettings) -> bool {
    let brands: HashSet<&str> = records.iter().map(|r| r.page_name.as_str()).collect();
    records.len() < settings.sparse_min_ads || brands.len() < settings.sparse_min_brands
}

/// Clean up suggested keywords: trimmed, non-empty, distinct
/// (case-insensitive), never the primary keyword, at most `limit`.
#[must_use]
pub fn normalize_expansions(primary: &str, suggested: Vec<String>, limit: usize) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::from([primary.trim().to_lowercase()]);
    suggested
        .into_iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty() && seen.insert(k.to_lowercase()))
        .take(limit)
        .collect()
}

/// Merge keyword batches in order, first-seen `ad_id` winning, and report
/// each keyword's unique contribution. The primary keyword goes first.
#[must_use]
pub fn merge_keyword_batches(
    batches: Vec<KeywordBatch>,
) -> (Vec<AdRecord>, Vec<KeywordContribution>) {
    let mut session = CrawlSession::new();
    let mut contributions = Vec::with_capacity(batches.len());
    for batch in batches {
        let ads_found = batch.records.len();
        let unique_ads = session.merge(batch.records);
        contributions.push(KeywordContribution {
            keyword: batch.keyword,
            ads_found,
            unique_ads,
            failed: batch.failed,
        });
    }
    (session.into_records(usize::MAX), contributions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(keyword: &str, ids: &[&str], page: &str) -> KeywordBatch {
        KeywordBatch {
            keyword: keyword.to_string(),
            records: ids.iter().map(|id| AdRecord::new(*id, page)).collect(),
            failed: false,
        }
    }

    #[test]
    fn sparse_on_few_ads_or_few_brands() {
        let settings = MarketSettings::default();
        let few_ads: Vec<AdRecord> = (0..19).map(|i| AdRecord::new(i.to_string(), format!("B{i}"))).collect();
        assert!(is_sparse(&few_ads, &settings));

        let one_brand: Vec<AdRecord> = (0..40).map(|i| AdRecord::new(i.to_string(), "Solo")).collect();
        assert!(is_sparse(&one_brand, &settings));

        let healthy: Vec<AdRecord> = (0..40)
            .map(|i| AdRecord::new(i.to_string(), format!("B{}", i % 8)))
            .collect();
        assert!(!is_sparse(&healthy, &settings));
    }

    #[test]
    fn expansions_are_cleaned_and_capped() {
        let suggested = vec![
            " Fat Burner ".to_string(),
            "weight loss".to_string(),
            "fat burner".to_string(),
            String::new(),
            "metabolism booster".to_string(),
            "appetite suppressant".to_string(),
            "keto pills".to_string(),
        ];
        assert_eq!(
            normalize_expansions("Weight Loss", suggested, 3),
            vec!["Fat Burner", "metabolism booster", "appetite suppressant"]
        );
    }

    #[test]
    fn merge_credits_first_keyword() {
        let (records, contributions) = merge_keyword_batches(vec![
            batch("primary", &["1", "2"], "A"),
            batch("second", &["2", "3"], "B"),
            KeywordBatch {
                keyword: "third".to_string(),
                records: Vec::new(),
                failed: true,
            },
        ]);

        let ids: Vec<&str> = records.iter().map(|r| r.ad_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(records[1].page_name, "A");
        assert_eq!(contributions[0].unique_ads, 2);
        assert_eq!(contributions[1].ads_found, 2);
        assert_eq!(contributions[1].unique_ads, 1);
        assert!(contributions[2].failed);
    }
}
