//! Classify, dedup and order a batch of records.

use adintel_core::{
    AdRecord, Classification, ClassifiedAd, SelectionResult, SelectionStats, SelectionThresholds,
    SkipReason,
};
use chrono::NaiveDate;

use crate::classify::classify;
use crate::dedup::dedup_literal_copies;

/// Run the full selection pipeline over `records`.
///
/// Selected ads are ordered by tier, then by impressions descending; the
/// sort is stable so equal keys keep scrape order. `limit` truncates the
/// selected list after ordering. Literal duplicates move to `skipped` with
/// [`SkipReason::Duplicate`].
#[must_use]
pub fn select_ads(
    records: &[AdRecord],
    thresholds: &SelectionThresholds,
    limit: Option<usize>,
    now: NaiveDate,
) -> SelectionResult {
    let (selected, mut skipped): (Vec<ClassifiedAd>, Vec<ClassifiedAd>) = records
        .iter()
        .map(|record| {
            let (classification, days_since_launch) = classify(record, thresholds, now);
            ClassifiedAd {
                ad: record.clone(),
                classification,
                days_since_launch,
            }
        })
        .partition(|ca| matches!(ca.classification, Classification::Selected(_)));

    let (mut selected, duplicates) = dedup_literal_copies(selected);
    let duplicates_removed = duplicates.len();
    skipped.extend(duplicates.into_iter().map(|mut ca| {
        ca.classification = Classification::Skipped(SkipReason::Duplicate);
        ca
    }));

    selected.sort_by(|a, b| {
        a.priority()
            .cmp(&b.priority())
            .then(b.ad.impression_lower.cmp(&a.ad.impression_lower))
    });
    if let Some(limit) = limit {
        selected.truncate(limit);
    }

    let mut stats = SelectionStats {
        total_scanned: records.len(),
        total_selected: selected.len(),
        total_skipped: skipped.len(),
        duplicates_removed,
        ..SelectionStats::default()
    };
    for p in selected.iter().filter_map(ClassifiedAd::priority) {
        *stats.by_priority.entry(p).or_default() += 1;
    }
    for r in skipped.iter().filter_map(ClassifiedAd::skip_reason) {
        *stats.skip_reasons.entry(r).or_default() += 1;
    }

    tracing::debug!(
        scanned = stats.total_scanned,
        selected = stats.total_selected,
        skipped = stats.total_skipped,
        duplicates = stats.duplicates_removed,
        "selection complete"
    );

    SelectionResult {
        selected,
        skipped,
        stats,
    }
}

/// [`select_ads`] restricted to records whose `page_name` equals `page_name`.
#[must_use]
pub fn select_ads_for_brand(
    records: &[AdRecord],
    page_name: &str,
    limit: Option<usize>,
    thresholds: &SelectionThresholds,
    now: NaiveDate,
) -> SelectionResult {
    let own: Vec<AdRecord> = records
        .iter()
        .filter(|r| r.page_name == page_name)
        .cloned()
        .collect();
    select_ads(&own, thresholds, limit, now)
}

#[cfg(test)]
mod tests {
    use adintel_core::Priority;

    use super::*;
    use crate::test_support::{record, ymd};

    fn now() -> NaiveDate {
        ymd(2025, 6, 1)
    }

    fn ids(ads: &[ClassifiedAd]) -> Vec<&str> {
        ads.iter().map(|ca| ca.ad.ad_id.as_str()).collect()
    }

    fn batch() -> Vec<AdRecord> {
        let n = now();
        let mut records = vec![
            record("p4", "Brand", Some(45), 0, 80, n),
            record("p1-low", "Brand", Some(3), 60_000, 80, n),
            record("p1-high", "Brand", Some(2), 90_000, 80, n),
            record("thin", "Brand", Some(2), 90_000, 5, n),
            record("legacy", "Brand", Some(365), 90_000, 80, n),
            record("p2", "Other", Some(20), 20_000, 80, n),
        ];
        for (i, r) in records.iter_mut().enumerate() {
            r.scrape_position = i;
            r.primary_text = Some(format!("{} #{i}", r.primary_text.clone().unwrap_or_default()));
        }
        records
    }

    #[test]
    fn orders_by_tier_then_impressions() {
        let result = select_ads(&batch(), &SelectionThresholds::default(), None, now());
        assert_eq!(ids(&result.selected), vec!["p1-high", "p1-low", "p2", "p4"]);
        assert_eq!(ids(&result.skipped), vec!["thin", "legacy"]);
    }

    #[test]
    fn stats_account_for_every_record() {
        let result = select_ads(&batch(), &SelectionThresholds::default(), None, now());
        let stats = &result.stats;
        assert_eq!(stats.total_scanned, 6);
        assert_eq!(stats.total_selected + stats.total_skipped, 6);
        assert_eq!(stats.by_priority.get(&Priority::P1ActiveWinner), Some(&2));
        assert_eq!(stats.skip_reasons.get(&SkipReason::ThinText), Some(&1));
        assert_eq!(stats.skip_reasons.get(&SkipReason::LegacyAutopilot), Some(&1));
    }

    #[test]
    fn limit_applies_after_ordering() {
        let result = select_ads(&batch(), &SelectionThresholds::default(), Some(2), now());
        assert_eq!(ids(&result.selected), vec!["p1-high", "p1-low"]);
        assert_eq!(result.stats.total_selected, 2);
    }

    #[test]
    fn duplicates_are_reported_as_skipped() {
        let n = now();
        let mut a = record("a", "Brand", Some(5), 100_000, 80, n);
        let mut b = record("b", "Brand", Some(5), 70_000, 80, n);
        a.scrape_position = 0;
        b.scrape_position = 1;
        let result = select_ads(&[a, b], &SelectionThresholds::default(), None, n);

        assert_eq!(ids(&result.selected), vec!["a"]);
        assert_eq!(result.stats.duplicates_removed, 1);
        assert_eq!(result.skipped[0].skip_reason(), Some(SkipReason::Duplicate));
        assert_eq!(result.stats.skip_reasons.get(&SkipReason::Duplicate), Some(&1));
    }

    #[test]
    fn brand_selection_ignores_other_pages() {
        let result = select_ads_for_brand(
            &batch(),
            "Other",
            None,
            &SelectionThresholds::default(),
            now(),
        );
        assert_eq!(ids(&result.selected), vec!["p2"]);
        assert_eq!(result.stats.total_scanned, 1);
    }

    #[test]
    fn empty_input_is_empty_result() {
        let result = select_ads(&[], &SelectionThresholds::default(), Some(10), now());
        assert!(result.selected.is_empty());
        assert_eq!(result.stats, SelectionStats::default());
    }
}
