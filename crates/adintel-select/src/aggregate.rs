//! Per-advertiser roll-up and relevance ranking.

use std::cmp::Ordering;
use std::collections::HashMap;

use adintel_core::{AdRecord, AdvertiserEntry};
use chrono::{Days, NaiveDate};

/// Reference date for recency when none is supplied: one day after the
/// newest parseable launch date. `None` when no record carries one.
#[must_use]
pub fn infer_reference_date(records: &[AdRecord]) -> Option<NaiveDate> {
    records
        .iter()
        .filter_map(AdRecord::launch_date)
        .max()
        .and_then(|d| d.checked_add_days(Days::new(1)))
}

/// Group records by `page_name`, in first-seen order.
///
/// A record counts as recent when it launched no more than `recent_window_days`
/// before the reference date. With `now` unset the reference date is
/// inferred from the records; if that fails nothing counts as recent.
#[must_use]
pub fn aggregate_by_advertiser(
    records: &[AdRecord],
    now: Option<NaiveDate>,
    recent_window_days: i64,
) -> Vec<AdvertiserEntry> {
    let reference = now.or_else(|| infer_reference_date(records));
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut entries: Vec<AdvertiserEntry> = Vec::new();

    for record in records {
        let idx = *index.entry(record.page_name.as_str()).or_insert_with(|| {
            entries.push(AdvertiserEntry::new(record.page_name.clone()));
            entries.len() - 1
        });
        let entry = &mut entries[idx];

        entry.ad_count += 1;
        if entry.page_id.is_none() {
            entry.page_id.clone_from(&record.page_id);
        }

        if let Some(launch) = record.launch_date() {
            entry.active_count += 1;
            if reference.is_some_and(|r| (0..=recent_window_days).contains(&(r - launch).num_days()))
            {
                entry.recent_count += 1;
            }
            entry.earliest_launch = Some(entry.earliest_launch.map_or(launch, |e| e.min(launch)));
            entry.latest_launch = Some(entry.latest_launch.map_or(launch, |l| l.max(launch)));
        }

        entry.total_impression_lower += record.impression_lower;
        if let Some(upper) = record.impression_upper {
            entry.max_impression_upper = entry.max_impression_upper.max(upper);
        }

        if let Some(headline) = record.headline.as_deref() {
            if !entry.headlines.iter().any(|h| h == headline) {
                entry.headlines.push(headline.to_string());
            }
        }
    }

    entries
}

/// Composite relevance: recency share and volume, log-scaled impressions,
/// and a capped bonus for dated ads.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn relevance_score(entry: &AdvertiserEntry) -> f64 {
    let recent = entry.recent_count as f64;
    let recent_ratio = if entry.ad_count > 0 {
        recent / entry.ad_count as f64
    } else {
        0.0
    };
    let recent_score = recent_ratio * 20.0 + (recent * 2.0).min(20.0);

    let impression_score = if entry.total_impression_lower > 0 {
        ((entry.total_impression_lower as f64).log10() * 30.0).min(200.0)
    } else {
        0.0
    };

    let active_bonus = (entry.active_count as f64 * 2.0).min(20.0);

    recent_score + impression_score + active_bonus
}

/// Score and sort advertisers, best first.
///
/// Ties on score fall back to the larger `ad_count`, then `page_name`
/// ascending, so the output order is fully determined by the input set.
#[must_use]
pub fn rank_advertisers(mut entries: Vec<AdvertiserEntry>) -> Vec<AdvertiserEntry> {
    for entry in &mut entries {
        entry.relevance_score = relevance_score(entry);
    }
    entries.sort_by(|a, b| {
        b.relevance_score
            .partial_cmp(&a.relevance_score)
            .unwrap_or(Ordering::Equal)
            .then(b.ad_count.cmp(&a.ad_count))
            .then_with(|| a.page_name.cmp(&b.page_name))
    });
    entries
}

#[cfg(test)]
#[path = "aggregate_test.rs"]
mod tests;
