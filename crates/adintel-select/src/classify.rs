//! Per-record tiering.

use adintel_core::{AdRecord, Classification, Priority, SelectionThresholds, SkipReason};
use chrono::NaiveDate;

/// Classify one record against `now`.
///
/// Returns the classification and the age in days when a launch date
/// parsed. Rules are evaluated in order and the first match wins:
///
/// 1. primary text shorter than the word minimum is thin, whatever its dates;
/// 2. with a launch date, old ads are legacy autopilot and low-impression
///    ads past the test window are failed tests, then the tiers apply
///    (age-only tiers when impressions are withheld);
/// 3. without a launch date, impressions alone decide and nothing is dropped.
#[must_use]
pub fn classify(
    record: &AdRecord,
    thresholds: &SelectionThresholds,
    now: NaiveDate,
) -> (Classification, Option<i64>) {
    if record.word_count() < thresholds.min_primary_text_words {
        let age = record.launch_date().map(|d| age_in_days(d, now));
        return (Classification::Skipped(SkipReason::ThinText), age);
    }

    let impressions = record.impression_lower;
    let Some(launch) = record.launch_date() else {
        return (
            Classification::Selected(tier_by_impressions(impressions, thresholds)),
            None,
        );
    };

    let age = age_in_days(launch, now);
    (classify_dated(age, impressions, thresholds), Some(age))
}

/// Whole days between launch and `now`. Launches dated after `now` count as
/// launched today.
fn age_in_days(launch: NaiveDate, now: NaiveDate) -> i64 {
    (now - launch).num_days().max(0)
}

fn classify_dated(age: i64, impressions: u64, t: &SelectionThresholds) -> Classification {
    if age >= t.skip_older_than_days {
        return Classification::Skipped(SkipReason::LegacyAutopilot);
    }
    if impressions > 0 && impressions < t.failed_test_max_impressions && age > t.failed_test_min_days
    {
        return Classification::Skipped(SkipReason::FailedTest);
    }

    let tier = if impressions == 0 {
        // Impression data withheld: recency alone.
        if age <= t.active_winner_max_days {
            Some(Priority::P1ActiveWinner)
        } else if age <= t.proven_recent_max_days {
            Some(Priority::P2ProvenRecent)
        } else if age <= t.recent_moderate_max_days {
            Some(Priority::P4RecentModerate)
        } else {
            None
        }
    } else if age <= t.active_winner_max_days && impressions >= t.active_winner_min_impressions {
        Some(Priority::P1ActiveWinner)
    } else if age <= t.proven_recent_max_days && impressions >= t.proven_recent_min_impressions {
        Some(Priority::P2ProvenRecent)
    } else if age <= t.strategic_direction_max_days {
        Some(Priority::P3StrategicDirection)
    } else if age <= t.recent_moderate_max_days && impressions >= t.recent_moderate_min_impressions
    {
        Some(Priority::P4RecentModerate)
    } else {
        None
    };

    tier.map_or(
        Classification::Skipped(SkipReason::BelowThreshold),
        Classification::Selected,
    )
}

fn tier_by_impressions(impressions: u64, t: &SelectionThresholds) -> Priority {
    if impressions >= t.active_winner_min_impressions {
        Priority::P1ActiveWinner
    } else if impressions >= t.proven_recent_min_impressions {
        Priority::P2ProvenRecent
    } else {
        Priority::P4RecentModerate
    }
}

#[cfg(test)]
#[path = "classify_test.rs"]
mod tests;
