//! Literal-duplicate removal.
//!
//! Advertisers often run the same copy several times with a different
//! creative. Records are grouped by `(page_name, primary_text)`. Small
//! groups are literal duplicates and collapse to their strongest member;
//! groups of [`CAMPAIGN_FLIGHT_MIN`] or more are a deliberate multi-variant
//! flight and are kept whole.

use std::collections::HashMap;

use adintel_core::ClassifiedAd;

/// Smallest group treated as an intentional campaign flight.
pub const CAMPAIGN_FLIGHT_MIN: usize = 4;

/// Split `ads` into `(kept, removed)`, preserving input order in both.
///
/// Within a small group the kept member has the highest `impression_lower`;
/// ties go to the lowest `scrape_position`.
#[must_use]
pub fn dedup_literal_copies(ads: Vec<ClassifiedAd>) -> (Vec<ClassifiedAd>, Vec<ClassifiedAd>) {
    let mut groups: HashMap<(&str, &str), Vec<usize>> = HashMap::new();
    for (idx, ca) in ads.iter().enumerate() {
        let key = (
            ca.ad.page_name.as_str(),
            ca.ad.primary_text.as_deref().unwrap_or(""),
        );
        groups.entry(key).or_default().push(idx);
    }

    let mut keep = vec![true; ads.len()];
    for members in groups.values() {
        if members.len() == 1 || members.len() >= CAMPAIGN_FLIGHT_MIN {
            continue;
        }
        let best = members.iter().copied().min_by(|a, b| {
            let (a, b) = (&ads[*a].ad, &ads[*b].ad);
            b.impression_lower
                .cmp(&a.impression_lower)
                .then(a.scrape_position.cmp(&b.scrape_position))
        });
        for idx in members {
            keep[*idx] = Some(*idx) == best;
        }
    }

    let (kept, removed): (Vec<_>, Vec<_>) = ads
        .into_iter()
        .zip(keep)
        .partition(|(_, keep)| *keep);
    let kept: Vec<ClassifiedAd> = kept.into_iter().map(|(ca, _)| ca).collect();
    let removed: Vec<ClassifiedAd> = removed.into_iter().map(|(ca, _)| ca).collect();

    if !removed.is_empty() {
        tracing::debug!(removed = removed.len(), kept = kept.len(), "removed literal duplicates");
    }
    (kept, removed)
}
