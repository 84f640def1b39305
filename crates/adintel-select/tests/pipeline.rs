//! Scan-shaped input through selection, aggregation and ranking.

use adintel_core::{AdRecord, Priority, SelectionThresholds, SkipReason};
use adintel_select::{
    aggregate_by_advertiser, group_pages_by_domain, rank_advertisers, select_ads,
    select_ads_for_brand,
};
use chrono::NaiveDate;

const COPY: &str = "Tired of waking up at three in the morning with your mind racing? \
Our nightly blend pairs magnesium glycinate with chamomile and lemon balm so you drift \
off faster and wake up clear headed. No melatonin hangover and no habit forming \
ingredients. Thousands of sleepers made the switch this year. Try it risk free for \
thirty nights and keep the bonus guide either way.";

fn ad(id: &str, page: &str, launched: Option<&str>, impressions: u64, variant: usize) -> AdRecord {
    let mut r = AdRecord::new(id, page);
    r.primary_text = Some(format!("{COPY} Offer {variant}."));
    r.started_running = launched.map(str::to_string);
    r.impression_lower = impressions;
    r.link_url = Some(format!("https://www.{}.test/shop", page.to_lowercase().replace(' ', "")));
    r
}

fn scan() -> Vec<AdRecord> {
    let mut records = vec![
        ad("1001", "Dream Labs", Some("May 28, 2025"), 0, 1),
        ad("1002", "Dream Labs", Some("May 20, 2025"), 0, 2),
        ad("1003", "Dream Labs", Some("Apr 20, 2025"), 0, 3),
        ad("2001", "Night Owl", Some("Jan 2, 2024"), 0, 1),
        ad("2002", "Night Owl", None, 0, 2),
        ad("3001", "Calm Co", Some("2025-05-30"), 0, 1),
        ad("3002", "Calm Co", Some("2025-05-30"), 0, 1),
    ];
    for (i, r) in records.iter_mut().enumerate() {
        r.scrape_position = i;
    }
    records
}

#[test]
fn full_selection_over_a_scan() {
    let now = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
    let result = select_ads(&scan(), &SelectionThresholds::default(), None, now);

    let tiers: Vec<(&str, Option<Priority>)> = result
        .selected
        .iter()
        .map(|ca| (ca.ad.ad_id.as_str(), ca.priority()))
        .collect();
    assert_eq!(
        tiers,
        vec![
            ("1001", Some(Priority::P1ActiveWinner)),
            ("1002", Some(Priority::P1ActiveWinner)),
            ("3001", Some(Priority::P1ActiveWinner)),
            ("1003", Some(Priority::P4RecentModerate)),
            ("2002", Some(Priority::P4RecentModerate)),
        ]
    );
    assert_eq!(result.stats.duplicates_removed, 1);
    assert_eq!(result.stats.skip_reasons.get(&SkipReason::LegacyAutopilot), Some(&1));
}

#[test]
fn brand_selection_honours_limit() {
    let now = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
    let result = select_ads_for_brand(
        &scan(),
        "Dream Labs",
        Some(2),
        &SelectionThresholds::default(),
        now,
    );
    assert_eq!(result.selected.len(), 2);
    assert!(result.selected.iter().all(|ca| ca.ad.page_name == "Dream Labs"));
}

#[test]
fn ranking_rewards_share_of_recent_launches() {
    let entries = aggregate_by_advertiser(&scan(), None, 30);
    let ranked = rank_advertisers(entries);
    let names: Vec<&str> = ranked.iter().map(|e| e.page_name.as_str()).collect();
    assert_eq!(names, vec!["Calm Co", "Dream Labs", "Night Owl"]);
    assert!(ranked.windows(2).all(|w| w[0].relevance_score >= w[1].relevance_score));
}

#[test]
fn distinct_storefronts_form_no_networks() {
    assert!(group_pages_by_domain(&scan()).is_empty());
}
