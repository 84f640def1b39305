use adintel_core::AdRecord;
use chrono::NaiveDate;

pub(crate) fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// A primary text of exactly `n` words.
pub(crate) fn words(n: usize) -> String {
    (0..n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
}

/// A record launched `age` days before `now` with `n_words` words of copy.
pub(crate) fn record(
    id: &str,
    page: &str,
    age: Option<i64>,
    impressions: u64,
    n_words: usize,
    now: NaiveDate,
) -> AdRecord {
    let mut r = AdRecord::new(id, page);
    r.primary_text = Some(words(n_words));
    r.impression_lower = impressions;
    r.started_running = age.map(|a| (now - chrono::Duration::days(a)).format("%Y-%m-%d").to_string());
    r
}
