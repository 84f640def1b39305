//! Per-crawl deduplication state.

use std::collections::HashSet;

use adintel_core::AdRecord;

/// Accumulates records for one crawl. The first record seen for an `ad_id`
/// wins and later copies are discarded.
#[derive(Debug, Default)]
pub struct CrawlSession {
    seen: HashSet<String>,
    records: Vec<AdRecord>,
}

impl CrawlSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a batch, stamping each new record with its first-seen position.
    /// Returns how many records were new.
    pub fn merge(&mut self, batch: impl IntoIterator<Item = AdRecord>) -> usize {
        let before = self.records.len();
        for mut record in batch {
            if self.seen.contains(&record.ad_id) {
                continue;
            }
            self.seen.insert(record.ad_id.clone());
            record.scrape_position = self.records.len();
            self.records.push(record);
        }
        self.records.len() - before
    }

    #[must_use]
    pub fn contains(&self, ad_id: &str) -> bool {
        self.seen.contains(ad_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn records(&self) -> &[AdRecord] {
        &self.records
    }

    /// Records in first-seen order, truncated to `max`.
    #[must_use]
    pub fn into_records(mut self, max: usize) -> Vec<AdRecord> {
        self.records.truncate(max);
        self.records
    }
}
