//! Record classification, selection and advertiser ranking.
//!
//! Everything here is a pure function of its inputs and an explicit
//! reference date, so results are reproducible from a saved scan.

pub mod aggregate;
pub mod classify;
pub mod dedup;
pub mod network;
pub mod select;

#[cfg(test)]
mod test_support;

pub use aggregate::{aggregate_by_advertiser, infer_reference_date, rank_advertisers, relevance_score};
pub use classify::classify;
pub use dedup::{dedup_literal_copies, CAMPAIGN_FLIGHT_MIN};
pub use network::{group_pages_by_domain, link_domain};
pub use select::{select_ads, select_ads_for_brand};
