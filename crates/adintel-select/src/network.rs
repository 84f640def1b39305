//! Pages that point their ads at the same storefront.

use std::collections::BTreeMap;

use adintel_core::{AdRecord, PageNetwork};
use url::Url;

/// Host of an outbound link, lowercased with `www.` removed.
#[must_use]
pub fn link_domain(link: &str) -> Option<String> {
    let url = Url::parse(link).ok()?;
    let host = url.host_str()?.to_ascii_lowercase();
    let host = host.strip_prefix("www.").map_or(host.clone(), str::to_string);
    (!host.is_empty()).then_some(host)
}

/// Group pages by the domain their ads link to.
///
/// Only domains reached by two or more distinct pages form a network.
/// `total_ads` counts the records linking to the domain. Networks are
/// ordered by `total_ads` descending, then domain.
#[must_use]
pub fn group_pages_by_domain(records: &[AdRecord]) -> Vec<PageNetwork> {
    let mut by_domain: BTreeMap<String, (Vec<String>, usize)> = BTreeMap::new();
    for record in records {
        let Some(domain) = record.link_url.as_deref().and_then(link_domain) else {
            continue;
        };
        let (pages, total) = by_domain.entry(domain).or_default();
        *total += 1;
        if !pages.contains(&record.page_name) {
            pages.push(record.page_name.clone());
        }
    }

    let mut networks: Vec<PageNetwork> = by_domain
        .into_iter()
        .filter(|(_, (pages, _))| pages.len() >= 2)
        .map(|(domain, (pages, total_ads))| PageNetwork {
            domain,
            pages,
            total_ads,
        })
        .collect();
    networks.sort_by(|a, b| b.total_ads.cmp(&a.total_ads).then(a.domain.cmp(&b.domain)));

    if !networks.is_empty() {
        tracing::debug!(networks = networks.len(), "grouped pages by outbound domain");
    }
    networks
}
