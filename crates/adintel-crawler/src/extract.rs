//! Field extraction from discovered ad cards.
//!
//! Extraction never fails a card for missing fields: anything that cannot be
//! located stays `None` (or zero for ranges). A card is dropped only when it
//! has no ad id, no primary text and no media at all.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use adintel_core::{AdRecord, AdType, Platform};
use chrono::{DateTime, Utc};
use regex::Regex;
use sha2::{Digest, Sha256};
use url::Url;

use crate::discovery::ad_id_from_href;
use crate::dom::{DomSnapshot, NodeId};

const SITE_BASE: &str = "https://www.facebook.com/";

const FIRST_PARTY_HOSTS: [&str; 5] = [
    "facebook.com",
    "fb.com",
    "fb.me",
    "instagram.com",
    "messenger.com",
];

pub const CTA_LABELS: [&str; 20] = [
    "Shop now",
    "Learn more",
    "Sign up",
    "Order now",
    "Buy now",
    "Get offer",
    "Book now",
    "Subscribe",
    "Apply now",
    "Contact us",
    "Download",
    "Get started",
    "Watch more",
    "Send message",
    "Get quote",
    "Install now",
    "Play game",
    "Listen now",
    "Donate now",
    "See menu",
];

const METADATA_PREFIXES: [&str; 10] = [
    "Library ID",
    "Started running",
    "Platforms",
    "Sponsored",
    "Active",
    "Inactive",
    "See ad details",
    "Impressions",
    "Amount spent",
    "This ad has multiple versions",
];

static LIBRARY_ID_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Library ID:?\s*(\d{6,})").expect("valid regex"));

static PAGE_ID_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[?&](?:view_all_page_id|page_id)=(\d+)").expect("valid regex")
});

static STARTED_RUNNING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"Started running on\s+([A-Z][a-z]{2,8}\.? \d{1,2}, \d{4}|\d{1,2} [A-Z][a-z]{2,8} \d{4}|\d{4}-\d{2}-\d{2})",
    )
    .expect("valid regex")
});

static IMPRESSIONS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Impressions:?\s*([<>]?\s*[\d.,]+\s*[KMB]?(?:\s*[-–]\s*[\d.,]+\s*[KMB]?)?\+?)")
        .expect("valid regex")
});

static SPEND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:Amount spent|Spend)[^:$€£]*:?\s*(<)?\s*([$€£])\s*([\d.,]+\s*[KM]?)(?:\s*[-–]\s*[$€£]?\s*([\d.,]+\s*[KM]?))?",
    )
    .expect("valid regex")
});

/// Extract every card, assigning no positions; the session numbers them.
#[must_use]
pub fn extract_records(
    snap: &DomSnapshot,
    cards: &[NodeId],
    scraped_at: DateTime<Utc>,
) -> Vec<AdRecord> {
    cards
        .iter()
        .filter_map(|card| extract_card(snap, *card, scraped_at))
        .collect()
}

/// Extract one card, or `None` when it carries nothing identifiable.
#[must_use]
pub fn extract_card(snap: &DomSnapshot, card: NodeId, scraped_at: DateTime<Utc>) -> Option<AdRecord> {
    let text = snap.text_content(card);
    let anchors = snap.anchors(card);
    let hrefs: Vec<&str> = anchors
        .iter()
        .filter_map(|a| snap.node(*a).attr("href"))
        .collect();

    let library_id = hrefs
        .iter()
        .find_map(|h| ad_id_from_href(h))
        .map(str::to_string)
        .or_else(|| {
            LIBRARY_ID_TEXT
                .captures(&text)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
        });

    let page_name = page_name(snap, &anchors).unwrap_or_else(|| "Unknown".to_string());
    let primary_text = primary_text(snap, card);
    let (ad_type, media_url) = media(snap, card);

    if library_id.is_none() && primary_text.is_none() && media_url.is_none() {
        return None;
    }

    let ad_id = library_id
        .unwrap_or_else(|| fallback_ad_id(&page_name, primary_text.as_deref().unwrap_or_default()));

    let outbound = anchors
        .iter()
        .find_map(|a| snap.node(*a).attr("href").and_then(outbound_url).map(|u| (*a, u)));

    let mut record = AdRecord::new(ad_id, page_name);
    record.page_id = hrefs.iter().find_map(|h| {
        PAGE_ID_PARAM
            .captures(h)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    });
    record.primary_text = primary_text;
    record.ad_type = ad_type;
    record.media_url = media_url;
    record.cta_text = cta_text(snap, card);
    record.headline = outbound.as_ref().and_then(|(anchor, _)| headline(snap, *anchor));
    record.link_url = outbound.map(|(_, url)| url);
    record.brand_name = record.link_url.as_deref().and_then(|link| {
        let copy = [record.primary_text.as_deref(), record.headline.as_deref()];
        brand_in_copy(link, copy.into_iter().flatten())
    });
    record.started_running = STARTED_RUNNING
        .captures(&text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());
    record.platforms = platforms(&text);
    if let Some((lower, upper)) = IMPRESSIONS
        .captures(&text)
        .and_then(|c| c.get(1))
        .and_then(|m| parse_impressions(m.as_str()))
    {
        record.impression_lower = lower;
        record.impression_upper = upper;
    }
    if let Some((lower, upper, currency)) = parse_spend(&text) {
        record.spend_lower = lower;
        record.spend_upper = upper;
        record.spend_currency = currency.to_string();
    }
    record.scraped_at = scraped_at;
    Some(record)
}

/// Content hash used when the card exposes no library id.
#[must_use]
pub fn fallback_ad_id(page_name: &str, primary_text: &str) -> String {
    let prefix: String = primary_text.chars().take(200).collect();
    let digest = Sha256::digest(format!("{page_name}{prefix}").as_bytes());
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    hex[..16].to_string()
}

/// Brand as the copy spells it: the first word whose letters and digits,
/// case-folded, equal those of the landing domain's second-level label. For
/// `sleepwell.com` the copy word `SleepWell+` yields `SleepWell`.
#[must_use]
pub fn brand_in_copy<'a>(link_url: &str, copy: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let url = Url::parse(link_url).ok()?;
    let labels: Vec<&str> = url.host_str()?.split('.').filter(|l| !l.is_empty()).collect();
    if labels.len() < 2 {
        return None;
    }
    let stem = fold(labels[labels.len() - 2]);
    if stem.chars().count() < 3 {
        return None;
    }

    copy.into_iter()
        .flat_map(str::split_whitespace)
        .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()))
        .find(|word| fold(word) == stem)
        .map(str::to_string)
}

fn fold(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn resolve(href: &str) -> Option<Url> {
    Url::parse(SITE_BASE).ok()?.join(href).ok()
}

fn is_first_party(url: &Url) -> bool {
    url.host_str().is_some_and(|host| {
        FIRST_PARTY_HOSTS
            .iter()
            .any(|fp| host == *fp || host.ends_with(&format!(".{fp}")))
    })
}

/// Advertiser landing page behind an anchor, unwrapping the click redirector.
#[must_use]
pub fn outbound_url(href: &str) -> Option<String> {
    let url = resolve(href)?;
    if url.host_str() == Some("l.facebook.com") && url.path() == "/l.php" {
        let target = url.query_pairs().find(|(k, _)| k == "u")?.1.into_owned();
        return outbound_url(&target);
    }
    if is_first_party(&url) || !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    Some(url.to_string())
}

fn is_page_link(href: &str) -> bool {
    resolve(href).is_some_and(|url| {
        is_first_party(&url)
            && url.host_str() != Some("l.facebook.com")
            && !url.path().starts_with("/ads/library")
            && url.path() != "/"
    })
}

fn page_name(snap: &DomSnapshot, anchors: &[NodeId]) -> Option<String> {
    anchors.iter().find_map(|a| {
        let href = snap.node(*a).attr("href")?;
        if !is_page_link(href) {
            return None;
        }
        let name = snap.text_content(*a);
        (!name.is_empty()).then_some(name)
    })
}

fn is_metadata(text: &str) -> bool {
    METADATA_PREFIXES.iter().any(|p| text.starts_with(p))
}

fn inside_anchor(snap: &DomSnapshot, id: NodeId, card: NodeId) -> bool {
    snap.node(id).is("a")
        || snap
            .ancestors(id)
            .take_while(|a| *a != card)
            .any(|a| snap.node(a).is("a"))
}

fn primary_text(snap: &DomSnapshot, card: NodeId) -> Option<String> {
    let descendants = snap.descendants(card);

    let pre_wrapped = descendants.iter().find(|id| {
        snap.node(**id)
            .attr("style")
            .is_some_and(|s| s.contains("white-space"))
            && !inside_anchor(snap, **id, card)
    });
    if let Some(id) = pre_wrapped {
        let text = snap.text_content(*id);
        if !text.is_empty() {
            return Some(text);
        }
    }

    descendants
        .iter()
        .filter(|id| !inside_anchor(snap, **id, card))
        .map(|id| snap.node(*id).text.as_str())
        .filter(|t| !t.is_empty() && !is_metadata(t))
        .max_by_key(|t| t.chars().count())
        .map(str::to_string)
}

fn is_cta(text: &str) -> bool {
    CTA_LABELS.iter().any(|l| l.eq_ignore_ascii_case(text))
}

fn cta_text(snap: &DomSnapshot, card: NodeId) -> Option<String> {
    snap.descendants(card).into_iter().find_map(|id| {
        let node = snap.node(id);
        let candidate = if node.role() == Some("button") || node.is("button") || node.is("a") {
            snap.text_content(id)
        } else {
            node.text.clone()
        };
        is_cta(&candidate).then_some(candidate)
    })
}

fn looks_like_domain(text: &str) -> bool {
    !text.contains(' ') && text.contains('.')
}

fn headline(snap: &DomSnapshot, outbound_anchor: NodeId) -> Option<String> {
    snap.subtree(outbound_anchor)
        .into_iter()
        .map(|id| snap.node(id).text.as_str())
        .find(|t| t.chars().count() >= 2 && !looks_like_domain(t) && !is_cta(t))
        .map(str::to_string)
}

fn media(snap: &DomSnapshot, card: NodeId) -> (AdType, Option<String>) {
    let descendants = snap.descendants(card);

    if let Some(video) = descendants.iter().find(|id| snap.node(**id).is("video")) {
        let src = snap.node(*video).attr("src").map(str::to_string).or_else(|| {
            snap.descendants(*video)
                .into_iter()
                .find(|s| snap.node(*s).is("source"))
                .and_then(|s| snap.node(s).attr("src"))
                .map(str::to_string)
        });
        return (AdType::Video, src);
    }

    let mut images: Vec<&str> = Vec::new();
    for id in &descendants {
        let node = snap.node(*id);
        if !node.is("img") || is_icon(node.attr("width")) || is_icon(node.attr("height")) {
            continue;
        }
        let in_page_link = snap
            .ancestors(*id)
            .take_while(|a| *a != card)
            .any(|a| snap.node(a).attr("href").is_some_and(is_page_link));
        if in_page_link {
            continue;
        }
        if let Some(src) = node.attr("src") {
            if !images.contains(&src) {
                images.push(src);
            }
        }
    }

    match images.as_slice() {
        [] => (AdType::Unknown, None),
        [only] => (AdType::Static, Some((*only).to_string())),
        [first, ..] => (AdType::Carousel, Some((*first).to_string())),
    }
}

fn is_icon(dimension: Option<&str>) -> bool {
    dimension
        .and_then(|d| d.trim_end_matches("px").parse::<u32>().ok())
        .is_some_and(|d| d <= 60)
}

fn platforms(text: &str) -> BTreeSet<Platform> {
    Platform::LABELS
        .iter()
        .filter(|(label, _)| text.contains(label))
        .map(|(_, p)| *p)
        .collect()
}

/// `"1.5K"` → 1500.0. Commas are thousands separators.
fn parse_scaled(raw: &str) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|c| !c.is_whitespace() && *c != ',').collect();
    let (digits, multiplier) = match cleaned.chars().last()? {
        'K' => (&cleaned[..cleaned.len() - 1], 1_000.0),
        'M' => (&cleaned[..cleaned.len() - 1], 1_000_000.0),
        'B' => (&cleaned[..cleaned.len() - 1], 1_000_000_000.0),
        _ => (cleaned.as_str(), 1.0),
    };
    let value: f64 = digits.parse().ok()?;
    (value >= 0.0).then_some(value * multiplier)
}

/// Whole counts such as impressions: `"12K"` → 12000.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_count(raw: &str) -> Option<u64> {
    parse_scaled(raw).map(|v| v.round() as u64)
}

/// Parse an impressions range such as `10K-50K`, `<1K`, `1M+` or `5,000`.
#[must_use]
pub fn parse_impressions(raw: &str) -> Option<(u64, Option<u64>)> {
    let raw = raw.trim();
    if let Some(rest) = raw.strip_prefix('<') {
        return Some((0, Some(parse_count(rest)?)));
    }
    if let Some(rest) = raw.strip_prefix('>') {
        return Some((parse_count(rest)?, None));
    }
    if let Some(rest) = raw.strip_suffix('+') {
        return Some((parse_count(rest)?, None));
    }
    match raw.split_once(['-', '–']) {
        Some((lo, hi)) => Some((parse_count(lo)?, Some(parse_count(hi)?))),
        None => {
            let exact = parse_count(raw)?;
            Some((exact, Some(exact)))
        }
    }
}

/// Parse a spend range such as `$100-$199` into bounds and an ISO currency.
/// Amounts keep their cents.
#[must_use]
pub fn parse_spend(text: &str) -> Option<(f64, Option<f64>, &'static str)> {
    let caps = SPEND.captures(text)?;
    let currency = match caps.get(2)?.as_str() {
        "€" => "EUR",
        "£" => "GBP",
        _ => "USD",
    };
    let first = parse_scaled(caps.get(3)?.as_str())?;
    if caps.get(1).is_some() {
        return Some((0.0, Some(first), currency));
    }
    let upper = match caps.get(4) {
        Some(m) => Some(parse_scaled(m.as_str())?),
        None => Some(first),
    };
    Some((first, upper, currency))
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
