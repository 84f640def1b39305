//! Product-category inference and filtering.
//!
//! A lexicon pass labels most records without any external call; records
//! it cannot place are handed to the analysis service.

use std::collections::HashSet;

use adintel_core::{AdRecord, ProductCategory};
use adintel_select::link_domain;

use crate::analysis::AnalysisService;

/// Category lexicon. Single words match whole tokens; phrases match as
/// substrings of the normalized text. Earlier categories win ties.
const LEXICON: &[(ProductCategory, &[&str])] = &[
    (
        ProductCategory::Supplement,
        &[
            "capsule", "capsules", "pill", "pills", "tablet", "tablets", "softgel", "softgels",
            "gummies", "supplement", "supplements", "vitamin", "vitamins", "mineral", "minerals",
            "herbal", "extract", "mg", "mcg", "dosage", "serving", "servings", "probiotic",
            "probiotics", "collagen", "magnesium", "ashwagandha", "proprietary blend",
        ],
    ),
    (
        ProductCategory::Skincare,
        &[
            "serum", "cream", "lotion", "moisturizer", "skincare", "cleanser", "spf", "retinol",
            "wrinkles", "wrinkle", "complexion", "toner", "anti aging",
        ],
    ),
    (
        ProductCategory::Device,
        &[
            "device", "gadget", "machine", "massager", "rechargeable", "battery", "wearable",
            "red light", "usb", "bluetooth",
        ],
    ),
    (
        ProductCategory::Tool,
        &["tool", "tools", "kit", "equipment", "brush", "roller", "scraper"],
    ),
    (
        ProductCategory::Apparel,
        &[
            "shirt", "shirts", "dress", "leggings", "hoodie", "jacket", "shoes", "sneakers",
            "apparel", "clothing", "bra",
        ],
    ),
    (
        ProductCategory::Software,
        &["app", "software", "download", "saas", "dashboard", "platform", "ios", "android"],
    ),
    (
        ProductCategory::InfoProduct,
        &[
            "course", "masterclass", "ebook", "webinar", "workshop", "training", "guidebook",
            "free guide", "online program",
        ],
    ),
    (
        ProductCategory::Service,
        &[
            "coaching", "coach", "consultation", "consult", "appointment", "clinic", "therapist",
            "agency", "book a call",
        ],
    ),
    (
        ProductCategory::FoodBeverage,
        &[
            "snack", "snacks", "coffee", "tea", "drink", "drinks", "recipe", "meal", "meals",
            "protein bar", "flavor", "flavors",
        ],
    ),
];

/// All classifiable text of a record, lowercased.
#[must_use]
pub fn record_text(record: &AdRecord) -> String {
    let domain = record.link_url.as_deref().and_then(link_domain);
    [
        record.primary_text.as_deref(),
        record.headline.as_deref(),
        record.cta_text.as_deref(),
        domain.as_deref(),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" ")
    .to_lowercase()
}

/// Lexicon classification. `Unknown` when no term matches.
#[must_use]
pub fn classify_text(text: &str) -> ProductCategory {
    let normalized: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    let tokens: HashSet<&str> = normalized.split_whitespace().collect();
    let spaced = format!(" {} ", normalized.split_whitespace().collect::<Vec<_>>().join(" "));

    let mut best = (ProductCategory::Unknown, 0usize);
    for (category, terms) in LEXICON {
        let hits = terms
            .iter()
            .filter(|term| {
                if term.contains(' ') {
                    spaced.contains(&format!(" {term} "))
                } else {
                    tokens.contains(*term)
                }
            })
            .count();
        if hits > best.1 {
            best = (*category, hits);
        }
    }
    best.0
}

/// Fill in `product_category` for every record still `Unknown`: lexicon
/// first, then the analysis service. Service failures leave the record
/// `Unknown`. Returns how many records the service was asked about.
pub async fn categorize_records(records: &mut [AdRecord], analysis: &dyn AnalysisService) -> usize {
    let mut service_calls = 0;
    for record in records
        .iter_mut()
        .filter(|r| r.product_category == ProductCategory::Unknown)
    {
        let text = record_text(record);
        let by_lexicon = classify_text(&text);
        if by_lexicon != ProductCategory::Unknown {
            record.product_category = by_lexicon;
            continue;
        }
        if text.trim().is_empty() {
            continue;
        }

        service_calls += 1;
        match analysis.classify(&text).await {
            Ok(category) => record.product_category = category,
            Err(e) => {
                tracing::warn!(ad_id = %record.ad_id, error = %e, "category classification failed");
            }
        }
    }
    service_calls
}

/// Most frequent category, ignoring `Unknown`. Ties go to the category
/// seen first. `Unknown` when nothing is categorized.
#[must_use]
pub fn dominant_category(records: &[AdRecord]) -> ProductCategory {
    let mut counts: Vec<(ProductCategory, usize)> = Vec::new();
    for record in records
        .iter()
        .filter(|r| r.product_category != ProductCategory::Unknown)
    {
        match counts.iter_mut().find(|(c, _)| *c == record.product_category) {
            Some((_, n)) => *n += 1,
            None => counts.push((record.product_category, 1)),
        }
    }

    let mut best = (ProductCategory::Unknown, 0usize);
    for (category, n) in counts {
        if n > best.1 {
            best = (category, n);
        }
    }
    best.0
}

/// Keep records of `target` plus uncategorized ones. An `Unknown` target
/// keeps everything.
#[must_use]
pub fn filter_to_category(records: &[AdRecord], target: ProductCategory) -> Vec<AdRecord> {
    records
        .iter()
        .filter(|r| {
            target == ProductCategory::Unknown
                || r.product_category == target
                || r.product_category == ProductCategory::Unknown
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categorized(id: &str, category: ProductCategory) -> AdRecord {
        let mut r = AdRecord::new(id, "Brand");
        r.product_category = category;
        r
    }

    #[test]
    fn lexicon_matches_whole_tokens() {
        assert_eq!(
            classify_text("Two capsules a day, 400mg of magnesium."),
            ProductCategory::Supplement
        );
        // Terms never match inside longer tokens.
        assert_eq!(classify_text("see imgur for pics"), ProductCategory::Unknown);
    }

    #[test]
    fn lexicon_matches_phrases() {
        assert_eq!(
            classify_text("Our anti-aging routine fights wrinkles"),
            ProductCategory::Skincare
        );
        assert_eq!(classify_text("Book a call today"), ProductCategory::Service);
    }

    #[test]
    fn more_hits_win() {
        assert_eq!(
            classify_text("Join the masterclass and the free workshop; the course includes a tool"),
            ProductCategory::InfoProduct
        );
    }

    #[test]
    fn dominant_ignores_unknown() {
        let records = vec![
            categorized("1", ProductCategory::Unknown),
            categorized("2", ProductCategory::Unknown),
            categorized("3", ProductCategory::Unknown),
            categorized("4", ProductCategory::Device),
            categorized("5", ProductCategory::Supplement),
            categorized("6", ProductCategory::Supplement),
        ];
        assert_eq!(dominant_category(&records), ProductCategory::Supplement);
    }

    #[test]
    fn dominant_tie_goes_to_first_seen() {
        let records = vec![
            categorized("1", ProductCategory::Device),
            categorized("2", ProductCategory::Supplement),
        ];
        assert_eq!(dominant_category(&records), ProductCategory::Device);
        assert_eq!(dominant_category(&[]), ProductCategory::Unknown);
    }

    #[test]
    fn filter_keeps_target_and_unknown() {
        let records = vec![
            categorized("1", ProductCategory::Supplement),
            categorized("2", ProductCategory::Device),
            categorized("3", ProductCategory::Unknown),
        ];
        let kept: Vec<String> = filter_to_category(&records, ProductCategory::Supplement)
            .into_iter()
            .map(|r| r.ad_id)
            .collect();
        assert_eq!(kept, vec!["1", "3"]);
        assert_eq!(filter_to_category(&records, ProductCategory::Unknown).len(), 3);
    }
}
