//! Ad-card selector discovery.
//!
//! The library's markup uses generated class names that change between
//! deploys, so cards are located structurally. Strategies are tried in the
//! order of [`DiscoveryStrategy::ORDER`]; the first that yields cards wins:
//!
//! 1. `AdLinkAncestry`: walk up from an ad-detail link until the level whose
//!    siblings also carry ad-detail links.
//! 2. `ArticleRole`: elements with `role="article"`.
//! 3. `CardShapedChildren`: the container with the most text-heavy children
//!    that hold media or a link.
//! 4. `AnchorBoundingBox`: from each ad link, the first ancestor whose
//!    layout box is card-sized and holds media. Needs a snapshot with boxes.
//!
//! The result is a [`CardSelector`] that can be re-applied to later
//! snapshots of the same page without re-running discovery.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::dom::{DomSnapshot, NodeId};

static AD_ID_IN_HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?&]id=(\d{10,})").expect("valid regex"));

static GENERATED_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:x[a-z0-9]{5,}|_[a-z0-9]{1,6})$").expect("valid regex"));

/// Library ad id carried by an ad-detail link, if any.
#[must_use]
pub fn ad_id_from_href(href: &str) -> Option<&str> {
    if !href.contains("/ads/library") {
        return None;
    }
    AD_ID_IN_HREF
        .captures(href)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str())
}

/// Whether a class token looks hand-written rather than generated.
#[must_use]
pub fn is_semantic_class(token: &str) -> bool {
    token.len() >= 3
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        && token.chars().any(|c| "aeiouAEIOU".contains(c))
        && !GENERATED_CLASS.is_match(token)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryStrategy {
    AdLinkAncestry,
    ArticleRole,
    CardShapedChildren,
    AnchorBoundingBox,
}

impl DiscoveryStrategy {
    pub const ORDER: [Self; 4] = [
        Self::AdLinkAncestry,
        Self::ArticleRole,
        Self::CardShapedChildren,
        Self::AnchorBoundingBox,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::AdLinkAncestry => "ad_link_ancestry",
            Self::ArticleRole => "article_role",
            Self::CardShapedChildren => "card_shaped_children",
            Self::AnchorBoundingBox => "anchor_bounding_box",
        }
    }
}

impl std::fmt::Display for DiscoveryStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Reusable description of where the ad cards are.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CardSelector {
    /// Outermost elements matching a tag plus a role or a semantic class.
    Structural {
        tag: String,
        role: Option<String>,
        class: Option<String>,
    },
    /// The ancestor `depth` levels above every ad-detail link.
    AnchorAncestor { depth: usize },
    /// Outermost elements with the given role.
    Role { role: String },
    /// Card-shaped children of the container at a child-index path.
    ChildrenOf {
        path: Vec<usize>,
        min_text_len: usize,
    },
    /// Card-sized, media-bearing ancestors of ad-detail links.
    AnchorBoxes { min_width: f64, min_height: f64 },
}

impl CardSelector {
    /// Card nodes in document order, without duplicates.
    #[must_use]
    pub fn select(&self, snap: &DomSnapshot) -> Vec<NodeId> {
        match self {
            Self::Structural { tag, role, class } => outermost(
                snap,
                snap.ids().filter(|id| {
                    let node = snap.node(*id);
                    node.tag == *tag
                        && role.as_deref().is_none_or(|r| node.role() == Some(r))
                        && class
                            .as_deref()
                            .is_none_or(|c| node.class_tokens().any(|t| t == c))
                }),
            ),
            Self::AnchorAncestor { depth } => {
                let mut seen = HashSet::new();
                let mut cards: Vec<NodeId> = ad_anchors(snap)
                    .into_iter()
                    .filter_map(|a| snap.ancestors(a).nth(depth.saturating_sub(1)))
                    .filter(|n| seen.insert(*n))
                    .collect();
                cards.sort();
                cards
            }
            Self::Role { role } => outermost(
                snap,
                snap.ids()
                    .filter(|id| snap.node(*id).role() == Some(role.as_str())),
            ),
            Self::ChildrenOf { path, min_text_len } => snap
                .node_at_path(path)
                .map(|container| {
                    snap.node(container)
                        .children
                        .iter()
                        .copied()
                        .filter(|c| is_card_shaped(snap, *c, *min_text_len))
                        .collect()
                })
                .unwrap_or_default(),
            Self::AnchorBoxes {
                min_width,
                min_height,
            } => anchor_boxes(snap, *min_width, *min_height),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Discovery {
    pub strategy: DiscoveryStrategy,
    pub selector: CardSelector,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DiscoveryOutcome {
    Found(Discovery),
    /// No strategy located cards. Callers treat this as zero results.
    NotFound,
}

impl DiscoveryOutcome {
    #[must_use]
    pub fn found(self) -> Option<Discovery> {
        match self {
            Self::Found(d) => Some(d),
            Self::NotFound => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SelectorDiscovery {
    pub max_ancestor_levels: usize,
    pub min_siblings: usize,
    pub min_card_text_len: usize,
    pub min_card_width: f64,
    pub min_card_height: f64,
}

impl Default for SelectorDiscovery {
    fn default() -> Self {
        Self {
            max_ancestor_levels: 8,
            min_siblings: 2,
            min_card_text_len: 50,
            min_card_width: 200.0,
            min_card_height: 150.0,
        }
    }
}

impl SelectorDiscovery {
    /// Run the strategy chain against one snapshot.
    #[must_use]
    pub fn discover(&self, snap: &DomSnapshot) -> DiscoveryOutcome {
        for strategy in DiscoveryStrategy::ORDER {
            let candidate = match strategy {
                DiscoveryStrategy::AdLinkAncestry => self.by_ad_link_ancestry(snap),
                DiscoveryStrategy::ArticleRole => Self::by_article_role(snap),
                DiscoveryStrategy::CardShapedChildren => self.by_card_shaped_children(snap),
                DiscoveryStrategy::AnchorBoundingBox => self.by_anchor_bounding_box(snap),
            };
            match candidate {
                Some(selector) => {
                    tracing::debug!(strategy = %strategy, ?selector, "card selector discovered");
                    return DiscoveryOutcome::Found(Discovery { strategy, selector });
                }
                None => tracing::debug!(strategy = %strategy, "discovery strategy found nothing"),
            }
        }
        DiscoveryOutcome::NotFound
    }

    fn by_ad_link_ancestry(&self, snap: &DomSnapshot) -> Option<CardSelector> {
        let anchors = ad_anchors(snap);
        let first = *anchors.first()?;

        for (level, candidate) in snap
            .ancestors(first)
            .take(self.max_ancestor_levels)
            .enumerate()
        {
            let Some(parent) = snap.node(candidate).parent else {
                break;
            };
            let sibling_ids: HashSet<&str> = snap
                .node(parent)
                .children
                .iter()
                .filter_map(|sibling| first_ad_id(snap, *sibling))
                .collect();
            if sibling_ids.len() < self.min_siblings {
                continue;
            }

            let depth = level + 1;
            if let Some(structural) = structural_selector(snap, candidate) {
                if structural.select(snap).len() >= sibling_ids.len() {
                    return Some(structural);
                }
            }
            return Some(CardSelector::AnchorAncestor { depth });
        }
        None
    }

    fn by_article_role(snap: &DomSnapshot) -> Option<CardSelector> {
        let selector = CardSelector::Role {
            role: "article".to_string(),
        };
        (!selector.select(snap).is_empty()).then_some(selector)
    }

    fn by_card_shaped_children(&self, snap: &DomSnapshot) -> Option<CardSelector> {
        let mut best: Option<(NodeId, usize)> = None;
        for id in snap.ids() {
            let count = snap
                .node(id)
                .children
                .iter()
                .filter(|c| is_card_shaped(snap, **c, self.min_card_text_len))
                .count();
            if count >= self.min_siblings && best.is_none_or(|(_, b)| count > b) {
                best = Some((id, count));
            }
        }
        best.map(|(container, _)| CardSelector::ChildrenOf {
            path: snap.path_of(container),
            min_text_len: self.min_card_text_len,
        })
    }

    fn by_anchor_bounding_box(&self, snap: &DomSnapshot) -> Option<CardSelector> {
        let selector = CardSelector::AnchorBoxes {
            min_width: self.min_card_width,
            min_height: self.min_card_height,
        };
        (!selector.select(snap).is_empty()).then_some(selector)
    }
}

/// Ad-detail anchors in document order.
#[must_use]
pub fn ad_anchors(snap: &DomSnapshot) -> Vec<NodeId> {
    snap.ids()
        .filter(|id| {
            let node = snap.node(*id);
            node.is("a") && node.attr("href").and_then(ad_id_from_href).is_some()
        })
        .collect()
}

fn first_ad_id(snap: &DomSnapshot, id: NodeId) -> Option<&str> {
    snap.anchors(id)
        .into_iter()
        .find_map(|a| snap.node(a).attr("href").and_then(ad_id_from_href))
}

fn structural_selector(snap: &DomSnapshot, id: NodeId) -> Option<CardSelector> {
    let node = snap.node(id);
    if let Some(role) = node.role() {
        return Some(CardSelector::Structural {
            tag: node.tag.clone(),
            role: Some(role.to_string()),
            class: None,
        });
    }
    node.class_tokens()
        .find(|t| is_semantic_class(t))
        .map(|token| CardSelector::Structural {
            tag: node.tag.clone(),
            role: None,
            class: Some(token.to_string()),
        })
}

fn is_card_shaped(snap: &DomSnapshot, id: NodeId, min_text_len: usize) -> bool {
    snap.text_content(id).chars().count() > min_text_len
        && (snap.has_media(id) || !snap.anchors(id).is_empty())
}

fn outermost(snap: &DomSnapshot, matches: impl Iterator<Item = NodeId>) -> Vec<NodeId> {
    let matched: Vec<NodeId> = matches.collect();
    let set: HashSet<NodeId> = matched.iter().copied().collect();
    matched
        .into_iter()
        .filter(|id| !snap.ancestors(*id).any(|a| set.contains(&a)))
        .collect()
}

#[allow(clippy::cast_possible_truncation)]
fn anchor_boxes(snap: &DomSnapshot, min_width: f64, min_height: f64) -> Vec<NodeId> {
    let mut seen_boxes = HashSet::new();
    let mut cards = Vec::new();
    for anchor in ad_anchors(snap) {
        let card = snap.ancestors(anchor).find(|a| {
            snap.node(*a)
                .rect
                .is_some_and(|r| r.width >= min_width && r.height >= min_height)
                && snap.has_media(*a)
        });
        let Some(card) = card else { continue };
        let Some(rect) = snap.node(card).rect else {
            continue;
        };
        let key = (
            rect.x.round() as i64,
            rect.y.round() as i64,
            rect.width.round() as i64,
            rect.height.round() as i64,
        );
        if seen_boxes.insert(key) {
            cards.push(card);
        }
    }
    cards.sort();
    cards
}

#[cfg(test)]
#[path = "discovery_test.rs"]
mod tests;
