//! Owned, index-addressed snapshot of a rendered page.
//!
//! Discovery and extraction run against a [`DomSnapshot`] rather than a live
//! browser handle, so both are deterministic and testable from static HTML.
//! Snapshots come from two sources:
//!
//! - [`DomSnapshot::from_html`]: parsed with `scraper`, no layout boxes.
//! - [`DomSnapshot::from_json`]: the flat node list produced by the in-page
//!   serializer, which also records each element's bounding box.
//!
//! Nodes are stored in document (pre-)order, so iterating [`DomSnapshot::ids`]
//! visits elements in the order they appear on the page.

use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};

use crate::error::CrawlerError;

/// Elements whose text never renders as card content.
const SKIPPED_TAGS: [&str; 4] = ["script", "style", "noscript", "template"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone)]
pub struct DomNode {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    /// Text of direct text children only, whitespace-collapsed.
    pub text: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub rect: Option<Rect>,
}

impl DomNode {
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn class_tokens(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or_default().split_whitespace()
    }

    #[must_use]
    pub fn role(&self) -> Option<&str> {
        self.attr("role")
    }

    #[must_use]
    pub fn is(&self, tag: &str) -> bool {
        self.tag == tag
    }
}

/// Wire shape of one node emitted by the in-page serializer.
#[derive(Debug, Deserialize)]
struct RawNode {
    tag: String,
    #[serde(default)]
    attrs: Vec<(String, String)>,
    #[serde(default)]
    text: String,
    #[serde(default)]
    rect: Option<[f64; 4]>,
    parent: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RawSnapshot {
    nodes: Vec<RawNode>,
}

#[derive(Debug, Clone)]
pub struct DomSnapshot {
    nodes: Vec<DomNode>,
}

impl DomSnapshot {
    /// Parse an HTML document. The `<html>` element becomes the root.
    #[must_use]
    pub fn from_html(html: &str) -> Self {
        let document = Html::parse_document(html);
        let mut nodes: Vec<DomNode> = Vec::new();
        let mut stack: Vec<(ElementRef<'_>, Option<NodeId>)> =
            vec![(document.root_element(), None)];

        while let Some((el, parent)) = stack.pop() {
            let tag = el.value().name().to_ascii_lowercase();
            if SKIPPED_TAGS.contains(&tag.as_str()) {
                continue;
            }

            let id = NodeId(nodes.len());
            let text = collapse_whitespace(
                &el.children()
                    .filter_map(|child| child.value().as_text().map(|t| &**t))
                    .collect::<Vec<_>>()
                    .join(" "),
            );
            nodes.push(DomNode {
                tag,
                attrs: el
                    .value()
                    .attrs()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                text,
                parent,
                children: Vec::new(),
                rect: None,
            });
            if let Some(p) = parent {
                nodes[p.0].children.push(id);
            }

            let child_elements: Vec<ElementRef<'_>> =
                el.children().filter_map(ElementRef::wrap).collect();
            for child in child_elements.into_iter().rev() {
                stack.push((child, Some(id)));
            }
        }

        Self { nodes }
    }

    /// Decode the serializer's flat node list.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlerError::SnapshotDecode`] for malformed JSON and
    /// [`CrawlerError::InvalidSnapshot`] when the list is empty or a parent
    /// index does not precede its child.
    pub fn from_json(value: serde_json::Value) -> Result<Self, CrawlerError> {
        let raw: RawSnapshot = serde_json::from_value(value)?;
        if raw.nodes.is_empty() {
            return Err(CrawlerError::InvalidSnapshot("no nodes".to_string()));
        }

        let mut nodes: Vec<DomNode> = Vec::with_capacity(raw.nodes.len());
        for (idx, node) in raw.nodes.into_iter().enumerate() {
            let parent = match node.parent {
                None if idx == 0 => None,
                Some(p) if p < idx => Some(NodeId(p)),
                other => {
                    return Err(CrawlerError::InvalidSnapshot(format!(
                        "node {idx} has invalid parent {other:?}"
                    )))
                }
            };
            if let Some(p) = parent {
                nodes[p.0].children.push(NodeId(idx));
            }
            nodes.push(DomNode {
                tag: node.tag.to_ascii_lowercase(),
                attrs: node.attrs,
                text: collapse_whitespace(&node.text),
                parent,
                children: Vec::new(),
                rect: node.rect.map(|[x, y, width, height]| Rect {
                    x,
                    y,
                    width,
                    height,
                }),
            });
        }

        Ok(Self { nodes })
    }

    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> &DomNode {
        &self.nodes[id.0]
    }

    /// All node ids in document order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.node(id).parent, move |p| self.node(*p).parent)
    }

    /// Descendants of `id` in document order, excluding `id` itself.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.node(id).children.iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.node(next).children.iter().rev().copied());
        }
        out
    }

    /// `id` followed by its descendants.
    #[must_use]
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = vec![id];
        out.extend(self.descendants(id));
        out
    }

    /// Rendered text of the subtree, whitespace-collapsed.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        let parts: Vec<&str> = self
            .subtree(id)
            .into_iter()
            .map(|n| self.node(n).text.as_str())
            .filter(|t| !t.is_empty())
            .collect();
        parts.join(" ")
    }

    /// Anchors with an `href` inside the subtree, in document order.
    #[must_use]
    pub fn anchors(&self, id: NodeId) -> Vec<NodeId> {
        self.subtree(id)
            .into_iter()
            .filter(|n| {
                let node = self.node(*n);
                node.is("a") && node.attr("href").is_some()
            })
            .collect()
    }

    #[must_use]
    pub fn has_media(&self, id: NodeId) -> bool {
        self.subtree(id)
            .into_iter()
            .any(|n| matches!(self.node(n).tag.as_str(), "img" | "video"))
    }

    /// Child-index path from the root to `id`.
    #[must_use]
    pub fn path_of(&self, id: NodeId) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = id;
        while let Some(parent) = self.node(current).parent {
            let pos = self
                .node(parent)
                .children
                .iter()
                .position(|c| *c == current)
                .unwrap_or_default();
            path.push(pos);
            current = parent;
        }
        path.reverse();
        path
    }

    #[must_use]
    pub fn node_at_path(&self, path: &[usize]) -> Option<NodeId> {
        let mut current = self.root();
        for &idx in path {
            current = *self.node(current).children.get(idx)?;
        }
        Some(current)
    }
}

pub(crate) fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
