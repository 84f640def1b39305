use super::*;
use crate::test_support::{ad_card, library_page, page_with_ids, LONG_COPY};

fn discover(html: &str) -> (DomSnapshot, DiscoveryOutcome) {
    let snap = DomSnapshot::from_html(html);
    let outcome = SelectorDiscovery::default().discover(&snap);
    (snap, outcome)
}

#[test]
fn ad_id_from_href_requires_library_link() {
    assert_eq!(
        ad_id_from_href("https://www.facebook.com/ads/library/?id=1234567890123"),
        Some("1234567890123")
    );
    assert_eq!(
        ad_id_from_href("/ads/library/?active_status=all&id=99999999990"),
        Some("99999999990")
    );
    assert_eq!(ad_id_from_href("https://www.facebook.com/?id=1234567890123"), None);
    assert_eq!(ad_id_from_href("/ads/library/?id=12345"), None);
}

#[test]
fn semantic_class_rejects_generated_tokens() {
    assert!(is_semantic_class("ad-card"));
    assert!(is_semantic_class("result_item"));
    assert!(!is_semantic_class("x1lliihq"));
    assert!(!is_semantic_class("xh8yej3"));
    assert!(!is_semantic_class("_7jvw"));
    assert!(!is_semantic_class("ab"));
    assert!(!is_semantic_class("zzz9"));
}

#[test]
fn generated_markup_falls_back_to_anchor_depth() {
    let (snap, outcome) = discover(&page_with_ids(&[
        "1000000000001",
        "1000000000002",
        "1000000000003",
    ]));
    let discovery = outcome.found().unwrap();
    assert_eq!(discovery.strategy, DiscoveryStrategy::AdLinkAncestry);
    assert_eq!(discovery.selector, CardSelector::AnchorAncestor { depth: 1 });

    let cards = discovery.selector.select(&snap);
    assert_eq!(cards.len(), 3);
    assert!(cards.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn semantic_class_yields_structural_selector() {
    let cards: Vec<String> = ["1000000000001", "1000000000002"]
        .iter()
        .map(|id| {
            ad_card(id, "Sleep Well Co", LONG_COPY).replacen(
                r#"class="xh8yej3""#,
                r#"class="xh8yej3 ad-card""#,
                1,
            )
        })
        .collect();
    let (snap, outcome) = discover(&library_page(&cards));
    let discovery = outcome.found().unwrap();
    assert_eq!(
        discovery.selector,
        CardSelector::Structural {
            tag: "div".to_string(),
            role: None,
            class: Some("ad-card".to_string()),
        }
    );
    assert_eq!(discovery.selector.select(&snap).len(), 2);
}

#[test]
fn role_on_card_yields_structural_selector() {
    let cards: Vec<String> = ["1000000000001", "1000000000002"]
        .iter()
        .map(|id| {
            ad_card(id, "Sleep Well Co", LONG_COPY).replacen(
                r#"class="xh8yej3""#,
                r#"class="xh8yej3" role="listitem""#,
                1,
            )
        })
        .collect();
    let (_, outcome) = discover(&library_page(&cards));
    assert_eq!(
        outcome.found().unwrap().selector,
        CardSelector::Structural {
            tag: "div".to_string(),
            role: Some("listitem".to_string()),
            class: None,
        }
    );
}

#[test]
fn repeated_links_inside_one_card_do_not_stop_the_walk() {
    let card = |id: &str| {
        format!(
            r#"<section class="x1a2b3c4d"><div class="x5e6f7g8h">
                <a href="/ads/library/?id={id}">open</a>
                <a href="/ads/library/?id={id}">details</a>
            </div></section>"#
        )
    };
    let html = format!(
        "<html><body><main>{}{}</main></body></html>",
        card("2000000000001"),
        card("2000000000002")
    );
    let (snap, outcome) = discover(&html);
    let selector = outcome.found().unwrap().selector;
    assert_eq!(selector, CardSelector::AnchorAncestor { depth: 2 });
    let cards = selector.select(&snap);
    assert!(cards.iter().all(|c| snap.node(*c).is("section")));
    assert_eq!(cards.len(), 2);
}

#[test]
fn article_role_used_without_ad_links() {
    let html = r#"<html><body>
        <div role="article"><p>first</p><div role="article">nested</div></div>
        <div role="article"><p>second</p></div>
    </body></html>"#;
    let (snap, outcome) = discover(html);
    let discovery = outcome.found().unwrap();
    assert_eq!(discovery.strategy, DiscoveryStrategy::ArticleRole);
    assert_eq!(discovery.selector.select(&snap).len(), 2);
}

#[test]
fn card_shaped_children_pick_the_busiest_container() {
    let item = |n: usize| {
        format!(
            r#"<div><img src="/{n}.png"><p>{LONG_COPY}</p></div>"#
        )
    };
    let html = format!(
        r#"<html><body>
            <div id="sidebar">{}</div>
            <div id="feed">{}{}{}<div>spacer</div></div>
        </body></html>"#,
        item(0),
        item(1),
        item(2),
        item(3)
    );
    let (snap, outcome) = discover(&html);
    let discovery = outcome.found().unwrap();
    assert_eq!(discovery.strategy, DiscoveryStrategy::CardShapedChildren);
    let cards = discovery.selector.select(&snap);
    assert_eq!(cards.len(), 3);
    let feed = snap.node(cards[0]).parent.unwrap();
    assert_eq!(snap.node(feed).attr("id"), Some("feed"));
}

#[test]
fn bounding_boxes_are_last_resort() {
    let value = serde_json::json!({
        "nodes": [
            {"tag": "html", "parent": null},
            {"tag": "body", "rect": [0.0, 0.0, 1200.0, 3000.0], "parent": 0},
            {"tag": "div", "rect": [10.0, 100.0, 400.0, 500.0], "parent": 1},
            {"tag": "img", "rect": [10.0, 110.0, 400.0, 300.0], "parent": 2},
            {"tag": "div", "rect": [10.0, 420.0, 120.0, 20.0], "parent": 2},
            {"tag": "a", "attrs": [["href", "/ads/library/?id=3000000000001"]],
             "text": "details", "rect": [10.0, 420.0, 60.0, 20.0], "parent": 4}
        ]
    });
    let snap = DomSnapshot::from_json(value).unwrap();
    let discovery = SelectorDiscovery::default().discover(&snap).found().unwrap();
    assert_eq!(discovery.strategy, DiscoveryStrategy::AnchorBoundingBox);
    let cards = discovery.selector.select(&snap);
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].index(), 2);
}

#[test]
fn empty_page_is_not_found() {
    let (_, outcome) = discover("<html><body><p>No ads match your search.</p></body></html>");
    assert_eq!(outcome, DiscoveryOutcome::NotFound);
}

#[test]
fn discovery_is_idempotent() {
    let html = page_with_ids(&["1000000000001", "1000000000002"]);
    let snap = DomSnapshot::from_html(&html);
    let discovery = SelectorDiscovery::default();
    assert_eq!(discovery.discover(&snap), discovery.discover(&snap));
}

#[test]
fn selector_reapplies_to_grown_page() {
    let first = DomSnapshot::from_html(&page_with_ids(&["1000000000001", "1000000000002"]));
    let selector = SelectorDiscovery::default()
        .discover(&first)
        .found()
        .unwrap()
        .selector;

    let grown = DomSnapshot::from_html(&page_with_ids(&[
        "1000000000001",
        "1000000000002",
        "1000000000003",
        "1000000000004",
    ]));
    assert_eq!(selector.select(&grown).len(), 4);
}
