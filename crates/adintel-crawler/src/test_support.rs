//! HTML fixtures shaped like ad library result pages.

pub(crate) const LONG_COPY: &str = "Most people never notice how much better they sleep \
until they stop waking up at three in the morning. Our formula uses magnesium glycinate \
and a gentle dose of botanicals that help you wind down without feeling groggy the next \
day. Thousands of customers switched last year and they are not going back. Try it for \
thirty days and if you do not love it we will refund every cent.";

/// One ad card with generated class names, like the live library.
pub(crate) fn ad_card(ad_id: &str, page_name: &str, body: &str) -> String {
    let slug = page_name.to_lowercase().replace(' ', "");
    format!(
        r#"<div class="xh8yej3">
  <div class="x1dr59a3">
    <span class="x8t9es0">Library ID: {ad_id}</span>
    <span>Started running on Jan 5, 2025</span>
    <span>Platforms</span><span>Facebook, Instagram</span>
  </div>
  <div class="x6s0dn4">
    <a href="https://www.facebook.com/{slug}/?view_all_page_id=987654321">{page_name}</a>
    <span>Sponsored</span>
  </div>
  <div class="x1iorvi4" style="white-space: pre-wrap">{body}</div>
  <a href="https://l.facebook.com/l.php?u=https%3A%2F%2Fshop.example.com%2Fsleep%3Fref%3Dfb&amp;h=AT0">
    <img class="x1lliihq" src="https://scontent.example.net/{ad_id}.jpg">
    <div><div>shop.example.com</div><div>Grab the starter kit</div></div>
    <div role="button">Shop now</div>
  </a>
  <a href="https://www.facebook.com/ads/library/?id={ad_id}">See ad details</a>
</div>"#
    )
}

/// A results page wrapping the given cards in a generated-class feed.
pub(crate) fn library_page(cards: &[String]) -> String {
    format!(
        r#"<html><head><title>Ad Library</title></head><body>
<div class="x9f619"><h1>Ad Library</h1>
  <div class="x78zum5 xdt5ytf">{}</div>
</div>
</body></html>"#,
        cards.join("\n")
    )
}

pub(crate) fn page_with_ids(ids: &[&str]) -> String {
    let cards: Vec<String> = ids
        .iter()
        .map(|id| ad_card(id, "Sleep Well Co", LONG_COPY))
        .collect();
    library_page(&cards)
}
