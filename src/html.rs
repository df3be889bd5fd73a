use std::sync::LazyLock;

use scraper::{Html, Selector};

static ANCHOR_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// All `<a href>` values in document order.
pub fn anchor_hrefs(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&ANCHOR_SEL)
        .filter_map(|a| a.value().attr("href"))
        .map(str::to_string)
        .collect()
}

/// Flatten a page to text: every text node, joined by newlines.
///
/// Labels and their values land on separate lines, which is what the
/// field patterns in `extract` anchor on.
pub fn render_text(html: &str) -> String {
    let document = Html::parse_document(html);
    document.root_element().text().collect::<Vec<_>>().join("\n")
}

// ── Tests ──
