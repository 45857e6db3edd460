//! Parsed HTML with the few queries the scorer and extractor need.

use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

/// Subtrees that never carry page content.
pub const BOILERPLATE: &str = "nav, footer, header, script, style, aside, form";

static BOILERPLATE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(BOILERPLATE).expect("valid boilerplate selector"));
static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid anchor selector"));
static BODY_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("valid body selector"));

/// An owned HTML document.
pub struct ParsedDocument {
    html: Html,
}

impl ParsedDocument {
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
        }
    }

    /// Detach every subtree matching `selector` from the document.
    pub fn remove_subtrees(&mut self, selector: &Selector) -> usize {
        let ids: Vec<_> = self.html.select(selector).map(|el| el.id()).collect();
        for id in &ids {
            if let Some(mut node) = self.html.tree.get_mut(*id) {
                node.detach();
            }
        }
        ids.len()
    }

    /// Detach navigation, chrome, scripts, styles and forms.
    pub fn strip_boilerplate(&mut self) -> usize {
        self.remove_subtrees(&BOILERPLATE_SELECTOR)
    }

    pub fn body(&self) -> Option<ElementRef<'_>> {
        self.html.select(&BODY_SELECTOR).next()
    }

    /// First element matching `selector` anywhere in the document.
    pub fn first(&self, selector: &Selector) -> Option<ElementRef<'_>> {
        self.html.select(selector).next()
    }

    /// Whitespace-normalized text of the first element matching `selector`.
    pub fn first_text(&self, selector: &Selector) -> String {
        self.first(selector).map(element_text).unwrap_or_default()
    }

    /// Attribute of the first element matching `selector`, whitespace-normalized.
    pub fn first_attr(&self, selector: &Selector, attr: &str) -> String {
        self.first(selector)
            .and_then(|el| el.value().attr(attr))
            .map(clean_text)
            .unwrap_or_default()
    }

    /// Raw `href` values of all anchors, in document order.
    pub fn anchor_hrefs(&self) -> Vec<String> {
        self.html
            .select(&ANCHOR_SELECTOR)
            .filter_map(|a| a.value().attr("href"))
            .map(str::to_string)
            .collect()
    }
}

/// Raw `href` values of all anchors in `markup`.
pub fn anchor_hrefs(markup: &str) -> Vec<String> {
    ParsedDocument::parse(markup).anchor_hrefs()
}

/// Collapse whitespace runs to single spaces and trim.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whitespace-normalized text content of an element.
pub fn element_text(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<String>())
}

/// Number of descendant elements matching `selector` (the element itself excluded).
pub fn count(element: ElementRef<'_>, selector: &Selector) -> usize {
    element.select(selector).count()
}
