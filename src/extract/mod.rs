//! HTML to visible text and outgoing links
//!
//! Extraction keeps ALL visible text, navigation chrome included. The
//! boilerplate detector downstream works by seeing the same menus and
//! footers on page after page; stripping them here (readability-style
//! main-content extraction) would remove exactly the signal it measures.
//!
//! scraper's parser is error-tolerant, so extraction cannot fail: malformed
//! markup yields whatever text is recoverable, possibly none.

use std::collections::HashSet;

use ego_tree::NodeRef;
use scraper::{Html, Node, Selector};
use url::Url;

/// Elements whose text content is never visible.
const SKIPPED_CONTAINERS: &[&str] = &["script", "style", "noscript"];

/// Everything the analyzer needs from one page of markup.
#[derive(Debug, Clone, Default)]
pub struct ExtractedPage {
    /// Visible text, whitespace runs collapsed to single spaces.
    pub text: String,
    /// Outgoing links resolved against the base URL, http/https only,
    /// de-duplicated in first-seen order.
    pub links: Vec<Url>,
}

/// Extract visible text and outgoing links from one page.
///
/// `base_url` should be the URL the page was actually served from, so that
/// relative links resolve correctly after redirects.
pub fn extract_page(html: &str, base_url: &Url) -> ExtractedPage {
    let document = Html::parse_document(html);
    ExtractedPage {
        text: visible_text(&document),
        links: outgoing_links(&document, base_url),
    }
}

/// Check if a text node sits inside a script/style/noscript element.
fn in_skipped_container(node: &NodeRef<Node>) -> bool {
    let mut current = node.parent();
    while let Some(parent) = current {
        if let Some(elem) = parent.value().as_element() {
            if SKIPPED_CONTAINERS.contains(&elem.name()) {
                return true;
            }
        }
        current = parent.parent();
    }
    false
}

/// Collect every visible text node, joined and whitespace-collapsed.
fn visible_text(document: &Html) -> String {
    let mut raw = String::new();

    for node in document.root_element().descendants() {
        if let Some(text_node) = node.value().as_text() {
            if in_skipped_container(&node) {
                continue;
            }
            let t = text_node.trim();
            if !t.is_empty() {
                if !raw.is_empty() {
                    raw.push(' ');
                }
                raw.push_str(t);
            }
        }
    }

    // Text nodes can carry internal newlines and tabs; collapse them too.
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolve every `a[href]` against the base URL.
fn outgoing_links(document: &Html, base_url: &Url) -> Vec<Url> {
    let selector = match Selector::parse("a[href]") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&selector) {
        if let Some(href) = element.value().attr("href") {
            if let Ok(url) = base_url.join(href) {
                if (url.scheme() == "http" || url.scheme() == "https")
                    && seen.insert(url.as_str().to_string())
                {
                    links.push(url);
                }
            }
        }
    }

    links
}
