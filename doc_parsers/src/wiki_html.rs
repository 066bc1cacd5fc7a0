//! `wiki_html` parser (§4.1): split by page container, else `h1`, else whole document.

use crate::error::ParseError;
use crate::types::ParsedDocument;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;

/// Page-container selectors, tried in order; the first that matches at
/// least one element wins.
const CONTAINER_SELECTORS: &[&str] = &[
    "div.page",
    "article",
    "div.wiki-content",
    "div#content",
    "main",
];

static STRIP_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("script, style, nav, footer, header, aside").unwrap());
static HEADING_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h1, h2, h3, h4, h5, h6").unwrap());
static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
static H1_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").unwrap());

/// Extracts the visible text of `element`, skipping any descendant that
/// falls under `script`, `style`, `nav`, `footer`, `header`, or `aside`.
fn extract_text(element: ElementRef) -> String {
    let excluded: HashSet<_> = element.select(&STRIP_SELECTOR).map(|e| e.id()).collect();
    let mut text = String::new();
    for node in element.descendants() {
        if let Some(t) = node.value().as_text() {
            let under_excluded = node.ancestors().any(|a| excluded.contains(&a.id()));
            if !under_excluded {
                text.push_str(t);
                text.push(' ');
            }
        }
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn title_for(element: ElementRef, document: &Html) -> String {
    if let Some(heading) = element.select(&HEADING_SELECTOR).next() {
        let title = extract_text(heading);
        if !title.is_empty() {
            return title;
        }
    }
    if let Some(title_el) = document.select(&TITLE_SELECTOR).next() {
        let title = extract_text(title_el);
        if !title.is_empty() {
            return title;
        }
    }
    "Untitled".to_string()
}

/// Parses a (possibly multi-page) HTML export into one `ParsedDocument` per
/// detected page, falling back to `h1` boundaries and finally the whole
/// document as a single page.
pub fn parse(bytes: &[u8]) -> Result<Vec<ParsedDocument>, ParseError> {
    if bytes.is_empty() {
        return Err(ParseError::InvalidHtml("empty input".into()));
    }
    let text = std::str::from_utf8(bytes)
        .map_err(|e| ParseError::InvalidHtml(format!("not valid UTF-8: {e}")))?;
    let document = Html::parse_document(text);

    for selector_str in CONTAINER_SELECTORS {
        let selector = Selector::parse(selector_str)
            .map_err(|e| ParseError::InvalidHtml(format!("bad selector {selector_str:?}: {e}")))?;
        let matches: Vec<ElementRef> = document.select(&selector).collect();
        if !matches.is_empty() {
            return Ok(matches
                .into_iter()
                .map(|el| {
                    let title = title_for(el, &document);
                    let content = extract_text(el);
                    ParsedDocument::new(title, content)
                })
                .collect());
        }
    }

    let h1s: Vec<ElementRef> = document.select(&H1_SELECTOR).collect();
    if h1s.len() > 1 {
        // Split the document at each h1: each page runs from its h1 up to
        // (but not including) the next h1's ancestor boundary at the body
        // level. We approximate this by taking each h1's parent element as
        // the page container, which matches typical wiki export markup
        // where headings are direct children of a body/section wrapper.
        let body_selector = Selector::parse("body").unwrap();
        if let Some(body) = document.select(&body_selector).next() {
            return Ok(split_at_headings(body, &document));
        }
    }

    let root = document.root_element();
    let title = title_for(root, &document);
    let content = extract_text(root);
    Ok(vec![ParsedDocument::new(title, content)])
}

/// Splits `body`'s direct text flow at each top-level `h1`, producing one
/// document per heading whose content runs until the next `h1`.
fn split_at_headings(body: ElementRef, document: &Html) -> Vec<ParsedDocument> {
    let h1s: Vec<ElementRef> = body.select(&H1_SELECTOR).collect();
    let mut docs = Vec::with_capacity(h1s.len());
    for (i, heading) in h1s.iter().enumerate() {
        let title = extract_text(*heading);
        let mut content = String::new();
        let mut node = heading.next_sibling();
        while let Some(n) = node {
            if let Some(el) = ElementRef::wrap(n) {
                if h1s.get(i + 1).is_some_and(|next| next.id() == el.id()) {
                    break;
                }
                content.push_str(&extract_text(el));
                content.push(' ');
            }
            node = n.next_sibling();
        }
        let title = if title.is_empty() { "Untitled".to_string() } else { title };
        docs.push(ParsedDocument::new(title, content.trim().to_string()));
    }
    let _ = document;
    docs
}
