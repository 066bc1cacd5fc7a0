//! `wiki_xml` parser (§4.1): hardened against entity expansion and external
//! entities. `quick-xml` never resolves entities or fetches external
//! resources on its own, but we reject any `<!DOCTYPE` / `<!ENTITY`
//! declaration outright rather than rely on that — a benign-looking DTD is
//! still refused, per the contract ("any DTD/entity reference aborts
//! parse").

use crate::dates::parse_flexible_date;
use crate::error::ParseError;
use crate::types::ParsedDocument;
use quick_xml::events::Event;
use quick_xml::reader::Reader;

/// Scans the raw bytes for a DTD or entity declaration before any parsing
/// happens, so a billion-laughs payload never reaches the tokenizer.
fn reject_dtd_and_entities(raw: &str) -> Result<(), ParseError> {
    for needle in ["<!DOCTYPE", "<!doctype", "<!ENTITY", "<!entity"] {
        if raw.contains(needle) {
            return Err(ParseError::XmlSecurity(needle.to_string()));
        }
    }
    Ok(())
}

/// One `page`/`object[@class="Page"]` element collected while scanning.
struct PageBuilder {
    title: Option<String>,
    name: Option<String>,
    text: String,
    created: Option<String>,
    depth: usize,
}

impl PageBuilder {
    fn new(depth: usize) -> Self {
        Self {
            title: None,
            name: None,
            text: String::new(),
            created: None,
            depth,
        }
    }

    fn into_document(self) -> ParsedDocument {
        let title = self
            .title
            .or(self.name)
            .unwrap_or_else(|| "Untitled".to_string());
        let mut doc = ParsedDocument::new(title, self.text.trim().to_string());
        if let Some(created) = self.created.and_then(|raw| parse_flexible_date(&raw)) {
            doc = doc.with_created_at(created);
        }
        doc
    }
}

fn is_page_element(name: &str, attrs: &[(String, String)]) -> bool {
    if name.eq_ignore_ascii_case("page") {
        return true;
    }
    if name.eq_ignore_ascii_case("object") {
        return attrs
            .iter()
            .any(|(k, v)| k == "class" && v == "Page");
    }
    false
}

/// Parses a wiki XML export, splitting by `page` or `object[@class="Page"]`
/// elements; if none are found, the whole document becomes a single page.
pub fn parse(bytes: &[u8]) -> Result<Vec<ParsedDocument>, ParseError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| ParseError::InvalidInput(format!("not valid UTF-8: {e}")))?;
    reject_dtd_and_entities(text)?;

    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text_start = true;
    reader.config_mut().trim_text_end = true;

    let mut pages: Vec<PageBuilder> = Vec::new();
    let mut stack: Vec<String> = Vec::new();
    let mut buf = Vec::new();
    let mut in_title = false;
    let mut in_name = false;
    let mut in_created = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                let attrs: Vec<(String, String)> = e
                    .attributes()
                    .filter_map(Result::ok)
                    .map(|a| {
                        (
                            String::from_utf8_lossy(a.key.as_ref()).to_string(),
                            a.unescape_value().unwrap_or_default().to_string(),
                        )
                    })
                    .collect();
                stack.push(name.clone());
                if is_page_element(&name, &attrs) {
                    let mut page = PageBuilder::new(stack.len());
                    for (k, v) in &attrs {
                        if k.eq_ignore_ascii_case("title") {
                            page.title = Some(v.clone());
                        }
                        if k.eq_ignore_ascii_case("name") {
                            page.name = Some(v.clone());
                        }
                    }
                    pages.push(page);
                } else if let Some(page) = pages.last_mut() {
                    if name.eq_ignore_ascii_case("title") {
                        in_title = true;
                    } else if name.eq_ignore_ascii_case("name") {
                        in_name = true;
                    } else if name.eq_ignore_ascii_case("created")
                        || name.eq_ignore_ascii_case("timestamp")
                    {
                        in_created = true;
                    }
                    let _ = page;
                }
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape().unwrap_or_default().to_string();
                if let Some(page) = pages.last_mut() {
                    if in_title {
                        page.title = Some(text.clone());
                    } else if in_name {
                        page.name = Some(text.clone());
                    } else if in_created {
                        page.created = Some(text.clone());
                    } else if !text.trim().is_empty() {
                        page.text.push_str(&text);
                        page.text.push(' ');
                    }
                }
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                stack.pop();
                if name.eq_ignore_ascii_case("title") {
                    in_title = false;
                } else if name.eq_ignore_ascii_case("name") {
                    in_name = false;
                } else if name.eq_ignore_ascii_case("created") || name.eq_ignore_ascii_case("timestamp")
                {
                    in_created = false;
                }
            }
            Ok(_) => {}
            Err(e) => return Err(ParseError::Xml(e)),
        }
        buf.clear();
    }

    if pages.is_empty() {
        let content = text.trim().to_string();
        return Ok(vec![ParsedDocument::new("Untitled", content)]);
    }

    Ok(pages.into_iter().map(PageBuilder::into_document).collect())
}
