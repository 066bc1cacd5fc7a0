//! HTML rendering (§4.10): a minimal line-based Markdown-to-HTML
//! conversion, avoiding a full Markdown renderer dependency for a format
//! this crate only needs for display, not round-tripping.

use crate::error::ExportError;

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Converts a small subset of Markdown (`#`/`##` headings, `-` list
/// items, blank-line-separated paragraphs) into an HTML fragment.
pub fn markdown_to_html(markdown: &str) -> Result<String, ExportError> {
    let mut body = String::new();
    let mut in_list = false;
    for line in markdown.lines() {
        let trimmed = line.trim_end();
        if let Some(rest) = trimmed.strip_prefix("## ") {
            close_list(&mut body, &mut in_list);
            body.push_str(&format!("<h2>{}</h2>\n", escape(rest)));
        } else if let Some(rest) = trimmed.strip_prefix("# ") {
            close_list(&mut body, &mut in_list);
            body.push_str(&format!("<h1>{}</h1>\n", escape(rest)));
        } else if let Some(rest) = trimmed.strip_prefix("- ") {
            if !in_list {
                body.push_str("<ul>\n");
                in_list = true;
            }
            body.push_str(&format!("<li>{}</li>\n", escape(rest)));
        } else if trimmed.is_empty() {
            close_list(&mut body, &mut in_list);
        } else {
            close_list(&mut body, &mut in_list);
            body.push_str(&format!("<p>{}</p>\n", escape(trimmed)));
        }
    }
    close_list(&mut body, &mut in_list);

    Ok(format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"></head><body>\n{body}</body></html>\n"
    ))
}

fn close_list(body: &mut String, in_list: &mut bool) {
    if *in_list {
        body.push_str("</ul>\n");
        *in_list = false;
    }
}
