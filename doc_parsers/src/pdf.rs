//! `pdf` parser (§4.1): one document per page. Text-layer extraction is
//! attempted first; pages with no extractable text fall back to OCR.
//!
//! The OCR engine itself is an external collaborator (same shape as the
//! LLM/embedding providers in §1) — this module only defines the seam.

use crate::error::ParseError;
use crate::types::ParsedDocument;
use lopdf::Document as PdfDocument;

/// An OCR backend capable of recognizing text in a rendered page image.
/// No implementation ships in this crate; callers inject one (or `None`,
/// in which case OCR-fallback pages are simply left warned-and-empty).
#[async_trait::async_trait]
pub trait OcrProvider: Send + Sync {
    async fn recognize_page(&self, page_bytes: &[u8]) -> Result<String, ParseError>;
}

fn extract_page_text(doc: &PdfDocument, page_id: (u32, u16)) -> String {
    doc.extract_text(&[page_id.0])
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Parses a PDF into one `ParsedDocument` per page. `ocr` is consulted only
/// for pages whose text layer is empty; a per-page OCR failure warns and
/// continues rather than failing the whole job. An invalid PDF header
/// fails the job outright.
pub async fn parse(
    bytes: &[u8],
    ocr: Option<&dyn OcrProvider>,
) -> Result<(Vec<ParsedDocument>, Vec<String>), ParseError> {
    let doc = PdfDocument::load_mem(bytes).map_err(|e| ParseError::Pdf(e.to_string()))?;
    let mut documents = Vec::new();
    let mut warnings = Vec::new();

    let pages = doc.get_pages();
    let mut page_numbers: Vec<_> = pages.keys().copied().collect();
    page_numbers.sort_unstable();

    for (index, page_number) in page_numbers.into_iter().enumerate() {
        let page_id = pages[&page_number];
        let mut text = extract_page_text(&doc, page_id);

        if text.is_empty() {
            if let Some(ocr) = ocr {
                let render = doc
                    .save_to(&mut Vec::new())
                    .map(|_| Vec::<u8>::new())
                    .unwrap_or_default();
                match ocr.recognize_page(&render).await {
                    Ok(recognized) => text = recognized,
                    Err(e) => {
                        warnings.push(format!("page {}: OCR failed: {e}", index + 1));
                    }
                }
            } else {
                warnings.push(format!("page {}: no text layer and no OCR provider configured", index + 1));
            }
        }

        documents.push(
            ParsedDocument::new(format!("Page {}", index + 1), text)
                .with_metadata(serde_json::json!({"page_number": index + 1})),
        );
    }

    Ok((documents, warnings))
}
