//! PDF parsing: extracts per-page text with provenance, computes cumulative
//! character offsets, and flags documents likely to need OCR.

use crate::data::{Document, Page};
use crate::errors::{CoreError, CoreResult};
use crate::normalizer::normalize;
use std::collections::HashMap;

/// Below this average chars/page, the document is treated as image-dominated.
const OCR_THRESHOLD_AVG_CHARS_PER_PAGE: f64 = 100.0;

/// Parses PDF `bytes` into a `Document`. The only fatal-to-the-job failure
/// in the whole pipeline; every later stage degrades to a fallback instead
/// of propagating an error.
#[tracing::instrument(skip_all, fields(filename, len = bytes.len()))]
pub fn parse(bytes: &[u8], filename: &str) -> CoreResult<Document> {
    let pages_text = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| CoreError::parser(format!("could not read PDF: {e}")))?;

    if pages_text.is_empty() {
        return Err(CoreError::parser("PDF contains no pages"));
    }

    let mut pages = Vec::with_capacity(pages_text.len());
    let mut cursor = 0usize;
    let mut total_chars = 0usize;

    for (idx, raw_text) in pages_text.into_iter().enumerate() {
        let normalized_text = normalize(&raw_text);
        let start = cursor;
        let end = start + raw_text.chars().count();
        cursor = end;
        total_chars += raw_text.chars().count();

        pages.push(Page {
            page_number: idx + 1,
            raw_text,
            normalized_text,
            char_offset_start: start,
            char_offset_end: end,
        });
    }

    let avg_chars_per_page = total_chars as f64 / pages.len() as f64;
    let needs_ocr = avg_chars_per_page < OCR_THRESHOLD_AVG_CHARS_PER_PAGE;

    let mut metadata = HashMap::new();
    metadata.insert("parser_used".to_string(), "pdf_extract".to_string());
    metadata.insert("needs_ocr".to_string(), needs_ocr.to_string());
    metadata.insert(
        "avg_chars_per_page".to_string(),
        format!("{avg_chars_per_page:.2}"),
    );

    Ok(Document {
        id: uuid::Uuid::new_v4().to_string(),
        filename: filename.to_string(),
        pages,
        metadata,
    })
}
