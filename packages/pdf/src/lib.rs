#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! PDF structural extraction for price bulletins.
//!
//! The ministry publishes price bulletins as PDF documents of wildly
//! varying quality. This crate pulls out whatever structure it can
//! (plain text via [`pdf_extract`], pseudo-column tables via [`tables`],
//! page count and the Info dictionary via [`lopdf`]) and degrades to an
//! empty result on any internal error, because a single malformed
//! document must not abort a multi-document crawl.
//!
//! Price interpretation is out of scope here; the source crate turns the
//! extracted text into per-crop prices.

pub mod tables;

use bei_map_models::{DocumentMetadata, ExtractedContent};

/// Errors specific to PDF extraction.
#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    /// PDF text extraction failed.
    #[error("PDF extraction error: {0}")]
    Extraction(String),

    /// The PDF container could not be parsed.
    #[error("PDF container error: {0}")]
    Container(#[from] lopdf::Error),
}

/// Extracts text, tables, metadata, and page count from raw PDF bytes.
///
/// Fails soft: any internal error yields an all-empty
/// [`ExtractedContent`] (logged at warn level) rather than propagating.
#[must_use]
pub fn extract(bytes: &[u8]) -> ExtractedContent {
    match try_extract(bytes) {
        Ok(content) => content,
        Err(e) => {
            log::warn!("PDF extraction failed, storing empty content: {e}");
            ExtractedContent::default()
        }
    }
}

/// Fallible core of [`extract`].
///
/// # Errors
///
/// Returns [`PdfError`] if text extraction fails. Container-level
/// properties (page count, metadata) are best-effort; their failure
/// degrades to defaults without failing the whole extraction.
pub fn try_extract(bytes: &[u8]) -> Result<ExtractedContent, PdfError> {
    let text_content = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| PdfError::Extraction(e.to_string()))?;

    log::debug!("Extracted {} characters of text", text_content.len());

    let page_texts = split_pages(&text_content);

    let (pages, metadata) = match document_properties(bytes) {
        Ok(props) => props,
        Err(e) => {
            log::warn!("PDF container properties unavailable: {e}");
            (page_texts.len(), DocumentMetadata::default())
        }
    };

    let extracted_tables: Vec<Vec<Vec<String>>> = page_texts
        .iter()
        .filter_map(|page| tables::find_table(page))
        .collect();

    Ok(ExtractedContent {
        text_content,
        tables: extracted_tables,
        prices: std::collections::BTreeMap::new(),
        metadata,
        pages,
    })
}

/// Splits extracted text into per-page chunks on form feeds, falling back
/// to the whole text as a single page.
fn split_pages(text: &str) -> Vec<&str> {
    if text.contains('\x0C') {
        text.split('\x0C').collect()
    } else {
        vec![text]
    }
}

/// Reads page count and the Info dictionary from the PDF container.
fn document_properties(bytes: &[u8]) -> Result<(usize, DocumentMetadata), PdfError> {
    let doc = lopdf::Document::load_mem(bytes)?;
    let pages = doc.get_pages().len();
    Ok((pages, read_info_dictionary(&doc)))
}

/// Captures title/author/subject/producer from the trailer's Info
/// dictionary, when present.
fn read_info_dictionary(doc: &lopdf::Document) -> DocumentMetadata {
    let Ok(info) = doc.trailer.get(b"Info") else {
        return DocumentMetadata::default();
    };

    let dict = match info {
        lopdf::Object::Reference(id) => match doc.get_object(*id).and_then(|obj| obj.as_dict()) {
            Ok(dict) => dict,
            Err(_) => return DocumentMetadata::default(),
        },
        lopdf::Object::Dictionary(dict) => dict,
        _ => return DocumentMetadata::default(),
    };

    DocumentMetadata {
        title: info_string(dict, b"Title"),
        author: info_string(dict, b"Author"),
        subject: info_string(dict, b"Subject"),
        producer: info_string(dict, b"Producer"),
    }
}

/// Reads one string entry from an Info dictionary.
fn info_string(dict: &lopdf::Dictionary, key: &[u8]) -> Option<String> {
    let obj = dict.get(key).ok()?;
    let lopdf::Object::String(bytes, _) = obj else {
        return None;
    };
    let decoded = decode_pdf_string(bytes);
    let trimmed = decoded.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

/// Decodes a PDF string value: UTF-16BE when the BOM is present,
/// otherwise treated as (lossy) UTF-8/Latin text.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        String::from_utf8_lossy(bytes).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_pdf_degrades_to_empty_content() {
        let content = extract(b"this is definitely not a pdf");
        assert_eq!(content, ExtractedContent::default());
        assert!(content.text_content.is_empty());
        assert!(content.tables.is_empty());
        assert_eq!(content.pages, 0);
    }

    #[test]
    fn splits_pages_on_form_feed() {
        assert_eq!(split_pages("one\x0Ctwo\x0Cthree").len(), 3);
        assert_eq!(split_pages("no page breaks here").len(), 1);
    }

    #[test]
    fn decodes_utf16_pdf_strings() {
        let bytes = [0xFE, 0xFF, 0x00, 0x42, 0x00, 0x65, 0x00, 0x69];
        assert_eq!(decode_pdf_string(&bytes), "Bei");
        assert_eq!(decode_pdf_string(b"Bei ya Mazao"), "Bei ya Mazao");
    }
}
