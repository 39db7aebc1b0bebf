//! PDF Text Extraction
//!
//! Extracts per-page text from an uploaded PDF byte stream. The primary
//! extractor preserves page boundaries; when it loads the file but finds no
//! usable text, a fallback extractor takes a second pass (some PDFs decode
//! cleanly with one library and not the other). Scanned, image-only pages
//! yield empty strings without failing; only a document with no text at
//! all is rejected.

use lopdf::Document;
use thiserror::Error;

/// Minimum non-whitespace characters for a document to count as extractable.
const MIN_TEXT_CHARS: usize = 10;

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("Not a valid PDF: {0}")]
    InvalidPdf(String),

    #[error("No extractable text found ({page_count} pages; the PDF may be scanned)")]
    EmptyDocument { page_count: usize },
}

pub type Result<T> = std::result::Result<T, PdfError>;

/// Per-page text extracted from one uploaded file.
#[derive(Debug, Clone)]
pub struct ExtractedFile {
    pub filename: String,
    /// Normalized text, one entry per page (1-based page = index + 1).
    pub pages: Vec<String>,
    pub page_count: usize,
}

impl ExtractedFile {
    /// Non-whitespace character count across all pages.
    pub fn text_chars(&self) -> usize {
        self.pages
            .iter()
            .map(|p| p.chars().filter(|c| !c.is_whitespace()).count())
            .sum()
    }
}

pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract per-page text from raw PDF bytes.
    pub fn extract(&self, bytes: &[u8], filename: &str) -> Result<ExtractedFile> {
        let doc = Document::load_mem(bytes).map_err(|e| PdfError::InvalidPdf(e.to_string()))?;

        let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        let page_count = page_numbers.len().max(1);

        let mut pages: Vec<String> = Vec::with_capacity(page_count);
        for page_num in page_numbers {
            // A page that fails to decode is treated like a scanned page.
            let raw = doc.extract_text(&[page_num]).unwrap_or_default();
            pages.push(normalize_text(&raw));
        }
        if pages.is_empty() {
            pages.push(String::new());
        }

        let mut extracted = ExtractedFile {
            filename: filename.to_string(),
            pages,
            page_count,
        };

        if extracted.text_chars() == 0 {
            // The primary extractor loaded the file but decoded nothing.
            // pdf-extract does not preserve page boundaries, so its output
            // lands on page one; the page count stays authoritative.
            if let Ok(text) = pdf_extract::extract_text_from_mem(bytes) {
                let normalized = normalize_text(&text);
                if !normalized.trim().is_empty() {
                    tracing::info!(
                        "Fallback extractor recovered {} chars from {filename}",
                        normalized.len()
                    );
                    extracted.pages[0] = normalized;
                }
            }
        }

        if extracted.text_chars() < MIN_TEXT_CHARS {
            return Err(PdfError::EmptyDocument { page_count });
        }

        tracing::debug!(
            "Extracted {page_count} pages ({} text chars) from {filename}",
            extracted.text_chars()
        );
        Ok(extracted)
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize extracted text: control characters below U+0020 (except TAB and
/// LF) become spaces, whitespace runs within a line collapse to one space,
/// and runs of blank lines collapse to two.
pub fn normalize_text(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .map(|c| {
            if c < '\u{20}' && c != '\t' && c != '\n' {
                ' '
            } else {
                c
            }
        })
        .collect();

    let mut lines: Vec<String> = Vec::new();
    let mut blank_run = 0usize;
    for line in cleaned.lines() {
        let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            blank_run += 1;
            if blank_run <= 2 {
                lines.push(String::new());
            }
        } else {
            blank_run = 0;
            lines.push(collapsed);
        }
    }

    // Drop leading/trailing blank lines.
    while lines.first().is_some_and(|l| l.is_empty()) {
        lines.remove(0);
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }

    lines.join("\n")
}
