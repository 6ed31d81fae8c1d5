//! PDF content extractor.
//!
//! Pages come from the lopdf page tree so every chunk can cite its page.
//! When lopdf yields no text at all, pdf-extract is tried on the whole file and
//! its output is split on form feeds.

use arklife_core::{ContentExtractor, ExtractError, ExtractedContent, PageContent};
use async_trait::async_trait;
use lopdf::Document;
use std::path::Path;
use tracing::{debug, warn};

/// Extractor for PDF files.
pub struct PdfExtractor;

impl PdfExtractor {
    /// Create a new PDF extractor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentExtractor for PdfExtractor {
    fn supported_types(&self) -> &[&str] {
        &["application/pdf"]
    }

    fn can_extract_by_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
    }

    async fn extract(&self, path: &Path) -> Result<ExtractedContent, ExtractError> {
        debug!("Extracting PDF: {:?}", path);

        let bytes = tokio::fs::read(path).await?;

        // Both parsers are blocking
        let pages = tokio::task::spawn_blocking(move || extract_pages(&bytes))
            .await
            .map_err(|e| ExtractError::Failed(format!("Task join error: {e}")))??;

        debug!("Extracted {} pages from {:?}", pages.len(), path);
        Ok(ExtractedContent::from_pages(pages))
    }
}

/// Extract per-page text, falling back to pdf-extract for the whole document.
fn extract_pages(bytes: &[u8]) -> Result<Vec<PageContent>, ExtractError> {
    let doc = Document::load_mem(bytes)
        .map_err(|e| ExtractError::Parse(format!("invalid PDF: {e}")))?;

    let mut pages = Vec::new();
    for page_num in doc.get_pages().keys() {
        match doc.extract_text(&[*page_num]) {
            Ok(text) => pages.push(PageContent {
                number: Some(*page_num),
                text: clean_page_text(&text),
            }),
            Err(e) => {
                debug!("No text on page {}: {}", page_num, e);
                pages.push(PageContent {
                    number: Some(*page_num),
                    text: String::new(),
                });
            }
        }
    }

    if pages.iter().any(|p| !p.text.is_empty()) {
        return Ok(pages);
    }

    warn!("Page-level extraction found no text, retrying with pdf-extract");
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| ExtractError::Failed(format!("PDF extraction failed: {e}")))?;
    Ok(split_form_feeds(&text))
}

/// Split whole-document text on form feeds into numbered pages.
///
/// Text without form feeds becomes a single page with an unknown number.
fn split_form_feeds(text: &str) -> Vec<PageContent> {
    if !text.contains('\x0C') {
        return vec![PageContent {
            number: None,
            text: clean_page_text(text),
        }];
    }

    text.split('\x0C')
        .zip(1u32..)
        .map(|(page, number)| PageContent {
            number: Some(number),
            text: clean_page_text(page),
        })
        .collect()
}

/// Trim trailing whitespace per line and drop leading/trailing blank lines.
fn clean_page_text(text: &str) -> String {
    text.lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
