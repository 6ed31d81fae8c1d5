//! Text content extractor.

use arklife_core::{ContentExtractor, ContentMetadataInfo, ExtractError, ExtractedContent};
use async_trait::async_trait;
use std::path::Path;
use tokio::fs;

/// Extractor for plain text and markdown documents.
pub struct TextExtractor;

impl TextExtractor {
    /// Create a new text extractor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentExtractor for TextExtractor {
    fn supported_types(&self) -> &[&str] {
        &["text/plain", "text/markdown", "text/x-markdown"]
    }

    fn can_extract_by_extension(&self, path: &Path) -> bool {
        let extensions = ["txt", "md", "markdown"];

        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| extensions.contains(&ext.to_lowercase().as_str()))
    }

    async fn extract(&self, path: &Path) -> Result<ExtractedContent, ExtractError> {
        let text = fs::read_to_string(path).await?;

        // First markdown heading doubles as the title
        let title = text
            .lines()
            .find_map(|line| line.strip_prefix("# "))
            .map(|t| t.trim().to_string());

        Ok(ExtractedContent {
            text,
            pages: Vec::new(),
            metadata: ContentMetadataInfo {
                title,
                ..Default::default()
            },
        })
    }
}
