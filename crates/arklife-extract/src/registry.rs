//! Extractor registry for routing documents to extractors.

use arklife_core::{ContentExtractor, ExtractError, ExtractedContent};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::{PdfExtractor, TextExtractor};

/// Registry of content extractors.
pub struct ExtractorRegistry {
    /// Named extractors
    extractors: HashMap<String, Arc<dyn ContentExtractor>>,
    /// MIME type to extractor name mapping
    mime_mapping: HashMap<String, String>,
}

impl ExtractorRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            extractors: HashMap::new(),
            mime_mapping: HashMap::new(),
        }
    }

    /// Registry with the PDF and text extractors.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("pdf", PdfExtractor::new());
        registry.register("text", TextExtractor::new());
        registry
    }

    /// Register an extractor.
    pub fn register<E: ContentExtractor + 'static>(&mut self, name: &str, extractor: E) {
        let extractor = Arc::new(extractor);
        for mime in extractor.supported_types() {
            self.mime_mapping
                .insert((*mime).to_string(), name.to_string());
        }
        self.extractors.insert(name.to_string(), extractor);
    }

    /// Get an extractor for a MIME type.
    #[must_use]
    pub fn get_for_mime(&self, mime_type: &str) -> Option<Arc<dyn ContentExtractor>> {
        self.mime_mapping
            .get(mime_type)
            .and_then(|name| self.extractors.get(name))
            .cloned()
    }

    /// Get an extractor that can handle a file.
    #[must_use]
    pub fn get_for_file(&self, path: &Path, mime_type: &str) -> Option<Arc<dyn ContentExtractor>> {
        if let Some(extractor) = self.get_for_mime(mime_type) {
            return Some(extractor);
        }

        self.extractors
            .values()
            .find(|extractor| extractor.can_extract(path, mime_type))
            .cloned()
    }

    /// Extract content from a file.
    pub async fn extract(
        &self,
        path: &Path,
        mime_type: &str,
    ) -> Result<ExtractedContent, ExtractError> {
        let extractor = self
            .get_for_file(path, mime_type)
            .ok_or_else(|| ExtractError::UnsupportedType(mime_type.to_string()))?;

        extractor.extract(path).await
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
