//! Chunker registry for managing chunking strategies.

use arklife_core::{ChunkConfig, ChunkError, ChunkOutput, Chunker, ContentType, ExtractedContent};
use std::collections::HashMap;
use std::sync::Arc;

use crate::RecursiveChunker;

/// Registry of chunking strategies.
pub struct ChunkerRegistry {
    /// Named chunkers
    chunkers: HashMap<String, Arc<dyn Chunker>>,
    /// Default chunker name
    default_chunker: Option<String>,
}

impl ChunkerRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            chunkers: HashMap::new(),
            default_chunker: None,
        }
    }

    /// Registry with the recursive splitter as default.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(RecursiveChunker::new());
        registry.set_default("recursive");
        registry
    }

    /// Register a chunker under its own name.
    pub fn register<C: Chunker + 'static>(&mut self, chunker: C) {
        let chunker = Arc::new(chunker);
        self.chunkers.insert(chunker.name().to_string(), chunker);
    }

    /// Set the default chunker.
    pub fn set_default(&mut self, name: &str) {
        self.default_chunker = Some(name.to_string());
    }

    /// Look up a chunker by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Chunker>> {
        self.chunkers.get(name).cloned()
    }

    /// Get a chunker for a content type, preferring the default.
    #[must_use]
    pub fn get_for_content_type(&self, content_type: &ContentType) -> Option<Arc<dyn Chunker>> {
        if let Some(chunker) = self
            .default_chunker
            .as_ref()
            .and_then(|name| self.chunkers.get(name))
            .filter(|c| c.can_chunk(content_type))
        {
            return Some(chunker.clone());
        }

        self.chunkers
            .values()
            .find(|c| c.can_chunk(content_type))
            .cloned()
    }

    /// Chunk content using the appropriate strategy.
    pub async fn chunk(
        &self,
        content: &ExtractedContent,
        content_type: &ContentType,
        config: &ChunkConfig,
    ) -> Result<Vec<ChunkOutput>, ChunkError> {
        let chunker = self
            .get_for_content_type(content_type)
            .ok_or_else(|| ChunkError::Failed("no suitable chunker found".to_string()))?;

        chunker.chunk(content, config).await
    }
}

impl Default for ChunkerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registry_is_empty() {
        let registry = ChunkerRegistry::new();
        assert!(registry.chunkers.is_empty());
        assert!(registry.default_chunker.is_none());
    }

    #[test]
    fn test_with_defaults_registers_recursive() {
        let registry = ChunkerRegistry::with_defaults();

        assert!(registry.get("recursive").is_some());
        assert_eq!(registry.default_chunker.as_deref(), Some("recursive"));

        let chunker = registry.get_for_content_type(&ContentType::Pdf).unwrap();
        assert_eq!(chunker.name(), "recursive");
    }

    #[test]
    fn test_get_for_content_type_none_when_empty() {
        let registry = ChunkerRegistry::new();
        assert!(registry.get_for_content_type(&ContentType::Text).is_none());
    }

    #[tokio::test]
    async fn test_chunk_long_text_produces_several_chunks() {
        let registry = ChunkerRegistry::with_defaults();
        let text = "onPageShow fires when the page is displayed. ".repeat(100);
        let content = ExtractedContent::from_text(text);
        let config = ChunkConfig {
            chunk_size: 200,
            chunk_overlap: 40,
            ..Default::default()
        };

        let chunks = registry
            .chunk(&content, &ContentType::Text, &config)
            .await
            .unwrap();

        assert!(chunks.len() > 1, "Long text should produce multiple chunks");
        assert!(chunks.iter().all(|c| c.content.chars().count() <= 200));
    }

    #[tokio::test]
    async fn test_chunk_fails_without_chunker() {
        let registry = ChunkerRegistry::new();
        let content = ExtractedContent::from_text("Hello");

        let result = registry
            .chunk(&content, &ContentType::Text, &ChunkConfig::default())
            .await;

        match result {
            Err(ChunkError::Failed(msg)) => assert!(msg.contains("no suitable chunker")),
            _ => panic!("Expected ChunkError::Failed"),
        }
    }

    #[tokio::test]
    async fn test_chunk_rejects_invalid_overlap() {
        let registry = ChunkerRegistry::with_defaults();
        let content = ExtractedContent::from_text("Hello");
        let config = ChunkConfig {
            chunk_size: 10,
            chunk_overlap: 10,
            ..Default::default()
        };

        let result = registry.chunk(&content, &ContentType::Text, &config).await;
        assert!(matches!(result, Err(ChunkError::InvalidConfig(_))));
    }
}
