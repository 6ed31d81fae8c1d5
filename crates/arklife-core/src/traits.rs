//! Core traits for arklife components.
//!
//! - [`ContentExtractor`]: Extract text from the reference document
//! - [`Chunker`]: Split content into chunks
//! - [`Embedder`]: Generate vector embeddings
//! - [`VectorStore`]: Store and search vectors
//! - [`Retriever`]: Top-K passage lookup for a query
//! - [`CompletionModel`]: Hosted language model completion

use async_trait::async_trait;
use std::path::Path;

use crate::error::{ChunkError, CompletionError, EmbedError, ExtractError, StoreError};
use crate::types::{
    Chunk, ChunkConfig, ChunkOutput, ContentType, EmbeddingConfig, EmbeddingOutput,
    ExtractedContent, RetrievedChunk, SearchQuery, SearchResult, StoreStats,
};

// ============================================================================
// Content Extraction
// ============================================================================

/// Trait for extracting content from files.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    /// Returns the MIME types this extractor can handle.
    fn supported_types(&self) -> &[&str];

    /// Check if this extractor can handle the given file.
    fn can_extract(&self, path: &Path, mime_type: &str) -> bool {
        self.supported_types().contains(&mime_type) || self.can_extract_by_extension(path)
    }

    /// Check if extractor can handle based on file extension.
    fn can_extract_by_extension(&self, _path: &Path) -> bool {
        false
    }

    /// Extract content from a file.
    async fn extract(&self, path: &Path) -> Result<ExtractedContent, ExtractError>;
}

// ============================================================================
// Chunking
// ============================================================================

/// Trait for splitting content into chunks.
#[async_trait]
pub trait Chunker: Send + Sync {
    /// Name of this chunking strategy.
    fn name(&self) -> &str;

    /// Check if this chunker can handle the given content type.
    fn can_chunk(&self, content_type: &ContentType) -> bool;

    /// Chunk the extracted content, page by page.
    async fn chunk(
        &self,
        content: &ExtractedContent,
        config: &ChunkConfig,
    ) -> Result<Vec<ChunkOutput>, ChunkError>;
}

// ============================================================================
// Embedding
// ============================================================================

/// Trait for generating embeddings.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Model name/identifier.
    fn model_name(&self) -> &str;

    /// Embed text content.
    async fn embed_text(
        &self,
        texts: &[&str],
        config: &EmbeddingConfig,
    ) -> Result<Vec<EmbeddingOutput>, EmbedError>;

    /// Embed a query.
    async fn embed_query(
        &self,
        query: &str,
        config: &EmbeddingConfig,
    ) -> Result<EmbeddingOutput, EmbedError> {
        let results = self.embed_text(&[query], config).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| EmbedError::Inference("empty embedding result".to_string()))
    }
}

// ============================================================================
// Vector Storage
// ============================================================================

/// Trait for vector storage and search.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Initialize the store.
    async fn init(&self) -> Result<(), StoreError>;

    /// Insert chunks. Every chunk must carry an embedding.
    async fn upsert_chunks(&self, chunks: &[Chunk]) -> Result<(), StoreError>;

    /// Remove every chunk, returning how many were dropped.
    async fn clear(&self) -> Result<u64, StoreError>;

    /// Search for similar chunks.
    async fn search(&self, query: SearchQuery) -> Result<Vec<SearchResult>, StoreError>;

    /// Get store statistics.
    async fn stats(&self) -> Result<StoreStats, StoreError>;
}

// ============================================================================
// Retrieval
// ============================================================================

/// Top-K passage lookup. Each call is independent.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Return up to `k` passages most similar to `query`, best first.
    async fn retrieve(&self, query: &str, k: usize) -> crate::Result<Vec<RetrievedChunk>>;
}

// ============================================================================
// Completion
// ============================================================================

/// Trait for language model completion.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Model name/identifier.
    fn model_name(&self) -> &str;

    /// Complete a prompt, returning the raw text answer.
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}
