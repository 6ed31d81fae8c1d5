//! Core types for arklife.
//!
//! This module contains the data structures shared across the pipeline:
//!
//! ## Extraction
//! - [`ExtractedContent`]: Text extracted from a reference document
//! - [`PageContent`]: One page of extracted text
//! - [`ContentType`]: Classification used to pick a chunker
//!
//! ## Chunks
//! - [`Chunk`]: A segment of the reference document with its embedding
//! - [`ChunkConfig`]: Size and overlap settings for splitting
//! - [`ChunkOutput`]: A chunk produced by a chunker, before embedding
//!
//! ## Embeddings
//! - [`EmbeddingConfig`]: Batch settings for embedding requests
//! - [`EmbeddingOutput`]: Result of embedding a text
//!
//! ## Search and retrieval
//! - [`SearchQuery`]: Parameters for a vector search
//! - [`SearchResult`]: A matching chunk with similarity score
//! - [`RetrievedChunk`]: A passage handed to prompt construction
//! - [`StoreStats`]: Summary of a vector store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::Range;
use uuid::Uuid;

// ============================================================================
// Extraction
// ============================================================================

/// Content extracted from a reference document.
#[derive(Debug, Clone)]
pub struct ExtractedContent {
    /// Full text, pages joined by blank lines
    pub text: String,
    /// Per-page text (empty for formats without pages)
    pub pages: Vec<PageContent>,
    /// Document-level metadata
    pub metadata: ContentMetadataInfo,
}

impl ExtractedContent {
    /// Build content from plain text with no page structure.
    #[must_use]
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            pages: Vec::new(),
            metadata: ContentMetadataInfo::default(),
        }
    }

    /// Build content from pages; `text` is derived from them.
    #[must_use]
    pub fn from_pages(pages: Vec<PageContent>) -> Self {
        let text = pages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let page_count = u32::try_from(pages.len()).ok();
        Self {
            text,
            pages,
            metadata: ContentMetadataInfo {
                page_count,
                ..Default::default()
            },
        }
    }

    /// Pages to chunk. Content without page structure is a single unnumbered page.
    #[must_use]
    pub fn segments(&self) -> Vec<PageContent> {
        if self.pages.is_empty() {
            vec![PageContent {
                number: None,
                text: self.text.clone(),
            }]
        } else {
            self.pages.clone()
        }
    }
}

/// One page of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContent {
    /// Page number (1-indexed), None when the source has no pages
    pub number: Option<u32>,
    /// Page text
    pub text: String,
}

/// Metadata extracted from a document.
#[derive(Debug, Clone, Default)]
pub struct ContentMetadataInfo {
    /// Document title
    pub title: Option<String>,
    /// Page count (for PDFs)
    pub page_count: Option<u32>,
}

/// Type of extracted content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    /// Plain text
    Text,
    /// Markdown text
    Markdown,
    /// Paged PDF text
    Pdf,
}

impl ContentType {
    /// Classify a MIME type.
    #[must_use]
    pub fn from_mime(mime_type: &str) -> Self {
        match mime_type {
            "application/pdf" => Self::Pdf,
            "text/markdown" | "text/x-markdown" => Self::Markdown,
            _ => Self::Text,
        }
    }
}

// ============================================================================
// Chunks
// ============================================================================

/// A chunk of the reference document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique chunk identifier
    pub id: Uuid,
    /// Source document, as given to the indexer
    pub source: String,
    /// Page the chunk came from (1-indexed)
    pub page: Option<u32>,
    /// Position in the document (0-indexed)
    pub chunk_index: u32,
    /// The actual content
    pub content: String,
    /// Byte range within the page text
    pub byte_range: Range<u64>,
    /// Embedding vector (if computed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    /// Additional metadata
    #[serde(default)]
    pub metadata: ChunkMetadata,
}

/// Metadata associated with a chunk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Embedding model used
    pub embedding_model: Option<String>,
    /// When chunk was indexed
    pub indexed_at: Option<DateTime<Utc>>,
    /// blake3 hash of the chunk text
    pub content_hash: Option<String>,
    /// Additional key-value metadata
    #[serde(flatten)]
    pub extra: HashMap<String, String>,
}

/// Configuration for chunking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Maximum chunk size in characters
    pub chunk_size: usize,
    /// Characters shared between neighbouring chunks
    pub chunk_overlap: usize,
    /// Separators tried in order, coarsest first
    pub separators: Vec<String>,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            separators: vec![
                "\n\n".to_string(),
                "\n".to_string(),
                " ".to_string(),
                String::new(),
            ],
        }
    }
}

/// Output from a chunker.
#[derive(Debug, Clone)]
pub struct ChunkOutput {
    /// Chunk content
    pub content: String,
    /// Page the chunk belongs to
    pub page: Option<u32>,
    /// Byte range within the page text
    pub byte_range: Range<u64>,
}

// ============================================================================
// Embedding
// ============================================================================

/// Configuration for embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Texts per request
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self { batch_size: 64 }
    }
}

/// Output from embedding.
#[derive(Debug, Clone)]
pub struct EmbeddingOutput {
    /// The embedding vector
    pub embedding: Vec<f32>,
    /// Number of tokens in input (0 when the service does not report it)
    pub token_count: usize,
}

// ============================================================================
// Search
// ============================================================================

/// A search query.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// Query embedding
    pub embedding: Vec<f32>,
    /// Maximum results to return
    pub limit: usize,
}

/// A search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Chunk ID
    pub chunk_id: Uuid,
    /// Source document
    pub source: String,
    /// Page number if known
    pub page: Option<u32>,
    /// Chunk content
    pub content: String,
    /// Cosine similarity
    pub score: f32,
}

/// A passage returned by the retrieval collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub content: String,
    pub source: String,
    pub page: Option<u32>,
    pub score: f32,
}

impl From<SearchResult> for RetrievedChunk {
    fn from(result: SearchResult) -> Self {
        Self {
            content: result.content,
            source: result.source,
            page: result.page,
            score: result.score,
        }
    }
}

/// Vector store statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreStats {
    /// Total number of chunks
    pub total_chunks: u64,
    /// Embedding dimension
    pub dimension: usize,
    /// Model the chunks were embedded with
    pub embedding_model: Option<String>,
    /// Index size in bytes
    pub index_size_bytes: u64,
    /// Last update time
    pub last_updated: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== ExtractedContent Tests ====================

    #[test]
    fn test_from_pages_joins_text_and_counts_pages() {
        let content = ExtractedContent::from_pages(vec![
            PageContent {
                number: Some(1),
                text: "first".to_string(),
            },
            PageContent {
                number: Some(2),
                text: "second".to_string(),
            },
        ]);

        assert_eq!(content.text, "first\n\nsecond");
        assert_eq!(content.metadata.page_count, Some(2));
    }

    #[test]
    fn test_segments_without_pages_is_single_unnumbered_page() {
        let content = ExtractedContent::from_text("plain");
        let segments = content.segments();

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].number, None);
        assert_eq!(segments[0].text, "plain");
    }

    #[test]
    fn test_content_type_from_mime() {
        assert_eq!(ContentType::from_mime("application/pdf"), ContentType::Pdf);
        assert_eq!(ContentType::from_mime("text/markdown"), ContentType::Markdown);
        assert_eq!(ContentType::from_mime("text/plain"), ContentType::Text);
    }

    // ==================== Chunk Tests ====================

    #[test]
    fn test_chunk_serialization_skips_missing_embedding() {
        let chunk = Chunk {
            id: Uuid::new_v4(),
            source: "docs/lifecycle.pdf".to_string(),
            page: Some(3),
            chunk_index: 0,
            content: "aboutToAppear runs before build".to_string(),
            byte_range: 0..31,
            embedding: None,
            metadata: ChunkMetadata::default(),
        };

        let json = serde_json::to_string(&chunk).unwrap();
        assert!(!json.contains("embedding\""));

        let deserialized: Chunk = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.id, chunk.id);
        assert_eq!(deserialized.page, Some(3));
        assert!(deserialized.embedding.is_none());
    }

    #[test]
    fn test_chunk_config_default() {
        let config = ChunkConfig::default();
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.chunk_overlap, 200);
        assert_eq!(config.separators, vec!["\n\n", "\n", " ", ""]);
    }

    #[test]
    fn test_embedding_config_default() {
        assert_eq!(EmbeddingConfig::default().batch_size, 64);
    }

    // ==================== Retrieval Tests ====================

    #[test]
    fn test_retrieved_chunk_from_search_result() {
        let result = SearchResult {
            chunk_id: Uuid::new_v4(),
            source: "guide.pdf".to_string(),
            page: None,
            content: "onPageShow".to_string(),
            score: 0.5,
        };

        let retrieved = RetrievedChunk::from(result);
        assert_eq!(retrieved.source, "guide.pdf");
        assert_eq!(retrieved.page, None);
        assert_eq!(retrieved.content, "onPageShow");
    }

    #[test]
    fn test_store_stats_default() {
        let stats = StoreStats::default();
        assert_eq!(stats.total_chunks, 0);
        assert!(stats.embedding_model.is_none());
        assert!(stats.last_updated.is_none());
    }
}
