//! Main indexing service.

use arklife_chunker::ChunkerRegistry;
use arklife_core::{
    Chunk, ChunkConfig, ChunkError, ChunkMetadata, ChunkOutput, ContentType, Embedder,
    EmbeddingConfig, Error, ExtractError, Result, VectorStore,
};
use arklife_extract::ExtractorRegistry;
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Configuration for the indexer.
#[derive(Debug, Clone, Default)]
pub struct IndexerConfig {
    /// Chunk configuration
    pub chunk_config: ChunkConfig,
    /// Embedding configuration
    pub embed_config: EmbeddingConfig,
}

/// Result of [`IndexerService::build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexOutcome {
    /// The store already held chunks and no rebuild was requested
    Skipped {
        /// Chunks already in the store
        existing_chunks: u64,
    },
    /// The store was rebuilt
    Built {
        /// Pages (or unnumbered segments) that produced text
        pages: usize,
        /// Chunks written
        chunks: usize,
    },
}

/// Main indexing service.
pub struct IndexerService {
    /// Vector store, opened read-write
    store: Arc<dyn VectorStore>,
    /// Extractor registry
    extractors: Arc<ExtractorRegistry>,
    /// Chunker registry
    chunkers: Arc<ChunkerRegistry>,
    /// Embedder
    embedder: Arc<dyn Embedder>,
    /// Configuration
    config: IndexerConfig,
}

impl IndexerService {
    /// Create a new indexer service with the default extractors and chunker.
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        config: IndexerConfig,
    ) -> Self {
        Self {
            store,
            extractors: Arc::new(ExtractorRegistry::with_defaults()),
            chunkers: Arc::new(ChunkerRegistry::with_defaults()),
            embedder,
            config,
        }
    }

    /// Build the index from `document`.
    ///
    /// A store that already holds chunks is left alone unless `force` is set.
    pub async fn build(&self, document: &Path, force: bool) -> Result<IndexOutcome> {
        self.store.init().await?;

        let existing = self.store.stats().await?.total_chunks;
        if existing > 0 && !force {
            info!(
                "Vector store already holds {} chunks, skipping (use --force to rebuild)",
                existing
            );
            return Ok(IndexOutcome::Skipped {
                existing_chunks: existing,
            });
        }

        if !document.is_file() {
            return Err(Error::Extraction(ExtractError::Failed(format!(
                "document not found: {}",
                document.display()
            ))));
        }

        info!("Indexing {:?}", document);

        // Determine MIME type
        let mime_type = mime_guess::from_path(document)
            .first_or_text_plain()
            .to_string();
        let content_type = ContentType::from_mime(&mime_type);

        let content = self.extractors.extract(document, &mime_type).await?;
        let pages = content
            .segments()
            .iter()
            .filter(|p| !p.text.trim().is_empty())
            .count();
        if pages == 0 {
            return Err(Error::Extraction(ExtractError::Failed(format!(
                "no text extracted from {}",
                document.display()
            ))));
        }
        debug!("Extracted {} pages with text", pages);

        let outputs = self
            .chunkers
            .chunk(&content, &content_type, &self.config.chunk_config)
            .await?;
        if outputs.is_empty() {
            return Err(Error::Chunking(ChunkError::Failed(format!(
                "{} produced no chunks",
                document.display()
            ))));
        }
        info!("Split {} pages into {} chunks", pages, outputs.len());

        // Prepare texts for embedding
        let texts: Vec<&str> = outputs.iter().map(|c| c.content.as_str()).collect();
        let embeddings = self
            .embedder
            .embed_text(&texts, &self.config.embed_config)
            .await?;
        if embeddings.len() != outputs.len() {
            return Err(Error::Other(format!(
                "embedder returned {} vectors for {} chunks",
                embeddings.len(),
                outputs.len()
            )));
        }

        let source = document.display().to_string();
        let model_name = self.embedder.model_name().to_string();
        let now = Utc::now();

        let chunks: Vec<Chunk> = outputs
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(idx, (output, emb_output))| {
                build_chunk(&source, idx, output, emb_output.embedding, &model_name, now)
            })
            .collect();
        let chunk_count = chunks.len();

        let removed = self.store.clear().await?;
        if removed > 0 {
            debug!("Removed {} stale chunks", removed);
        }
        self.store.upsert_chunks(&chunks).await?;

        info!("Indexed {:?} ({} pages, {} chunks)", document, pages, chunk_count);
        Ok(IndexOutcome::Built {
            pages,
            chunks: chunk_count,
        })
    }
}

/// Build a Chunk from a chunker output and its embedding.
fn build_chunk(
    source: &str,
    chunk_index: usize,
    output: ChunkOutput,
    embedding: Vec<f32>,
    model_name: &str,
    indexed_at: DateTime<Utc>,
) -> Chunk {
    let content_hash = blake3::hash(output.content.as_bytes()).to_hex().to_string();

    Chunk {
        id: Uuid::new_v4(),
        source: source.to_string(),
        page: output.page,
        chunk_index: u32::try_from(chunk_index).unwrap_or(u32::MAX),
        content: output.content,
        byte_range: output.byte_range,
        embedding: Some(embedding),
        metadata: ChunkMetadata {
            embedding_model: Some(model_name.to_string()),
            indexed_at: Some(indexed_at),
            content_hash: Some(content_hash),
            extra: Default::default(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arklife_core::{EmbedError, EmbeddingOutput};
    use arklife_store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    const TEST_DIM: usize = 4;

    /// Deterministic embedder that counts how many texts it saw.
    struct CountingEmbedder {
        calls: AtomicUsize,
        texts: AtomicUsize,
    }

    impl CountingEmbedder {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                texts: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Embedder for CountingEmbedder {
        fn model_name(&self) -> &str {
            "counting"
        }

        async fn embed_text(
            &self,
            texts: &[&str],
            _config: &EmbeddingConfig,
        ) -> std::result::Result<Vec<EmbeddingOutput>, EmbedError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.texts.fetch_add(texts.len(), Ordering::SeqCst);
            Ok(texts
                .iter()
                .map(|t| EmbeddingOutput {
                    embedding: vec![t.len() as f32, 1.0, 0.0, 0.0],
                    token_count: 0,
                })
                .collect())
        }
    }

    fn write_document(dir: &TempDir, text: &str) -> std::path::PathBuf {
        let path = dir.path().join("lifecycle.txt");
        std::fs::write(&path, text).unwrap();
        path
    }

    fn small_chunks() -> IndexerConfig {
        IndexerConfig {
            chunk_config: ChunkConfig {
                chunk_size: 60,
                chunk_overlap: 10,
                ..Default::default()
            },
            embed_config: EmbeddingConfig::default(),
        }
    }

    const DOCUMENT: &str = "aboutToAppear runs after the component instance is created.\n\n\
        build describes the UI.\n\n\
        onPageShow runs each time the page is displayed.\n\n\
        aboutToDisappear runs before the component is destroyed.";

    #[tokio::test]
    async fn test_build_indexes_document() {
        let temp = TempDir::new().unwrap();
        let document = write_document(&temp, DOCUMENT);
        let store = Arc::new(MemoryStore::new(TEST_DIM));
        let embedder = Arc::new(CountingEmbedder::new());

        let indexer = IndexerService::new(store.clone(), embedder.clone(), small_chunks());
        let outcome = indexer.build(&document, false).await.unwrap();

        let IndexOutcome::Built { pages, chunks } = outcome else {
            panic!("Expected a build");
        };
        assert_eq!(pages, 1);
        assert!(chunks >= 4);

        let stored = store.chunks().await;
        assert_eq!(stored.len(), chunks);
        assert_eq!(embedder.texts.load(Ordering::SeqCst), chunks);

        let first = &stored[0];
        assert_eq!(first.chunk_index, 0);
        assert_eq!(first.page, None);
        assert_eq!(first.source, document.display().to_string());
        assert_eq!(first.metadata.embedding_model.as_deref(), Some("counting"));
        assert_eq!(
            first.metadata.content_hash.as_deref(),
            Some(blake3::hash(first.content.as_bytes()).to_hex().as_str())
        );
    }

    #[tokio::test]
    async fn test_build_skips_populated_store() {
        let temp = TempDir::new().unwrap();
        let document = write_document(&temp, DOCUMENT);
        let store = Arc::new(MemoryStore::new(TEST_DIM));
        let embedder = Arc::new(CountingEmbedder::new());
        let indexer = IndexerService::new(store.clone(), embedder.clone(), small_chunks());

        let IndexOutcome::Built { chunks, .. } = indexer.build(&document, false).await.unwrap()
        else {
            panic!("Expected a build");
        };
        let calls_after_first = embedder.calls.load(Ordering::SeqCst);

        let outcome = indexer.build(&document, false).await.unwrap();

        assert_eq!(
            outcome,
            IndexOutcome::Skipped {
                existing_chunks: chunks as u64
            }
        );
        assert_eq!(embedder.calls.load(Ordering::SeqCst), calls_after_first);
    }

    #[tokio::test]
    async fn test_build_force_replaces_contents() {
        let temp = TempDir::new().unwrap();
        let document = write_document(&temp, DOCUMENT);
        let store = Arc::new(MemoryStore::new(TEST_DIM));
        let indexer =
            IndexerService::new(store.clone(), Arc::new(CountingEmbedder::new()), small_chunks());

        indexer.build(&document, false).await.unwrap();
        std::fs::write(&document, "onPageHide runs when the page is hidden.").unwrap();

        let outcome = indexer.build(&document, true).await.unwrap();

        assert_eq!(outcome, IndexOutcome::Built { pages: 1, chunks: 1 });
        let stored = store.chunks().await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].content, "onPageHide runs when the page is hidden.");
    }

    #[tokio::test]
    async fn test_build_missing_document() {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(MemoryStore::new(TEST_DIM));
        let embedder = Arc::new(CountingEmbedder::new());
        let indexer = IndexerService::new(store, embedder.clone(), small_chunks());

        let result = indexer.build(&temp.path().join("missing.pdf"), false).await;

        assert!(matches!(result, Err(Error::Extraction(_))));
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_build_blank_document() {
        let temp = TempDir::new().unwrap();
        let document = write_document(&temp, "  \n\n  ");
        let store = Arc::new(MemoryStore::new(TEST_DIM));
        let indexer = IndexerService::new(store, Arc::new(CountingEmbedder::new()), small_chunks());

        let result = indexer.build(&document, false).await;
        assert!(matches!(result, Err(Error::Extraction(ExtractError::Failed(_)))));
    }

    #[tokio::test]
    async fn test_build_rejects_invalid_chunk_config() {
        let temp = TempDir::new().unwrap();
        let document = write_document(&temp, DOCUMENT);
        let store = Arc::new(MemoryStore::new(TEST_DIM));
        let config = IndexerConfig {
            chunk_config: ChunkConfig {
                chunk_size: 10,
                chunk_overlap: 20,
                ..Default::default()
            },
            ..Default::default()
        };
        let indexer = IndexerService::new(store, Arc::new(CountingEmbedder::new()), config);

        let result = indexer.build(&document, false).await;
        assert!(matches!(
            result,
            Err(Error::Chunking(ChunkError::InvalidConfig(_)))
        ));
    }

    #[test]
    fn test_build_chunk_hashes_content() {
        let output = ChunkOutput {
            content: "onBackPress".to_string(),
            page: Some(4),
            byte_range: 10..21,
        };

        let chunk = build_chunk("guide.pdf", 7, output, vec![0.1; 3], "m", Utc::now());

        assert_eq!(chunk.chunk_index, 7);
        assert_eq!(chunk.page, Some(4));
        assert_eq!(chunk.byte_range, 10..21);
        assert_eq!(
            chunk.metadata.content_hash,
            Some(blake3::hash(b"onBackPress").to_hex().to_string())
        );
    }
}
