//! In-memory store for tests.

use arklife_core::{Chunk, SearchQuery, SearchResult, StoreError, StoreStats, VectorStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::similarity::rank;

/// In-memory vector store.
///
/// Same brute-force cosine search as [`FlatStore`](crate::FlatStore), without
/// touching the filesystem.
///
/// # Example
///
/// ```rust
/// use arklife_store::MemoryStore;
/// use arklife_core::VectorStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new(1536);
/// store.init().await?;
///
/// let stats = store.stats().await?;
/// assert_eq!(stats.total_chunks, 0);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct MemoryStore {
    dimension: usize,
    chunks: Arc<RwLock<Vec<Chunk>>>,
    last_updated: Arc<RwLock<Option<DateTime<Utc>>>>,
}

impl MemoryStore {
    /// Create a new in-memory store with the given embedding dimension.
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            chunks: Arc::new(RwLock::new(Vec::new())),
            last_updated: Arc::new(RwLock::new(None)),
        }
    }

    /// Snapshot of every stored chunk, in insertion order.
    pub async fn chunks(&self) -> Vec<Chunk> {
        self.chunks.read().await.clone()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(1536)
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn init(&self) -> Result<(), StoreError> {
        debug!("MemoryStore initialized (dimension: {})", self.dimension);
        Ok(())
    }

    async fn upsert_chunks(&self, chunks: &[Chunk]) -> Result<(), StoreError> {
        let mut store = self.chunks.write().await;
        for chunk in chunks {
            let Some(embedding) = &chunk.embedding else {
                return Err(StoreError::Schema(format!(
                    "chunk {} has no embedding",
                    chunk.id
                )));
            };
            if embedding.len() != self.dimension {
                return Err(StoreError::Schema(format!(
                    "chunk {} has dimension {}, store expects {}",
                    chunk.id,
                    embedding.len(),
                    self.dimension
                )));
            }

            match store.iter_mut().find(|c| c.id == chunk.id) {
                Some(existing) => *existing = chunk.clone(),
                None => store.push(chunk.clone()),
            }
        }

        *self.last_updated.write().await = Some(Utc::now());
        debug!("Upserted {} chunks", chunks.len());
        Ok(())
    }

    async fn clear(&self) -> Result<u64, StoreError> {
        let mut store = self.chunks.write().await;
        let removed = store.len() as u64;
        store.clear();

        *self.last_updated.write().await = Some(Utc::now());
        Ok(removed)
    }

    async fn search(&self, query: SearchQuery) -> Result<Vec<SearchResult>, StoreError> {
        let chunks = self.chunks.read().await;
        Ok(rank(chunks.iter(), &query.embedding, query.limit))
    }

    async fn stats(&self) -> Result<StoreStats, StoreError> {
        let chunks = self.chunks.read().await;

        Ok(StoreStats {
            total_chunks: chunks.len() as u64,
            dimension: self.dimension,
            embedding_model: chunks
                .iter()
                .find_map(|c| c.metadata.embedding_model.clone()),
            index_size_bytes: 0,
            last_updated: *self.last_updated.read().await,
        })
    }
}
