//! Query embedding and vector search.

use arklife_core::{
    Embedder, EmbeddingConfig, Error, RetrievedChunk, Retriever, SearchQuery, VectorStore,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Retriever composed of an embedder and a vector store.
pub struct VectorRetriever {
    /// Vector store
    store: Arc<dyn VectorStore>,
    /// Embedder for query embedding
    embedder: Arc<dyn Embedder>,
}

impl VectorRetriever {
    /// Create a new retriever.
    pub fn new(store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self { store, embedder }
    }
}

#[async_trait]
impl Retriever for VectorRetriever {
    async fn retrieve(&self, query: &str, k: usize) -> arklife_core::Result<Vec<RetrievedChunk>> {
        debug!("Retrieving top {} passages for {} chars of query", k, query.chars().count());

        if k == 0 {
            return Ok(Vec::new());
        }

        let embedding = self
            .embedder
            .embed_query(query, &EmbeddingConfig::default())
            .await
            .map_err(Error::Embedding)?;

        let results = self
            .store
            .search(SearchQuery {
                embedding: embedding.embedding,
                limit: k,
            })
            .await
            .map_err(Error::Store)?;

        debug!("Found {} passages", results.len());
        Ok(results.into_iter().map(RetrievedChunk::from).collect())
    }
}
