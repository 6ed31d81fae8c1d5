//! No-op embedder that returns zero vectors.

use arklife_core::{EmbedError, Embedder, EmbeddingConfig, EmbeddingOutput};
use async_trait::async_trait;

/// Embedder returning zero vectors of a fixed dimension.
///
/// Zero vectors score 0.0 against everything, so search order falls back to
/// insertion order. Useful for exercising the pipeline without a service.
pub struct NoopEmbedder {
    dimension: usize,
}

impl NoopEmbedder {
    /// Create a no-op embedder with the default dimension (1536).
    #[must_use]
    pub fn new() -> Self {
        Self { dimension: 1536 }
    }

    /// Create a no-op embedder with a custom dimension.
    #[must_use]
    pub fn with_dimension(dimension: usize) -> Self {
        Self { dimension }
    }

    /// Vector length produced by this embedder.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

impl Default for NoopEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Embedder for NoopEmbedder {
    fn model_name(&self) -> &str {
        "noop"
    }

    async fn embed_text(
        &self,
        texts: &[&str],
        _config: &EmbeddingConfig,
    ) -> Result<Vec<EmbeddingOutput>, EmbedError> {
        Ok(texts
            .iter()
            .map(|_| EmbeddingOutput {
                embedding: vec![0.0; self.dimension],
                token_count: 0,
            })
            .collect())
    }
}
