//! Brute-force cosine ranking shared by both stores.

use arklife_core::{Chunk, SearchResult};

/// Cosine similarity; 0.0 for mismatched lengths or zero vectors.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Score every embedded chunk against `query` and keep the best `limit`.
///
/// Ties keep insertion order.
pub(crate) fn rank<'a>(
    chunks: impl Iterator<Item = &'a Chunk>,
    query: &[f32],
    limit: usize,
) -> Vec<SearchResult> {
    let mut scored: Vec<(f32, &Chunk)> = chunks
        .filter_map(|chunk| {
            chunk
                .embedding
                .as_ref()
                .map(|embedding| (cosine_similarity(query, embedding), chunk))
        })
        .collect();

    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    scored
        .into_iter()
        .take(limit)
        .map(|(score, chunk)| SearchResult {
            chunk_id: chunk.id,
            source: chunk.source.clone(),
            page: chunk.page,
            content: chunk.content.clone(),
            score,
        })
        .collect()
}
