//! Recursive character splitting.
//!
//! Text is split on the coarsest separator that occurs in it (paragraph, line,
//! word, then single characters). Pieces still longer than `chunk_size` are
//! split again with the next separator. Small pieces are merged back together
//! up to `chunk_size`, and each new chunk starts with up to `chunk_overlap`
//! characters carried over from the previous one. Sizes are in characters.

use arklife_core::{ChunkConfig, ChunkError, ChunkOutput, Chunker, ContentType, ExtractedContent};
use async_trait::async_trait;
use std::collections::VecDeque;
use tracing::debug;

/// Recursive character splitter.
pub struct RecursiveChunker;

impl RecursiveChunker {
    /// Create a new recursive chunker.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for RecursiveChunker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Chunker for RecursiveChunker {
    fn name(&self) -> &str {
        "recursive"
    }

    fn can_chunk(&self, _content_type: &ContentType) -> bool {
        true
    }

    async fn chunk(
        &self,
        content: &ExtractedContent,
        config: &ChunkConfig,
    ) -> Result<Vec<ChunkOutput>, ChunkError> {
        validate(config)?;

        let mut outputs = Vec::new();
        for page in content.segments() {
            if page.text.trim().is_empty() {
                continue;
            }

            let pieces = split_text(&page.text, &config.separators, config);
            let mut cursor = 0usize;
            for piece in pieces {
                let byte_range = locate(&page.text, &piece, &mut cursor);
                outputs.push(ChunkOutput {
                    content: piece,
                    page: page.number,
                    byte_range,
                });
            }
        }

        debug!("Split content into {} chunks", outputs.len());
        Ok(outputs)
    }
}

/// Reject sizes the merge step cannot honour.
fn validate(config: &ChunkConfig) -> Result<(), ChunkError> {
    if config.chunk_size == 0 {
        return Err(ChunkError::InvalidConfig(
            "chunk_size must be > 0".to_string(),
        ));
    }
    if config.chunk_overlap >= config.chunk_size {
        return Err(ChunkError::InvalidConfig(format!(
            "chunk_overlap ({}) must be smaller than chunk_size ({})",
            config.chunk_overlap, config.chunk_size
        )));
    }
    Ok(())
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split `text` with the first applicable separator, recursing on oversized pieces.
fn split_text(text: &str, separators: &[String], config: &ChunkConfig) -> Vec<String> {
    // First separator present in the text; "" always applies
    let position = separators
        .iter()
        .position(|s| s.is_empty() || text.contains(s.as_str()));

    let (separator, remaining) = match position {
        Some(i) => (separators[i].as_str(), &separators[i + 1..]),
        None => ("", &[][..]),
    };

    let splits: Vec<String> = if separator.is_empty() {
        text.chars().map(String::from).collect()
    } else {
        text.split(separator)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    };

    let mut chunks = Vec::new();
    let mut good: Vec<String> = Vec::new();
    for piece in splits {
        if char_len(&piece) < config.chunk_size {
            good.push(piece);
            continue;
        }

        if !good.is_empty() {
            chunks.extend(merge_splits(&good, separator, config));
            good.clear();
        }
        if remaining.is_empty() {
            chunks.push(piece);
        } else {
            chunks.extend(split_text(&piece, remaining, config));
        }
    }
    if !good.is_empty() {
        chunks.extend(merge_splits(&good, separator, config));
    }

    chunks
}

/// Merge small splits into chunks no longer than `chunk_size`, keeping overlap.
fn merge_splits(splits: &[String], separator: &str, config: &ChunkConfig) -> Vec<String> {
    let separator_len = char_len(separator);
    let mut docs = Vec::new();
    let mut current: VecDeque<&str> = VecDeque::new();
    let mut total = 0usize;

    for split in splits {
        let len = char_len(split);
        let joiner = if current.is_empty() { 0 } else { separator_len };

        if total + len + joiner > config.chunk_size && !current.is_empty() {
            if let Some(doc) = join_docs(&current, separator) {
                docs.push(doc);
            }

            // Drop from the front until only the overlap remains and the next split fits
            while total > config.chunk_overlap
                || (total > 0
                    && total + len + if current.is_empty() { 0 } else { separator_len }
                        > config.chunk_size)
            {
                let Some(front) = current.pop_front() else {
                    break;
                };
                let joined = if current.is_empty() { 0 } else { separator_len };
                total -= char_len(front) + joined;
            }
        }

        current.push_back(split);
        total += len + if current.len() > 1 { separator_len } else { 0 };
    }

    if let Some(doc) = join_docs(&current, separator) {
        docs.push(doc);
    }
    docs
}

fn join_docs(docs: &VecDeque<&str>, separator: &str) -> Option<String> {
    let joined = docs.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Find `piece` in `text` at or after `cursor`, advancing the cursor.
fn locate(text: &str, piece: &str, cursor: &mut usize) -> std::ops::Range<u64> {
    let start_at = (*cursor).min(text.len());
    match text.get(start_at..).and_then(|rest| rest.find(piece)) {
        Some(offset) => {
            let start = start_at + offset;
            *cursor = start + piece.chars().next().map_or(1, char::len_utf8);
            start as u64..(start + piece.len()) as u64
        }
        None => {
            let end = (start_at + piece.len()).min(text.len());
            start_at as u64..end as u64
        }
    }
}
