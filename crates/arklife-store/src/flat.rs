//! Flat-file vector store.
//!
//! Layout of a store directory:
//!
//! | File | Content |
//! |------|---------|
//! | `meta.json` | [`FlatMeta`] |
//! | `chunks.jsonl` | one [`Chunk`] per line, without its embedding |
//! | `vectors.bin` | `RAGV` magic, version, dimension, count (`u32` LE), then `f32` LE values |
//! | `.lock` | `fs2` lock file |
//!
//! The whole index is held in memory once opened. Every write rewrites all
//! three files under the exclusive lock, staging them in a temporary directory
//! first.

use arklife_core::{
    Chunk, Error, IndexError, SearchQuery, SearchResult, StoreError, StoreStats, VectorStore,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::similarity::rank;

const VECTORS_MAGIC: u32 = 0x5241_4756; // "RAGV"
const VECTORS_VERSION: u32 = 1;
const META_VERSION: u32 = 1;

const META_FILE: &str = "meta.json";
const CHUNKS_FILE: &str = "chunks.jsonl";
const VECTORS_FILE: &str = "vectors.bin";
const LOCK_FILE: &str = ".lock";

/// How a [`FlatStore`] was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Search and stats only
    ReadOnly,
    /// Full access; writes are persisted
    ReadWrite,
}

/// Contents of `meta.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatMeta {
    /// Layout version
    pub version: u32,
    /// Model the chunks were embedded with
    pub embedding_model: Option<String>,
    /// Vector dimension
    pub dimension: usize,
    /// Number of chunks
    pub chunk_count: usize,
    /// When the store was first written
    pub created_at: DateTime<Utc>,
    /// Last write
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct FlatState {
    chunks: Vec<Chunk>,
    meta: Option<FlatMeta>,
    /// Vector dimension; 0 until the first chunk is stored
    dimension: usize,
}

/// Vector store persisted as flat files in one directory.
pub struct FlatStore {
    dir: PathBuf,
    mode: AccessMode,
    state: RwLock<FlatState>,
}

impl FlatStore {
    /// Open an existing, non-empty store for searching.
    ///
    /// Fails with [`IndexError::Missing`] when the directory or `meta.json`
    /// is absent and [`IndexError::Empty`] when it holds no chunks.
    pub fn open_read_only(dir: &Path) -> arklife_core::Result<Self> {
        if !dir.is_dir() || !dir.join(META_FILE).is_file() {
            return Err(Error::Index(IndexError::Missing(dir.to_path_buf())));
        }

        let (meta, chunks) = read_index(dir)?;
        if meta.chunk_count == 0 || chunks.is_empty() {
            return Err(Error::Index(IndexError::Empty(dir.to_path_buf())));
        }

        info!(
            "Opened vector store {:?} read-only ({} chunks, dimension {})",
            dir, meta.chunk_count, meta.dimension
        );

        Ok(Self {
            dir: dir.to_path_buf(),
            mode: AccessMode::ReadOnly,
            state: RwLock::new(FlatState {
                chunks,
                dimension: meta.dimension,
                meta: Some(meta),
            }),
        })
    }

    /// Open or create a store for writing.
    ///
    /// Existing content is loaded so callers can inspect it before replacing it.
    /// An empty store takes its dimension from the first chunks written to it.
    pub fn open_read_write(dir: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(dir)?;

        let state = if dir.join(META_FILE).is_file() {
            let (meta, chunks) = read_index(dir)?;
            FlatState {
                chunks,
                dimension: meta.dimension,
                meta: Some(meta),
            }
        } else {
            FlatState::default()
        };

        debug!(
            "Opened vector store {:?} read-write ({} existing chunks)",
            dir,
            state.chunks.len()
        );

        Ok(Self {
            dir: dir.to_path_buf(),
            mode: AccessMode::ReadWrite,
            state: RwLock::new(state),
        })
    }

    /// Store directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Access mode the store was opened with.
    #[must_use]
    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    fn ensure_writable(&self) -> Result<(), StoreError> {
        match self.mode {
            AccessMode::ReadWrite => Ok(()),
            AccessMode::ReadOnly => Err(StoreError::ReadOnly),
        }
    }

    /// Write the in-memory state to disk.
    async fn persist(&self, state: &mut FlatState) -> Result<(), StoreError> {
        let now = Utc::now();
        let embedding_model = state
            .chunks
            .iter()
            .find_map(|c| c.metadata.embedding_model.clone());
        let meta = FlatMeta {
            version: META_VERSION,
            embedding_model,
            dimension: state.dimension,
            chunk_count: state.chunks.len(),
            created_at: state.meta.as_ref().map_or(now, |m| m.created_at),
            updated_at: now,
        };

        let dir = self.dir.clone();
        let chunks = state.chunks.clone();
        let written = meta.clone();
        tokio::task::spawn_blocking(move || write_index(&dir, &chunks, &written))
            .await
            .map_err(|e| StoreError::Insert(format!("Task join error: {e}")))??;

        state.meta = Some(meta);
        Ok(())
    }
}

#[async_trait]
impl VectorStore for FlatStore {
    async fn init(&self) -> Result<(), StoreError> {
        if self.mode == AccessMode::ReadWrite {
            fs::create_dir_all(&self.dir)?;
        }
        Ok(())
    }

    async fn upsert_chunks(&self, chunks: &[Chunk]) -> Result<(), StoreError> {
        self.ensure_writable()?;

        let mut state = self.state.write().await;
        let mut dimension = state.dimension;
        if state.chunks.is_empty() {
            dimension = chunks
                .iter()
                .find_map(|c| c.embedding.as_ref().map(Vec::len))
                .unwrap_or(dimension);
        }

        for chunk in chunks {
            match &chunk.embedding {
                None => {
                    return Err(StoreError::Schema(format!(
                        "chunk {} has no embedding",
                        chunk.id
                    )))
                }
                Some(e) if e.len() != dimension => {
                    return Err(StoreError::Schema(format!(
                        "chunk {} has dimension {}, store expects {}",
                        chunk.id,
                        e.len(),
                        dimension
                    )))
                }
                Some(_) => {}
            }
        }

        state.dimension = dimension;
        for chunk in chunks {
            match state.chunks.iter_mut().find(|c| c.id == chunk.id) {
                Some(existing) => *existing = chunk.clone(),
                None => state.chunks.push(chunk.clone()),
            }
        }

        self.persist(&mut state).await?;
        debug!("Upserted {} chunks into {:?}", chunks.len(), self.dir);
        Ok(())
    }

    async fn clear(&self) -> Result<u64, StoreError> {
        self.ensure_writable()?;

        let mut state = self.state.write().await;
        let removed = state.chunks.len() as u64;
        state.chunks.clear();
        self.persist(&mut state).await?;

        debug!("Cleared {} chunks from {:?}", removed, self.dir);
        Ok(removed)
    }

    async fn search(&self, query: SearchQuery) -> Result<Vec<SearchResult>, StoreError> {
        let state = self.state.read().await;
        if !state.chunks.is_empty() && query.embedding.len() != state.dimension {
            return Err(StoreError::Query(format!(
                "query dimension {} does not match store dimension {}",
                query.embedding.len(),
                state.dimension
            )));
        }

        Ok(rank(state.chunks.iter(), &query.embedding, query.limit))
    }

    async fn stats(&self) -> Result<StoreStats, StoreError> {
        let state = self.state.read().await;

        let index_size_bytes = [META_FILE, CHUNKS_FILE, VECTORS_FILE]
            .iter()
            .filter_map(|name| fs::metadata(self.dir.join(name)).ok())
            .map(|m| m.len())
            .sum();

        Ok(StoreStats {
            total_chunks: state.chunks.len() as u64,
            dimension: state.dimension,
            embedding_model: state.meta.as_ref().and_then(|m| m.embedding_model.clone()),
            index_size_bytes,
            last_updated: state.meta.as_ref().map(|m| m.updated_at),
        })
    }
}

// ============================================================================
// File format
// ============================================================================

fn lock_error(e: impl std::fmt::Display) -> StoreError {
    StoreError::Lock(e.to_string())
}

/// Shared lock on the store directory, if a lock file exists.
///
/// Released when the returned file is dropped.
fn acquire_shared_lock(dir: &Path) -> Result<Option<File>, StoreError> {
    let lock_path = dir.join(LOCK_FILE);
    if !lock_path.exists() {
        return Ok(None);
    }
    let lock_file = File::open(&lock_path)?;
    lock_file.lock_shared().map_err(lock_error)?;
    Ok(Some(lock_file))
}

/// Read meta, chunks and vectors under a shared lock.
fn read_index(dir: &Path) -> Result<(FlatMeta, Vec<Chunk>), StoreError> {
    let _lock = acquire_shared_lock(dir)?;

    let meta_json = fs::read_to_string(dir.join(META_FILE))?;
    let meta: FlatMeta = serde_json::from_str(&meta_json)
        .map_err(|e| StoreError::Schema(format!("invalid {META_FILE}: {e}")))?;

    if meta.chunk_count == 0 {
        return Ok((meta, Vec::new()));
    }

    let mut chunks = Vec::with_capacity(meta.chunk_count);
    let reader = BufReader::new(File::open(dir.join(CHUNKS_FILE))?);
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let chunk: Chunk = serde_json::from_str(&line).map_err(|e| {
            StoreError::Schema(format!("invalid {CHUNKS_FILE} line {}: {e}", line_no + 1))
        })?;
        chunks.push(chunk);
    }

    let vectors = read_vectors(&dir.join(VECTORS_FILE))?;
    if vectors.len() != chunks.len() {
        return Err(StoreError::Schema(format!(
            "{} chunks but {} vectors",
            chunks.len(),
            vectors.len()
        )));
    }
    for (chunk, vector) in chunks.iter_mut().zip(vectors) {
        chunk.embedding = Some(vector);
    }

    Ok((meta, chunks))
}

fn read_u32(bytes: &[u8], offset: usize) -> Result<u32, StoreError> {
    bytes
        .get(offset..offset + 4)
        .and_then(|b| b.try_into().ok())
        .map(u32::from_le_bytes)
        .ok_or_else(|| StoreError::Schema(format!("{VECTORS_FILE} is truncated")))
}

fn read_vectors(path: &Path) -> Result<Vec<Vec<f32>>, StoreError> {
    let bytes = fs::read(path)?;

    if read_u32(&bytes, 0)? != VECTORS_MAGIC {
        return Err(StoreError::Schema(format!("{VECTORS_FILE} has a bad magic number")));
    }
    let version = read_u32(&bytes, 4)?;
    if version != VECTORS_VERSION {
        return Err(StoreError::Schema(format!(
            "unsupported {VECTORS_FILE} version {version}"
        )));
    }
    let dims = read_u32(&bytes, 8)? as usize;
    let count = read_u32(&bytes, 12)? as usize;

    let expected = dims
        .checked_mul(count)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| {
            StoreError::Schema(format!(
                "{VECTORS_FILE} header claims {count} vectors of {dims} dimensions"
            ))
        })?;

    let body = &bytes[16..];
    if body.len() != expected {
        return Err(StoreError::Schema(format!(
            "{VECTORS_FILE} holds {} bytes, expected {expected}",
            body.len()
        )));
    }

    let values: Vec<f32> = body
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();

    if dims == 0 {
        return Ok(vec![Vec::new(); count]);
    }
    Ok(values.chunks(dims).map(<[f32]>::to_vec).collect())
}

/// Write all index files under an exclusive lock.
fn write_index(dir: &Path, chunks: &[Chunk], meta: &FlatMeta) -> Result<(), StoreError> {
    fs::create_dir_all(dir)?;

    let lock_file = File::create(dir.join(LOCK_FILE))?;
    lock_file.lock_exclusive().map_err(lock_error)?;

    let temp_dir = dir.join(format!(".tmp-{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&temp_dir)?;

    let result = write_files(&temp_dir, chunks, meta).and_then(|()| {
        // meta.json last, so a reader never sees a count without its data
        for name in [CHUNKS_FILE, VECTORS_FILE, META_FILE] {
            fs::rename(temp_dir.join(name), dir.join(name))?;
        }
        Ok(())
    });

    let _ = fs::remove_dir_all(&temp_dir);
    lock_file.unlock().map_err(lock_error)?;
    result
}

fn write_files(dir: &Path, chunks: &[Chunk], meta: &FlatMeta) -> Result<(), StoreError> {
    let to_schema = |e: serde_json::Error| StoreError::Schema(e.to_string());

    let mut chunks_out = BufWriter::new(File::create(dir.join(CHUNKS_FILE))?);
    for chunk in chunks {
        let mut line = chunk.clone();
        line.embedding = None;
        serde_json::to_writer(&mut chunks_out, &line).map_err(to_schema)?;
        chunks_out.write_all(b"\n")?;
    }
    chunks_out.flush()?;

    let count = u32::try_from(chunks.len())
        .map_err(|_| StoreError::Insert("too many chunks".to_string()))?;
    let dims = u32::try_from(meta.dimension)
        .map_err(|_| StoreError::Insert("dimension too large".to_string()))?;

    let mut vectors_out = BufWriter::new(File::create(dir.join(VECTORS_FILE))?);
    for header in [VECTORS_MAGIC, VECTORS_VERSION, dims, count] {
        vectors_out.write_all(&header.to_le_bytes())?;
    }
    for chunk in chunks {
        for value in chunk.embedding.iter().flatten() {
            vectors_out.write_all(&value.to_le_bytes())?;
        }
    }
    vectors_out.flush()?;

    let meta_json = serde_json::to_string_pretty(meta).map_err(to_schema)?;
    fs::write(dir.join(META_FILE), meta_json)?;
    Ok(())
}
