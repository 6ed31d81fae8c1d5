//! Vector storage layer for arklife.
//!
//! This crate implements the [`VectorStore`](arklife_core::VectorStore) trait
//! twice:
//!
//! - [`FlatStore`]: a directory of plain files (`meta.json`, `chunks.jsonl`,
//!   `vectors.bin`) searched by brute-force cosine similarity. Reads take a
//!   shared `fs2` lock, writes an exclusive one.
//! - [`MemoryStore`]: the same search over an in-memory list, for tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use arklife_store::FlatStore;
//! use arklife_core::VectorStore;
//!
//! // Analysis opens the index read-only and fails fast when it is missing
//! let store = FlatStore::open_read_only("vector_store".as_ref())?;
//! let results = store.search(query).await?;
//! ```

pub mod flat;
pub mod memory;
mod similarity;

pub use flat::{AccessMode, FlatMeta, FlatStore};
pub use memory::MemoryStore;
