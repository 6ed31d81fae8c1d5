//! # arklife-core
//!
//! Core types and traits for arklife, a retrieval-grounded analyzer of the
//! ArkUI custom-component lifecycle.
//!
//! ## Architecture
//!
//! ```text
//! Index:    Document → ContentExtractor → Chunker → Embedder → VectorStore
//!
//! Analyze:  scenario → Retriever (Embedder + VectorStore) → prompt
//!                    → CompletionModel → lifecycle JSON
//! ```
//!
//! ## Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`ContentExtractor`] | Extract per-page text from the reference document |
//! | [`Chunker`] | Split extracted content into chunks |
//! | [`Embedder`] | Generate vector embeddings |
//! | [`VectorStore`] | Store and search vector embeddings |
//! | [`Retriever`] | Return the top-K passages for a query |
//! | [`CompletionModel`] | Send a prompt to a language model |
//!
//! ## Related Crates
//!
//! - `arklife-extract`: PDF and text extraction
//! - `arklife-chunker`: Recursive character splitting
//! - `arklife-embed`: OpenAI-compatible embeddings
//! - `arklife-store`: Flat-file and in-memory vector stores
//! - `arklife-llm`: Chat completion client
//! - `arklife-query`: Retrieval over a store
//! - `arklife-index`: Indexing pipeline
//! - `arklife-analysis`: Prompting, extraction, normalization and call graphs

pub mod error;
pub mod traits;
pub mod types;

pub use error::{
    ChunkError, CompletionError, EmbedError, Error, ExtractError, IndexError, InputError, Result,
    StoreError,
};
pub use traits::*;
pub use types::*;
