//! # arklife-embed
//!
//! Embedding generation for arklife.
//!
//! ## Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`OpenAiEmbedder`] | Remote embeddings over an OpenAI-compatible `/embeddings` endpoint |
//! | [`NoopEmbedder`] | Zero vectors, for tests |
//!
//! ## Usage
//!
//! ```rust,ignore
//! use arklife_embed::OpenAiEmbedder;
//! use arklife_core::{Embedder, EmbeddingConfig};
//!
//! let embedder = OpenAiEmbedder::new(api_key, "text-embedding-3-small", None)?;
//! let outputs = embedder
//!     .embed_text(&["aboutToAppear", "onPageShow"], &EmbeddingConfig::default())
//!     .await?;
//! ```

pub mod noop;
pub mod openai;

pub use noop::NoopEmbedder;
pub use openai::OpenAiEmbedder;
