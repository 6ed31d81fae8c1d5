//! Indexing pipeline for arklife.
//!
//! [`IndexerService`] turns the reference document into embedded chunks:
//! extract pages, split them, embed the pieces in batches and replace the
//! contents of the vector store.

pub mod indexer;

pub use indexer::{IndexOutcome, IndexerConfig, IndexerService};
