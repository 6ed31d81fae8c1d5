//! Retrieval for arklife.
//!
//! [`VectorRetriever`] embeds a query and searches a vector store, returning
//! the best passages with their source and page.

pub mod retriever;

pub use retriever::VectorRetriever;
