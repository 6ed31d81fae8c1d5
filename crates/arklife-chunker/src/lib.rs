//! Document chunking strategies for arklife.

pub mod recursive;
pub mod registry;

pub use recursive::RecursiveChunker;
pub use registry::ChunkerRegistry;
