//! Error types for arklife.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for arklife operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Input file could not be used
    #[error("input error: {0}")]
    Input(#[from] InputError),

    /// Vector index is not usable for analysis
    #[error("index error: {0}")]
    Index(#[from] IndexError),

    /// Content extraction failed
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractError),

    /// Chunking failed
    #[error("chunking error: {0}")]
    Chunking(#[from] ChunkError),

    /// Embedding generation failed
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbedError),

    /// Vector store operation failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Completion service failed
    #[error("completion error: {0}")]
    Completion(#[from] CompletionError),

    /// I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Errors reading the scenario input.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("input file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("input file is empty: {}", .0.display())]
    Empty(PathBuf),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Index-state errors, raised before any network call.
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("vector store not found at {} (run `arklife index` first)", .0.display())]
    Missing(PathBuf),

    #[error("vector store at {} holds no chunks (run `arklife index --force`)", .0.display())]
    Empty(PathBuf),
}

/// Content extraction errors.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("extraction failed: {0}")]
    Failed(String),
}

/// Chunking errors.
#[derive(Error, Debug)]
pub enum ChunkError {
    #[error("chunking failed: {0}")]
    Failed(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Embedding errors.
#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("missing API key for embedding service")]
    MissingApiKey,

    #[error("request failed: {0}")]
    Request(String),

    #[error("embedding service returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Vector store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store initialization failed: {0}")]
    Init(String),

    #[error("insert failed: {0}")]
    Insert(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("schema error: {0}")]
    Schema(String),

    #[error("lock error: {0}")]
    Lock(String),

    #[error("store was opened read-only")]
    ReadOnly,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Completion service errors.
#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("missing API key for completion service")]
    MissingApiKey,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("completion service returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("completion service returned no choices")]
    EmptyResponse,
}

/// Result type alias for arklife operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    // ========== InputError Tests ==========

    #[test]
    fn test_input_error_not_found_display() {
        let err = InputError::NotFound(PathBuf::from("data/inputs/input.txt"));
        assert_eq!(
            err.to_string(),
            "input file not found: data/inputs/input.txt"
        );
    }

    #[test]
    fn test_input_error_empty_display() {
        let err = InputError::Empty(PathBuf::from("in.txt"));
        assert_eq!(err.to_string(), "input file is empty: in.txt");
    }

    // ========== IndexError Tests ==========

    #[test]
    fn test_index_error_missing_mentions_index_command() {
        let err = IndexError::Missing(PathBuf::from("vector_store"));
        let msg = err.to_string();
        assert!(msg.contains("vector_store"));
        assert!(msg.contains("arklife index"));
    }

    #[test]
    fn test_index_error_empty_display() {
        let err = IndexError::Empty(PathBuf::from("vector_store"));
        assert!(err.to_string().contains("holds no chunks"));
    }

    // ========== Service Error Tests ==========

    #[test]
    fn test_embed_error_api_display() {
        let err = EmbedError::Api {
            status: 401,
            body: "invalid key".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "embedding service returned 401: invalid key"
        );
    }

    #[test]
    fn test_embed_error_dimension_mismatch_display() {
        let err = EmbedError::DimensionMismatch {
            expected: 1536,
            actual: 384,
        };
        assert_eq!(err.to_string(), "dimension mismatch: expected 1536, got 384");
    }

    #[test]
    fn test_completion_error_api_display() {
        let err = CompletionError::Api {
            status: 500,
            body: "upstream".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "completion service returned 500: upstream"
        );
    }

    #[test]
    fn test_store_error_read_only_display() {
        assert_eq!(StoreError::ReadOnly.to_string(), "store was opened read-only");
    }

    // ========== Main Error Tests ==========

    #[test]
    fn test_error_from_input_error() {
        let err: Error = InputError::Empty(PathBuf::from("x.txt")).into();
        assert!(matches!(err, Error::Input(InputError::Empty(_))));
        assert!(err.to_string().starts_with("input error"));
    }

    #[test]
    fn test_error_from_index_error() {
        let err: Error = IndexError::Missing(PathBuf::from("vs")).into();
        assert!(matches!(err, Error::Index(_)));
    }

    #[test]
    fn test_error_from_completion_error() {
        let err: Error = CompletionError::EmptyResponse.into();
        assert!(matches!(err, Error::Completion(_)));
        assert!(err.to_string().contains("no choices"));
    }

    #[test]
    fn test_error_chain_io_to_store_to_main() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "vectors.bin");
        let store_err: StoreError = io_err.into();
        let main_err: Error = store_err.into();

        assert!(matches!(main_err, Error::Store(StoreError::Io(_))));
        assert!(main_err.to_string().contains("store error"));
    }

    #[test]
    fn test_error_config_display() {
        let err = Error::Config("chunk_overlap must be smaller than chunk_size".to_string());
        assert_eq!(
            err.to_string(),
            "config error: chunk_overlap must be smaller than chunk_size"
        );
    }
}
