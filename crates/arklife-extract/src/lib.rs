//! # arklife-extract
//!
//! Reads the reference document into [`ExtractedContent`](arklife_core::ExtractedContent)
//! for chunking.
//!
//! | Extractor | Formats | Output |
//! |-----------|---------|--------|
//! | [`PdfExtractor`] | `.pdf` | One [`PageContent`](arklife_core::PageContent) per page, 1-indexed |
//! | [`TextExtractor`] | `.txt`, `.md`, `.markdown` | A single unnumbered page |
//!
//! ```rust,ignore
//! use arklife_extract::{ExtractorRegistry, PdfExtractor, TextExtractor};
//!
//! let registry = ExtractorRegistry::with_defaults();
//! let content = registry.extract(path, "application/pdf").await?;
//! println!("{} pages", content.pages.len());
//! ```

pub mod pdf;
pub mod registry;
pub mod text;

pub use pdf::PdfExtractor;
pub use registry::ExtractorRegistry;
pub use text::TextExtractor;
