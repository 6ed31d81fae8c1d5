//! # arklife-analysis
//!
//! Everything between retrieval and the output file:
//!
//! ```text
//! input → context → prompt → completion → extract → parse → normalize → persist
//! ```
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`input`] | Read and validate the scenario file |
//! | [`context`] | Render retrieved passages with source and page |
//! | [`prompt`] | `{context}`/`{question}` template substitution |
//! | [`extract`] | Pull the JSON payload out of a fenced block |
//! | [`model`] | Raw and normalized lifecycle documents |
//! | [`normalize`] | Collapse functions to base names, coerce scopes |
//! | [`analyzer`] | The retrieval-augmented analysis run |
//! | [`persist`] | Write the JSON result or the raw fallback |
//! | [`graph`] | Call graph over `order`, with DOT export |
//! | [`convert`] | Batch conversion of saved raw answers |

pub mod analyzer;
pub mod context;
pub mod convert;
pub mod error;
pub mod extract;
pub mod graph;
pub mod input;
pub mod model;
pub mod normalize;
pub mod persist;
pub mod prompt;

pub use analyzer::{AnalysisOutcome, LifecycleAnalyzer};
pub use context::format_context;
pub use convert::{convert_directory, ConversionSummary};
pub use error::{FormatError, GraphError};
pub use extract::{extract_json_block, parse_report};
pub use graph::{CallGraph, GraphStats};
pub use input::read_input;
pub use model::{
    CallOrderEdge, DeclaredScope, Lifecycle, LifecycleDocument, LifecycleFunction,
    LifecycleReport, RawFunction, RawLifecycle, Scope,
};
pub use normalize::{base_name, normalize, Coercion, Normalized};
pub use persist::{output_file_name, persist_outcome, OutputKind, PersistedOutput};
pub use prompt::PromptTemplate;
