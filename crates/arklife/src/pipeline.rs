//! Index, analyze, visualize, convert and status operations.

use anyhow::{Context, Result};
use arklife_analysis::{
    convert_directory, parse_report, persist_outcome, read_input, AnalysisOutcome, CallGraph,
    ConversionSummary, GraphStats, LifecycleAnalyzer, PersistedOutput, PromptTemplate,
};
use arklife_core::{ChunkConfig, CompletionModel, Embedder, EmbeddingConfig, VectorStore};
use arklife_embed::OpenAiEmbedder;
use arklife_index::{IndexOutcome, IndexerConfig, IndexerService};
use arklife_llm::{ChatClient, ChatSettings};
use arklife_query::VectorRetriever;
use arklife_store::FlatStore;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::{Config, Credentials};

// ============================================================================
// Components
// ============================================================================

/// Embedding client for the configured service.
pub fn openai_embedder(config: &Config, creds: &Credentials) -> Result<Arc<dyn Embedder>> {
    let api_key = creds
        .embedding_api_key
        .clone()
        .context("OPENAI_API_KEY is not set (needed for embeddings)")?;

    let embedder = OpenAiEmbedder::new(
        api_key,
        config.embedding.model.clone(),
        Some(creds.embedding_base(config).to_string()),
    )
    .context("Failed to create embedding client")?;

    Ok(Arc::new(embedder))
}

/// Chat client for the configured completion service.
pub fn chat_client(config: &Config, creds: &Credentials) -> Result<Arc<dyn CompletionModel>> {
    let api_key = creds
        .llm_api_key
        .clone()
        .context("DEEPSEEK_API_KEY or OPENAI_API_KEY must be set for completions")?;

    let client = ChatClient::new(ChatSettings {
        model: config.llm.model.clone(),
        temperature: config.llm.temperature,
        api_base: creds.llm_base(config).to_string(),
        api_key,
        timeout: Duration::from_secs(config.llm.timeout_secs),
    })
    .context("Failed to create completion client")?;

    Ok(Arc::new(client))
}

/// Configured prompt template, or the built-in one.
pub async fn load_template(config: &Config) -> Result<PromptTemplate> {
    match &config.analysis.prompt_file {
        Some(path) => Ok(PromptTemplate::from_file(path).await?),
        None => Ok(PromptTemplate::builtin()),
    }
}

fn indexer_config(config: &Config) -> IndexerConfig {
    IndexerConfig {
        chunk_config: ChunkConfig {
            chunk_size: config.chunking.chunk_size,
            chunk_overlap: config.chunking.chunk_overlap,
            ..ChunkConfig::default()
        },
        embed_config: EmbeddingConfig {
            batch_size: config.embedding.batch_size,
        },
    }
}

// ============================================================================
// Index
// ============================================================================

/// Build the vector index from `document` using the configured embedding service.
pub async fn run_index(
    config: &Config,
    creds: &Credentials,
    document: &Path,
    force: bool,
) -> Result<IndexOutcome> {
    let embedder = openai_embedder(config, creds)?;
    index_with(config, embedder, document, force).await
}

/// Build the vector index with a given embedder.
pub async fn index_with(
    config: &Config,
    embedder: Arc<dyn Embedder>,
    document: &Path,
    force: bool,
) -> Result<IndexOutcome> {
    let store_dir = &config.paths.vector_store;
    let store = FlatStore::open_read_write(store_dir)
        .with_context(|| format!("Failed to open vector store {}", store_dir.display()))?;

    let indexer = IndexerService::new(Arc::new(store), embedder, indexer_config(config));
    let outcome = indexer
        .build(document, force)
        .await
        .with_context(|| format!("Failed to index {}", document.display()))?;

    match &outcome {
        IndexOutcome::Skipped { existing_chunks } => info!(
            "Vector store already holds {} chunks; use --force to rebuild",
            existing_chunks
        ),
        IndexOutcome::Built { pages, chunks } => {
            info!("Indexed {} pages into {} chunks", pages, chunks);
        }
    }
    Ok(outcome)
}

// ============================================================================
// Analyze
// ============================================================================

/// What to analyze and where to write it.
#[derive(Debug, Clone)]
pub struct AnalyzeRequest {
    /// Scenario file
    pub input: PathBuf,
    /// Output file name; the extension becomes `.json`
    pub output_name: Option<String>,
    /// Also write a DOT call graph
    pub dot: bool,
}

/// Result of an analysis run.
#[derive(Debug)]
pub struct AnalysisReport {
    pub outcome: AnalysisOutcome,
    pub output: PersistedOutput,
    /// DOT file, when requested and the answer parsed into a valid graph
    pub dot_file: Option<PathBuf>,
}

/// Full analysis against the configured services.
///
/// The input and the vector index are checked before any network client
/// is created.
pub async fn run_analyze(
    config: &Config,
    creds: &Credentials,
    request: &AnalyzeRequest,
) -> Result<AnalysisReport> {
    let scenario = read_input(&request.input)
        .await
        .context("Failed to read analysis input")?;

    let store = FlatStore::open_read_only(&config.paths.vector_store)
        .context("Vector store is not ready")?;

    let embedder = openai_embedder(config, creds)?;
    let model = chat_client(config, creds)?;

    analyze_scenario(config, &scenario, Arc::new(store), embedder, model, request).await
}

/// Analyze `scenario` with the given collaborators and persist the result.
pub async fn analyze_scenario(
    config: &Config,
    scenario: &str,
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    model: Arc<dyn CompletionModel>,
    request: &AnalyzeRequest,
) -> Result<AnalysisReport> {
    let retriever = Arc::new(VectorRetriever::new(store, embedder));
    let template = load_template(config).await?;
    let analyzer = LifecycleAnalyzer::new(retriever, model, template, config.retrieval.k);

    let outcome = analyzer.analyze(scenario).await.context("Analysis failed")?;

    let output = persist_outcome(
        &outcome,
        &config.paths.output_dir,
        request.output_name.as_deref(),
    )
    .await
    .context("Failed to save analysis result")?;

    let dot_file = match (&outcome, request.dot) {
        (AnalysisOutcome::Parsed { normalized, .. }, true) => {
            match CallGraph::from_document(&normalized.document) {
                Ok(graph) => {
                    let path = dot_path(&config.paths.visualization_dir, &output.path);
                    write_dot(&graph, &path).await?;
                    Some(path)
                }
                Err(e) => {
                    warn!("Skipping call graph: {}", e);
                    None
                }
            }
        }
        (AnalysisOutcome::Unparsed { .. }, true) => {
            warn!("Skipping call graph: the answer was saved as raw text");
            None
        }
        _ => None,
    };

    Ok(AnalysisReport {
        outcome,
        output,
        dot_file,
    })
}

fn dot_path(dir: &Path, source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map_or_else(|| "lifecycle".into(), |s| s.to_string_lossy().into_owned());
    dir.join(format!("{stem}.dot"))
}

async fn write_dot(graph: &CallGraph, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    tokio::fs::write(path, graph.to_dot())
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote call graph to {}", path.display());
    Ok(())
}

// ============================================================================
// Visualize
// ============================================================================

/// One rendered call graph.
#[derive(Debug, Clone, Serialize)]
pub struct Visualization {
    pub source: PathBuf,
    pub dot_file: PathBuf,
    pub stats: GraphStats,
    /// Topological order, absent when the graph has a cycle
    pub order: Option<Vec<String>>,
}

/// Outcome of [`visualize`].
#[derive(Debug, Default, Serialize)]
pub struct VisualizeSummary {
    pub written: Vec<Visualization>,
    pub failed: Vec<(PathBuf, String)>,
}

/// Render DOT files for saved analysis results.
///
/// A file that cannot be read or graphed is reported and skipped.
pub async fn visualize(files: &[PathBuf], out_dir: &Path) -> Result<VisualizeSummary> {
    let mut summary = VisualizeSummary::default();

    for file in files {
        match visualize_file(file, out_dir).await {
            Ok(visualization) => summary.written.push(visualization),
            Err(e) => {
                warn!("Skipping {}: {:#}", file.display(), e);
                summary.failed.push((file.clone(), format!("{e:#}")));
            }
        }
    }

    Ok(summary)
}

async fn visualize_file(file: &Path, out_dir: &Path) -> Result<Visualization> {
    let text = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let document = arklife_analysis::normalize(parse_report(&text)?).document;
    let graph = CallGraph::from_document(&document)?;

    let dot_file = dot_path(out_dir, file);
    write_dot(&graph, &dot_file).await?;

    Ok(Visualization {
        source: file.to_path_buf(),
        dot_file,
        stats: graph.stats(),
        order: graph
            .topological_order()
            .ok()
            .map(|order| order.into_iter().map(str::to_string).collect()),
    })
}

// ============================================================================
// Convert
// ============================================================================

/// Convert saved raw answers into normalized JSON.
pub async fn convert(source: &Path, out_dir: &Path) -> Result<ConversionSummary> {
    convert_directory(source, out_dir)
        .await
        .with_context(|| format!("Failed to convert answers in {}", source.display()))
}

// ============================================================================
// Status
// ============================================================================

/// Index and environment readiness.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub vector_store: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_chunks: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    /// Why the index cannot be used for analysis
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_error: Option<String>,
    pub input_file: String,
    pub input_present: bool,
    pub llm_key_present: bool,
    pub embedding_key_present: bool,
    pub llm_api_base: String,
    pub embedding_api_base: String,
}

/// Inspect the index and credentials without contacting any service.
pub async fn status(config: &Config, creds: &Credentials) -> Result<StatusReport> {
    let mut report = StatusReport {
        vector_store: config.paths.vector_store.display().to_string(),
        total_chunks: None,
        dimension: None,
        embedding_model: None,
        index_size_bytes: None,
        last_updated: None,
        index_error: None,
        input_file: config.paths.input_file.display().to_string(),
        input_present: config.paths.input_file.is_file(),
        llm_key_present: creds.llm_api_key.is_some(),
        embedding_key_present: creds.embedding_api_key.is_some(),
        llm_api_base: creds.llm_base(config).to_string(),
        embedding_api_base: creds.embedding_base(config).to_string(),
    };

    match FlatStore::open_read_only(&config.paths.vector_store) {
        Ok(store) => {
            let stats = store.stats().await.context("Failed to read index stats")?;
            report.total_chunks = Some(stats.total_chunks);
            report.dimension = Some(stats.dimension);
            report.embedding_model = stats.embedding_model;
            report.index_size_bytes = Some(stats.index_size_bytes);
            report.last_updated = stats.last_updated.map(|t| t.to_rfc3339());
        }
        Err(e) => report.index_error = Some(e.to_string()),
    }

    Ok(report)
}
