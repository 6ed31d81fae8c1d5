//! # arklife CLI
//!
//! Retrieval-grounded analysis of the ArkUI custom-component lifecycle.
//!
//! ## Commands
//!
//! - `arklife index` - Vectorize the reference document
//! - `arklife analyze` - Analyze a code sample (default command)
//! - `arklife visualize <FILE>...` - Export call graphs as DOT
//! - `arklife convert` - Turn saved raw answers into normalized JSON
//! - `arklife status` - Show index statistics and credential presence
//! - `arklife config show|init|path` - Manage configuration
//!
//! ## Examples
//!
//! ```bash
//! # Build the index once
//! arklife index --document data/docs/arkui-component-lifecycle.pdf
//!
//! # Analyze the default input and render the call graph
//! arklife analyze --dot
//!
//! # JSON status output
//! arklife status --format json
//! ```

use anyhow::{Context, Result};
use arklife::config::{Config, Credentials};
use arklife::pipeline::{self, AnalyzeRequest};
use arklife_analysis::AnalysisOutcome;
use arklife_index::IndexOutcome;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "arklife")]
#[command(about = "Analyze the ArkUI component lifecycle with retrieval-augmented prompting")]
#[command(version)]
struct Cli {
    /// Path to config file (default: ./arklife.toml, then the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Vectorize the reference document
    Index {
        /// Document to index (default: paths.document)
        #[arg(short, long)]
        document: Option<PathBuf>,

        /// Rebuild even if the vector store already holds chunks
        #[arg(short, long)]
        force: bool,
    },

    /// Analyze a code sample
    Analyze(AnalyzeArgs),

    /// Export call graphs of saved results as DOT
    Visualize {
        /// Analysis result files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output directory (default: paths.visualization_dir)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },

    /// Convert saved raw answers (*.txt) into normalized JSON
    Convert {
        /// Directory of raw answers (default: paths.legacy_dir)
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Output directory (default: paths.output_dir)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },

    /// Show index status
    Status,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Args, Default)]
struct AnalyzeArgs {
    /// Code sample to analyze (default: paths.input_file)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file name; the extension is replaced with .json
    #[arg(short, long)]
    output: Option<String>,

    /// Also write the call graph as DOT
    #[arg(long)]
    dot: bool,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Print sample configuration file
    Init,
    /// Show config file path
    Path,
}

/// Output structure for analyze.
#[derive(Serialize)]
struct AnalyzeOutput {
    output: String,
    parsed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    functions: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    order_edges: Option<usize>,
    coercions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dot_file: Option<String>,
}

/// Output structure for index.
#[derive(Serialize)]
struct IndexOutput {
    vector_store: String,
    skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pages: Option<usize>,
    chunks: u64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config =
        Config::load_with_env(None, cli.config.clone()).context("Failed to load config")?;

    // Setup logging
    let level = if cli.verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let creds = Credentials::from_env();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(run(cli, &config, &creds))
}

async fn run(cli: Cli, config: &Config, creds: &Credentials) -> Result<()> {
    let format = cli.format;

    match cli.command.unwrap_or(Commands::Analyze(AnalyzeArgs::default())) {
        Commands::Index { document, force } => {
            let document = document.unwrap_or_else(|| config.paths.document.clone());
            info!("Indexing {:?} (force={})", document, force);

            let outcome = pipeline::run_index(config, creds, &document, force).await?;

            let output = match outcome {
                IndexOutcome::Skipped { existing_chunks } => IndexOutput {
                    vector_store: config.paths.vector_store.display().to_string(),
                    skipped: true,
                    pages: None,
                    chunks: existing_chunks,
                },
                IndexOutcome::Built { pages, chunks } => IndexOutput {
                    vector_store: config.paths.vector_store.display().to_string(),
                    skipped: false,
                    pages: Some(pages),
                    chunks: chunks as u64,
                },
            };

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
                OutputFormat::Text => {
                    if output.skipped {
                        println!(
                            "Vector store {} already holds {} chunks (use --force to rebuild)",
                            output.vector_store, output.chunks
                        );
                    } else {
                        println!(
                            "Indexed {} pages into {} chunks at {}",
                            output.pages.unwrap_or_default(),
                            output.chunks,
                            output.vector_store
                        );
                    }
                }
            }
        }

        Commands::Analyze(args) => {
            let request = AnalyzeRequest {
                input: args.input.unwrap_or_else(|| config.paths.input_file.clone()),
                output_name: args.output,
                dot: args.dot,
            };

            let report = pipeline::run_analyze(config, creds, &request).await?;

            let mut output = AnalyzeOutput {
                output: report.output.path.display().to_string(),
                parsed: report.outcome.is_parsed(),
                parse_error: None,
                functions: None,
                order_edges: None,
                coercions: Vec::new(),
                dot_file: report.dot_file.map(|p| p.display().to_string()),
            };
            match &report.outcome {
                AnalysisOutcome::Parsed { normalized, .. } => {
                    output.functions = Some(normalized.document.lifecycle.functions.len());
                    output.order_edges = Some(normalized.document.lifecycle.order.len());
                    output.coercions =
                        normalized.coercions.iter().map(ToString::to_string).collect();
                }
                AnalysisOutcome::Unparsed { reason, .. } => {
                    output.parse_error = Some(reason.clone());
                }
            }

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
                OutputFormat::Text => {
                    if output.parsed {
                        println!(
                            "Saved {} functions and {} order edges to {}",
                            output.functions.unwrap_or_default(),
                            output.order_edges.unwrap_or_default(),
                            output.output
                        );
                        for coercion in &output.coercions {
                            println!("  note: {coercion}");
                        }
                    } else {
                        println!(
                            "Answer was not valid lifecycle JSON; saved raw text to {}",
                            output.output
                        );
                        if let Some(reason) = &output.parse_error {
                            println!("  reason: {reason}");
                        }
                    }
                    if let Some(dot) = &output.dot_file {
                        println!("Call graph: {dot}");
                    }
                }
            }
        }

        Commands::Visualize { files, out_dir } => {
            let out_dir = out_dir.unwrap_or_else(|| config.paths.visualization_dir.clone());
            let summary = pipeline::visualize(&files, &out_dir).await?;

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
                OutputFormat::Text => {
                    for item in &summary.written {
                        println!("{} -> {}", item.source.display(), item.dot_file.display());
                        println!(
                            "  Nodes: {}  Edges: {}  Cycles: {}",
                            item.stats.node_count,
                            item.stats.edge_count,
                            if item.stats.has_cycles { "yes" } else { "no" }
                        );
                        println!("  Roots: {}", item.stats.root_nodes.join(", "));
                        println!("  Leaves: {}", item.stats.leaf_nodes.join(", "));
                        if let Some(order) = &item.order {
                            println!("  Order: {}", order.join(" -> "));
                        }
                    }
                    for (path, reason) in &summary.failed {
                        println!("Skipped {}: {}", path.display(), reason);
                    }
                }
            }

            if summary.written.is_empty() {
                anyhow::bail!("No call graphs were written");
            }
        }

        Commands::Convert { source, out_dir } => {
            let source = source.unwrap_or_else(|| config.paths.legacy_dir.clone());
            let out_dir = out_dir.unwrap_or_else(|| config.paths.output_dir.clone());
            let summary = pipeline::convert(&source, &out_dir).await?;

            match format {
                OutputFormat::Json => {
                    let output = serde_json::json!({
                        "converted": summary.converted,
                        "failed": summary
                            .failed
                            .iter()
                            .map(|(path, reason)| {
                                serde_json::json!({"file": path, "error": reason})
                            })
                            .collect::<Vec<_>>(),
                    });
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
                OutputFormat::Text => {
                    for path in &summary.converted {
                        println!("Converted {}", path.display());
                    }
                    for (path, reason) in &summary.failed {
                        println!("Skipped {}: {}", path.display(), reason);
                    }
                    println!(
                        "{} converted, {} skipped",
                        summary.converted.len(),
                        summary.failed.len()
                    );
                }
            }
        }

        Commands::Status => {
            let report = pipeline::status(config, creds).await?;

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                OutputFormat::Text => {
                    println!("Vector store: {}", report.vector_store);
                    match &report.index_error {
                        Some(reason) => println!("  Not ready: {reason}"),
                        None => {
                            println!("  Chunks:    {}", report.total_chunks.unwrap_or_default());
                            println!("  Dimension: {}", report.dimension.unwrap_or_default());
                            if let Some(model) = &report.embedding_model {
                                println!("  Model:     {model}");
                            }
                            println!(
                                "  Size:      {} bytes",
                                report.index_size_bytes.unwrap_or_default()
                            );
                            if let Some(updated) = &report.last_updated {
                                println!("  Updated:   {updated}");
                            }
                        }
                    }
                    println!(
                        "Input: {} ({})",
                        report.input_file,
                        if report.input_present { "present" } else { "missing" }
                    );
                    println!(
                        "Completion key: {} ({})",
                        if report.llm_key_present { "set" } else { "missing" },
                        report.llm_api_base
                    );
                    println!(
                        "Embedding key:  {} ({})",
                        if report.embedding_key_present { "set" } else { "missing" },
                        report.embedding_api_base
                    );
                }
            }
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => match format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(config)
                            .context("Failed to serialize config")?
                    );
                }
                OutputFormat::Text => {
                    println!(
                        "{}",
                        toml::to_string_pretty(config).context("Failed to serialize config")?
                    );
                }
            },
            ConfigAction::Init => {
                println!("{}", Config::sample_toml());
            }
            ConfigAction::Path => {
                if let Some(path) = Config::config_path() {
                    println!("{}", path.display());
                } else {
                    println!("Could not determine config directory");
                }
            }
        },
    }

    Ok(())
}
