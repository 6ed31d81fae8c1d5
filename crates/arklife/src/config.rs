//! Configuration handling for arklife.
//!
//! Settings load once at startup into an immutable [`Config`] that is passed
//! by reference to every component. Secrets never live in the TOML file; they
//! are read from the environment into [`Credentials`].

use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File looked up in the working directory before the user config directory.
pub const LOCAL_CONFIG_FILE: &str = "arklife.toml";

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Input, output and index locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Completion model
    #[serde(default)]
    pub llm: LlmConfig,

    /// Embedding model
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Document splitting
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Passage retrieval
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Prompting
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Filesystem locations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PathsConfig {
    /// Flat vector index directory
    #[serde(default = "default_vector_store")]
    pub vector_store: PathBuf,

    /// Scenario analyzed when `analyze --input` is not given
    #[serde(default = "default_input_file")]
    pub input_file: PathBuf,

    /// Where analysis results are written
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Where DOT files are written
    #[serde(default = "default_visualization_dir")]
    pub visualization_dir: PathBuf,

    /// Saved raw answers picked up by `convert`
    #[serde(default = "default_legacy_dir")]
    pub legacy_dir: PathBuf,

    /// Reference document indexed by `index`
    #[serde(default = "default_document")]
    pub document: PathBuf,
}

fn default_vector_store() -> PathBuf {
    PathBuf::from("vector_store")
}

fn default_input_file() -> PathBuf {
    PathBuf::from("data/inputs/input.txt")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data/outputs/json")
}

fn default_visualization_dir() -> PathBuf {
    PathBuf::from("data/outputs/visualizations")
}

fn default_legacy_dir() -> PathBuf {
    PathBuf::from("data/outputs/legacy")
}

fn default_document() -> PathBuf {
    PathBuf::from("data/docs/arkui-component-lifecycle.pdf")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            vector_store: default_vector_store(),
            input_file: default_input_file(),
            output_dir: default_output_dir(),
            visualization_dir: default_visualization_dir(),
            legacy_dir: default_legacy_dir(),
            document: default_document(),
        }
    }
}

/// Completion model settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmConfig {
    /// Model identifier
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default)]
    pub temperature: f32,

    /// OpenAI-compatible base URL
    #[serde(default = "default_llm_api_base")]
    pub api_base: String,

    /// Request timeout (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_llm_model() -> String {
    "deepseek-chat".to_string()
}

fn default_llm_api_base() -> String {
    "https://api.deepseek.com/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_llm_model(),
            temperature: 0.0,
            api_base: default_llm_api_base(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Embedding-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingConfig {
    /// Model to use
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// OpenAI-compatible base URL
    #[serde(default = "default_embedding_api_base")]
    pub api_base: String,

    /// Texts per embedding request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_embedding_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_batch_size() -> usize {
    64
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            api_base: default_embedding_api_base(),
            batch_size: default_batch_size(),
        }
    }
}

/// Chunking-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkingConfig {
    /// Maximum chunk size (characters)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap between chunks (characters)
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

/// Retrieval configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalConfig {
    /// Passages retrieved per analysis
    #[serde(default = "default_k")]
    pub k: usize,
}

fn default_k() -> usize {
    4
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { k: default_k() }
    }
}

/// Prompt configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AnalysisConfig {
    /// Template replacing the built-in prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_file: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load from the first config file found, or defaults.
    ///
    /// Looks for `./arklife.toml`, then `<config_dir>/config.toml`.
    pub fn load() -> Result<Self> {
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.is_file() {
            return Self::from_file(&local);
        }
        match Self::config_path() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => {
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// Load from an explicit path, which must exist; `None` behaves like [`Config::load`].
    pub fn load_from(path: Option<PathBuf>) -> Result<Self> {
        match path {
            Some(path) => {
                if !path.is_file() {
                    bail!("Config file not found: {}", path.display());
                }
                Self::from_file(&path)
            }
            None => Self::load(),
        }
    }

    /// Load variables from a `.env` file (`None` searches the working
    /// directory and its parents), then the configuration.
    ///
    /// `ARKLIFE_CONFIG_DIR` may itself come from the `.env` file. Variables
    /// already set in the environment win.
    pub fn load_with_env(env_file: Option<&Path>, path: Option<PathBuf>) -> Result<Self> {
        let loaded = match env_file {
            Some(file) => dotenv::from_path(file).map(|()| file.to_path_buf()),
            None => dotenv::dotenv(),
        };
        if let Ok(file) = loaded {
            tracing::debug!("Loaded environment from {}", file.display());
        }
        Self::load_from(path)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_toml(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that would make a run fail later.
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            bail!("chunking.chunk_size must be greater than 0");
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            bail!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunking.chunk_overlap,
                self.chunking.chunk_size
            );
        }
        if self.retrieval.k == 0 {
            bail!("retrieval.k must be greater than 0");
        }
        if self.embedding.batch_size == 0 {
            bail!("embedding.batch_size must be greater than 0");
        }
        Ok(())
    }

    /// User config file location.
    pub fn config_path() -> Option<PathBuf> {
        config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Commented sample configuration listing every default.
    pub fn sample_toml() -> &'static str {
        SAMPLE_TOML
    }
}

const SAMPLE_TOML: &str = r#"# arklife configuration
#
# Place in ./arklife.toml or at the path printed by `arklife config path`.
# API keys are read from the environment (or a .env file):
#   DEEPSEEK_API_KEY / OPENAI_API_KEY, DEEPSEEK_BASE_URL / OPENAI_BASE_URL

[paths]
vector_store = "vector_store"
input_file = "data/inputs/input.txt"
output_dir = "data/outputs/json"
visualization_dir = "data/outputs/visualizations"
legacy_dir = "data/outputs/legacy"
document = "data/docs/arkui-component-lifecycle.pdf"

[llm]
model = "deepseek-chat"
temperature = 0.0
api_base = "https://api.deepseek.com/v1"
timeout_secs = 120

[embedding]
model = "text-embedding-3-small"
api_base = "https://api.openai.com/v1"
batch_size = 64

[chunking]
chunk_size = 1000
chunk_overlap = 200

[retrieval]
k = 4

[analysis]
# prompt_file = "prompts/lifecycle.txt"

[logging]
level = "info"
"#;

/// Get the config directory for arklife.
pub fn config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("ARKLIFE_CONFIG_DIR") {
        return Some(PathBuf::from(dir));
    }

    ProjectDirs::from("", "", "arklife").map(|dirs| dirs.config_dir().to_path_buf())
}

/// API keys and endpoint overrides from the environment.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Completion service key
    pub llm_api_key: Option<String>,
    /// Overrides `llm.api_base`
    pub llm_api_base: Option<String>,
    /// Embedding service key
    pub embedding_api_key: Option<String>,
    /// Overrides `embedding.api_base`
    pub embedding_api_base: Option<String>,
}

impl Credentials {
    /// Read from the process environment. Call after loading `.env`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read through a lookup function.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            llm_api_key: get("DEEPSEEK_API_KEY").or_else(|| get("OPENAI_API_KEY")),
            llm_api_base: get("DEEPSEEK_BASE_URL").or_else(|| get("OPENAI_BASE_URL")),
            embedding_api_key: get("OPENAI_API_KEY"),
            embedding_api_base: get("OPENAI_BASE_URL"),
        }
    }

    /// Completion base URL: environment override, then config.
    pub fn llm_base<'a>(&'a self, config: &'a Config) -> &'a str {
        self.llm_api_base.as_deref().unwrap_or(&config.llm.api_base)
    }

    /// Embedding base URL: environment override, then config.
    pub fn embedding_base<'a>(&'a self, config: &'a Config) -> &'a str {
        self.embedding_api_base
            .as_deref()
            .unwrap_or(&config.embedding.api_base)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<set>");
        f.debug_struct("Credentials")
            .field("llm_api_key", &redact(&self.llm_api_key))
            .field("llm_api_base", &self.llm_api_base)
            .field("embedding_api_key", &redact(&self.embedding_api_key))
            .field("embedding_api_base", &self.embedding_api_base)
            .finish()
    }
}
