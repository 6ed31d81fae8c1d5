//! Integration tests for the full arklife pipeline.
//!
//! Tests the complete flow: index → retrieve → prompt → complete → persist.

use arklife::config::{Config, Credentials};
use arklife::pipeline::{self, AnalyzeRequest};
use arklife_analysis::{AnalysisOutcome, LifecycleDocument, OutputKind, Scope};
use arklife_core::{
    CompletionModel, EmbedError, Embedder, EmbeddingConfig, EmbeddingOutput, VectorStore,
};
use arklife_index::IndexOutcome;
use arklife_llm::{ChatClient, ChatSettings};
use arklife_store::FlatStore;
use async_trait::async_trait;
use mockito::{Matcher, Server};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::{tempdir, TempDir};

const TEST_DIM: usize = 32;

const GUIDE: &str = "\
Custom component lifecycle

aboutToAppear is called after a new instance of the custom component is created \
and before its build function runs.

build renders the UI. It runs again whenever state variables used by the \
component change.

onPageShow and onPageHide are page callbacks that only take effect in the \
component decorated with @Entry.

aboutToDisappear is called before the custom component is destroyed. The parent \
runs aboutToDisappear before its children.";

const SCENARIO: &str = "@Entry\n@Component\nstruct Index {\n  @State show: boolean = true\n  build() { Column() { if (this.show) { Child() } } }\n}";

/// Deterministic embedder derived from a content hash.
struct MockEmbedder {
    dimension: usize,
}

impl MockEmbedder {
    fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    fn model_name(&self) -> &'static str {
        "mock-embedder"
    }

    async fn embed_text(
        &self,
        texts: &[&str],
        _config: &EmbeddingConfig,
    ) -> Result<Vec<EmbeddingOutput>, EmbedError> {
        Ok(texts
            .iter()
            .map(|text| {
                let hash = blake3::hash(text.as_bytes());
                let bytes = hash.as_bytes();
                let embedding: Vec<f32> = (0..self.dimension)
                    .map(|i| (f32::from(bytes[i % 32]) / 255.0) - 0.5)
                    .collect();
                EmbeddingOutput {
                    embedding,
                    token_count: text.split_whitespace().count(),
                }
            })
            .collect())
    }
}

fn test_config(root: &Path) -> Config {
    let mut config = Config::default();
    config.paths.vector_store = root.join("vector_store");
    config.paths.input_file = root.join("inputs/input.txt");
    config.paths.output_dir = root.join("outputs/json");
    config.paths.visualization_dir = root.join("outputs/visualizations");
    config.paths.document = root.join("docs/guide.txt");
    config.chunking.chunk_size = 200;
    config.chunking.chunk_overlap = 20;
    config
}

fn write_file(path: &Path, contents: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

async fn indexed_workspace() -> (TempDir, Config) {
    let root = tempdir().unwrap();
    let config = test_config(root.path());
    write_file(&config.paths.document, GUIDE);
    write_file(&config.paths.input_file, SCENARIO);

    let outcome = pipeline::index_with(
        &config,
        Arc::new(MockEmbedder::new(TEST_DIM)),
        &config.paths.document,
        false,
    )
    .await
    .unwrap();
    assert!(matches!(outcome, IndexOutcome::Built { pages: 1, chunks } if chunks > 1));

    (root, config)
}

fn chat_model(server_url: String) -> Arc<dyn CompletionModel> {
    Arc::new(
        ChatClient::new(ChatSettings {
            model: "deepseek-chat".to_string(),
            temperature: 0.0,
            api_base: server_url,
            api_key: "test-key".to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap(),
    )
}

fn completion_body(content: &str) -> String {
    serde_json::json!({
        "choices": [{"message": {"role": "assistant", "content": content}}]
    })
    .to_string()
}

const ANSWER: &str = r#"```json
{
  "lifecycle": {
    "functions": [
      {"name": "Index.aboutToAppear", "scope": "component", "description": "runs before build"},
      {"name": "Child.aboutToAppear", "scope": "component", "description": "child instance created"},
      {"name": "Index.build", "scope": "both", "description": "renders the page"},
      {"name": "Index.onPageShow", "scope": "page", "description": "page becomes visible"}
    ],
    "order": [
      {"pred": "Index.aboutToAppear", "succ": "Index.build"},
      {"pred": "Index.build", "succ": "Child.aboutToAppear"},
      {"pred": "Index.build", "succ": "Index.onPageShow"}
    ],
    "dynamicBehavior": "Toggling show creates or destroys Child"
  }
}
```"#;

#[tokio::test]
async fn test_index_then_analyze() {
    let (_root, config) = indexed_workspace().await;

    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::Regex("Passage 1 - source: .*guide.txt".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion_body(ANSWER))
        .create_async()
        .await;

    let store = FlatStore::open_read_only(&config.paths.vector_store).unwrap();
    let request = AnalyzeRequest {
        input: config.paths.input_file.clone(),
        output_name: Some("index_page.txt".to_string()),
        dot: true,
    };

    let report = pipeline::analyze_scenario(
        &config,
        SCENARIO,
        Arc::new(store),
        Arc::new(MockEmbedder::new(TEST_DIM)),
        chat_model(server.url()),
        &request,
    )
    .await
    .unwrap();

    mock.assert_async().await;
    assert_eq!(report.output.kind, OutputKind::Json);
    assert_eq!(report.output.path, config.paths.output_dir.join("index_page.json"));

    let written = std::fs::read_to_string(&report.output.path).unwrap();
    let document: LifecycleDocument = serde_json::from_str(&written).unwrap();
    let functions: Vec<(&str, Scope)> = document
        .lifecycle
        .functions
        .iter()
        .map(|f| (f.name.as_str(), f.scope))
        .collect();
    assert_eq!(
        functions,
        vec![
            ("aboutToAppear", Scope::Component),
            ("build", Scope::Component),
            ("onPageShow", Scope::Page),
        ]
    );
    assert_eq!(document.lifecycle.order.len(), 3);

    match &report.outcome {
        AnalysisOutcome::Parsed { normalized, .. } => assert_eq!(normalized.coercions.len(), 1),
        other => panic!("Expected parsed outcome, got {other:?}"),
    }

    let dot_file = report.dot_file.unwrap();
    assert_eq!(dot_file, config.paths.visualization_dir.join("index_page.dot"));
    let dot = std::fs::read_to_string(dot_file).unwrap();
    assert!(dot.starts_with("digraph LifecycleCallGraph {"));
    assert!(dot.contains(r#""Index.build" -> "Child.aboutToAppear";"#));
    assert!(dot.contains("Toggling show creates or destroys Child"));
}

#[tokio::test]
async fn test_reindex_is_skipped_without_force() {
    let (_root, config) = indexed_workspace().await;
    let embedder = Arc::new(MockEmbedder::new(TEST_DIM));

    let skipped = pipeline::index_with(&config, embedder.clone(), &config.paths.document, false)
        .await
        .unwrap();
    assert!(matches!(skipped, IndexOutcome::Skipped { existing_chunks } if existing_chunks > 1));

    let rebuilt = pipeline::index_with(&config, embedder, &config.paths.document, true)
        .await
        .unwrap();
    assert!(matches!(rebuilt, IndexOutcome::Built { .. }));
}

#[tokio::test]
async fn test_malformed_completion_is_saved_verbatim() {
    let (_root, config) = indexed_workspace().await;
    let prose = "The lifecycle begins with aboutToAppear, then build runs.\n";

    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion_body(prose))
        .create_async()
        .await;

    let store = FlatStore::open_read_only(&config.paths.vector_store).unwrap();
    let request = AnalyzeRequest {
        input: config.paths.input_file.clone(),
        output_name: None,
        dot: true,
    };

    let report = pipeline::analyze_scenario(
        &config,
        SCENARIO,
        Arc::new(store),
        Arc::new(MockEmbedder::new(TEST_DIM)),
        chat_model(server.url()),
        &request,
    )
    .await
    .unwrap();

    assert_eq!(report.output.kind, OutputKind::RawText);
    assert!(report.dot_file.is_none());
    let name = report.output.path.file_name().unwrap().to_string_lossy();
    assert!(name.starts_with("lifecycle_analysis_"));
    assert!(name.ends_with(".json"));
    assert_eq!(std::fs::read_to_string(&report.output.path).unwrap(), prose);
}

#[tokio::test]
async fn test_truncated_completion_is_saved_verbatim() {
    let (_root, config) = indexed_workspace().await;
    let truncated = &ANSWER[..ANSWER.find("\"order\"").unwrap()];

    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion_body(truncated))
        .create_async()
        .await;

    let store = FlatStore::open_read_only(&config.paths.vector_store).unwrap();
    let request = AnalyzeRequest {
        input: config.paths.input_file.clone(),
        output_name: Some("runs/truncated.txt".to_string()),
        dot: true,
    };

    let report = pipeline::analyze_scenario(
        &config,
        SCENARIO,
        Arc::new(store),
        Arc::new(MockEmbedder::new(TEST_DIM)),
        chat_model(server.url()),
        &request,
    )
    .await
    .unwrap();

    mock.assert_async().await;
    assert!(!report.outcome.is_parsed());
    assert_eq!(report.output.kind, OutputKind::RawText);
    assert_eq!(
        report.output.path,
        config.paths.output_dir.join("runs/truncated.json")
    );
    assert!(report.dot_file.is_none());
    assert_eq!(std::fs::read_to_string(&report.output.path).unwrap(), truncated);
}

/// Mocks that must never be called, plus credentials pointing at them.
async fn unreachable_services(server: &mut Server) -> (Credentials, Vec<mockito::Mock>) {
    let chat = server
        .mock("POST", "/chat/completions")
        .expect(0)
        .create_async()
        .await;
    let embeddings = server
        .mock("POST", "/embeddings")
        .expect(0)
        .create_async()
        .await;

    let creds = Credentials {
        llm_api_key: Some("test-key".to_string()),
        llm_api_base: Some(server.url()),
        embedding_api_key: Some("test-key".to_string()),
        embedding_api_base: Some(server.url()),
    };
    (creds, vec![chat, embeddings])
}

#[tokio::test]
async fn test_missing_index_fails_before_network() {
    let root = tempdir().unwrap();
    let config = test_config(root.path());
    write_file(&config.paths.input_file, SCENARIO);

    let mut server = Server::new_async().await;
    let (creds, mocks) = unreachable_services(&mut server).await;

    let request = AnalyzeRequest {
        input: config.paths.input_file.clone(),
        output_name: None,
        dot: false,
    };
    let err = pipeline::run_analyze(&config, &creds, &request)
        .await
        .unwrap_err();

    assert!(format!("{err:#}").contains("vector store not found"));
    for mock in mocks {
        mock.assert_async().await;
    }
    assert!(!config.paths.output_dir.exists());
}

#[tokio::test]
async fn test_empty_index_fails_before_network() {
    let root = tempdir().unwrap();
    let config = test_config(root.path());
    write_file(&config.paths.input_file, SCENARIO);

    let store = FlatStore::open_read_write(&config.paths.vector_store).unwrap();
    store.clear().await.unwrap();

    let mut server = Server::new_async().await;
    let (creds, mocks) = unreachable_services(&mut server).await;

    let request = AnalyzeRequest {
        input: config.paths.input_file.clone(),
        output_name: None,
        dot: false,
    };
    let err = pipeline::run_analyze(&config, &creds, &request)
        .await
        .unwrap_err();

    assert!(format!("{err:#}").contains("holds no chunks"));
    for mock in mocks {
        mock.assert_async().await;
    }
}

#[tokio::test]
async fn test_empty_input_fails_before_network() {
    let (_root, config) = indexed_workspace().await;
    write_file(&config.paths.input_file, "  \n\n");

    let mut server = Server::new_async().await;
    let (creds, mocks) = unreachable_services(&mut server).await;

    let request = AnalyzeRequest {
        input: config.paths.input_file.clone(),
        output_name: None,
        dot: false,
    };
    let err = pipeline::run_analyze(&config, &creds, &request)
        .await
        .unwrap_err();

    assert!(format!("{err:#}").contains("input file is empty"));
    for mock in mocks {
        mock.assert_async().await;
    }
}

#[tokio::test]
async fn test_visualize_saved_result() {
    let root = tempdir().unwrap();
    let saved = root.path().join("result.json");
    write_file(&saved, ANSWER);
    let broken = root.path().join("broken.json");
    write_file(&broken, "{}");
    let out_dir = root.path().join("viz");

    let summary = pipeline::visualize(&[saved, broken.clone()], &out_dir)
        .await
        .unwrap();

    assert_eq!(summary.written.len(), 1);
    let item = &summary.written[0];
    assert_eq!(item.dot_file, out_dir.join("result.dot"));
    assert_eq!(item.stats.node_count, 4);
    assert_eq!(item.stats.root_nodes, vec!["Index.aboutToAppear"]);
    assert_eq!(
        item.order.as_deref().unwrap().first().map(String::as_str),
        Some("Index.aboutToAppear")
    );
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].0, broken);
}
