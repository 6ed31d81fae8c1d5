//! Retrieval-augmented lifecycle analysis.

use std::sync::Arc;
use std::time::Instant;

use arklife_core::{CompletionModel, Error, Result, Retriever};
use tracing::{debug, info, warn};

use crate::context::format_context;
use crate::extract::parse_report;
use crate::normalize::{normalize, Normalized};
use crate::prompt::PromptTemplate;

/// Result of one analysis run.
#[derive(Debug, Clone)]
pub enum AnalysisOutcome {
    /// The answer parsed and was normalized.
    Parsed {
        normalized: Normalized,
        /// Completion text as received
        raw: String,
    },
    /// The answer could not be parsed; only the raw text is available.
    Unparsed { raw: String, reason: String },
}

impl AnalysisOutcome {
    /// Completion text as received.
    #[must_use]
    pub fn raw(&self) -> &str {
        match self {
            Self::Parsed { raw, .. } | Self::Unparsed { raw, .. } => raw,
        }
    }

    #[must_use]
    pub fn is_parsed(&self) -> bool {
        matches!(self, Self::Parsed { .. })
    }
}

/// Retrieves passages for a scenario, prompts the model and reads its answer.
pub struct LifecycleAnalyzer {
    retriever: Arc<dyn Retriever>,
    model: Arc<dyn CompletionModel>,
    template: PromptTemplate,
    /// Passages retrieved per run
    k: usize,
}

impl LifecycleAnalyzer {
    /// Create a new analyzer.
    pub fn new(
        retriever: Arc<dyn Retriever>,
        model: Arc<dyn CompletionModel>,
        template: PromptTemplate,
        k: usize,
    ) -> Self {
        Self {
            retriever,
            model,
            template,
            k,
        }
    }

    /// Run one analysis.
    ///
    /// Retrieval and completion failures are returned as errors. An answer
    /// that does not parse is not an error: it comes back as
    /// [`AnalysisOutcome::Unparsed`].
    pub async fn analyze(&self, scenario: &str) -> Result<AnalysisOutcome> {
        let start_time = Instant::now();

        let passages = self.retriever.retrieve(scenario, self.k).await?;
        info!("Retrieved {} reference passages", passages.len());

        let context = format_context(&passages);
        let prompt = self.template.render(&context, scenario);
        debug!("Rendered prompt ({} chars)", prompt.chars().count());

        let raw = self
            .model
            .complete(&prompt)
            .await
            .map_err(Error::Completion)?;

        let outcome = match parse_report(&raw) {
            Ok(report) => {
                let normalized = normalize(report);
                info!(
                    "Parsed {} lifecycle functions and {} order edges",
                    normalized.document.lifecycle.functions.len(),
                    normalized.document.lifecycle.order.len()
                );
                AnalysisOutcome::Parsed { normalized, raw }
            }
            Err(e) => {
                warn!("Could not parse model answer as lifecycle JSON: {}", e);
                AnalysisOutcome::Unparsed {
                    raw,
                    reason: e.to_string(),
                }
            }
        };

        info!("Analysis finished in {:?}", start_time.elapsed());
        Ok(outcome)
    }
}
