//! Writing analysis results.

use std::path::{Component, Path, PathBuf};

use arklife_core::{Error, Result};
use chrono::{DateTime, Local};
use tracing::{info, warn};

use crate::analyzer::AnalysisOutcome;

/// What was written to the output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// Normalized lifecycle document
    Json,
    /// Completion text that failed to parse, written verbatim
    RawText,
}

/// Location and kind of a written result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedOutput {
    pub path: PathBuf,
    pub kind: OutputKind,
}

/// Output file name: the requested name with a `.json` extension, or a
/// timestamped default.
///
/// Relative subdirectories are kept. A name that would leave the output
/// directory (absolute, or containing `..`) is reduced to its file name.
#[must_use]
pub fn output_file_name(requested: Option<&str>, now: DateTime<Local>) -> PathBuf {
    let default = || {
        PathBuf::from(format!(
            "lifecycle_analysis_{}.json",
            now.format("%Y%m%d_%H%M%S")
        ))
    };

    let Some(name) = requested.map(str::trim).filter(|n| !n.is_empty()) else {
        return default();
    };
    let path = Path::new(name);
    let Some(file) = path.file_name() else {
        return default();
    };
    let contained = path
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));

    let relative = if contained {
        path.to_path_buf()
    } else {
        PathBuf::from(file)
    };
    relative.with_extension("json")
}

/// Write an analysis outcome into `dir`, creating it when missing.
pub async fn persist_outcome(
    outcome: &AnalysisOutcome,
    dir: &Path,
    name: Option<&str>,
) -> Result<PersistedOutput> {
    let path = dir.join(output_file_name(name, Local::now()));
    let parent = path.parent().unwrap_or(dir);
    tokio::fs::create_dir_all(parent).await?;

    let (contents, kind) = match outcome {
        AnalysisOutcome::Parsed { normalized, .. } => {
            (normalized.document.to_pretty_json()?, OutputKind::Json)
        }
        AnalysisOutcome::Unparsed { raw, .. } => (raw.clone(), OutputKind::RawText),
    };

    tokio::fs::write(&path, contents)
        .await
        .map_err(|e| Error::Other(format!("failed to write {}: {e}", path.display())))?;

    match kind {
        OutputKind::Json => info!("Saved lifecycle analysis to {}", path.display()),
        OutputKind::RawText => warn!(
            "Saved unparsed model answer as raw text to {}",
            path.display()
        ),
    }

    Ok(PersistedOutput { path, kind })
}
