//! Batch conversion of saved raw answers into normalized JSON.

use std::path::{Path, PathBuf};

use arklife_core::{Error, Result};
use tracing::{debug, info, warn};

use crate::extract::parse_report;
use crate::normalize::normalize;

/// Outcome of a directory conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionSummary {
    /// Written `.json` files
    pub converted: Vec<PathBuf>,
    /// Source files that were skipped, with the reason
    pub failed: Vec<(PathBuf, String)>,
}

/// Convert every `*.txt` answer in `source` into a `.json` file in `out_dir`.
///
/// Files are visited in name order. A file that cannot be read, parsed or
/// written is recorded in [`ConversionSummary::failed`] and the batch continues.
pub async fn convert_directory(source: &Path, out_dir: &Path) -> Result<ConversionSummary> {
    if !tokio::fs::try_exists(source).await? {
        return Err(Error::Other(format!(
            "source directory not found: {}",
            source.display()
        )));
    }

    let mut inputs = Vec::new();
    let mut entries = tokio::fs::read_dir(source).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_txt = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"));
        if is_txt && entry.file_type().await?.is_file() {
            inputs.push(path);
        }
    }
    inputs.sort();
    debug!("Found {} answers in {}", inputs.len(), source.display());

    tokio::fs::create_dir_all(out_dir).await?;
    let mut summary = ConversionSummary::default();

    for input in inputs {
        let raw = match tokio::fs::read_to_string(&input).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Skipping {}: {}", input.display(), e);
                summary.failed.push((input, e.to_string()));
                continue;
            }
        };

        let report = match parse_report(&raw) {
            Ok(report) => report,
            Err(e) => {
                warn!("Skipping {}: {}", input.display(), e);
                summary.failed.push((input, e.to_string()));
                continue;
            }
        };

        let Some(file_name) = input.file_name() else {
            continue;
        };
        let target = out_dir.join(Path::new(file_name).with_extension("json"));
        let json = normalize(report).document.to_pretty_json()?;
        if let Err(e) = tokio::fs::write(&target, json).await {
            warn!("Failed to write {}: {}", target.display(), e);
            summary.failed.push((input, e.to_string()));
            continue;
        }

        debug!("Converted {} -> {}", input.display(), target.display());
        summary.converted.push(target);
    }

    info!(
        "Converted {} answers ({} skipped)",
        summary.converted.len(),
        summary.failed.len()
    );
    Ok(summary)
}
