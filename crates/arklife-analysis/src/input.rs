//! Scenario input.

use std::path::Path;

use arklife_core::InputError;
use tracing::debug;

const PREVIEW_CHARS: usize = 200;

/// Read the scenario file and return its trimmed contents.
pub async fn read_input(path: &Path) -> Result<String, InputError> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(InputError::NotFound(path.to_path_buf()));
        }
        Err(e) => return Err(InputError::Io(e)),
    };

    let text = raw.trim();
    if text.is_empty() {
        return Err(InputError::Empty(path.to_path_buf()));
    }

    debug!("Read {} chars from {}", text.chars().count(), path.display());
    debug!("Input preview: {}", preview(text));

    Ok(text.to_string())
}

fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
