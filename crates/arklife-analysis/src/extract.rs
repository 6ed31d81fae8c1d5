//! Fenced JSON extraction and parsing.

use tracing::debug;

use crate::error::FormatError;
use crate::model::LifecycleReport;

const FENCE: &str = "```";

/// Return the interior of the first fenced block, trimmed.
///
/// The opening fence may carry a language tag (`json`, `JSON`, ...). Without a
/// complete fenced block the whole input is returned, trimmed.
#[must_use]
pub fn extract_json_block(raw: &str) -> &str {
    let Some(open) = raw.find(FENCE) else {
        return raw.trim();
    };
    let after_fence = &raw[open + FENCE.len()..];

    // Skip a language tag on the opening line.
    let body_start = match after_fence.find('\n') {
        Some(newline) if is_language_tag(&after_fence[..newline]) => newline + 1,
        _ => after_fence
            .find(|c: char| !is_tag_char(c))
            .unwrap_or(after_fence.len()),
    };
    let body = &after_fence[body_start..];

    match body.find(FENCE) {
        Some(close) => body[..close].trim(),
        None => raw.trim(),
    }
}

fn is_tag_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+')
}

fn is_language_tag(line: &str) -> bool {
    line.trim().chars().all(is_tag_char)
}

/// Extract and parse a model answer into a [`LifecycleReport`].
pub fn parse_report(text: &str) -> Result<LifecycleReport, FormatError> {
    let payload = extract_json_block(text);
    if payload.is_empty() {
        return Err(FormatError::Empty);
    }

    debug!("Parsing {} chars of lifecycle JSON", payload.len());
    Ok(serde_json::from_str(payload)?)
}
