//! Rendering retrieved passages for the prompt.

use arklife_core::RetrievedChunk;

const SEPARATOR: &str = "\n\n---\n\n";

/// Render passages as numbered blocks headed by source and page.
///
/// ```text
/// [Passage 1 - source: guide.pdf, page: 3]
/// aboutToAppear runs before build...
/// ```
#[must_use]
pub fn format_context(chunks: &[RetrievedChunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            let source = if chunk.source.is_empty() {
                "unknown"
            } else {
                chunk.source.as_str()
            };
            let page = chunk
                .page
                .map_or_else(|| "?".to_string(), |p| p.to_string());

            format!(
                "[Passage {} - source: {}, page: {}]\n{}",
                i + 1,
                source,
                page,
                chunk.content
            )
        })
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passage(content: &str, source: &str, page: Option<u32>) -> RetrievedChunk {
        RetrievedChunk {
            content: content.to_string(),
            source: source.to_string(),
            page,
            score: 0.5,
        }
    }

    #[test]
    fn test_empty() {
        assert_eq!(format_context(&[]), "");
    }

    #[test]
    fn test_passages_numbered_and_joined() {
        let text = format_context(&[
            passage("aboutToAppear runs first", "guide.pdf", Some(3)),
            passage("onPageShow is page-only", "", None),
        ]);

        assert_eq!(
            text,
            "[Passage 1 - source: guide.pdf, page: 3]\naboutToAppear runs first\
             \n\n---\n\n\
             [Passage 2 - source: unknown, page: ?]\nonPageShow is page-only"
        );
    }
}
