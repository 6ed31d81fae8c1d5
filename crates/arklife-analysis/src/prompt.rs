//! Prompt template.
//!
//! Templates use `{context}` and `{question}` placeholders. `{{` and `}}`
//! render as literal braces so JSON examples can be embedded. Any other
//! `{name}` is left as written.

use std::path::Path;

use arklife_core::{Error, Result};
use tracing::debug;

const BUILTIN_TEMPLATE: &str = r#"You are an expert in HarmonyOS ArkTS development, specializing in the lifecycle of ArkUI custom components.

Use the reference passages below to analyze the ArkTS code sample and describe the lifecycle functions it involves.

Reference passages:
{context}

ArkTS code sample:
{question}

Return the analysis strictly as JSON in the following format:
{{
  "lifecycle": {{
    "functions": [
      {{
        "name": "function name",
        "scope": "page or component or both",
        "description": "what the function does and when it runs"
      }}
    ],
    "order": [
      {{"pred": "Component.function", "succ": "Component.function"}}
    ],
    "dynamicBehavior": "how conditional rendering, list updates and state changes affect the lifecycle"
  }}
}}

Requirements:
1. List every lifecycle callback the sample involves (aboutToAppear, aboutToDisappear, onPageShow, onPageHide, onBackPress, and so on), the build function (always required) and any state-management methods.
2. "functions" holds one entry per distinct function. Parent.aboutToAppear and Child.aboutToAppear are both listed once as aboutToAppear.
3. "scope" is page for page-only callbacks, component for component callbacks, and both when the function is used by pages and components alike.
4. "order" lists directed edges between consecutive calls, each side written as "Component.function". A call sequence A -> B -> C becomes [{{"pred": "A", "succ": "B"}}, {{"pred": "B", "succ": "C"}}]. Unless the sample says otherwise, describe the normal order from startup to exit.
5. aboutToDisappear runs on the parent before the child: Parent.aboutToDisappear -> Child.aboutToDisappear. The reverse order is wrong.
6. build runs first during creation and runs again whenever state changes. Show both in "order".
7. Output only the JSON object, with no other text.
"#;

/// A prompt template with `{context}` and `{question}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    /// Template shipped with the crate.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(BUILTIN_TEMPLATE)
    }

    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Load a template from a UTF-8 file.
    pub async fn from_file(path: &Path) -> Result<Self> {
        let template = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::Config(format!(
                "failed to read prompt template {}: {e}",
                path.display()
            ))
        })?;
        debug!("Loaded prompt template from {}", path.display());
        Ok(Self::new(template))
    }

    /// Raw template text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Substitute `context` and `question`.
    #[must_use]
    pub fn render(&self, context: &str, question: &str) -> String {
        let src = self.template.as_str();
        let mut out = String::with_capacity(src.len() + context.len() + question.len());
        let mut rest = src;

        while let Some(pos) = rest.find(['{', '}']) {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];

            if tail.starts_with("{{") {
                out.push('{');
                rest = &tail[2..];
            } else if tail.starts_with("}}") {
                out.push('}');
                rest = &tail[2..];
            } else if let Some(after) = tail.strip_prefix("{context}") {
                out.push_str(context);
                rest = after;
            } else if let Some(after) = tail.strip_prefix("{question}") {
                out.push_str(question);
                rest = after;
            } else {
                out.push_str(&tail[..1]);
                rest = &tail[1..];
            }
        }
        out.push_str(rest);
        out
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_render_substitutes_placeholders() {
        let template = PromptTemplate::new("Docs:\n{context}\nCode:\n{question}");
        assert_eq!(
            template.render("passage", "struct Index {}"),
            "Docs:\npassage\nCode:\nstruct Index {}"
        );
    }

    #[test]
    fn test_render_escapes_and_unknown_placeholders() {
        let template = PromptTemplate::new("{{\"a\": {{}}}} {other} {question} }");
        assert_eq!(template.render("c", "q"), "{\"a\": {}} {other} q }");
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let template = PromptTemplate::new("{context}|{question}");
        assert_eq!(template.render("{question}", "{{x}}"), "{question}|{{x}}");
    }

    #[test]
    fn test_builtin_template_renders_schema() {
        let prompt = PromptTemplate::builtin().render("PASSAGES", "CODE");

        assert!(prompt.contains("PASSAGES"));
        assert!(prompt.contains("CODE"));
        assert!(prompt.contains("\"lifecycle\": {"));
        assert!(prompt.contains("{\"pred\": \"A\", \"succ\": \"B\"}"));
        assert!(prompt.contains("Parent.aboutToDisappear -> Child.aboutToDisappear"));
        assert!(!prompt.contains("{{"));
        assert!(!prompt.contains("{context}"));
    }

    #[tokio::test]
    async fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "Q: {{question}}").unwrap();

        let template = PromptTemplate::from_file(file.path()).await.unwrap();
        assert_eq!(template.render("", "why"), "Q: why");
    }

    #[tokio::test]
    async fn test_from_missing_file() {
        let result = PromptTemplate::from_file(Path::new("/nonexistent/prompt.txt")).await;
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
