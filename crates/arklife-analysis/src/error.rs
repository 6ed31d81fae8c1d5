//! Analysis errors.

use thiserror::Error;

/// The completion could not be read as a lifecycle document.
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("completion contained no JSON payload")]
    Empty,

    #[error("invalid lifecycle JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Call graph construction and traversal errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum GraphError {
    #[error("instance \"{instance}\" references unknown function: {base}")]
    UnknownFunction { instance: String, base: String },

    #[error("call graph contains a cycle")]
    Cycle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_function_display() {
        let err = GraphError::UnknownFunction {
            instance: "Child.onPageShow".to_string(),
            base: "onPageShow".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "instance \"Child.onPageShow\" references unknown function: onPageShow"
        );
    }

    #[test]
    fn test_format_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: FormatError = json_err.into();
        assert!(err.to_string().starts_with("invalid lifecycle JSON"));
    }
}
