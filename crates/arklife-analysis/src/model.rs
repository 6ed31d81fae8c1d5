//! Lifecycle documents.
//!
//! Two shapes share the `{"lifecycle": {...}}` root:
//!
//! - [`LifecycleReport`]: what the model wrote. Scopes are kept as
//!   [`DeclaredScope`] so `both` and unexpected values survive parsing.
//! - [`LifecycleDocument`]: the normalized output, with one record per base
//!   function name and scopes restricted to [`Scope`].

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Scopes
// ============================================================================

/// Scope of a lifecycle function in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Page-level callback (`@Entry` components only)
    Page,
    /// Callback available to every custom component
    Component,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Page => write!(f, "page"),
            Self::Component => write!(f, "component"),
        }
    }
}

/// Scope as written by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclaredScope {
    Page,
    Component,
    /// Used on both pages and components
    Both,
    /// Anything else; empty when the scope was missing or null
    Unrecognized(String),
}

impl Default for DeclaredScope {
    fn default() -> Self {
        Self::Unrecognized(String::new())
    }
}

impl DeclaredScope {
    /// Map onto an output scope.
    ///
    /// Returns the scope and whether the mapping lost information.
    #[must_use]
    pub fn resolve(&self) -> (Scope, bool) {
        match self {
            Self::Page => (Scope::Page, false),
            Self::Component => (Scope::Component, false),
            Self::Both | Self::Unrecognized(_) => (Scope::Component, true),
        }
    }
}

impl From<&str> for DeclaredScope {
    fn from(value: &str) -> Self {
        let trimmed = value.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "page" => Self::Page,
            "component" => Self::Component,
            "both" => Self::Both,
            _ => Self::Unrecognized(trimmed.to_string()),
        }
    }
}

impl From<Option<String>> for DeclaredScope {
    fn from(value: Option<String>) -> Self {
        value.as_deref().map_or_else(Self::default, Self::from)
    }
}

impl fmt::Display for DeclaredScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Page => write!(f, "page"),
            Self::Component => write!(f, "component"),
            Self::Both => write!(f, "both"),
            Self::Unrecognized(s) if s.is_empty() => write!(f, "<missing>"),
            Self::Unrecognized(s) => write!(f, "{s:?}"),
        }
    }
}

impl<'de> Deserialize<'de> for DeclaredScope {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer).map(Self::from)
    }
}

impl Serialize for DeclaredScope {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Self::Page => serializer.serialize_str("page"),
            Self::Component => serializer.serialize_str("component"),
            Self::Both => serializer.serialize_str("both"),
            Self::Unrecognized(s) => serializer.serialize_str(s),
        }
    }
}

// ============================================================================
// Shared
// ============================================================================

/// Directed "runs before" edge between qualified instances such as
/// `Parent.aboutToAppear`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallOrderEdge {
    /// Runs first
    pub pred: String,
    /// Runs next
    pub succ: String,
}

impl CallOrderEdge {
    pub fn new(pred: impl Into<String>, succ: impl Into<String>) -> Self {
        Self {
            pred: pred.into(),
            succ: succ.into(),
        }
    }
}

// ============================================================================
// Raw (as parsed)
// ============================================================================

/// Function entry as the model wrote it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFunction {
    pub name: String,
    #[serde(default)]
    pub scope: DeclaredScope,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
}

/// Body of a parsed answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLifecycle {
    pub functions: Vec<RawFunction>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub order: Vec<CallOrderEdge>,
    #[serde(
        default,
        rename = "dynamicBehavior",
        deserialize_with = "null_as_default"
    )]
    pub dynamic_behavior: String,
}

/// `null` reads as an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// A parsed model answer, before normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleReport {
    pub lifecycle: RawLifecycle,
}

// ============================================================================
// Normalized
// ============================================================================

/// One lifecycle function in the output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleFunction {
    /// Base function name, unique in the document
    pub name: String,
    pub scope: Scope,
    pub description: String,
}

/// Body of a normalized document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lifecycle {
    /// Sorted by name
    pub functions: Vec<LifecycleFunction>,
    pub order: Vec<CallOrderEdge>,
    #[serde(rename = "dynamicBehavior")]
    pub dynamic_behavior: String,
}

/// Normalized analysis result, written as the output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleDocument {
    pub lifecycle: Lifecycle,
}

impl LifecycleDocument {
    /// Pretty JSON with two-space indentation.
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
