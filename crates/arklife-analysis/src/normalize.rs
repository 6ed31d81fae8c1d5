//! Collapse a parsed report into a [`LifecycleDocument`].

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use crate::model::{
    DeclaredScope, Lifecycle, LifecycleDocument, LifecycleFunction, LifecycleReport, Scope,
};

/// Substring after the last `.`.
///
/// Returns the whole name when there is no `.` or nothing follows it.
#[must_use]
pub fn base_name(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((_, suffix)) if !suffix.is_empty() => suffix,
        _ => name,
    }
}

/// A lossy step taken during normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Coercion {
    /// A declared scope outside `{page, component}` was mapped to `scope`.
    Scope {
        function: String,
        declared: DeclaredScope,
        scope: Scope,
    },
    /// Two records for the same base name disagreed on scope.
    Merged {
        function: String,
        kept: Scope,
        dropped: Scope,
    },
}

impl fmt::Display for Coercion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scope {
                function,
                declared,
                scope,
            } => write!(f, "{function}: scope {declared} coerced to {scope}"),
            Self::Merged {
                function,
                kept,
                dropped,
            } => write!(f, "{function}: scopes {kept} and {dropped} merged to {kept}"),
        }
    }
}

/// Normalized document and the coercions applied to produce it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub document: LifecycleDocument,
    pub coercions: Vec<Coercion>,
}

/// Normalize a report.
///
/// One record per base name, sorted by name. The first description seen is
/// kept; `component` wins when records disagree on scope. `order` and
/// `dynamicBehavior` pass through untouched.
#[must_use]
pub fn normalize(report: LifecycleReport) -> Normalized {
    let mut functions: BTreeMap<String, LifecycleFunction> = BTreeMap::new();
    let mut coercions = Vec::new();

    for raw in report.lifecycle.functions {
        let base = base_name(&raw.name).to_string();
        let (scope, coerced) = raw.scope.resolve();

        if coerced {
            coercions.push(Coercion::Scope {
                function: raw.name.clone(),
                declared: raw.scope.clone(),
                scope,
            });
        }

        match functions.get_mut(&base) {
            Some(existing) => {
                if existing.scope != scope {
                    let dropped = if existing.scope == Scope::Component {
                        scope
                    } else {
                        existing.scope
                    };
                    existing.scope = Scope::Component;
                    coercions.push(Coercion::Merged {
                        function: base,
                        kept: Scope::Component,
                        dropped,
                    });
                }
            }
            None => {
                functions.insert(
                    base.clone(),
                    LifecycleFunction {
                        name: base,
                        scope,
                        description: raw.description,
                    },
                );
            }
        }
    }

    for coercion in &coercions {
        debug!("Normalization: {}", coercion);
    }

    Normalized {
        document: LifecycleDocument {
            lifecycle: Lifecycle {
                functions: functions.into_values().collect(),
                order: report.lifecycle.order,
                dynamic_behavior: report.lifecycle.dynamic_behavior,
            },
        },
        coercions,
    }
}
