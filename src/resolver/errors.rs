//! Resolution error types and diagnostics.

use thiserror::Error;

use crate::util::diagnostic::Diagnostic;

/// Error while replacing symbolic version references with literals.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("unknown default `{key}` referenced by `{field}`")]
    UnknownDefault {
        key: String,
        /// Manifest field holding the reference
        field: String,
        /// Known keys that look similar
        suggestions: Vec<String>,
    },
}

impl ResolveError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ResolveError::UnknownDefault {
                key,
                field,
                suggestions,
            } => {
                let mut diag = Diagnostic::error(format!("no default registered for `{}`", key))
                    .with_context(format!("referenced by `{}`", field));

                if !suggestions.is_empty() {
                    diag = diag.with_context(format!("did you mean: {}?", suggestions.join(", ")));
                }

                diag.with_suggestion(format!("Add `\"{}\" = \"...\"` to the [defaults] table", key))
                    .with_suggestion(format!("Replace `{}` with a literal value", field))
            }
        }
    }
}
