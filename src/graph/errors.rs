//! Graph construction errors.

use thiserror::Error;

use crate::util::diagnostic::Diagnostic;

/// Error while building the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("dependency cycle: {}", render_cycle(.cycle))]
    Cycle {
        /// Coordinates on the cycle, starting at the re-entered node
        cycle: Vec<String>,
    },

    #[error("conflicting versions for `{coordinate}`: {}", .versions.join(", "))]
    VersionConflict {
        coordinate: String,
        /// Distinct pinned versions, in declaration order
        versions: Vec<String>,
    },

    #[error("version of `{coordinate}` is unresolved (references `{key}`)")]
    UnresolvedVersion { coordinate: String, key: String },

    #[error("`{from}` requires `{to}`, which is not a dependency")]
    UnknownRequirement { from: String, to: String },
}

fn render_cycle(cycle: &[String]) -> String {
    let mut path = cycle.join(" -> ");
    if let Some(first) = cycle.first() {
        path.push_str(" -> ");
        path.push_str(first);
    }
    path
}

impl GraphError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            GraphError::Cycle { cycle } => Diagnostic::error("dependency cycle detected")
                .with_context(render_cycle(cycle))
                .with_suggestion("Remove one of the `requires` edges on the cycle"),
            GraphError::VersionConflict {
                coordinate,
                versions,
            } => {
                let mut diag =
                    Diagnostic::error(format!("version conflict for `{}`", coordinate));
                for version in versions {
                    diag = diag.with_context(format!("pinned at {}", version));
                }
                diag.with_suggestion(format!("Declare `{}` with a single version", coordinate))
                    .with_suggestion("Check versions implied by plugins in the [plugins] config")
            }
            GraphError::UnresolvedVersion { coordinate, key } => {
                Diagnostic::error(format!("version of `{}` is unresolved", coordinate))
                    .with_context(format!("still references `{}`", key))
                    .with_suggestion("Resolve versions before building the graph")
            }
            GraphError::UnknownRequirement { from, to } => {
                Diagnostic::error(format!("`{}` requires unknown dependency `{}`", from, to))
                    .with_suggestion(format!("Declare `{}` in the dependencies block", to))
            }
        }
    }
}
