//! Plan emission errors.

use thiserror::Error;

use crate::util::diagnostic::Diagnostic;
use crate::validate::ConstraintViolation;

/// Error while emitting a plan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmitError {
    /// The validation report still carries violations.
    #[error("cannot emit a plan with {} constraint violation(s)", .violations.len())]
    IncompletePlan { violations: Vec<ConstraintViolation> },

    /// A field that must be a literal (or an integer) is not.
    #[error("`{field}` is not a usable literal: `{value}`")]
    Unresolved { field: String, value: String },
}

impl EmitError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            EmitError::IncompletePlan { violations } => {
                let mut diag = Diagnostic::error(self.to_string());
                for violation in violations {
                    diag = diag.with_context(violation.to_string());
                }
                diag.with_suggestion("Run `droidplan check` to see every failing check")
            }
            EmitError::Unresolved { field, value } => {
                Diagnostic::error(format!("`{}` is not resolved", field))
                    .with_context(format!("value is `{}`", value))
                    .with_suggestion("Register the referenced default under [defaults]")
            }
        }
    }
}
