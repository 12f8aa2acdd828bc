//! Parse error types and diagnostics.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, SourceSpan};
use thiserror::Error;

use crate::util::diagnostic::Diagnostic;

/// A position in the manifest source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location {
    /// 1-based line
    pub line: usize,
    /// 1-based column, in characters
    pub column: usize,
    /// Byte offset from the start of the source
    pub offset: usize,
}

impl Location {
    /// The position of the first character of a source.
    pub fn start() -> Self {
        Location {
            line: 1,
            column: 1,
            offset: 0,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Error while turning manifest text into a [`Manifest`](crate::core::Manifest).
#[derive(Debug, Clone, PartialEq, Eq, Error, MietteDiagnostic)]
pub enum ParseError {
    /// The text is not well-formed block syntax.
    #[error("syntax error at {line}:{column}: {message}")]
    #[diagnostic(code(droidplan::parse::syntax))]
    Syntax {
        message: String,
        line: usize,
        column: usize,
        #[label("here")]
        span: SourceSpan,
    },

    /// The text is well-formed but does not describe a valid manifest.
    #[error("invalid manifest field `{field}`: {message}")]
    #[diagnostic(code(droidplan::parse::schema))]
    Schema {
        field: String,
        message: String,
        location: Option<Location>,
    },
}

impl ParseError {
    /// Create a syntax error covering `len` bytes at `loc`.
    pub fn syntax(message: impl Into<String>, loc: Location, len: usize) -> Self {
        ParseError::Syntax {
            message: message.into(),
            line: loc.line,
            column: loc.column,
            span: (loc.offset, len.max(1)).into(),
        }
    }

    /// Create a schema error.
    pub fn schema(
        field: impl Into<String>,
        message: impl Into<String>,
        location: Option<Location>,
    ) -> Self {
        ParseError::Schema {
            field: field.into(),
            message: message.into(),
            location,
        }
    }

    /// Create a schema error for a missing required field.
    pub fn missing(field: impl Into<String>, location: Option<Location>) -> Self {
        ParseError::schema(field, "missing required field", location)
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ParseError::Syntax {
                message,
                line,
                column,
                ..
            } => Diagnostic::error(format!("malformed manifest: {}", message))
                .with_context(format!("at line {}, column {}", line, column))
                .with_suggestion("Check for unbalanced braces, parentheses or quotes"),

            ParseError::Schema {
                field,
                message,
                location,
            } => {
                let mut diag =
                    Diagnostic::error(format!("invalid manifest field `{}`: {}", field, message));

                if let Some(loc) = location {
                    diag = diag.with_context(format!("at line {}, column {}", loc.line, loc.column));
                }

                diag.with_suggestion(format!("Set `{}` in the build script", field))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_diagnostic() {
        let loc = Location {
            line: 3,
            column: 7,
            offset: 42,
        };
        let err = ParseError::syntax("expected '}'", loc, 1);

        assert_eq!(err.to_string(), "syntax error at 3:7: expected '}'");

        let output = err.to_diagnostic().format(false);
        assert!(output.contains("malformed manifest"));
        assert!(output.contains("line 3, column 7"));
    }

    #[test]
    fn test_missing_field_diagnostic() {
        let err = ParseError::missing("android.namespace", None);
        let output = err.to_diagnostic().format(false);

        assert!(output.contains("android.namespace"));
        assert!(output.contains("missing required field"));
    }
}
