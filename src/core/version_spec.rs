//! Version specifications that may defer to a defaults registry.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix marking a symbolic reference in string form (`"inherit:<key>"`).
pub const INHERIT_PREFIX: &str = "inherit:";

/// A version value that is either literal or symbolically deferred.
///
/// Symbolic references are replaced by literals during resolution; after
/// that a spec is never modified again.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum VersionSpec {
    /// A literal version (`"34"`, `"2.0.4"`)
    Literal(String),
    /// A reference to a key in the version defaults registry
    Symbolic(String),
}

impl VersionSpec {
    /// Create a literal spec.
    pub fn literal(value: impl Into<String>) -> Self {
        VersionSpec::Literal(value.into())
    }

    /// Create a symbolic spec referencing `key`.
    pub fn symbolic(key: impl Into<String>) -> Self {
        VersionSpec::Symbolic(key.into())
    }

    /// Parse the string form of a spec.
    ///
    /// `inherit:<key>`, `$key` and `${key}` are symbolic; anything else is a
    /// literal.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();

        if let Some(key) = s.strip_prefix(INHERIT_PREFIX) {
            return VersionSpec::symbolic(key.trim());
        }

        if let Some(rest) = s.strip_prefix('$') {
            let key = rest
                .strip_prefix('{')
                .and_then(|r| r.strip_suffix('}'))
                .unwrap_or(rest);
            return VersionSpec::symbolic(key.trim());
        }

        VersionSpec::literal(s)
    }

    /// Get the literal value, if resolved.
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            VersionSpec::Literal(v) => Some(v),
            VersionSpec::Symbolic(_) => None,
        }
    }

    /// Get the registry key, if symbolic.
    pub fn symbolic_key(&self) -> Option<&str> {
        match self {
            VersionSpec::Symbolic(key) => Some(key),
            VersionSpec::Literal(_) => None,
        }
    }

    /// Check if this spec still needs resolution.
    pub fn is_symbolic(&self) -> bool {
        matches!(self, VersionSpec::Symbolic(_))
    }

    /// Interpret the literal as an integer (SDK levels, version codes).
    pub fn as_int(&self) -> Option<u32> {
        self.as_literal().and_then(|v| v.parse().ok())
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionSpec::Literal(v) => write!(f, "{}", v),
            VersionSpec::Symbolic(key) => write!(f, "{}{}", INHERIT_PREFIX, key),
        }
    }
}
