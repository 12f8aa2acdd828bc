//! Java language levels and their parsing.
//!
//! A language level is compared ordinally: `VERSION_1_8 < VERSION_11 <
//! VERSION_17`. Levels up to 8 use the legacy `1.x` spelling.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Oldest language level accepted.
pub const MIN_LEVEL: u8 = 6;

/// Newest language level accepted.
pub const MAX_LEVEL: u8 = 25;

/// A Java language level (source/target compatibility, Kotlin JVM target).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LanguageLevel(u8);

impl LanguageLevel {
    /// Java 8 (`1.8`).
    pub const JAVA_8: LanguageLevel = LanguageLevel(8);
    /// Java 11.
    pub const JAVA_11: LanguageLevel = LanguageLevel(11);
    /// Java 17.
    pub const JAVA_17: LanguageLevel = LanguageLevel(17);

    /// Create a level from its feature release number.
    pub fn new(release: u8) -> Result<Self, LanguageLevelParseError> {
        if (MIN_LEVEL..=MAX_LEVEL).contains(&release) {
            Ok(LanguageLevel(release))
        } else {
            Err(LanguageLevelParseError(release.to_string()))
        }
    }

    /// The feature release number (8 for `1.8`).
    pub fn release(&self) -> u8 {
        self.0
    }

    /// The `JavaVersion` constant name (`VERSION_1_8`, `VERSION_17`).
    pub fn as_gradle_constant(&self) -> String {
        if self.0 <= 8 {
            format!("VERSION_1_{}", self.0)
        } else {
            format!("VERSION_{}", self.0)
        }
    }
}

impl FromStr for LanguageLevel {
    type Err = LanguageLevelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || LanguageLevelParseError(s.to_string());

        let trimmed = s.trim();
        let unqualified = trimmed
            .strip_prefix("JavaVersion.")
            .or_else(|| trimmed.strip_prefix("JvmTarget."))
            .unwrap_or(trimmed);
        let bare = unqualified
            .strip_prefix("VERSION_")
            .or_else(|| unqualified.strip_prefix("JVM_"))
            .unwrap_or(unqualified)
            .replace('_', ".");

        let release = match bare.strip_prefix("1.") {
            Some(minor) => {
                let minor: u8 = minor.parse().map_err(|_| err())?;
                if minor > 8 {
                    return Err(err());
                }
                minor
            }
            None => bare.parse().map_err(|_| err())?,
        };

        LanguageLevel::new(release).map_err(|_| err())
    }
}

impl TryFrom<String> for LanguageLevel {
    type Error = LanguageLevelParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<LanguageLevel> for String {
    fn from(level: LanguageLevel) -> Self {
        level.to_string()
    }
}

impl fmt::Display for LanguageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 <= 8 {
            write!(f, "1.{}", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Error returned when parsing an invalid language level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageLevelParseError(pub String);

impl fmt::Display for LanguageLevelParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid language level '{}', expected e.g. JavaVersion.VERSION_17, \"1.8\" or 21",
            self.0
        )
    }
}

impl std::error::Error for LanguageLevelParseError {}
