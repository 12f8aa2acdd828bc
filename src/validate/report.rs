//! Validation report types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::util::diagnostic::Diagnostic;

/// Identifies one cross-field check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConstraintCode {
    LanguageLevelOrder,
    SdkOrder,
    DesugaringRequired,
    DesugaringLibrary,
    SigningConfig,
    JvmTarget,
    PluginVersion,
    DebugSigningRelease,
}

impl ConstraintCode {
    /// Every check, in the order the validator runs them.
    pub const ALL: [ConstraintCode; 8] = [
        ConstraintCode::LanguageLevelOrder,
        ConstraintCode::SdkOrder,
        ConstraintCode::DesugaringRequired,
        ConstraintCode::DesugaringLibrary,
        ConstraintCode::SigningConfig,
        ConstraintCode::JvmTarget,
        ConstraintCode::PluginVersion,
        ConstraintCode::DebugSigningRelease,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintCode::LanguageLevelOrder => "language-level-order",
            ConstraintCode::SdkOrder => "sdk-order",
            ConstraintCode::DesugaringRequired => "desugaring-required",
            ConstraintCode::DesugaringLibrary => "desugaring-library",
            ConstraintCode::SigningConfig => "signing-config",
            ConstraintCode::JvmTarget => "jvm-target",
            ConstraintCode::PluginVersion => "plugin-version",
            ConstraintCode::DebugSigningRelease => "debug-signing-release",
        }
    }

    /// One-line description of what the check enforces.
    pub fn description(&self) -> &'static str {
        match self {
            ConstraintCode::LanguageLevelOrder => {
                "sourceCompatibility is not newer than targetCompatibility"
            }
            ConstraintCode::SdkOrder => "minSdk <= targetSdk <= compileSdk",
            ConstraintCode::DesugaringRequired => {
                "desugaring is enabled when a dependency or plugin needs it"
            }
            ConstraintCode::DesugaringLibrary => "a desugaring library is present when enabled",
            ConstraintCode::SigningConfig => "build types use known, valid signing configs",
            ConstraintCode::JvmTarget => "kotlinOptions.jvmTarget matches targetCompatibility",
            ConstraintCode::PluginVersion => "plugin versions are in their supported range",
            ConstraintCode::DebugSigningRelease => "release is not signed with a debug identity",
        }
    }

    /// Suggested fix shown with a violation.
    fn suggestion(&self) -> &'static str {
        match self {
            ConstraintCode::LanguageLevelOrder => {
                "Raise targetCompatibility or lower sourceCompatibility in compileOptions"
            }
            ConstraintCode::SdkOrder => "Adjust compileSdk, minSdk or targetSdk so they are ordered",
            ConstraintCode::DesugaringRequired => {
                "Set `isCoreLibraryDesugaringEnabled = true` in compileOptions"
            }
            ConstraintCode::DesugaringLibrary => {
                "Add `coreLibraryDesugaring(\"com.android.tools:desugar_jdk_libs:<version>\")`"
            }
            ConstraintCode::SigningConfig => {
                "Register the signing config under [signing.<name>] in the config file"
            }
            ConstraintCode::JvmTarget => "Set kotlinOptions.jvmTarget to targetCompatibility",
            ConstraintCode::PluginVersion => "Pin the plugin to a supported version",
            ConstraintCode::DebugSigningRelease => {
                "Create a release signing config and use it in buildTypes.release"
            }
        }
    }
}

impl fmt::Display for ConstraintCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed check, or a warning raised by one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintViolation {
    pub code: ConstraintCode,
    pub message: String,
}

impl ConstraintViolation {
    pub fn new(code: ConstraintCode, message: impl Into<String>) -> Self {
        ConstraintViolation {
            code,
            message: message.into(),
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(&self.message)
            .with_context(format!("check `{}`: {}", self.code, self.code.description()))
            .with_suggestion(self.code.suggestion())
    }
}

impl fmt::Display for ConstraintViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// Evidence that a check ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub code: ConstraintCode,
    pub passed: bool,
}

/// Outcome of validating one manifest.
///
/// Empty `violations` means the manifest is valid. Checks skipped by a
/// fail-fast run have no outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub checks: Vec<CheckOutcome>,
    pub violations: Vec<ConstraintViolation>,
    pub warnings: Vec<ConstraintViolation>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no check was violated. Warnings do not count.
    pub fn is_ok(&self) -> bool {
        self.violations.is_empty()
    }

    /// Violations reported by a given check.
    pub fn violations_of(&self, code: ConstraintCode) -> impl Iterator<Item = &ConstraintViolation> {
        self.violations.iter().filter(move |v| v.code == code)
    }

    /// Outcome of a given check, if it ran.
    pub fn outcome(&self, code: ConstraintCode) -> Option<bool> {
        self.checks.iter().find(|c| c.code == code).map(|c| c.passed)
    }

    pub(crate) fn record(&mut self, code: ConstraintCode, violations: Vec<ConstraintViolation>) {
        self.checks.push(CheckOutcome {
            code,
            passed: violations.is_empty(),
        });
        self.violations.extend(violations);
    }

    pub(crate) fn warn(&mut self, warning: ConstraintViolation) {
        self.warnings.push(warning);
    }
}
