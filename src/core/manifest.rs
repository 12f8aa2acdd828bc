//! The parsed build manifest.
//!
//! A `Manifest` is the in-memory form of an app-module build script: the
//! `plugins { }` list, the `android { }` block, the optional `flutter { }`
//! block and the `dependencies { }` list. It is produced by the parser,
//! copied (never mutated) by the resolver and read by every later stage.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::language::LanguageLevel;
use crate::core::version_spec::{VersionSpec, INHERIT_PREFIX};

/// Name of the build type whose signing config is the manifest's signing ref.
pub const RELEASE_BUILD_TYPE: &str = "release";

/// The parsed build manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// Applied plugins, in declaration order
    pub plugins: Vec<PluginRef>,

    /// The `android { }` block
    pub android: AndroidConfig,

    /// The `flutter { }` block, if present
    pub flutter: Option<FlutterConfig>,

    /// Declared dependencies, in declaration order
    pub dependencies: Vec<DependencyRef>,
}

impl Manifest {
    /// Parse manifest text.
    pub fn parse(raw: &str) -> Result<Self, crate::parser::ParseError> {
        crate::parser::parse(raw)
    }

    /// Find a plugin by id.
    pub fn plugin(&self, id: &str) -> Option<&PluginRef> {
        self.plugins.iter().find(|p| p.id == id)
    }

    /// Iterate over dependencies of the given kind.
    pub fn dependencies_of(&self, kind: DependencyKind) -> impl Iterator<Item = &DependencyRef> {
        self.dependencies.iter().filter(move |d| d.kind == kind)
    }

    /// Check whether every version spec in the manifest is literal.
    pub fn is_resolved(&self) -> bool {
        self.android.version_specs().all(|(_, spec)| !spec.is_symbolic())
            && self.dependencies.iter().all(|d| !d.version.is_symbolic())
    }
}

/// A plugin applied by the `plugins { }` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginRef {
    /// Plugin id (`com.android.application`)
    pub id: String,

    /// Pinned plugin version, if declared with `version "x"`
    pub version: Option<String>,

    /// False when declared with `apply false`
    pub apply: bool,
}

impl PluginRef {
    /// Create an applied plugin reference without a version.
    pub fn new(id: impl Into<String>) -> Self {
        PluginRef {
            id: id.into(),
            version: None,
            apply: true,
        }
    }

    /// Set the pinned version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

/// The `android { }` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AndroidConfig {
    pub namespace: String,
    pub application_id: String,
    pub compile_sdk: VersionSpec,
    pub min_sdk: VersionSpec,
    pub target_sdk: VersionSpec,
    pub ndk_version: Option<VersionSpec>,
    pub version_code: Option<VersionSpec>,
    pub version_name: Option<VersionSpec>,
    pub source_compatibility: LanguageLevel,
    pub target_compatibility: LanguageLevel,

    /// `kotlinOptions.jvmTarget`
    pub jvm_target: Option<LanguageLevel>,

    /// `compileOptions.isCoreLibraryDesugaringEnabled`
    pub desugaring_enabled: bool,

    /// Build types in declaration order; always contains `release`
    pub build_types: Vec<BuildType>,
}

impl AndroidConfig {
    /// Get a build type by name.
    pub fn build_type(&self, name: &str) -> Option<&BuildType> {
        self.build_types.iter().find(|b| b.name == name)
    }

    /// The signing configuration referenced by the release build type.
    pub fn signing_config_ref(&self) -> Option<&str> {
        self.build_type(RELEASE_BUILD_TYPE)
            .and_then(|b| b.signing_config.as_deref())
    }

    /// Iterate over every version spec with its field name, in resolution order.
    pub fn version_specs(&self) -> impl Iterator<Item = (&'static str, &VersionSpec)> {
        [
            ("android.compileSdk", Some(&self.compile_sdk)),
            ("android.defaultConfig.minSdk", Some(&self.min_sdk)),
            ("android.defaultConfig.targetSdk", Some(&self.target_sdk)),
            ("android.ndkVersion", self.ndk_version.as_ref()),
            ("android.defaultConfig.versionCode", self.version_code.as_ref()),
            ("android.defaultConfig.versionName", self.version_name.as_ref()),
        ]
        .into_iter()
        .filter_map(|(field, spec)| spec.map(|s| (field, s)))
    }
}

/// A build type from `buildTypes { }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildType {
    pub name: String,

    /// Name of the signing config (`signingConfigs.getByName("debug")`)
    pub signing_config: Option<String>,

    /// `isMinifyEnabled`
    pub minify_enabled: Option<bool>,
}

impl BuildType {
    /// Create a build type with no settings.
    pub fn new(name: impl Into<String>) -> Self {
        BuildType {
            name: name.into(),
            signing_config: None,
            minify_enabled: None,
        }
    }
}

/// The `flutter { }` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlutterConfig {
    /// Path to the Flutter project root, relative to the module
    pub source: String,
}

/// How a dependency is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    /// `implementation(...)`
    Implementation,
    /// `coreLibraryDesugaring(...)`
    Desugaring,
}

impl DependencyKind {
    /// The Gradle configuration name.
    pub fn configuration(&self) -> &'static str {
        match self {
            DependencyKind::Implementation => "implementation",
            DependencyKind::Desugaring => "coreLibraryDesugaring",
        }
    }

    /// Map a Gradle configuration name to a kind.
    pub fn from_configuration(name: &str) -> Option<Self> {
        match name {
            "implementation" => Some(DependencyKind::Implementation),
            "coreLibraryDesugaring" => Some(DependencyKind::Desugaring),
            _ => None,
        }
    }
}

impl FromStr for DependencyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "implementation" => Ok(DependencyKind::Implementation),
            "desugaring" | "coreLibraryDesugaring" => Ok(DependencyKind::Desugaring),
            _ => Err(format!(
                "unknown dependency kind '{}', valid values: implementation, desugaring",
                s
            )),
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencyKind::Implementation => write!(f, "implementation"),
            DependencyKind::Desugaring => write!(f, "desugaring"),
        }
    }
}

/// A declared dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyRef {
    /// `group:artifact` (or a bare artifact name)
    pub coordinate: String,

    pub kind: DependencyKind,

    pub version: VersionSpec,

    /// Coordinates this dependency explicitly requires
    pub requires: Vec<String>,
}

impl DependencyRef {
    /// Create a dependency.
    pub fn new(coordinate: impl Into<String>, kind: DependencyKind, version: VersionSpec) -> Self {
        DependencyRef {
            coordinate: coordinate.into(),
            kind,
            version,
            requires: Vec::new(),
        }
    }

    /// Parse a `group:artifact:version` notation.
    ///
    /// The version segment may be symbolic (`inherit:key`, `$key`).
    pub fn from_notation(notation: &str, kind: DependencyKind) -> Result<Self, String> {
        let (coordinate, version) = split_notation(notation).ok_or_else(|| {
            format!(
                "invalid dependency notation '{}', expected \"group:artifact:version\"",
                notation
            )
        })?;

        Ok(DependencyRef::new(coordinate, kind, VersionSpec::parse(version)))
    }

    /// Render the `group:artifact:version` notation.
    pub fn notation(&self) -> String {
        format!("{}:{}", self.coordinate, self.version)
    }
}

fn split_notation(notation: &str) -> Option<(&str, &str)> {
    let notation = notation.trim();

    let (coordinate, version) = match notation.find(INHERIT_PREFIX) {
        Some(idx) => (notation[..idx].strip_suffix(':')?, &notation[idx..]),
        None => notation.rsplit_once(':')?,
    };

    if coordinate.is_empty() || version.is_empty() {
        return None;
    }

    Some((coordinate, version))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notation_literal() {
        let dep = DependencyRef::from_notation(
            "org.jetbrains.kotlin:kotlin-stdlib:1.9.22",
            DependencyKind::Implementation,
        )
        .unwrap();

        assert_eq!(dep.coordinate, "org.jetbrains.kotlin:kotlin-stdlib");
        assert_eq!(dep.version, VersionSpec::literal("1.9.22"));
        assert_eq!(dep.notation(), "org.jetbrains.kotlin:kotlin-stdlib:1.9.22");
    }

    #[test]
    fn test_notation_bare_artifact() {
        let dep =
            DependencyRef::from_notation("desugar_jdk_libs:2.0.4", DependencyKind::Desugaring)
                .unwrap();
        assert_eq!(dep.coordinate, "desugar_jdk_libs");
        assert_eq!(dep.version.as_literal(), Some("2.0.4"));
    }

    #[test]
    fn test_notation_symbolic() {
        let dep = DependencyRef::from_notation(
            "org.jetbrains.kotlin:kotlin-stdlib:inherit:kotlin.version",
            DependencyKind::Implementation,
        )
        .unwrap();
        assert_eq!(dep.coordinate, "org.jetbrains.kotlin:kotlin-stdlib");
        assert_eq!(dep.version, VersionSpec::symbolic("kotlin.version"));

        let dep = DependencyRef::from_notation(
            "org.jetbrains.kotlin:kotlin-stdlib:$kotlin_version",
            DependencyKind::Implementation,
        )
        .unwrap();
        assert_eq!(dep.version, VersionSpec::symbolic("kotlin_version"));
        assert_eq!(
            dep.notation(),
            "org.jetbrains.kotlin:kotlin-stdlib:inherit:kotlin_version"
        );
    }

    #[test]
    fn test_notation_invalid() {
        assert!(DependencyRef::from_notation("no-version", DependencyKind::Implementation).is_err());
        assert!(DependencyRef::from_notation("group:", DependencyKind::Implementation).is_err());
        assert!(DependencyRef::from_notation(":1.0", DependencyKind::Implementation).is_err());
    }

    #[test]
    fn test_dependency_kind_names() {
        assert_eq!(
            DependencyKind::from_configuration("coreLibraryDesugaring"),
            Some(DependencyKind::Desugaring)
        );
        assert_eq!(DependencyKind::from_configuration("api"), None);
        assert_eq!("desugaring".parse::<DependencyKind>(), Ok(DependencyKind::Desugaring));
        assert_eq!(DependencyKind::Implementation.configuration(), "implementation");
    }
}
