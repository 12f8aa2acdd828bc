//! Core data structures for droidplan.
//!
//! This module contains the foundational types used throughout the pipeline:
//! - The parsed manifest and its parts (plugins, android block, dependencies)
//! - Version specifications and Java language levels
//! - Caller-supplied registries (version defaults, signing configs, plugin catalog)

pub mod language;
pub mod manifest;
pub mod registry;
pub mod version_spec;

pub use language::LanguageLevel;
pub use manifest::{
    AndroidConfig, BuildType, DependencyKind, DependencyRef, FlutterConfig, Manifest, PluginRef,
    RELEASE_BUILD_TYPE,
};
pub use registry::{
    ImpliedDependency, PluginCatalog, PluginMetadata, Registries, SigningConfig, SigningRegistry,
    VersionDefaults,
};
pub use version_spec::VersionSpec;
