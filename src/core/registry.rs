//! Caller-supplied registries.
//!
//! The pipeline never looks anything up globally: version defaults, signing
//! configurations and plugin metadata are handed in as already-loaded,
//! in-memory values.

use std::collections::BTreeMap;

use semver::VersionReq;
use serde::{Deserialize, Serialize};

use crate::core::manifest::{DependencyKind, Manifest, PluginRef};

/// Symbolic key -> literal version string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionDefaults {
    entries: BTreeMap<String, String>,
}

impl VersionDefaults {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a default.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Look up a default.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Iterate over all keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for VersionDefaults {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        VersionDefaults {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// A named signing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SigningConfig {
    /// Whether the configuration is usable (keystore present, credentials set)
    pub valid: bool,

    /// Whether this is a debug identity
    pub debug: bool,
}

impl Default for SigningConfig {
    fn default() -> Self {
        SigningConfig {
            valid: true,
            debug: false,
        }
    }
}

impl SigningConfig {
    /// A valid debug signing identity.
    pub fn debug() -> Self {
        SigningConfig {
            valid: true,
            debug: true,
        }
    }

    /// A valid release signing identity.
    pub fn release() -> Self {
        SigningConfig::default()
    }
}

/// Signing configuration name -> configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SigningRegistry {
    configs: BTreeMap<String, SigningConfig>,
}

impl SigningRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry every Android module starts with: a `debug` identity.
    pub fn with_debug() -> Self {
        SigningRegistry::new().with("debug", SigningConfig::debug())
    }

    /// Add or replace a configuration.
    pub fn insert(&mut self, name: impl Into<String>, config: SigningConfig) {
        self.configs.insert(name.into(), config);
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, config: SigningConfig) -> Self {
        self.insert(name, config);
        self
    }

    /// Look up a configuration.
    pub fn get(&self, name: &str) -> Option<&SigningConfig> {
        self.configs.get(name)
    }

    /// Names of all configurations in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.configs.keys().map(String::as_str)
    }
}

/// A dependency a plugin pulls in (or annotates) on the module's behalf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ImpliedDependency {
    pub coordinate: String,

    #[serde(default = "default_kind")]
    pub kind: DependencyKind,

    /// Literal version to pin. Without a version the entry only contributes
    /// `requires` edges to an already-declared coordinate.
    #[serde(default)]
    pub version: Option<String>,

    /// Coordinates this dependency requires
    #[serde(default)]
    pub requires: Vec<String>,
}

fn default_kind() -> DependencyKind {
    DependencyKind::Implementation
}

/// What the pipeline knows about a plugin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PluginMetadata {
    /// The plugin needs core library desugaring enabled
    pub requires_desugaring: bool,

    /// Plugin versions known to work
    pub supported_versions: Option<VersionReq>,

    /// Dependencies implied by applying the plugin
    pub implies: Vec<ImpliedDependency>,
}

/// Plugin id -> metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PluginCatalog {
    plugins: BTreeMap<String, PluginMetadata>,
}

impl PluginCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace metadata for a plugin.
    pub fn insert(&mut self, id: impl Into<String>, metadata: PluginMetadata) {
        self.plugins.insert(id.into(), metadata);
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, id: impl Into<String>, metadata: PluginMetadata) -> Self {
        self.insert(id, metadata);
        self
    }

    /// Look up a plugin.
    pub fn get(&self, id: &str) -> Option<&PluginMetadata> {
        self.plugins.get(id)
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Iterate over all plugins in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PluginMetadata)> {
        self.plugins.iter().map(|(id, meta)| (id.as_str(), meta))
    }

    /// Metadata for each plugin the manifest applies, in declaration order.
    ///
    /// Plugins declared with `apply false` and plugins without catalog
    /// entries are skipped.
    pub fn applied<'a>(
        &'a self,
        manifest: &'a Manifest,
    ) -> impl Iterator<Item = (&'a PluginRef, &'a PluginMetadata)> + 'a {
        manifest
            .plugins
            .iter()
            .filter(|p| p.apply)
            .filter_map(move |p| self.get(&p.id).map(|meta| (p, meta)))
    }
}

/// Every registry one resolution run needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registries {
    pub defaults: VersionDefaults,
    pub signing: SigningRegistry,
    pub plugins: PluginCatalog,
}

impl Registries {
    /// Registries with no defaults, no plugin metadata and a debug signing identity.
    pub fn new() -> Self {
        Registries {
            defaults: VersionDefaults::new(),
            signing: SigningRegistry::with_debug(),
            plugins: PluginCatalog::new(),
        }
    }

    /// Replace the version defaults.
    pub fn with_version_defaults(mut self, defaults: VersionDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Replace the signing registry.
    pub fn with_signing(mut self, signing: SigningRegistry) -> Self {
        self.signing = signing;
        self
    }

    /// Replace the plugin catalog.
    pub fn with_plugins(mut self, plugins: PluginCatalog) -> Self {
        self.plugins = plugins;
        self
    }
}

impl Default for Registries {
    fn default() -> Self {
        Self::new()
    }
}
