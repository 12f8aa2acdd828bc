//! Configuration file support for droidplan.
//!
//! droidplan supports two configuration file locations:
//! - Global: `~/.droidplan/config.toml` - User-wide registries
//! - Project: `.droidplan/config.toml` - Next to the manifest
//!
//! Project config takes precedence over global config. An explicit
//! `--config` file replaces both.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::{
    PluginCatalog, PluginMetadata, Registries, SigningConfig, SigningRegistry, VersionDefaults,
};
use crate::ops::PipelineOptions;

/// Name of the per-user and per-project config directory.
pub const CONFIG_DIR_NAME: &str = ".droidplan";

/// Name of the config file inside [`CONFIG_DIR_NAME`].
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// droidplan configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Symbolic version defaults (`"flutter.compileSdkVersion" = "34"`)
    pub defaults: VersionDefaults,

    /// Signing configurations by name
    pub signing: SigningRegistry,

    /// Plugin metadata by plugin id
    pub plugins: PluginCatalog,

    /// Validation settings
    pub validate: ValidateConfig,

    /// Output settings
    pub output: OutputConfig,
}

/// Validation-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ValidateConfig {
    /// Report every violation (default) rather than the first one
    pub accumulate: Option<bool>,

    /// Fail when release is signed with a debug identity
    pub strict_release_signing: Option<bool>,
}

/// Output-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default format for `droidplan resolve`
    pub format: Option<OutputFormat>,
}

/// How a resolved plan is written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Pretty-printed JSON
    #[default]
    Json,
    /// Canonical build script text
    Gradle,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(OutputFormat::Json),
            "gradle" | "kts" => Ok(OutputFormat::Gradle),
            _ => Err(format!(
                "unknown output format '{}', valid values: json, gradle",
                s
            )),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Gradle => write!(f, "gradle"),
        }
    }
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    ///
    /// Registries merge entry by entry; a plugin or signing config defined
    /// in both is taken whole from `other`.
    pub fn merge(&mut self, other: Config) {
        for key in other.defaults.keys() {
            if let Some(value) = other.defaults.get(key) {
                self.defaults.insert(key, value);
            }
        }
        for name in other.signing.names() {
            if let Some(config) = other.signing.get(name) {
                self.signing.insert(name, *config);
            }
        }
        for (id, metadata) in other.plugins.iter() {
            self.plugins.insert(id, metadata.clone());
        }

        if other.validate.accumulate.is_some() {
            self.validate.accumulate = other.validate.accumulate;
        }
        if other.validate.strict_release_signing.is_some() {
            self.validate.strict_release_signing = other.validate.strict_release_signing;
        }
        if other.output.format.is_some() {
            self.output.format = other.output.format;
        }
    }

    /// The registries a pipeline run uses.
    ///
    /// Every run knows the `debug` signing identity; a config can still
    /// redefine it.
    pub fn registries(&self) -> Registries {
        let mut signing = SigningRegistry::with_debug();
        for name in self.signing.names() {
            if let Some(config) = self.signing.get(name) {
                signing.insert(name, *config);
            }
        }

        Registries::new()
            .with_version_defaults(self.defaults.clone())
            .with_signing(signing)
            .with_plugins(self.plugins.clone())
    }

    /// Pipeline options from the `[validate]` table.
    pub fn pipeline_options(&self) -> PipelineOptions {
        let defaults = PipelineOptions::default();
        PipelineOptions {
            accumulate: self.validate.accumulate.unwrap_or(defaults.accumulate),
            strict_release_signing: self
                .validate
                .strict_release_signing
                .unwrap_or(defaults.strict_release_signing),
        }
    }

    /// Output format from the `[output]` table.
    pub fn output_format(&self) -> OutputFormat {
        self.output.format.unwrap_or_default()
    }

    /// Add or replace a signing configuration.
    pub fn with_signing(mut self, name: &str, config: SigningConfig) -> Self {
        self.signing.insert(name, config);
        self
    }

    /// Add or replace plugin metadata.
    pub fn with_plugin(mut self, id: &str, metadata: PluginMetadata) -> Self {
        self.plugins.insert(id, metadata);
        self
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.droidplan/config.toml)
/// 2. Global config (~/.droidplan/config.toml)
/// 3. Defaults
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    // Load global config first
    if global_path.exists() {
        tracing::debug!("loading global config from {}", global_path.display());
        config.merge(Config::load_or_default(global_path));
    }

    // Project config overrides global
    if project_path.exists() {
        tracing::debug!("loading project config from {}", project_path.display());
        config.merge(Config::load_or_default(project_path));
    }

    config
}

/// Get the global droidplan config directory (~/.droidplan).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(CONFIG_DIR_NAME))
}

/// Get the project config path (.droidplan/config.toml) for a manifest directory.
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME)
}
