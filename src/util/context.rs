//! Global context for droidplan operations.
//!
//! Provides centralized access to the working directory, configuration
//! paths and output settings.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use crate::util::config::{self, Config};

/// File name of the module build script.
pub const MANIFEST_FILE_NAME: &str = "build.gradle.kts";

/// Groovy build script name; recognised only to give a better error.
const GROOVY_MANIFEST_FILE_NAME: &str = "build.gradle";

/// Error locating the manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("could not find build.gradle.kts in {} or any parent directory", .dir.display())]
    NotFound { dir: PathBuf },

    #[error("{} is a Groovy build script; only build.gradle.kts is supported", .path.display())]
    GroovyScript { path: PathBuf },
}

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Directory holding the global config (~/.droidplan/)
    home: PathBuf,

    /// Whether to use verbose output
    verbose: bool,

    /// Whether to use colors in output
    color: bool,
}

impl GlobalContext {
    /// Create a new GlobalContext with defaults.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        let home = config::global_config_dir()
            .unwrap_or_else(|| PathBuf::from(config::CONFIG_DIR_NAME));

        Ok(GlobalContext {
            cwd,
            home,
            verbose: false,
            color: true,
        })
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Result<Self> {
        let mut ctx = Self::new()?;
        ctx.cwd = cwd;
        Ok(ctx)
    }

    /// Use a different global config directory.
    pub fn with_home(mut self, home: PathBuf) -> Self {
        self.home = home;
        self
    }

    /// Set verbose mode.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Set color output.
    pub fn set_color(&mut self, color: bool) {
        self.color = color;
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Get the global config directory (~/.droidplan/).
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Get the global configuration file path.
    pub fn config_path(&self) -> PathBuf {
        self.home.join(config::CONFIG_FILE_NAME)
    }

    /// Check if verbose mode is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Check if color output is enabled.
    pub fn color(&self) -> bool {
        self.color
    }

    /// Resolve a manifest path: an explicit path relative to cwd, or
    /// `build.gradle.kts` found by searching upward from cwd.
    pub fn manifest_path(&self, explicit: Option<&Path>) -> Result<PathBuf> {
        match explicit {
            Some(path) => Ok(self.cwd.join(path)),
            None => Ok(self.find_manifest()?),
        }
    }

    /// Find `build.gradle.kts` starting from cwd and searching upward.
    ///
    /// A directory holding only a Groovy `build.gradle` stops the search
    /// with an error.
    pub fn find_manifest(&self) -> Result<PathBuf, ManifestError> {
        let mut current = self.cwd.clone();
        loop {
            let candidate = current.join(MANIFEST_FILE_NAME);
            if candidate.is_file() {
                return Ok(candidate);
            }

            let groovy = current.join(GROOVY_MANIFEST_FILE_NAME);
            if groovy.is_file() {
                return Err(ManifestError::GroovyScript { path: groovy });
            }

            if !current.pop() {
                return Err(ManifestError::NotFound {
                    dir: self.cwd.clone(),
                });
            }
        }
    }

    /// Load the configuration for a manifest.
    ///
    /// An explicit config file is loaded alone and must parse; otherwise the
    /// global and project configs are merged, skipping unreadable files.
    pub fn load_config(&self, explicit: Option<&Path>, manifest_path: &Path) -> Result<Config> {
        if let Some(path) = explicit {
            let path = self.cwd.join(path);
            tracing::debug!("loading config from {}", path.display());
            return Config::load(&path);
        }

        let project_root = manifest_path.parent().unwrap_or(self.cwd.as_path());
        Ok(config::load_config(
            &self.config_path(),
            &config::project_config_path(project_root),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn context(cwd: &Path, home: &Path) -> GlobalContext {
        GlobalContext::with_cwd(cwd.to_path_buf())
            .unwrap()
            .with_home(home.to_path_buf())
    }

    #[test]
    fn test_find_manifest_in_ancestor() {
        let tmp = TempDir::new().unwrap();
        let manifest = tmp.path().join(MANIFEST_FILE_NAME);
        std::fs::write(&manifest, "plugins {}\n").unwrap();
        let nested = tmp.path().join("src").join("main");
        std::fs::create_dir_all(&nested).unwrap();

        let ctx = context(&nested, tmp.path());
        assert_eq!(ctx.find_manifest().ok(), Some(manifest));
    }

    #[test]
    fn test_find_manifest_groovy() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("build.gradle"), "apply plugin: 'x'\n").unwrap();

        let ctx = context(tmp.path(), tmp.path());
        assert!(matches!(
            ctx.find_manifest().unwrap_err(),
            ManifestError::GroovyScript { .. }
        ));
    }

    #[test]
    fn test_load_config_layers() {
        let tmp = TempDir::new().unwrap();
        let home = tmp.path().join("home");
        let project = tmp.path().join("app");
        std::fs::create_dir_all(&home).unwrap();
        std::fs::create_dir_all(project.join(".droidplan")).unwrap();

        std::fs::write(home.join("config.toml"), "[defaults]\n\"a\" = \"global\"\n").unwrap();
        std::fs::write(
            project.join(".droidplan").join("config.toml"),
            "[defaults]\n\"a\" = \"project\"\n",
        )
        .unwrap();

        let ctx = context(&project, &home);
        let config = ctx
            .load_config(None, &project.join(MANIFEST_FILE_NAME))
            .unwrap();
        assert_eq!(config.defaults.get("a"), Some("project"));
    }

    #[test]
    fn test_explicit_config_must_parse() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("bad.toml"), "not = [valid").unwrap();

        let ctx = context(tmp.path(), tmp.path());
        let result = ctx.load_config(Some(Path::new("bad.toml")), &tmp.path().join("x"));
        assert!(result.is_err());
    }
}
