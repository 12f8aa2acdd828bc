//! droidplan - build-configuration resolution for Android app modules
//!
//! This crate turns a module build script (`build.gradle.kts`) into a
//! fully literal, validated build plan: symbolic versions are resolved
//! against caller-supplied defaults, cross-field constraints are checked,
//! the dependency graph is built and ordered, and the result is emitted as
//! JSON or canonical manifest text.

pub mod core;
pub mod graph;
pub mod ops;
pub mod parser;
pub mod plan;
pub mod resolver;
pub mod util;
pub mod validate;

/// Test utilities for droidplan unit tests.
///
/// This module is only available when compiling with `--cfg test`. It
/// provides manifest fixtures and registries that resolve them.
#[cfg(test)]
pub mod test_support;

pub use core::{Manifest, Registries};
pub use graph::DependencyGraph;
pub use ops::{check_manifest, resolve_plan, PipelineError, PipelineOptions};
pub use plan::ResolvedPlan;
pub use util::context::GlobalContext;
pub use validate::ValidationReport;
