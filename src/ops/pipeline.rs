//! The resolution pipeline.
//!
//! Runs parse, resolve, validate, graph and emit in order. Stage errors
//! stop the run immediately; constraint violations are collected by the
//! validator and then fail the run as a whole.

use thiserror::Error;

use crate::core::{Manifest, Registries};
use crate::graph::{self, DependencyGraph, GraphError};
use crate::parser::{self, ParseError};
use crate::plan::{self, EmitError, ResolvedPlan};
use crate::resolver::{self, ResolveError};
use crate::util::diagnostic::Diagnostic;
use crate::validate::{self, ValidateOptions, ValidationReport};

/// Options for one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Run every check instead of stopping at the first violation
    pub accumulate: bool,

    /// Treat a debug identity on the release build type as a violation
    pub strict_release_signing: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        PipelineOptions {
            accumulate: true,
            strict_release_signing: false,
        }
    }
}

impl PipelineOptions {
    fn validate_options(&self) -> ValidateOptions {
        ValidateOptions {
            accumulate: self.accumulate,
            strict_release_signing: self.strict_release_signing,
        }
    }
}

/// The single error a pipeline run ends with.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("manifest violates {} constraint(s)", .0.violations.len())]
    ConstraintsViolated(ValidationReport),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Emit(#[from] EmitError),
}

impl PipelineError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            PipelineError::Parse(e) => e.to_diagnostic(),
            PipelineError::Resolve(e) => e.to_diagnostic(),
            PipelineError::ConstraintsViolated(report) => {
                let mut diag = Diagnostic::error(self.to_string());
                for violation in &report.violations {
                    diag = diag.with_context(violation.to_string());
                }
                diag.with_suggestion("Run `droidplan check` for suggested fixes")
            }
            PipelineError::Graph(e) => e.to_diagnostic(),
            PipelineError::Emit(e) => e.to_diagnostic(),
        }
    }
}

/// Parse and resolve manifest text.
pub fn load_manifest(raw: &str, registries: &Registries) -> Result<Manifest, PipelineError> {
    let manifest = parser::parse(raw)?;
    let resolved = resolver::resolve(&manifest, &registries.defaults)?;
    tracing::debug!(
        "resolved manifest with {} plugins and {} dependencies",
        resolved.plugins.len(),
        resolved.dependencies.len()
    );
    Ok(resolved)
}

/// Run the full pipeline and emit a plan.
pub fn resolve_plan(
    raw: &str,
    registries: &Registries,
    options: &PipelineOptions,
) -> Result<ResolvedPlan, PipelineError> {
    let manifest = load_manifest(raw, registries)?;

    let report = validate::validate(
        &manifest,
        &registries.signing,
        &registries.plugins,
        &options.validate_options(),
    );
    if !report.is_ok() {
        return Err(PipelineError::ConstraintsViolated(report));
    }

    let graph = graph::build(&manifest, &registries.plugins)?;
    let plan = plan::emit(&manifest, &graph, &report)?;

    tracing::info!(
        "resolved {} ({} dependencies)",
        plan.application_id,
        plan.dependencies.len()
    );
    Ok(plan)
}

/// Validate a manifest without emitting a plan.
///
/// Violations are returned in the report rather than as an error. When the
/// report is clean the dependency graph is also built, so conflicts and
/// cycles surface here too.
pub fn check_manifest(
    raw: &str,
    registries: &Registries,
    options: &PipelineOptions,
) -> Result<ValidationReport, PipelineError> {
    let manifest = load_manifest(raw, registries)?;

    let report = validate::validate(
        &manifest,
        &registries.signing,
        &registries.plugins,
        &options.validate_options(),
    );
    if report.is_ok() {
        graph::build(&manifest, &registries.plugins)?;
    }

    Ok(report)
}

/// Parse, resolve and build the dependency graph, skipping validation.
pub fn dependency_graph(
    raw: &str,
    registries: &Registries,
) -> Result<DependencyGraph, PipelineError> {
    let manifest = load_manifest(raw, registries)?;
    Ok(graph::build(&manifest, &registries.plugins)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{flutter_registries, ManifestFixture, FLUTTER_APP_MANIFEST};
    use crate::validate::ConstraintCode;

    #[test]
    fn test_resolve_flutter_app() {
        let plan = resolve_plan(
            FLUTTER_APP_MANIFEST,
            &flutter_registries(),
            &PipelineOptions::default(),
        )
        .unwrap();

        assert_eq!(plan.application_id, "com.example.sewage");
        assert_eq!(plan.target_sdk, 34);
        assert_eq!(plan.dependencies.len(), 2);
    }

    #[test]
    fn test_parse_error_short_circuits() {
        let err = resolve_plan(
            "android {\n    namespace = \n}\n",
            &flutter_registries(),
            &PipelineOptions::default(),
        )
        .unwrap_err();

        assert!(matches!(err, PipelineError::Parse(ParseError::Syntax { .. })));
    }

    #[test]
    fn test_unknown_default_short_circuits() {
        let err = resolve_plan(
            FLUTTER_APP_MANIFEST,
            &Registries::new(),
            &PipelineOptions::default(),
        )
        .unwrap_err();

        match err {
            PipelineError::Resolve(ResolveError::UnknownDefault { key, .. }) => {
                assert_eq!(key, "flutter.compileSdkVersion")
            }
            other => panic!("expected unknown default, got {:?}", other),
        }
    }

    #[test]
    fn test_violations_are_accumulated() {
        let raw = ManifestFixture::new()
            .source_compat("JavaVersion.VERSION_17")
            .target_compat("JavaVersion.VERSION_11")
            .dependency("coreLibraryDesugaring(\"com.android.tools:desugar_jdk_libs:2.0.4\")")
            .render();

        let err = resolve_plan(&raw, &flutter_registries(), &PipelineOptions::default())
            .unwrap_err();
        match &err {
            PipelineError::ConstraintsViolated(report) => {
                let codes: Vec<_> = report.violations.iter().map(|v| v.code).collect();
                assert_eq!(
                    codes,
                    vec![
                        ConstraintCode::LanguageLevelOrder,
                        ConstraintCode::DesugaringRequired
                    ]
                );
            }
            other => panic!("expected violations, got {:?}", other),
        }

        let output = err.to_diagnostic().format(false);
        assert!(output.contains("manifest violates 2 constraint(s)"));
        assert!(output.contains("[desugaring-required]"));
    }

    #[test]
    fn test_graph_error_after_validation() {
        let raw = ManifestFixture::new()
            .dependency("implementation(\"org.jetbrains.kotlin:kotlin-stdlib:1.9.22\")")
            .dependency("implementation(\"org.jetbrains.kotlin:kotlin-stdlib:1.9.0\")")
            .render();

        let err = resolve_plan(&raw, &flutter_registries(), &PipelineOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Graph(GraphError::VersionConflict { .. })
        ));
    }

    #[test]
    fn test_check_manifest_returns_report() {
        let raw = ManifestFixture::new().release_signing("production").render();
        let options = PipelineOptions {
            accumulate: false,
            ..Default::default()
        };

        let report = check_manifest(&raw, &flutter_registries(), &options).unwrap();
        assert!(!report.is_ok());
        assert_eq!(report.violations[0].code, ConstraintCode::SigningConfig);
    }

    #[test]
    fn test_strict_signing_fails_pipeline() {
        let options = PipelineOptions {
            strict_release_signing: true,
            ..Default::default()
        };

        let err = resolve_plan(FLUTTER_APP_MANIFEST, &flutter_registries(), &options)
            .unwrap_err();
        assert!(matches!(err, PipelineError::ConstraintsViolated(_)));
    }

    #[test]
    fn test_dependency_graph_skips_validation() {
        // Desugaring disabled would fail validation, but the graph still builds.
        let raw = ManifestFixture::new()
            .dependency("coreLibraryDesugaring(\"com.android.tools:desugar_jdk_libs:2.0.4\")")
            .render();

        let graph = dependency_graph(&raw, &flutter_registries()).unwrap();
        assert_eq!(graph.len(), 1);
    }
}
