//! Plan emission.
//!
//! A [`ResolvedPlan`] is the flat, fully literal output of a resolution
//! run: SDK levels as integers, dependencies in dependency-first order with
//! their edges, and the validation evidence the plan was accepted on. It can
//! be written out as JSON or as canonical manifest text.

pub mod errors;
mod render;

pub use errors::EmitError;

use serde::Serialize;

use crate::core::{
    BuildType, DependencyKind, FlutterConfig, LanguageLevel, Manifest, PluginRef, VersionSpec,
};
use crate::graph::DependencyGraph;
use crate::util::hash;
use crate::validate::{CheckOutcome, ConstraintViolation, ValidationReport};

use self::render::ManifestText;

/// A dependency as it appears in the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedDependency {
    pub coordinate: String,
    pub kind: DependencyKind,
    pub version: String,
    /// Coordinates this dependency requires, sorted
    pub requires: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implied_by: Option<String>,
}

/// The validated, fully literal build plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPlan {
    pub namespace: String,
    pub application_id: String,
    pub compile_sdk: u32,
    pub min_sdk: u32,
    pub target_sdk: u32,
    pub ndk_version: Option<String>,
    pub version_code: Option<u32>,
    pub version_name: Option<String>,
    pub source_compatibility: LanguageLevel,
    pub target_compatibility: LanguageLevel,
    pub jvm_target: Option<LanguageLevel>,
    pub desugaring_enabled: bool,
    pub plugins: Vec<PluginRef>,
    pub build_types: Vec<BuildType>,
    pub flutter: Option<FlutterConfig>,
    pub dependencies: Vec<PlannedDependency>,

    /// Every check that ran and whether it passed
    pub checks: Vec<CheckOutcome>,
    pub warnings: Vec<ConstraintViolation>,

    /// SHA-256 of the canonical manifest text
    pub fingerprint: String,
}

impl ResolvedPlan {
    /// Render the plan as canonical manifest text.
    pub fn to_manifest_string(&self) -> String {
        ManifestText(self).to_string()
    }

    /// Render the plan as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Dependencies of one kind, in plan order.
    pub fn dependencies_of(&self, kind: DependencyKind) -> impl Iterator<Item = &PlannedDependency> {
        self.dependencies.iter().filter(move |d| d.kind == kind)
    }
}

/// Emit the plan for a validated manifest.
///
/// `manifest` must be resolved, `report` must carry no violations and
/// `graph` must have been built from the same manifest.
pub fn emit(
    manifest: &Manifest,
    graph: &DependencyGraph,
    report: &ValidationReport,
) -> Result<ResolvedPlan, EmitError> {
    if !report.is_ok() {
        return Err(EmitError::IncompletePlan {
            violations: report.violations.clone(),
        });
    }

    let android = &manifest.android;

    let dependencies = graph
        .topological_order()
        .into_iter()
        .map(|node| PlannedDependency {
            coordinate: node.coordinate.clone(),
            kind: node.kind,
            version: node.version.clone(),
            requires: graph
                .requires(&node.coordinate)
                .into_iter()
                .map(str::to_string)
                .collect(),
            implied_by: node.implied_by.clone(),
        })
        .collect();

    let mut plan = ResolvedPlan {
        namespace: android.namespace.clone(),
        application_id: android.application_id.clone(),
        compile_sdk: integer(&android.compile_sdk, "android.compileSdk")?,
        min_sdk: integer(&android.min_sdk, "android.defaultConfig.minSdk")?,
        target_sdk: integer(&android.target_sdk, "android.defaultConfig.targetSdk")?,
        ndk_version: android
            .ndk_version
            .as_ref()
            .map(|spec| literal(spec, "android.ndkVersion"))
            .transpose()?,
        version_code: android
            .version_code
            .as_ref()
            .map(|spec| integer(spec, "android.defaultConfig.versionCode"))
            .transpose()?,
        version_name: android
            .version_name
            .as_ref()
            .map(|spec| literal(spec, "android.defaultConfig.versionName"))
            .transpose()?,
        source_compatibility: android.source_compatibility,
        target_compatibility: android.target_compatibility,
        jvm_target: android.jvm_target,
        desugaring_enabled: android.desugaring_enabled,
        plugins: manifest.plugins.clone(),
        build_types: android.build_types.clone(),
        flutter: manifest.flutter.clone(),
        dependencies,
        checks: report.checks.clone(),
        warnings: report.warnings.clone(),
        fingerprint: String::new(),
    };

    plan.fingerprint = hash::sha256_str(&plan.to_manifest_string());
    tracing::debug!(
        "emitted plan with {} dependencies ({})",
        plan.dependencies.len(),
        hash::short(&plan.fingerprint)
    );

    Ok(plan)
}

fn literal(spec: &VersionSpec, field: &str) -> Result<String, EmitError> {
    spec.as_literal()
        .map(str::to_string)
        .ok_or_else(|| EmitError::Unresolved {
            field: field.to_string(),
            value: spec.to_string(),
        })
}

fn integer(spec: &VersionSpec, field: &str) -> Result<u32, EmitError> {
    spec.as_int().ok_or_else(|| EmitError::Unresolved {
        field: field.to_string(),
        value: spec.to_string(),
    })
}
