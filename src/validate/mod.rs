//! Cross-field constraint validation.
//!
//! Checks run in a fixed order against a resolved manifest. By default the
//! validator stops at the first failing check; with
//! [`ValidateOptions::accumulate`] every check runs and every violation is
//! collected.

pub mod report;

pub use report::{CheckOutcome, ConstraintCode, ConstraintViolation, ValidationReport};

use crate::core::{
    DependencyKind, Manifest, PluginCatalog, SigningRegistry, VersionSpec, RELEASE_BUILD_TYPE,
};
use crate::resolver::version::satisfies;

/// Knobs for a validation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidateOptions {
    /// Run every check instead of stopping at the first violation
    pub accumulate: bool,

    /// Treat a debug identity on the release build type as a violation
    pub strict_release_signing: bool,
}

impl ValidateOptions {
    /// Options that run every check.
    pub fn accumulating() -> Self {
        ValidateOptions {
            accumulate: true,
            ..Default::default()
        }
    }
}

/// Validate a resolved manifest.
pub fn validate(
    manifest: &Manifest,
    signing: &SigningRegistry,
    catalog: &PluginCatalog,
    options: &ValidateOptions,
) -> ValidationReport {
    Validator {
        manifest,
        signing,
        catalog,
        options,
    }
    .run()
}

struct Validator<'a> {
    manifest: &'a Manifest,
    signing: &'a SigningRegistry,
    catalog: &'a PluginCatalog,
    options: &'a ValidateOptions,
}

impl Validator<'_> {
    fn run(&self) -> ValidationReport {
        let mut report = ValidationReport::new();

        for code in ConstraintCode::ALL {
            let mut findings = self.check(code);

            if code == ConstraintCode::DebugSigningRelease && !self.options.strict_release_signing {
                for warning in findings.drain(..) {
                    tracing::debug!("{}", warning.message);
                    report.warn(warning);
                }
            }

            let failed = !findings.is_empty();
            tracing::debug!(
                "check {}: {}",
                code,
                if failed { "violated" } else { "passed" }
            );
            report.record(code, findings);

            if failed && !self.options.accumulate {
                tracing::debug!("stopping after first violation");
                break;
            }
        }

        report
    }

    fn check(&self, code: ConstraintCode) -> Vec<ConstraintViolation> {
        match code {
            ConstraintCode::LanguageLevelOrder => self.language_level_order(),
            ConstraintCode::SdkOrder => self.sdk_order(),
            ConstraintCode::DesugaringRequired => self.desugaring_required(),
            ConstraintCode::DesugaringLibrary => self.desugaring_library(),
            ConstraintCode::SigningConfig => self.signing_config(),
            ConstraintCode::JvmTarget => self.jvm_target(),
            ConstraintCode::PluginVersion => self.plugin_version(),
            ConstraintCode::DebugSigningRelease => self.debug_signing_release(),
        }
    }

    fn language_level_order(&self) -> Vec<ConstraintViolation> {
        let android = &self.manifest.android;
        if android.source_compatibility <= android.target_compatibility {
            return Vec::new();
        }

        vec![ConstraintViolation::new(
            ConstraintCode::LanguageLevelOrder,
            format!(
                "sourceCompatibility {} is newer than targetCompatibility {}",
                android.source_compatibility, android.target_compatibility
            ),
        )]
    }

    fn sdk_order(&self) -> Vec<ConstraintViolation> {
        let android = &self.manifest.android;
        let mut violations = Vec::new();

        let mut level = |name: &str, spec: &VersionSpec| -> Option<u32> {
            let value = spec.as_int();
            if value.is_none() {
                let message = match spec {
                    VersionSpec::Symbolic(key) => {
                        format!("{} is unresolved (references `{}`)", name, key)
                    }
                    VersionSpec::Literal(raw) => {
                        format!("{} `{}` is not an API level", name, raw)
                    }
                };
                violations.push(ConstraintViolation::new(ConstraintCode::SdkOrder, message));
            }
            value
        };

        let min = level("minSdk", &android.min_sdk);
        let target = level("targetSdk", &android.target_sdk);
        let compile = level("compileSdk", &android.compile_sdk);

        if let (Some(min), Some(target)) = (min, target) {
            if min > target {
                violations.push(ConstraintViolation::new(
                    ConstraintCode::SdkOrder,
                    format!("minSdk {} is above targetSdk {}", min, target),
                ));
            }
        }
        if let (Some(target), Some(compile)) = (target, compile) {
            if target > compile {
                violations.push(ConstraintViolation::new(
                    ConstraintCode::SdkOrder,
                    format!("targetSdk {} is above compileSdk {}", target, compile),
                ));
            }
        }

        violations
    }

    /// Why desugaring is needed, one entry per reason.
    fn desugaring_reasons(&self) -> Vec<String> {
        let mut reasons: Vec<String> = self
            .manifest
            .dependencies_of(DependencyKind::Desugaring)
            .map(|dep| format!("dependency `{}`", dep.coordinate))
            .collect();

        for (plugin, meta) in self.catalog.applied(self.manifest) {
            if meta.requires_desugaring {
                reasons.push(format!("plugin `{}`", plugin.id));
            }
            for implied in &meta.implies {
                if implied.kind == DependencyKind::Desugaring && implied.version.is_some() {
                    reasons.push(format!(
                        "`{}` implied by plugin `{}`",
                        implied.coordinate, plugin.id
                    ));
                }
            }
        }

        reasons
    }

    fn has_desugaring_library(&self) -> bool {
        self.manifest
            .dependencies_of(DependencyKind::Desugaring)
            .next()
            .is_some()
            || self.catalog.applied(self.manifest).any(|(_, meta)| {
                meta.implies.iter().any(|implied| {
                    implied.kind == DependencyKind::Desugaring && implied.version.is_some()
                })
            })
    }

    fn desugaring_required(&self) -> Vec<ConstraintViolation> {
        if self.manifest.android.desugaring_enabled {
            return Vec::new();
        }

        let reasons = self.desugaring_reasons();
        if reasons.is_empty() {
            return Vec::new();
        }

        vec![ConstraintViolation::new(
            ConstraintCode::DesugaringRequired,
            format!(
                "core library desugaring is disabled but required by {}",
                reasons.join(", ")
            ),
        )]
    }

    fn desugaring_library(&self) -> Vec<ConstraintViolation> {
        if !self.manifest.android.desugaring_enabled || self.has_desugaring_library() {
            return Vec::new();
        }

        vec![ConstraintViolation::new(
            ConstraintCode::DesugaringLibrary,
            "core library desugaring is enabled but no coreLibraryDesugaring dependency is declared",
        )]
    }

    fn signing_config(&self) -> Vec<ConstraintViolation> {
        let mut violations = Vec::new();

        for build_type in &self.manifest.android.build_types {
            let Some(name) = &build_type.signing_config else {
                continue;
            };

            match self.signing.get(name) {
                None => {
                    let known: Vec<&str> = self.signing.names().collect();
                    let known = if known.is_empty() {
                        "none registered".to_string()
                    } else {
                        format!("known: {}", known.join(", "))
                    };
                    violations.push(ConstraintViolation::new(
                        ConstraintCode::SigningConfig,
                        format!(
                            "build type `{}` uses unknown signing config `{}` ({})",
                            build_type.name, name, known
                        ),
                    ));
                }
                Some(config) if !config.valid => {
                    violations.push(ConstraintViolation::new(
                        ConstraintCode::SigningConfig,
                        format!(
                            "signing config `{}` used by build type `{}` is not valid",
                            name, build_type.name
                        ),
                    ));
                }
                Some(_) => {}
            }
        }

        violations
    }

    fn jvm_target(&self) -> Vec<ConstraintViolation> {
        let android = &self.manifest.android;
        match android.jvm_target {
            Some(jvm) if jvm != android.target_compatibility => {
                vec![ConstraintViolation::new(
                    ConstraintCode::JvmTarget,
                    format!(
                        "kotlinOptions.jvmTarget {} does not match targetCompatibility {}",
                        jvm, android.target_compatibility
                    ),
                )]
            }
            _ => Vec::new(),
        }
    }

    fn plugin_version(&self) -> Vec<ConstraintViolation> {
        let mut violations = Vec::new();

        for plugin in &self.manifest.plugins {
            let Some(version) = &plugin.version else {
                continue;
            };
            let Some(req) = self
                .catalog
                .get(&plugin.id)
                .and_then(|meta| meta.supported_versions.as_ref())
            else {
                continue;
            };

            let message = match satisfies(req, version) {
                Some(true) => continue,
                Some(false) => format!(
                    "plugin `{}` version {} is outside the supported range `{}`",
                    plugin.id, version, req
                ),
                None => format!(
                    "plugin `{}` version `{}` is not a valid version",
                    plugin.id, version
                ),
            };
            violations.push(ConstraintViolation::new(ConstraintCode::PluginVersion, message));
        }

        violations
    }

    fn debug_signing_release(&self) -> Vec<ConstraintViolation> {
        let Some(name) = self.manifest.android.signing_config_ref() else {
            return Vec::new();
        };

        match self.signing.get(name) {
            Some(config) if config.debug => vec![ConstraintViolation::new(
                ConstraintCode::DebugSigningRelease,
                format!(
                    "build type `{}` is signed with debug identity `{}`",
                    RELEASE_BUILD_TYPE, name
                ),
            )],
            _ => Vec::new(),
        }
    }
}
