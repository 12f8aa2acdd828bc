//! Version resolution.
//!
//! Replaces every symbolic version reference in a manifest with the literal
//! registered for it. The resolver is pure: the defaults registry is passed
//! in and the input manifest is left untouched.

pub mod errors;
pub mod version;

pub use errors::ResolveError;

use crate::core::{Manifest, VersionDefaults, VersionSpec};

/// Resolve every version spec of `manifest`.
///
/// References are resolved in a fixed order (compileSdk, minSdk, targetSdk,
/// ndkVersion, versionCode, versionName, then dependencies in declaration
/// order) so that the first unknown key reported is always the same one.
pub fn resolve(manifest: &Manifest, defaults: &VersionDefaults) -> Result<Manifest, ResolveError> {
    let mut resolved = manifest.clone();
    let android = &mut resolved.android;

    android.compile_sdk = resolve_spec(&android.compile_sdk, "android.compileSdk", defaults)?;
    android.min_sdk = resolve_spec(&android.min_sdk, "android.defaultConfig.minSdk", defaults)?;
    android.target_sdk =
        resolve_spec(&android.target_sdk, "android.defaultConfig.targetSdk", defaults)?;
    android.ndk_version = resolve_opt(&android.ndk_version, "android.ndkVersion", defaults)?;
    android.version_code = resolve_opt(
        &android.version_code,
        "android.defaultConfig.versionCode",
        defaults,
    )?;
    android.version_name = resolve_opt(
        &android.version_name,
        "android.defaultConfig.versionName",
        defaults,
    )?;

    for dependency in &mut resolved.dependencies {
        let field = format!("dependencies.{}", dependency.coordinate);
        dependency.version = resolve_spec(&dependency.version, &field, defaults)?;
    }

    Ok(resolved)
}

/// Resolve a single spec.
pub fn resolve_spec(
    spec: &VersionSpec,
    field: &str,
    defaults: &VersionDefaults,
) -> Result<VersionSpec, ResolveError> {
    let Some(key) = spec.symbolic_key() else {
        return Ok(spec.clone());
    };

    match defaults.get(key) {
        Some(value) => {
            tracing::debug!("resolved {} = {} (from {})", field, value, key);
            Ok(VersionSpec::literal(value))
        }
        None => Err(ResolveError::UnknownDefault {
            key: key.to_string(),
            field: field.to_string(),
            suggestions: similar_keys(key, defaults),
        }),
    }
}

fn resolve_opt(
    spec: &Option<VersionSpec>,
    field: &str,
    defaults: &VersionDefaults,
) -> Result<Option<VersionSpec>, ResolveError> {
    spec.as_ref()
        .map(|s| resolve_spec(s, field, defaults))
        .transpose()
}

/// Registered keys that share a prefix with `key` or contain it.
fn similar_keys(key: &str, defaults: &VersionDefaults) -> Vec<String> {
    let needle = key.to_ascii_lowercase();
    defaults
        .keys()
        .filter(|candidate| {
            let candidate = candidate.to_ascii_lowercase();
            candidate.starts_with(&needle) || needle.starts_with(&candidate) || candidate.contains(&needle)
        })
        .take(3)
        .map(str::to_string)
        .collect()
}
