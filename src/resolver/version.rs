//! Lenient handling of the version strings found in build scripts.
//!
//! Plugin and library versions in Gradle scripts are frequently not strict
//! semver (`1.9`, `8.1.0-rc02`, `2.0.4.1`), so comparisons go through a
//! lenient conversion first.

use semver::{Version, VersionReq};

/// Parse a version string, allowing for incomplete or over-long versions.
///
/// Missing minor/patch components are zero; a fourth numeric component is
/// dropped; a leading `v` is ignored.
pub fn parse_version_lenient(s: &str) -> Option<Version> {
    let s = s.trim();
    let s = s.strip_prefix('v').unwrap_or(s);

    if let Ok(v) = s.parse() {
        return Some(v);
    }

    let (core, pre) = match s.split_once('-') {
        Some((core, pre)) => (core, Some(pre)),
        None => (s, None),
    };

    let mut numbers = core.split('.').map(|part| part.parse::<u64>());
    let major = numbers.next()?.ok()?;
    let minor = numbers.next().transpose().ok()?.unwrap_or(0);
    let patch = numbers.next().transpose().ok()?.unwrap_or(0);

    // Anything beyond a numeric fourth component is not a version.
    if let Some(extra) = numbers.next() {
        extra.ok()?;
        if numbers.next().is_some() {
            return None;
        }
    }

    let mut version = Version::new(major, minor, patch);
    if let Some(pre) = pre {
        version.pre = semver::Prerelease::new(pre).ok()?;
    }
    Some(version)
}

/// Check a version string against a requirement.
///
/// Returns `None` when the string cannot be read as a version at all.
pub fn satisfies(req: &VersionReq, version: &str) -> Option<bool> {
    parse_version_lenient(version).map(|v| req.matches(&v))
}
