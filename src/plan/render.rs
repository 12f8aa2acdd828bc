//! Canonical manifest text for a plan.
//!
//! The output is valid input for the parser: re-parsing it yields a manifest
//! with the same literal values, dependencies and edges.

use std::fmt::{self, Write};

use crate::core::DependencyKind;
use crate::plan::ResolvedPlan;

const INDENT: &str = "    ";

/// Display adapter that renders a plan as manifest text.
pub(crate) struct ManifestText<'a>(pub &'a ResolvedPlan);

impl fmt::Display for ManifestText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plan = self.0;

        writeln!(f, "plugins {{")?;
        for plugin in &plan.plugins {
            write!(f, "{}id({})", INDENT, quote(&plugin.id))?;
            if let Some(version) = &plugin.version {
                write!(f, " version {}", quote(version))?;
            }
            if !plugin.apply {
                f.write_str(" apply false")?;
            }
            f.write_char('\n')?;
        }
        writeln!(f, "}}")?;

        writeln!(f)?;
        render_android(f, plan)?;

        if let Some(flutter) = &plan.flutter {
            writeln!(f)?;
            writeln!(f, "flutter {{")?;
            writeln!(f, "{}source = {}", INDENT, quote(&flutter.source))?;
            writeln!(f, "}}")?;
        }

        writeln!(f)?;
        writeln!(f, "dependencies {{")?;
        for dep in &plan.dependencies {
            let configuration = match dep.kind {
                DependencyKind::Implementation => "implementation",
                DependencyKind::Desugaring => "coreLibraryDesugaring",
            };
            write!(
                f,
                "{}{}({})",
                INDENT,
                configuration,
                quote(&format!("{}:{}", dep.coordinate, dep.version))
            )?;
            if dep.requires.is_empty() {
                f.write_char('\n')?;
            } else {
                writeln!(f, " {{")?;
                for required in &dep.requires {
                    writeln!(f, "{0}{0}requires({1})", INDENT, quote(required))?;
                }
                writeln!(f, "{}}}", INDENT)?;
            }
        }
        writeln!(f, "}}")
    }
}

fn render_android(f: &mut fmt::Formatter<'_>, plan: &ResolvedPlan) -> fmt::Result {
    let i1 = INDENT;
    let i2 = INDENT.repeat(2);
    let i3 = INDENT.repeat(3);

    writeln!(f, "android {{")?;
    writeln!(f, "{}namespace = {}", i1, quote(&plan.namespace))?;
    writeln!(f, "{}compileSdk = {}", i1, plan.compile_sdk)?;
    if let Some(ndk) = &plan.ndk_version {
        writeln!(f, "{}ndkVersion = {}", i1, quote(ndk))?;
    }

    writeln!(f)?;
    writeln!(f, "{}defaultConfig {{", i1)?;
    writeln!(f, "{}applicationId = {}", i2, quote(&plan.application_id))?;
    writeln!(f, "{}minSdk = {}", i2, plan.min_sdk)?;
    writeln!(f, "{}targetSdk = {}", i2, plan.target_sdk)?;
    if let Some(code) = plan.version_code {
        writeln!(f, "{}versionCode = {}", i2, code)?;
    }
    if let Some(name) = &plan.version_name {
        writeln!(f, "{}versionName = {}", i2, quote(name))?;
    }
    writeln!(f, "{}}}", i1)?;

    writeln!(f)?;
    writeln!(f, "{}compileOptions {{", i1)?;
    writeln!(
        f,
        "{}sourceCompatibility = JavaVersion.{}",
        i2,
        plan.source_compatibility.as_gradle_constant()
    )?;
    writeln!(
        f,
        "{}targetCompatibility = JavaVersion.{}",
        i2,
        plan.target_compatibility.as_gradle_constant()
    )?;
    writeln!(
        f,
        "{}isCoreLibraryDesugaringEnabled = {}",
        i2, plan.desugaring_enabled
    )?;
    writeln!(f, "{}}}", i1)?;

    if let Some(jvm) = plan.jvm_target {
        writeln!(f)?;
        writeln!(f, "{}kotlinOptions {{", i1)?;
        writeln!(f, "{}jvmTarget = {}", i2, quote(&jvm.to_string()))?;
        writeln!(f, "{}}}", i1)?;
    }

    writeln!(f)?;
    writeln!(f, "{}buildTypes {{", i1)?;
    for build_type in &plan.build_types {
        let accessor = match build_type.name.as_str() {
            "release" | "debug" => "getByName",
            _ => "create",
        };
        writeln!(f, "{}{}({}) {{", i2, accessor, quote(&build_type.name))?;
        if let Some(signing) = &build_type.signing_config {
            writeln!(
                f,
                "{}signingConfig = signingConfigs.getByName({})",
                i3,
                quote(signing)
            )?;
        }
        if let Some(minify) = build_type.minify_enabled {
            writeln!(f, "{}isMinifyEnabled = {}", i3, minify)?;
        }
        writeln!(f, "{}}}", i2)?;
    }
    writeln!(f, "{}}}", i1)?;

    writeln!(f, "}}")
}

/// Quote a string literal, escaping what the lexer unescapes.
fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}
