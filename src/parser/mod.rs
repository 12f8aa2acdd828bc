//! Manifest parsing.
//!
//! Parsing happens in two passes: the text is turned into a generic tree of
//! key/value, key/block and call entries ([`node`]), and the tree is then
//! mapped onto the typed [`Manifest`] ([`schema`]). Both passes are pure.

pub mod errors;
pub mod lexer;
pub mod node;
pub mod schema;

pub use errors::{Location, ParseError};
pub use node::{Block, Node, Value};

use crate::core::Manifest;

/// Parse build script text into a manifest.
pub fn parse(raw: &str) -> Result<Manifest, ParseError> {
    let tree = node::parse_tree(raw)?;
    let manifest = schema::manifest_from_tree(&tree)?;

    tracing::debug!(
        "parsed manifest `{}`: {} plugins, {} dependencies",
        manifest.android.namespace,
        manifest.plugins.len(),
        manifest.dependencies.len()
    );

    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DependencyKind, LanguageLevel, VersionSpec};
    use crate::test_support::{ManifestFixture, FLUTTER_APP_MANIFEST};

    #[test]
    fn test_parse_flutter_app() {
        let manifest = parse(FLUTTER_APP_MANIFEST).unwrap();

        let ids: Vec<_> = manifest.plugins.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "com.android.application",
                "org.jetbrains.kotlin.android",
                "dev.flutter.flutter-gradle-plugin"
            ]
        );

        let android = &manifest.android;
        assert_eq!(android.namespace, "com.example.sewage");
        assert_eq!(android.application_id, "com.example.sewage");
        assert_eq!(
            android.compile_sdk,
            VersionSpec::symbolic("flutter.compileSdkVersion")
        );
        assert_eq!(
            android.ndk_version,
            Some(VersionSpec::symbolic("flutter.ndkVersion"))
        );
        assert_eq!(android.source_compatibility, LanguageLevel::JAVA_17);
        assert_eq!(android.target_compatibility, LanguageLevel::JAVA_17);
        assert_eq!(android.jvm_target, Some(LanguageLevel::JAVA_17));
        assert!(android.desugaring_enabled);
        assert_eq!(android.signing_config_ref(), Some("debug"));

        assert_eq!(manifest.flutter.as_ref().unwrap().source, "../..");

        assert_eq!(manifest.dependencies.len(), 2);
        let desugar = &manifest.dependencies[1];
        assert_eq!(desugar.kind, DependencyKind::Desugaring);
        assert_eq!(desugar.coordinate, "com.android.tools:desugar_jdk_libs");
        assert_eq!(desugar.version, VersionSpec::literal("2.0.4"));
    }

    #[test]
    fn test_parse_literal_and_inherit_forms() {
        let raw = ManifestFixture::new()
            .compile_sdk("\"inherit:flutter.compileSdkVersion\"")
            .min_sdk("21")
            .target_sdk("\"34\"")
            .render();

        let manifest = parse(&raw).unwrap();
        assert_eq!(
            manifest.android.compile_sdk,
            VersionSpec::symbolic("flutter.compileSdkVersion")
        );
        assert_eq!(manifest.android.min_sdk, VersionSpec::literal("21"));
        assert_eq!(manifest.android.target_sdk, VersionSpec::literal("34"));
    }

    #[test]
    fn test_missing_namespace_is_schema_error() {
        let raw = ManifestFixture::new().without_namespace().render();

        match parse(&raw).unwrap_err() {
            ParseError::Schema { field, .. } => assert_eq!(field, "android.namespace"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_missing_application_id_is_schema_error() {
        let raw = ManifestFixture::new().without_application_id().render();

        match parse(&raw).unwrap_err() {
            ParseError::Schema { field, location, .. } => {
                assert_eq!(field, "android.defaultConfig.applicationId");
                assert!(location.is_some());
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_missing_android_block() {
        let err = parse("plugins {\n    id(\"com.android.application\")\n}\n").unwrap_err();
        assert!(matches!(err, ParseError::Schema { ref field, .. } if field == "android"));
    }

    #[test]
    fn test_duplicate_plugin_rejected() {
        let raw = ManifestFixture::new()
            .plugin("id(\"com.android.application\")")
            .plugin("id(\"com.android.application\")")
            .render();

        let err = parse(&raw).unwrap_err();
        assert!(err.to_string().contains("declared more than once"));
    }

    #[test]
    fn test_unknown_configuration_rejected() {
        let raw = ManifestFixture::new()
            .dependency("testImplementation(\"junit:junit:4.13.2\")")
            .render();

        match parse(&raw).unwrap_err() {
            ParseError::Schema { field, .. } => {
                assert_eq!(field, "dependencies.testImplementation")
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_syntax_error_has_locator() {
        let err = parse("android {\n    namespace = \"x\"\n    compileSdk 34\n}\n").unwrap_err();

        match err {
            ParseError::Syntax { line, column, .. } => {
                assert_eq!(line, 3);
                assert_eq!(column, 16);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_dependency_requires_block() {
        let raw = ManifestFixture::new()
            .dependency(
                "implementation(\"com.example:app-core:1.0.0\") {\n        requires(\"com.example:app-util\")\n    }",
            )
            .dependency("implementation(\"com.example:app-util:1.0.0\")")
            .render();

        let manifest = parse(&raw).unwrap();
        let core = manifest
            .dependencies
            .iter()
            .find(|d| d.coordinate == "com.example:app-core")
            .unwrap();
        assert_eq!(core.requires, vec!["com.example:app-util".to_string()]);
    }

    #[test]
    fn test_kotlin_plugin_shorthand_and_version() {
        let raw = ManifestFixture::new()
            .no_default_plugins()
            .plugin("kotlin(\"android\") version \"1.9.22\" apply false")
            .render();

        let manifest = parse(&raw).unwrap();
        let plugin = manifest.plugin("org.jetbrains.kotlin.android").unwrap();
        assert_eq!(plugin.version.as_deref(), Some("1.9.22"));
        assert!(!plugin.apply);
    }

    #[test]
    fn test_missing_release_signing_is_schema_error() {
        let raw = ManifestFixture::new().without_release_signing().render();

        match parse(&raw).unwrap_err() {
            ParseError::Schema { field, location, .. } => {
                assert_eq!(field, "android.buildTypes.release.signingConfig");
                assert!(location.is_some());
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_repeated_dependencies_blocks_accumulate() {
        let mut raw = ManifestFixture::new()
            .dependency("implementation(\"a:a:1.0\")")
            .render();
        raw.push_str("\ndependencies {\n    implementation(\"b:b:1.0\")\n}\n");

        let manifest = parse(&raw).unwrap();
        let coordinates: Vec<&str> = manifest
            .dependencies
            .iter()
            .map(|d| d.coordinate.as_str())
            .collect();
        assert_eq!(coordinates, vec!["a:a", "b:b"]);
    }

    #[test]
    fn test_repeated_plugins_blocks_accumulate() {
        let mut raw = ManifestFixture::new().render();
        raw.push_str("\nplugins {\n    id(\"dev.flutter.flutter-gradle-plugin\")\n}\n");

        let manifest = parse(&raw).unwrap();
        let ids: Vec<&str> = manifest.plugins.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "com.android.application",
                "org.jetbrains.kotlin.android",
                "dev.flutter.flutter-gradle-plugin"
            ]
        );
    }

    #[test]
    fn test_duplicate_plugin_across_blocks_rejected() {
        let mut raw = ManifestFixture::new().render();
        raw.push_str("\nplugins {\n    id(\"com.android.application\")\n}\n");

        match parse(&raw).unwrap_err() {
            ParseError::Schema {
                field,
                message,
                location,
            } => {
                assert_eq!(field, "plugins");
                assert!(message.contains("`com.android.application`"));
                assert!(location.is_some());
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_repeated_android_blocks_merge() {
        let mut raw = ManifestFixture::new().without_release_signing().render();
        raw.push_str(
            r#"
android {
    compileSdk = 35
    ndkVersion = "26.1.10909125"

    defaultConfig {
        versionName = "2.0"
    }

    buildTypes {
        release {
            signingConfig = signingConfigs.getByName("upload")
        }
    }
}
"#,
        );

        let manifest = parse(&raw).unwrap();
        let android = &manifest.android;
        assert_eq!(android.namespace, "com.example.app");
        assert_eq!(android.application_id, "com.example.app");
        assert_eq!(android.compile_sdk, VersionSpec::literal("35"));
        assert_eq!(android.min_sdk, VersionSpec::literal("21"));
        assert_eq!(android.ndk_version, Some(VersionSpec::literal("26.1.10909125")));
        assert_eq!(android.version_name, Some(VersionSpec::literal("2.0")));
        assert_eq!(android.signing_config_ref(), Some("upload"));
    }

    #[test]
    fn test_repeated_flutter_blocks_merge() {
        let mut raw = ManifestFixture::new().flutter_source("../..").render();
        raw.push_str("\nflutter {\n    source = \"../../app\"\n}\n");

        let manifest = parse(&raw).unwrap();
        assert_eq!(manifest.flutter.unwrap().source, "../../app");
    }
}
