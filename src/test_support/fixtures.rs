//! Test fixtures for common test scenarios.
//!
//! This module provides pre-built manifests and registries, plus a
//! fixture builder for manifests that differ from a valid baseline in one
//! or two fields.

use crate::core::{
    DependencyKind, ImpliedDependency, PluginCatalog, PluginMetadata, Registries,
    SigningConfig, SigningRegistry, VersionDefaults,
};

/// Plugin id of the notifications plugin used in catalog fixtures.
pub const NOTIFICATIONS_PLUGIN: &str = "com.dexterous.flutter_local_notifications";

/// A Flutter app-module build script with desugaring enabled.
pub const FLUTTER_APP_MANIFEST: &str = r#"plugins {
    id("com.android.application")
    id("org.jetbrains.kotlin.android")
    id("dev.flutter.flutter-gradle-plugin")
}

android {
    namespace = "com.example.sewage"
    compileSdk = flutter.compileSdkVersion
    ndkVersion = flutter.ndkVersion

    defaultConfig {
        applicationId = "com.example.sewage"
        minSdk = flutter.minSdkVersion
        targetSdk = flutter.targetSdkVersion
        versionCode = flutter.versionCode
        versionName = flutter.versionName
    }

    // Java 17 + desugaring
    compileOptions {
        sourceCompatibility = JavaVersion.VERSION_17
        targetCompatibility = JavaVersion.VERSION_17
        isCoreLibraryDesugaringEnabled = true
    }

    kotlinOptions {
        jvmTarget = "17"
    }

    buildTypes {
        release {
            signingConfig = signingConfigs.getByName("debug")
        }
    }
}

flutter {
    source = "../.."
}

dependencies {
    implementation("org.jetbrains.kotlin:kotlin-stdlib:1.9.22")

    /* needed by flutter_local_notifications */
    coreLibraryDesugaring("com.android.tools:desugar_jdk_libs:2.0.4")
}
"#;

/// Defaults the Flutter Gradle plugin provides.
pub fn flutter_defaults() -> VersionDefaults {
    [
        ("flutter.compileSdkVersion", "34"),
        ("flutter.minSdkVersion", "21"),
        ("flutter.targetSdkVersion", "34"),
        ("flutter.ndkVersion", "26.1.10909125"),
        ("flutter.versionCode", "1"),
        ("flutter.versionName", "1.0.0"),
    ]
    .into_iter()
    .collect()
}

/// A catalog where the notifications plugin needs desugaring.
pub fn notifications_catalog() -> PluginCatalog {
    PluginCatalog::new().with(
        NOTIFICATIONS_PLUGIN,
        PluginMetadata {
            requires_desugaring: true,
            supported_versions: Some(">=17".parse().expect("valid requirement")),
            implies: vec![ImpliedDependency {
                coordinate: "com.android.tools:desugar_jdk_libs".to_string(),
                kind: DependencyKind::Desugaring,
                version: Some("2.0.4".to_string()),
                requires: Vec::new(),
            }],
        },
    )
}

/// Registries that fully resolve [`FLUTTER_APP_MANIFEST`].
pub fn flutter_registries() -> Registries {
    Registries::new()
        .with_version_defaults(flutter_defaults())
        .with_signing(
            SigningRegistry::with_debug().with("upload", SigningConfig::release()),
        )
        .with_plugins(notifications_catalog())
}

/// Builder for manifest text.
///
/// The default fixture is valid on its own: literal SDK levels, Java 17,
/// desugaring off, no dependencies, release signed with `debug`.
#[derive(Debug, Clone)]
pub struct ManifestFixture {
    plugins: Vec<String>,
    default_plugins: bool,
    namespace: Option<String>,
    application_id: Option<String>,
    compile_sdk: String,
    min_sdk: String,
    target_sdk: String,
    source_compat: String,
    target_compat: String,
    jvm_target: Option<String>,
    desugaring: bool,
    release_signing: Option<String>,
    build_types: Vec<String>,
    flutter_source: Option<String>,
    dependencies: Vec<String>,
}

impl Default for ManifestFixture {
    fn default() -> Self {
        ManifestFixture {
            plugins: Vec::new(),
            default_plugins: true,
            namespace: Some("com.example.app".to_string()),
            application_id: Some("com.example.app".to_string()),
            compile_sdk: "34".to_string(),
            min_sdk: "21".to_string(),
            target_sdk: "34".to_string(),
            source_compat: "JavaVersion.VERSION_17".to_string(),
            target_compat: "JavaVersion.VERSION_17".to_string(),
            jvm_target: None,
            desugaring: false,
            release_signing: Some("debug".to_string()),
            build_types: Vec::new(),
            flutter_source: None,
            dependencies: Vec::new(),
        }
    }
}

impl ManifestFixture {
    /// Create the default fixture.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the standard application and Kotlin plugins.
    pub fn no_default_plugins(mut self) -> Self {
        self.default_plugins = false;
        self
    }

    /// Add a raw plugin line (`id("x") version "1.0"`).
    pub fn plugin(mut self, line: &str) -> Self {
        self.plugins.push(line.to_string());
        self
    }

    pub fn without_namespace(mut self) -> Self {
        self.namespace = None;
        self
    }

    pub fn without_application_id(mut self) -> Self {
        self.application_id = None;
        self
    }

    /// Set the raw `compileSdk` expression.
    pub fn compile_sdk(mut self, expr: &str) -> Self {
        self.compile_sdk = expr.to_string();
        self
    }

    /// Set the raw `minSdk` expression.
    pub fn min_sdk(mut self, expr: &str) -> Self {
        self.min_sdk = expr.to_string();
        self
    }

    /// Set the raw `targetSdk` expression.
    pub fn target_sdk(mut self, expr: &str) -> Self {
        self.target_sdk = expr.to_string();
        self
    }

    /// Set the raw `sourceCompatibility` expression.
    pub fn source_compat(mut self, expr: &str) -> Self {
        self.source_compat = expr.to_string();
        self
    }

    /// Set the raw `targetCompatibility` expression.
    pub fn target_compat(mut self, expr: &str) -> Self {
        self.target_compat = expr.to_string();
        self
    }

    /// Set `kotlinOptions.jvmTarget` (string contents).
    pub fn jvm_target(mut self, target: &str) -> Self {
        self.jvm_target = Some(target.to_string());
        self
    }

    pub fn desugaring(mut self, enabled: bool) -> Self {
        self.desugaring = enabled;
        self
    }

    /// Sign release with the named config.
    pub fn release_signing(mut self, name: &str) -> Self {
        self.release_signing = Some(name.to_string());
        self
    }

    pub fn without_release_signing(mut self) -> Self {
        self.release_signing = None;
        self
    }

    /// Add a raw build type block (`staging { ... }`).
    pub fn build_type(mut self, block: &str) -> Self {
        self.build_types.push(block.to_string());
        self
    }

    pub fn flutter_source(mut self, source: &str) -> Self {
        self.flutter_source = Some(source.to_string());
        self
    }

    /// Add a raw dependency line (`implementation("g:a:1.0")`).
    pub fn dependency(mut self, line: &str) -> Self {
        self.dependencies.push(line.to_string());
        self
    }

    /// Render the build script.
    pub fn render(&self) -> String {
        let mut out = String::from("plugins {\n");
        if self.default_plugins {
            out.push_str("    id(\"com.android.application\")\n");
            out.push_str("    id(\"org.jetbrains.kotlin.android\")\n");
        }
        for plugin in &self.plugins {
            out.push_str(&format!("    {}\n", plugin));
        }
        out.push_str("}\n\nandroid {\n");

        if let Some(namespace) = &self.namespace {
            out.push_str(&format!("    namespace = \"{}\"\n", namespace));
        }
        out.push_str(&format!("    compileSdk = {}\n\n", self.compile_sdk));

        out.push_str("    defaultConfig {\n");
        if let Some(id) = &self.application_id {
            out.push_str(&format!("        applicationId = \"{}\"\n", id));
        }
        out.push_str(&format!("        minSdk = {}\n", self.min_sdk));
        out.push_str(&format!("        targetSdk = {}\n", self.target_sdk));
        out.push_str("    }\n\n");

        out.push_str("    compileOptions {\n");
        out.push_str(&format!("        sourceCompatibility = {}\n", self.source_compat));
        out.push_str(&format!("        targetCompatibility = {}\n", self.target_compat));
        out.push_str(&format!(
            "        isCoreLibraryDesugaringEnabled = {}\n",
            self.desugaring
        ));
        out.push_str("    }\n\n");

        if let Some(target) = &self.jvm_target {
            out.push_str(&format!(
                "    kotlinOptions {{\n        jvmTarget = \"{}\"\n    }}\n\n",
                target
            ));
        }

        out.push_str("    buildTypes {\n");
        if let Some(signing) = &self.release_signing {
            out.push_str(&format!(
                "        release {{\n            signingConfig = signingConfigs.getByName(\"{}\")\n        }}\n",
                signing
            ));
        }
        for block in &self.build_types {
            out.push_str(&format!("        {}\n", block));
        }
        out.push_str("    }\n}\n");

        if let Some(source) = &self.flutter_source {
            out.push_str(&format!("\nflutter {{\n    source = \"{}\"\n}}\n", source));
        }

        out.push_str("\ndependencies {\n");
        for dependency in &self.dependencies {
            out.push_str(&format!("    {}\n", dependency));
        }
        out.push_str("}\n");

        out
    }
}
