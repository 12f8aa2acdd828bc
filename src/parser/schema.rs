//! Mapping from the node tree onto the manifest schema.

use std::collections::HashSet;

use crate::core::{
    AndroidConfig, BuildType, DependencyKind, DependencyRef, FlutterConfig, LanguageLevel,
    Manifest, PluginRef, VersionSpec, RELEASE_BUILD_TYPE,
};

use super::errors::{Location, ParseError};
use super::node::{Block, Call, Entry, Node, Value};

/// Prefix `kotlin("x")` expands to in the plugins block.
const KOTLIN_PLUGIN_PREFIX: &str = "org.jetbrains.kotlin.";

/// Build a manifest from the root block.
///
/// Top-level blocks may repeat. Plugins and dependencies accumulate across
/// blocks in source order; repeated `android` and `flutter` blocks configure
/// the same object, later assignments winning.
pub fn manifest_from_tree(root: &Block) -> Result<Manifest, ParseError> {
    let mut plugins = Vec::new();
    let mut seen_plugins = HashSet::new();
    let mut android: Option<(AndroidFields, Location)> = None;
    let mut flutter: Option<(Option<String>, Location)> = None;
    let mut dependencies = Vec::new();

    for entry in &root.entries {
        match entry.key.as_str() {
            "plugins" => parse_plugins(
                expect_block(entry, "plugins")?,
                &mut plugins,
                &mut seen_plugins,
            )?,
            "android" => {
                let block = expect_block(entry, "android")?;
                let (fields, _) =
                    android.get_or_insert_with(|| (AndroidFields::default(), block.location));
                parse_android(block, fields)?;
            }
            "flutter" => {
                let block = expect_block(entry, "flutter")?;
                let (source, _) = flutter.get_or_insert_with(|| (None, block.location));
                parse_flutter(block, source)?;
            }
            "dependencies" => {
                dependencies.extend(parse_dependencies(expect_block(entry, "dependencies")?)?)
            }
            _ => warn_ignored(entry, ""),
        }
    }

    let (fields, location) = android.ok_or_else(|| ParseError::missing("android", None))?;
    let android = fields.finish(location)?;

    let flutter = match flutter {
        Some((source, location)) => Some(FlutterConfig {
            source: source.ok_or_else(|| ParseError::missing("flutter.source", Some(location)))?,
        }),
        None => None,
    };

    Ok(Manifest {
        plugins,
        android,
        flutter,
        dependencies,
    })
}

fn warn_ignored(entry: &Entry, scope: &str) {
    tracing::warn!(
        "ignoring unsupported entry `{}{}` at line {}",
        scope,
        entry.key,
        entry.location.line
    );
}

fn expect_block<'a>(entry: &'a Entry, field: &str) -> Result<&'a Block, ParseError> {
    match &entry.node {
        Node::Block(block) => Ok(block),
        _ => Err(ParseError::schema(
            field,
            "expected a block",
            Some(entry.location),
        )),
    }
}

fn expect_leaf<'a>(entry: &'a Entry, field: &str) -> Result<&'a Value, ParseError> {
    match &entry.node {
        Node::Leaf(value) => Ok(value),
        _ => Err(ParseError::schema(
            field,
            "expected an assignment",
            Some(entry.location),
        )),
    }
}

fn expect_call<'a>(entry: &'a Entry, field: &str) -> Result<&'a Call, ParseError> {
    match &entry.node {
        Node::Call(call) => Ok(call),
        _ => Err(ParseError::schema(
            field,
            "expected a call",
            Some(entry.location),
        )),
    }
}

fn string_value(entry: &Entry, field: &str) -> Result<String, ParseError> {
    match expect_leaf(entry, field)? {
        Value::Str(s) => Ok(s.clone()),
        other => Err(ParseError::schema(
            field,
            format!("expected a string, found `{}`", other),
            Some(entry.location),
        )),
    }
}

fn bool_value(entry: &Entry, field: &str) -> Result<bool, ParseError> {
    let value = expect_leaf(entry, field)?;
    value.as_bool().ok_or_else(|| {
        ParseError::schema(
            field,
            format!("expected true or false, found `{}`", value),
            Some(entry.location),
        )
    })
}

fn version_value(entry: &Entry, field: &str) -> Result<VersionSpec, ParseError> {
    match expect_leaf(entry, field)? {
        Value::Int(n) => Ok(VersionSpec::literal(n.to_string())),
        Value::Str(s) => Ok(VersionSpec::parse(s)),
        Value::Path(path) => Ok(VersionSpec::symbolic(path.join("."))),
        other => Err(ParseError::schema(
            field,
            format!("expected a version, found `{}`", other),
            Some(entry.location),
        )),
    }
}

fn language_value(entry: &Entry, field: &str) -> Result<LanguageLevel, ParseError> {
    let text = match expect_leaf(entry, field)? {
        Value::Int(n) => n.to_string(),
        Value::Str(s) => s.clone(),
        Value::Path(path) => path.join("."),
        other => {
            return Err(ParseError::schema(
                field,
                format!("expected a language level, found `{}`", other),
                Some(entry.location),
            ))
        }
    };

    text.parse::<LanguageLevel>()
        .map_err(|e| ParseError::schema(field, e.to_string(), Some(entry.location)))
}

fn parse_plugins(
    block: &Block,
    plugins: &mut Vec<PluginRef>,
    seen: &mut HashSet<String>,
) -> Result<(), ParseError> {
    for entry in &block.entries {
        let id = match entry.key.as_str() {
            "id" => call_string_arg(entry, "plugins.id")?,
            "kotlin" => format!(
                "{}{}",
                KOTLIN_PLUGIN_PREFIX,
                call_string_arg(entry, "plugins.kotlin")?
            ),
            _ => {
                warn_ignored(entry, "plugins.");
                continue;
            }
        };

        let call = expect_call(entry, "plugins")?;
        let mut plugin = PluginRef::new(id);

        if let Some(version) = call.modifier("version") {
            let version = version.as_str().ok_or_else(|| {
                ParseError::schema(
                    "plugins.version",
                    format!("expected a string, found `{}`", version),
                    Some(entry.location),
                )
            })?;
            plugin.version = Some(version.to_string());
        }

        if let Some(apply) = call.modifier("apply") {
            plugin.apply = apply.as_bool().ok_or_else(|| {
                ParseError::schema(
                    "plugins.apply",
                    format!("expected true or false, found `{}`", apply),
                    Some(entry.location),
                )
            })?;
        }

        if !seen.insert(plugin.id.clone()) {
            return Err(ParseError::schema(
                "plugins",
                format!("plugin `{}` is declared more than once", plugin.id),
                Some(entry.location),
            ));
        }

        plugins.push(plugin);
    }

    Ok(())
}

fn call_string_arg(entry: &Entry, field: &str) -> Result<String, ParseError> {
    let call = expect_call(entry, field)?;
    match call.positional() {
        Some(Value::Str(s)) => Ok(s.clone()),
        _ => Err(ParseError::schema(
            field,
            "expected a single string argument",
            Some(entry.location),
        )),
    }
}

/// Fields collected while walking the android blocks; required ones are
/// checked once every block has been read.
#[derive(Default)]
struct AndroidFields {
    namespace: Option<String>,
    application_id: Option<String>,
    compile_sdk: Option<VersionSpec>,
    min_sdk: Option<VersionSpec>,
    target_sdk: Option<VersionSpec>,
    ndk_version: Option<VersionSpec>,
    version_code: Option<VersionSpec>,
    version_name: Option<VersionSpec>,
    source_compatibility: Option<LanguageLevel>,
    target_compatibility: Option<LanguageLevel>,
    jvm_target: Option<LanguageLevel>,
    desugaring_enabled: bool,
    build_types: Vec<BuildType>,
}

fn parse_android(block: &Block, fields: &mut AndroidFields) -> Result<(), ParseError> {
    for entry in &block.entries {
        match entry.key.as_str() {
            "namespace" => fields.namespace = Some(string_value(entry, "android.namespace")?),
            "compileSdk" | "compileSdkVersion" => {
                fields.compile_sdk = Some(version_value(entry, "android.compileSdk")?)
            }
            "ndkVersion" => fields.ndk_version = Some(version_value(entry, "android.ndkVersion")?),
            "defaultConfig" => {
                parse_default_config(expect_block(entry, "android.defaultConfig")?, fields)?
            }
            "compileOptions" => {
                parse_compile_options(expect_block(entry, "android.compileOptions")?, fields)?
            }
            "kotlinOptions" => {
                let options = expect_block(entry, "android.kotlinOptions")?;
                for option in &options.entries {
                    match option.key.as_str() {
                        "jvmTarget" => {
                            fields.jvm_target =
                                Some(language_value(option, "android.kotlinOptions.jvmTarget")?)
                        }
                        _ => warn_ignored(option, "android.kotlinOptions."),
                    }
                }
            }
            "buildTypes" => parse_build_types(
                expect_block(entry, "android.buildTypes")?,
                &mut fields.build_types,
            )?,
            _ => warn_ignored(entry, "android."),
        }
    }

    Ok(())
}

impl AndroidFields {
    /// Check required fields and build the config.
    fn finish(self, location: Location) -> Result<AndroidConfig, ParseError> {
        let at = Some(location);
        let missing = |field: &'static str| ParseError::missing(field, at);

        let namespace = self.namespace.ok_or_else(|| missing("android.namespace"))?;
        let application_id = self
            .application_id
            .ok_or_else(|| missing("android.defaultConfig.applicationId"))?;
        let compile_sdk = self
            .compile_sdk
            .ok_or_else(|| missing("android.compileSdk"))?;
        let min_sdk = self
            .min_sdk
            .ok_or_else(|| missing("android.defaultConfig.minSdk"))?;
        let target_sdk = self
            .target_sdk
            .ok_or_else(|| missing("android.defaultConfig.targetSdk"))?;
        let source_compatibility = self
            .source_compatibility
            .ok_or_else(|| missing("android.compileOptions.sourceCompatibility"))?;
        let target_compatibility = self
            .target_compatibility
            .ok_or_else(|| missing("android.compileOptions.targetCompatibility"))?;

        let release_signed = self
            .build_types
            .iter()
            .any(|b| b.name == RELEASE_BUILD_TYPE && b.signing_config.is_some());
        if !release_signed {
            return Err(missing("android.buildTypes.release.signingConfig"));
        }

        Ok(AndroidConfig {
            namespace,
            application_id,
            compile_sdk,
            min_sdk,
            target_sdk,
            ndk_version: self.ndk_version,
            version_code: self.version_code,
            version_name: self.version_name,
            source_compatibility,
            target_compatibility,
            jvm_target: self.jvm_target,
            desugaring_enabled: self.desugaring_enabled,
            build_types: self.build_types,
        })
    }
}

fn parse_default_config(block: &Block, fields: &mut AndroidFields) -> Result<(), ParseError> {
    for entry in &block.entries {
        match entry.key.as_str() {
            "applicationId" => {
                fields.application_id =
                    Some(string_value(entry, "android.defaultConfig.applicationId")?)
            }
            "minSdk" | "minSdkVersion" => {
                fields.min_sdk = Some(version_value(entry, "android.defaultConfig.minSdk")?)
            }
            "targetSdk" | "targetSdkVersion" => {
                fields.target_sdk = Some(version_value(entry, "android.defaultConfig.targetSdk")?)
            }
            "versionCode" => {
                fields.version_code =
                    Some(version_value(entry, "android.defaultConfig.versionCode")?)
            }
            "versionName" => {
                fields.version_name =
                    Some(version_value(entry, "android.defaultConfig.versionName")?)
            }
            _ => warn_ignored(entry, "android.defaultConfig."),
        }
    }
    Ok(())
}

fn parse_compile_options(block: &Block, fields: &mut AndroidFields) -> Result<(), ParseError> {
    for entry in &block.entries {
        match entry.key.as_str() {
            "sourceCompatibility" => {
                fields.source_compatibility = Some(language_value(
                    entry,
                    "android.compileOptions.sourceCompatibility",
                )?)
            }
            "targetCompatibility" => {
                fields.target_compatibility = Some(language_value(
                    entry,
                    "android.compileOptions.targetCompatibility",
                )?)
            }
            "isCoreLibraryDesugaringEnabled" | "coreLibraryDesugaringEnabled" => {
                fields.desugaring_enabled = bool_value(
                    entry,
                    "android.compileOptions.isCoreLibraryDesugaringEnabled",
                )?
            }
            _ => warn_ignored(entry, "android.compileOptions."),
        }
    }
    Ok(())
}

fn parse_build_types(block: &Block, build_types: &mut Vec<BuildType>) -> Result<(), ParseError> {
    for entry in &block.entries {
        let (name, body) = match &entry.node {
            Node::Block(body) => (entry.key.clone(), body),
            // getByName("release") { ... } / create("staging") { ... }
            Node::Call(call) => match (call.positional(), &call.body) {
                (Some(Value::Str(name)), Some(body)) => (name.clone(), body),
                _ => {
                    return Err(ParseError::schema(
                        "android.buildTypes",
                        "expected `name { ... }` or `getByName(\"name\") { ... }`",
                        Some(entry.location),
                    ))
                }
            },
            Node::Leaf(_) => {
                return Err(ParseError::schema(
                    "android.buildTypes",
                    "expected a build type block",
                    Some(entry.location),
                ))
            }
        };

        let mut build_type = BuildType::new(name);
        for setting in &body.entries {
            match setting.key.as_str() {
                "signingConfig" => {
                    build_type.signing_config = Some(signing_config_name(setting)?);
                }
                "isMinifyEnabled" | "minifyEnabled" => {
                    build_type.minify_enabled = Some(bool_value(
                        setting,
                        "android.buildTypes.isMinifyEnabled",
                    )?);
                }
                _ => warn_ignored(setting, "android.buildTypes."),
            }
        }

        // Repeated blocks for the same build type configure the same object.
        match build_types.iter_mut().find(|b| b.name == build_type.name) {
            Some(existing) => {
                if build_type.signing_config.is_some() {
                    existing.signing_config = build_type.signing_config;
                }
                if build_type.minify_enabled.is_some() {
                    existing.minify_enabled = build_type.minify_enabled;
                }
            }
            None => build_types.push(build_type),
        }
    }

    Ok(())
}

fn signing_config_name(entry: &Entry) -> Result<String, ParseError> {
    const FIELD: &str = "android.buildTypes.signingConfig";

    match expect_leaf(entry, FIELD)? {
        Value::Call { callee, args } if callee.last().map(String::as_str) == Some("getByName") => {
            match args.first().map(|a| &a.value) {
                Some(Value::Str(name)) => Ok(name.clone()),
                _ => Err(ParseError::schema(
                    FIELD,
                    "expected getByName(\"name\")",
                    Some(entry.location),
                )),
            }
        }
        // signingConfigs.debug
        Value::Path(path) if path.len() == 2 && path[0] == "signingConfigs" => Ok(path[1].clone()),
        Value::Str(name) => Ok(name.clone()),
        other => Err(ParseError::schema(
            FIELD,
            format!("expected signingConfigs.getByName(\"name\"), found `{}`", other),
            Some(entry.location),
        )),
    }
}

fn parse_flutter(block: &Block, source: &mut Option<String>) -> Result<(), ParseError> {
    for entry in &block.entries {
        match entry.key.as_str() {
            "source" => *source = Some(string_value(entry, "flutter.source")?),
            _ => warn_ignored(entry, "flutter."),
        }
    }
    Ok(())
}

fn parse_dependencies(block: &Block) -> Result<Vec<DependencyRef>, ParseError> {
    let mut dependencies = Vec::new();

    for entry in &block.entries {
        let kind = DependencyKind::from_configuration(&entry.key).ok_or_else(|| {
            ParseError::schema(
                format!("dependencies.{}", entry.key),
                "unsupported dependency configuration, expected implementation or coreLibraryDesugaring",
                Some(entry.location),
            )
        })?;

        let field = format!("dependencies.{}", entry.key);
        let call = expect_call(entry, &field)?;

        let mut dependency = match (call.positional(), call.named("group"), call.named("name")) {
            (Some(Value::Str(notation)), _, _) => DependencyRef::from_notation(notation, kind)
                .map_err(|e| ParseError::schema(&field, e, Some(entry.location)))?,
            (None, Some(Value::Str(group)), Some(Value::Str(name))) => {
                let version = match call.named("version") {
                    Some(Value::Str(v)) => VersionSpec::parse(v),
                    _ => {
                        return Err(ParseError::schema(
                            &field,
                            "named dependency notation requires a string `version`",
                            Some(entry.location),
                        ))
                    }
                };
                DependencyRef::new(format!("{}:{}", group, name), kind, version)
            }
            (Some(other), _, _) => {
                return Err(ParseError::schema(
                    &field,
                    format!("unsupported dependency notation `{}`", other),
                    Some(entry.location),
                ))
            }
            _ => {
                return Err(ParseError::schema(
                    &field,
                    "expected \"group:artifact:version\"",
                    Some(entry.location),
                ))
            }
        };

        if let Some(body) = &call.body {
            for requirement in &body.entries {
                match requirement.key.as_str() {
                    "requires" => {
                        dependency
                            .requires
                            .push(call_string_arg(requirement, "dependencies.requires")?);
                    }
                    _ => warn_ignored(requirement, "dependencies."),
                }
            }
        }

        dependencies.push(dependency);
    }

    Ok(dependencies)
}
