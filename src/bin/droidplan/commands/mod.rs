//! Command implementations

pub mod check;
pub mod completions;
pub mod resolve;
pub mod tree;

use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, Result};
use miette::{GraphicalReportHandler, GraphicalTheme, NamedSource};

use crate::cli::{ManifestArgs, ValidationArgs};
use droidplan::parser::ParseError;
use droidplan::util::config::Config;
use droidplan::util::diagnostic::{self, suggestions};
use droidplan::util::GlobalContext;
use droidplan::{PipelineError, PipelineOptions};

/// Marker error for failures whose diagnostics were already printed.
#[derive(Debug)]
pub struct Reported;

impl fmt::Display for Reported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "errors were reported")
    }
}

impl std::error::Error for Reported {}

/// A manifest read from disk together with its configuration.
pub struct LoadedManifest {
    pub path: PathBuf,
    pub source: String,
    pub config: Config,
}

/// Locate and read the manifest, then load the config that applies to it.
pub fn load(input: &ManifestArgs, ctx: &GlobalContext) -> Result<LoadedManifest> {
    let path = ctx
        .manifest_path(input.manifest.as_deref())
        .map_err(|e| anyhow::anyhow!("{:#}\n{}", e, suggestions::NO_MANIFEST))?;

    let source = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let config = ctx
        .load_config(input.config.as_deref(), &path)
        .map_err(|e| anyhow::anyhow!("{:#}\n{}", e, suggestions::BAD_CONFIG))?;

    tracing::debug!("using manifest {}", path.display());

    Ok(LoadedManifest {
        path,
        source,
        config,
    })
}

/// Pipeline options from the config, overridden by command-line flags.
pub fn pipeline_options(config: &Config, flags: &ValidationArgs) -> PipelineOptions {
    let mut options = config.pipeline_options();
    if flags.fail_fast {
        options.accumulate = false;
    }
    if flags.strict_signing {
        options.strict_release_signing = true;
    }
    options
}

/// Print a pipeline error and return the marker error.
///
/// Syntax errors are rendered against the manifest source; everything else
/// goes through the plain diagnostic formatter.
pub fn report(err: PipelineError, loaded: &LoadedManifest, ctx: &GlobalContext) -> anyhow::Error {
    if let PipelineError::Parse(parse @ ParseError::Syntax { .. }) = &err {
        if let Some(rendered) = render_syntax_error(parse, loaded, ctx.color()) {
            eprint!("{}", rendered);
            return Reported.into();
        }
    }

    let diag = err.to_diagnostic().with_location(&loaded.path);
    diagnostic::emit(&diag, ctx.color());
    Reported.into()
}

fn render_syntax_error(err: &ParseError, loaded: &LoadedManifest, color: bool) -> Option<String> {
    let report = miette::Report::new(err.clone()).with_source_code(NamedSource::new(
        loaded.path.display().to_string(),
        loaded.source.clone(),
    ));

    let theme = if color {
        GraphicalTheme::unicode()
    } else {
        GraphicalTheme::unicode_nocolor()
    };

    let mut out = String::new();
    GraphicalReportHandler::new_themed(theme)
        .render_report(&mut out, &*report)
        .ok()?;
    Some(out)
}
