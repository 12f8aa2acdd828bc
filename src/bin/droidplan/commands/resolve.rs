//! `droidplan resolve` command

use anyhow::{Context, Result};

use crate::cli::ResolveArgs;
use crate::commands::{self, pipeline_options};
use droidplan::util::diagnostic;
use droidplan::util::{GlobalContext, OutputFormat};

pub fn execute(args: ResolveArgs, ctx: &GlobalContext) -> Result<()> {
    let loaded = commands::load(&args.input, ctx)?;

    let format = match args.format.as_deref() {
        Some(s) => s.parse::<OutputFormat>().map_err(|e| anyhow::anyhow!(e))?,
        None => loaded.config.output_format(),
    };

    let registries = loaded.config.registries();
    let options = pipeline_options(&loaded.config, &args.validation);

    let plan = droidplan::resolve_plan(&loaded.source, &registries, &options)
        .map_err(|e| commands::report(e, &loaded, ctx))?;

    for warning in &plan.warnings {
        diagnostic::emit(
            &warning.to_diagnostic().into_warning().with_location(&loaded.path),
            ctx.color(),
        );
    }

    let mut text = match format {
        OutputFormat::Json => plan.to_json().context("failed to serialize build plan")?,
        OutputFormat::Gradle => plan.to_manifest_string(),
    };
    if !text.ends_with('\n') {
        text.push('\n');
    }

    match args.output {
        Some(path) => {
            let path = ctx.cwd().join(path);
            std::fs::write(&path, &text)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!("wrote {} plan to {}", format, path.display());
        }
        None => print!("{}", text),
    }

    Ok(())
}
