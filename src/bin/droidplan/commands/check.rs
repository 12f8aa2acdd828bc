//! `droidplan check` command

use anyhow::Result;

use crate::cli::CheckArgs;
use crate::commands::{self, pipeline_options, Reported};
use droidplan::util::diagnostic;
use droidplan::util::GlobalContext;

pub fn execute(args: CheckArgs, ctx: &GlobalContext) -> Result<()> {
    let loaded = commands::load(&args.input, ctx)?;

    let registries = loaded.config.registries();
    let options = pipeline_options(&loaded.config, &args.validation);

    let report = droidplan::check_manifest(&loaded.source, &registries, &options)
        .map_err(|e| commands::report(e, &loaded, ctx))?;

    for check in &report.checks {
        let status = if check.passed { "ok" } else { "FAILED" };
        println!("{:<24} {}", check.code.as_str(), status);
        if ctx.is_verbose() {
            println!("    {}", check.code.description());
        }
    }

    for warning in &report.warnings {
        diagnostic::emit(
            &warning.to_diagnostic().into_warning().with_location(&loaded.path),
            ctx.color(),
        );
    }

    for violation in &report.violations {
        diagnostic::emit(
            &violation.to_diagnostic().with_location(&loaded.path),
            ctx.color(),
        );
    }

    let failed = report.checks.iter().filter(|c| !c.passed).count();
    println!();
    println!(
        "{} checks run: {} passed, {} failed, {} warning(s)",
        report.checks.len(),
        report.checks.len() - failed,
        failed,
        report.warnings.len()
    );

    if report.is_ok() {
        Ok(())
    } else {
        Err(Reported.into())
    }
}
