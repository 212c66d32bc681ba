//! `prax-testsync sync` command - Rebuild stale test databases.

use prax_testsync::Synchronizer;

use crate::cli::JobArgs;
use crate::commands::Context;
use crate::error::{CliError, CliResult};
use crate::output;

/// Run the sync command
pub async fn run(ctx: &Context, args: JobArgs) -> CliResult<()> {
    let overrides = ctx.config.overrides(args.overrides());

    let synchronizer = Synchronizer::new(ctx.registry.clone(), ctx.runner())
        .with_output(ctx.output())
        .with_resolver(ctx.resolver());
    let report = synchronizer.run(&overrides).await?;

    if report.is_noop() {
        output::success("Test databases are up to date");
        return Ok(());
    }

    for (connection, reason) in &report.stale {
        output::kv(connection, &reason.to_string());
    }
    output::success(&format!(
        "Rebuilt {} connection(s): {}",
        report.modified.len(),
        report.modified_connections().join(", ")
    ));

    if !report.is_success() {
        for failed in &report.failed {
            output::warn(&format!("{}: {}", failed.job, failed.error));
        }
        return Err(CliError::Migration(format!(
            "{} of {} job(s) failed",
            report.failed.len(),
            report.jobs.len()
        )));
    }

    Ok(())
}
