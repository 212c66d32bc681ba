//! `prax-testsync status` command - Show migration status without touching data.

use prax_testsync::{MigrationRunner, MigrationState, stale_reason};

use crate::cli::JobArgs;
use crate::commands::Context;
use crate::error::CliResult;
use crate::output;

/// Run the status command
pub async fn run(ctx: &Context, args: JobArgs) -> CliResult<()> {
    let overrides = ctx.config.overrides(args.overrides());
    let jobs = ctx
        .resolver()
        .resolve_registry(ctx.registry.as_ref(), &overrides)?;

    let runner = ctx.runner();
    for job in &jobs {
        let entries = runner.status(job).await?;

        output::section(&job.to_string());
        if entries.is_empty() {
            output::list_item("no migrations");
        }
        for entry in &entries {
            let state = match (entry.status, entry.missing) {
                (MigrationState::Up, true) => output::style_error("up (missing)"),
                (MigrationState::Up, false) => output::style_success("up"),
                (MigrationState::Down, _) => output::style_pending("down"),
            };
            output::list_item(&format!("{} {}", state, entry.name));
        }

        match stale_reason(&entries) {
            Some(reason) => output::kv("stale", &reason.to_string()),
            None => output::kv("stale", "no"),
        }
        output::newline();
    }

    Ok(())
}
