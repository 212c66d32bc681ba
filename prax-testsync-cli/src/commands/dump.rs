//! `prax-testsync dump` command - Load a schema from SQL dump files.

use prax_testsync::SchemaDump;

use crate::cli::DumpArgs;
use crate::commands::Context;
use crate::error::CliResult;
use crate::output;

/// Run the dump command
pub async fn run(ctx: &Context, args: DumpArgs) -> CliResult<()> {
    SchemaDump::new(ctx.output())
        .import(ctx.registry.as_ref(), &args.connection, &args.files)
        .await?;

    output::success(&format!(
        "Loaded {} file(s) into '{}'",
        args.files.len(),
        args.connection
    ));
    Ok(())
}
