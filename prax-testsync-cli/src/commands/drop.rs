//! `prax-testsync drop` command - Drop every table of a connection.

use prax_testsync::SchemaCleaner;

use crate::cli::ConnectionArgs;
use crate::commands::Context;
use crate::error::CliResult;
use crate::output;

/// Run the drop command
pub async fn run(ctx: &Context, args: ConnectionArgs) -> CliResult<()> {
    SchemaCleaner::new(ctx.output())
        .drop(ctx.registry.as_ref(), &args.connection)
        .await?;

    output::success(&format!("Dropped all tables of '{}'", args.connection));
    Ok(())
}
