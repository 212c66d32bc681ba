//! `prax-testsync truncate` command - Empty the data tables of a connection.

use prax_testsync::SchemaCleaner;

use crate::cli::ConnectionArgs;
use crate::commands::Context;
use crate::error::CliResult;
use crate::output;

/// Run the truncate command
pub async fn run(ctx: &Context, args: ConnectionArgs) -> CliResult<()> {
    SchemaCleaner::new(ctx.output())
        .truncate(ctx.registry.as_ref(), &args.connection)
        .await?;

    output::success(&format!("Truncated all tables of '{}'", args.connection));
    Ok(())
}
