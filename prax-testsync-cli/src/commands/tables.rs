//! `prax-testsync tables` command - List the tables of a connection.

use prax_testsync::{ConnectionRegistry, SchemaIntrospector};

use crate::cli::TablesArgs;
use crate::commands::Context;
use crate::error::CliResult;
use crate::output;

/// Run the tables command
pub async fn run(ctx: &Context, args: TablesArgs) -> CliResult<()> {
    let conn = ctx.registry.get(&args.connection).await?;
    let tables = if args.all {
        SchemaIntrospector::list_tables(conn.as_ref()).await?
    } else {
        SchemaIntrospector::list_data_tables(conn.as_ref()).await?
    };

    if tables.is_empty() {
        output::info(&format!("No tables in '{}'", args.connection));
        return Ok(());
    }

    output::section(&format!("Tables in '{}'", args.connection));
    for table in &tables {
        output::list_item(table);
    }
    Ok(())
}
