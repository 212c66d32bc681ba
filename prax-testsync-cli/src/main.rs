//! Prax TestSync CLI - Synchronize test databases with their migrations.

use clap::Parser;

use prax_testsync_cli::cli::Cli;
use prax_testsync_cli::{commands, logging, output};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    // Run the CLI and handle errors
    if let Err(e) = commands::run(cli).await {
        output::newline();
        output::error(&e.to_string());
        std::process::exit(1);
    }
}
