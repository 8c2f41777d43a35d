mod cli;
mod commands;
mod config;
mod error;
mod logging;

use crate::cli::{Cli, Commands};
use crate::error::Result;
use clap::Parser;
use tracing::{debug, error, info};

fn main() {
    if let Err(e) = run_app() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run_app() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.clone())?;

    info!("silica v{} starting up", env!("CARGO_PKG_VERSION"));
    debug!("parsed arguments: {:?}", &cli);

    let result = match cli.command {
        Commands::Run(args) => commands::run::run(args),
    };

    if let Err(e) = &result {
        error!("command failed: {e}");
    }
    result
}
