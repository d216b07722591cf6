use clap::Parser;
use colored::*;
use std::process;

mod cli;

use crate::cli::{Cli, Commands};
use taxalink_core::TaxaError;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);

        // Use appropriate exit codes based on error type
        let exit_code = match e.downcast_ref::<TaxaError>() {
            Some(TaxaError::Configuration(_)) | Some(TaxaError::InvalidInput(_)) => 2,
            Some(TaxaError::Io(_)) => 3,
            Some(TaxaError::Parse(_)) => 4,
            Some(TaxaError::Store(_)) | Some(TaxaError::NotFound(_)) => 5,
            Some(TaxaError::Network(_)) => 6,
            _ => 1,
        };
        process::exit(exit_code);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Map(args) => crate::cli::commands::map::run(args, &cli.global),
        Commands::Lineage(args) => crate::cli::commands::lineage::run(args, &cli.global),
        Commands::Validate(args) => crate::cli::commands::validate::run(args, &cli.global),
        Commands::Paths => crate::cli::commands::paths::run(),
    }
}
