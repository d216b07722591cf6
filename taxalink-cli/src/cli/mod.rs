pub mod commands;
pub mod context;
pub mod output;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "taxalink",
    version,
    about = "Batch taxon resolution and lineage assembly",
    long_about = "taxalink resolves taxids, scientific names and sequence accessions against a \
                  local NCBI taxonomy dump, optionally falling back to a remote taxonomy \
                  authority, and assembles rank-bounded lineages for the resolved taxa."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Verbosity level (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file (defaults to $TAXALINK_HOME/config.toml)
    #[arg(short, long, global = true, value_name = "FILE", env = "TAXALINK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding nodes.dmp, names.dmp and merged.dmp; overrides [store] taxonomy_dir
    #[arg(long, global = true, value_name = "DIR")]
    pub taxonomy_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve taxids, names or accessions to taxa
    Map(commands::map::MapArgs),

    /// Assemble rank-bounded lineages for taxids
    Lineage(commands::lineage::LineageArgs),

    /// Check that lineages reach a superkingdom
    Validate(commands::validate::ValidateArgs),

    /// Show the directories and config file taxalink uses
    Paths,
}

/// Keys given on the command line and/or read from a file
#[derive(Args, Debug, Clone)]
pub struct KeyArgs {
    /// Keys to resolve
    #[arg(value_name = "KEY")]
    pub keys: Vec<String>,

    /// File with one key per line ('#' starts a comment)
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,
}
