use anyhow::{bail, Result};
use clap::Args;
use taxalink_resolve::{validate_lineages, LineageBounds};

use crate::cli::context::block_on;
use crate::cli::output::{print_json, success, warning};
use crate::cli::{GlobalArgs, KeyArgs};

#[derive(Args)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub keys: KeyArgs,

    /// Escalate taxids missing from the local taxonomy to the remote authority
    #[arg(long)]
    pub fallback: bool,

    /// Exit with an error when any lineage is incomplete or failed
    #[arg(long)]
    pub strict: bool,
}

pub fn run(args: ValidateArgs, global: &GlobalArgs) -> Result<()> {
    let taxids = args.keys.taxids()?;
    let ctx = global.context_with(|config| {
        if args.fallback {
            config.resolver.remote_fallback = true;
        }
    })?;
    let bounds = LineageBounds::unbounded().with_max_depth(ctx.config.resolver.max_lineage_depth);

    let lineages = block_on(ctx.mapper.lineages(taxids, &ctx.aliases, &bounds))??;
    let report = validate_lineages(&lineages);
    print_json(&report)?;

    if report.is_ok() {
        success(&format!("{} lineages reach a superkingdom", report.complete.len()));
        return Ok(());
    }

    let summary = format!(
        "{} complete, {} incomplete, {} failed",
        report.complete.len(),
        report.incomplete.len(),
        report.failed.len()
    );
    if args.strict {
        bail!("validation failed: {}", summary);
    }
    warning(&summary);
    Ok(())
}
