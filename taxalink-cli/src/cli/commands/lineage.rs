use anyhow::Result;
use clap::Args;
use serde::Serialize;
use taxalink_resolve::{check_resolve, Lineage, LineageBounds, Rank, TaxonId};

use crate::cli::context::block_on;
use crate::cli::output::{print_json, success, warning};
use crate::cli::{GlobalArgs, KeyArgs};

#[derive(Args)]
pub struct LineageArgs {
    #[command(flatten)]
    pub keys: KeyArgs,

    /// Start collecting at the first ancestor with this rank
    #[arg(long, value_name = "RANK")]
    pub start_rank: Option<String>,

    /// Stop after the ancestor with this rank; fails when the root is reached first
    #[arg(long, value_name = "RANK")]
    pub stop_rank: Option<String>,

    /// Return only the first ancestor with this rank
    #[arg(long, value_name = "RANK")]
    pub single_rank: Option<String>,

    /// Escalate taxids missing from the local taxonomy to the remote authority
    #[arg(long)]
    pub fallback: bool,

    /// Warn about lineages that never reach a superkingdom
    #[arg(long)]
    pub check: bool,
}

#[derive(Serialize)]
struct LineageEntry<'a> {
    taxid: TaxonId,
    lineage: Option<&'a Lineage>,
}

fn parse_rank(label: &Option<String>) -> Option<Rank> {
    label.as_deref().map(Rank::parse)
}

pub fn run(args: LineageArgs, global: &GlobalArgs) -> Result<()> {
    let bounds = LineageBounds::new(
        parse_rank(&args.start_rank),
        parse_rank(&args.stop_rank),
        parse_rank(&args.single_rank),
    )?;
    let taxids = args.keys.taxids()?;

    let ctx = global.context_with(|config| {
        if args.fallback {
            config.resolver.remote_fallback = true;
        }
    })?;
    let bounds = bounds.with_max_depth(ctx.config.resolver.max_lineage_depth);

    let lineages = block_on(ctx.mapper.lineages(taxids.iter().copied(), &ctx.aliases, &bounds))??;

    let mut ids: Vec<TaxonId> = lineages.keys().copied().collect();
    ids.sort();
    let entries: Vec<LineageEntry> = ids
        .iter()
        .map(|id| LineageEntry {
            taxid: *id,
            lineage: lineages[id].as_ref(),
        })
        .collect();
    print_json(&entries)?;

    let assembled = entries.iter().filter(|e| e.lineage.is_some()).count();
    let summary = format!("{}/{} lineages assembled", assembled, entries.len());
    if assembled == entries.len() {
        success(&summary);
    } else {
        warning(&summary);
    }

    if args.check && !check_resolve(&lineages) {
        warning("Some lineages do not reach a superkingdom");
    }
    Ok(())
}
