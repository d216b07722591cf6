use anyhow::Result;
use clap::{Args, ValueEnum};
use serde::Serialize;
use taxalink_core::Config;
use taxalink_resolve::{Query, QueryKey, Resolution};

use crate::cli::context::block_on;
use crate::cli::output::{print_json, success, warning};
use crate::cli::{GlobalArgs, KeyArgs};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KeyType {
    Taxid,
    Name,
    Accession,
}

#[derive(Args)]
pub struct MapArgs {
    #[command(flatten)]
    pub keys: KeyArgs,

    /// Kind of key to resolve
    #[arg(long, value_enum, default_value_t = KeyType::Taxid)]
    pub by: KeyType,

    /// Resolve through the remote authority only, skipping the local taxonomy
    #[arg(long)]
    pub remote: bool,

    /// Escalate keys missing from the local taxonomy to the remote authority
    #[arg(long, conflicts_with = "remote")]
    pub fallback: bool,

    /// Remote accession database (accession keys only)
    #[arg(long, default_value = "nucleotide", value_name = "DB")]
    pub db: String,
}

#[derive(Serialize)]
struct MapEntry<'a> {
    key: String,
    #[serde(flatten)]
    resolution: &'a Resolution,
}

fn report<K: QueryKey>(query: &Query<K>) -> Result<()> {
    let entries: Vec<MapEntry> = query
        .keys()
        .iter()
        .filter_map(|key| {
            query.get(key).map(|resolution| MapEntry {
                key: key.to_string(),
                resolution,
            })
        })
        .collect();
    print_json(&entries)?;

    let matched = entries.iter().filter(|e| e.resolution.is_match()).count();
    let failed = query.failures().count();
    let summary = format!("{}/{} keys matched, {} failed", matched, query.len(), failed);
    if failed > 0 {
        warning(&summary);
    } else {
        success(&summary);
    }
    Ok(())
}

pub fn run(args: MapArgs, global: &GlobalArgs) -> Result<()> {
    let fallback = args.fallback;
    let adjust = |config: &mut Config| {
        if fallback {
            config.resolver.remote_fallback = true;
        }
    };
    let ctx = if args.remote {
        global.remote_context_with(adjust)?
    } else {
        global.context_with(adjust)?
    };
    let mapper = &ctx.mapper;

    match args.by {
        KeyType::Taxid => {
            let taxids = args.keys.taxids()?;
            let query = block_on(async {
                if args.remote {
                    mapper.map_by_taxid_remote(taxids).await
                } else {
                    mapper.map_by_taxid(taxids).await
                }
            })??;
            report(&query)
        }
        KeyType::Name => {
            let names = args.keys.collect()?;
            let query = block_on(async {
                if args.remote {
                    mapper.map_by_name_remote(names).await
                } else {
                    mapper.map_by_name(names).await
                }
            })??;
            report(&query)
        }
        KeyType::Accession => {
            let accessions = args.keys.collect()?;
            let query = block_on(async {
                if args.remote {
                    mapper.map_by_accession_remote(accessions, &args.db).await
                } else {
                    mapper.map_by_accession(accessions, &args.db).await
                }
            })??;
            report(&query)
        }
    }
}
