//! Parse NCBI taxonomy dump files into a [`MemoryTaxonStore`]

use flate2::read::MultiGzDecoder;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use taxalink_core::config::StoreConfig;
use taxalink_core::{ParentRef, Rank, TaxaError, TaxaResult, Taxon, TaxonId};
use tracing::{debug, info};

use super::MemoryTaxonStore;
use crate::alias::AliasIndex;

/// Name classes indexed as lookup aliases besides the scientific name
const SEARCHABLE_NAME_CLASSES: &[&str] = &[
    "synonym",
    "equivalent name",
    "genbank common name",
    "common name",
    "genbank synonym",
];

/// One row of nodes.dmp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRecord {
    pub tax_id: TaxonId,
    pub parent_id: TaxonId,
    pub rank: String,
}

impl NodeRecord {
    /// Join with the scientific name. Nodes without one are dropped.
    pub fn into_taxon(self, names: &HashMap<TaxonId, String>) -> Option<Taxon> {
        let name = names.get(&self.tax_id)?;
        Some(Taxon::new(
            self.tax_id,
            ParentRef::Id(self.parent_id),
            Rank::parse(&self.rank),
            name.clone(),
        ))
    }
}

/// Names read from names.dmp
#[derive(Debug, Default)]
pub struct NameTable {
    pub scientific: HashMap<TaxonId, String>,
    pub aliases: Vec<(String, TaxonId)>,
}

fn split_dmp_line(line: &str) -> Vec<&str> {
    line.trim_end_matches("\t|")
        .split("\t|\t")
        .map(str::trim)
        .collect()
}

fn parse_taxid(field: &str, file: &str, line_no: usize) -> TaxaResult<TaxonId> {
    field
        .parse::<TaxonId>()
        .map_err(|e| TaxaError::Parse(format!("{} line {}: {}", file, line_no + 1, e)))
}

pub fn parse_nodes<R: BufRead>(reader: R) -> TaxaResult<Vec<NodeRecord>> {
    let mut nodes = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let parts = split_dmp_line(&line);
        if parts.len() < 3 {
            return Err(TaxaError::Parse(format!(
                "nodes.dmp line {}: expected at least 3 fields",
                line_no + 1
            )));
        }

        nodes.push(NodeRecord {
            tax_id: parse_taxid(parts[0], "nodes.dmp", line_no)?,
            parent_id: parse_taxid(parts[1], "nodes.dmp", line_no)?,
            rank: parts[2].to_string(),
        });
    }

    Ok(nodes)
}

pub fn parse_names<R: BufRead>(reader: R) -> TaxaResult<NameTable> {
    let mut table = NameTable::default();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let parts = split_dmp_line(&line);
        if parts.len() < 4 {
            return Err(TaxaError::Parse(format!(
                "names.dmp line {}: expected 4 fields",
                line_no + 1
            )));
        }

        let tax_id = parse_taxid(parts[0], "names.dmp", line_no)?;
        let name = parts[1].to_string();
        match parts[3] {
            "scientific name" => {
                table.scientific.insert(tax_id, name);
            }
            class if SEARCHABLE_NAME_CLASSES.contains(&class) => {
                table.aliases.push((name, tax_id));
            }
            _ => {}
        }
    }

    Ok(table)
}

/// Read an accession2taxid table (`accession  accession.version  taxid  gi`),
/// plain or gzip compressed. The header line is skipped.
pub fn load_accession2taxid<P: AsRef<Path>>(
    store: &mut MemoryTaxonStore,
    path: P,
) -> TaxaResult<usize> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let reader: Box<dyn BufRead> = if path.extension().and_then(|e| e.to_str()) == Some("gz") {
        Box::new(BufReader::new(MultiGzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };

    let mut count = 0;
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let fields: Vec<&str> = line.split('\t').collect();
        if line_no == 0 && fields.first() == Some(&"accession") {
            continue;
        }
        if fields.len() < 3 {
            continue;
        }
        let taxid = parse_taxid(fields[2].trim(), "accession2taxid", line_no)?;
        store.add_accession(fields[1], taxid);
        store.add_accession(fields[0], taxid);
        count += 1;
    }

    debug!("Loaded {} accessions from {}", count, path.display());
    Ok(count)
}

/// Load nodes.dmp + names.dmp (and merged.dmp when present) from `dir`
pub fn load_taxdump<P: AsRef<Path>>(dir: P) -> TaxaResult<(MemoryTaxonStore, AliasIndex)> {
    let dir = dir.as_ref();
    let nodes_path = dir.join("nodes.dmp");
    let names_path = dir.join("names.dmp");

    for required in [&nodes_path, &names_path] {
        if !required.exists() {
            return Err(TaxaError::NotFound(format!(
                "taxonomy dump file {}",
                required.display()
            )));
        }
    }

    let names = parse_names(BufReader::new(File::open(&names_path)?))?;
    let nodes = parse_nodes(BufReader::new(File::open(&nodes_path)?))?;

    let scientific = &names.scientific;
    let mut store = MemoryTaxonStore::from_records(nodes, |node| node.into_taxon(scientific));
    for (name, id) in &names.aliases {
        if store.get(*id).is_some() {
            store.add_name(name, *id);
        }
    }

    let merged_path = dir.join("merged.dmp");
    let aliases = if merged_path.exists() {
        AliasIndex::load_merged_dmp(&merged_path)?
    } else {
        AliasIndex::new()
    };

    info!(
        "Loaded {} taxa and {} merged ids from {}",
        store.len(),
        aliases.len(),
        dir.display()
    );
    Ok((store, aliases))
}

/// Load the store described by `[store]`, falling back to `default_dir` for the dump location
pub fn load_configured(
    config: &StoreConfig,
    default_dir: &Path,
) -> TaxaResult<(MemoryTaxonStore, AliasIndex)> {
    let dir = config
        .taxonomy_dir
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| default_dir.to_path_buf());

    let (mut store, aliases) = load_taxdump(&dir)?;
    for file in &config.accession_files {
        load_accession2taxid(&mut store, file)?;
    }
    Ok((store, aliases))
}
