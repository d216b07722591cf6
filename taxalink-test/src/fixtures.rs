//! Fixture taxonomy: human and mouse down from the NCBI root

use anyhow::{Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use taxalink_core::{ParentRef, Rank, Taxon, TaxonId};
use taxalink_resolve::{AliasEntry, AliasIndex, MemoryTaxonStore};

/// `(tax_id, parent_id, rank, scientific name)`; the root is its own parent as in nodes.dmp
const NODES: &[(u32, u32, &str, &str)] = &[
    (1, 1, "no rank", "root"),
    (131567, 1, "no rank", "cellular organisms"),
    (2759, 131567, "superkingdom", "Eukaryota"),
    (33208, 2759, "kingdom", "Metazoa"),
    (7711, 33208, "phylum", "Chordata"),
    (40674, 7711, "class", "Mammalia"),
    (9443, 40674, "order", "Primates"),
    (9604, 9443, "family", "Hominidae"),
    (9605, 9604, "genus", "Homo"),
    (9606, 9605, "species", "Homo sapiens"),
    (9989, 40674, "order", "Rodentia"),
    (10066, 9989, "family", "Muridae"),
    (10088, 10066, "genus", "Mus"),
    (10090, 10088, "species", "Mus musculus"),
];

/// Additional names written to names.dmp with their class
const NAMES: &[(u32, &str, &str)] = &[
    (9606, "human", "genbank common name"),
    (9606, "man", "common name"),
    (10090, "house mouse", "genbank common name"),
    (10090, "Mus muscaris", "synonym"),
    (9606, "Homo sapiens Linnaeus, 1758", "authority"),
];

/// Superseded ids and their canonical targets (merged.dmp)
pub const FIXTURE_MERGED: &[(u32, u32)] = &[(555, 9606), (10091, 10090)];

/// `(accession.version, taxid)` rows for accession2taxid
pub const FIXTURE_ACCESSIONS: &[(&str, u32)] = &[
    ("NM_000546.6", 9606),
    ("NC_012920.1", 9606),
    ("NC_005089.1", 10090),
];

/// The fixture taxa with typed parents
pub fn fixture_taxa() -> Vec<Taxon> {
    NODES
        .iter()
        .map(|&(id, parent, rank, name)| {
            Taxon::new(id, ParentRef::Id(TaxonId(parent)), Rank::parse(rank), name)
        })
        .collect()
}

/// Store equivalent to loading [`write_taxdump`] output plus the fixture accessions
pub fn fixture_store() -> MemoryTaxonStore {
    let mut store = MemoryTaxonStore::from_records(fixture_taxa(), Some);
    for &(id, name, class) in NAMES {
        if class != "authority" {
            store.add_name(name, TaxonId(id));
        }
    }
    for &(accession, id) in FIXTURE_ACCESSIONS {
        store.add_accession(accession, TaxonId(id));
    }
    store
}

pub fn fixture_aliases() -> AliasIndex {
    FIXTURE_MERGED
        .iter()
        .map(|&(old, canonical)| AliasEntry::new(old, canonical))
        .collect()
}

/// Write nodes.dmp, names.dmp and merged.dmp into `dir`
pub fn write_taxdump(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let mut nodes = File::create(dir.join("nodes.dmp"))?;
    for &(id, parent, rank, _) in NODES {
        writeln!(nodes, "{}\t|\t{}\t|\t{}\t|\t\t|", id, parent, rank)?;
    }

    let mut names = File::create(dir.join("names.dmp"))?;
    for &(id, _, _, name) in NODES {
        writeln!(names, "{}\t|\t{}\t|\t\t|\tscientific name\t|", id, name)?;
    }
    for &(id, name, class) in NAMES {
        writeln!(names, "{}\t|\t{}\t|\t\t|\t{}\t|", id, name, class)?;
    }

    let mut merged = File::create(dir.join("merged.dmp"))?;
    for &(old, canonical) in FIXTURE_MERGED {
        writeln!(merged, "{}\t|\t{}\t|", old, canonical)?;
    }

    Ok(())
}

/// Write an accession2taxid table at `path`, gzip compressed when it ends in `.gz`
pub fn write_accession2taxid(path: &Path) -> Result<()> {
    let mut body = String::from("accession\taccession.version\ttaxid\tgi\n");
    for (gi, &(versioned, id)) in FIXTURE_ACCESSIONS.iter().enumerate() {
        let base = versioned.split('.').next().unwrap_or(versioned);
        body.push_str(&format!("{}\t{}\t{}\t{}\n", base, versioned, id, 1000 + gi));
    }

    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    if path.extension().and_then(|e| e.to_str()) == Some("gz") {
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(body.as_bytes())?;
        encoder.finish()?;
    } else {
        let mut file = file;
        file.write_all(body.as_bytes())?;
    }
    Ok(())
}
