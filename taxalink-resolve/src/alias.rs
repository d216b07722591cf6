//! Merged/superseded taxon id redirection

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use taxalink_core::{TaxaError, TaxaResult, TaxonId};
use tracing::debug;

/// One superseded id and the id it was merged into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AliasEntry {
    pub old_id: TaxonId,
    pub canonical_id: TaxonId,
}

impl AliasEntry {
    pub fn new(old_id: impl Into<TaxonId>, canonical_id: impl Into<TaxonId>) -> Self {
        Self {
            old_id: old_id.into(),
            canonical_id: canonical_id.into(),
        }
    }
}

/// Read-only `old_id -> canonical_id` lookup
///
/// Resolution is a single hop: the canonical id is returned as stored, even if
/// it has itself been merged later.
#[derive(Debug, Clone, Default)]
pub struct AliasIndex {
    redirects: HashMap<TaxonId, TaxonId>,
}

impl AliasIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entry: AliasEntry) {
        if entry.old_id == entry.canonical_id {
            debug!("Ignoring self-referencing alias for taxid {}", entry.old_id);
            return;
        }
        self.redirects.insert(entry.old_id, entry.canonical_id);
    }

    /// Canonical id for a superseded id
    pub fn resolve(&self, old_id: TaxonId) -> Option<TaxonId> {
        self.redirects.get(&old_id).copied()
    }

    pub fn len(&self) -> usize {
        self.redirects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.redirects.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = AliasEntry> + '_ {
        self.redirects
            .iter()
            .map(|(old, canonical)| AliasEntry::new(*old, *canonical))
    }

    /// Load NCBI `merged.dmp` (`old_tax_id | new_tax_id |`)
    pub fn load_merged_dmp<P: AsRef<Path>>(path: P) -> TaxaResult<Self> {
        let file = File::open(path.as_ref())?;
        let index = Self::parse_merged(BufReader::new(file))?;
        debug!(
            "Loaded {} merged taxids from {}",
            index.len(),
            path.as_ref().display()
        );
        Ok(index)
    }

    pub fn parse_merged<R: BufRead>(reader: R) -> TaxaResult<Self> {
        let mut index = Self::new();

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let parts: Vec<&str> = line
                .trim_end_matches("\t|")
                .split("\t|\t")
                .map(str::trim)
                .collect();

            if parts.len() < 2 {
                return Err(TaxaError::Parse(format!(
                    "merged.dmp line {}: expected 2 fields, got {}",
                    line_no + 1,
                    parts.len()
                )));
            }

            let old_id = parts[0].parse::<TaxonId>().map_err(|e| {
                TaxaError::Parse(format!("merged.dmp line {}: {}", line_no + 1, e))
            })?;
            let canonical_id = parts[1].parse::<TaxonId>().map_err(|e| {
                TaxaError::Parse(format!("merged.dmp line {}: {}", line_no + 1, e))
            })?;
            index.insert(AliasEntry::new(old_id, canonical_id));
        }

        Ok(index)
    }
}

impl FromIterator<AliasEntry> for AliasIndex {
    fn from_iter<I: IntoIterator<Item = AliasEntry>>(iter: I) -> Self {
        let mut index = Self::new();
        for entry in iter {
            index.insert(entry);
        }
        index
    }
}
