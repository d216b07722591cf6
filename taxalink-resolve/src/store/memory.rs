//! In-memory taxon store

use std::collections::{BTreeSet, HashMap};
use taxalink_core::{TaxaResult, Taxon, TaxonId};
use tracing::debug;

use super::TaxonStore;
use crate::lineage::TaxonMap;

/// Taxa indexed by id, by lowercase name and by accession
#[derive(Debug, Default, Clone)]
pub struct MemoryTaxonStore {
    taxa: TaxonMap,
    names: HashMap<String, Vec<TaxonId>>,
    accessions: HashMap<String, TaxonId>,
}

impl MemoryTaxonStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from raw records, using `convert` to turn each record into
    /// a taxon. Records the converter rejects are skipped.
    pub fn from_records<R, I, F>(records: I, convert: F) -> Self
    where
        I: IntoIterator<Item = R>,
        F: Fn(R) -> Option<Taxon>,
    {
        let mut store = Self::new();
        for taxon in records.into_iter().filter_map(convert) {
            store.insert(taxon);
        }
        store
    }

    /// Insert a taxon, indexing its scientific name
    pub fn insert(&mut self, taxon: Taxon) {
        let id = taxon.id;
        let scientific = taxon.scientific_name.clone();
        self.taxa.insert(id, taxon);
        self.add_name(&scientific, id);
    }

    /// Index an additional name (synonym, common name) for a taxon
    pub fn add_name(&mut self, name: &str, id: TaxonId) {
        let ids = self.names.entry(normalize_name(name)).or_default();
        if !ids.contains(&id) {
            ids.push(id);
        }
    }

    /// Map an accession to a taxid. Versioned accessions are also reachable
    /// without their version suffix.
    pub fn add_accession(&mut self, accession: &str, id: TaxonId) {
        let accession = accession.trim();
        if let Some((base, _version)) = accession.rsplit_once('.') {
            self.accessions.entry(base.to_string()).or_insert(id);
        }
        self.accessions.insert(accession.to_string(), id);
    }

    pub fn get(&self, id: TaxonId) -> Option<&Taxon> {
        self.taxa.get(&id)
    }

    pub fn taxa(&self) -> &TaxonMap {
        &self.taxa
    }

    pub fn len(&self) -> usize {
        self.taxa.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taxa.is_empty()
    }

    pub fn accession_count(&self) -> usize {
        self.accessions.len()
    }

    fn accession_taxid(&self, accession: &str) -> Option<TaxonId> {
        let accession = accession.trim();
        self.accessions.get(accession).copied().or_else(|| {
            let (base, _) = accession.rsplit_once('.')?;
            self.accessions.get(base).copied()
        })
    }
}

/// Case- and whitespace-insensitive form of a taxon name
pub(crate) fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

impl TaxonStore for MemoryTaxonStore {
    fn lookup_taxids(&self, taxids: &BTreeSet<TaxonId>) -> TaxaResult<HashMap<TaxonId, Vec<Taxon>>> {
        let found: HashMap<_, _> = taxids
            .iter()
            .filter_map(|id| self.taxa.get(id).map(|t| (*id, vec![t.clone()])))
            .collect();
        debug!("Memory store resolved {}/{} taxids", found.len(), taxids.len());
        Ok(found)
    }

    fn lookup_names(&self, names: &BTreeSet<String>) -> TaxaResult<HashMap<String, Vec<Taxon>>> {
        let mut found = HashMap::new();
        for name in names {
            let Some(ids) = self.names.get(&normalize_name(name)) else {
                continue;
            };
            let taxa: Vec<Taxon> = ids
                .iter()
                .filter_map(|id| self.taxa.get(id))
                .map(|t| t.clone().with_name(name.trim()))
                .collect();
            if !taxa.is_empty() {
                found.insert(name.clone(), taxa);
            }
        }
        debug!("Memory store resolved {}/{} names", found.len(), names.len());
        Ok(found)
    }

    fn lookup_accessions(
        &self,
        accessions: &BTreeSet<String>,
    ) -> TaxaResult<HashMap<String, Vec<Taxon>>> {
        let found: HashMap<_, _> = accessions
            .iter()
            .filter_map(|acc| {
                let id = self.accession_taxid(acc)?;
                let taxon = self.taxa.get(&id)?;
                Some((acc.clone(), vec![taxon.clone()]))
            })
            .collect();
        debug!(
            "Memory store resolved {}/{} accessions",
            found.len(),
            accessions.len()
        );
        Ok(found)
    }
}
