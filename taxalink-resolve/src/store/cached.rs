//! Read-through cache shared across batches

use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use taxalink_core::{TaxaResult, Taxon, TaxonId};
use tracing::debug;

use super::TaxonStore;

/// Hit/miss counters for taxid lookups
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Wraps a store and remembers every taxid answer it has returned.
///
/// Answers are stored exactly as the inner store produced them, so a repeated
/// key always yields the same taxa. Name and accession lookups pass straight
/// through: the taxa they return carry the matched name, not the canonical one.
pub struct CachedStore<S> {
    inner: S,
    cache: RwLock<HashMap<TaxonId, Vec<Taxon>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<S: TaxonStore> CachedStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            cache: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.cache.read().len(),
        }
    }

    pub fn clear(&self) {
        self.cache.write().clear();
    }

    fn remember(&self, answers: &HashMap<TaxonId, Vec<Taxon>>) {
        let mut cache = self.cache.write();
        for (id, taxa) in answers {
            if !taxa.is_empty() {
                cache.entry(*id).or_insert_with(|| taxa.clone());
            }
        }
    }
}

impl<S: TaxonStore> TaxonStore for CachedStore<S> {
    fn lookup_taxids(&self, taxids: &BTreeSet<TaxonId>) -> TaxaResult<HashMap<TaxonId, Vec<Taxon>>> {
        let mut found = HashMap::with_capacity(taxids.len());
        let mut misses = BTreeSet::new();
        {
            let cache = self.cache.read();
            for id in taxids {
                match cache.get(id) {
                    Some(taxa) => {
                        found.insert(*id, taxa.clone());
                    }
                    None => {
                        misses.insert(*id);
                    }
                }
            }
        }

        self.hits.fetch_add(found.len() as u64, Ordering::Relaxed);
        self.misses.fetch_add(misses.len() as u64, Ordering::Relaxed);

        if !misses.is_empty() {
            debug!(
                "Cache answered {}/{} taxids, querying inner store for {}",
                found.len(),
                taxids.len(),
                misses.len()
            );
            let fetched = self.inner.lookup_taxids(&misses)?;
            self.remember(&fetched);
            found.extend(fetched);
        }

        Ok(found)
    }

    fn lookup_names(&self, names: &BTreeSet<String>) -> TaxaResult<HashMap<String, Vec<Taxon>>> {
        self.inner.lookup_names(names)
    }

    fn lookup_accessions(
        &self,
        accessions: &BTreeSet<String>,
    ) -> TaxaResult<HashMap<String, Vec<Taxon>>> {
        self.inner.lookup_accessions(accessions)
    }
}
