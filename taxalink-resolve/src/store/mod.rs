//! Local taxon stores

pub mod cached;
pub mod memory;
pub mod ncbi;

pub use cached::CachedStore;
pub use memory::MemoryTaxonStore;

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use taxalink_core::{TaxaResult, Taxon, TaxonId};

/// Read-only local source of taxa
///
/// Every lookup takes a batch of keys of one kind and returns the subset it
/// could resolve. Keys missing from the result are unknown to the store; an
/// `Err` means the batch call itself failed. A name may match several taxa.
pub trait TaxonStore: Send + Sync {
    fn lookup_taxids(&self, taxids: &BTreeSet<TaxonId>) -> TaxaResult<HashMap<TaxonId, Vec<Taxon>>>;

    fn lookup_names(&self, names: &BTreeSet<String>) -> TaxaResult<HashMap<String, Vec<Taxon>>>;

    fn lookup_accessions(
        &self,
        accessions: &BTreeSet<String>,
    ) -> TaxaResult<HashMap<String, Vec<Taxon>>>;
}

impl<S: TaxonStore + ?Sized> TaxonStore for Arc<S> {
    fn lookup_taxids(&self, taxids: &BTreeSet<TaxonId>) -> TaxaResult<HashMap<TaxonId, Vec<Taxon>>> {
        (**self).lookup_taxids(taxids)
    }

    fn lookup_names(&self, names: &BTreeSet<String>) -> TaxaResult<HashMap<String, Vec<Taxon>>> {
        (**self).lookup_names(names)
    }

    fn lookup_accessions(
        &self,
        accessions: &BTreeSet<String>,
    ) -> TaxaResult<HashMap<String, Vec<Taxon>>> {
        (**self).lookup_accessions(accessions)
    }
}
