//! Remote taxonomy authority

pub mod http;

pub use http::HttpAuthority;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use taxalink_core::{TaxaResult, Taxon, TaxonId};

/// Network-backed batch lookup service
///
/// Same result shape as [`crate::TaxonStore`]: the subset of keys the
/// authority knows, each with one or more taxa. Implementations handle their
/// own retries; an `Err` is final for the whole batch.
#[async_trait]
pub trait RemoteAuthority: Send + Sync {
    async fn fetch_taxids(&self, taxids: &[TaxonId]) -> TaxaResult<HashMap<TaxonId, Vec<Taxon>>>;

    async fn fetch_names(&self, names: &[String]) -> TaxaResult<HashMap<String, Vec<Taxon>>>;

    /// `db` names the accession namespace to search (e.g. "nucleotide", "protein")
    async fn fetch_accessions(
        &self,
        accessions: &[String],
        db: &str,
    ) -> TaxaResult<HashMap<String, Vec<Taxon>>>;
}

#[async_trait]
impl<R: RemoteAuthority + ?Sized> RemoteAuthority for Arc<R> {
    async fn fetch_taxids(&self, taxids: &[TaxonId]) -> TaxaResult<HashMap<TaxonId, Vec<Taxon>>> {
        (**self).fetch_taxids(taxids).await
    }

    async fn fetch_names(&self, names: &[String]) -> TaxaResult<HashMap<String, Vec<Taxon>>> {
        (**self).fetch_names(names).await
    }

    async fn fetch_accessions(
        &self,
        accessions: &[String],
        db: &str,
    ) -> TaxaResult<HashMap<String, Vec<Taxon>>> {
        (**self).fetch_accessions(accessions, db).await
    }
}
