//! Scriptable remote authority

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use taxalink_core::{TaxaError, TaxaResult, Taxon, TaxonId};
use taxalink_resolve::RemoteAuthority;

/// In-memory [`RemoteAuthority`] that counts calls and records every key it receives
#[derive(Default)]
pub struct MockAuthority {
    taxa: HashMap<TaxonId, Taxon>,
    names: HashMap<String, Vec<TaxonId>>,
    accessions: HashMap<String, TaxonId>,
    failure: Option<String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    received: Mutex<Vec<String>>,
    dbs: Mutex<Vec<String>>,
}

impl MockAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `taxa` by id and by scientific name
    pub fn with_taxa<I: IntoIterator<Item = Taxon>>(mut self, taxa: I) -> Self {
        for taxon in taxa {
            self.names
                .entry(taxon.scientific_name.to_lowercase())
                .or_default()
                .push(taxon.id);
            self.taxa.insert(taxon.id, taxon);
        }
        self
    }

    pub fn with_name(mut self, name: &str, id: TaxonId) -> Self {
        self.names.entry(name.to_lowercase()).or_default().push(id);
        self
    }

    pub fn with_accession(mut self, accession: &str, id: TaxonId) -> Self {
        self.accessions.insert(accession.to_string(), id);
        self
    }

    /// Every call fails with a network error carrying `message`
    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    /// Every call sleeps for `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Keys received so far, in call order
    pub fn received_keys(&self) -> Vec<String> {
        self.received.lock().clone()
    }

    /// Accession databases requested so far
    pub fn requested_dbs(&self) -> Vec<String> {
        self.dbs.lock().clone()
    }

    async fn begin<K: ToString>(&self, keys: &[K]) -> TaxaResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.received
            .lock()
            .extend(keys.iter().map(ToString::to_string));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.failure {
            Some(message) => Err(TaxaError::Network(message.clone())),
            None => Ok(()),
        }
    }

    fn taxa_for(&self, ids: &[TaxonId]) -> Vec<Taxon> {
        ids.iter().filter_map(|id| self.taxa.get(id).cloned()).collect()
    }
}

#[async_trait]
impl RemoteAuthority for MockAuthority {
    async fn fetch_taxids(&self, taxids: &[TaxonId]) -> TaxaResult<HashMap<TaxonId, Vec<Taxon>>> {
        self.begin(taxids).await?;
        Ok(taxids
            .iter()
            .filter_map(|id| self.taxa.get(id).map(|t| (*id, vec![t.clone()])))
            .collect())
    }

    async fn fetch_names(&self, names: &[String]) -> TaxaResult<HashMap<String, Vec<Taxon>>> {
        self.begin(names).await?;
        Ok(names
            .iter()
            .filter_map(|name| {
                let ids = self.names.get(&name.to_lowercase())?;
                let taxa = self.taxa_for(ids);
                (!taxa.is_empty()).then(|| (name.clone(), taxa))
            })
            .collect())
    }

    async fn fetch_accessions(
        &self,
        accessions: &[String],
        db: &str,
    ) -> TaxaResult<HashMap<String, Vec<Taxon>>> {
        self.dbs.lock().push(db.to_string());
        self.begin(accessions).await?;
        Ok(accessions
            .iter()
            .filter_map(|acc| {
                let id = self.accessions.get(acc)?;
                Some((acc.clone(), self.taxa_for(&[*id])))
            })
            .filter(|(_, taxa)| !taxa.is_empty())
            .collect())
    }
}
