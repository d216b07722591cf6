//! Batch resolution of taxids, names and accessions
//!
//! Every batch goes to the local store first in a single call. Keys the store
//! does not know are escalated to the remote authority only when the mapper
//! was configured for fallback and a remote client is attached; the `*_remote`
//! variants skip the store entirely. Lookup errors and deadline expiry are
//! recorded per key and never abort the batch.

use async_trait::async_trait;
use futures::future::join_all;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use taxalink_core::{Config, TaxaError, TaxaResult, Taxon, TaxonId};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::alias::AliasIndex;
use crate::lineage::{resolve_lineages, Lineage, LineageBounds, TaxonMap, DEFAULT_MAX_DEPTH};
use crate::query::{FailureKind, LookupFailure, Query, QueryKey, Resolution};
use crate::remote::{HttpAuthority, RemoteAuthority};
use crate::store::memory::normalize_name;
use crate::store::TaxonStore;

/// Tuning for a [`Mapper`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapperOptions {
    /// Escalate keys the store could not resolve to the remote authority
    pub remote_fallback: bool,
    /// Deadline for a whole batch, store and remote phases together
    pub deadline: Option<Duration>,
    /// Largest number of keys sent in one remote call
    pub max_batch_size: usize,
    /// Bound on ancestry collection rounds
    pub max_lineage_depth: usize,
}

impl Default for MapperOptions {
    fn default() -> Self {
        Self {
            remote_fallback: false,
            deadline: None,
            max_batch_size: 10_000,
            max_lineage_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl From<&Config> for MapperOptions {
    fn from(config: &Config) -> Self {
        Self {
            remote_fallback: config.resolver.remote_fallback,
            deadline: config.resolver.deadline_ms.map(Duration::from_millis),
            max_batch_size: config.remote.max_batch_size.max(1),
            max_lineage_depth: config.resolver.max_lineage_depth,
        }
    }
}

/// One kind of key and how each source looks it up
#[async_trait]
trait KeyKind: Send + Sync + 'static {
    type Key: QueryKey;

    fn label(&self) -> &'static str;

    /// Form used to match keys echoed back by the remote authority
    fn normalize(&self, key: &Self::Key) -> Self::Key {
        key.clone()
    }

    fn lookup_store(
        &self,
        store: &dyn TaxonStore,
        keys: &BTreeSet<Self::Key>,
    ) -> TaxaResult<HashMap<Self::Key, Vec<Taxon>>>;

    async fn fetch_remote(
        &self,
        remote: &dyn RemoteAuthority,
        keys: &[Self::Key],
    ) -> TaxaResult<HashMap<Self::Key, Vec<Taxon>>>;
}

struct ByTaxId;

#[async_trait]
impl KeyKind for ByTaxId {
    type Key = TaxonId;

    fn label(&self) -> &'static str {
        "taxid"
    }

    fn lookup_store(
        &self,
        store: &dyn TaxonStore,
        keys: &BTreeSet<TaxonId>,
    ) -> TaxaResult<HashMap<TaxonId, Vec<Taxon>>> {
        store.lookup_taxids(keys)
    }

    async fn fetch_remote(
        &self,
        remote: &dyn RemoteAuthority,
        keys: &[TaxonId],
    ) -> TaxaResult<HashMap<TaxonId, Vec<Taxon>>> {
        remote.fetch_taxids(keys).await
    }
}

struct ByName;

#[async_trait]
impl KeyKind for ByName {
    type Key = String;

    fn label(&self) -> &'static str {
        "name"
    }

    fn normalize(&self, key: &String) -> String {
        normalize_name(key)
    }

    fn lookup_store(
        &self,
        store: &dyn TaxonStore,
        keys: &BTreeSet<String>,
    ) -> TaxaResult<HashMap<String, Vec<Taxon>>> {
        store.lookup_names(keys)
    }

    async fn fetch_remote(
        &self,
        remote: &dyn RemoteAuthority,
        keys: &[String],
    ) -> TaxaResult<HashMap<String, Vec<Taxon>>> {
        remote.fetch_names(keys).await
    }
}

struct ByAccession {
    db: String,
}

#[async_trait]
impl KeyKind for ByAccession {
    type Key = String;

    fn label(&self) -> &'static str {
        "accession"
    }

    fn lookup_store(
        &self,
        store: &dyn TaxonStore,
        keys: &BTreeSet<String>,
    ) -> TaxaResult<HashMap<String, Vec<Taxon>>> {
        store.lookup_accessions(keys)
    }

    async fn fetch_remote(
        &self,
        remote: &dyn RemoteAuthority,
        keys: &[String],
    ) -> TaxaResult<HashMap<String, Vec<Taxon>>> {
        remote.fetch_accessions(keys, &self.db).await
    }
}

/// Run `fut` until the optional deadline; `None` means the deadline won
async fn within<F: Future>(deadline: Option<Instant>, fut: F) -> Option<F::Output> {
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, fut).await.ok(),
        None => Some(fut.await),
    }
}

fn fail_pending<K: QueryKey>(
    query: &mut Query<K>,
    pending: &mut BTreeSet<K>,
    kind: FailureKind,
    message: &str,
) {
    for key in std::mem::take(pending) {
        query.record(key, Resolution::Failed(LookupFailure::new(kind, message)));
    }
}

/// Resolves batches of keys against a store and an optional remote authority
pub struct Mapper {
    store: Arc<dyn TaxonStore>,
    remote: Option<Arc<dyn RemoteAuthority>>,
    options: MapperOptions,
}

impl Mapper {
    pub fn new<S: TaxonStore + 'static>(store: S) -> Self {
        Self {
            store: Arc::new(store),
            remote: None,
            options: MapperOptions::default(),
        }
    }

    /// Mapper with options from `config`, plus an HTTP remote when `[remote]` is configured
    pub fn from_config<S: TaxonStore + 'static>(store: S, config: &Config) -> TaxaResult<Self> {
        let mapper = Self::new(store).with_options(MapperOptions::from(config));
        if config.remote.is_configured() {
            Ok(mapper.with_remote(HttpAuthority::from_config(&config.remote)?))
        } else {
            Ok(mapper)
        }
    }

    pub fn with_remote<R: RemoteAuthority + 'static>(mut self, remote: R) -> Self {
        self.remote = Some(Arc::new(remote));
        self
    }

    pub fn with_options(mut self, options: MapperOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &MapperOptions {
        &self.options
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    pub async fn map_by_taxid<I>(&self, taxids: I) -> TaxaResult<Query<TaxonId>>
    where
        I: IntoIterator<Item = TaxonId>,
    {
        self.resolve(Arc::new(ByTaxId), taxids, false).await
    }

    pub async fn map_by_name<I, S>(&self, names: I) -> TaxaResult<Query<String>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resolve(Arc::new(ByName), names.into_iter().map(Into::into), false)
            .await
    }

    /// `authority_db` selects the remote accession namespace; the local store ignores it
    pub async fn map_by_accession<I, S>(
        &self,
        accessions: I,
        authority_db: &str,
    ) -> TaxaResult<Query<String>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let kind = ByAccession {
            db: authority_db.to_string(),
        };
        self.resolve(Arc::new(kind), accessions.into_iter().map(Into::into), false)
            .await
    }

    pub async fn map_by_taxid_remote<I>(&self, taxids: I) -> TaxaResult<Query<TaxonId>>
    where
        I: IntoIterator<Item = TaxonId>,
    {
        self.resolve(Arc::new(ByTaxId), taxids, true).await
    }

    pub async fn map_by_name_remote<I, S>(&self, names: I) -> TaxaResult<Query<String>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resolve(Arc::new(ByName), names.into_iter().map(Into::into), true)
            .await
    }

    pub async fn map_by_accession_remote<I, S>(
        &self,
        accessions: I,
        authority_db: &str,
    ) -> TaxaResult<Query<String>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let kind = ByAccession {
            db: authority_db.to_string(),
        };
        self.resolve(Arc::new(kind), accessions.into_iter().map(Into::into), true)
            .await
    }

    fn batch_deadline(&self) -> Option<Instant> {
        self.options.deadline.map(|d| Instant::now() + d)
    }

    async fn resolve<T, I>(&self, kind: Arc<T>, keys: I, remote_only: bool) -> TaxaResult<Query<T::Key>>
    where
        T: KeyKind,
        I: IntoIterator<Item = T::Key>,
    {
        self.resolve_until(kind, keys, remote_only, self.batch_deadline())
            .await
    }

    async fn resolve_until<T, I>(
        &self,
        kind: Arc<T>,
        keys: I,
        remote_only: bool,
        deadline: Option<Instant>,
    ) -> TaxaResult<Query<T::Key>>
    where
        T: KeyKind,
        I: IntoIterator<Item = T::Key>,
    {
        let keys: BTreeSet<T::Key> = keys.into_iter().collect();
        if keys.is_empty() {
            return Err(TaxaError::InvalidInput(format!(
                "no {} keys to resolve",
                kind.label()
            )));
        }
        if remote_only && self.remote.is_none() {
            return Err(TaxaError::Configuration(format!(
                "remote {} lookup requested but no remote authority is configured",
                kind.label()
            )));
        }

        let mut query = Query::new(keys.iter().cloned().collect());
        let mut pending = BTreeSet::new();

        for key in keys {
            match key.malformed() {
                Some(reason) => {
                    debug!("Skipping malformed {} key {:?}: {}", kind.label(), key, reason);
                    query.record(
                        key,
                        Resolution::Failed(LookupFailure::new(FailureKind::MalformedKey, reason)),
                    );
                }
                None => {
                    pending.insert(key);
                }
            }
        }

        if !remote_only && !pending.is_empty() {
            self.resolve_from_store(&kind, &mut query, &mut pending, deadline)
                .await;
        }

        let escalate = remote_only || self.options.remote_fallback;
        if escalate && !pending.is_empty() {
            if let Some(remote) = self.remote.as_deref() {
                self.resolve_from_remote(&kind, remote, &mut query, &mut pending, deadline)
                    .await;
            }
        }

        for key in std::mem::take(&mut pending) {
            query.record(key, Resolution::Resolved(Vec::new()));
        }

        info!(
            "Resolved {} {} keys: {} matched, {} failed",
            query.len(),
            kind.label(),
            query.queries.values().filter(|r| r.is_match()).count(),
            query.failures().count()
        );
        Ok(query)
    }

    async fn resolve_from_store<T: KeyKind>(
        &self,
        kind: &Arc<T>,
        query: &mut Query<T::Key>,
        pending: &mut BTreeSet<T::Key>,
        deadline: Option<Instant>,
    ) {
        debug!("Looking up {} {} keys in the store", pending.len(), kind.label());

        let store = Arc::clone(&self.store);
        let task_kind = Arc::clone(kind);
        let keys = pending.clone();
        let task = tokio::task::spawn_blocking(move || task_kind.lookup_store(&*store, &keys));

        match within(deadline, task).await {
            None => {
                warn!("Deadline elapsed during {} store lookup", kind.label());
                fail_pending(query, pending, FailureKind::Timeout, "deadline elapsed during store lookup");
            }
            Some(Err(e)) => {
                warn!("Store task for {} lookup did not complete: {}", kind.label(), e);
                fail_pending(query, pending, FailureKind::Store, &format!("store task failed: {}", e));
            }
            Some(Ok(Err(e))) => {
                warn!("Store {} lookup failed: {}", kind.label(), e);
                fail_pending(query, pending, FailureKind::Store, &e.to_string());
            }
            Some(Ok(Ok(found))) => {
                for (key, taxa) in found {
                    if !taxa.is_empty() && pending.remove(&key) {
                        query.record(key, Resolution::Resolved(taxa));
                    }
                }
            }
        }
    }

    async fn resolve_from_remote<T: KeyKind>(
        &self,
        kind: &Arc<T>,
        remote: &dyn RemoteAuthority,
        query: &mut Query<T::Key>,
        pending: &mut BTreeSet<T::Key>,
        deadline: Option<Instant>,
    ) {
        let batch: Vec<T::Key> = pending.iter().cloned().collect();
        let chunk_size = self.options.max_batch_size.max(1);
        debug!(
            "Escalating {} {} keys to the remote authority in {} call(s)",
            batch.len(),
            kind.label(),
            batch.len().div_ceil(chunk_size)
        );

        let calls = batch
            .chunks(chunk_size)
            .map(|chunk| kind.fetch_remote(remote, chunk));

        let Some(results) = within(deadline, join_all(calls)).await else {
            warn!("Deadline elapsed during {} remote lookup", kind.label());
            fail_pending(query, pending, FailureKind::Timeout, "deadline elapsed during remote lookup");
            return;
        };

        let requested: HashMap<T::Key, T::Key> = batch
            .iter()
            .map(|key| (kind.normalize(key), key.clone()))
            .collect();

        for (chunk, result) in batch.chunks(chunk_size).zip(results) {
            match result {
                Ok(found) => {
                    for (key, taxa) in found {
                        let original = if pending.contains(&key) {
                            Some(key.clone())
                        } else {
                            requested.get(&kind.normalize(&key)).cloned()
                        };
                        match original {
                            Some(original) if pending.remove(&original) => {
                                query.record(original, Resolution::Resolved(taxa));
                            }
                            _ => debug!(
                                "Ignoring {} key {:?} the remote authority was not asked for",
                                kind.label(),
                                key
                            ),
                        }
                    }
                }
                Err(e) => {
                    warn!(
                        "Remote {} lookup failed for {} keys: {}",
                        kind.label(),
                        chunk.len(),
                        e
                    );
                    let message = e.to_string();
                    for key in chunk {
                        if pending.remove(key) {
                            query.record(
                                key.clone(),
                                Resolution::Failed(LookupFailure::new(FailureKind::Remote, message.as_str())),
                            );
                        }
                    }
                }
            }
        }
    }

    /// Resolve `taxids` and every ancestor reachable from them.
    ///
    /// Each round maps the parents not yet known; ids the sources cannot
    /// resolve are retried once through `aliases`. Stops when no new ids
    /// appear, after `max_lineage_depth` rounds, or when the batch deadline
    /// (one for all rounds) elapses.
    pub async fn collect_ancestry<I>(&self, taxids: I, aliases: &AliasIndex) -> TaxaResult<TaxonMap>
    where
        I: IntoIterator<Item = TaxonId>,
    {
        let mut frontier: BTreeSet<TaxonId> = taxids.into_iter().collect();
        if frontier.is_empty() {
            return Err(TaxaError::InvalidInput("no taxids to collect ancestry for".to_string()));
        }

        let deadline = self.batch_deadline();
        let mut taxa = TaxonMap::new();
        let mut seen = HashSet::new();
        let mut rounds = 0;

        while rounds < self.options.max_lineage_depth {
            frontier.retain(|id| !id.is_unclassified() && !seen.contains(id));
            if frontier.is_empty() {
                break;
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                warn!(
                    "Deadline elapsed after {} ancestry rounds, {} ids not fetched",
                    rounds,
                    frontier.len()
                );
                break;
            }
            seen.extend(frontier.iter().copied());
            rounds += 1;

            let query = self
                .resolve_until(Arc::new(ByTaxId), frontier.iter().copied(), false, deadline)
                .await?;
            let mut next = BTreeSet::new();

            for id in &frontier {
                match query.get(id) {
                    Some(Resolution::Resolved(found)) if !found.is_empty() => {
                        for taxon in found {
                            if taxon.id != *id {
                                taxa.entry(*id).or_insert_with(|| taxon.clone());
                            }
                            taxa.insert(taxon.id, taxon.clone());
                            if let Some(parent) = taxon.parent_id() {
                                if !taxa.contains_key(&parent) {
                                    next.insert(parent);
                                }
                            }
                        }
                    }
                    Some(Resolution::Failed(failure)) => {
                        debug!("Ancestry of taxid {} stops: {}", id, failure);
                    }
                    _ => {
                        if let Some(canonical) = aliases.resolve(*id) {
                            if !taxa.contains_key(&canonical) {
                                next.insert(canonical);
                            }
                        }
                    }
                }
            }

            frontier = next;
        }

        frontier.retain(|id| !seen.contains(id));
        if !frontier.is_empty() {
            warn!(
                "Ancestry collection stopped after {} rounds with {} ids unresolved",
                rounds,
                frontier.len()
            );
        }

        debug!("Collected {} taxa in {} rounds", taxa.len(), rounds);
        Ok(taxa)
    }

    /// Collect ancestry for `taxids` and assemble their lineages under `bounds`
    pub async fn lineages<I>(
        &self,
        taxids: I,
        aliases: &AliasIndex,
        bounds: &LineageBounds,
    ) -> TaxaResult<HashMap<TaxonId, Option<Lineage>>>
    where
        I: IntoIterator<Item = TaxonId>,
    {
        let taxids: Vec<TaxonId> = taxids.into_iter().collect();
        let taxa = self.collect_ancestry(taxids.iter().copied(), aliases).await?;
        Ok(resolve_lineages(taxids, &taxa, aliases, bounds))
    }
}
