//! Per-batch resolution results

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use taxalink_core::{Taxon, TaxonId};

use crate::lineage::TaxonMap;

/// A key that can be resolved in a batch
pub trait QueryKey:
    Clone + Eq + Hash + Ord + fmt::Display + fmt::Debug + Send + Sync + 'static
{
    /// Why the key can never match anything, if it is malformed
    fn malformed(&self) -> Option<&'static str>;
}

impl QueryKey for TaxonId {
    fn malformed(&self) -> Option<&'static str> {
        if self.is_unclassified() {
            Some("taxid 0 is not a valid identifier")
        } else {
            None
        }
    }
}

impl QueryKey for String {
    fn malformed(&self) -> Option<&'static str> {
        if self.trim().is_empty() {
            Some("key is blank")
        } else {
            None
        }
    }
}

/// Why a key could not be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Store,
    Remote,
    Timeout,
    MalformedKey,
}

/// Failure marker recorded for a key whose lookup errored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl LookupFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for LookupFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

/// Outcome for one key
///
/// `Resolved(vec![])` means every consulted source answered "no match";
/// `Failed` means a lookup call itself went wrong.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Resolution {
    Resolved(Vec<Taxon>),
    Failed(LookupFailure),
}

impl Resolution {
    pub fn taxa(&self) -> Option<&[Taxon]> {
        match self {
            Self::Resolved(taxa) => Some(taxa),
            Self::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&LookupFailure> {
        match self {
            Self::Failed(failure) => Some(failure),
            Self::Resolved(_) => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Resolved with at least one taxon
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Resolved(taxa) if !taxa.is_empty())
    }
}

/// One batch resolution request and its per-key results
#[derive(Debug, Clone, Serialize)]
pub struct Query<K: QueryKey> {
    keys: Vec<K>,
    pub queries: HashMap<K, Resolution>,
}

impl<K: QueryKey> Query<K> {
    pub(crate) fn new(keys: Vec<K>) -> Self {
        let capacity = keys.len();
        Self {
            keys,
            queries: HashMap::with_capacity(capacity),
        }
    }

    pub(crate) fn record(&mut self, key: K, resolution: Resolution) {
        self.queries.insert(key, resolution);
    }

    /// Keys of the batch, in sorted order
    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    pub fn get(&self, key: &K) -> Option<&Resolution> {
        self.queries.get(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Every input key has exactly one entry
    pub fn is_complete(&self) -> bool {
        self.queries.len() == self.keys.len()
            && self.keys.iter().all(|k| self.queries.contains_key(k))
    }

    pub fn failures(&self) -> impl Iterator<Item = (&K, &LookupFailure)> {
        self.queries
            .iter()
            .filter_map(|(k, r)| r.failure().map(|f| (k, f)))
    }

    /// Keys that resolved to an empty list
    pub fn unmatched(&self) -> impl Iterator<Item = &K> {
        self.queries
            .iter()
            .filter(|(_, r)| matches!(r, Resolution::Resolved(t) if t.is_empty()))
            .map(|(k, _)| k)
    }

    /// All resolved taxa keyed by id
    pub fn taxon_map(&self) -> TaxonMap {
        self.queries
            .values()
            .filter_map(Resolution::taxa)
            .flatten()
            .map(|t| (t.id, t.clone()))
            .collect()
    }
}
