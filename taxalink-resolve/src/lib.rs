//! Batch taxon resolution and lineage assembly
//!
//! Keys (taxids, names, accessions) are resolved against a local [`TaxonStore`]
//! first and, when the caller opts in, against a [`RemoteAuthority`]. Resolved
//! taxa feed the lineage assembler, which walks parent chains under a
//! [`LineageBounds`] policy, and the validator flags chains that never reach a
//! superkingdom.

pub mod alias;
pub mod lineage;
pub mod mapper;
pub mod query;
pub mod remote;
pub mod resilience;
pub mod store;
pub mod validator;

pub use alias::{AliasEntry, AliasIndex};
pub use lineage::{assemble_lineage, resolve_lineages, Lineage, LineageBounds, TaxonMap};
pub use mapper::{Mapper, MapperOptions};
pub use query::{FailureKind, LookupFailure, Query, QueryKey, Resolution};
pub use remote::{HttpAuthority, RemoteAuthority};
pub use resilience::RetryPolicy;
pub use store::{CachedStore, MemoryTaxonStore, TaxonStore};
pub use validator::{check_resolve, validate_lineages, ValidationReport};

// Re-export the shared model so callers need a single import
pub use taxalink_core::{ParentRef, Rank, TaxaError, TaxaResult, Taxon, TaxonId};
