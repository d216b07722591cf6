//! Completeness checks for assembled lineages

use serde::Serialize;
use std::collections::HashMap;
use taxalink_core::{Rank, TaxonId};
use tracing::warn;

use crate::lineage::Lineage;

/// Per-id outcome of a completeness check, ids sorted ascending
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Lineages containing a superkingdom
    pub complete: Vec<TaxonId>,
    /// Lineages that were assembled but never reach a superkingdom
    pub incomplete: Vec<TaxonId>,
    /// Ids whose assembly failed
    pub failed: Vec<TaxonId>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.incomplete.is_empty() && self.failed.is_empty()
    }
}

fn reaches_root_rank(lineage: &Lineage) -> bool {
    lineage.iter().any(|t| t.rank == Rank::Superkingdom)
}

/// Classify every lineage, warning about each one that is not complete
pub fn validate_lineages(lineages: &HashMap<TaxonId, Option<Lineage>>) -> ValidationReport {
    let mut report = ValidationReport::default();

    let mut ids: Vec<&TaxonId> = lineages.keys().collect();
    ids.sort();

    for id in ids {
        match &lineages[id] {
            None => {
                warn!("Taxid {} could not be resolved: lineage assembly failed", id);
                report.failed.push(*id);
            }
            Some(lineage) if reaches_root_rank(lineage) => report.complete.push(*id),
            Some(lineage) => {
                match lineage.last() {
                    Some(terminal) => warn!(
                        "Taxid {} not resolved to a superkingdom; lineage ends at {} ({}, rank {})",
                        id, terminal.id, terminal.scientific_name, terminal.rank
                    ),
                    None => warn!("Taxid {} not resolved to a superkingdom; lineage is empty", id),
                }
                report.incomplete.push(*id);
            }
        }
    }

    report
}

/// True when every lineage reaches a superkingdom. Diagnostic only, never fails.
pub fn check_resolve(lineages: &HashMap<TaxonId, Option<Lineage>>) -> bool {
    validate_lineages(lineages).is_ok()
}
