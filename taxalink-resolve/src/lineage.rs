//! Bounded parent-chain walks

use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use taxalink_core::{ParentRef, Rank, TaxaError, TaxaResult, Taxon, TaxonId};
use tracing::{debug, warn};

use crate::alias::AliasIndex;

/// Already-resolved taxa keyed by id
pub type TaxonMap = HashMap<TaxonId, Taxon>;

/// Ancestry ordered from the leaf-most included taxon to the root-most one
pub type Lineage = Vec<Taxon>;

/// Hard bound on the number of steps in one walk
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Boundary policy for a lineage walk
///
/// Built through [`LineageBounds::new`], which rejects `single_rank` combined
/// with `stop_rank`. A `start_rank` given together with `single_rank` is
/// accepted and ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineageBounds {
    start_rank: Option<Rank>,
    stop_rank: Option<Rank>,
    single_rank: Option<Rank>,
    max_depth: usize,
}

impl Default for LineageBounds {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl LineageBounds {
    pub fn new(
        start_rank: Option<Rank>,
        stop_rank: Option<Rank>,
        single_rank: Option<Rank>,
    ) -> TaxaResult<Self> {
        if let (Some(single), Some(stop)) = (&single_rank, &stop_rank) {
            return Err(TaxaError::InvalidInput(format!(
                "single rank '{}' cannot be combined with stop rank '{}'",
                single, stop
            )));
        }

        Ok(Self {
            start_rank,
            stop_rank,
            single_rank,
            max_depth: DEFAULT_MAX_DEPTH,
        })
    }

    /// Leaf to root, no rank limits
    pub fn unbounded() -> Self {
        Self {
            start_rank: None,
            stop_rank: None,
            single_rank: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Only the first ancestor (or the taxon itself) with `rank`
    pub fn single(rank: Rank) -> Self {
        Self {
            single_rank: Some(rank),
            ..Self::unbounded()
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    pub fn start_rank(&self) -> Option<&Rank> {
        self.start_rank.as_ref()
    }

    pub fn stop_rank(&self) -> Option<&Rank> {
        self.stop_rank.as_ref()
    }

    pub fn single_rank(&self) -> Option<&Rank> {
        self.single_rank.as_ref()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

/// Direct lookup, then a single redirect through the alias index
fn lookup<'a>(id: TaxonId, taxa: &'a TaxonMap, aliases: &AliasIndex) -> Option<&'a Taxon> {
    taxa.get(&id).or_else(|| {
        let canonical = aliases.resolve(id)?;
        debug!("Taxid {} redirected to {}", id, canonical);
        taxa.get(&canonical)
    })
}

/// Walk upward from `taxid` and collect the ancestry allowed by `bounds`.
///
/// Returns `None` when a step cannot be resolved (missing taxon, missing
/// alias target, unresolved parent), when the parent graph loops or exceeds
/// the depth guard, or when a stop rank was requested but the root was
/// reached without meeting it. An empty lineage is a successful walk that
/// collected nothing (start or single rank never seen).
pub fn assemble_lineage(
    taxid: TaxonId,
    taxa: &TaxonMap,
    aliases: &AliasIndex,
    bounds: &LineageBounds,
) -> Option<Lineage> {
    let mut lineage = Lineage::new();
    let mut visited = HashSet::new();
    let mut collecting = bounds.start_rank.is_none();
    let mut current = taxid;

    loop {
        if visited.len() >= bounds.max_depth {
            warn!(
                "Lineage walk for taxid {} exceeded {} steps",
                taxid, bounds.max_depth
            );
            return None;
        }

        let Some(taxon) = lookup(current, taxa, aliases) else {
            debug!("Lineage for taxid {} broken at unresolved taxid {}", taxid, current);
            return None;
        };

        if !visited.insert(taxon.id) {
            warn!(
                "Cycle in parent chain of taxid {} at taxid {}",
                taxid, taxon.id
            );
            return None;
        }

        if let Some(single) = &bounds.single_rank {
            if taxon.rank == *single {
                return Some(vec![taxon.clone()]);
            }
        } else {
            if !collecting && bounds.start_rank.as_ref() == Some(&taxon.rank) {
                collecting = true;
            }
            let at_stop = bounds.stop_rank.as_ref() == Some(&taxon.rank);
            if collecting || at_stop {
                lineage.push(taxon.clone());
            }
            if at_stop {
                return Some(lineage);
            }
        }

        match taxon.parent {
            ParentRef::Root => break,
            ParentRef::Id(parent) if parent == taxon.id => break,
            ParentRef::Id(parent) => current = parent,
            ParentRef::Unresolved => {
                debug!(
                    "Lineage for taxid {} stops at taxid {} whose parent is unresolved",
                    taxid, taxon.id
                );
                return None;
            }
        }
    }

    if let Some(stop) = &bounds.stop_rank {
        debug!("Taxid {} reached the root without passing rank {}", taxid, stop);
        return None;
    }

    Some(lineage)
}

/// Assemble lineages for a batch of ids. One id's failure does not affect the others.
pub fn resolve_lineages<I>(
    taxids: I,
    taxa: &TaxonMap,
    aliases: &AliasIndex,
    bounds: &LineageBounds,
) -> HashMap<TaxonId, Option<Lineage>>
where
    I: IntoIterator<Item = TaxonId>,
{
    let ids: Vec<TaxonId> = taxids
        .into_iter()
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    ids.into_par_iter()
        .map(|id| (id, assemble_lineage(id, taxa, aliases, bounds)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias::AliasEntry;
    use pretty_assertions::assert_eq;

    fn node(id: u32, parent: Option<u32>, rank: Rank, name: &str) -> Taxon {
        let parent = parent.map_or(ParentRef::Root, |p| ParentRef::Id(TaxonId(p)));
        Taxon::new(id, parent, rank, name)
    }

    /// Homo sapiens up to the root
    fn human_chain() -> TaxonMap {
        vec![
            node(1, None, Rank::NoRank, "root"),
            node(131567, Some(1), Rank::NoRank, "cellular organisms"),
            node(2759, Some(131567), Rank::Superkingdom, "Eukaryota"),
            node(33208, Some(2759), Rank::Kingdom, "Metazoa"),
            node(7711, Some(33208), Rank::Phylum, "Chordata"),
            node(40674, Some(7711), Rank::Class, "Mammalia"),
            node(9443, Some(40674), Rank::Order, "Primates"),
            node(9604, Some(9443), Rank::Family, "Hominidae"),
            node(9605, Some(9604), Rank::Genus, "Homo"),
            node(9606, Some(9605), Rank::Species, "Homo sapiens"),
        ]
        .into_iter()
        .map(|t| (t.id, t))
        .collect()
    }

    fn ids(lineage: &Lineage) -> Vec<u32> {
        lineage.iter().map(|t| t.id.0).collect()
    }

    #[test]
    fn test_unbounded_walk_reaches_root() {
        let taxa = human_chain();
        let lineage =
            assemble_lineage(TaxonId(9606), &taxa, &AliasIndex::new(), &LineageBounds::unbounded())
                .unwrap();

        assert_eq!(
            ids(&lineage),
            vec![9606, 9605, 9604, 9443, 40674, 7711, 33208, 2759, 131567, 1]
        );
        for pair in lineage.windows(2) {
            assert_eq!(pair[0].parent_id(), Some(pair[1].id));
        }
    }

    #[test]
    fn test_stop_rank_is_last_element() {
        let taxa = human_chain();
        let bounds = LineageBounds::new(None, Some(Rank::Phylum), None).unwrap();
        let lineage = assemble_lineage(TaxonId(9606), &taxa, &AliasIndex::new(), &bounds).unwrap();

        assert_eq!(lineage.last().unwrap().rank, Rank::Phylum);
        assert_eq!(ids(&lineage), vec![9606, 9605, 9604, 9443, 40674, 7711]);
    }

    #[test]
    fn test_stop_rank_never_reached_fails() {
        let mut taxa = human_chain();
        taxa.remove(&TaxonId(7711));
        taxa.insert(TaxonId(40674), node(40674, Some(33208), Rank::Class, "Mammalia"));

        let bounds = LineageBounds::new(None, Some(Rank::Phylum), None).unwrap();
        assert!(assemble_lineage(TaxonId(9606), &taxa, &AliasIndex::new(), &bounds).is_none());
    }

    #[test]
    fn test_start_rank_discards_lower_taxa() {
        let taxa = human_chain();
        let bounds = LineageBounds::new(Some(Rank::Family), Some(Rank::Class), None).unwrap();
        let lineage = assemble_lineage(TaxonId(9606), &taxa, &AliasIndex::new(), &bounds).unwrap();

        assert_eq!(ids(&lineage), vec![9604, 9443, 40674]);
    }

    #[test]
    fn test_start_rank_never_seen_collects_only_stop() {
        // Primates reached without passing a family-ranked ancestor
        let mut taxa = human_chain();
        taxa.insert(TaxonId(9605), node(9605, Some(9443), Rank::Genus, "Homo"));
        taxa.remove(&TaxonId(9604));

        let bounds = LineageBounds::new(Some(Rank::Family), Some(Rank::Order), None).unwrap();
        let lineage = assemble_lineage(TaxonId(9606), &taxa, &AliasIndex::new(), &bounds).unwrap();

        assert_eq!(ids(&lineage), vec![9443]);
    }

    #[test]
    fn test_start_rank_without_match_is_empty_success() {
        let taxa = human_chain();
        let bounds = LineageBounds::new(Some(Rank::Subspecies), None, None).unwrap();
        let lineage = assemble_lineage(TaxonId(9606), &taxa, &AliasIndex::new(), &bounds).unwrap();
        assert!(lineage.is_empty());
    }

    #[test]
    fn test_single_rank() {
        let taxa = human_chain();

        let genus = assemble_lineage(
            TaxonId(9606),
            &taxa,
            &AliasIndex::new(),
            &LineageBounds::single(Rank::Genus),
        )
        .unwrap();
        assert_eq!(ids(&genus), vec![9605]);

        // The taxon itself counts
        let species = assemble_lineage(
            TaxonId(9606),
            &taxa,
            &AliasIndex::new(),
            &LineageBounds::single(Rank::Species),
        )
        .unwrap();
        assert_eq!(ids(&species), vec![9606]);

        let missing = assemble_lineage(
            TaxonId(9606),
            &taxa,
            &AliasIndex::new(),
            &LineageBounds::single(Rank::Strain),
        )
        .unwrap();
        assert!(missing.is_empty());
    }

    #[test]
    fn test_single_rank_ignores_start_rank() {
        let taxa = human_chain();
        let bounds = LineageBounds::new(Some(Rank::Order), None, Some(Rank::Genus)).unwrap();
        let lineage = assemble_lineage(TaxonId(9606), &taxa, &AliasIndex::new(), &bounds).unwrap();
        assert_eq!(ids(&lineage), vec![9605]);
    }

    #[test]
    fn test_single_with_stop_is_rejected() {
        let err = LineageBounds::new(None, Some(Rank::Phylum), Some(Rank::Genus)).unwrap_err();
        assert!(matches!(err, TaxaError::InvalidInput(_)));
    }

    #[test]
    fn test_alias_redirect_matches_canonical() {
        let taxa = human_chain();
        let aliases: AliasIndex = vec![AliasEntry::new(555, 9606)].into_iter().collect();
        let bounds = LineageBounds::unbounded();

        let via_alias = assemble_lineage(TaxonId(555), &taxa, &aliases, &bounds).unwrap();
        let direct = assemble_lineage(TaxonId(9606), &taxa, &aliases, &bounds).unwrap();
        assert_eq!(via_alias, direct);
    }

    #[test]
    fn test_alias_to_missing_taxon_fails() {
        let taxa = human_chain();
        let aliases: AliasIndex = vec![AliasEntry::new(555, 42)].into_iter().collect();
        assert!(
            assemble_lineage(TaxonId(555), &taxa, &aliases, &LineageBounds::unbounded()).is_none()
        );
    }

    #[test]
    fn test_missing_parent_fails() {
        let mut taxa = human_chain();
        taxa.remove(&TaxonId(9443));
        assert!(assemble_lineage(
            TaxonId(9606),
            &taxa,
            &AliasIndex::new(),
            &LineageBounds::unbounded()
        )
        .is_none());
    }

    #[test]
    fn test_unresolved_parent_fails_but_stop_below_it_succeeds() {
        let mut taxa = human_chain();
        taxa.insert(
            TaxonId(9443),
            Taxon::new(9443, ParentRef::Unresolved, Rank::Order, "Primates"),
        );

        assert!(assemble_lineage(
            TaxonId(9606),
            &taxa,
            &AliasIndex::new(),
            &LineageBounds::unbounded()
        )
        .is_none());

        let bounds = LineageBounds::new(None, Some(Rank::Order), None).unwrap();
        let lineage = assemble_lineage(TaxonId(9606), &taxa, &AliasIndex::new(), &bounds).unwrap();
        assert_eq!(lineage.last().unwrap().id, TaxonId(9443));
    }

    #[test]
    fn test_deserialized_self_parent_ends_walk() {
        let mut taxa = human_chain();
        let mut root = taxa[&TaxonId(1)].clone();
        root.parent = ParentRef::Id(TaxonId(1));
        taxa.insert(TaxonId(1), root);

        let lineage =
            assemble_lineage(TaxonId(9606), &taxa, &AliasIndex::new(), &LineageBounds::unbounded());
        assert_eq!(lineage.map(|l| l.len()), Some(10));
    }

    #[test]
    fn test_cycle_is_detected() {
        let taxa: TaxonMap = vec![
            node(10, Some(11), Rank::Species, "a"),
            node(11, Some(12), Rank::Genus, "b"),
            node(12, Some(10), Rank::Family, "c"),
        ]
        .into_iter()
        .map(|t| (t.id, t))
        .collect();

        assert!(assemble_lineage(
            TaxonId(10),
            &taxa,
            &AliasIndex::new(),
            &LineageBounds::unbounded()
        )
        .is_none());
    }

    #[test]
    fn test_depth_guard() {
        let taxa = human_chain();
        let bounds = LineageBounds::unbounded().with_max_depth(3);
        assert!(assemble_lineage(TaxonId(9606), &taxa, &AliasIndex::new(), &bounds).is_none());

        let bounds = LineageBounds::unbounded().with_max_depth(10);
        assert!(assemble_lineage(TaxonId(9606), &taxa, &AliasIndex::new(), &bounds).is_some());
    }

    #[test]
    fn test_resolve_lineages_isolates_failures() {
        let taxa = human_chain();
        let result = resolve_lineages(
            vec![TaxonId(9606), TaxonId(404), TaxonId(9606)],
            &taxa,
            &AliasIndex::new(),
            &LineageBounds::unbounded(),
        );

        assert_eq!(result.len(), 2);
        assert!(result[&TaxonId(9606)].is_some());
        assert!(result[&TaxonId(404)].is_none());
    }
}
