/// Taxonomy types used throughout taxalink
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Taxonomy ID type - newtype pattern for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct TaxonId(pub u32);

impl TaxonId {
    /// Create a new TaxonId
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the inner value
    pub fn value(&self) -> u32 {
        self.0
    }

    /// NCBI never assigns 0; it only shows up as a placeholder for "unclassified"
    pub fn is_unclassified(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for TaxonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for TaxonId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<TaxonId> for u32 {
    fn from(taxon: TaxonId) -> Self {
        taxon.0
    }
}

impl FromStr for TaxonId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u32>().map(TaxonId)
    }
}

// Common taxonomy constants
impl TaxonId {
    pub const ROOT: Self = Self(1);
    pub const EUKARYOTA: Self = Self(2759);
    pub const HUMAN: Self = Self(9606);
    pub const MOUSE: Self = Self(10090);
}

/// Taxonomic rank of a node
///
/// The well-known Linnaean ranks get their own variant so boundary comparisons
/// are exhaustive; anything else keeps its label in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Rank {
    Superkingdom,
    Kingdom,
    Phylum,
    Class,
    Order,
    Family,
    Genus,
    Species,
    Subspecies,
    Strain,
    NoRank,
    Other(String),
}

impl Rank {
    /// Parse a rank label. Never fails: unknown labels become `Other`.
    pub fn parse(s: &str) -> Self {
        let label = s.trim().to_lowercase();
        match label.as_str() {
            "superkingdom" => Self::Superkingdom,
            "kingdom" => Self::Kingdom,
            "phylum" => Self::Phylum,
            "class" => Self::Class,
            "order" => Self::Order,
            "family" => Self::Family,
            "genus" => Self::Genus,
            "species" => Self::Species,
            "subspecies" => Self::Subspecies,
            "strain" => Self::Strain,
            "no rank" | "no_rank" | "norank" | "" => Self::NoRank,
            _ => Self::Other(label),
        }
    }

    /// Lowercase label as used by NCBI
    pub fn as_str(&self) -> &str {
        match self {
            Self::Superkingdom => "superkingdom",
            Self::Kingdom => "kingdom",
            Self::Phylum => "phylum",
            Self::Class => "class",
            Self::Order => "order",
            Self::Family => "family",
            Self::Genus => "genus",
            Self::Species => "species",
            Self::Subspecies => "subspecies",
            Self::Strain => "strain",
            Self::NoRank => "no rank",
            Self::Other(label) => label,
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rank {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Rank::parse(s))
    }
}

impl From<String> for Rank {
    fn from(s: String) -> Self {
        Rank::parse(&s)
    }
}

impl From<Rank> for String {
    fn from(rank: Rank) -> Self {
        rank.as_str().to_string()
    }
}

/// Reference from a taxon to its parent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParentRef {
    /// True root: terminates any upward walk
    Root,
    /// Parent is known by id
    Id(TaxonId),
    /// The store has not resolved the parent yet. Not a root.
    #[default]
    Unresolved,
}

impl ParentRef {
    pub fn id(&self) -> Option<TaxonId> {
        match self {
            Self::Id(id) => Some(*id),
            _ => None,
        }
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self, Self::Unresolved)
    }
}

/// A node in the taxonomic hierarchy
///
/// On the wire `parent_id` is a number, `null` for a root, or omitted when the
/// parent is unresolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taxon {
    pub id: TaxonId,
    #[serde(
        rename = "parent_id",
        default,
        skip_serializing_if = "ParentRef::is_unresolved",
        with = "parent_ref_serde"
    )]
    pub parent: ParentRef,
    pub rank: Rank,
    /// Name the record was matched under (synonym, common name, ...)
    pub name: String,
    pub scientific_name: String,
}

impl Taxon {
    /// Create a taxon. A parent equal to the taxon's own id is NCBI's root marker
    /// and is normalised to `ParentRef::Root`.
    pub fn new(
        id: impl Into<TaxonId>,
        parent: ParentRef,
        rank: Rank,
        scientific_name: impl Into<String>,
    ) -> Self {
        let id = id.into();
        let parent = match parent {
            ParentRef::Id(p) if p == id => ParentRef::Root,
            other => other,
        };
        let scientific_name = scientific_name.into();
        Self {
            id,
            parent,
            rank,
            name: scientific_name.clone(),
            scientific_name,
        }
    }

    /// Set the matched name when it differs from the scientific name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn parent_id(&self) -> Option<TaxonId> {
        self.parent.id()
    }

    pub fn is_root(&self) -> bool {
        matches!(self.parent, ParentRef::Root)
    }
}

mod parent_ref_serde {
    use super::{ParentRef, TaxonId};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(parent: &ParentRef, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match parent {
            ParentRef::Id(id) => serializer.serialize_some(&id.0),
            _ => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<ParentRef, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<u32>::deserialize(deserializer)? {
            Some(id) => ParentRef::Id(TaxonId(id)),
            None => ParentRef::Root,
        })
    }
}
