/// Core types shared across all taxalink modules
pub mod taxonomy;

pub use taxonomy::{ParentRef, Rank, Taxon, TaxonId};
