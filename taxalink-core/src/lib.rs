//! Core utilities and types shared across all taxalink crates

pub mod config;
pub mod error;
pub mod logging;
pub mod system;
pub mod types;

// Re-export commonly used types
pub use config::{load_config, save_config, Config};
pub use error::{TaxaError, TaxaResult};

pub use types::{ParentRef, Rank, Taxon, TaxonId};

pub use system::{
    default_config_path, taxalink_home, taxalink_taxonomy_dir,
};

/// Version information for the taxalink project
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");
