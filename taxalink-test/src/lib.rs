//! Test utilities for the taxalink workspace
//!
//! Shared fixtures and mocks for the integration tests of the workspace
//! crates.
//!
//! # Features
//!
//! - **Fixtures**: a small human/mouse taxonomy, as taxa or as NCBI dump files
//! - **Test Environment**: temp directories holding dumps and config files
//! - **Mock Authority**: a scriptable [`RemoteAuthority`](taxalink_resolve::RemoteAuthority)

pub mod environment;
pub mod fixtures;
pub mod mock;

pub use environment::TestEnvironment;
pub use fixtures::{
    fixture_aliases, fixture_store, fixture_taxa, write_accession2taxid, write_taxdump,
    FIXTURE_ACCESSIONS, FIXTURE_MERGED,
};
pub use mock::MockAuthority;

pub use anyhow::{Context, Result};
pub use tempfile;

/// Initialize test logging (safe to call from every test)
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(taxalink_core::logging::build_filter("debug"))
        .with_test_writer()
        .try_init();
}

/// Run a test inside a fresh [`TestEnvironment`]
pub fn with_test_env<F, R>(f: F) -> Result<R>
where
    F: FnOnce(&TestEnvironment) -> Result<R>,
{
    let env = TestEnvironment::new()?;
    f(&env)
}
