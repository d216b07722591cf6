//! Isolated test environment backed by a temp directory

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use taxalink_core::{save_config, Config};
use tempfile::TempDir;

use crate::fixtures::{write_accession2taxid, write_taxdump};

/// Temp directory laid out like a taxalink home: `taxonomy/` for dumps and a
/// `config.toml` written on demand. Removed on drop.
pub struct TestEnvironment {
    temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::with_prefix("taxalink-test")
            .context("Failed to create temporary directory")?;
        std::fs::create_dir_all(temp_dir.path().join("taxonomy"))?;
        Ok(Self { temp_dir })
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn taxonomy_dir(&self) -> PathBuf {
        self.root().join("taxonomy")
    }

    pub fn config_path(&self) -> PathBuf {
        self.root().join("config.toml")
    }

    /// Write the fixture dump files plus a gzipped accession table.
    /// Returns the accession table path.
    pub fn install_taxdump(&self) -> Result<PathBuf> {
        write_taxdump(&self.taxonomy_dir())?;
        let accessions = self.taxonomy_dir().join("nucl_gb.accession2taxid.gz");
        write_accession2taxid(&accessions)?;
        Ok(accessions)
    }

    /// Config pointing `[store]` at this environment's taxonomy directory
    pub fn config(&self) -> Config {
        let mut config = Config::default();
        config.store.taxonomy_dir = Some(self.taxonomy_dir().display().to_string());
        config
    }

    /// Install the fixture dumps and write a config that loads them
    pub fn write_config(&self) -> Result<PathBuf> {
        let accessions = self.install_taxdump()?;
        let mut config = self.config();
        config.store.accession_files = vec![accessions.display().to_string()];

        let path = self.config_path();
        save_config(&path, &config).context("Failed to write test config")?;
        Ok(path)
    }

    /// Write an arbitrary file relative to the environment root
    pub fn write_file(&self, relative: &str, contents: &str) -> Result<PathBuf> {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, contents)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_layout() {
        let env = TestEnvironment::new().unwrap();
        assert!(env.taxonomy_dir().is_dir());

        let config_path = env.write_config().unwrap();
        assert!(config_path.exists());
        assert!(env.taxonomy_dir().join("nodes.dmp").exists());
        assert!(env.taxonomy_dir().join("merged.dmp").exists());
    }

    #[test]
    fn test_root_removed_on_drop() {
        let env = TestEnvironment::new().unwrap();
        let root = env.root().to_path_buf();
        drop(env);
        assert!(!root.exists());
    }
}
