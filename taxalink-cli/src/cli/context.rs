//! Shared setup for commands: config, logging, store and mapper
use anyhow::{Context as _, Result};
use std::future::Future;
use taxalink_core::config::load_config_or_default;
use taxalink_core::logging::init_logging;
use taxalink_core::{default_config_path, load_config, taxalink_taxonomy_dir, Config, TaxaError, TaxonId};
use taxalink_resolve::store::ncbi::load_configured;
use taxalink_resolve::{AliasIndex, Mapper, MemoryTaxonStore};
use tracing::{debug, info};

use super::{GlobalArgs, KeyArgs};

/// Everything a command needs to resolve keys
pub struct Context {
    pub config: Config,
    pub mapper: Mapper,
    pub aliases: AliasIndex,
}

impl GlobalArgs {
    pub fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => load_config(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => load_config_or_default(default_config_path())?,
        };
        if let Some(dir) = &self.taxonomy_dir {
            config.store.taxonomy_dir = Some(dir.display().to_string());
        }
        Ok(config)
    }

    fn log_level<'a>(&self, config: &'a Config) -> &'a str {
        match self.verbose {
            0 => &config.logging.level,
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    /// Load config, start logging, load the taxonomy and build the mapper.
    /// `adjust` runs on the config before the mapper is built.
    pub fn context_with<F>(&self, adjust: F) -> Result<Context>
    where
        F: FnOnce(&mut Config),
    {
        self.build_context(true, adjust)
    }

    /// Like [`GlobalArgs::context_with`] but over an empty store, for
    /// commands that only talk to the remote authority
    pub fn remote_context_with<F>(&self, adjust: F) -> Result<Context>
    where
        F: FnOnce(&mut Config),
    {
        self.build_context(false, adjust)
    }

    fn build_context<F>(&self, load_local: bool, adjust: F) -> Result<Context>
    where
        F: FnOnce(&mut Config),
    {
        let mut config = self.load_config()?;
        init_logging(self.log_level(&config));
        adjust(&mut config);
        debug!("Resolver settings: {:?}", config.resolver);

        let (store, aliases) = if load_local {
            let (store, aliases) = load_configured(&config.store, &taxalink_taxonomy_dir())?;
            info!("Taxonomy loaded: {} taxa, {} merged ids", store.len(), aliases.len());
            (store, aliases)
        } else {
            debug!("Skipping local taxonomy, remote lookups only");
            (MemoryTaxonStore::new(), AliasIndex::new())
        };

        let mapper = Mapper::from_config(store, &config)?;
        Ok(Context {
            config,
            mapper,
            aliases,
        })
    }
}

impl KeyArgs {
    /// Command-line keys followed by the keys from `--input`
    pub fn collect(&self) -> Result<Vec<String>> {
        let mut keys = self.keys.clone();
        if let Some(path) = &self.input {
            let contents = std::fs::read_to_string(path)
                .map_err(TaxaError::from)
                .with_context(|| format!("Failed to read keys from {}", path.display()))?;
            keys.extend(
                contents
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty() && !line.starts_with('#'))
                    .map(String::from),
            );
        }
        Ok(keys)
    }

    pub fn taxids(&self) -> Result<Vec<TaxonId>> {
        self.collect()?
            .iter()
            .map(|key| {
                key.parse::<TaxonId>()
                    .map_err(|e| TaxaError::Parse(format!("invalid taxid '{}': {}", key, e)).into())
            })
            .collect()
    }
}

/// Run an async resolution on a fresh runtime
pub fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    Ok(runtime.block_on(future))
}
