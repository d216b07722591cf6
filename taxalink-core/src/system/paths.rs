use std::path::PathBuf;
use std::sync::OnceLock;

// Cache the paths to avoid repeated environment lookups
static TAXALINK_HOME: OnceLock<PathBuf> = OnceLock::new();
static TAXALINK_TAXONOMY_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Get the taxalink home directory
/// Checks TAXALINK_HOME environment variable, falls back to ${HOME}/.taxalink
pub fn taxalink_home() -> PathBuf {
    TAXALINK_HOME
        .get_or_init(|| {
            if let Ok(path) = std::env::var("TAXALINK_HOME") {
                PathBuf::from(path)
            } else {
                let home = std::env::var("HOME").unwrap_or_else(|_| {
                    std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string())
                });
                PathBuf::from(home).join(".taxalink")
            }
        })
        .clone()
}

/// Get the directory holding the NCBI taxdump files (nodes.dmp, names.dmp, merged.dmp)
/// Checks TAXALINK_TAXONOMY_DIR environment variable, falls back to TAXALINK_HOME/taxonomy
pub fn taxalink_taxonomy_dir() -> PathBuf {
    TAXALINK_TAXONOMY_DIR
        .get_or_init(|| {
            if let Ok(path) = std::env::var("TAXALINK_TAXONOMY_DIR") {
                PathBuf::from(path)
            } else {
                taxalink_home().join("taxonomy")
            }
        })
        .clone()
}

/// Default location of the configuration file
/// Returns: TAXALINK_HOME/config.toml
pub fn default_config_path() -> PathBuf {
    taxalink_home().join("config.toml")
}

/// Check if running with a custom home directory
pub fn is_custom_home() -> bool {
    std::env::var("TAXALINK_HOME").is_ok()
}

/// Get a human-readable description of the current path configuration
pub fn describe_paths() -> String {
    format!(
        "taxalink paths:\n  \
        Home: {}\n  \
        Taxonomy: {}\n  \
        Config: {}\n  \
        Custom: {}",
        taxalink_home().display(),
        taxalink_taxonomy_dir().display(),
        default_config_path().display(),
        if is_custom_home() {
            "Yes"
        } else {
            "No (using defaults)"
        }
    )
}
