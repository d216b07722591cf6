pub mod paths;

// Re-export commonly used functions
pub use paths::{
    default_config_path, describe_paths, is_custom_home, taxalink_home,
    taxalink_taxonomy_dir,
};
