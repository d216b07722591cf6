pub mod lineage;
pub mod map;
pub mod paths;
pub mod validate;
