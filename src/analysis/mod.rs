pub mod components;
pub mod lineage;
