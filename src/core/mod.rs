pub mod edge;
pub mod ids;
