//! Graph lineage prototype.
//!
//! Synthesizes a random connected directed graph, loads it as edge documents
//! into a document store, and answers fixed-depth downstream lineage queries
//! with one batched term search per hop.

pub mod analysis;
pub mod cli;
pub mod core;
pub mod ingest;
pub mod logging;
pub mod store;
