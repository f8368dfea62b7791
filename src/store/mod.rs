//! Document store seam used by the batch writer and the lineage engine.
//!
//! The store accepts bulk writes of [`EdgeDocument`]s and answers batched
//! term searches described by a [`TermsQuery`]. Nothing else about the store
//! leaks into the callers, so tests swap in [`memory::MemoryStore`].

pub mod memory;
pub mod query;
pub mod sqlite;

use crate::core::edge::EdgeDocument;
use thiserror::Error;

pub use query::TermsQuery;

/// Outcome of one bulk write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BulkResponse {
    /// Documents the store accepted.
    pub indexed: usize,
    /// Documents the store rejected. Which ones is not reported.
    pub failed: usize,
}

impl BulkResponse {
    pub fn has_errors(&self) -> bool {
        self.failed > 0
    }
}

/// Hits of one term search, capped at the requested size.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchResponse {
    pub hits: Vec<EdgeDocument>,
    /// Number of matching documents before the cap was applied.
    pub total_matches: usize,
}

impl SearchResponse {
    pub fn is_truncated(&self) -> bool {
        self.total_matches > self.hits.len()
    }
}

/// Failure to talk to the store. Always fatal for the running operation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite store failed")]
    Sqlite(#[from] rusqlite::Error),
    #[error("failed to encode store payload")]
    Payload(#[from] serde_json::Error),
    #[error("store unavailable: {reason}")]
    Unavailable { reason: String },
}

pub trait DocumentStore {
    /// Writes one batch of documents.
    fn bulk(&mut self, docs: &[EdgeDocument]) -> Result<BulkResponse, StoreError>;

    /// Returns documents whose `sourceUrn` is one of the query terms.
    fn search(&self, query: &TermsQuery) -> Result<SearchResponse, StoreError>;
}

impl<S: DocumentStore + ?Sized> DocumentStore for &mut S {
    fn bulk(&mut self, docs: &[EdgeDocument]) -> Result<BulkResponse, StoreError> {
        (**self).bulk(docs)
    }

    fn search(&self, query: &TermsQuery) -> Result<SearchResponse, StoreError> {
        (**self).search(query)
    }
}
