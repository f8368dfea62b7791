use super::{BulkResponse, DocumentStore, SearchResponse, StoreError, TermsQuery};
use crate::core::edge::EdgeDocument;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

/// In-process store keeping documents grouped by `sourceUrn`.
///
/// Records every bulk batch size and every search so tests can assert on
/// the traffic. Documents in `reject` are refused on write and reported as
/// failed, and `fail_after` makes the n-th call onwards error out.
#[derive(Debug, Default)]
pub struct MemoryStore {
    by_source: HashMap<String, Vec<EdgeDocument>>,
    len: usize,
    reject: Vec<EdgeDocument>,
    fail_after: Option<usize>,
    calls: Cell<usize>,
    batches: Vec<usize>,
    searches: RefCell<Vec<TermsQuery>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_edges<'a, I>(edges: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut store = Self::new();
        for (src, dst) in edges {
            store.insert(EdgeDocument {
                source_urn: src.to_owned(),
                destination_urn: dst.to_owned(),
            });
        }
        store
    }

    pub fn rejecting(mut self, doc: EdgeDocument) -> Self {
        self.reject.push(doc);
        self
    }

    pub fn failing_after(mut self, calls: usize) -> Self {
        self.fail_after = Some(calls);
        self
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn documents(&self) -> impl Iterator<Item = &EdgeDocument> {
        self.by_source.values().flatten()
    }

    /// Sizes of the bulk batches received, in order.
    pub fn batches(&self) -> &[usize] {
        &self.batches
    }

    /// Queries received, in order.
    pub fn searches(&self) -> Vec<TermsQuery> {
        self.searches.borrow().clone()
    }

    fn insert(&mut self, doc: EdgeDocument) {
        self.by_source
            .entry(doc.source_urn.clone())
            .or_default()
            .push(doc);
        self.len += 1;
    }

    fn check_available(&self) -> Result<(), StoreError> {
        let call = self.calls.get();
        self.calls.set(call + 1);
        match self.fail_after {
            Some(limit) if call >= limit => Err(StoreError::Unavailable {
                reason: format!("memory store configured to fail after {limit} calls"),
            }),
            _ => Ok(()),
        }
    }
}

impl DocumentStore for MemoryStore {
    fn bulk(&mut self, docs: &[EdgeDocument]) -> Result<BulkResponse, StoreError> {
        self.check_available()?;
        self.batches.push(docs.len());
        let mut response = BulkResponse::default();
        for doc in docs {
            if self.reject.contains(doc) {
                response.failed += 1;
            } else {
                self.insert(doc.clone());
                response.indexed += 1;
            }
        }
        Ok(response)
    }

    fn search(&self, query: &TermsQuery) -> Result<SearchResponse, StoreError> {
        self.check_available()?;
        self.searches.borrow_mut().push(query.clone());
        let mut response = SearchResponse::default();
        for term in query.terms() {
            let Some(docs) = self.by_source.get(term) else {
                continue;
            };
            response.total_matches += docs.len();
            let room = query.size().saturating_sub(response.hits.len());
            response.hits.extend(docs.iter().take(room).cloned());
        }
        Ok(response)
    }
}
