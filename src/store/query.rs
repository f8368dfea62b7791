use crate::core::edge::{DESTINATION_FIELD, SOURCE_FIELD};
use serde_json::{Value, json};
use std::collections::BTreeSet;

const DEFAULT_SIZE: usize = 10;

/// Batched term search: documents whose `sourceUrn` is in `terms`,
/// projected to the two edge fields, at most `size` hits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermsQuery {
    terms: BTreeSet<String>,
    fields: [&'static str; 2],
    size: usize,
}

impl TermsQuery {
    pub fn source_in<I, T>(terms: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            terms: terms.into_iter().map(Into::into).collect(),
            fields: [SOURCE_FIELD, DESTINATION_FIELD],
            size: DEFAULT_SIZE,
        }
    }

    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    pub fn terms(&self) -> &BTreeSet<String> {
        &self.terms
    }

    pub fn fields(&self) -> &[&'static str] {
        &self.fields
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Search request body in the store's query DSL.
    pub fn to_json(&self) -> Value {
        json!({
            "_source": self.fields,
            "size": self.size,
            "query": {
                "terms": { SOURCE_FIELD: self.terms }
            }
        })
    }

    /// Terms encoded as a JSON array, for stores that bind them as one value.
    pub fn terms_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.terms)
    }
}
