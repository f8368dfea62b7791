use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

pub const SOURCE_FIELD: &str = "sourceUrn";
pub const DESTINATION_FIELD: &str = "destinationUrn";

/// Directed edge between two node URNs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge {
    pub source: String,
    pub destination: String,
}

impl Edge {
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.destination)
    }
}

pub type EdgeSet = HashSet<Edge>;

/// Stored form of an edge: one JSON object with exactly two string fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EdgeDocument {
    #[serde(rename = "sourceUrn")]
    pub source_urn: String,
    #[serde(rename = "destinationUrn")]
    pub destination_urn: String,
}

impl From<Edge> for EdgeDocument {
    fn from(edge: Edge) -> Self {
        Self {
            source_urn: edge.source,
            destination_urn: edge.destination,
        }
    }
}

impl From<EdgeDocument> for Edge {
    fn from(doc: EdgeDocument) -> Self {
        Self {
            source: doc.source_urn,
            destination: doc.destination_urn,
        }
    }
}
