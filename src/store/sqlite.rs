//! Single-file document store backed by SQLite.
//!
//! Each document is kept as its JSON body plus the extracted `sourceUrn`,
//! which carries the index used by term searches. Documents are partitioned
//! by index name so several graphs can share one file.

use super::{BulkResponse, DocumentStore, SearchResponse, StoreError, TermsQuery};
use crate::core::edge::EdgeDocument;
use rusqlite::{Connection, ErrorCode, params};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_INDEX: &str = "es-graph-test-index";
pub const DEFAULT_PATH: &str = "lineage.db";

const CREATE_DOCUMENTS: &str = "\
CREATE TABLE IF NOT EXISTS edge_documents (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  index_name TEXT NOT NULL,
  source_urn TEXT NOT NULL CHECK (length(source_urn) > 0),
  destination_urn TEXT NOT NULL CHECK (length(destination_urn) > 0),
  body TEXT NOT NULL,
  CHECK (source_urn <> destination_urn)
);
CREATE INDEX IF NOT EXISTS idx_edge_documents_source
  ON edge_documents(index_name, source_urn);";

const INSERT_DOCUMENT_SQL: &str = "\
INSERT INTO edge_documents (index_name, source_urn, destination_urn, body)
VALUES (?1, ?2, ?3, ?4)";

const SEARCH_SQL: &str = "\
SELECT (
  SELECT json_group_object(f.value, json_extract(d.body, '$.' || f.value))
  FROM json_each(?4) AS f
)
FROM edge_documents AS d
WHERE d.index_name = ?1 AND d.source_urn IN (SELECT value FROM json_each(?2))
ORDER BY d.id
LIMIT ?3";

const COUNT_SQL: &str = "\
SELECT COUNT(*) FROM edge_documents
WHERE index_name = ?1 AND source_urn IN (SELECT value FROM json_each(?2))";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub path: PathBuf,
    pub index: String,
}

pub struct SqliteStore {
    conn: Connection,
    index: String,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

impl SqliteStore {
    pub fn open(cfg: &StoreConfig) -> Result<Self, StoreError> {
        Self::from_connection(Connection::open(&cfg.path)?, &cfg.index, &cfg.path)
    }

    pub fn open_in_memory(index: &str) -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?, index, Path::new(":memory:"))
    }

    fn from_connection(conn: Connection, index: &str, path: &Path) -> Result<Self, StoreError> {
        conn.execute_batch(CREATE_DOCUMENTS)?;
        debug!(path = %path.display(), index, "opened sqlite store");
        Ok(Self {
            conn,
            index: index.to_owned(),
        })
    }

    /// Number of documents in this store's index.
    pub fn count(&self) -> Result<usize, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM edge_documents WHERE index_name = ?1",
            params![self.index],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

fn is_document_error(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

impl DocumentStore for SqliteStore {
    fn bulk(&mut self, docs: &[EdgeDocument]) -> Result<BulkResponse, StoreError> {
        let tx = self.conn.transaction()?;
        let mut response = BulkResponse::default();
        {
            let mut stmt = tx.prepare_cached(INSERT_DOCUMENT_SQL)?;
            for doc in docs {
                let body = serde_json::to_string(doc)?;
                match stmt.execute(params![
                    self.index,
                    doc.source_urn,
                    doc.destination_urn,
                    body
                ]) {
                    Ok(_) => response.indexed += 1,
                    Err(err) if is_document_error(&err) => response.failed += 1,
                    Err(err) => return Err(err.into()),
                }
            }
        }
        tx.commit()?;
        Ok(response)
    }

    fn search(&self, query: &TermsQuery) -> Result<SearchResponse, StoreError> {
        let terms = query.terms_json()?;
        let fields = serde_json::to_string(query.fields())?;
        let limit = i64::try_from(query.size()).unwrap_or(i64::MAX);

        // Bodies come back projected to the query's fields only.
        let mut stmt = self.conn.prepare_cached(SEARCH_SQL)?;
        let bodies = stmt
            .query_map(params![self.index, terms, limit, fields], |row| {
                row.get::<_, String>(0)
            })?
            .collect::<Result<Vec<_>, _>>()?;
        let hits = bodies
            .iter()
            .map(|body| serde_json::from_str::<EdgeDocument>(body))
            .collect::<Result<Vec<_>, _>>()?;

        let total: i64 = self
            .conn
            .prepare_cached(COUNT_SQL)?
            .query_row(params![self.index, terms], |row| row.get(0))?;

        Ok(SearchResponse {
            hits,
            total_matches: total as usize,
        })
    }
}
