use crate::core::edge::EdgeDocument;
use crate::store::{DocumentStore, StoreError};
use tracing::{debug, warn};

pub const DEFAULT_BATCH_SIZE: usize = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    pub batch_size: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// A flushed batch the store only partially accepted.
///
/// Best effort: the batch is not retried and the rejected documents are
/// not identified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreWriteWarning {
    /// 1-based index of the flush.
    pub batch: usize,
    pub failed: usize,
}

/// Running totals carried through the write loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndexProgress {
    /// Documents sent to the store, rejected ones included.
    pub written: usize,
    pub flushes: usize,
    pub warnings: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushReport {
    pub size: usize,
    pub progress: IndexProgress,
    pub warning: Option<StoreWriteWarning>,
}

/// Buffers documents and writes them to the store in bounded batches.
pub struct BatchWriter<S> {
    store: S,
    batch: Vec<EdgeDocument>,
    batch_size: usize,
    progress: IndexProgress,
}

impl<S: DocumentStore> BatchWriter<S> {
    /// `batch_size` of zero is treated as one.
    pub fn new(store: S, cfg: BatchConfig) -> Self {
        let batch_size = cfg.batch_size.max(1);
        Self {
            store,
            batch: Vec::with_capacity(batch_size),
            batch_size,
            progress: IndexProgress::default(),
        }
    }

    pub fn progress(&self) -> IndexProgress {
        self.progress
    }

    pub fn pending(&self) -> usize {
        self.batch.len()
    }

    /// Adds a document, flushing when the batch is full.
    pub fn push(&mut self, doc: EdgeDocument) -> Result<Option<FlushReport>, StoreError> {
        self.batch.push(doc);
        if self.batch.len() < self.batch_size {
            return Ok(None);
        }
        self.flush().map(Some)
    }

    /// Flushes any partial batch and returns the final totals with the
    /// report of that last flush, if one happened.
    pub fn finish(mut self) -> Result<(IndexProgress, Option<FlushReport>), StoreError> {
        let last = if self.batch.is_empty() {
            None
        } else {
            Some(self.flush()?)
        };
        Ok((self.progress, last))
    }

    fn flush(&mut self) -> Result<FlushReport, StoreError> {
        let size = self.batch.len();
        let response = self.store.bulk(&self.batch)?;
        self.batch.clear();

        self.progress.written += size;
        self.progress.flushes += 1;
        let warning = response.has_errors().then(|| StoreWriteWarning {
            batch: self.progress.flushes,
            failed: response.failed,
        });
        if let Some(w) = warning {
            self.progress.warnings += 1;
            warn!(
                batch = w.batch,
                failed = w.failed,
                size,
                "bulk write reported document errors, continuing"
            );
        }
        debug!(size, written = self.progress.written, "flushed batch");

        Ok(FlushReport {
            size,
            progress: self.progress,
            warning,
        })
    }
}
