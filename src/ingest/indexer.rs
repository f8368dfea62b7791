use crate::ingest::batch::{BatchConfig, BatchWriter, FlushReport};
use crate::ingest::synthetic::{SynthesisConfig, SynthesisError, Synthesizer};
use crate::store::{DocumentStore, StoreError};
use rand::Rng;
use thiserror::Error;
use tracing::{info, instrument};

#[derive(Debug, Error)]
pub enum IndexError {
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSummary {
    pub nodes: usize,
    pub edges: usize,
    pub flushes: usize,
    pub warnings: usize,
    pub components: usize,
}

/// Synthesizes a connected graph and writes it to `store` batch by batch.
///
/// Validation runs before the store is touched. `on_flush` sees the running
/// totals after every flush, the trailing one included.
#[instrument(
    name = "index.generate",
    skip_all,
    fields(nodes = synthesis.node_count, edges = synthesis.edge_count, batch_size = batch.batch_size)
)]
pub fn generate_and_index<S, R, F>(
    store: S,
    synthesis: SynthesisConfig,
    batch: BatchConfig,
    rng: R,
    mut on_flush: F,
) -> Result<IndexSummary, IndexError>
where
    S: DocumentStore,
    R: Rng,
    F: FnMut(&FlushReport),
{
    let mut synth = Synthesizer::new(synthesis, rng)?;
    info!(
        edges = synthesis.edge_count,
        nodes = synthesis.node_count,
        "generating and indexing unique edges"
    );

    let mut writer = BatchWriter::new(store, batch);
    for edge in synth.by_ref() {
        if let Some(report) = writer.push(edge?.into())? {
            info!(
                written = report.progress.written,
                total = synthesis.edge_count,
                "indexed batch"
            );
            on_flush(&report);
        }
    }
    let (progress, last) = writer.finish()?;
    if let Some(report) = last {
        info!(size = report.size, "indexed final batch");
        on_flush(&report);
    }

    let summary = IndexSummary {
        nodes: synthesis.node_count,
        edges: synth.generated(),
        flushes: progress.flushes,
        warnings: progress.warnings,
        components: synth.component_count(),
    };
    info!(
        edges = summary.edges,
        components = summary.components,
        warnings = summary.warnings,
        "indexing complete"
    );
    Ok(summary)
}
