//! Command-line interface for the lineage prototype.
//!
//! `index` synthesizes a connected graph into the local store and `query`
//! walks downstream lineage from one node.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;
use thiserror::Error;
use tracing::{Span, field, info, instrument};

use crate::analysis::lineage::{
    DEFAULT_MAX_RESULTS_PER_HOP, LineageConfig, LineageOutcome, Termination, trace_downstream,
};
use crate::ingest::batch::{BatchConfig, DEFAULT_BATCH_SIZE};
use crate::ingest::indexer::{IndexError, IndexSummary, generate_and_index};
use crate::ingest::synthetic::SynthesisConfig;
use crate::store::StoreError;
use crate::store::sqlite::{DEFAULT_INDEX, DEFAULT_PATH, SqliteStore, StoreConfig};

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(
    name = "lineage",
    about = "Graph lineage prototype: index a synthetic graph, then query downstream lineage.",
    arg_required_else_help = true
)]
pub struct Cli {
    /// SQLite file holding the edge documents.
    #[arg(long, global = true, default_value = DEFAULT_PATH)]
    pub store: PathBuf,

    /// Index name the documents are written to and searched in.
    #[arg(long = "index", global = true, default_value = DEFAULT_INDEX)]
    pub index_name: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Generate and index graph data, e.g. `index 1000000 10000`.
    Index(IndexCommand),
    /// Query downstream lineage from a starting node, e.g. `query urn:node:1 2`.
    Query(QueryCommand),
}

#[derive(Debug, Args, Clone)]
pub struct IndexCommand {
    /// Number of unique edges (documents) to generate.
    pub num_edges: usize,

    /// Number of unique nodes the edges connect.
    pub num_nodes: usize,

    /// Documents per bulk write.
    #[arg(
        long,
        default_value_t = DEFAULT_BATCH_SIZE,
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..),
    )]
    pub batch_size: usize,

    /// Seed for reproducible graphs; random when omitted.
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Debug, Args, Clone)]
pub struct QueryCommand {
    /// URN of the node to start from.
    pub start_urn: String,

    /// Number of hops to follow.
    pub depth: usize,

    /// Maximum edges returned by each hop's search.
    #[arg(long, default_value_t = DEFAULT_MAX_RESULTS_PER_HOP)]
    pub max_results: usize,

    /// Print every connection found.
    #[arg(long)]
    pub list: bool,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("indexing failed")]
    Index(#[from] IndexError),
    #[error("lineage query failed")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone)]
pub enum ExecutionSummary {
    Index(IndexSummary),
    Query {
        start: String,
        depth: usize,
        outcome: LineageOutcome,
        list: bool,
    },
}

#[instrument(name = "cli.run", err, skip(cli), fields(command = field::Empty))]
pub fn run_cli(cli: Cli) -> Result<ExecutionSummary, CliError> {
    let store_cfg = StoreConfig {
        path: cli.store,
        index: cli.index_name,
    };
    match cli.command {
        Command::Index(cmd) => {
            Span::current().record("command", "index");
            run_index(&store_cfg, cmd)
        }
        Command::Query(cmd) => {
            Span::current().record("command", "query");
            run_query(&store_cfg, cmd)
        }
    }
}

pub(crate) fn run_index(
    store_cfg: &StoreConfig,
    cmd: IndexCommand,
) -> Result<ExecutionSummary, CliError> {
    let synthesis = SynthesisConfig::new(cmd.num_nodes, cmd.num_edges);
    // Reject before the store file is created.
    synthesis.validate().map_err(IndexError::from)?;

    let rng = match cmd.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let mut store = SqliteStore::open(store_cfg)?;
    let summary = generate_and_index(
        &mut store,
        synthesis,
        BatchConfig {
            batch_size: cmd.batch_size,
        },
        rng,
        |_| {},
    )?;
    info!(path = %store_cfg.path.display(), index = %store_cfg.index, "index command completed");
    Ok(ExecutionSummary::Index(summary))
}

pub(crate) fn run_query(
    store_cfg: &StoreConfig,
    cmd: QueryCommand,
) -> Result<ExecutionSummary, CliError> {
    let store = SqliteStore::open(store_cfg)?;
    let cfg = LineageConfig {
        max_results_per_hop: cmd.max_results,
    };
    info!(
        depth = cmd.depth,
        start = %cmd.start_urn,
        "querying downstream lineage"
    );
    let outcome = trace_downstream(&store, &cfg, &cmd.start_urn, cmd.depth)?;
    Ok(ExecutionSummary::Query {
        start: cmd.start_urn,
        depth: cmd.depth,
        outcome,
        list: cmd.list,
    })
}

/// Renders `summary` to `writer` in a human-readable text format.
pub fn render_summary(summary: &ExecutionSummary, mut writer: impl Write) -> io::Result<()> {
    match summary {
        ExecutionSummary::Index(s) => {
            writeln!(writer, "Indexing complete. Total unique edges indexed: {}", s.edges)?;
            writeln!(writer, "nodes: {}", s.nodes)?;
            writeln!(writer, "batches: {}", s.flushes)?;
            writeln!(writer, "batches with write errors: {}", s.warnings)?;
            writeln!(writer, "connected components: {}", s.components)?;
        }
        ExecutionSummary::Query {
            start,
            depth,
            outcome,
            list,
        } => {
            writeln!(writer, "{depth}-hop downstream lineage from: {start}")?;
            for hop in &outcome.hops {
                write!(
                    writer,
                    "hop {}: {} source nodes, {} ms, {} new nodes",
                    hop.hop,
                    hop.frontier,
                    hop.latency.as_millis(),
                    hop.new_nodes
                )?;
                if hop.truncated {
                    write!(writer, " (truncated at {} results)", hop.matches)?;
                }
                writeln!(writer)?;
            }
            if let Termination::FrontierExhausted { after_hop } = outcome.termination {
                writeln!(writer, "stopped after hop {after_hop}: no further nodes found")?;
            }
            writeln!(
                writer,
                "Total query latency across all hops: {} ms",
                outcome.total_latency.as_millis()
            )?;
            writeln!(
                writer,
                "Found {} total connections",
                outcome.connections.len()
            )?;
            if *list {
                for connection in &outcome.connections {
                    writeln!(writer, "  {connection}")?;
                }
            }
        }
    }
    Ok(())
}
