use crate::analysis::components::weak_component_count;
use crate::core::edge::{Edge, EdgeSet};
use crate::core::ids::{NodeId, NodePool};
use rand::Rng;
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, info, warn};

const DENSE_WARNING_RATIO: f64 = 0.9;

#[derive(Debug, Clone, Copy)]
pub struct SynthesisConfig {
    pub node_count: usize,
    pub edge_count: usize,
    /// Draws allowed per phase 2 edge before giving up.
    pub max_attempts_per_edge: u64,
}

impl SynthesisConfig {
    pub fn new(node_count: usize, edge_count: usize) -> Self {
        Self {
            node_count,
            edge_count,
            ..Self::default()
        }
    }

    /// Largest number of distinct directed edges without self-loops.
    pub fn max_edges(&self) -> u128 {
        let n = self.node_count as u128;
        n * n.saturating_sub(1)
    }

    pub fn validate(&self) -> Result<(), SynthesisError> {
        if self.edge_count < self.node_count.saturating_sub(1) {
            return Err(SynthesisError::InsufficientEdges {
                edges: self.edge_count,
                required: self.node_count - 1,
            });
        }
        if self.edge_count as u128 > self.max_edges() {
            return Err(SynthesisError::TooManyEdges {
                edges: self.edge_count,
                nodes: self.node_count,
                max: self.max_edges(),
            });
        }
        if NodeId::try_from(self.node_count).is_err() {
            return Err(SynthesisError::TooManyNodes {
                nodes: self.node_count,
            });
        }
        Ok(())
    }
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            node_count: 0,
            edge_count: 0,
            max_attempts_per_edge: 100_000,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SynthesisError {
    #[error(
        "cannot form a connected graph: {edges} edges requested but at least {required} (nodes - 1) are needed"
    )]
    InsufficientEdges { edges: usize, required: usize },
    #[error("{edges} edges requested but {nodes} nodes admit at most {max} distinct edges")]
    TooManyEdges { edges: usize, nodes: usize, max: u128 },
    #[error("{nodes} nodes exceed the supported node id range")]
    TooManyNodes { nodes: usize },
    #[error(
        "random sampling stalled after {generated} of {requested} edges ({attempts} draws without a new edge)"
    )]
    SamplerExhausted {
        generated: usize,
        requested: usize,
        attempts: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    SpanningPath { next: usize },
    Fill,
    Done,
}

/// Streams unique directed edges whose undirected projection is connected.
///
/// Phase 1 walks a shuffled node pool and links consecutive nodes, so all
/// nodes are connected before any random edge is drawn. Phase 2 adds random
/// unseen pairs until the requested count is reached.
pub struct Synthesizer<R> {
    cfg: SynthesisConfig,
    pool: NodePool,
    generated: HashSet<(NodeId, NodeId)>,
    rng: R,
    phase: Phase,
}

impl<R: Rng> Synthesizer<R> {
    pub fn new(cfg: SynthesisConfig, mut rng: R) -> Result<Self, SynthesisError> {
        cfg.validate()?;

        let mut pool = NodePool::generate(cfg.node_count as NodeId);
        pool.shuffle(&mut rng);

        Ok(Self {
            cfg,
            pool,
            generated: HashSet::with_capacity(cfg.edge_count),
            rng,
            phase: Phase::SpanningPath { next: 0 },
        })
    }

    pub fn generated(&self) -> usize {
        self.generated.len()
    }

    /// Weakly connected components among the edges emitted so far.
    pub fn component_count(&self) -> usize {
        weak_component_count(self.pool.len(), self.generated.iter().copied())
    }

    fn emit(&mut self, src: NodeId, dst: NodeId) -> Option<Edge> {
        if !self.generated.insert((src, dst)) {
            return None;
        }
        Some(Edge::new(self.pool.urn(src), self.pool.urn(dst)))
    }

    fn start_fill(&mut self) {
        info!(
            edges = self.generated.len(),
            nodes = self.pool.len(),
            "phase 1 complete, all nodes connected"
        );
        let density = self.cfg.edge_count as f64 / self.cfg.max_edges().max(1) as f64;
        if density > DENSE_WARNING_RATIO {
            warn!(
                requested = self.cfg.edge_count,
                max = %self.cfg.max_edges(),
                "requested edge count is close to the pair ceiling, random sampling may stall"
            );
        }
        self.phase = Phase::Fill;
    }

    fn sample(&mut self) -> Result<Edge, SynthesisError> {
        let n = self.pool.len() as NodeId;
        for _ in 0..self.cfg.max_attempts_per_edge {
            let src = self.rng.random_range(0..n);
            let mut dst = self.rng.random_range(0..n - 1);
            if dst >= src {
                dst += 1;
            }
            if let Some(edge) = self.emit(src, dst) {
                return Ok(edge);
            }
        }
        Err(SynthesisError::SamplerExhausted {
            generated: self.generated.len(),
            requested: self.cfg.edge_count,
            attempts: self.cfg.max_attempts_per_edge,
        })
    }
}

impl<R: Rng> Iterator for Synthesizer<R> {
    type Item = Result<Edge, SynthesisError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.phase {
                Phase::SpanningPath { next } if next + 1 < self.pool.len() => {
                    self.phase = Phase::SpanningPath { next: next + 1 };
                    if let Some(edge) = self.emit(next as NodeId, next as NodeId + 1) {
                        return Some(Ok(edge));
                    }
                }
                Phase::SpanningPath { .. } => self.start_fill(),
                Phase::Fill if self.generated.len() >= self.cfg.edge_count => {
                    info!(edges = self.generated.len(), "phase 2 complete");
                    self.phase = Phase::Done;
                }
                Phase::Fill => {
                    let sampled = self.sample();
                    if let Err(err) = &sampled {
                        debug!(error = %err, "stopping synthesis");
                        self.phase = Phase::Done;
                    }
                    return Some(sampled);
                }
                Phase::Done => return None,
            }
        }
    }
}

/// Generates the whole edge set in memory.
pub fn synthesize<R: Rng>(cfg: SynthesisConfig, rng: R) -> Result<EdgeSet, SynthesisError> {
    Synthesizer::new(cfg, rng)?.collect()
}
