use crate::core::edge::Edge;
use crate::store::{DocumentStore, StoreError, TermsQuery};
use std::collections::{BTreeSet, HashSet};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

pub const DEFAULT_MAX_RESULTS_PER_HOP: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineageConfig {
    /// Hit cap of each hop's term search.
    pub max_results_per_hop: usize,
}

impl Default for LineageConfig {
    fn default() -> Self {
        Self {
            max_results_per_hop: DEFAULT_MAX_RESULTS_PER_HOP,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HopReport {
    /// 1-based.
    pub hop: usize,
    pub frontier: usize,
    pub matches: usize,
    pub new_nodes: usize,
    pub latency: Duration,
    /// The store had more matches than the hop's cap.
    pub truncated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    DepthReached,
    /// Hop `after_hop` found no unvisited destinations. No further query is
    /// issued, even when `after_hop` is the requested depth.
    FrontierExhausted { after_hop: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineageOutcome {
    pub connections: BTreeSet<Edge>,
    pub hops: Vec<HopReport>,
    pub total_latency: Duration,
    pub termination: Termination,
}

impl LineageOutcome {
    pub fn depth_reached(&self) -> usize {
        self.hops.len()
    }
}

/// Follows outgoing edges from `start` for up to `depth` hops.
///
/// One term search per hop over the current frontier. Every returned edge is
/// recorded, but a destination joins the next frontier only the first time
/// it is seen. Any store error aborts the run.
#[instrument(name = "lineage.trace", skip(store, cfg), err)]
pub fn trace_downstream<S>(
    store: &S,
    cfg: &LineageConfig,
    start: &str,
    depth: usize,
) -> Result<LineageOutcome, StoreError>
where
    S: DocumentStore + ?Sized,
{
    let mut frontier = BTreeSet::from([start.to_owned()]);
    let mut visited = HashSet::from([start.to_owned()]);
    let mut outcome = LineageOutcome {
        connections: BTreeSet::new(),
        hops: Vec::new(),
        total_latency: Duration::ZERO,
        termination: Termination::DepthReached,
    };

    for hop in 1..=depth {
        let query = TermsQuery::source_in(&frontier).with_size(cfg.max_results_per_hop);
        debug!(hop, request = %query.to_json(), "searching frontier");
        let started = Instant::now();
        let response = store.search(&query)?;
        let latency = started.elapsed();

        let truncated = response.is_truncated();
        if truncated {
            warn!(
                hop,
                returned = response.hits.len(),
                total = response.total_matches,
                cap = cfg.max_results_per_hop,
                "hop results truncated at the per-hop cap"
            );
        }

        let matches = response.hits.len();
        let mut next = BTreeSet::new();
        for doc in response.hits {
            let edge = Edge::from(doc);
            if visited.insert(edge.destination.clone()) {
                next.insert(edge.destination.clone());
            }
            outcome.connections.insert(edge);
        }

        info!(
            hop,
            frontier = frontier.len(),
            latency_ms = latency.as_millis() as u64,
            new_nodes = next.len(),
            "hop complete"
        );
        outcome.hops.push(HopReport {
            hop,
            frontier: frontier.len(),
            matches,
            new_nodes: next.len(),
            latency,
            truncated,
        });
        outcome.total_latency += latency;
        if next.is_empty() {
            info!(hop, "stopping, no further nodes were found");
            outcome.termination = Termination::FrontierExhausted { after_hop: hop };
            break;
        }
        frontier = next;
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    fn trace(store: &MemoryStore, start: &str, depth: usize) -> LineageOutcome {
        trace_downstream(store, &LineageConfig::default(), start, depth).unwrap()
    }

    fn edges(pairs: &[(&str, &str)]) -> BTreeSet<Edge> {
        pairs.iter().map(|(s, d)| Edge::new(*s, *d)).collect()
    }

    fn queried(store: &MemoryStore) -> Vec<Vec<String>> {
        store
            .searches()
            .iter()
            .map(|q| q.terms().iter().cloned().collect())
            .collect()
    }

    #[test]
    fn test_two_hop_chain() {
        let store = MemoryStore::with_edges([("A", "B"), ("B", "C")]);

        let outcome = trace(&store, "A", 2);
        assert_eq!(edges(&[("A", "B"), ("B", "C")]), outcome.connections);
        assert_eq!(Termination::DepthReached, outcome.termination);
        assert_eq!(2, outcome.depth_reached());
        assert_eq!(vec![vec!["A"], vec!["B"]], queried(&store));
        assert_eq!(1, outcome.hops[1].new_nodes);
    }

    #[test]
    fn test_no_hops() {
        let store = MemoryStore::with_edges([("A", "B")]);

        let outcome = trace(&store, "A", 0);
        assert!(outcome.connections.is_empty());
        assert!(store.searches().is_empty());
        assert_eq!(Duration::ZERO, outcome.total_latency);
    }

    #[test]
    fn test_hop_limit_enforced() {
        let store = MemoryStore::with_edges([("A", "B"), ("B", "C"), ("C", "D")]);

        let outcome = trace(&store, "A", 2);
        assert_eq!(edges(&[("A", "B"), ("B", "C")]), outcome.connections);
        assert_eq!(2, store.searches().len());
    }

    #[test]
    fn test_dead_end_stops_early() {
        let store = MemoryStore::with_edges([("X", "Y")]);

        for depth in [1, 5] {
            let outcome = trace(&store, "A", depth);
            assert!(outcome.connections.is_empty());
            assert_eq!(Termination::FrontierExhausted { after_hop: 1 }, outcome.termination);
            assert_eq!(1, outcome.depth_reached());
        }
        assert_eq!(2, store.searches().len());
    }

    #[test]
    fn test_last_hop_without_new_nodes_is_exhausted() {
        let store = MemoryStore::with_edges([("A", "B"), ("B", "A")]);

        let outcome = trace(&store, "A", 2);
        assert_eq!(Termination::FrontierExhausted { after_hop: 2 }, outcome.termination);

        let outcome = trace(&store, "A", 1);
        assert_eq!(Termination::DepthReached, outcome.termination);
    }

    #[test]
    fn test_diamond_enqueues_once() {
        let store = MemoryStore::with_edges([
            ("A", "B"),
            ("A", "C"),
            ("B", "D"),
            ("C", "D"),
            ("D", "E"),
        ]);

        let outcome = trace(&store, "A", 3);
        assert_eq!(
            edges(&[("A", "B"), ("A", "C"), ("B", "D"), ("C", "D"), ("D", "E")]),
            outcome.connections
        );
        assert_eq!(vec![vec!["A"], vec!["B", "C"], vec!["D"]], queried(&store));
        assert_eq!(1, outcome.hops[1].new_nodes);
        assert_eq!(2, outcome.hops[1].matches);
    }

    #[test]
    fn test_cycle_records_edge_without_requeue() {
        let store = MemoryStore::with_edges([("A", "B"), ("B", "A")]);

        let outcome = trace(&store, "A", 10);
        assert_eq!(edges(&[("A", "B"), ("B", "A")]), outcome.connections);
        assert_eq!(Termination::FrontierExhausted { after_hop: 2 }, outcome.termination);
        assert_eq!(vec![vec!["A"], vec!["B"]], queried(&store));
    }

    #[test]
    fn test_no_node_in_two_frontiers() {
        let store = MemoryStore::with_edges([
            ("0", "1"),
            ("0", "2"),
            ("1", "2"),
            ("2", "3"),
            ("3", "1"),
            ("3", "0"),
            ("2", "4"),
            ("4", "5"),
        ]);

        trace(&store, "0", 6);
        let mut seen = HashSet::new();
        for frontier in queried(&store) {
            for node in frontier {
                assert!(seen.insert(node));
            }
        }
    }

    #[test]
    fn test_truncated_hop_flagged() {
        let store = MemoryStore::with_edges([("A", "B"), ("A", "C"), ("A", "D")]);
        let cfg = LineageConfig {
            max_results_per_hop: 2,
        };

        let outcome = trace_downstream(&store, &cfg, "A", 1).unwrap();
        assert!(outcome.hops[0].truncated);
        assert_eq!(2, outcome.connections.len());
        assert_eq!(Some(2), store.searches().first().map(TermsQuery::size));
    }

    #[test]
    fn test_store_failure_aborts() {
        let store = MemoryStore::with_edges([("A", "B"), ("B", "C")]).failing_after(1);

        let result = trace_downstream(&store, &LineageConfig::default(), "A", 3);
        assert!(matches!(result, Err(StoreError::Unavailable { .. })));
    }

    #[test]
    fn test_total_latency_sums_hops() {
        let store = MemoryStore::with_edges([("A", "B"), ("B", "C")]);

        let outcome = trace(&store, "A", 2);
        let sum = outcome.hops.iter().map(|h| h.latency).sum::<Duration>();
        assert_eq!(sum, outcome.total_latency);
    }
}
