//! End-to-end checks: synthesize, index into SQLite, trace lineage back out.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use lineage::analysis::lineage::{LineageConfig, Termination, trace_downstream};
use lineage::core::edge::{Edge, EdgeDocument, EdgeSet};
use lineage::ingest::batch::{BatchConfig, BatchWriter};
use lineage::ingest::indexer::generate_and_index;
use lineage::ingest::synthetic::{SynthesisConfig, synthesize};
use lineage::store::DocumentStore;
use lineage::store::sqlite::{SqliteStore, StoreConfig};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tempfile::TempDir;

fn open_store(dir: &TempDir) -> SqliteStore {
    SqliteStore::open(&StoreConfig {
        path: dir.path().join("graph.db"),
        index: "lineage-test".to_owned(),
    })
    .unwrap()
}

fn load(store: &mut SqliteStore, edges: &EdgeSet) {
    let mut writer = BatchWriter::new(&mut *store, BatchConfig { batch_size: 64 });
    for edge in edges {
        writer.push(edge.clone().into()).unwrap();
    }
    writer.finish().unwrap();
}

/// Level-by-level reference walk over an in-memory adjacency list.
fn expected_lineage(edges: &EdgeSet, start: &str, depth: usize) -> BTreeSet<Edge> {
    let mut out: HashMap<&str, Vec<&Edge>> = HashMap::new();
    for edge in edges {
        out.entry(edge.source.as_str()).or_default().push(edge);
    }
    let mut found = BTreeSet::new();
    let mut visited = HashSet::from([start]);
    let mut queue = VecDeque::from([(start, 0)]);
    while let Some((node, hop)) = queue.pop_front() {
        if hop == depth {
            continue;
        }
        for edge in out.get(node).into_iter().flatten() {
            found.insert((*edge).clone());
            if visited.insert(edge.destination.as_str()) {
                queue.push_back((edge.destination.as_str(), hop + 1));
            }
        }
    }
    found
}

#[test]
fn test_traversal_matches_reference_walk() {
    let dir = TempDir::new().unwrap();
    let mut store = open_store(&dir);
    let edges = synthesize(SynthesisConfig::new(60, 150), StdRng::seed_from_u64(8)).unwrap();
    load(&mut store, &edges);

    let cfg = LineageConfig::default();
    for start in ["urn:node:0", "urn:node:17", "urn:node:59"] {
        for depth in [1, 2, 4] {
            let outcome = trace_downstream(&store, &cfg, start, depth).unwrap();
            assert_eq!(
                expected_lineage(&edges, start, depth),
                outcome.connections,
                "start {start}, depth {depth}"
            );
            assert!(outcome.depth_reached() <= depth);
        }
    }
}

#[test]
fn test_spanning_path_reaches_every_node() {
    let dir = TempDir::new().unwrap();
    let mut store = open_store(&dir);
    let edges = synthesize(SynthesisConfig::new(12, 11), StdRng::seed_from_u64(2)).unwrap();
    load(&mut store, &edges);

    let heads = edges
        .iter()
        .map(|e| e.source.as_str())
        .filter(|s| edges.iter().all(|e| e.destination != *s))
        .collect::<Vec<_>>();
    assert_eq!(1, heads.len());

    let outcome = trace_downstream(&store, &LineageConfig::default(), heads[0], 20).unwrap();
    assert_eq!(11, outcome.connections.len());
    assert_eq!(
        Termination::FrontierExhausted { after_hop: 12 },
        outcome.termination
    );
}

#[test]
fn test_generate_and_index_into_sqlite() {
    let dir = TempDir::new().unwrap();
    let mut store = open_store(&dir);

    let mut flushes = Vec::new();
    let summary = generate_and_index(
        &mut store,
        SynthesisConfig::new(100, 1000),
        BatchConfig { batch_size: 300 },
        StdRng::seed_from_u64(5),
        |r| flushes.push(r.size),
    )
    .unwrap();

    assert_eq!(1000, summary.edges);
    assert_eq!(1, summary.components);
    assert_eq!(vec![300, 300, 300, 100], flushes);
    assert_eq!(1000, store.count().unwrap());
}

#[test]
fn test_capped_hop_over_sqlite() {
    let dir = TempDir::new().unwrap();
    let mut store = open_store(&dir);
    let fan_out = (0..20)
        .map(|i| Edge::new("hub", format!("leaf:{i}")))
        .collect::<EdgeSet>();
    load(&mut store, &fan_out);

    let cfg = LineageConfig {
        max_results_per_hop: 5,
    };
    let outcome = trace_downstream(&store, &cfg, "hub", 2).unwrap();
    assert_eq!(5, outcome.connections.len());
    assert!(outcome.hops[0].truncated);
    assert_eq!(5, outcome.hops[0].new_nodes);
    assert!(!outcome.hops[1].truncated);
}

#[test]
fn test_store_reopened_between_runs() {
    let dir = TempDir::new().unwrap();
    {
        let mut store = open_store(&dir);
        store
            .bulk(&[
                EdgeDocument::from(Edge::new("A", "B")),
                EdgeDocument::from(Edge::new("B", "C")),
            ])
            .unwrap();
    }

    let store = open_store(&dir);
    let outcome = trace_downstream(&store, &LineageConfig::default(), "A", 2).unwrap();
    assert_eq!(
        BTreeSet::from([Edge::new("A", "B"), Edge::new("B", "C")]),
        outcome.connections
    );
    assert_eq!(Termination::DepthReached, outcome.termination);
}
