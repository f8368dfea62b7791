use crate::core::ids::NodeId;

/// Union-find over dense ids that tracks the number of disjoint sets.
struct Forest {
    parent: Vec<usize>,
    rank: Vec<u8>,
    sets: usize,
}

impl Forest {
    fn with_singletons(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            rank: vec![0; len],
            sets: len,
        }
    }

    /// Root of `x`, halving the path on the way up.
    fn root(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            let grandparent = self.parent[self.parent[x]];
            self.parent[x] = grandparent;
            x = grandparent;
        }
        x
    }

    fn merge(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.root(a), self.root(b));
        if ra == rb {
            return;
        }
        let (low, high) = if self.rank[ra] < self.rank[rb] {
            (ra, rb)
        } else {
            (rb, ra)
        };
        self.parent[low] = high;
        if self.rank[low] == self.rank[high] {
            self.rank[high] += 1;
        }
        self.sets -= 1;
    }
}

/// Number of weakly connected components over `node_count` nodes.
///
/// Edge direction is ignored. Every id in `edges` must be below `node_count`.
pub fn weak_component_count<I>(node_count: usize, edges: I) -> usize
where
    I: IntoIterator<Item = (NodeId, NodeId)>,
{
    let mut forest = Forest::with_singletons(node_count);
    for (u, v) in edges {
        forest.merge(u as usize, v as usize);
    }
    forest.sets
}
