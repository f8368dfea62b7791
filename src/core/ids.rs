use rand::Rng;
use rand::seq::SliceRandom;

pub type NodeId = u32;

const URN_PREFIX: &str = "urn:node:";

/// Fixed set of node identifiers used by one synthesis run.
///
/// Ids index into `urns`; the pool is shuffled once and never grows.
pub struct NodePool {
    urns: Vec<String>,
}

impl NodePool {
    pub fn generate(node_count: NodeId) -> Self {
        Self {
            urns: (0..node_count).map(|i| format!("{URN_PREFIX}{i}")).collect(),
        }
    }

    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.urns.shuffle(rng);
    }

    pub fn urn(&self, id: NodeId) -> &str {
        &self.urns[id as usize]
    }

    pub fn len(&self) -> usize {
        self.urns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urns.is_empty()
    }
}
