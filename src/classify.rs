//! Structural classification of graph nodes.
//!
//! Classification is purely structural: membership of a node id in the edge
//! source set and the edge target set decides its class. The four classes
//! partition the node set exactly.

use std::collections::HashSet;

use crate::graph::{NodeId, RuleGraph};

/// Structural tier of a node, derived from edge membership alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeClass {
    Isolated,
    Root,
    Intermediate,
    Leaf,
}

/// The node set partitioned by class, input order preserved inside each.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    pub isolated: Vec<NodeId>,
    pub root: Vec<NodeId>,
    pub intermediate: Vec<NodeId>,
    pub leaf: Vec<NodeId>,
}

impl Classification {
    /// Classes in the fixed order the layout engine processes them.
    pub fn groups(&self) -> [(NodeClass, &[NodeId]); 4] {
        [
            (NodeClass::Isolated, self.isolated.as_slice()),
            (NodeClass::Root, self.root.as_slice()),
            (NodeClass::Intermediate, self.intermediate.as_slice()),
            (NodeClass::Leaf, self.leaf.as_slice()),
        ]
    }

    pub fn len(&self) -> usize {
        self.isolated.len() + self.root.len() + self.intermediate.len() + self.leaf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn class_of(&self, id: &NodeId) -> Option<NodeClass> {
        for (class, ids) in self.groups() {
            if ids.contains(id) {
                return Some(class);
            }
        }
        None
    }
}

/// Partition the graph's nodes by edge membership.
pub fn classify(graph: &RuleGraph) -> Classification {
    let sources: HashSet<&NodeId> = graph.edges.iter().map(|edge| &edge.source).collect();
    let targets: HashSet<&NodeId> = graph.edges.iter().map(|edge| &edge.target).collect();

    let mut classification = Classification::default();
    for node in &graph.nodes {
        let bucket = match (sources.contains(&node.id), targets.contains(&node.id)) {
            (false, false) => &mut classification.isolated,
            (true, false) => &mut classification.root,
            (true, true) => &mut classification.intermediate,
            (false, true) => &mut classification.leaf,
        };
        bucket.push(node.id.clone());
    }
    classification
}
