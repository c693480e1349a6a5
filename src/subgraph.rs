//! Focus-node subgraph extraction.
//!
//! Both operations are pure functions of (focus id, graph) and return a new
//! graph preserving the input's node and edge order. The closure traversal
//! carries a visited set: edge data is acyclic by construction, but an
//! accidental cycle in the input must terminate the walk, not hang it.

use std::collections::{HashMap, HashSet};

use crate::graph::{NodeId, RuleGraph};

/// Focus plus its one-hop neighbors in either direction, with only the edges
/// incident to the focus. Unknown focus ids yield an empty graph.
pub fn direct_subgraph(graph: &RuleGraph, focus: &NodeId) -> RuleGraph {
    if !graph.contains(focus) {
        return RuleGraph::new();
    }

    let mut keep: HashSet<&NodeId> = HashSet::new();
    keep.insert(focus);
    let mut subgraph = RuleGraph::new();
    for edge in &graph.edges {
        if edge.source == *focus {
            keep.insert(&edge.target);
            subgraph.edges.push(edge.clone());
        } else if edge.target == *focus {
            keep.insert(&edge.source);
            subgraph.edges.push(edge.clone());
        }
    }

    subgraph.nodes = graph
        .nodes
        .iter()
        .filter(|node| keep.contains(&node.id))
        .cloned()
        .collect();
    subgraph
}

/// Focus plus everything forward-reachable from it (`source -> target`
/// direction only), with every edge whose source lies in the closure.
pub fn dependents_closure(graph: &RuleGraph, focus: &NodeId) -> RuleGraph {
    if !graph.contains(focus) {
        return RuleGraph::new();
    }

    let mut outgoing: HashMap<&NodeId, Vec<&NodeId>> = HashMap::new();
    for edge in &graph.edges {
        outgoing.entry(&edge.source).or_default().push(&edge.target);
    }

    let mut visited: HashSet<&NodeId> = HashSet::new();
    let mut stack: Vec<&NodeId> = vec![focus];
    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        for &target in outgoing.get(id).into_iter().flatten() {
            if !visited.contains(target) {
                stack.push(target);
            }
        }
    }

    let mut subgraph = RuleGraph::new();
    subgraph.nodes = graph
        .nodes
        .iter()
        .filter(|node| visited.contains(&node.id))
        .cloned()
        .collect();
    // A kept edge's target is forward-reachable through it, so the result is
    // self-contained without a second endpoint check.
    subgraph.edges = graph
        .edges
        .iter()
        .filter(|edge| visited.contains(&edge.source))
        .cloned()
        .collect();
    subgraph
}
