//! Deterministic hierarchical layout.
//!
//! Classes are laid out top to bottom in the fixed order isolated, root,
//! intermediate, leaf; each class fills rows of at most `nodes_per_row`
//! nodes, evenly spaced and centered on x = 0. The result is a pure function
//! of (nodes, edges, options): same input order, same coordinates.

use std::collections::{HashMap, HashSet};

use crate::classify::classify;
use crate::graph::{NodeId, Position, RuleGraph};

/// Layout geometry knobs. The group gap exceeds the row gap so tiers stay
/// visually separated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutOptions {
    /// Maximum nodes per row.
    pub nodes_per_row: usize,
    /// Horizontal distance between neighbors in a row.
    pub spacing: f64,
    /// Vertical advance per row within a class.
    pub row_gap: f64,
    /// Extra vertical advance between classes, on top of the row gap.
    pub group_gap: f64,
}

impl Default for LayoutOptions {
    fn default() -> LayoutOptions {
        LayoutOptions {
            nodes_per_row: 8,
            spacing: 120.0,
            row_gap: 100.0,
            group_gap: 150.0,
        }
    }
}

/// Assign a position to every node that does not already carry one.
///
/// Externally supplied positions bypass the algorithm entirely: the node
/// keeps its coordinates and does not occupy a row slot.
pub fn assign_positions(graph: &mut RuleGraph, options: &LayoutOptions) {
    let preset: HashSet<NodeId> = graph
        .nodes
        .iter()
        .filter(|node| node.position.is_some())
        .map(|node| node.id.clone())
        .collect();

    let classification = classify(graph);
    let nodes_per_row = options.nodes_per_row.max(1);

    let mut assigned: HashMap<NodeId, Position> = HashMap::new();
    let mut y = 0.0;
    let mut first_group = true;
    for (_, ids) in classification.groups() {
        let pending: Vec<&NodeId> = ids.iter().filter(|id| !preset.contains(id)).collect();
        if pending.is_empty() {
            continue;
        }
        if !first_group {
            y += options.group_gap;
        }
        first_group = false;

        for row in pending.chunks(nodes_per_row) {
            let count = row.len();
            for (slot, id) in row.iter().enumerate() {
                let x = slot as f64 * options.spacing
                    - (count as f64 - 1.0) * options.spacing / 2.0;
                assigned.insert((*id).clone(), Position { x, y });
            }
            y += options.row_gap;
        }
    }

    for node in &mut graph.nodes {
        if node.position.is_none() {
            node.position = assigned.get(&node.id).copied();
        }
    }
}
