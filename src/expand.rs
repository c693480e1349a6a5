//! Compound condition expansion for listener rules.
//!
//! AND/OR/NOT condition trees expand into synthetic child nodes so the
//! renderer can show nesting depth. The rule node itself stands in for a
//! top-level compound (a listener rule's condition list is an implicit AND),
//! so only nested compounds materialize as sub-compound nodes. The expansion
//! is cosmetic: synthetic nodes carry no dependency significance.

use crate::graph::{Edge, EdgeKind, Node, NodeData, NodeId, NodeKind, PathStep, StepOp};
use crate::types::{AlbRule, Condition, Layer};

/// Synthetic nodes and parent-to-child edges for one rule.
#[derive(Debug, Default)]
pub struct Expansion {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// Expand a rule's condition trees under its rule node.
///
/// Every tree position gets a path step — including a top-level compound that
/// never becomes a node — so sibling expansions cannot collide on ids.
pub fn expand_rule(rule: &AlbRule) -> Expansion {
    let mut expansion = Expansion::default();
    let rule_id = NodeId::rule(Layer::Alb, &rule.name);

    for (index, condition) in rule.conditions.iter().enumerate() {
        match condition {
            Condition::Compound { op, children } => {
                // In-place: children hang directly off the rule node.
                let step = PathStep::new(*op, index);
                for (child_index, child) in children.iter().enumerate() {
                    expand_condition(
                        &mut expansion,
                        rule,
                        &rule_id,
                        vec![step],
                        child_index,
                        child,
                    );
                }
            }
            Condition::Leaf { .. } => {
                expand_condition(&mut expansion, rule, &rule_id, Vec::new(), index, condition);
            }
        }
    }

    expansion
}

/// Materialize `condition` as a child of `parent`, then recurse into its
/// children. `prefix` is the path of the parent position, `index` the
/// condition's slot among its siblings.
fn expand_condition(
    expansion: &mut Expansion,
    rule: &AlbRule,
    parent: &NodeId,
    prefix: Vec<PathStep>,
    index: usize,
    condition: &Condition,
) {
    let (step, data) = match condition {
        Condition::Compound { op, .. } => (
            PathStep::new(*op, index),
            NodeData {
                label: op.as_str().to_string(),
                ..NodeData::default()
            },
        ),
        Condition::Leaf { field, values } => (
            PathStep::new(StepOp::Cond, index),
            NodeData {
                label: field.clone(),
                detail: (!values.is_empty()).then(|| values.join(", ")),
                ..NodeData::default()
            },
        ),
    };

    let mut path = prefix;
    path.push(step);
    let id = NodeId::condition(Layer::Alb, &rule.name, path.clone());

    expansion.nodes.push(Node {
        id: id.clone(),
        kind: NodeKind::SyntheticCondition,
        layer: Layer::Alb,
        data,
        position: None,
    });
    expansion.edges.push(Edge::new(
        EdgeKind::CompoundExpansion,
        parent.clone(),
        id.clone(),
    ));

    if let Condition::Compound { children, .. } = condition {
        for (child_index, child) in children.iter().enumerate() {
            expand_condition(expansion, rule, &id, path.clone(), child_index, child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn rule_with_conditions(conditions: serde_json::Value) -> AlbRule {
        AlbRule::from_value(
            0,
            &json!({
                "Name": "r",
                "Priority": 1,
                "Actions": [ { "Type": "forward" } ],
                "Conditions": conditions
            }),
        )
    }

    #[test]
    fn test_simple_conditions_become_leaf_nodes_directly() {
        let rule = rule_with_conditions(json!([
            { "field": "path-pattern", "values": ["/api/*"] },
            { "field": "host-header", "values": ["api.example.com"] }
        ]));

        let expansion = expand_rule(&rule);
        assert_eq!(expansion.nodes.len(), 2);
        assert_eq!(expansion.edges.len(), 2);
        for node in &expansion.nodes {
            assert_eq!(node.kind, NodeKind::SyntheticCondition);
        }
        assert_eq!(expansion.nodes[0].id.to_string(), "alb:r#cond0");
        assert_eq!(expansion.nodes[1].id.to_string(), "alb:r#cond1");
        // All edges hang off the rule node.
        for edge in &expansion.edges {
            assert_eq!(edge.source, NodeId::rule(Layer::Alb, "r"));
            assert_eq!(edge.kind, EdgeKind::CompoundExpansion);
        }
    }

    #[test]
    fn test_nested_compound_expansion_counts() {
        // AND(cond1, cond2, OR(cond3, cond4)): four leaves plus one OR
        // sub-compound; one edge per direct child at each level.
        let rule = rule_with_conditions(json!([
            { "op": "AND", "children": [
                { "field": "c1", "values": [] },
                { "field": "c2", "values": [] },
                { "op": "OR", "children": [
                    { "field": "c3", "values": [] },
                    { "field": "c4", "values": [] }
                ] }
            ] }
        ]));

        let expansion = expand_rule(&rule);

        let leaves: Vec<_> = expansion
            .nodes
            .iter()
            .filter(|node| node.data.label.starts_with('c'))
            .collect();
        let compounds: Vec<_> = expansion
            .nodes
            .iter()
            .filter(|node| node.data.label == "OR")
            .collect();
        assert_eq!(leaves.len(), 4);
        assert_eq!(compounds.len(), 1);
        assert_eq!(expansion.nodes.len(), 5);

        let rule_id = NodeId::rule(Layer::Alb, "r");
        let or_id = compounds[0].id.clone();
        let from_rule = expansion.edges.iter().filter(|e| e.source == rule_id).count();
        let from_or = expansion.edges.iter().filter(|e| e.source == or_id).count();
        assert_eq!(from_rule, 3); // c1, c2, and the OR sub-compound
        assert_eq!(from_or, 2); // c3, c4
        assert_eq!(expansion.edges.len(), 5);
    }

    #[test]
    fn test_sibling_top_level_compounds_do_not_collide() {
        let rule = rule_with_conditions(json!([
            { "op": "AND", "children": [ { "field": "a", "values": [] } ] },
            { "op": "AND", "children": [ { "field": "b", "values": [] } ] }
        ]));

        let expansion = expand_rule(&rule);
        assert_eq!(expansion.nodes.len(), 2);
        assert_ne!(expansion.nodes[0].id, expansion.nodes[1].id);
        assert_eq!(expansion.nodes[0].id.to_string(), "alb:r#and0#cond0");
        assert_eq!(expansion.nodes[1].id.to_string(), "alb:r#and1#cond0");
    }

    #[test]
    fn test_expansion_is_deterministic() {
        let rule = rule_with_conditions(json!([
            { "op": "NOT", "children": [ { "field": "source-ip", "values": ["10.0.0.0/8"] } ] }
        ]));

        let first = expand_rule(&rule);
        let second = expand_rule(&rule);
        let ids = |e: &Expansion| e.nodes.iter().map(|n| n.id.to_string()).collect::<Vec<_>>();
        assert_eq!(ids(&first), ids(&second));
        assert_eq!(first.nodes[0].data.detail.as_deref(), Some("10.0.0.0/8"));
    }
}
