//! The wholesale document-to-graph transform.
//!
//! Parse both layers, resolve label dependencies, expand compound conditions,
//! correlate across layers, prune dangling edges. The transform is a pure
//! function of its inputs and never fails: structurally broken documents
//! degrade to an empty contribution, malformed rules to warned placeholder
//! nodes. Partial results always beat aborting.

use serde_json::Value;

use crate::correlate;
use crate::expand;
use crate::graph::{Node, NodeData, NodeId, NodeKind, RuleGraph};
use crate::labels;
use crate::layout::{assign_positions, LayoutOptions};
use crate::types::{AclRule, AlbRule, Layer};

/// Which layers participate in the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayerFilter {
    #[default]
    All,
    AclOnly,
    AlbOnly,
}

impl LayerFilter {
    fn includes(&self, layer: Layer) -> bool {
        match self {
            LayerFilter::All => true,
            LayerFilter::AclOnly => layer == Layer::Acl,
            LayerFilter::AlbOnly => layer == Layer::Alb,
        }
    }
}

/// Build the unpositioned dependency graph from two rule documents.
///
/// Each document is expected to be an array of rule objects, either bare or
/// under a top-level `Rules` key. Anything else contributes an empty layer,
/// so the caller always receives a well-formed (possibly empty) graph.
pub fn build_graph(acl_doc: &Value, alb_doc: &Value, filter: LayerFilter) -> RuleGraph {
    let mut acl_rules = if filter.includes(Layer::Acl) {
        parse_layer(acl_doc, AclRule::from_value)
    } else {
        Vec::new()
    };
    let mut alb_rules = if filter.includes(Layer::Alb) {
        parse_layer(alb_doc, AlbRule::from_value)
    } else {
        Vec::new()
    };

    // Consumers expect priority-ascending processing order; the sort is
    // stable, so equal priorities keep their document order.
    acl_rules.sort_by_key(|rule| rule.priority);
    alb_rules.sort_by_key(|rule| rule.priority);

    let mut graph = RuleGraph::new();

    for rule in &acl_rules {
        push_rule_node(
            &mut graph,
            NodeId::rule(Layer::Acl, &rule.name),
            Layer::Acl,
            NodeData {
                label: rule.name.clone(),
                priority: Some(rule.priority),
                action: rule.action_tag(),
                warnings: rule.warnings.clone(),
                ..NodeData::default()
            },
        );
    }
    for rule in &alb_rules {
        push_rule_node(
            &mut graph,
            NodeId::rule(Layer::Alb, &rule.name),
            Layer::Alb,
            NodeData {
                label: rule.name.clone(),
                priority: Some(rule.priority),
                action: rule.action_types().first().cloned(),
                warnings: rule.warnings.clone(),
                ..NodeData::default()
            },
        );
    }

    let resolution = labels::resolve(&acl_rules);
    for edge in resolution.edges {
        graph.push_edge(edge);
    }
    for (id, warning) in resolution.warnings {
        if let Some(node) = graph.node_mut(&id) {
            node.data.warnings.push(warning);
        }
    }

    for rule in &alb_rules {
        let expansion = expand::expand_rule(rule);
        for node in expansion.nodes {
            graph.push_node(node);
        }
        for edge in expansion.edges {
            graph.push_edge(edge);
        }
    }

    let correlation = correlate::correlate(&acl_rules, &alb_rules);
    for node in correlation.nodes {
        graph.push_node(node);
    }
    for edge in correlation.edges {
        graph.push_edge(edge);
    }

    graph.prune_dangling_edges();
    log::debug!(
        "built graph: {} node(s), {} edge(s) from {} acl / {} alb rule(s)",
        graph.nodes.len(),
        graph.edges.len(),
        acl_rules.len(),
        alb_rules.len()
    );
    graph
}

/// [`build_graph`] followed by the hierarchical layout pass.
pub fn build_positioned_graph(
    acl_doc: &Value,
    alb_doc: &Value,
    filter: LayerFilter,
    options: &LayoutOptions,
) -> RuleGraph {
    let mut graph = build_graph(acl_doc, alb_doc, filter);
    assign_positions(&mut graph, options);
    graph
}

/// The document's rule array: the document itself, or its `Rules` value.
/// Structural failure (null, non-array, ...) yields an empty layer.
fn rule_array(doc: &Value) -> &[Value] {
    if let Some(rules) = doc.as_array() {
        return rules;
    }
    if let Some(rules) = doc.get("Rules").and_then(Value::as_array) {
        return rules;
    }
    &[]
}

fn parse_layer<R>(doc: &Value, parse: impl Fn(usize, &Value) -> R) -> Vec<R> {
    rule_array(doc)
        .iter()
        .enumerate()
        .map(|(index, raw)| parse(index, raw))
        .collect()
}

fn push_rule_node(graph: &mut RuleGraph, id: NodeId, layer: Layer, data: NodeData) {
    if !data.warnings.is_empty() {
        log::warn!("rule {id}: {}", data.warnings.join("; "));
    }
    let node = Node {
        id,
        kind: NodeKind::Rule,
        layer,
        data,
        position: None,
    };
    if !graph.push_node(node) {
        log::warn!("duplicate rule name in layer {}, node dropped", layer.as_str());
    }
}
