//! Graph structure shared by every resolver and the layout engine.
//!
//! Node identity is a structured composite key, not a delimited string: rule
//! names may contain any character, and string concatenation would let
//! `rule#and0` the rule collide with `rule`'s first expansion child. The
//! display form is only the serialized rendition for the graph consumer.

use serde::{Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;

use crate::types::{BoolOp, Layer};

// ============================================================================
// Identity
// ============================================================================

/// The kind of condition occupying one position of an expansion tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepOp {
    And,
    Or,
    Not,
    /// A leaf predicate.
    Cond,
}

impl StepOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepOp::And => "and",
            StepOp::Or => "or",
            StepOp::Not => "not",
            StepOp::Cond => "cond",
        }
    }
}

impl From<BoolOp> for StepOp {
    fn from(op: BoolOp) -> StepOp {
        match op {
            BoolOp::And => StepOp::And,
            BoolOp::Or => StepOp::Or,
            BoolOp::Not => StepOp::Not,
        }
    }
}

/// One step down a condition expansion tree: the condition's kind and its
/// index among its parent's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PathStep {
    pub op: StepOp,
    pub index: usize,
}

impl PathStep {
    pub fn new(op: impl Into<StepOp>, index: usize) -> PathStep {
        PathStep {
            op: op.into(),
            index,
        }
    }
}

/// Stable node identity across the whole graph.
///
/// Equality and hashing use the structured key; [`fmt::Display`] renders the
/// stable string form used in serialized output (`alb:my-rule#and0#cond1`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeId {
    /// A node backed by a rule.
    Rule { layer: Layer, name: String },
    /// A synthetic condition node, addressed by its position in the owning
    /// rule's condition expansion tree.
    Condition {
        layer: Layer,
        rule: String,
        path: Vec<PathStep>,
    },
    /// The per-layer anchor that terminal-action edges point back to.
    Anchor { layer: Layer },
}

impl NodeId {
    pub fn rule(layer: Layer, name: &str) -> NodeId {
        NodeId::Rule {
            layer,
            name: name.to_string(),
        }
    }

    pub fn condition(layer: Layer, rule: &str, path: Vec<PathStep>) -> NodeId {
        NodeId::Condition {
            layer,
            rule: rule.to_string(),
            path,
        }
    }

    pub fn anchor(layer: Layer) -> NodeId {
        NodeId::Anchor { layer }
    }

    pub fn layer(&self) -> Layer {
        match self {
            NodeId::Rule { layer, .. }
            | NodeId::Condition { layer, .. }
            | NodeId::Anchor { layer } => *layer,
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Rule { layer, name } => write!(f, "{}:{}", layer.as_str(), name),
            NodeId::Condition { layer, rule, path } => {
                write!(f, "{}:{}", layer.as_str(), rule)?;
                for step in path {
                    write!(f, "#{}{}", step.op.as_str(), step.index)?;
                }
                Ok(())
            }
            NodeId::Anchor { layer } => write!(f, "{}:@layer", layer.as_str()),
        }
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ============================================================================
// Nodes and edges
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Rule,
    SyntheticCondition,
    LayerAnchor,
}

/// Node position assigned by the layout engine (or supplied externally).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Render payload attached to every node.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// A single node in the dependency graph.
#[derive(Debug, Clone, Serialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub layer: Layer,
    pub data: NodeData,
    /// Absent until layout runs; externally supplied positions always win.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

/// Edge kinds, styled independently by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeKind {
    LabelDependency,
    CompoundExpansion,
    HeaderShared,
    IpShared,
    PortShared,
    PolicyShared,
    ConditionalAction,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::LabelDependency => "label-dependency",
            EdgeKind::CompoundExpansion => "compound-expansion",
            EdgeKind::HeaderShared => "header-shared",
            EdgeKind::IpShared => "ip-shared",
            EdgeKind::PortShared => "port-shared",
            EdgeKind::PolicyShared => "policy-shared",
            EdgeKind::ConditionalAction => "conditional-action",
        }
    }
}

/// A directed edge. `source` is the dependency provider, `target` the
/// dependent — except `compound-expansion`, which points parent to child.
#[derive(Debug, Clone, Serialize)]
pub struct Edge {
    pub id: String,
    pub source: NodeId,
    pub target: NodeId,
    pub kind: EdgeKind,
}

impl Edge {
    pub fn new(kind: EdgeKind, source: NodeId, target: NodeId) -> Edge {
        Edge {
            id: format!("{}:{}->{}", kind.as_str(), source, target),
            source,
            target,
            kind,
        }
    }
}

// ============================================================================
// The graph
// ============================================================================

/// The unified `{nodes, edges}` graph handed to the rendering collaborator.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RuleGraph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl RuleGraph {
    pub fn new() -> RuleGraph {
        RuleGraph::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.iter().any(|node| node.id == *id)
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == *id)
    }

    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|node| node.id == *id)
    }

    /// Add a node unless its id is already taken. Returns whether it landed.
    pub fn push_node(&mut self, node: Node) -> bool {
        if self.contains(&node.id) {
            return false;
        }
        self.nodes.push(node);
        true
    }

    /// Add an edge, deduplicating on (kind, source, target).
    pub fn push_edge(&mut self, edge: Edge) -> bool {
        let duplicate = self.edges.iter().any(|known| {
            known.kind == edge.kind && known.source == edge.source && known.target == edge.target
        });
        if duplicate {
            return false;
        }
        self.edges.push(edge);
        true
    }

    /// Drop every edge whose endpoints are not both present. Dangling edges
    /// are never rendered.
    pub fn prune_dangling_edges(&mut self) {
        let ids: HashSet<&NodeId> = self.nodes.iter().map(|node| &node.id).collect();
        let before = self.edges.len();
        self.edges
            .retain(|edge| ids.contains(&edge.source) && ids.contains(&edge.target));
        let dropped = before - self.edges.len();
        if dropped > 0 {
            log::debug!("pruned {dropped} dangling edge(s)");
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_ron(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rule_node(layer: Layer, name: &str) -> Node {
        Node {
            id: NodeId::rule(layer, name),
            kind: NodeKind::Rule,
            layer,
            data: NodeData {
                label: name.to_string(),
                ..NodeData::default()
            },
            position: None,
        }
    }

    #[test]
    fn test_node_id_display_forms() {
        assert_eq!(NodeId::rule(Layer::Acl, "block-bots").to_string(), "acl:block-bots");
        assert_eq!(NodeId::anchor(Layer::Alb).to_string(), "alb:@layer");
        let id = NodeId::condition(
            Layer::Alb,
            "route-api",
            vec![PathStep::new(BoolOp::And, 0), PathStep::new(StepOp::Cond, 1)],
        );
        assert_eq!(id.to_string(), "alb:route-api#and0#cond1");
    }

    #[test]
    fn test_structured_ids_do_not_collide_on_delimiters() {
        // A rule literally named "r#cond0" vs the first expansion child of "r":
        // identical display strings must still be distinct identities.
        let tricky_rule = NodeId::rule(Layer::Alb, "r#cond0");
        let child = NodeId::condition(Layer::Alb, "r", vec![PathStep::new(StepOp::Cond, 0)]);
        assert_eq!(tricky_rule.to_string(), child.to_string());
        assert_ne!(tricky_rule, child);
    }

    #[test]
    fn test_push_node_rejects_duplicate_ids() {
        let mut graph = RuleGraph::new();
        assert!(graph.push_node(rule_node(Layer::Acl, "a")));
        assert!(!graph.push_node(rule_node(Layer::Acl, "a")));
        assert_eq!(graph.nodes.len(), 1);
    }

    #[test]
    fn test_push_edge_dedupes_on_kind_and_endpoints() {
        let mut graph = RuleGraph::new();
        graph.push_node(rule_node(Layer::Acl, "a"));
        graph.push_node(rule_node(Layer::Acl, "b"));
        let a = NodeId::rule(Layer::Acl, "a");
        let b = NodeId::rule(Layer::Acl, "b");
        assert!(graph.push_edge(Edge::new(EdgeKind::LabelDependency, a.clone(), b.clone())));
        assert!(!graph.push_edge(Edge::new(EdgeKind::LabelDependency, a.clone(), b.clone())));
        // A different kind between the same endpoints is a different edge.
        assert!(graph.push_edge(Edge::new(EdgeKind::IpShared, a, b)));
        assert_eq!(graph.edges.len(), 2);
    }

    #[test]
    fn test_prune_drops_dangling_edges() {
        let mut graph = RuleGraph::new();
        graph.push_node(rule_node(Layer::Acl, "a"));
        graph.push_edge(Edge::new(
            EdgeKind::LabelDependency,
            NodeId::rule(Layer::Acl, "a"),
            NodeId::rule(Layer::Acl, "ghost"),
        ));
        graph.push_edge(Edge::new(
            EdgeKind::LabelDependency,
            NodeId::rule(Layer::Acl, "ghost"),
            NodeId::rule(Layer::Acl, "a"),
        ));
        graph.prune_dangling_edges();
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn test_serialized_shape_for_renderer() {
        let mut graph = RuleGraph::new();
        let mut node = rule_node(Layer::Acl, "block-bots");
        node.position = Some(Position { x: -120.0, y: 0.0 });
        node.data.warnings.push("missing Statement".to_string());
        graph.push_node(node);
        graph.push_edge(Edge::new(
            EdgeKind::ConditionalAction,
            NodeId::rule(Layer::Acl, "block-bots"),
            NodeId::anchor(Layer::Acl),
        ));

        let json: serde_json::Value =
            serde_json::from_str(&graph.to_json_pretty().unwrap()).unwrap();
        assert_eq!(json["nodes"][0]["id"], "acl:block-bots");
        assert_eq!(json["nodes"][0]["kind"], "rule");
        assert_eq!(json["nodes"][0]["layer"], "acl");
        assert_eq!(json["nodes"][0]["position"]["x"], -120.0);
        assert_eq!(json["nodes"][0]["data"]["warnings"][0], "missing Statement");
        assert_eq!(json["edges"][0]["kind"], "conditional-action");
        assert_eq!(json["edges"][0]["target"], "acl:@layer");
    }

    #[test]
    fn test_ron_export_is_available() {
        let mut graph = RuleGraph::new();
        graph.push_node(rule_node(Layer::Alb, "route"));
        let ron = graph.to_ron().unwrap();
        assert!(ron.contains("route"));
    }
}
