//! Cross-layer correlation between ACL and listener rules.
//!
//! Two independent rule layers share headers, IP literals, ports and policy
//! identifiers without ever naming each other. The correlator intersects
//! normalized (lower-cased) string sets pairwise; no fuzzy matching. The
//! pairwise scan is O(rulesA x rulesB) per relation — fine for rule sets in
//! the hundreds, and documented as the scaling limit rather than optimized.

use crate::graph::{Edge, EdgeKind, Node, NodeData, NodeId, NodeKind};
use crate::types::{AclRule, AlbRule, Layer};
use crate::walk;

/// Anchor nodes and correlation edges, merged into the graph by the engine.
#[derive(Debug, Default)]
pub struct Correlation {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// Pre-extracted correlation facets of one ACL rule.
struct AclFacets {
    id: NodeId,
    headers: Vec<String>,
    ips: Vec<String>,
    ports: Vec<u16>,
    policies: Vec<String>,
    terminal: bool,
}

/// Pre-extracted correlation facets of one listener rule.
struct AlbFacets {
    id: NodeId,
    headers: Vec<String>,
    ips: Vec<String>,
    ports: Vec<u16>,
    policies: Vec<String>,
    terminal: bool,
}

/// Correlate the two layers. Either side may be empty; shared-resource edges
/// then vanish while per-layer `conditional-action` edges remain.
pub fn correlate(acl: &[AclRule], alb: &[AlbRule]) -> Correlation {
    let mut correlation = Correlation::default();

    let acl_facets: Vec<AclFacets> = acl
        .iter()
        .map(|rule| AclFacets {
            id: NodeId::rule(Layer::Acl, &rule.name),
            headers: walk::collect_inserted_headers(&rule.action),
            ips: walk::collect_ip_literals(&rule.statement),
            ports: walk::collect_port_values(&rule.statement),
            policies: walk::collect_policy_identifiers(&rule.statement),
            terminal: rule.is_terminal(),
        })
        .collect();
    let alb_facets: Vec<AlbFacets> = alb
        .iter()
        .map(|rule| AlbFacets {
            id: NodeId::rule(Layer::Alb, &rule.name),
            headers: walk::collect_matched_header_names(&rule.conditions_raw),
            ips: merged(
                walk::collect_ip_literals(&rule.conditions_raw),
                walk::collect_ip_literals(&rule.actions),
            ),
            ports: merged(
                walk::collect_port_values(&rule.conditions_raw),
                walk::collect_port_values(&rule.actions),
            ),
            policies: merged(
                walk::collect_policy_identifiers(&rule.conditions_raw),
                walk::collect_policy_identifiers(&rule.actions),
            ),
            terminal: rule.has_action("redirect") || rule.has_action("fixed-response"),
        })
        .collect();

    // Shared-resource relations, ACL (provider) -> ALB (dependent).
    for a in &acl_facets {
        for b in &alb_facets {
            if intersects(&a.headers, &b.headers) {
                correlation
                    .edges
                    .push(Edge::new(EdgeKind::HeaderShared, a.id.clone(), b.id.clone()));
            }
            if intersects(&a.ips, &b.ips) {
                correlation
                    .edges
                    .push(Edge::new(EdgeKind::IpShared, a.id.clone(), b.id.clone()));
            }
            if a.ports.iter().any(|port| b.ports.contains(port)) {
                correlation
                    .edges
                    .push(Edge::new(EdgeKind::PortShared, a.id.clone(), b.id.clone()));
            }
            if intersects(&a.policies, &b.policies) {
                correlation
                    .edges
                    .push(Edge::new(EdgeKind::PolicyShared, a.id.clone(), b.id.clone()));
            }
        }
    }

    // Terminal behaviors mark themselves against their layer's anchor.
    let mut acl_anchor = false;
    for facet in &acl_facets {
        if facet.terminal {
            acl_anchor = true;
            correlation.edges.push(Edge::new(
                EdgeKind::ConditionalAction,
                facet.id.clone(),
                NodeId::anchor(Layer::Acl),
            ));
        }
    }
    let mut alb_anchor = false;
    for facet in &alb_facets {
        if facet.terminal {
            alb_anchor = true;
            correlation.edges.push(Edge::new(
                EdgeKind::ConditionalAction,
                facet.id.clone(),
                NodeId::anchor(Layer::Alb),
            ));
        }
    }
    if acl_anchor {
        correlation.nodes.push(anchor_node(Layer::Acl));
    }
    if alb_anchor {
        correlation.nodes.push(anchor_node(Layer::Alb));
    }

    correlation
}

fn anchor_node(layer: Layer) -> Node {
    Node {
        id: NodeId::anchor(layer),
        kind: NodeKind::LayerAnchor,
        layer,
        data: NodeData {
            label: layer.as_str().to_string(),
            detail: Some("layer root".to_string()),
            ..NodeData::default()
        },
        position: None,
    }
}

fn intersects(a: &[String], b: &[String]) -> bool {
    a.iter().any(|value| b.contains(value))
}

fn merged<T: PartialEq>(mut a: Vec<T>, b: Vec<T>) -> Vec<T> {
    for value in b {
        if !a.contains(&value) {
            a.push(value);
        }
    }
    a
}
