//! Label dependency resolution between web-ACL rules.
//!
//! A rule emits labels on match; another rule referencing such a label depends
//! on the emitter. The resolver only connects rules — match polarity is
//! irrelevant, so a reference under a NOT wrapper still counts.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::graph::{Edge, EdgeKind, NodeId};
use crate::types::{AclRule, Layer};
use crate::walk;

/// Result of resolving one ordered rule list.
#[derive(Debug, Default)]
pub struct LabelResolution {
    pub edges: Vec<Edge>,
    /// Warnings keyed by the node they belong to, attached by the engine.
    pub warnings: Vec<(NodeId, String)>,
}

/// Resolve label dependencies over `rules`, which the caller passes in
/// priority-ascending order.
///
/// On an emitter collision the first rule in array order wins; the losing
/// rule gets a warning so genuine fan-in stays visible. Graph structure is
/// order-independent — only warning accumulation follows the given order.
pub fn resolve(rules: &[AclRule]) -> LabelResolution {
    let mut resolution = LabelResolution::default();

    // label -> index of its (winning) emitter
    let mut emitted_by: HashMap<&str, usize> = HashMap::new();
    for (index, rule) in rules.iter().enumerate() {
        for label in &rule.labels {
            match emitted_by.entry(label.as_str()) {
                Entry::Vacant(slot) => {
                    slot.insert(index);
                }
                Entry::Occupied(slot) => {
                    let first = &rules[*slot.get()];
                    resolution.warnings.push((
                        NodeId::rule(Layer::Acl, &rule.name),
                        format!(
                            "label {label:?} is already emitted by rule {:?}; \
                             first emitter wins",
                            first.name
                        ),
                    ));
                }
            }
        }
    }

    for rule in rules {
        let referencer = NodeId::rule(Layer::Acl, &rule.name);
        for label in walk::collect_label_references(&rule.statement) {
            let Some(&emitter_index) = emitted_by.get(label.as_str()) else {
                // Unresolvable reference: no edge, not an error.
                continue;
            };
            let emitter = &rules[emitter_index];
            if emitter.name == rule.name {
                continue;
            }
            resolution.edges.push(Edge::new(
                EdgeKind::LabelDependency,
                NodeId::rule(Layer::Acl, &emitter.name),
                referencer.clone(),
            ));
            if emitter.is_terminal() {
                resolution.warnings.push((
                    referencer.clone(),
                    format!(
                        "depends on label {label:?} from rule {:?}, whose terminal \
                         {} action halts evaluation before the label is emitted",
                        emitter.name,
                        emitter.action_tag().unwrap_or_default()
                    ),
                ));
            }
        }
    }

    resolution
}
