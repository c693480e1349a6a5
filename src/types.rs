//! Type definitions for the two rule document layers.
//!
//! Documents arrive shaped like cloud-provider rule-set exports: web-ACL rules
//! carry `Name`/`Priority`/`Action`/`Statement`/`RuleLabels`, listener rules
//! carry `Name`/`Priority`/`Actions`/`Conditions`. Rules are immutable inputs;
//! parsing is best-effort and records warnings instead of failing, so one
//! malformed element never takes down the whole document.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Layers
// ============================================================================

/// The rule layer a node or document belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    /// Web-application-firewall ACL rules.
    Acl,
    /// Load-balancer listener rules.
    Alb,
}

impl Layer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::Acl => "acl",
            Layer::Alb => "alb",
        }
    }
}

// ============================================================================
// ACL rules
// ============================================================================

/// A web-ACL rule parsed with best-effort defaults.
///
/// `action` and `statement` stay raw [`Value`] trees: statement shapes are
/// open-ended and are only ever walked structurally.
#[derive(Debug, Clone)]
pub struct AclRule {
    pub name: String,
    pub priority: i64,
    pub action: Value,
    pub statement: Value,
    /// Labels this rule emits on match.
    pub labels: Vec<String>,
    /// Parse-time warnings (missing keys, unusable shapes).
    pub warnings: Vec<String>,
}

impl AclRule {
    /// Parse one document element. `index` supplies the name/priority fallback.
    pub fn from_value(index: usize, raw: &Value) -> AclRule {
        let mut warnings = Vec::new();

        let obj = match raw.as_object() {
            Some(obj) => obj,
            None => {
                warnings.push("rule is not a JSON object".to_string());
                return AclRule {
                    name: format!("acl-rule-{index}"),
                    priority: index as i64,
                    action: Value::Null,
                    statement: Value::Null,
                    labels: Vec::new(),
                    warnings,
                };
            }
        };

        let name = match obj.get("Name").and_then(Value::as_str) {
            Some(name) => name.to_string(),
            None => {
                warnings.push("missing Name, using array index".to_string());
                format!("acl-rule-{index}")
            }
        };
        let priority = match obj.get("Priority").and_then(Value::as_i64) {
            Some(priority) => priority,
            None => {
                warnings.push("missing Priority, using array index".to_string());
                index as i64
            }
        };
        let action = obj.get("Action").cloned().unwrap_or_else(|| {
            warnings.push("missing Action".to_string());
            Value::Null
        });
        let statement = obj.get("Statement").cloned().unwrap_or_else(|| {
            warnings.push("missing Statement".to_string());
            Value::Null
        });
        let labels = parse_rule_labels(obj.get("RuleLabels"));

        AclRule {
            name,
            priority,
            action,
            statement,
            labels,
            warnings,
        }
    }

    /// Lower-cased action tag (`block`, `allow`, `count`, ...), taken from the
    /// first key of the action object.
    pub fn action_tag(&self) -> Option<String> {
        self.action
            .as_object()
            .and_then(|obj| obj.keys().next())
            .map(|key| key.to_ascii_lowercase())
    }

    /// Whether this rule's action halts further evaluation.
    pub fn is_terminal(&self) -> bool {
        matches!(self.action_tag().as_deref(), Some("block") | Some("allow"))
    }
}

/// Emitted labels: either `[{"Name": "..."}]` (provider form) or plain strings.
fn parse_rule_labels(raw: Option<&Value>) -> Vec<String> {
    let mut labels = Vec::new();
    let Some(items) = raw.and_then(Value::as_array) else {
        return labels;
    };
    for item in items {
        let label = match item {
            Value::String(s) => Some(s.as_str()),
            Value::Object(obj) => obj.get("Name").and_then(Value::as_str),
            _ => None,
        };
        if let Some(label) = label {
            if !labels.iter().any(|known| known == label) {
                labels.push(label.to_string());
            }
        }
    }
    labels
}

// ============================================================================
// Listener (ALB) rules
// ============================================================================

/// A load-balancer listener rule parsed with best-effort defaults.
#[derive(Debug, Clone)]
pub struct AlbRule {
    pub name: String,
    pub priority: i64,
    /// Raw `Actions` array, scanned structurally by the correlator.
    pub actions: Value,
    /// Parsed condition trees, one per `Conditions` element.
    pub conditions: Vec<Condition>,
    /// Raw `Conditions` value, kept for structural scans.
    pub conditions_raw: Value,
    pub warnings: Vec<String>,
}

impl AlbRule {
    /// Parse one document element. `index` supplies the name/priority fallback.
    pub fn from_value(index: usize, raw: &Value) -> AlbRule {
        let mut warnings = Vec::new();

        let obj = match raw.as_object() {
            Some(obj) => obj,
            None => {
                warnings.push("rule is not a JSON object".to_string());
                return AlbRule {
                    name: format!("alb-rule-{index}"),
                    priority: index as i64,
                    actions: Value::Null,
                    conditions: Vec::new(),
                    conditions_raw: Value::Null,
                    warnings,
                };
            }
        };

        let name = match obj.get("Name").and_then(Value::as_str) {
            Some(name) => name.to_string(),
            None => {
                warnings.push("missing Name, using array index".to_string());
                format!("alb-rule-{index}")
            }
        };
        // Listener exports carry priority as a number or a numeric string.
        let priority = match obj.get("Priority") {
            Some(Value::Number(n)) => n.as_i64().unwrap_or(index as i64),
            Some(Value::String(s)) if s.parse::<i64>().is_ok() => {
                s.parse::<i64>().unwrap_or(index as i64)
            }
            _ => {
                warnings.push("missing Priority, using array index".to_string());
                index as i64
            }
        };
        let actions = obj.get("Actions").cloned().unwrap_or_else(|| {
            warnings.push("missing Actions".to_string());
            Value::Null
        });
        let conditions_raw = obj.get("Conditions").cloned().unwrap_or_else(|| {
            warnings.push("missing Conditions".to_string());
            Value::Null
        });

        let mut conditions = Vec::new();
        if let Some(items) = conditions_raw.as_array() {
            for item in items {
                match Condition::from_value(item) {
                    Some(condition) => conditions.push(condition),
                    None => {
                        warnings.push("unrecognized condition shape".to_string());
                        conditions.push(Condition::opaque());
                    }
                }
            }
        }

        AlbRule {
            name,
            priority,
            actions,
            conditions,
            conditions_raw,
            warnings,
        }
    }

    /// Lower-cased `Type` tags of the rule's actions.
    pub fn action_types(&self) -> Vec<String> {
        let mut types = Vec::new();
        if let Some(items) = self.actions.as_array() {
            for item in items {
                if let Some(ty) = item.get("Type").and_then(Value::as_str) {
                    types.push(ty.to_ascii_lowercase());
                }
            }
        }
        types
    }

    pub fn has_action(&self, ty: &str) -> bool {
        self.action_types().iter().any(|known| known == ty)
    }
}

// ============================================================================
// Conditions
// ============================================================================

/// Boolean combinator over child conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoolOp {
    #[serde(rename = "AND", alias = "and", alias = "And")]
    And,
    #[serde(rename = "OR", alias = "or", alias = "Or")]
    Or,
    #[serde(rename = "NOT", alias = "not", alias = "Not")]
    Not,
}

impl BoolOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoolOp::And => "AND",
            BoolOp::Or => "OR",
            BoolOp::Not => "NOT",
        }
    }
}

/// A listener rule condition: a flat `{field, values}` predicate or a compound
/// AND/OR/NOT over child conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Condition {
    Compound {
        #[serde(alias = "Op")]
        op: BoolOp,
        #[serde(default, alias = "Children")]
        children: Vec<Condition>,
    },
    Leaf {
        #[serde(alias = "Field")]
        field: String,
        #[serde(default, alias = "Values")]
        values: Vec<String>,
    },
}

impl Condition {
    /// Parse a condition element; `None` for shapes that match neither form.
    pub fn from_value(raw: &Value) -> Option<Condition> {
        serde_json::from_value(raw.clone()).ok()
    }

    /// Placeholder leaf for unrecognized shapes, so the element still shows up
    /// in the expansion.
    pub fn opaque() -> Condition {
        Condition::Leaf {
            field: "unknown".to_string(),
            values: Vec::new(),
        }
    }

    pub fn is_compound(&self) -> bool {
        matches!(self, Condition::Compound { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================
