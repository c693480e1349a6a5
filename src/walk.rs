//! Schema-less traversal over arbitrarily nested statement trees.
//!
//! Statement shapes are open-ended (new statement types appear without
//! notice), so every resolver scans them structurally: visit every object,
//! match on the keys you know, ignore the rest. Traversal uses an explicit
//! work stack with a depth guard — input documents are untrusted and may nest
//! arbitrarily, and nothing here may panic or recurse unboundedly.

use ipnet::IpNet;
use serde_json::{Map, Value};
use std::net::IpAddr;

/// Nesting depth past which values are skipped rather than visited.
pub const MAX_WALK_DEPTH: usize = 512;

/// Visit every JSON object in `root`, in document order.
///
/// Arrays are traversed transparently; scalars are ignored. Unknown shapes
/// are walked and simply produce no matches in the caller's visitor.
pub fn walk<F>(root: &Value, mut visit: F)
where
    F: FnMut(&Map<String, Value>),
{
    let mut stack: Vec<(&Value, usize)> = vec![(root, 0)];
    while let Some((value, depth)) = stack.pop() {
        if depth > MAX_WALK_DEPTH {
            continue;
        }
        match value {
            Value::Object(map) => {
                visit(map);
                // Reverse push keeps document order on the LIFO stack.
                for child in map.values().rev() {
                    stack.push((child, depth + 1));
                }
            }
            Value::Array(items) => {
                for item in items.iter().rev() {
                    stack.push((item, depth + 1));
                }
            }
            _ => {}
        }
    }
}

fn push_unique(out: &mut Vec<String>, value: String) {
    if !out.iter().any(|known| *known == value) {
        out.push(value);
    }
}

// ============================================================================
// Extractors
// ============================================================================

/// Every label referenced by a statement tree: each `LabelMatchStatement.Key`,
/// wherever it sits — under AND/OR/NOT combinators, or inside a rate-based
/// statement's scope-down sub-statement. A NOT wrapper still counts: negation
/// affects match semantics, not dependency existence.
pub fn collect_label_references(statement: &Value) -> Vec<String> {
    let mut refs = Vec::new();
    walk(statement, |map| {
        let key = map
            .get("LabelMatchStatement")
            .and_then(|stmt| stmt.get("Key"))
            .and_then(Value::as_str);
        if let Some(label) = key {
            push_unique(&mut refs, label.to_string());
        }
    });
    refs
}

/// Lower-cased names of request headers an ACL action inserts
/// (`InsertHeaders[].Name` anywhere under the action tree).
pub fn collect_inserted_headers(action: &Value) -> Vec<String> {
    let mut names = Vec::new();
    walk(action, |map| {
        let Some(items) = map.get("InsertHeaders").and_then(Value::as_array) else {
            return;
        };
        for item in items {
            if let Some(name) = item.get("Name").and_then(Value::as_str) {
                push_unique(&mut names, name.to_ascii_lowercase());
            }
        }
    });
    names
}

/// Lower-cased header names a listener rule's conditions match on: provider
/// shape (`HttpHeaderConfig.HttpHeaderName`) and flat leaf shape (the values
/// of a leaf whose field is `http-header`).
pub fn collect_matched_header_names(conditions: &Value) -> Vec<String> {
    let mut names = Vec::new();
    walk(conditions, |map| {
        if let Some(name) = map.get("HttpHeaderName").and_then(Value::as_str) {
            push_unique(&mut names, name.to_ascii_lowercase());
        }
        let field = map
            .get("field")
            .or_else(|| map.get("Field"))
            .and_then(Value::as_str);
        if field == Some("http-header") {
            let values = map
                .get("values")
                .or_else(|| map.get("Values"))
                .and_then(Value::as_array);
            for value in values.into_iter().flatten() {
                if let Some(name) = value.as_str() {
                    push_unique(&mut names, name.to_ascii_lowercase());
                }
            }
        }
    });
    names
}

/// Every string anywhere in the tree that parses as an IP address or CIDR
/// block, canonicalized (`10.0.0.1` and `10.0.0.1/32` compare equal).
pub fn collect_ip_literals(root: &Value) -> Vec<String> {
    let mut literals = Vec::new();
    let mut stack: Vec<(&Value, usize)> = vec![(root, 0)];
    while let Some((value, depth)) = stack.pop() {
        if depth > MAX_WALK_DEPTH {
            continue;
        }
        match value {
            Value::String(s) => {
                if let Some(net) = normalize_ip(s) {
                    push_unique(&mut literals, net);
                }
            }
            Value::Array(items) => {
                for item in items.iter().rev() {
                    stack.push((item, depth + 1));
                }
            }
            Value::Object(map) => {
                for child in map.values().rev() {
                    stack.push((child, depth + 1));
                }
            }
            _ => {}
        }
    }
    literals
}

/// Canonical network form of an IP-looking literal, or `None`.
fn normalize_ip(raw: &str) -> Option<String> {
    if let Ok(net) = raw.trim().parse::<IpNet>() {
        return Some(net.to_string());
    }
    raw.trim()
        .parse::<IpAddr>()
        .ok()
        .map(|addr| IpNet::from(addr).to_string())
}

/// Port values: any numeric value (number, numeric string, or array of
/// either) under a key whose name contains `port`.
pub fn collect_port_values(root: &Value) -> Vec<u16> {
    let mut ports = Vec::new();
    walk(root, |map| {
        for (key, value) in map {
            if key.to_ascii_lowercase().contains("port") {
                push_port(&mut ports, value);
            }
        }
    });
    ports
}

fn push_port(out: &mut Vec<u16>, value: &Value) {
    match value {
        Value::Number(n) => {
            if let Some(port) = n.as_u64().and_then(|p| u16::try_from(p).ok()) {
                if !out.contains(&port) {
                    out.push(port);
                }
            }
        }
        Value::String(s) => {
            if let Ok(port) = s.trim().parse::<u16>() {
                if !out.contains(&port) {
                    out.push(port);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                push_port(out, item);
            }
        }
        _ => {}
    }
}

/// Lower-cased policy identifiers: string values (or arrays of strings) under
/// keys that end in `arn` or contain `policy`.
pub fn collect_policy_identifiers(root: &Value) -> Vec<String> {
    let mut ids = Vec::new();
    walk(root, |map| {
        for (key, value) in map {
            let key = key.to_ascii_lowercase();
            if !(key.ends_with("arn") || key.contains("policy")) {
                continue;
            }
            match value {
                Value::String(s) => push_unique(&mut ids, s.to_ascii_lowercase()),
                Value::Array(items) => {
                    for item in items {
                        if let Some(s) = item.as_str() {
                            push_unique(&mut ids, s.to_ascii_lowercase());
                        }
                    }
                }
                _ => {}
            }
        }
    });
    ids
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_label_reference_direct() {
        let statement = json!({
            "LabelMatchStatement": { "Scope": "LABEL", "Key": "bot:verified" }
        });
        assert_eq!(collect_label_references(&statement), vec!["bot:verified"]);
    }

    #[test]
    fn test_label_reference_under_combinators_and_scope_down() {
        let statement = json!({
            "AndStatement": {
                "Statements": [
                    { "NotStatement": { "Statement": {
                        "LabelMatchStatement": { "Key": "allowlisted" }
                    } } },
                    { "RateBasedStatement": {
                        "Limit": 1000,
                        "ScopeDownStatement": {
                            "LabelMatchStatement": { "Key": "suspicious" }
                        }
                    } }
                ]
            }
        });
        assert_eq!(
            collect_label_references(&statement),
            vec!["allowlisted", "suspicious"]
        );
    }

    #[test]
    fn test_unknown_shapes_walk_without_matches() {
        let statement = json!({
            "FutureStatementType": { "Nested": [ { "Deeper": true }, 42, null ] }
        });
        assert!(collect_label_references(&statement).is_empty());
        assert!(collect_ip_literals(&statement).is_empty());
    }

    #[test]
    fn test_depth_guard_skips_without_panicking() {
        let mut value = json!({"LabelMatchStatement": {"Key": "deep"}});
        for _ in 0..(MAX_WALK_DEPTH + 50) {
            value = json!({ "NotStatement": { "Statement": value } });
        }
        // The buried reference is past the guard; the walk must still return.
        assert!(collect_label_references(&value).is_empty());
    }

    #[test]
    fn test_inserted_headers_lowercased() {
        let action = json!({
            "Count": {
                "CustomRequestHandling": {
                    "InsertHeaders": [
                        { "Name": "X-Bot-Score", "Value": "90" },
                        { "Name": "x-bot-score", "Value": "90" }
                    ]
                }
            }
        });
        assert_eq!(collect_inserted_headers(&action), vec!["x-bot-score"]);
    }

    #[test]
    fn test_matched_headers_both_shapes() {
        let conditions = json!([
            { "Field": "http-header",
              "HttpHeaderConfig": { "HttpHeaderName": "X-Bot-Score", "Values": ["9*"] } },
            { "field": "http-header", "values": ["X-Custom"] }
        ]);
        assert_eq!(
            collect_matched_header_names(&conditions),
            vec!["x-bot-score", "x-custom"]
        );
    }

    #[test]
    fn test_ip_literals_canonicalized() {
        let statement = json!({
            "IPSetForwardedIPConfig": { "Addresses": ["10.0.0.1", "192.168.0.0/16"] },
            "Other": "10.0.0.1/32",
            "NotAnIp": "example.com"
        });
        assert_eq!(
            collect_ip_literals(&statement),
            vec!["10.0.0.1/32", "192.168.0.0/16"]
        );
    }

    #[test]
    fn test_port_values_numbers_strings_arrays() {
        let value = json!({
            "SourcePort": 8080,
            "RedirectConfig": { "Port": "443" },
            "Ports": [22, "2222"]
        });
        let mut ports = collect_port_values(&value);
        ports.sort_unstable();
        assert_eq!(ports, vec![22, 443, 2222, 8080]);
    }

    #[test]
    fn test_policy_identifiers_arn_suffix_only() {
        let value = json!({
            "TargetGroupArn": "arn:aws:elasticloadbalancing:tg/API",
            "PolicyName": "Shared-Policy",
            "warning": "this is not an identifier"
        });
        // Object keys visit in sorted order: PolicyName before TargetGroupArn.
        assert_eq!(
            collect_policy_identifiers(&value),
            vec![
                "shared-policy",
                "arn:aws:elasticloadbalancing:tg/api"
            ]
        );
    }
}
