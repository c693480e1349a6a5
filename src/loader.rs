//! Rule document ingestion.
//!
//! Documents arrive three ways: raw JSON text, a deployment envelope
//! `{version, deployedAt, rules_packed}`, or a packed payload encoded
//! `base64(gzip(JSON))` with an uncompressed `"raw:" + base64(JSON)`
//! fallback. Whatever the wrapping, the decoded document must carry a
//! top-level rule array (bare, or under a `Rules` key) before the engine
//! sees it.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use flate2::read::GzDecoder;
use serde::Deserialize;
use serde_json::Value;
use std::io::Read;

/// Deployment envelope wrapping a packed rule document.
#[derive(Debug, Deserialize)]
pub struct DocumentEnvelope {
    pub version: String,
    #[serde(rename = "deployedAt")]
    pub deployed_at: String,
    pub rules_packed: String,
}

/// Errors that can occur during document loading.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Gzip decompression error: {0}")]
    Decompress(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid document format: no top-level rule array")]
    InvalidFormat,

    #[error("Empty rules_packed in envelope")]
    EmptyRules,
}

/// Parse raw JSON text into a validated rule document.
pub fn parse_document(text: &str) -> Result<Value, LoadError> {
    let value: Value = serde_json::from_str(text)?;
    validate_rule_array(&value)?;
    Ok(value)
}

/// Decode and parse a packed payload.
///
/// Expected encoding: `base64(gzip(JSON))`, or `"raw:" + base64(JSON)` for
/// the uncompressed fallback.
pub fn unpack_document(packed: &str) -> Result<Value, LoadError> {
    let json = if let Some(b64) = packed.strip_prefix("raw:") {
        let bytes = BASE64.decode(b64)?;
        String::from_utf8(bytes)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?
    } else {
        let compressed = BASE64.decode(packed)?;
        let mut decoder = GzDecoder::new(&compressed[..]);
        let mut json = String::new();
        decoder.read_to_string(&mut json)?;
        json
    };

    let value: Value = serde_json::from_str(&json)?;
    validate_rule_array(&value)?;
    log::debug!(
        "unpacked rule document ({} byte(s) packed, {} byte(s) decoded)",
        packed.len(),
        json.len()
    );
    Ok(value)
}

/// Parse a deployment envelope and unpack the document inside it.
pub fn load_envelope(text: &str) -> Result<Value, LoadError> {
    let envelope: DocumentEnvelope = serde_json::from_str(text)?;
    log::debug!(
        "loading envelope version {}, deployed {}",
        envelope.version,
        envelope.deployed_at
    );
    if envelope.rules_packed.is_empty() {
        return Err(LoadError::EmptyRules);
    }
    unpack_document(&envelope.rules_packed)
}

/// A document qualifies when it is an array of rules, or an object with a
/// top-level `Rules` array.
fn validate_rule_array(value: &Value) -> Result<(), LoadError> {
    let ok = value.is_array() || value.get("Rules").is_some_and(Value::is_array);
    if ok {
        Ok(())
    } else {
        Err(LoadError::InvalidFormat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const RULES_JSON: &str = r#"[
        { "Name": "only", "Priority": 1, "Action": { "Count": {} }, "Statement": {} }
    ]"#;

    #[test]
    fn test_parse_document_bare_array() {
        let doc = parse_document(RULES_JSON).unwrap();
        assert_eq!(doc.as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_parse_document_rules_key() {
        let doc = parse_document(r#"{ "Rules": [], "Extra": true }"#).unwrap();
        assert!(doc.get("Rules").unwrap().as_array().unwrap().is_empty());
    }

    #[test]
    fn test_parse_document_rejects_non_rule_shapes() {
        for text in ["null", "{}", r#"{"Rules": 3}"#, "\"rules\""] {
            let result = parse_document(text);
            assert!(matches!(result, Err(LoadError::InvalidFormat)), "{text}");
        }
    }

    #[test]
    fn test_unpack_raw_format() {
        let encoded = format!("raw:{}", BASE64.encode(RULES_JSON));
        let doc = unpack_document(&encoded).unwrap();
        assert_eq!(doc[0]["Name"], "only");
    }

    #[test]
    fn test_unpack_gzip_format() {
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::io::Write;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(RULES_JSON.as_bytes()).unwrap();
        let compressed = encoder.finish().unwrap();
        let encoded = BASE64.encode(&compressed);

        let doc = unpack_document(&encoded).unwrap();
        assert_eq!(doc[0]["Priority"], 1);
    }

    #[test]
    fn test_unpack_rejects_bad_base64() {
        assert!(matches!(
            unpack_document("raw:!!not-base64!!"),
            Err(LoadError::Base64(_))
        ));
    }

    #[test]
    fn test_envelope_roundtrip() {
        let packed = format!("raw:{}", BASE64.encode(RULES_JSON));
        let envelope = format!(
            r#"{{ "version": "1.0", "deployedAt": "2024-06-01T00:00:00Z", "rules_packed": "{packed}" }}"#
        );
        let doc = load_envelope(&envelope).unwrap();
        assert_eq!(doc[0]["Name"], "only");
    }

    #[test]
    fn test_envelope_empty_rules_rejected() {
        let envelope = r#"{ "version": "1.0", "deployedAt": "now", "rules_packed": "" }"#;
        assert!(matches!(load_envelope(envelope), Err(LoadError::EmptyRules)));
    }
}
