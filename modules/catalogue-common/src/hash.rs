use sha2::{Digest, Sha256};

use crate::error::{CatalogueError, Result};

/// Canonicalize a JSON value so that logically-equal payloads with
/// differently-ordered object keys hash identically: recursively sort
/// object keys, leave arrays and scalars untouched.
fn canonicalize(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut entries: Vec<(&String, &serde_json::Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut sorted = serde_json::Map::new();
            for (k, v) in entries {
                sorted.insert(k.clone(), canonicalize(v));
            }
            serde_json::Value::Object(sorted)
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(canonicalize).collect())
        }
        other => other.clone(),
    }
}

/// Hash a JSON-serializable payload to a 64-character hex SHA-256 digest.
/// Deterministic and container-order-independent: two payloads that are
/// equal after recursively sorting object keys hash identically.
pub fn hash_payload<T: serde::Serialize>(payload: &T) -> Result<String> {
    let value = serde_json::to_value(payload)
        .map_err(|e| CatalogueError::Hash(format!("payload not JSON-serializable: {e}")))?;
    let canonical = canonicalize(&value);
    let bytes = serde_json::to_vec(&canonical)
        .map_err(|e| CatalogueError::Hash(format!("canonical encode failed: {e}")))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hash_is_order_independent_for_object_keys() {
        let a = json!({"query": "padel", "count": 10});
        let b = json!({"count": 10, "query": "padel"});
        assert_eq!(hash_payload(&a).unwrap(), hash_payload(&b).unwrap());
    }

    #[test]
    fn hash_is_64_hex_chars() {
        let h = hash_payload(&json!({"a": 1})).unwrap();
        assert_eq!(h.len(), 64);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn hash_is_order_independent_for_nested_objects() {
        let a = json!({"outer": {"b": 2, "a": 1}, "list": [{"y": 1, "x": 2}]});
        let b = json!({"list": [{"x": 2, "y": 1}], "outer": {"a": 1, "b": 2}});
        assert_eq!(hash_payload(&a).unwrap(), hash_payload(&b).unwrap());
    }

    #[test]
    fn different_content_hashes_differ() {
        let a = json!({"a": 1});
        let b = json!({"a": 2});
        assert_ne!(hash_payload(&a).unwrap(), hash_payload(&b).unwrap());
    }
}
