use serde_json::Value;
use sha2::{Digest, Sha256};

use catalogue_common::hash::hash_payload;
use catalogue_store::store::Store;
use catalogue_store::types::ExtractedRecord;

use crate::error::Result;

/// Compute the LLM extraction cache key: `SHA-256(sorted_json(raw) |
/// prompt | model)`. Distinct from [`hash_payload`]'s JSON-object
/// canonicalization — the cache key pipe-joins three independent strings,
/// matching the original implementation's `compute_cache_key` exactly, so
/// a deployment migrating cached rows keeps the same keys.
pub fn compute_cache_key(raw_data: &Value, prompt: &str, model: &str) -> Result<String> {
    let raw_json = canonical_json(raw_data)?;
    let cache_input = format!("{raw_json}|{prompt}|{model}");
    let mut hasher = Sha256::new();
    hasher.update(cache_input.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

/// Sorted-key, compact-separator JSON encoding, matching Python's
/// `json.dumps(..., sort_keys=True, separators=(',', ':'))`.
fn canonical_json(value: &Value) -> Result<String> {
    // `hash_payload` already recursively sorts object keys; reuse that
    // canonicalization and just take its pre-hash JSON bytes by
    // re-serializing the same sorted structure rather than duplicating
    // the sort logic here.
    let sorted = sort_keys(value);
    serde_json::to_string(&sorted).map_err(crate::error::LlmError::from)
}

fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut sorted = serde_json::Map::new();
            for (k, v) in entries {
                sorted.insert(k.clone(), sort_keys(v));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

/// Look up a previously-persisted ExtractedRecord by cache key before
/// calling an LLM. A hit means an identical (raw payload, prompt, model)
/// triple already produced a result — the extractor should reuse it
/// rather than spending another API call.
pub async fn lookup(store: &Store, cache_key: &str) -> catalogue_common::error::Result<Option<ExtractedRecord>> {
    store.find_extracted_record_by_hash(cache_key).await
}

/// `hash_payload` re-export point for callers that want the ordinary
/// whole-payload hash rather than the pipe-joined cache key (e.g. when
/// persisting the eventual ExtractedRecord's own `extraction_hash`, which
/// follows the runner's convention in `catalogue-extract`, not this one).
pub fn payload_hash(raw_data: &Value) -> catalogue_common::error::Result<String> {
    hash_payload(raw_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cache_key_is_order_independent_over_raw_data() {
        let a = json!({"name": "Venue", "address": "123 St"});
        let b = json!({"address": "123 St", "name": "Venue"});
        let key_a = compute_cache_key(&a, "Extract venue", "gpt-4o-mini").unwrap();
        let key_b = compute_cache_key(&b, "Extract venue", "gpt-4o-mini").unwrap();
        assert_eq!(key_a, key_b);
    }

    #[test]
    fn cache_key_changes_with_model() {
        let raw = json!({"name": "Venue"});
        let key_a = compute_cache_key(&raw, "Extract venue", "gpt-4o-mini").unwrap();
        let key_b = compute_cache_key(&raw, "Extract venue", "gpt-4o").unwrap();
        assert_ne!(key_a, key_b);
    }

    #[test]
    fn cache_key_changes_with_prompt() {
        let raw = json!({"name": "Venue"});
        let key_a = compute_cache_key(&raw, "Extract venue", "gpt-4o-mini").unwrap();
        let key_b = compute_cache_key(&raw, "Extract coach", "gpt-4o-mini").unwrap();
        assert_ne!(key_a, key_b);
    }

    #[test]
    fn cache_key_is_64_hex_chars() {
        let key = compute_cache_key(&json!({"a": 1}), "p", "m").unwrap();
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
