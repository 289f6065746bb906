use std::collections::HashMap;

use serde_json::Value;

use catalogue_common::error::{CatalogueError, Result};

use crate::schema::is_field_in_schema;

/// Per-source transformer: raw connector payload item in, schema-primitive
/// fields out. Extractors never interpret data beyond structural
/// normalization — canonical dimension arrays and the `modules` object are
/// populated downstream by the merger/finalizer, never here.
pub trait Extractor: Send + Sync {
    /// Unique identifier for this extractor's data source, matching the
    /// connector of the same name.
    fn source_name(&self) -> &str;

    /// Transform one raw item into extracted fields. Must never emit
    /// `canonical_*` arrays or a `modules` key — doing so is a structural
    /// bug, not a recoverable error.
    fn extract(&self, raw_item: &Value) -> Result<HashMap<String, Value>>;

    /// Enforce required fields (`entity_name`, `entity_class`) and
    /// normalize formats. Invalid coordinates are dropped, not retained.
    fn validate(&self, extracted: HashMap<String, Value>) -> Result<HashMap<String, Value>> {
        default_validate(extracted)
    }

    /// Split extracted fields into schema-defined attributes and
    /// connector-native discovered attributes. The union of both outputs
    /// equals the input — no field is lost.
    fn split_attributes(
        &self,
        extracted: HashMap<String, Value>,
    ) -> (HashMap<String, Value>, HashMap<String, Value>) {
        default_split_attributes(extracted)
    }

    /// Free-text snippets (reviews, editorial summaries) for downstream
    /// summary synthesis. Default: none.
    fn extract_rich_text(&self, _raw_item: &Value) -> Vec<String> {
        Vec::new()
    }

    /// Present only for LLM-backed extractors; used as part of the
    /// extraction cache key and persisted on `ExtractedRecord.model_used`.
    fn model_used(&self) -> Option<&str> {
        None
    }
}

/// Shared `validate` body: every extractor in this crate is deterministic,
/// so the required-field check and format normalization are identical
/// across sources. An extractor overrides this only if its source needs
/// source-specific validation beyond the common contract.
pub fn default_validate(mut extracted: HashMap<String, Value>) -> Result<HashMap<String, Value>> {
    let entity_name_present = extracted
        .get("entity_name")
        .map(|v| matches!(v, Value::String(s) if !s.is_empty()))
        .unwrap_or(false);
    if !entity_name_present {
        return Err(CatalogueError::MissingRequiredField("entity_name".to_string()));
    }

    let entity_class_present = extracted
        .get("entity_class")
        .map(|v| matches!(v, Value::String(s) if !s.is_empty()))
        .unwrap_or(false);
    if !entity_class_present {
        return Err(CatalogueError::MissingRequiredField("entity_class".to_string()));
    }

    if let Some(Value::String(phone)) = extracted.get("phone").cloned() {
        if !phone.starts_with('+') {
            match crate::schema::format_phone_uk(&phone) {
                Some(formatted) => {
                    extracted.insert("phone".to_string(), Value::String(formatted));
                }
                None => {
                    extracted.remove("phone");
                }
            }
        }
    }

    if let Some(lat) = extracted.get("latitude").and_then(Value::as_f64) {
        if !(-90.0..=90.0).contains(&lat) {
            extracted.remove("latitude");
        }
    }
    if let Some(lng) = extracted.get("longitude").and_then(Value::as_f64) {
        if !(-180.0..=180.0).contains(&lng) {
            extracted.remove("longitude");
        }
    }

    Ok(extracted)
}

/// Shared `split_attributes` body: route by [`is_field_in_schema`].
pub fn default_split_attributes(
    extracted: HashMap<String, Value>,
) -> (HashMap<String, Value>, HashMap<String, Value>) {
    let mut attributes = HashMap::new();
    let mut discovered = HashMap::new();
    for (key, value) in extracted {
        if is_field_in_schema(&key) {
            attributes.insert(key, value);
        } else {
            discovered.insert(key, value);
        }
    }
    (attributes, discovered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_validate_rejects_missing_entity_name() {
        let mut extracted = HashMap::new();
        extracted.insert("entity_class".to_string(), json!("venue"));
        let err = default_validate(extracted).unwrap_err();
        assert!(matches!(err, CatalogueError::MissingRequiredField(f) if f == "entity_name"));
    }

    #[test]
    fn default_validate_rejects_missing_entity_class() {
        let mut extracted = HashMap::new();
        extracted.insert("entity_name".to_string(), json!("Game4Padel"));
        let err = default_validate(extracted).unwrap_err();
        assert!(matches!(err, CatalogueError::MissingRequiredField(f) if f == "entity_class"));
    }

    #[test]
    fn default_validate_drops_out_of_range_coordinates() {
        let mut extracted = HashMap::new();
        extracted.insert("entity_name".to_string(), json!("Test"));
        extracted.insert("entity_class".to_string(), json!("venue"));
        extracted.insert("latitude".to_string(), json!(200.0));
        let validated = default_validate(extracted).unwrap();
        assert!(!validated.contains_key("latitude"));
    }

    #[test]
    fn default_split_attributes_preserves_union() {
        let mut extracted = HashMap::new();
        extracted.insert("entity_name".to_string(), json!("Test"));
        extracted.insert("operator_name".to_string(), json!("Acme"));
        let (attributes, discovered) = default_split_attributes(extracted);
        assert!(attributes.contains_key("entity_name"));
        assert!(discovered.contains_key("operator_name"));
        assert_eq!(attributes.len() + discovered.len(), 2);
    }
}
