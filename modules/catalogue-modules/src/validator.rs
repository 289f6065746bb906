use std::fmt;
use std::path::Path;

use catalogue_common::error::{CatalogueError, Result};
use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// CONTRACT 1: a `modules` payload must be namespaced by module key — every
/// top-level value must itself be an object (`{module_name: {field: value}}`).
/// A payload whose top-level values include primitives or arrays is
/// flattened and illegal. Duplicate field names across *different* modules
/// are fine; namespacing is what makes that safe.
pub fn validate_namespacing(modules: &Value) -> Result<()> {
    let object = match modules {
        Value::Object(map) => map,
        Value::Null => return Ok(()),
        other => {
            return Err(CatalogueError::ModuleValidation(format!(
                "modules payload must be a JSON object, got {}",
                type_name(other)
            )))
        }
    };

    if object.is_empty() {
        return Ok(());
    }

    let non_dict_keys: Vec<&str> = object
        .iter()
        .filter(|(_, value)| !value.is_object())
        .map(|(key, _)| key.as_str())
        .collect();

    if !non_dict_keys.is_empty() {
        return Err(CatalogueError::ModuleValidation(format!(
            "modules JSONB must be namespaced by module key, not flattened. \
             Found non-dict values for keys: {}. Expected structure: {{'module_name': {{'field': value}}}}",
            non_dict_keys.join(", ")
        )));
    }

    Ok(())
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Load a YAML file with a loader that rejects duplicate keys at any
/// nesting level, returning the parsed document as JSON-shaped `Value`.
/// Used by configuration loaders for entity/module definitions.
pub fn load_yaml_strict(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| CatalogueError::ModuleValidation(format!("cannot read {}: {e}", path.display())))?;

    let value: DupCheckingValue = serde_yaml::from_str(&content).map_err(|e| {
        CatalogueError::ModuleValidation(format!("duplicate keys or malformed YAML in {}: {e}", path.display()))
    })?;

    if !value.0.is_object() {
        return Err(CatalogueError::ModuleValidation(format!(
            "invalid YAML in {}: expected a mapping at the top level, got {}",
            path.display(),
            type_name(&value.0)
        )));
    }

    Ok(value.0)
}

/// A `Value` wrapper whose `Deserialize` impl rejects duplicate keys in any
/// mapping it encounters, at any depth. `serde_yaml`'s own `Value` silently
/// keeps the last occurrence of a duplicate key, the same way a plain
/// `HashMap` would — this type exists specifically to reject that instead.
struct DupCheckingValue(Value);

impl<'de> Deserialize<'de> for DupCheckingValue {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(DupCheckingVisitor).map(DupCheckingValue)
    }
}

struct DupCheckingVisitor;

impl<'de> Visitor<'de> for DupCheckingVisitor {
    type Value = Value;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a YAML scalar, sequence, or mapping with no duplicate keys")
    }

    fn visit_bool<E>(self, v: bool) -> std::result::Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E>(self, v: i64) -> std::result::Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_u64<E>(self, v: u64) -> std::result::Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_f64<E>(self, v: f64) -> std::result::Result<Value, E> {
        Ok(serde_json::Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null))
    }

    fn visit_str<E>(self, v: &str) -> std::result::Result<Value, E> {
        Ok(Value::String(v.to_string()))
    }

    fn visit_string<E>(self, v: String) -> std::result::Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_unit<E>(self) -> std::result::Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E>(self) -> std::result::Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> std::result::Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element::<DupCheckingValue>()? {
            items.push(item.0);
        }
        Ok(Value::Array(items))
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut result = Map::new();
        while let Some(key) = map.next_key::<String>()? {
            if result.contains_key(&key) {
                return Err(de::Error::custom(format!(
                    "duplicate key: '{key}' — each key must be unique within its scope"
                )));
            }
            let value: DupCheckingValue = map.next_value()?;
            result.insert(key, value.0);
        }
        Ok(Value::Object(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn namespaced_modules_pass() {
        let modules = json!({
            "location": {"latitude": 55.95, "longitude": -3.18},
            "contact": {"phone": "+44 131 555 0100"},
        });
        assert!(validate_namespacing(&modules).is_ok());
    }

    #[test]
    fn empty_modules_pass() {
        assert!(validate_namespacing(&json!({})).is_ok());
    }

    #[test]
    fn flattened_modules_are_rejected() {
        let modules = json!({"latitude": 55.95, "longitude": -3.18, "phone": "+44 131 555 0100"});
        let err = validate_namespacing(&modules).unwrap_err();
        assert!(matches!(err, CatalogueError::ModuleValidation(_)));
    }

    #[test]
    fn duplicate_fields_across_different_modules_are_allowed() {
        let modules = json!({
            "sports_facility": {"name": "Padel Court"},
            "wine_production": {"name": "Chateau"},
        });
        assert!(validate_namespacing(&modules).is_ok());
    }

    #[test]
    fn strict_yaml_rejects_top_level_duplicate_keys() {
        let yaml = "trust_levels:\n  google_places: 70\ntrust_levels:\n  serper: 50\n";
        let result: std::result::Result<DupCheckingValue, _> = serde_yaml::from_str(yaml);
        assert!(result.is_err());
    }

    #[test]
    fn strict_yaml_accepts_unique_keys() {
        let yaml = "trust_levels:\n  google_places: 70\n  serper: 50\nunknown_source: 10\n";
        let result: DupCheckingValue = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            result.0,
            json!({"trust_levels": {"google_places": 70, "serper": 50}, "unknown_source": 10})
        );
    }

    #[test]
    fn strict_yaml_rejects_nested_duplicate_keys() {
        let yaml = "modules:\n  sports_facility:\n    name: a\n    name: b\n";
        let result: std::result::Result<DupCheckingValue, _> = serde_yaml::from_str(yaml);
        assert!(result.is_err());
    }
}
