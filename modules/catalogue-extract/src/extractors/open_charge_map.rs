use std::collections::HashMap;

use serde_json::{json, Value};

use catalogue_common::error::Result;

use crate::extractor::Extractor;
use crate::schema::{format_phone_uk, format_postcode_uk};

/// Extractor for OpenChargeMap EV-charging POI data (`AddressInfo`,
/// `OperatorInfo`, `Connections`). Clean structured source; no LLM needed.
pub struct OpenChargeMapExtractor;

impl Extractor for OpenChargeMapExtractor {
    fn source_name(&self) -> &str {
        "open_charge_map"
    }

    fn extract(&self, raw_item: &Value) -> Result<HashMap<String, Value>> {
        let mut extracted = HashMap::new();
        let address_info = raw_item.get("AddressInfo").cloned().unwrap_or(Value::Null);

        extracted.insert(
            "entity_name".to_string(),
            json!(address_info
                .get("Title")
                .and_then(Value::as_str)
                .unwrap_or("")),
        );
        extracted.insert("entity_class".to_string(), json!("venue"));

        let mut address_parts = Vec::new();
        for key in ["AddressLine1", "AddressLine2", "Town", "StateOrProvince"] {
            if let Some(part) = address_info.get(key).and_then(Value::as_str) {
                if !part.is_empty() {
                    address_parts.push(part.to_string());
                }
            }
        }
        if !address_parts.is_empty() {
            extracted.insert("street_address".to_string(), json!(address_parts.join(", ")));
        }

        if let Some(lat) = address_info.get("Latitude").and_then(Value::as_f64) {
            extracted.insert("latitude".to_string(), json!(lat));
        }
        if let Some(lng) = address_info.get("Longitude").and_then(Value::as_f64) {
            extracted.insert("longitude".to_string(), json!(lng));
        }

        if let Some(postcode) = address_info.get("Postcode").and_then(Value::as_str) {
            if let Some(formatted) = format_postcode_uk(postcode) {
                extracted.insert("postcode".to_string(), json!(formatted));
            }
        }

        if let Some(comments) = address_info.get("AccessComments").and_then(Value::as_str) {
            if !comments.is_empty() {
                extracted.insert("access_comments".to_string(), json!(comments));
            }
        }

        if let Some(uuid) = raw_item.get("UUID").and_then(Value::as_str) {
            extracted.insert("external_id".to_string(), json!(uuid));
        }

        if let Some(operator_info) = raw_item.get("OperatorInfo") {
            if let Some(title) = operator_info.get("Title").and_then(Value::as_str) {
                extracted.insert("operator_name".to_string(), json!(title));
            }
            if let Some(phone_raw) = operator_info.get("PhonePrimaryContact").and_then(Value::as_str) {
                if let Some(formatted) = format_phone_uk(phone_raw) {
                    extracted.insert("phone".to_string(), json!(formatted));
                }
            }
        }

        if let Some(usage_type) = raw_item.get("UsageType").and_then(|u| u.get("Title")) {
            extracted.insert("usage_type".to_string(), usage_type.clone());
        }
        if let Some(usage_cost) = raw_item.get("UsageCost") {
            if !usage_cost.is_null() {
                extracted.insert("usage_cost".to_string(), usage_cost.clone());
            }
        }
        if let Some(is_operational) = raw_item.get("StatusType").and_then(|s| s.get("IsOperational")) {
            extracted.insert("is_operational".to_string(), is_operational.clone());
        }
        if let Some(n) = raw_item.get("NumberOfPoints") {
            if !n.is_null() {
                extracted.insert("number_of_points".to_string(), n.clone());
            }
        }

        if let Some(connections) = raw_item.get("Connections").and_then(Value::as_array) {
            extracted.insert(
                "connections".to_string(),
                json!(connections
                    .iter()
                    .map(extract_connection)
                    .collect::<Vec<_>>()),
            );
        }

        if let Some(comments) = raw_item.get("GeneralComments").and_then(Value::as_str) {
            if !comments.is_empty() {
                extracted.insert("general_comments".to_string(), json!(comments));
            }
        }

        Ok(extracted)
    }
}

fn extract_connection(conn: &Value) -> Value {
    let mut out = serde_json::Map::new();
    if let Some(title) = conn.get("ConnectionType").and_then(|t| t.get("Title")) {
        out.insert("type".to_string(), title.clone());
    }
    if let Some(power) = conn.get("PowerKW") {
        if !power.is_null() {
            out.insert("power_kw".to_string(), power.clone());
        }
    }
    if let Some(quantity) = conn.get("Quantity") {
        if !quantity.is_null() {
            out.insert("quantity".to_string(), quantity.clone());
        }
    }
    if let Some(level) = conn.get("Level").and_then(|l| l.get("Title")) {
        out.insert("level".to_string(), level.clone());
    }
    if let Some(current_type) = conn.get("CurrentType").and_then(|c| c.get("Title")) {
        out.insert("current_type".to_string(), current_type.clone());
    }
    if let Some(voltage) = conn.get("Voltage") {
        if !voltage.is_null() {
            out.insert("voltage".to_string(), voltage.clone());
        }
    }
    if let Some(amps) = conn.get("Amps") {
        if !amps.is_null() {
            out.insert("amps".to_string(), amps.clone());
        }
    }
    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_address_and_location() {
        let raw = json!({
            "AddressInfo": {
                "Title": "Morrison Street Car Park",
                "AddressLine1": "1 Morrison St",
                "Town": "Edinburgh",
                "Postcode": "eh3 8bj",
                "Latitude": 55.947,
                "Longitude": -3.206
            },
            "UUID": "abc-123",
            "OperatorInfo": { "Title": "Pod Point", "PhonePrimaryContact": "0131 555 1234" }
        });
        let extractor = OpenChargeMapExtractor;
        let extracted = extractor.extract(&raw).unwrap();
        assert_eq!(extracted["entity_name"], json!("Morrison Street Car Park"));
        assert_eq!(extracted["postcode"], json!("EH3 8BJ"));
        assert_eq!(extracted["operator_name"], json!("Pod Point"));
        assert_eq!(extracted["phone"], json!("+441315551234"));
    }

    #[test]
    fn validate_and_split_route_ev_fields_to_discovered() {
        let extractor = OpenChargeMapExtractor;
        let raw = json!({
            "AddressInfo": { "Title": "Test Station", "Latitude": 1.0, "Longitude": 1.0 },
        });
        let extracted = extractor.extract(&raw).unwrap();
        let validated = extractor.validate(extracted).unwrap();
        let (attributes, discovered) = extractor.split_attributes(validated);
        assert!(attributes.contains_key("entity_name"));
        assert!(attributes.contains_key("latitude"));
        assert!(discovered.is_empty() || !discovered.contains_key("entity_name"));
    }
}
