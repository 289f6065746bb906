use std::collections::HashMap;

use serde_json::{json, Value};

use catalogue_common::error::Result;

use crate::extractor::Extractor;
use crate::schema::format_phone_uk;

/// Extractor for a whole OSM Overpass API response: `{"elements": [...]}`.
/// OpenStreetMap is a whole-payload source (see
/// `container::items_for_source`) — the item handed to `extract` is the
/// full response, so the first element is treated as the match for the
/// query that produced this capture; remaining elements are not persisted
/// individually.
pub struct OpenStreetMapExtractor;

impl Extractor for OpenStreetMapExtractor {
    fn source_name(&self) -> &str {
        "openstreetmap"
    }

    fn extract(&self, raw_item: &Value) -> Result<HashMap<String, Value>> {
        let element = raw_item
            .get("elements")
            .and_then(Value::as_array)
            .and_then(|elements| elements.first())
            .cloned()
            .unwrap_or(Value::Null);

        let mut extracted = HashMap::new();
        let tags = element.get("tags").cloned().unwrap_or(Value::Null);

        let name = tags.get("name").and_then(Value::as_str).unwrap_or("");
        extracted.insert("entity_name".to_string(), json!(name));
        extracted.insert("entity_class".to_string(), json!("venue"));

        if let Some(lat) = element
            .get("lat")
            .or_else(|| element.get("center").and_then(|c| c.get("lat")))
            .and_then(Value::as_f64)
        {
            extracted.insert("latitude".to_string(), json!(lat));
        }
        if let Some(lng) = element
            .get("lon")
            .or_else(|| element.get("center").and_then(|c| c.get("lon")))
            .and_then(Value::as_f64)
        {
            extracted.insert("longitude".to_string(), json!(lng));
        }

        if let Some(street) = tags.get("addr:street").and_then(Value::as_str) {
            let mut address = street.to_string();
            if let Some(housenumber) = tags.get("addr:housenumber").and_then(Value::as_str) {
                address = format!("{housenumber} {address}");
            }
            extracted.insert("street_address".to_string(), json!(address));
        }
        if let Some(city) = tags.get("addr:city").and_then(Value::as_str) {
            extracted.insert("city".to_string(), json!(city));
        }
        if let Some(postcode) = tags.get("addr:postcode").and_then(Value::as_str) {
            extracted.insert("postcode".to_string(), json!(postcode));
        }

        if let Some(phone) = tags
            .get("phone")
            .or_else(|| tags.get("contact:phone"))
            .and_then(Value::as_str)
        {
            if let Some(formatted) = format_phone_uk(phone) {
                extracted.insert("phone".to_string(), json!(formatted));
            }
        }
        if let Some(website) = tags
            .get("website")
            .or_else(|| tags.get("contact:website"))
            .and_then(Value::as_str)
        {
            extracted.insert("website_url".to_string(), json!(website));
        }

        if let Some(sport) = tags.get("sport").and_then(Value::as_str) {
            extracted.insert("sport".to_string(), json!(sport));
        }
        if let Some(leisure) = tags.get("leisure").and_then(Value::as_str) {
            extracted.insert("leisure".to_string(), json!(leisure));
        }

        if let Some(id) = element.get("id") {
            if !id.is_null() {
                extracted.insert("external_id".to_string(), json!(id.to_string()));
            }
        }

        Ok(extracted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_first_element_from_whole_response() {
        let raw = json!({
            "version": 0.6,
            "elements": [
                {
                    "type": "node",
                    "id": 123456,
                    "lat": 55.9533,
                    "lon": -3.1883,
                    "tags": {
                        "name": "Padel Courts Edinburgh",
                        "sport": "padel",
                        "phone": "+44 131 555 0100",
                        "addr:street": "Leith Walk",
                        "addr:housenumber": "10",
                        "addr:city": "Edinburgh"
                    }
                },
                {
                    "type": "node",
                    "id": 789,
                    "lat": 55.0,
                    "lon": -3.0,
                    "tags": { "name": "Unrelated Court" }
                }
            ]
        });
        let extractor = OpenStreetMapExtractor;
        let extracted = extractor.extract(&raw).unwrap();
        assert_eq!(extracted["entity_name"], json!("Padel Courts Edinburgh"));
        assert_eq!(extracted["sport"], json!("padel"));
        assert_eq!(extracted["street_address"], json!("10 Leith Walk"));
        assert_eq!(extracted["phone"], json!("+441315550100"));
    }

    #[test]
    fn handles_empty_elements_array() {
        let raw = json!({ "elements": [] });
        let extractor = OpenStreetMapExtractor;
        let extracted = extractor.extract(&raw).unwrap();
        assert_eq!(extracted["entity_name"], json!(""));
    }
}
