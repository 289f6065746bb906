use std::collections::HashMap;

use serde_json::{json, Value};

use catalogue_common::error::Result;

use crate::extractor::Extractor;
use crate::schema::format_postcode_uk;

/// Extractor for a single Edinburgh Council ArcGIS GeoJSON `Feature`:
/// `geometry.coordinates` is `[lng, lat]`; civic fields (`name`, `address`,
/// `postcode`, `facility_type`, `ward`) live under `properties`.
pub struct EdinburghCouncilExtractor;

impl Extractor for EdinburghCouncilExtractor {
    fn source_name(&self) -> &str {
        "edinburgh_council"
    }

    fn extract(&self, raw_item: &Value) -> Result<HashMap<String, Value>> {
        let mut extracted = HashMap::new();
        let properties = raw_item.get("properties").cloned().unwrap_or(Value::Null);

        let name = properties.get("name").and_then(Value::as_str).unwrap_or("");
        extracted.insert("entity_name".to_string(), json!(name));
        extracted.insert("entity_class".to_string(), json!("venue"));

        if let Some(address) = properties.get("address").and_then(Value::as_str) {
            extracted.insert("street_address".to_string(), json!(address));
        }
        if let Some(postcode) = properties.get("postcode").and_then(Value::as_str) {
            if let Some(formatted) = format_postcode_uk(postcode) {
                extracted.insert("postcode".to_string(), json!(formatted));
            }
        }

        if let Some(coords) = raw_item
            .get("geometry")
            .and_then(|g| g.get("coordinates"))
            .and_then(Value::as_array)
        {
            if let [lng, lat, ..] = coords.as_slice() {
                if let Some(lng) = lng.as_f64() {
                    extracted.insert("longitude".to_string(), json!(lng));
                }
                if let Some(lat) = lat.as_f64() {
                    extracted.insert("latitude".to_string(), json!(lat));
                }
            }
        }

        if let Some(facility_type) = properties.get("facility_type").and_then(Value::as_str) {
            extracted.insert("facility_type".to_string(), json!(facility_type));
        }
        if let Some(ward) = properties.get("ward").and_then(Value::as_str) {
            extracted.insert("ward".to_string(), json!(ward));
        }
        if let Some(object_id) = properties.get("OBJECTID") {
            if !object_id.is_null() {
                extracted.insert("external_id".to_string(), json!(object_id.to_string()));
            }
        }

        Ok(extracted)
    }
}
