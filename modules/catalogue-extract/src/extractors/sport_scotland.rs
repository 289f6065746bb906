use std::collections::HashMap;

use serde_json::{json, Value};

use catalogue_common::error::Result;

use crate::extractor::Extractor;
use crate::schema::format_postcode_uk;

/// Extractor for a single sportscotland ArcGIS GeoJSON `Feature`:
/// `geometry.coordinates` is `[lng, lat]`; sport-facility fields
/// (`facility_name`, `sport_type`, `surface`, `ownership`, `postcode`)
/// live under `properties`.
pub struct SportScotlandExtractor;

impl Extractor for SportScotlandExtractor {
    fn source_name(&self) -> &str {
        "sport_scotland"
    }

    fn extract(&self, raw_item: &Value) -> Result<HashMap<String, Value>> {
        let mut extracted = HashMap::new();
        let properties = raw_item.get("properties").cloned().unwrap_or(Value::Null);

        let name = properties
            .get("facility_name")
            .and_then(Value::as_str)
            .unwrap_or("");
        extracted.insert("entity_name".to_string(), json!(name));
        extracted.insert("entity_class".to_string(), json!("venue"));

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

        if let Some(sport_type) = properties.get("sport_type").and_then(Value::as_str) {
            extracted.insert("sport_type".to_string(), json!(sport_type));
        }
        if let Some(surface) = properties.get("surface").and_then(Value::as_str) {
            extracted.insert("surface".to_string(), json!(surface));
        }
        if let Some(ownership) = properties.get("ownership").and_then(Value::as_str) {
            extracted.insert("ownership".to_string(), json!(ownership));
        }
        if let Some(id) = raw_item.get("id").and_then(Value::as_str) {
            extracted.insert("external_id".to_string(), json!(id));
        }

        Ok(extracted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_pitch_feature() {
        let raw = json!({
            "type": "Feature",
            "id": "pitches.1",
            "geometry": { "type": "Point", "coordinates": [-3.1883, 55.9533] },
            "properties": {
                "facility_name": "Murrayfield Stadium",
                "facility_type": "Pitch",
                "sport_type": "Rugby",
                "surface": "Grass",
                "ownership": "Scottish Rugby Union",
                "postcode": "eh12 5pj"
            }
        });
        let extractor = SportScotlandExtractor;
        let extracted = extractor.extract(&raw).unwrap();
        assert_eq!(extracted["entity_name"], json!("Murrayfield Stadium"));
        assert_eq!(extracted["sport_type"], json!("Rugby"));
        assert_eq!(extracted["postcode"], json!("EH12 5PJ"));
        assert_eq!(extracted["external_id"], json!("pitches.1"));
    }
}
