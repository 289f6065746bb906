use std::collections::HashMap;

use serde_json::{json, Value};

use catalogue_common::error::Result;

use crate::extractor::Extractor;
use crate::schema::format_phone_uk;

/// Extractor for the Google Places API (New) shape: `displayName.text`,
/// `formattedAddress`, `location.{latitude,longitude}`,
/// `internationalPhoneNumber`, `websiteUri`, `rating`, `userRatingCount`.
/// Grounded on the shape exercised by `test_google_places_connector.py`.
pub struct GooglePlacesExtractor;

impl Extractor for GooglePlacesExtractor {
    fn source_name(&self) -> &str {
        "google_places"
    }

    fn extract(&self, raw_item: &Value) -> Result<HashMap<String, Value>> {
        let mut extracted = HashMap::new();

        let name = raw_item
            .get("displayName")
            .and_then(|d| d.get("text"))
            .and_then(Value::as_str)
            .or_else(|| raw_item.get("name").and_then(Value::as_str))
            .unwrap_or("");
        extracted.insert("entity_name".to_string(), json!(name));
        extracted.insert("entity_class".to_string(), json!("venue"));

        if let Some(address) = raw_item
            .get("formattedAddress")
            .or_else(|| raw_item.get("formatted_address"))
            .and_then(Value::as_str)
        {
            extracted.insert("street_address".to_string(), json!(address));
        }

        if let Some(location) = raw_item.get("location") {
            if let Some(lat) = location.get("latitude").and_then(Value::as_f64) {
                extracted.insert("latitude".to_string(), json!(lat));
            }
            if let Some(lng) = location.get("longitude").and_then(Value::as_f64) {
                extracted.insert("longitude".to_string(), json!(lng));
            }
        } else if let Some(geometry) = raw_item.get("geometry").and_then(|g| g.get("location")) {
            if let Some(lat) = geometry.get("lat").and_then(Value::as_f64) {
                extracted.insert("latitude".to_string(), json!(lat));
            }
            if let Some(lng) = geometry.get("lng").and_then(Value::as_f64) {
                extracted.insert("longitude".to_string(), json!(lng));
            }
        }

        let phone_raw = raw_item
            .get("internationalPhoneNumber")
            .or_else(|| raw_item.get("formatted_phone_number"))
            .and_then(Value::as_str);
        if let Some(phone_raw) = phone_raw {
            if let Some(formatted) = format_phone_uk(phone_raw) {
                extracted.insert("phone".to_string(), json!(formatted));
            }
        }

        if let Some(website) = raw_item
            .get("websiteUri")
            .or_else(|| raw_item.get("website"))
            .and_then(Value::as_str)
        {
            extracted.insert("website_url".to_string(), json!(website));
        }

        if let Some(id) = raw_item.get("id").or_else(|| raw_item.get("place_id")).and_then(Value::as_str) {
            extracted.insert("external_id".to_string(), json!(id));
        }

        if let Some(rating) = raw_item.get("rating").and_then(Value::as_f64) {
            extracted.insert("rating".to_string(), json!(rating));
        }
        if let Some(count) = raw_item.get("userRatingCount").and_then(Value::as_i64) {
            extracted.insert("rating_count".to_string(), json!(count));
        }

        Ok(extracted)
    }

    fn extract_rich_text(&self, raw_item: &Value) -> Vec<String> {
        raw_item
            .get("editorialSummary")
            .and_then(|s| s.get("text"))
            .and_then(Value::as_str)
            .map(|s| vec![s.to_string()])
            .unwrap_or_default()
    }
}
