use std::collections::HashMap;

use serde_json::{json, Value};

use catalogue_common::error::Result;

use crate::extractor::Extractor;

/// Extractor for a whole Serper search response: `{"organic": [...]}`.
/// Serper is a whole-payload source (see `container::items_for_source`) —
/// the item handed to `extract` is the full response, not one organic
/// entry, so the top-ranked organic result is taken as the primary match
/// for the query that produced this capture. Lower-ranked hits are noise
/// relative to a query built from a specific entity name.
pub struct SerperExtractor;

impl Extractor for SerperExtractor {
    fn source_name(&self) -> &str {
        "serper"
    }

    fn extract(&self, raw_item: &Value) -> Result<HashMap<String, Value>> {
        let top_result = raw_item
            .get("organic")
            .and_then(Value::as_array)
            .and_then(|results| results.first());

        let mut extracted = HashMap::new();

        let title = top_result
            .and_then(|r| r.get("title"))
            .and_then(Value::as_str)
            .unwrap_or("");
        extracted.insert("entity_name".to_string(), json!(title));
        extracted.insert("entity_class".to_string(), json!("venue"));

        if let Some(link) = top_result.and_then(|r| r.get("link")).and_then(Value::as_str) {
            extracted.insert("website_url".to_string(), json!(link));
        }
        if let Some(snippet) = top_result.and_then(|r| r.get("snippet")).and_then(Value::as_str) {
            extracted.insert("snippet".to_string(), json!(snippet));
        }

        let organic_count = raw_item
            .get("organic")
            .and_then(Value::as_array)
            .map(|a| a.len())
            .unwrap_or(0);
        extracted.insert("search_result_count".to_string(), json!(organic_count));

        Ok(extracted)
    }

    fn extract_rich_text(&self, raw_item: &Value) -> Vec<String> {
        raw_item
            .get("organic")
            .and_then(Value::as_array)
            .map(|results| {
                results
                    .iter()
                    .filter_map(|r| r.get("snippet").and_then(Value::as_str))
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_top_organic_result_from_whole_response() {
        let raw = json!({
            "organic": [
                { "title": "Edinburgh Padel Club", "link": "https://edinburghpadel.example", "snippet": "Book a court today" },
                { "title": "Padel Scotland", "link": "https://padelscotland.example", "snippet": "Nationwide padel" }
            ]
        });
        let extractor = SerperExtractor;
        let extracted = extractor.extract(&raw).unwrap();
        assert_eq!(extracted["entity_name"], json!("Edinburgh Padel Club"));
        assert_eq!(extracted["website_url"], json!("https://edinburghpadel.example"));
        assert_eq!(extracted["search_result_count"], json!(2));
        assert_eq!(
            extractor.extract_rich_text(&raw),
            vec!["Book a court today".to_string(), "Nationwide padel".to_string()]
        );
    }

    #[test]
    fn handles_empty_organic_array() {
        let raw = json!({ "organic": [] });
        let extractor = SerperExtractor;
        let extracted = extractor.extract(&raw).unwrap();
        assert_eq!(extracted["entity_name"], json!(""));
    }
}
