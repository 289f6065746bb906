use serde_json::Value;

/// Select the sub-items a source's extractor operates on from a raw
/// capture payload, keyed by source name. One canonical mapping is used by
/// both the Extraction Runner and the Quarantine retry handler so the two
/// never disagree about what "an item" means for a given source.
///
/// - Google Places-style responses: the `places` array.
/// - GeoJSON feed responses (Edinburgh Council, sportscotland): the
///   `features` array.
/// - OpenChargeMap: the payload itself is already an array of stations.
/// - Whole-payload sources (a web-search wrapper like Serper, an
///   OSM-style Overpass response): the entire payload as a single item —
///   these extractors interpret their own internal structure.
pub fn items_for_source(source: &str, payload: &Value) -> Vec<Value> {
    match source {
        "google_places" => payload
            .get("places")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
        "open_charge_map" => payload.as_array().cloned().unwrap_or_default(),
        "sport_scotland" | "edinburgh_council" => payload
            .get("features")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
        "serper" | "openstreetmap" => {
            if payload.is_null() {
                Vec::new()
            } else {
                vec![payload.clone()]
            }
        }
        _ => Vec::new(),
    }
}

/// The single item (if any) a Single-mode extraction run should persist as
/// the record's `ExtractedRecord`, per the one-row-per-raw-capture
/// invariant: the first container item for sources that can return
/// several candidates, since a capture is always the result of a query
/// built from one specific entity.
pub fn primary_item(source: &str, payload: &Value) -> Option<Value> {
    items_for_source(source, payload).into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn selects_places_array_for_google_places() {
        let payload = json!({ "places": [{"id": "a"}, {"id": "b"}] });
        let items = items_for_source("google_places", &payload);
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn selects_features_array_for_geojson_sources() {
        let payload = json!({ "features": [{"id": 1}] });
        assert_eq!(items_for_source("sport_scotland", &payload).len(), 1);
        assert_eq!(items_for_source("edinburgh_council", &payload).len(), 1);
    }

    #[test]
    fn treats_open_charge_map_payload_as_array() {
        let payload = json!([{"UUID": "x"}, {"UUID": "y"}]);
        assert_eq!(items_for_source("open_charge_map", &payload).len(), 2);
    }

    #[test]
    fn wraps_whole_payload_for_serper_and_osm() {
        let payload = json!({ "organic": [] });
        let items = items_for_source("serper", &payload);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0], payload);
    }

    #[test]
    fn unknown_source_yields_no_items() {
        assert_eq!(items_for_source("unknown", &json!({})).len(), 0);
    }

    #[test]
    fn primary_item_returns_first_google_places_result() {
        let payload = json!({ "places": [{"id": "a"}, {"id": "b"}] });
        assert_eq!(primary_item("google_places", &payload), Some(json!({"id": "a"})));
    }
}
