use std::collections::HashMap;

use catalogue_common::types::{MatchResult, MatchType};

/// Matches on shared external-ID keys, e.g. `{"google_place_id": "..."}`
/// vs `{"google_place_id": "...", "osm_id": "..."}`. Match iff any shared
/// key has an equal normalized value (trim whitespace, lower-case).
pub fn match_external_ids(
    a: &HashMap<String, String>,
    b: &HashMap<String, String>,
) -> MatchResult {
    for (key, value_a) in a {
        if let Some(value_b) = b.get(key) {
            let norm_a = value_a.trim().to_lowercase();
            let norm_b = value_b.trim().to_lowercase();
            if !norm_a.is_empty() && norm_a == norm_b {
                return MatchResult {
                    is_match: true,
                    confidence: 1.0,
                    match_type: MatchType::ExternalId,
                    matched_on: Some(key.clone()),
                    details: None,
                };
            }
        }
    }
    MatchResult::no_match()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn matches_on_shared_key_with_equal_normalized_value() {
        let a = map(&[("google_place_id", "  ABC123  ")]);
        let b = map(&[("google_place_id", "abc123"), ("osm_id", "999")]);
        let result = match_external_ids(&a, &b);
        assert!(result.is_match);
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.match_type, MatchType::ExternalId);
        assert_eq!(result.matched_on.as_deref(), Some("google_place_id"));
    }

    #[test]
    fn no_match_when_no_shared_key_agrees() {
        let a = map(&[("google_place_id", "abc123")]);
        let b = map(&[("google_place_id", "xyz999")]);
        let result = match_external_ids(&a, &b);
        assert!(!result.is_match);
        assert_eq!(result.match_type, MatchType::None);
    }

    #[test]
    fn empty_maps_never_match() {
        let result = match_external_ids(&HashMap::new(), &HashMap::new());
        assert!(!result.is_match);
    }
}
