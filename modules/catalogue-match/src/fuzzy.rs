use catalogue_common::types::{MatchResult, MatchType};

use crate::haversine::haversine_distance_m;

pub const DEFAULT_MAX_DISTANCE_METERS: f64 = 200.0;
pub const DEFAULT_THRESHOLD: f64 = 0.85;
pub const NAME_WEIGHT: f64 = 0.7;
pub const LOCATION_WEIGHT: f64 = 0.3;
pub const DECAY_CONSTANT: f64 = 50.0;

/// The subset of a record the fuzzy matcher needs: a name and a position.
#[derive(Debug, Clone)]
pub struct FuzzyCandidate<'a> {
    pub entity_name: &'a str,
    pub latitude: f64,
    pub longitude: f64,
}

/// Lower-case, split on whitespace, sort tokens, rejoin — makes word order
/// irrelevant to the similarity score ("Padel Game4" ~ "Game4 Padel").
fn token_sort_key(name: &str) -> String {
    let mut tokens: Vec<&str> = name.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ").to_lowercase()
}

fn name_similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(&token_sort_key(a), &token_sort_key(b))
}

/// Combines name similarity (token-sort-insensitive) and geo proximity
/// (exponential decay) into one confidence score. Rejects immediately if
/// the two points are further apart than `max_distance_meters`.
pub fn match_fuzzy(
    a: &FuzzyCandidate,
    b: &FuzzyCandidate,
    max_distance_meters: f64,
    threshold: f64,
) -> MatchResult {
    let distance_m = haversine_distance_m(a.latitude, a.longitude, b.latitude, b.longitude);
    if distance_m > max_distance_meters {
        return MatchResult::no_match();
    }

    let name_score = name_similarity(a.entity_name, b.entity_name);
    let location_score = (-distance_m / DECAY_CONSTANT).exp();
    let combined = NAME_WEIGHT * name_score + LOCATION_WEIGHT * location_score;

    if combined >= threshold {
        MatchResult {
            is_match: true,
            confidence: combined,
            match_type: MatchType::Fuzzy,
            matched_on: Some("name+location".to_string()),
            details: Some(serde_json::json!({
                "name_score": name_score,
                "location_score": location_score,
                "distance_m": distance_m,
            })),
        }
    } else {
        MatchResult::no_match()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_coordinates_and_similar_name_match() {
        let a = FuzzyCandidate {
            entity_name: "Game4Padel Edinburgh",
            latitude: 55.9533,
            longitude: -3.1883,
        };
        let b = FuzzyCandidate {
            entity_name: "Game 4 Padel Edinburgh",
            latitude: 55.9534,
            longitude: -3.1884,
        };
        let result = match_fuzzy(&a, &b, DEFAULT_MAX_DISTANCE_METERS, DEFAULT_THRESHOLD);
        assert!(result.is_match, "expected a match, got {result:?}");
        assert!(result.confidence >= DEFAULT_THRESHOLD);
        assert_eq!(result.match_type, MatchType::Fuzzy);
    }

    #[test]
    fn far_away_coordinates_never_match_regardless_of_name() {
        let a = FuzzyCandidate {
            entity_name: "Game4Padel Edinburgh",
            latitude: 55.9533,
            longitude: -3.1883,
        };
        let b = FuzzyCandidate {
            entity_name: "Game4Padel Edinburgh",
            latitude: 55.8642,
            longitude: -4.2518,
        };
        let result = match_fuzzy(&a, &b, DEFAULT_MAX_DISTANCE_METERS, DEFAULT_THRESHOLD);
        assert!(!result.is_match);
    }

    #[test]
    fn token_sort_makes_word_order_irrelevant() {
        assert_eq!(
            name_similarity("Padel Club Edinburgh", "Edinburgh Padel Club"),
            1.0
        );
    }
}
