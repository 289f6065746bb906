use catalogue_common::types::{MatchResult, MatchType};

/// Default similarity threshold for slug matching. "Exact" is a synonym
/// for `ratio == 1.0`, not a separate code path — both the exact and
/// similarity cases are evaluated against the same ratio.
pub const DEFAULT_SLUG_THRESHOLD: f64 = 0.9;

/// Compares two already-normalized slugs. Empty slugs never match, even if
/// both are empty — an empty identity carries no matching signal.
pub fn match_slugs(slug_a: &str, slug_b: &str, threshold: f64) -> MatchResult {
    if slug_a.is_empty() || slug_b.is_empty() {
        return MatchResult::no_match();
    }

    if slug_a == slug_b {
        return MatchResult {
            is_match: true,
            confidence: 1.0,
            match_type: MatchType::Slug,
            matched_on: Some(slug_a.to_string()),
            details: None,
        };
    }

    let ratio = strsim::normalized_levenshtein(slug_a, slug_b);
    if ratio >= threshold {
        MatchResult {
            is_match: true,
            confidence: ratio,
            match_type: MatchType::Slug,
            matched_on: Some(slug_a.to_string()),
            details: None,
        }
    } else {
        MatchResult::no_match()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_has_confidence_one() {
        let result = match_slugs("game4padel-edinburgh", "game4padel-edinburgh", DEFAULT_SLUG_THRESHOLD);
        assert!(result.is_match);
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn near_match_above_threshold_matches() {
        let result = match_slugs("game4padel-edinburgh", "game4padel-edinbrgh", DEFAULT_SLUG_THRESHOLD);
        assert!(result.is_match);
        assert!(result.confidence >= DEFAULT_SLUG_THRESHOLD);
    }

    #[test]
    fn dissimilar_slugs_do_not_match() {
        let result = match_slugs("game4padel-edinburgh", "totally-different-venue", DEFAULT_SLUG_THRESHOLD);
        assert!(!result.is_match);
    }

    #[test]
    fn empty_slugs_never_match() {
        assert!(!match_slugs("", "", DEFAULT_SLUG_THRESHOLD).is_match);
        assert!(!match_slugs("a-slug", "", DEFAULT_SLUG_THRESHOLD).is_match);
    }
}
