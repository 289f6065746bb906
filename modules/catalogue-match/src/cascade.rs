use std::collections::HashMap;
use std::collections::HashSet;

use catalogue_common::types::{MatchResult, MatchType};

use crate::external_id::match_external_ids;
use crate::fuzzy::{match_fuzzy, FuzzyCandidate, DEFAULT_MAX_DISTANCE_METERS, DEFAULT_THRESHOLD};
use crate::slug_matcher::{match_slugs, DEFAULT_SLUG_THRESHOLD};

/// A candidate for deduplication, carrying everything the cascade needs
/// from any of its three stages. `id` disambiguates members within a
/// `find_duplicates` group and is never itself compared.
#[derive(Debug, Clone)]
pub struct DedupeCandidate {
    pub id: String,
    pub external_ids: HashMap<String, String>,
    pub slug: String,
    pub entity_name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Tunable knobs for the cascade, collected so callers don't have to thread
/// five separate parameters through `find_duplicates`.
#[derive(Debug, Clone)]
pub struct CascadeConfig {
    pub slug_threshold: f64,
    pub fuzzy_threshold: f64,
    pub max_distance_meters: f64,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            slug_threshold: DEFAULT_SLUG_THRESHOLD,
            fuzzy_threshold: DEFAULT_THRESHOLD,
            max_distance_meters: DEFAULT_MAX_DISTANCE_METERS,
        }
    }
}

/// Runs the matcher cascade external-ID → slug → fuzzy, returning the first
/// positive match. A no-match result if none of the three find agreement.
pub fn find_match(a: &DedupeCandidate, b: &DedupeCandidate, config: &CascadeConfig) -> MatchResult {
    let result = match_external_ids(&a.external_ids, &b.external_ids);
    if result.is_match {
        return result;
    }

    let result = match_slugs(&a.slug, &b.slug, config.slug_threshold);
    if result.is_match {
        return result;
    }

    if let (Some(lat_a), Some(lng_a), Some(lat_b), Some(lng_b)) =
        (a.latitude, a.longitude, b.latitude, b.longitude)
    {
        let candidate_a = FuzzyCandidate {
            entity_name: &a.entity_name,
            latitude: lat_a,
            longitude: lng_a,
        };
        let candidate_b = FuzzyCandidate {
            entity_name: &b.entity_name,
            latitude: lat_b,
            longitude: lng_b,
        };
        let result = match_fuzzy(
            &candidate_a,
            &candidate_b,
            config.max_distance_meters,
            config.fuzzy_threshold,
        );
        if result.is_match {
            return result;
        }
    }

    MatchResult {
        match_type: MatchType::None,
        ..MatchResult::no_match()
    }
}

/// Groups candidates into equivalence classes by pairwise cascade matching.
/// O(n^2) over the input — adequate for per-run batch sizes; an
/// external-ID/slug pre-bucket is a valid optimization for larger inputs but
/// is not required by this contract. Only returns groups with 2+ members;
/// singletons simply aren't reported (callers treat them as their own
/// group).
pub fn find_duplicates<'a>(
    candidates: &'a [DedupeCandidate],
    config: &CascadeConfig,
) -> Vec<Vec<&'a DedupeCandidate>> {
    if candidates.len() < 2 {
        return Vec::new();
    }

    let mut grouped: HashSet<&str> = HashSet::new();
    let mut groups = Vec::new();

    for (i, candidate_a) in candidates.iter().enumerate() {
        if grouped.contains(candidate_a.id.as_str()) {
            continue;
        }

        let mut group = vec![candidate_a];
        grouped.insert(candidate_a.id.as_str());

        for candidate_b in &candidates[i + 1..] {
            if grouped.contains(candidate_b.id.as_str()) {
                continue;
            }
            if find_match(candidate_a, candidate_b, config).is_match {
                group.push(candidate_b);
                grouped.insert(candidate_b.id.as_str());
            }
        }

        if group.len() >= 2 {
            groups.push(group);
        }
    }

    groups
}
