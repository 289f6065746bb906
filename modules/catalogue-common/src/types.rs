use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Discriminator for how two records were found to refer to the same
/// entity, or that they weren't.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    ExternalId,
    Slug,
    Fuzzy,
    None,
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MatchType::ExternalId => "external_id",
            MatchType::Slug => "slug",
            MatchType::Fuzzy => "fuzzy",
            MatchType::None => "none",
        };
        f.write_str(s)
    }
}

impl FromStr for MatchType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "external_id" => Ok(MatchType::ExternalId),
            "slug" => Ok(MatchType::Slug),
            "fuzzy" => Ok(MatchType::Fuzzy),
            "none" => Ok(MatchType::None),
            other => Err(format!("unknown match type: {other}")),
        }
    }
}

/// Outcome of running one matcher (external-ID, slug, or fuzzy) over a pair
/// of records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub is_match: bool,
    pub confidence: f64,
    pub match_type: MatchType,
    pub matched_on: Option<String>,
    pub details: Option<Value>,
}

impl MatchResult {
    pub fn no_match() -> Self {
        Self {
            is_match: false,
            confidence: 0.0,
            match_type: MatchType::None,
            matched_on: None,
            details: None,
        }
    }
}

/// One source's contribution to a field being merged: the value itself,
/// which source supplied it, that source's per-record confidence (usually
/// 1.0 for directly-observed fields), and the full set of sources that
/// contributed to the record the value came from (used for provenance
/// display, not for tie-breaking).
#[derive(Debug, Clone)]
pub struct FieldValue {
    pub value: Value,
    pub source: String,
    pub confidence: f64,
    pub source_id: String,
}

/// A flagged disagreement between sources for one field, surfaced when the
/// trust hierarchy did not decisively resolve it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeConflict {
    pub field_name: String,
    pub conflicting_values: Vec<Value>,
    pub winner_source: String,
    pub winner_value: Value,
    pub trust_difference: i32,
    pub severity: f64,
}

/// A single source's flat view of one entity, keyed by schema-primitive
/// field name, as consumed by the Entity Merger. `source_id` disambiguates
/// multiple records from the same source (used as the final tie-break).
#[derive(Debug, Clone)]
pub struct SourceRecord {
    pub source: String,
    pub source_id: String,
    pub record_id: String,
    pub entity_class: Option<String>,
    pub attributes: HashMap<String, Value>,
    pub discovered_attributes: HashMap<String, Value>,
    pub external_ids: HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr as _;

    #[test]
    fn match_type_round_trips_through_display_and_fromstr() {
        for mt in [
            MatchType::ExternalId,
            MatchType::Slug,
            MatchType::Fuzzy,
            MatchType::None,
        ] {
            let s = mt.to_string();
            assert_eq!(MatchType::from_str(&s).unwrap(), mt);
        }
    }
}
