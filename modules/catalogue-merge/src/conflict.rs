use catalogue_common::trust::TrustHierarchy;
use serde::Serialize;
use serde_json::Value;

use crate::field_merger::FieldValue;

/// A reportable disagreement between sources for one field: two or more
/// non-missing values, decided by a trust gap too small to be decisive.
#[derive(Debug, Clone, Serialize)]
pub struct MergeConflict {
    pub field_name: String,
    pub conflicting_values: Vec<ConflictingValue>,
    pub winner_source: String,
    pub winner_value: Value,
    pub trust_difference: i32,
    pub severity: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConflictingValue {
    pub value: Value,
    pub source: String,
    pub trust: i32,
    pub confidence: f64,
}

pub struct ConflictDetector<'a> {
    trust: &'a TrustHierarchy,
    trust_difference_threshold: i32,
}

impl<'a> ConflictDetector<'a> {
    pub fn new(trust: &'a TrustHierarchy) -> Self {
        Self {
            trust,
            trust_difference_threshold: 15,
        }
    }

    pub fn with_threshold(trust: &'a TrustHierarchy, trust_difference_threshold: i32) -> Self {
        Self {
            trust,
            trust_difference_threshold,
        }
    }

    /// Detect a reportable conflict for one field's contributing values.
    /// Requires at least two non-null values that differ (by stringified
    /// comparison) and a trust gap between the top two sources smaller
    /// than the configured threshold — a decisive gap means the hierarchy
    /// already settled it, which isn't a conflict worth surfacing.
    pub fn detect_conflict(&self, field_name: &str, field_values: &[FieldValue]) -> Option<MergeConflict> {
        if field_values.len() < 2 {
            return None;
        }

        let non_null: Vec<&FieldValue> = field_values.iter().filter(|fv| !fv.value.is_null()).collect();
        if non_null.len() < 2 {
            return None;
        }

        let unique_values: std::collections::HashSet<String> =
            non_null.iter().map(|fv| fv.value.to_string()).collect();
        if unique_values.len() == 1 {
            return None;
        }

        let mut sorted = non_null;
        sorted.sort_by(|a, b| {
            self.trust
                .trust(&b.source)
                .cmp(&self.trust.trust(&a.source))
                .then_with(|| {
                    b.confidence
                        .partial_cmp(&a.confidence)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
        });

        let winner = sorted[0];
        let runner_up = sorted[1];
        let winner_trust = self.trust.trust(&winner.source);
        let runner_up_trust = self.trust.trust(&runner_up.source);
        let trust_difference = winner_trust - runner_up_trust;

        if trust_difference >= self.trust_difference_threshold {
            return None;
        }

        let severity = (1.0 - (trust_difference as f64 / self.trust_difference_threshold as f64))
            .clamp(0.0, 1.0);

        let conflicting_values = sorted
            .iter()
            .map(|fv| ConflictingValue {
                value: fv.value.clone(),
                source: fv.source.clone(),
                trust: self.trust.trust(&fv.source),
                confidence: fv.confidence,
            })
            .collect();

        Some(MergeConflict {
            field_name: field_name.to_string(),
            conflicting_values,
            winner_source: winner.source.clone(),
            winner_value: winner.value.clone(),
            trust_difference,
            severity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn trust(pairs: &[(&str, i32)]) -> TrustHierarchy {
        let mut levels = HashMap::new();
        for (k, v) in pairs {
            levels.insert(k.to_string(), *v);
        }
        TrustHierarchy::new(levels, 10)
    }

    #[test]
    fn fewer_than_two_values_has_no_conflict() {
        let t = trust(&[("a", 80)]);
        let detector = ConflictDetector::new(&t);
        let values = vec![FieldValue { value: json!("x"), source: "a".into(), confidence: 0.8 }];
        assert!(detector.detect_conflict("phone", &values).is_none());
    }

    #[test]
    fn identical_values_have_no_conflict() {
        let t = trust(&[("a", 80), ("b", 40)]);
        let detector = ConflictDetector::new(&t);
        let values = vec![
            FieldValue { value: json!("x"), source: "a".into(), confidence: 0.8 },
            FieldValue { value: json!("x"), source: "b".into(), confidence: 0.8 },
        ];
        assert!(detector.detect_conflict("phone", &values).is_none());
    }

    #[test]
    fn large_trust_gap_is_not_reported() {
        let t = trust(&[("a", 90), ("b", 40)]);
        let detector = ConflictDetector::new(&t);
        let values = vec![
            FieldValue { value: json!("x"), source: "a".into(), confidence: 0.8 },
            FieldValue { value: json!("y"), source: "b".into(), confidence: 0.8 },
        ];
        assert!(detector.detect_conflict("phone", &values).is_none());
    }

    #[test]
    fn near_trust_dispute_is_reported_with_clamped_severity() {
        let t = trust(&[("a", 55), ("b", 50)]);
        let detector = ConflictDetector::new(&t);
        let values = vec![
            FieldValue { value: json!("x"), source: "a".into(), confidence: 0.8 },
            FieldValue { value: json!("y"), source: "b".into(), confidence: 0.8 },
        ];
        let conflict = detector.detect_conflict("phone", &values).unwrap();
        assert_eq!(conflict.winner_source, "a");
        assert_eq!(conflict.trust_difference, 5);
        assert!(conflict.severity > 0.0 && conflict.severity <= 1.0);
    }

    #[test]
    fn zero_trust_gap_has_maximum_severity() {
        let t = trust(&[("a", 50), ("b", 50)]);
        let detector = ConflictDetector::new(&t);
        let values = vec![
            FieldValue { value: json!("x"), source: "a".into(), confidence: 0.9 },
            FieldValue { value: json!("y"), source: "b".into(), confidence: 0.8 },
        ];
        let conflict = detector.detect_conflict("phone", &values).unwrap();
        assert_eq!(conflict.severity, 1.0);
    }
}
