use std::collections::{BTreeMap, BTreeSet};

use catalogue_common::trust::TrustHierarchy;
use serde_json::{Map, Value};

use crate::field_merger::{FieldMerger, FieldValue};
use crate::missingness::is_missing;

/// One source's contribution to an entity, in the shape the Extraction
/// Runner persists: scalar `attributes`, `discovered_attributes`,
/// `external_ids`, tagged with the source name and a per-record confidence.
#[derive(Debug, Clone)]
pub struct SourceRecord {
    pub record_id: String,
    pub source: String,
    pub entity_class: Option<String>,
    pub attributes: Map<String, Value>,
    pub discovered_attributes: Map<String, Value>,
    pub external_ids: Map<String, Value>,
    pub confidence: f64,
}

/// Output of merging one or more `SourceRecord`s for the same entity.
/// `source_info`/`field_confidence` are always present mappings, even for
/// a single-source entity, so single- and multi-source outputs share one
/// structural shape.
#[derive(Debug, Clone)]
pub struct MergedEntity {
    pub attributes: Map<String, Value>,
    pub entity_class: Option<String>,
    pub discovered_attributes: Map<String, Value>,
    pub external_ids: Map<String, Value>,
    pub source_info: BTreeMap<String, String>,
    pub field_confidence: BTreeMap<String, f64>,
    pub sources: Vec<String>,
    pub source_count: usize,
}

pub struct EntityMerger<'a> {
    trust: &'a TrustHierarchy,
    field_merger: FieldMerger<'a>,
}

impl<'a> EntityMerger<'a> {
    pub fn new(trust: &'a TrustHierarchy) -> Self {
        Self {
            trust,
            field_merger: FieldMerger::new(trust),
        }
    }

    /// Merge a set of `SourceRecord`s for one entity. Returns `None` for an
    /// empty input; a single record short-circuits to formatting without
    /// invoking any merge strategy.
    pub fn merge_entities(&self, records: &[SourceRecord]) -> Option<MergedEntity> {
        if records.is_empty() {
            return None;
        }
        if records.len() == 1 {
            return Some(self.format_single(&records[0]));
        }

        // Pin behaviour against DB query-plan variation: deterministic
        // sort by (trust desc, source asc, record_id asc) before merging.
        let mut sorted: Vec<&SourceRecord> = records.iter().collect();
        sorted.sort_by(|a, b| {
            self.trust
                .trust(&b.source)
                .cmp(&self.trust.trust(&a.source))
                .then_with(|| a.source.cmp(&b.source))
                .then_with(|| a.record_id.cmp(&b.record_id))
        });

        let mut all_fields: BTreeSet<String> = BTreeSet::new();
        for record in &sorted {
            all_fields.extend(record.attributes.keys().cloned());
        }

        let mut merged_attributes = Map::new();
        let mut source_info = BTreeMap::new();
        let mut field_confidence = BTreeMap::new();

        for field_name in &all_fields {
            let field_values: Vec<FieldValue> = sorted
                .iter()
                .filter_map(|record| {
                    record.attributes.get(field_name).map(|value| FieldValue {
                        value: value.clone(),
                        source: record.source.clone(),
                        confidence: record.confidence,
                    })
                })
                .collect();
            if field_values.is_empty() {
                continue;
            }

            let merged = self.field_merger.merge_field(field_name, &field_values);
            if merged.value.is_null() {
                continue;
            }
            merged_attributes.insert(field_name.clone(), merged.value.clone());
            if let Some(source) = &merged.source {
                source_info.insert(field_name.clone(), source.clone());
            }
            let agreement = agreement_ratio(&field_values, &merged.value);
            field_confidence.insert(field_name.clone(), agreement);
        }

        let discovered = self.merge_discovered(&sorted);
        let external_ids = self.merge_external_ids(&sorted);
        let entity_class = self.merge_entity_class(&sorted);

        Some(MergedEntity {
            attributes: merged_attributes,
            entity_class,
            discovered_attributes: discovered,
            external_ids,
            source_info,
            field_confidence,
            sources: sorted.iter().map(|r| r.source.clone()).collect(),
            source_count: sorted.len(),
        })
    }

    fn format_single(&self, record: &SourceRecord) -> MergedEntity {
        let source_info = record
            .attributes
            .keys()
            .map(|k| (k.clone(), record.source.clone()))
            .collect();
        let field_confidence = record.attributes.keys().map(|k| (k.clone(), 1.0)).collect();

        MergedEntity {
            attributes: record.attributes.clone(),
            entity_class: record.entity_class.clone(),
            discovered_attributes: record.discovered_attributes.clone(),
            external_ids: record.external_ids.clone(),
            source_info,
            field_confidence,
            sources: vec![record.source.clone()],
            source_count: 1,
        }
    }

    fn merge_discovered(&self, records: &[&SourceRecord]) -> Map<String, Value> {
        let mut all_fields: BTreeSet<String> = BTreeSet::new();
        for record in records {
            all_fields.extend(record.discovered_attributes.keys().cloned());
        }

        let mut merged = Map::new();
        for field_name in all_fields {
            let field_values: Vec<FieldValue> = records
                .iter()
                .filter_map(|record| {
                    record
                        .discovered_attributes
                        .get(&field_name)
                        .map(|value| FieldValue {
                            value: value.clone(),
                            source: record.source.clone(),
                            confidence: record.confidence,
                        })
                })
                .collect();
            if field_values.is_empty() {
                continue;
            }
            let result = self.field_merger.merge_field(&field_name, &field_values);
            if !result.value.is_null() {
                merged.insert(field_name, result.value);
            }
        }
        merged
    }

    /// Each source can contribute its own external ID; later (lower-trust,
    /// per the pre-sort) sources never overwrite an earlier key collision
    /// because insertion is first-write-wins over the trust-sorted list.
    fn merge_external_ids(&self, records: &[&SourceRecord]) -> Map<String, Value> {
        let mut merged = Map::new();
        for record in records {
            for (key, value) in &record.external_ids {
                merged.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }
        merged
    }

    /// `entity_class` winner: missingness filter -> trust desc -> source asc.
    fn merge_entity_class(&self, records: &[&SourceRecord]) -> Option<String> {
        let candidates: Vec<&SourceRecord> = records
            .iter()
            .copied()
            .filter(|r| {
                r.entity_class
                    .as_ref()
                    .map(|c| !is_missing(&Value::String(c.clone())))
                    .unwrap_or(false)
            })
            .collect();

        candidates
            .into_iter()
            .min_by(|a, b| {
                self.trust
                    .trust(&b.source)
                    .cmp(&self.trust.trust(&a.source))
                    .then_with(|| a.source.cmp(&b.source))
            })
            .and_then(|r| r.entity_class.clone())
    }
}

/// Fraction of contributing sources whose raw value equals the winner.
fn agreement_ratio(field_values: &[FieldValue], winning_value: &Value) -> f64 {
    if field_values.is_empty() {
        return 0.0;
    }
    let agreements = field_values.iter().filter(|fv| &fv.value == winning_value).count();
    agreements as f64 / field_values.len() as f64
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

    fn record(id: &str, source: &str, attrs: Value) -> SourceRecord {
        SourceRecord {
            record_id: id.to_string(),
            source: source.to_string(),
            entity_class: Some("venue".to_string()),
            attributes: attrs.as_object().unwrap().clone(),
            discovered_attributes: Map::new(),
            external_ids: Map::new(),
            confidence: 0.8,
        }
    }

    #[test]
    fn empty_input_yields_none() {
        let t = trust(&[]);
        let merger = EntityMerger::new(&t);
        assert!(merger.merge_entities(&[]).is_none());
    }

    #[test]
    fn single_record_formats_without_merge_strategy() {
        let t = trust(&[("a", 80)]);
        let merger = EntityMerger::new(&t);
        let records = vec![record("r1", "a", json!({"entity_name": "Foo"}))];
        let merged = merger.merge_entities(&records).unwrap();
        assert_eq!(merged.attributes.get("entity_name"), Some(&json!("Foo")));
        assert_eq!(merged.source_info.get("entity_name"), Some(&"a".to_string()));
        assert_eq!(merged.field_confidence.get("entity_name"), Some(&1.0));
        assert_eq!(merged.source_count, 1);
    }

    #[test]
    fn multi_source_trust_decided_conflict() {
        let t = trust(&[("trust90", 90), ("trust70", 70), ("trust50", 50)]);
        let merger = EntityMerger::new(&t);
        let records = vec![
            record("r1", "trust90", json!({"entity_name": "Venue", "phone": "+441111111111"})),
            record("r2", "trust70", json!({"entity_name": "Venue", "phone": "+442222222222"})),
            record("r3", "trust50", json!({"entity_name": "Venue", "phone": "+443333333333"})),
        ];
        let merged = merger.merge_entities(&records).unwrap();
        assert_eq!(merged.attributes.get("phone"), Some(&json!("+441111111111")));
        assert_eq!(merged.source_info.get("phone"), Some(&"trust90".to_string()));
        assert!((merged.field_confidence["phone"] - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn external_ids_union_first_write_wins_by_trust_order() {
        let t = trust(&[("a", 80), ("b", 40)]);
        let merger = EntityMerger::new(&t);
        let mut r1 = record("r1", "a", json!({"entity_name": "Foo"}));
        r1.external_ids.insert("a".to_string(), json!("id-a"));
        let mut r2 = record("r2", "b", json!({"entity_name": "Foo"}));
        r2.external_ids.insert("b".to_string(), json!("id-b"));
        let merged = merger.merge_entities(&[r1, r2]).unwrap();
        assert_eq!(merged.external_ids.get("a"), Some(&json!("id-a")));
        assert_eq!(merged.external_ids.get("b"), Some(&json!("id-b")));
    }

    #[test]
    fn permutation_stability_across_three_sources() {
        let t = trust(&[("trust90", 90), ("trust70", 70), ("trust50", 50)]);
        let merger = EntityMerger::new(&t);
        let r1 = record("r1", "trust90", json!({"entity_name": "Venue", "phone": "+441111111111"}));
        let r2 = record("r2", "trust70", json!({"summary": "A description"}));
        let r3 = record("r3", "trust50", json!({"entity_name": "Venue", "city": "Edinburgh"}));

        let base = merger.merge_entities(&[r1.clone(), r2.clone(), r3.clone()]).unwrap();
        let permuted = merger.merge_entities(&[r3, r1, r2]).unwrap();

        assert_eq!(base.attributes, permuted.attributes);
        assert_eq!(base.source_info, permuted.source_info);
        assert_eq!(base.field_confidence, permuted.field_confidence);
    }
}
