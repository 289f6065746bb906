use serde_json::Value;

/// Curated punctuation-dash and "not-available" sentinels only. Deliberately
/// not "null"/"none"/"unknown"/"tbd" — those appear legitimately in real
/// field values and would cause silent data loss.
const PLACEHOLDER_SENTINELS: &[&str] = &["N/A", "n/a", "NA", "-", "\u{2013}", "\u{2014}"];

/// Whether `value` should be treated as absent: JSON null, an empty or
/// whitespace-only string, or one of the placeholder sentinels above.
/// Zero, `false`, and empty arrays/objects are real values.
pub fn is_missing(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed.is_empty() || PLACEHOLDER_SENTINELS.contains(&trimmed)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn zero_false_and_empty_collections_are_not_missing() {
        assert!(!is_missing(&json!(0)));
        assert!(!is_missing(&json!(false)));
        assert!(!is_missing(&json!([])));
        assert!(!is_missing(&json!({})));
    }

    #[test]
    fn null_and_blank_strings_are_missing() {
        assert!(is_missing(&Value::Null));
        assert!(is_missing(&json!("")));
        assert!(is_missing(&json!("   ")));
    }

    #[test]
    fn sentinels_are_missing() {
        for s in ["N/A", "n/a", "NA", "-", "\u{2013}", "\u{2014}"] {
            assert!(is_missing(&json!(s)), "expected {s:?} to be missing");
        }
    }

    #[test]
    fn real_strings_are_not_missing() {
        assert!(!is_missing(&json!("Game4Padel Edinburgh")));
    }
}
