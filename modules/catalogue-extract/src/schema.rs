use once_cell::sync::Lazy;
use regex::Regex;

/// Schema-primitive field names recognized by `split_attributes`. Any
/// extracted key not in this set is a discovered attribute. Kept in one
/// place so the boundary between `attributes` and `discovered_attributes`
/// is identical across every extractor, rather than each source deciding
/// for itself which fields "belong".
const SCHEMA_FIELDS: &[&str] = &[
    "entity_name",
    "entity_class",
    "summary",
    "canonical_activities",
    "canonical_roles",
    "canonical_place_types",
    "canonical_access",
    "latitude",
    "longitude",
    "street_address",
    "city",
    "postcode",
    "country",
    "phone",
    "email",
    "website_url",
    "opening_hours",
    "modules",
];

pub fn is_field_in_schema(field: &str) -> bool {
    SCHEMA_FIELDS.contains(&field)
}

static UK_POSTCODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^([A-Z]{1,2}[0-9][A-Z0-9]?)\s*([0-9][A-Z]{2})$").expect("valid regex")
});

/// Normalize a UK postcode to its canonical "OUTWARD INWARD" form
/// (uppercase, single space, e.g. "eh1 1aa" -> "EH1 1AA"). Returns `None`
/// for input that doesn't match the outward/inward shape rather than
/// guessing.
pub fn format_postcode_uk(raw: &str) -> Option<String> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.len() < 5 || compact.len() > 7 {
        return None;
    }
    let caps = UK_POSTCODE.captures(&compact)?;
    Some(format!(
        "{} {}",
        caps[1].to_uppercase(),
        caps[2].to_uppercase()
    ))
}

static NON_DIGIT_PLUS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9+]").expect("valid regex"));

/// Normalize a UK phone number to E.164 (`+44...`). Accepts national
/// (`0...`), already-international (`+44...` or `0044...`), and loosely
/// punctuated input (spaces, hyphens, parentheses). Returns `None` when the
/// cleaned digits don't look like a UK number.
pub fn format_phone_uk(raw: &str) -> Option<String> {
    let cleaned = NON_DIGIT_PLUS.replace_all(raw, "").to_string();

    let digits_only: String = cleaned.chars().filter(|c| c.is_ascii_digit()).collect();

    let national = if let Some(rest) = cleaned.strip_prefix("+44") {
        rest.to_string()
    } else if let Some(rest) = digits_only.strip_prefix("0044") {
        rest.to_string()
    } else if let Some(rest) = digits_only.strip_prefix('0') {
        rest.to_string()
    } else {
        digits_only
    };

    if national.len() < 9 || national.len() > 10 || !national.chars().all(|c| c.is_ascii_digit())
    {
        return None;
    }

    Some(format!("+44{national}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_fields_recognizes_core_identity_and_geo() {
        assert!(is_field_in_schema("entity_name"));
        assert!(is_field_in_schema("latitude"));
        assert!(is_field_in_schema("modules"));
        assert!(!is_field_in_schema("operator_name"));
        assert!(!is_field_in_schema("usage_type"));
    }

    #[test]
    fn postcode_normalizes_case_and_spacing() {
        assert_eq!(format_postcode_uk("eh11aa"), Some("EH1 1AA".to_string()));
        assert_eq!(format_postcode_uk("EH1  1AA"), Some("EH1 1AA".to_string()));
        assert_eq!(format_postcode_uk("eh12 3nx"), Some("EH12 3NX".to_string()));
    }

    #[test]
    fn postcode_rejects_malformed_input() {
        assert_eq!(format_postcode_uk("not a postcode"), None);
        assert_eq!(format_postcode_uk("123"), None);
    }

    #[test]
    fn phone_normalizes_national_and_international_forms() {
        assert_eq!(format_phone_uk("0131 539 7071"), Some("+441315397071".to_string()));
        assert_eq!(format_phone_uk("+44 131 539 7071"), Some("+441315397071".to_string()));
        assert_eq!(format_phone_uk("00441315397071"), Some("+441315397071".to_string()));
        assert_eq!(format_phone_uk("(0131) 539-7071"), Some("+441315397071".to_string()));
    }

    #[test]
    fn phone_rejects_implausible_length() {
        assert_eq!(format_phone_uk("12345"), None);
    }
}
