use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static LEADING_ARTICLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(the|a|an)\s+").expect("valid regex"));
static NON_SLUG_CHAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9\s-]").expect("valid regex"));
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static HYPHEN_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").expect("valid regex"));

/// Transliterate Unicode to ASCII by NFD-decomposing and dropping combining
/// marks (accents, diacritics): "café" → "cafe".
fn transliterate(s: &str) -> String {
    s.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

fn is_combining_mark(c: char) -> bool {
    matches!(c as u32, 0x0300..=0x036F)
}

fn normalize_segment(s: &str) -> String {
    let lowered = s.to_lowercase();
    let stripped_article = LEADING_ARTICLE.replace(&lowered, "");
    let ascii = transliterate(&stripped_article);
    let ascii_only = NON_SLUG_CHAR.replace_all(&ascii, "");
    let hyphenated = WHITESPACE_RUN.replace_all(&ascii_only, "-");
    let collapsed = HYPHEN_RUN.replace_all(&hyphenated, "-");
    collapsed.trim_matches('-').to_string()
}

/// Deterministic, URL-safe, ASCII-only, hyphen-delimited identifier
/// derived from an entity name (and optionally a disambiguating location).
///
/// Steps: strip a leading article, transliterate Unicode to ASCII, drop any
/// remaining non-alphanumeric/non-space characters, collapse whitespace to
/// hyphens, append `-<location>` (normalized the same way) if given, then
/// collapse repeated hyphens and trim leading/trailing ones.
pub fn slug(name: &str, location: Option<&str>) -> String {
    let base = normalize_segment(name);
    match location {
        Some(loc) if !loc.trim().is_empty() => {
            let loc_part = normalize_segment(loc);
            if loc_part.is_empty() {
                base
            } else if base.is_empty() {
                loc_part
            } else {
                format!("{base}-{loc_part}")
            }
        }
        _ => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_leading_article() {
        assert_eq!(slug("The Game4Padel Club", None), "game4padel-club");
    }

    #[test]
    fn transliterates_accents() {
        assert_eq!(slug("Café Central", None), "cafe-central");
    }

    #[test]
    fn collapses_whitespace_and_punctuation() {
        assert_eq!(slug("Game4Padel Edinburgh", None), "game4padel-edinburgh");
        assert_eq!(slug("  Multiple   Spaces  ", None), "multiple-spaces");
    }

    #[test]
    fn appends_location_suffix() {
        assert_eq!(
            slug("Padel Club", Some("Edinburgh")),
            "padel-club-edinburgh"
        );
    }

    #[test]
    fn is_idempotent_on_already_normalized_input() {
        let once = slug("Game4Padel Edinburgh", None);
        let twice = slug(&once, None);
        assert_eq!(once, twice);
    }

    #[test]
    fn drops_punctuation_entirely() {
        assert_eq!(slug("Tom's Pizza & Pasta!", None), "toms-pizza-pasta");
    }
}
