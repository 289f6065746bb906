use std::collections::HashMap;

/// Source → trust level lookup, with a distinguished fallback for sources
/// absent from the configured table. Drives winner selection for most
/// field-group merge strategies.
#[derive(Debug, Clone)]
pub struct TrustHierarchy {
    levels: HashMap<String, i32>,
    unknown_source: i32,
}

impl TrustHierarchy {
    pub fn new(levels: HashMap<String, i32>, unknown_source: i32) -> Self {
        Self {
            levels,
            unknown_source,
        }
    }

    /// Trust level for a source; falls back to `unknown_source` if absent.
    pub fn trust(&self, source: &str) -> i32 {
        self.levels.get(source).copied().unwrap_or(self.unknown_source)
    }

    pub fn is_more_trusted(&self, a: &str, b: &str) -> bool {
        self.trust(a) > self.trust(b)
    }

    /// Sort source names by trust, descending by default.
    pub fn sort_by_trust<'a>(&self, sources: &mut [&'a str], desc: bool) {
        sources.sort_by(|a, b| {
            let ta = self.trust(a);
            let tb = self.trust(b);
            if desc {
                tb.cmp(&ta)
            } else {
                ta.cmp(&tb)
            }
        });
    }

    pub fn highest<'a>(&self, sources: &[&'a str]) -> Option<&'a str> {
        sources
            .iter()
            .copied()
            .max_by_key(|s| self.trust(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hierarchy() -> TrustHierarchy {
        let mut levels = HashMap::new();
        levels.insert("google_places".to_string(), 70);
        levels.insert("serper".to_string(), 50);
        TrustHierarchy::new(levels, 10)
    }

    #[test]
    fn unknown_source_falls_back() {
        let h = hierarchy();
        assert_eq!(h.trust("some_unlisted_source"), 10);
    }

    #[test]
    fn is_more_trusted_compares_correctly() {
        let h = hierarchy();
        assert!(h.is_more_trusted("google_places", "serper"));
        assert!(!h.is_more_trusted("serper", "google_places"));
    }

    #[test]
    fn highest_picks_max_trust() {
        let h = hierarchy();
        let sources = ["serper", "google_places", "unknown_x"];
        assert_eq!(h.highest(&sources), Some("google_places"));
    }

    #[test]
    fn sort_by_trust_descending() {
        let h = hierarchy();
        let mut sources = vec!["serper", "google_places", "unknown_x"];
        h.sort_by_trust(&mut sources, true);
        assert_eq!(sources, vec!["google_places", "serper", "unknown_x"]);
    }
}
