use std::collections::HashMap;
use std::sync::Arc;

use crate::extractor::Extractor;
use crate::extractors::{
    EdinburghCouncilExtractor, GooglePlacesExtractor, OpenChargeMapExtractor,
    OpenStreetMapExtractor, SerperExtractor, SportScotlandExtractor,
};

/// One canonical source-name -> extractor mapping, shared by the
/// Extraction Runner and the Quarantine retry handler. The original
/// implementation kept two separate registries with inconsistent keys for
/// the same source; this crate normalizes to a single registry (see
/// DESIGN.md).
pub fn default_registry() -> HashMap<&'static str, Arc<dyn Extractor>> {
    let mut registry: HashMap<&'static str, Arc<dyn Extractor>> = HashMap::new();
    registry.insert("google_places", Arc::new(GooglePlacesExtractor));
    registry.insert("sport_scotland", Arc::new(SportScotlandExtractor));
    registry.insert("edinburgh_council", Arc::new(EdinburghCouncilExtractor));
    registry.insert("open_charge_map", Arc::new(OpenChargeMapExtractor));
    registry.insert("serper", Arc::new(SerperExtractor));
    registry.insert("openstreetmap", Arc::new(OpenStreetMapExtractor));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_covers_every_known_source() {
        let registry = default_registry();
        for source in [
            "google_places",
            "sport_scotland",
            "edinburgh_council",
            "open_charge_map",
            "serper",
            "openstreetmap",
        ] {
            assert!(registry.contains_key(source), "missing extractor for {source}");
            assert_eq!(registry[source].source_name(), source);
        }
    }
}
