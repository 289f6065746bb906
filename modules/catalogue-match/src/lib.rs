pub mod cascade;
pub mod external_id;
pub mod fuzzy;
pub mod haversine;
pub mod slug_matcher;

pub use cascade::{find_duplicates, find_match, CascadeConfig, DedupeCandidate};
pub use external_id::match_external_ids;
pub use fuzzy::{match_fuzzy, FuzzyCandidate};
pub use slug_matcher::match_slugs;
