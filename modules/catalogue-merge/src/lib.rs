pub mod conflict;
pub mod entity_merger;
pub mod field_merger;
pub mod missingness;

pub use conflict::{ConflictDetector, ConflictingValue, MergeConflict};
pub use entity_merger::{EntityMerger, MergedEntity, SourceRecord};
pub use field_merger::{FieldMerger, FieldValue, MergedField};
pub use missingness::is_missing;
