pub mod container;
pub mod extractor;
pub mod extractors;
pub mod registry;
pub mod runner;
pub mod schema;

pub use container::{items_for_source, primary_item};
pub use extractor::Extractor;
pub use registry::default_registry;
pub use runner::{
    extract_all_pending, extract_batch_for_source, extract_single, ExtractOutcome,
    ExtractionFlags, ExtractionSummary,
};
