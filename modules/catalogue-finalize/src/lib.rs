pub mod finalizer;

pub use finalizer::{finalize_entities, FinalizeSummary};
