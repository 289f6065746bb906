pub mod artifact;
pub mod store;
#[cfg(feature = "test-utils")]
pub mod testutil;
pub mod types;

pub use artifact::ArtifactStore;
pub use store::Store;
pub use types::{CanonicalEntity, ExtractedRecord, FailedExtraction, OrchestrationRun, RawCapture};
