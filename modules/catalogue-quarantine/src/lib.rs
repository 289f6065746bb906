pub mod handler;
pub mod quarantine;

pub use handler::standard_retry_handler;
pub use quarantine::{list_retryable, record_failure, retry_batch, RetrySummary};
