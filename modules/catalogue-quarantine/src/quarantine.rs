use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;

use catalogue_common::error::{CatalogueError, Result};
use catalogue_extract::Extractor;
use catalogue_store::artifact::ArtifactStore;
use catalogue_store::store::Store;
use catalogue_store::types::FailedExtraction;

use crate::handler::standard_retry_handler;

/// Summary of a `retry_batch` run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetrySummary {
    pub retried: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Upsert a FailedExtraction row for `(raw_capture_id, source)`. On an
/// existing row, `increment_retry` controls whether `retry_count` bumps;
/// error fields and `last_attempt_at` always refresh.
pub async fn record_failure(
    store: &Store,
    raw_capture_id: uuid::Uuid,
    source: &str,
    error_message: &str,
    error_details: &serde_json::Value,
    increment_retry: bool,
) -> Result<FailedExtraction> {
    store
        .record_failure(raw_capture_id, source, error_message, error_details, increment_retry)
        .await
}

/// Failures with `retry_count < max_retries`, oldest first.
pub async fn list_retryable(
    store: &Store,
    max_retries: i32,
    limit: Option<i64>,
) -> Result<Vec<FailedExtraction>> {
    store.list_retryable(max_retries, limit).await
}

/// Iterate retryable failures and invoke the standard retry handler for
/// each. Three outcomes per failure:
/// - Success (`Ok(())`): delete the FailedExtraction row.
/// - Retryable failure (`Err(CatalogueError::Retryable { .. })`): bump
///   `retry_count`, refresh error fields from the carried `error_details`.
/// - Unknown failure (any other `Err`): bump `retry_count` with a
///   synthetic `{error_type, message}` error_details payload.
pub async fn retry_batch(
    store: &Store,
    artifacts: &ArtifactStore,
    registry: &HashMap<&'static str, Arc<dyn Extractor>>,
    max_retries: i32,
    limit: Option<i64>,
) -> Result<RetrySummary> {
    let failures = list_retryable(store, max_retries, limit).await?;
    let mut summary = RetrySummary::default();

    for failure in failures {
        summary.retried += 1;
        match standard_retry_handler(store, artifacts, registry, &failure).await {
            Ok(()) => {
                store
                    .delete_failed_extraction(failure.raw_capture_id, &failure.source)
                    .await?;
                summary.succeeded += 1;
            }
            Err(CatalogueError::Retryable { message, error_details }) => {
                record_failure(store, failure.raw_capture_id, &failure.source, &message, &error_details, true)
                    .await?;
                summary.failed += 1;
            }
            Err(other) => {
                let details = json!({ "error_type": error_type_name(&other), "message": other.to_string() });
                record_failure(
                    store,
                    failure.raw_capture_id,
                    &failure.source,
                    &other.to_string(),
                    &details,
                    true,
                )
                .await?;
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}

fn error_type_name(err: &CatalogueError) -> &'static str {
    match err {
        CatalogueError::MissingRequiredField(_) => "MissingRequiredField",
        CatalogueError::Extraction(_) => "ExtractionError",
        CatalogueError::Connector(_) => "ConnectorError",
        CatalogueError::Database(_) => "DatabaseError",
        CatalogueError::Hash(_) => "HashError",
        CatalogueError::ModuleValidation(_) => "ModuleValidationError",
        CatalogueError::Config(_) => "ConfigError",
        CatalogueError::Retryable { .. } => "RetryableError",
        CatalogueError::Anyhow(_) => "UnknownError",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_summary_defaults_to_zero() {
        let summary = RetrySummary::default();
        assert_eq!(summary.retried, 0);
        assert_eq!(summary.succeeded, 0);
        assert_eq!(summary.failed, 0);
    }
}
