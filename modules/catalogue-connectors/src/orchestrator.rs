use uuid::Uuid;

use catalogue_common::error::Result;
use catalogue_common::hash::hash_payload;
use catalogue_common::logging::{log_ingestion_deduplicated, log_ingestion_fetch_start, log_ingestion_failed, log_ingestion_saved};
use catalogue_store::artifact::ArtifactStore;
use catalogue_store::store::Store;
use catalogue_store::types::RawCapture;

use crate::registry::ConnectorRegistry;

/// Outcome of ingesting a single (source, query) pair.
#[derive(Debug, Clone)]
pub enum IngestOutcome {
    Saved(RawCapture),
    Deduplicated { content_hash: String },
}

/// Summary of an ingestion run across one or more (source, query) pairs.
#[derive(Debug, Clone, Default)]
pub struct IngestSummary {
    pub saved: usize,
    pub deduplicated: usize,
    pub failed: usize,
}

/// Drives the fetch -> hash -> dedupe-check -> save sequence for one
/// source/query pair, logging each decision point. A connector-level
/// error (network, auth, malformed response) propagates to the caller
/// rather than being swallowed here — ingestion failures are not
/// retryable in the way extraction failures are (there is no raw
/// capture yet to quarantine against).
pub async fn ingest_one(
    registry: &ConnectorRegistry,
    store: &Store,
    artifacts: &ArtifactStore,
    source: &str,
    query: &str,
    source_url: &str,
    run_id: Option<Uuid>,
) -> Result<IngestOutcome> {
    let connector = registry.get(source).ok_or_else(|| {
        catalogue_common::error::CatalogueError::Config(format!("{source}: no connector registered"))
    })?;

    log_ingestion_fetch_start(source, query);

    let payload = match connector.fetch(query).await {
        Ok(payload) => payload,
        Err(err) => {
            log_ingestion_failed(source, &err.to_string());
            return Err(err);
        }
    };

    let content_hash = hash_payload(&payload)?;

    if connector.is_duplicate(store, &content_hash).await? {
        log_ingestion_deduplicated(source, &content_hash);
        return Ok(IngestOutcome::Deduplicated { content_hash });
    }

    let capture = connector
        .save(store, artifacts, &payload, source_url, run_id)
        .await?;
    log_ingestion_saved(source, &capture.id.to_string());
    Ok(IngestOutcome::Saved(capture))
}

/// Runs `ingest_one` over every `(source, query)` pair, under a single
/// orchestration run. Individual failures are recorded in the summary
/// and do not stop remaining pairs from being attempted — a single
/// flaky source should not block ingestion of the others.
pub async fn ingest_batch(
    registry: &ConnectorRegistry,
    store: &Store,
    artifacts: &ArtifactStore,
    pairs: &[(String, String, String)],
    run_id: Option<Uuid>,
) -> IngestSummary {
    let mut summary = IngestSummary::default();
    for (source, query, source_url) in pairs {
        match ingest_one(registry, store, artifacts, source, query, source_url, run_id).await {
            Ok(IngestOutcome::Saved(_)) => summary.saved += 1,
            Ok(IngestOutcome::Deduplicated { .. }) => summary.deduplicated += 1,
            Err(_) => summary.failed += 1,
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_defaults_to_zero() {
        let summary = IngestSummary::default();
        assert_eq!(summary.saved, 0);
        assert_eq!(summary.deduplicated, 0);
        assert_eq!(summary.failed, 0);
    }
}
