use async_trait::async_trait;
use serde_json::{json, Value};
use uuid::Uuid;

use catalogue_common::error::{CatalogueError, Result};
use catalogue_common::hash::hash_payload;
use catalogue_store::artifact::ArtifactStore;
use catalogue_store::store::Store;
use catalogue_store::types::RawCapture;

/// Pluggable source adapter. Connectors never interpret data — their output
/// is raw-as-received plus structural metadata (result count, feature
/// count). `fetch` and `record_id` are the only source-specific operations;
/// `is_duplicate` and `save` share one implementation here so every
/// connector persists through the same atomic hash → artifact → row path.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Unique identifier for this data source, e.g. "serper", "google_places".
    fn source_name(&self) -> &str;

    /// Fetch raw data from the external source. Network and HTTP errors
    /// propagate as `CatalogueError::Connector`; there is no retry at this
    /// layer.
    async fn fetch(&self, query: &str) -> Result<Value>;

    /// Short, source-specific identifier disambiguating this capture within
    /// a day, combined with the first 8 hex chars of the content hash by
    /// convention (not enforced here — connectors choose their own scheme).
    fn record_id(&self, payload: &Value, content_hash: &str) -> String;

    /// Structural metadata recorded alongside the capture row (result
    /// count, feature count, etc). Connectors never put interpreted
    /// domain data here — metadata only describes the payload's shape.
    fn capture_metadata(&self, _payload: &Value) -> Value {
        json!({})
    }

    async fn is_duplicate(&self, store: &Store, content_hash: &str) -> Result<bool> {
        Ok(store.find_capture_by_hash(content_hash).await?.is_some())
    }

    /// Hash, persist the artifact, and create the RawCapture row. The
    /// artifact write and the row creation aren't in a single DB
    /// transaction (the artifact lives on disk), but upstream hashing
    /// guarantees re-running this for identical content is a no-op.
    async fn save(
        &self,
        store: &Store,
        artifacts: &ArtifactStore,
        payload: &Value,
        source_url: &str,
        run_id: Option<Uuid>,
    ) -> Result<RawCapture> {
        let content_hash = hash_payload(payload)?;
        let record_id = self.record_id(payload, &content_hash);
        let file_path = artifacts.store(self.source_name(), &record_id, payload)?;
        let metadata = self.capture_metadata(payload);
        store
            .create_capture(
                self.source_name(),
                source_url,
                file_path.to_str(),
                &content_hash,
                "success",
                &metadata,
                run_id,
            )
            .await
    }
}

/// Wraps a reqwest error (or any transport failure) as a `ConnectorError`.
/// Timeouts surface through `reqwest::Error::is_timeout` and are first-class
/// connector errors, not distinguished further here.
pub fn connector_error(source: &str, err: impl std::fmt::Display) -> CatalogueError {
    CatalogueError::Connector(format!("{source}: {err}"))
}
