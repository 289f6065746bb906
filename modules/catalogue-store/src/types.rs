use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Ingestion output. Created by the Ingestion Orchestrator; never mutated.
/// `content_hash` is the idempotence key — duplicate captures are rejected
/// before a row is ever created.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RawCapture {
    pub id: Uuid,
    pub source: String,
    pub source_url: String,
    pub file_path: Option<String>,
    pub content_hash: String,
    pub status: String,
    pub ingested_at: DateTime<Utc>,
    pub metadata: Value,
    pub run_id: Option<Uuid>,
}

/// Extraction output. Exactly one row exists per (raw_capture_id, source)
/// pair at rest; that pair is the idempotence key. Created on success by
/// the Extraction Runner; never mutated in place (force-retry replaces it).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ExtractedRecord {
    pub id: Uuid,
    pub raw_capture_id: Uuid,
    pub source: String,
    pub entity_class: String,
    pub attributes: Value,
    pub discovered_attributes: Value,
    pub external_ids: Value,
    pub extraction_hash: String,
    pub model_used: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Quarantine row. At most one per (raw_capture_id, source); deleted on
/// successful retry.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FailedExtraction {
    pub id: Uuid,
    pub raw_capture_id: Uuid,
    pub source: String,
    pub error_message: String,
    pub error_details: Value,
    pub retry_count: i32,
    pub last_attempt_at: DateTime<Utc>,
}

/// Finalization output: one row per deduplicated, merged entity. Keyed by
/// `slug`; upserts are idempotent.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CanonicalEntity {
    pub id: Uuid,
    pub slug: String,
    pub entity_class: String,
    pub entity_name: String,
    pub summary: Option<String>,
    pub canonical_activities: Value,
    pub canonical_roles: Value,
    pub canonical_place_types: Value,
    pub canonical_access: Value,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub street_address: Option<String>,
    pub city: Option<String>,
    pub postcode: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website_url: Option<String>,
    pub opening_hours: Value,
    pub modules: Value,
    pub discovered_attributes: Value,
    pub external_ids: Value,
    pub source_info: Value,
    pub field_confidence: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lifecycle anchor grouping captures and extractions from one invocation,
/// enabling scoped finalization.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrchestrationRun {
    pub id: Uuid,
    pub query: String,
    pub ingestion_mode: String,
    pub created_at: DateTime<Utc>,
    pub status: String,
}
