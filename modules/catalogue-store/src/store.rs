use chrono::Utc;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use catalogue_common::error::{CatalogueError, Result};

use crate::types::{
    CanonicalEntity, ExtractedRecord, FailedExtraction, OrchestrationRun, RawCapture,
};

/// The pipeline's persistence layer: one pool, one struct, plain async
/// methods per table operation. `Clone` is cheap — `PgPool` is an `Arc`
/// internally.
#[derive(Clone)]
pub struct Store {
    pool: PgPool,
}

impl Store {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // -- RawCapture ----------------------------------------------------

    /// Look up an existing capture by content hash. Used by the Ingestion
    /// Orchestrator's duplicate check before any write happens.
    pub async fn find_capture_by_hash(&self, content_hash: &str) -> Result<Option<RawCapture>> {
        let row = sqlx::query_as::<_, RawCapture>(
            "SELECT id, source, source_url, file_path, content_hash, status, ingested_at, metadata, run_id
             FROM raw_captures WHERE content_hash = $1",
        )
        .bind(content_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CatalogueError::Database(e.to_string()))?;
        Ok(row)
    }

    pub async fn create_capture(
        &self,
        source: &str,
        source_url: &str,
        file_path: Option<&str>,
        content_hash: &str,
        status: &str,
        metadata: &Value,
        run_id: Option<Uuid>,
    ) -> Result<RawCapture> {
        let row = sqlx::query_as::<_, RawCapture>(
            "INSERT INTO raw_captures (id, source, source_url, file_path, content_hash, status, ingested_at, metadata, run_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING id, source, source_url, file_path, content_hash, status, ingested_at, metadata, run_id",
        )
        .bind(Uuid::new_v4())
        .bind(source)
        .bind(source_url)
        .bind(file_path)
        .bind(content_hash)
        .bind(status)
        .bind(Utc::now())
        .bind(metadata)
        .bind(run_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| CatalogueError::Database(e.to_string()))?;
        Ok(row)
    }

    pub async fn read_capture(&self, id: Uuid) -> Result<Option<RawCapture>> {
        let row = sqlx::query_as::<_, RawCapture>(
            "SELECT id, source, source_url, file_path, content_hash, status, ingested_at, metadata, run_id
             FROM raw_captures WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CatalogueError::Database(e.to_string()))?;
        Ok(row)
    }

    pub async fn captures_for_source(&self, source: &str) -> Result<Vec<RawCapture>> {
        let rows = sqlx::query_as::<_, RawCapture>(
            "SELECT id, source, source_url, file_path, content_hash, status, ingested_at, metadata, run_id
             FROM raw_captures WHERE source = $1 ORDER BY ingested_at ASC",
        )
        .bind(source)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CatalogueError::Database(e.to_string()))?;
        Ok(rows)
    }

    pub async fn all_pending_captures(&self) -> Result<Vec<RawCapture>> {
        let rows = sqlx::query_as::<_, RawCapture>(
            "SELECT rc.id, rc.source, rc.source_url, rc.file_path, rc.content_hash, rc.status, rc.ingested_at, rc.metadata, rc.run_id
             FROM raw_captures rc
             WHERE NOT EXISTS (
                 SELECT 1 FROM extracted_records er
                 WHERE er.raw_capture_id = rc.id AND er.source = rc.source
             )
             ORDER BY rc.source, rc.ingested_at ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CatalogueError::Database(e.to_string()))?;
        Ok(rows)
    }

    // -- ExtractedRecord -------------------------------------------------

    pub async fn find_extracted_record(
        &self,
        raw_capture_id: Uuid,
        source: &str,
    ) -> Result<Option<ExtractedRecord>> {
        let row = sqlx::query_as::<_, ExtractedRecord>(
            "SELECT id, raw_capture_id, source, entity_class, attributes, discovered_attributes, external_ids, extraction_hash, model_used, created_at
             FROM extracted_records WHERE raw_capture_id = $1 AND source = $2",
        )
        .bind(raw_capture_id)
        .bind(source)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CatalogueError::Database(e.to_string()))?;
        Ok(row)
    }

    /// Look up an ExtractedRecord by its `extraction_hash` — the LLM
    /// extraction cache's lookup path. A hit means an identical
    /// (raw_capture_id, source, attributes, discovered, external_ids)
    /// tuple was already produced, so a cache consumer can skip re-calling
    /// the model entirely.
    pub async fn find_extracted_record_by_hash(
        &self,
        extraction_hash: &str,
    ) -> Result<Option<ExtractedRecord>> {
        let row = sqlx::query_as::<_, ExtractedRecord>(
            "SELECT id, raw_capture_id, source, entity_class, attributes, discovered_attributes, external_ids, extraction_hash, model_used, created_at
             FROM extracted_records WHERE extraction_hash = $1",
        )
        .bind(extraction_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CatalogueError::Database(e.to_string()))?;
        Ok(row)
    }

    /// Insert an ExtractedRecord, replacing any existing row for the same
    /// (raw_capture_id, source) pair — used for `force_retry`. The caller
    /// is responsible for the `already_extracted` idempotence check before
    /// calling this when `force_retry` is off.
    pub async fn upsert_extracted_record(
        &self,
        raw_capture_id: Uuid,
        source: &str,
        entity_class: &str,
        attributes: &Value,
        discovered_attributes: &Value,
        external_ids: &Value,
        extraction_hash: &str,
        model_used: Option<&str>,
    ) -> Result<ExtractedRecord> {
        let row = sqlx::query_as::<_, ExtractedRecord>(
            "INSERT INTO extracted_records
                 (id, raw_capture_id, source, entity_class, attributes, discovered_attributes, external_ids, extraction_hash, model_used, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             ON CONFLICT (raw_capture_id, source) DO UPDATE SET
                 entity_class = EXCLUDED.entity_class,
                 attributes = EXCLUDED.attributes,
                 discovered_attributes = EXCLUDED.discovered_attributes,
                 external_ids = EXCLUDED.external_ids,
                 extraction_hash = EXCLUDED.extraction_hash,
                 model_used = EXCLUDED.model_used,
                 created_at = EXCLUDED.created_at
             RETURNING id, raw_capture_id, source, entity_class, attributes, discovered_attributes, external_ids, extraction_hash, model_used, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(raw_capture_id)
        .bind(source)
        .bind(entity_class)
        .bind(attributes)
        .bind(discovered_attributes)
        .bind(external_ids)
        .bind(extraction_hash)
        .bind(model_used)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| CatalogueError::Database(e.to_string()))?;
        Ok(row)
    }

    pub async fn extracted_records_since(
        &self,
        since: chrono::DateTime<Utc>,
    ) -> Result<Vec<ExtractedRecord>> {
        let rows = sqlx::query_as::<_, ExtractedRecord>(
            "SELECT id, raw_capture_id, source, entity_class, attributes, discovered_attributes, external_ids, extraction_hash, model_used, created_at
             FROM extracted_records WHERE created_at >= $1 ORDER BY created_at ASC",
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CatalogueError::Database(e.to_string()))?;
        Ok(rows)
    }

    // -- FailedExtraction --------------------------------------------------

    pub async fn find_failed_extraction(
        &self,
        raw_capture_id: Uuid,
        source: &str,
    ) -> Result<Option<FailedExtraction>> {
        let row = sqlx::query_as::<_, FailedExtraction>(
            "SELECT id, raw_capture_id, source, error_message, error_details, retry_count, last_attempt_at
             FROM failed_extractions WHERE raw_capture_id = $1 AND source = $2",
        )
        .bind(raw_capture_id)
        .bind(source)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CatalogueError::Database(e.to_string()))?;
        Ok(row)
    }

    pub async fn record_failure(
        &self,
        raw_capture_id: Uuid,
        source: &str,
        error_message: &str,
        error_details: &Value,
        increment_retry: bool,
    ) -> Result<FailedExtraction> {
        let existing = self.find_failed_extraction(raw_capture_id, source).await?;
        let retry_count = match &existing {
            Some(row) if increment_retry => row.retry_count + 1,
            Some(row) => row.retry_count,
            None => 0,
        };
        let row = sqlx::query_as::<_, FailedExtraction>(
            "INSERT INTO failed_extractions (id, raw_capture_id, source, error_message, error_details, retry_count, last_attempt_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (raw_capture_id, source) DO UPDATE SET
                 error_message = EXCLUDED.error_message,
                 error_details = EXCLUDED.error_details,
                 retry_count = EXCLUDED.retry_count,
                 last_attempt_at = EXCLUDED.last_attempt_at
             RETURNING id, raw_capture_id, source, error_message, error_details, retry_count, last_attempt_at",
        )
        .bind(Uuid::new_v4())
        .bind(raw_capture_id)
        .bind(source)
        .bind(error_message)
        .bind(error_details)
        .bind(retry_count)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| CatalogueError::Database(e.to_string()))?;
        Ok(row)
    }

    pub async fn delete_failed_extraction(&self, raw_capture_id: Uuid, source: &str) -> Result<()> {
        sqlx::query("DELETE FROM failed_extractions WHERE raw_capture_id = $1 AND source = $2")
            .bind(raw_capture_id)
            .bind(source)
            .execute(&self.pool)
            .await
            .map_err(|e| CatalogueError::Database(e.to_string()))?;
        Ok(())
    }

    pub async fn list_retryable(
        &self,
        max_retries: i32,
        limit: Option<i64>,
    ) -> Result<Vec<FailedExtraction>> {
        let rows = sqlx::query_as::<_, FailedExtraction>(
            "SELECT id, raw_capture_id, source, error_message, error_details, retry_count, last_attempt_at
             FROM failed_extractions WHERE retry_count < $1 ORDER BY last_attempt_at ASC LIMIT $2",
        )
        .bind(max_retries)
        .bind(limit.unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CatalogueError::Database(e.to_string()))?;
        Ok(rows)
    }

    // -- CanonicalEntity --------------------------------------------------

    #[allow(clippy::too_many_arguments)]
    pub async fn upsert_canonical_entity(
        &self,
        slug: &str,
        entity_class: &str,
        entity_name: &str,
        summary: Option<&str>,
        canonical_activities: &Value,
        canonical_roles: &Value,
        canonical_place_types: &Value,
        canonical_access: &Value,
        latitude: Option<f64>,
        longitude: Option<f64>,
        street_address: Option<&str>,
        city: Option<&str>,
        postcode: Option<&str>,
        country: Option<&str>,
        phone: Option<&str>,
        email: Option<&str>,
        website_url: Option<&str>,
        opening_hours: &Value,
        modules: &Value,
        discovered_attributes: &Value,
        external_ids: &Value,
        source_info: &Value,
        field_confidence: &Value,
    ) -> Result<(CanonicalEntity, bool)> {
        let existed = self.find_canonical_entity_by_slug(slug).await?.is_some();
        let now = Utc::now();
        let row = sqlx::query_as::<_, CanonicalEntity>(
            "INSERT INTO canonical_entities
                 (id, slug, entity_class, entity_name, summary, canonical_activities, canonical_roles,
                  canonical_place_types, canonical_access, latitude, longitude, street_address, city,
                  postcode, country, phone, email, website_url, opening_hours, modules,
                  discovered_attributes, external_ids, source_info, field_confidence, created_at, updated_at)
             VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17,$18,$19,$20,$21,$22,$23,$24,$25,$26)
             ON CONFLICT (slug) DO UPDATE SET
                 entity_class = EXCLUDED.entity_class,
                 entity_name = EXCLUDED.entity_name,
                 summary = EXCLUDED.summary,
                 canonical_activities = EXCLUDED.canonical_activities,
                 canonical_roles = EXCLUDED.canonical_roles,
                 canonical_place_types = EXCLUDED.canonical_place_types,
                 canonical_access = EXCLUDED.canonical_access,
                 latitude = EXCLUDED.latitude,
                 longitude = EXCLUDED.longitude,
                 street_address = EXCLUDED.street_address,
                 city = EXCLUDED.city,
                 postcode = EXCLUDED.postcode,
                 country = EXCLUDED.country,
                 phone = EXCLUDED.phone,
                 email = EXCLUDED.email,
                 website_url = EXCLUDED.website_url,
                 opening_hours = EXCLUDED.opening_hours,
                 modules = EXCLUDED.modules,
                 discovered_attributes = EXCLUDED.discovered_attributes,
                 external_ids = EXCLUDED.external_ids,
                 source_info = EXCLUDED.source_info,
                 field_confidence = EXCLUDED.field_confidence,
                 updated_at = EXCLUDED.updated_at
             RETURNING id, slug, entity_class, entity_name, summary, canonical_activities, canonical_roles,
                 canonical_place_types, canonical_access, latitude, longitude, street_address, city,
                 postcode, country, phone, email, website_url, opening_hours, modules,
                 discovered_attributes, external_ids, source_info, field_confidence, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(slug)
        .bind(entity_class)
        .bind(entity_name)
        .bind(summary)
        .bind(canonical_activities)
        .bind(canonical_roles)
        .bind(canonical_place_types)
        .bind(canonical_access)
        .bind(latitude)
        .bind(longitude)
        .bind(street_address)
        .bind(city)
        .bind(postcode)
        .bind(country)
        .bind(phone)
        .bind(email)
        .bind(website_url)
        .bind(opening_hours)
        .bind(modules)
        .bind(discovered_attributes)
        .bind(external_ids)
        .bind(source_info)
        .bind(field_confidence)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| CatalogueError::Database(e.to_string()))?;
        Ok((row, !existed))
    }

    pub async fn find_canonical_entity_by_slug(&self, slug: &str) -> Result<Option<CanonicalEntity>> {
        let row = sqlx::query_as::<_, CanonicalEntity>(
            "SELECT id, slug, entity_class, entity_name, summary, canonical_activities, canonical_roles,
                 canonical_place_types, canonical_access, latitude, longitude, street_address, city,
                 postcode, country, phone, email, website_url, opening_hours, modules,
                 discovered_attributes, external_ids, source_info, field_confidence, created_at, updated_at
             FROM canonical_entities WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CatalogueError::Database(e.to_string()))?;
        Ok(row)
    }

    // -- OrchestrationRun --------------------------------------------------

    pub async fn create_run(&self, query: &str, ingestion_mode: &str) -> Result<OrchestrationRun> {
        let row = sqlx::query_as::<_, OrchestrationRun>(
            "INSERT INTO orchestration_runs (id, query, ingestion_mode, created_at, status)
             VALUES ($1, $2, $3, $4, 'running')
             RETURNING id, query, ingestion_mode, created_at, status",
        )
        .bind(Uuid::new_v4())
        .bind(query)
        .bind(ingestion_mode)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| CatalogueError::Database(e.to_string()))?;
        Ok(row)
    }

    pub async fn read_run(&self, id: Uuid) -> Result<Option<OrchestrationRun>> {
        let row = sqlx::query_as::<_, OrchestrationRun>(
            "SELECT id, query, ingestion_mode, created_at, status FROM orchestration_runs WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CatalogueError::Database(e.to_string()))?;
        Ok(row)
    }

    pub async fn set_run_status(&self, id: Uuid, status: &str) -> Result<()> {
        sqlx::query("UPDATE orchestration_runs SET status = $1 WHERE id = $2")
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| CatalogueError::Database(e.to_string()))?;
        Ok(())
    }
}

/// Test-only helpers gated behind the `test-utils` feature, matching the
/// teacher's convention of keeping unrestricted reads out of the normal
/// production surface.
#[cfg(feature = "test-utils")]
impl Store {
    pub async fn count_canonical_entities(&self) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM canonical_entities")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| CatalogueError::Database(e.to_string()))?;
        Ok(row.0)
    }

    pub async fn count_failed_extractions(&self) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM failed_extractions")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| CatalogueError::Database(e.to_string()))?;
        Ok(row.0)
    }
}
