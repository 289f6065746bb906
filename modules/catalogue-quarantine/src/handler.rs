use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Value};

use catalogue_common::error::{CatalogueError, Result};
use catalogue_common::hash::hash_payload;
use catalogue_extract::{items_for_source, Extractor};
use catalogue_store::artifact::ArtifactStore;
use catalogue_store::store::Store;
use catalogue_store::types::FailedExtraction;

/// Per-item failure detail recorded when a retry partially succeeds, so
/// the aggregated `RetryableError` carries enough to diagnose which
/// specific item in a multi-item payload broke extraction.
#[derive(Debug, Clone, serde::Serialize)]
struct ItemFailure {
    index: usize,
    item_id: Option<String>,
    error_type: String,
    message: String,
}

fn item_id(source: &str, item: &Value) -> Option<String> {
    match source {
        "google_places" => item.get("id").and_then(Value::as_str).map(str::to_string),
        "open_charge_map" => item.get("UUID").and_then(Value::as_str).map(str::to_string),
        "sport_scotland" => item.get("id").and_then(Value::as_str).map(str::to_string),
        "edinburgh_council" => item
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| {
                item.get("properties")
                    .and_then(|p| p.get("OBJECTID").or_else(|| p.get("FID")))
                    .map(|v| v.to_string())
            }),
        _ => None,
    }
}

/// Re-runs extraction for one FailedExtraction record. Loads the raw
/// capture, selects its items by the source's container key, runs the
/// extractor over every item, and aggregates per-item failures into a
/// single `CatalogueError::Retryable` when any item fails. Success is
/// all-or-nothing for the capture as a whole — a capture with one bad
/// item among several good ones still needs a human or a future retry,
/// not a partial persist.
pub async fn standard_retry_handler(
    store: &Store,
    artifacts: &ArtifactStore,
    registry: &HashMap<&'static str, Arc<dyn Extractor>>,
    failure: &FailedExtraction,
) -> Result<()> {
    let capture = store
        .read_capture(failure.raw_capture_id)
        .await?
        .ok_or_else(|| {
            CatalogueError::retryable(
                "RawCapture record not found",
                json!({ "raw_capture_id": failure.raw_capture_id.to_string() }),
            )
        })?;

    let file_path = capture.file_path.as_ref().ok_or_else(|| {
        CatalogueError::retryable(
            "RawCapture has no artifact path",
            json!({ "raw_capture_id": capture.id.to_string() }),
        )
    })?;

    let payload = artifacts.load(std::path::Path::new(file_path))?;
    let items = items_for_source(&failure.source, &payload);
    if items.is_empty() {
        return Err(CatalogueError::retryable(
            "No extractable items found in payload",
            json!({ "source": failure.source }),
        ));
    }

    let extractor = registry.get(failure.source.as_str()).ok_or_else(|| {
        CatalogueError::retryable(
            "No extractor registered for source",
            json!({ "source": failure.source }),
        )
    })?;

    let mut item_failures = Vec::new();
    let mut success_count = 0usize;

    for (index, item) in items.iter().enumerate() {
        match extract_one(extractor.as_ref(), &failure.source, &capture, item, store).await {
            Ok(()) => success_count += 1,
            Err(err) => item_failures.push(ItemFailure {
                index,
                item_id: item_id(&failure.source, item),
                error_type: "ExtractionError".to_string(),
                message: err.to_string(),
            }),
        }
    }

    if !item_failures.is_empty() {
        return Err(CatalogueError::retryable(
            "One or more items failed extraction",
            json!({
                "success_count": success_count,
                "failure_count": item_failures.len(),
                "failed_items": item_failures,
            }),
        ));
    }

    Ok(())
}

async fn extract_one(
    extractor: &dyn Extractor,
    source: &str,
    capture: &catalogue_store::types::RawCapture,
    item: &Value,
    store: &Store,
) -> Result<()> {
    let extracted = extractor.extract(item)?;
    let validated = extractor.validate(extracted)?;
    let (mut attributes, discovered) = extractor.split_attributes(validated);

    let mut external_ids: HashMap<String, Value> = attributes
        .remove("external_ids")
        .and_then(|v| match v {
            Value::Object(map) => Some(map.into_iter().collect()),
            _ => None,
        })
        .unwrap_or_default();
    if let Some(id) = attributes.remove("external_id") {
        if !id.is_null() {
            external_ids.insert(source.to_string(), id);
        }
    }

    let entity_class = attributes
        .get("entity_class")
        .and_then(Value::as_str)
        .ok_or_else(|| CatalogueError::MissingRequiredField("entity_class".to_string()))?
        .to_string();

    let extraction_hash = hash_payload(&json!({
        "raw_capture_id": capture.id,
        "source": source,
        "attributes": attributes,
        "discovered_attributes": discovered,
        "external_ids": external_ids,
    }))?;

    store
        .upsert_extracted_record(
            capture.id,
            source,
            &entity_class,
            &json!(attributes),
            &json!(discovered),
            &json!(external_ids),
            &extraction_hash,
            extractor.model_used(),
        )
        .await?;

    Ok(())
}
