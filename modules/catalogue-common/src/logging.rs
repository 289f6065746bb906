//! Structured logging helpers. Every stage calls through this tiny surface
//! rather than reaching for `tracing` macros directly, so the event shape
//! (source, record_id, extractor, operation, duration_seconds,
//! fields_extracted, confidence_score, model, tokens_in/out/total, cost_usd,
//! error, field) stays consistent across components. Optional fields are
//! simply omitted from the call when absent — `tracing` fields are per-call,
//! not per-struct, so there is nothing to null out.

pub fn log_extraction_start(source: &str, record_id: &str, extractor: &str) {
    tracing::info!(source, record_id, extractor, "extraction started");
}

pub fn log_extraction_success(
    source: &str,
    record_id: &str,
    extractor: &str,
    duration_seconds: f64,
    fields_extracted: usize,
) {
    tracing::info!(
        source,
        record_id,
        extractor,
        duration_seconds,
        fields_extracted,
        "extraction succeeded"
    );
}

pub fn log_extraction_failure(source: &str, record_id: &str, extractor: &str, error: &str) {
    tracing::warn!(source, record_id, extractor, error, "extraction failed");
}

pub fn log_ingestion_fetch_start(source: &str, query: &str) {
    tracing::info!(source, query, "ingestion fetch started");
}

pub fn log_ingestion_saved(source: &str, record_id: &str) {
    tracing::info!(source, record_id, "raw capture saved");
}

pub fn log_ingestion_deduplicated(source: &str, content_hash: &str) {
    tracing::info!(source, content_hash, "ingestion skipped: duplicate content hash");
}

pub fn log_ingestion_failed(source: &str, error: &str) {
    tracing::warn!(source, error, "ingestion failed");
}

pub fn log_llm_call(
    source: &str,
    record_id: &str,
    model: &str,
    tokens_in: u32,
    tokens_out: u32,
    cost_usd: f64,
) {
    tracing::info!(
        source,
        record_id,
        model,
        tokens_in,
        tokens_out,
        tokens_total = tokens_in + tokens_out,
        cost_usd,
        "llm call completed"
    );
}
