//! Thin CLI binary over the three batch stages: the Extraction Runner,
//! Quarantine & Retry, and the Entity Finalizer. Connector wiring and
//! ingestion orchestration are a separate concern for a deployment's own
//! scheduler to drive; this binary only exercises the stages that
//! read/write already-staged records.

use std::process::ExitCode;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use catalogue_common::config::Config;
use catalogue_common::trust::TrustHierarchy;
use catalogue_extract::{
    default_registry, extract_all_pending, extract_batch_for_source, extract_single,
    ExtractOutcome, ExtractionFlags, ExtractionSummary,
};
use catalogue_finalize::finalize_entities;
use catalogue_quarantine::retry_batch;
use catalogue_store::artifact::ArtifactStore;
use catalogue_store::store::Store;

#[derive(Parser)]
#[command(name = "catalogue", about = "Catalogue pipeline stage runner", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the Extraction Runner: single RawCapture, one source's
    /// backlog, or every pending capture across all sources.
    Extract {
        /// Extract exactly this RawCapture id.
        #[arg(long)]
        raw_id: Option<Uuid>,
        /// Extract every pending RawCapture for this source.
        #[arg(long)]
        source: Option<String>,
        /// Cap the number of records processed (ignored with --raw-id).
        #[arg(long)]
        limit: Option<usize>,
        /// Validate and split but persist nothing.
        #[arg(long)]
        dry_run: bool,
        /// Ignore the already-extracted idempotence check and replace.
        #[arg(long)]
        force_retry: bool,
    },
    /// Run Quarantine & Retry over currently-retryable failures.
    Retry {
        /// Present for parity with the documented flag surface; retry is
        /// this subcommand's only action regardless of this flag's value.
        #[arg(long)]
        retry_failed: bool,
        #[arg(long, default_value_t = 3)]
        max_retries: i32,
        #[arg(long)]
        limit: Option<i64>,
    },
    /// Run the Entity Finalizer for one OrchestrationRun.
    Finalize {
        #[arg(long)]
        run_id: Uuid,
    },
}

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("catalogue=info".parse().expect("valid directive")))
        .init();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(err) => {
            eprintln!("failed to start async runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run()) {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(error = %err, "catalogue-cli failed");
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = Config::from_env();
    config.log_redacted();

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let store = Store::new(pool);
    let artifacts = ArtifactStore::new(config.raw_data_root.clone());

    match cli.command {
        Commands::Extract { raw_id, source, limit, dry_run, force_retry } => {
            let flags = ExtractionFlags { dry_run, force_retry };
            run_extract(&store, &artifacts, raw_id, source, limit, flags).await
        }
        Commands::Retry { retry_failed: _, max_retries, limit } => {
            run_retry(&store, &artifacts, max_retries, limit).await
        }
        Commands::Finalize { run_id } => run_finalize(&store, &config, run_id).await,
    }
}

async fn run_extract(
    store: &Store,
    artifacts: &ArtifactStore,
    raw_id: Option<Uuid>,
    source: Option<String>,
    limit: Option<usize>,
    flags: ExtractionFlags,
) -> Result<ExitCode> {
    let registry = default_registry();

    if let Some(raw_id) = raw_id {
        let capture = store
            .read_capture(raw_id)
            .await?
            .ok_or_else(|| anyhow!("no RawCapture found for id {raw_id}"))?;
        let extractor = registry
            .get(capture.source.as_str())
            .ok_or_else(|| anyhow!("no extractor registered for source {}", capture.source))?
            .clone();

        let outcome = extract_single(store, artifacts, extractor, &capture, flags).await?;
        match outcome {
            ExtractOutcome::Extracted(record) => {
                println!("extracted: {} ({})", record.id, record.source);
                Ok(ExitCode::SUCCESS)
            }
            ExtractOutcome::AlreadyExtracted => {
                println!("already_extracted: {raw_id}");
                Ok(ExitCode::SUCCESS)
            }
            ExtractOutcome::Failed(err) => {
                println!("failed: {err}");
                Ok(ExitCode::FAILURE)
            }
        }
    } else if let Some(source) = source {
        let extractor = registry
            .get(source.as_str())
            .ok_or_else(|| anyhow!("no extractor registered for source {source}"))?
            .clone();
        let summary = extract_batch_for_source(store, artifacts, extractor, &source, flags, limit).await?;
        print_extraction_summary(&summary);
        Ok(exit_code_for_summary(&summary))
    } else {
        let summary = extract_all_pending(store, artifacts, &registry, flags, limit).await?;
        print_extraction_summary(&summary);
        Ok(exit_code_for_summary(&summary))
    }
}

async fn run_retry(
    store: &Store,
    artifacts: &ArtifactStore,
    max_retries: i32,
    limit: Option<i64>,
) -> Result<ExitCode> {
    let registry = default_registry();
    let summary = retry_batch(store, artifacts, &registry, max_retries, limit).await?;

    println!(
        "retried={} succeeded={} failed={}",
        summary.retried, summary.succeeded, summary.failed
    );

    if summary.failed == 0 {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

async fn run_finalize(store: &Store, config: &Config, run_id: Uuid) -> Result<ExitCode> {
    let trust = TrustHierarchy::new(config.trust_levels.clone(), config.unknown_source_trust);
    let summary = finalize_entities(store, &trust, run_id).await?;

    println!(
        "entities_created={} entities_updated={} conflicts={}",
        summary.entities_created, summary.entities_updated, summary.conflicts
    );

    // Finalization failures are database errors that already propagated
    // via `?` above; reaching this point means the run completed, so the
    // exit code is always success regardless of the summary counts.
    Ok(ExitCode::SUCCESS)
}

fn print_extraction_summary(summary: &ExtractionSummary) {
    println!(
        "successful={} failed={} already_extracted={} cost_estimate_usd={:.4}",
        summary.successful, summary.failed, summary.already_extracted, summary.cost_estimate
    );
}

/// Nonzero iff zero records succeeded and the batch was non-empty.
/// `already_extracted` counts as a prior success, not a failure, for
/// this purpose.
fn exit_code_for_summary(summary: &ExtractionSummary) -> ExitCode {
    let total = summary.successful + summary.failed + summary.already_extracted;
    let any_success = summary.successful > 0 || summary.already_extracted > 0;
    if total > 0 && !any_success {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
