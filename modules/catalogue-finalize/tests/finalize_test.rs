#![cfg(feature = "test-utils")]

//! End-to-end finalize test against a real Postgres instance, run via
//! testcontainers. Requires Docker. Run with:
//!
//!   cargo test -p catalogue-finalize --features test-utils --test finalize_test

use std::collections::HashMap;

use catalogue_common::trust::TrustHierarchy;
use catalogue_finalize::finalize_entities;
use catalogue_store::testutil::postgres_store;
use serde_json::json;

async fn trust() -> TrustHierarchy {
    let mut levels = HashMap::new();
    levels.insert("google_places".to_string(), 80);
    levels.insert("serper".to_string(), 40);
    TrustHierarchy::new(levels, 10)
}

#[tokio::test]
async fn merges_two_sources_for_the_same_venue_into_one_canonical_entity() {
    let (_container, store) = postgres_store().await;
    let trust = trust().await;

    let run = store.create_run("padel edinburgh", "on_demand").await.unwrap();

    let capture_a = store
        .create_capture(
            "google_places",
            "https://places.googleapis.com/v1/places:searchText",
            None,
            "hash-a",
            "extracted",
            &json!({}),
            Some(run.id),
        )
        .await
        .unwrap();
    let capture_b = store
        .create_capture(
            "serper",
            "https://google.serper.dev/search",
            None,
            "hash-b",
            "extracted",
            &json!({}),
            Some(run.id),
        )
        .await
        .unwrap();

    store
        .upsert_extracted_record(
            capture_a.id,
            "google_places",
            "venue",
            &json!({
                "entity_name": "Game4Padel Edinburgh",
                "street_address": "1 Padel Way, Edinburgh",
                "phone": "+441311234567",
                "website_url": "https://game4padel.example/edinburgh",
            }),
            &json!({}),
            &json!({"google_place_id": "abc123"}),
            "extraction-hash-a",
            None,
        )
        .await
        .unwrap();

    store
        .upsert_extracted_record(
            capture_b.id,
            "serper",
            "venue",
            &json!({
                "entity_name": "Game4Padel Edinburgh",
                "website_url": "https://stale-listing.example/game4padel",
            }),
            &json!({}),
            &json!({}),
            "extraction-hash-b",
            None,
        )
        .await
        .unwrap();

    let summary = finalize_entities(&store, &trust, run.id).await.unwrap();
    assert_eq!(summary.entities_created, 1);
    assert_eq!(summary.entities_updated, 0);

    let entity = store
        .find_canonical_entity_by_slug("game4padel-edinburgh")
        .await
        .unwrap()
        .expect("canonical entity should exist");

    assert_eq!(entity.entity_name, "Game4Padel Edinburgh");
    assert_eq!(entity.street_address.as_deref(), Some("1 Padel Way, Edinburgh"));
    // google_places outranks serper, so its website wins the conflict.
    assert_eq!(entity.website_url.as_deref(), Some("https://game4padel.example/edinburgh"));

    let source_info = entity.source_info.as_object().expect("source_info is an object");
    assert_eq!(source_info.get("website_url").and_then(|v| v.as_str()), Some("google_places"));

    // Re-running finalize against the same run is idempotent: no new rows.
    let second = finalize_entities(&store, &trust, run.id).await.unwrap();
    assert_eq!(second.entities_created, 0);
    assert_eq!(second.entities_updated, 1);
}

#[tokio::test]
async fn single_source_group_passes_through_without_merge_conflicts() {
    let (_container, store) = postgres_store().await;
    let trust = trust().await;

    let run = store.create_run("solo venue", "on_demand").await.unwrap();
    let capture = store
        .create_capture(
            "open_charge_map",
            "https://api.openchargemap.io/v3/poi",
            None,
            "hash-solo",
            "extracted",
            &json!({}),
            Some(run.id),
        )
        .await
        .unwrap();

    store
        .upsert_extracted_record(
            capture.id,
            "open_charge_map",
            "charge_point",
            &json!({
                "entity_name": "Lothian Road Charge Point",
                "latitude": 55.9471,
                "longitude": -3.2058,
            }),
            &json!({}),
            &json!({}),
            "extraction-hash-solo",
            None,
        )
        .await
        .unwrap();

    let summary = finalize_entities(&store, &trust, run.id).await.unwrap();
    assert_eq!(summary.entities_created, 1);
    assert_eq!(summary.conflicts, 0);

    let entity = store
        .find_canonical_entity_by_slug("lothian-road-charge-point")
        .await
        .unwrap()
        .expect("canonical entity should exist");
    assert_eq!(entity.entity_class, "charge_point");
    assert_eq!(entity.latitude, Some(55.9471));
}
