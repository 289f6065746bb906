use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use catalogue_common::config::ConnectorConfig;
use catalogue_common::error::Result;

use crate::connector::{connector_error, Connector};

/// Coordinate-scoped aggregation connector: `query` is a `"lat,lng"` pair
/// (optionally with a radius appended as `"lat,lng,radius_km"`), and the
/// response is a flat array of points near that coordinate. Grounded on
/// OpenChargeMap's `/poi` endpoint.
pub struct CoordinateAggregationConnector {
    source: String,
    api_key: Option<String>,
    base_url: String,
    default_params: std::collections::HashMap<String, String>,
    http: reqwest::Client,
}

impl CoordinateAggregationConnector {
    /// OpenChargeMap-style APIs accept requests without a key at reduced
    /// rate limits, so a missing `api_key` is not a construction failure.
    pub fn new(source: impl Into<String>, config: &ConnectorConfig) -> Result<Self> {
        let source = source.into();
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| connector_error(&source, e))?;
        Ok(Self {
            source,
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            default_params: config.default_params.clone(),
            http,
        })
    }

    fn parse_query(query: &str) -> Option<(f64, f64, Option<f64>)> {
        let parts: Vec<&str> = query.split(',').map(str::trim).collect();
        if parts.len() < 2 {
            return None;
        }
        let lat: f64 = parts[0].parse().ok()?;
        let lng: f64 = parts[1].parse().ok()?;
        let radius = parts.get(2).and_then(|r| r.parse().ok());
        Some((lat, lng, radius))
    }
}

#[async_trait]
impl Connector for CoordinateAggregationConnector {
    fn source_name(&self) -> &str {
        &self.source
    }

    async fn fetch(&self, query: &str) -> Result<Value> {
        let (lat, lng, radius) = Self::parse_query(query).ok_or_else(|| {
            connector_error(&self.source, format!("invalid \"lat,lng\" query: {query}"))
        })?;

        let mut params: Vec<(String, String)> = vec![
            ("latitude".to_string(), lat.to_string()),
            ("longitude".to_string(), lng.to_string()),
        ];
        if let Some(radius) = radius {
            params.push(("distance".to_string(), radius.to_string()));
        }
        if let Some(key) = &self.api_key {
            params.push(("key".to_string(), key.clone()));
        }
        for (k, v) in &self.default_params {
            params.push((k.clone(), v.clone()));
        }

        let response = self
            .http
            .get(&self.base_url)
            .query(&params)
            .send()
            .await
            .map_err(|e| connector_error(&self.source, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(connector_error(
                &self.source,
                format!("HTTP {status}: {text}"),
            ));
        }

        let points: Value = response
            .json()
            .await
            .map_err(|e| connector_error(&self.source, e))?;

        Ok(json!({ "points": points }))
    }

    fn record_id(&self, _payload: &Value, content_hash: &str) -> String {
        format!("poi_{}", &content_hash[..8])
    }

    fn capture_metadata(&self, payload: &Value) -> Value {
        let point_count = payload
            .get("points")
            .and_then(|v| v.as_array())
            .map(|a| a.len())
            .unwrap_or(0);
        json!({ "point_count": point_count })
    }
}
