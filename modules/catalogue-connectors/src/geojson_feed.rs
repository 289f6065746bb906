use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use catalogue_common::config::ConnectorConfig;
use catalogue_common::error::Result;

use crate::connector::{connector_error, Connector};

/// GeoJSON feed connector variant: WFS/ArcGIS-style endpoints that return a
/// `FeatureCollection`. `query` is used as a bounding-box or layer filter
/// appended to the configured base URL's default params rather than a free
/// text search. Grounded on Edinburgh Council's and sportscotland's
/// open-data WFS endpoints.
pub struct GeoJsonFeedConnector {
    source: String,
    base_url: String,
    default_params: std::collections::HashMap<String, String>,
    http: reqwest::Client,
}

impl GeoJsonFeedConnector {
    /// GeoJSON feeds are typically public open-data endpoints — no API key
    /// is required, so construction never fails on missing credentials.
    pub fn new(source: impl Into<String>, config: &ConnectorConfig) -> Result<Self> {
        let source = source.into();
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| connector_error(&source, e))?;
        Ok(Self {
            source,
            base_url: config.base_url.clone(),
            default_params: config.default_params.clone(),
            http,
        })
    }
}

#[async_trait]
impl Connector for GeoJsonFeedConnector {
    fn source_name(&self) -> &str {
        &self.source
    }

    async fn fetch(&self, query: &str) -> Result<Value> {
        let mut params: Vec<(String, String)> = self
            .default_params
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if !query.is_empty() {
            params.push(("bbox".to_string(), query.to_string()));
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

        response
            .json()
            .await
            .map_err(|e| connector_error(&self.source, e))
    }

    fn record_id(&self, _payload: &Value, content_hash: &str) -> String {
        format!("features_{}", &content_hash[..8])
    }

    fn capture_metadata(&self, payload: &Value) -> Value {
        let feature_count = payload
            .get("features")
            .and_then(|v| v.as_array())
            .map(|a| a.len())
            .unwrap_or(0);
        json!({ "feature_count": feature_count })
    }
}
