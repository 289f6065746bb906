use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use catalogue_common::config::ConnectorConfig;
use catalogue_common::error::{CatalogueError, Result};

use crate::connector::{connector_error, Connector};

/// Place-details connector variant: a text query returns a flat array of
/// place objects (`places`), or a place ID returns a single object.
/// Grounded on the Google Places Text Search / Place Details endpoints.
pub struct PlaceDetailsConnector {
    source: String,
    api_key: String,
    base_url: String,
    default_params: std::collections::HashMap<String, String>,
    http: reqwest::Client,
}

impl PlaceDetailsConnector {
    pub fn new(source: impl Into<String>, config: &ConnectorConfig) -> Result<Self> {
        let source = source.into();
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| CatalogueError::Config(format!("{source}: missing required api_key")))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| connector_error(&source, e))?;
        Ok(Self {
            source,
            api_key,
            base_url: config.base_url.clone(),
            default_params: config.default_params.clone(),
            http,
        })
    }
}

#[async_trait]
impl Connector for PlaceDetailsConnector {
    fn source_name(&self) -> &str {
        &self.source
    }

    async fn fetch(&self, query: &str) -> Result<Value> {
        let url = format!("{}/textsearch/json", self.base_url);
        let mut params: Vec<(String, String)> = vec![
            ("query".to_string(), query.to_string()),
            ("key".to_string(), self.api_key.clone()),
        ];
        for (k, v) in &self.default_params {
            params.push((k.clone(), v.clone()));
        }

        let response = self
            .http
            .get(&url)
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

    fn record_id(&self, payload: &Value, content_hash: &str) -> String {
        let status = payload
            .get("status")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_lowercase();
        format!("{status}_{}", &content_hash[..8])
    }

    fn capture_metadata(&self, payload: &Value) -> Value {
        let result_count = payload
            .get("places")
            .or_else(|| payload.get("results"))
            .and_then(|v| v.as_array())
            .map(|a| a.len())
            .unwrap_or(0);
        let status = payload
            .get("status")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        json!({ "result_count": result_count, "status": status })
    }
}
