use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use catalogue_common::config::ConnectorConfig;
use catalogue_common::error::Result;

use crate::connector::{connector_error, Connector};

/// Text-search connector variant: a flat query string in, a flat array of
/// results out. Grounded on Serper's `/search` endpoint — the same shape
/// covers any "search API returning an organic results array" source.
pub struct TextSearchConnector {
    source: String,
    api_key: String,
    base_url: String,
    http: reqwest::Client,
}

impl TextSearchConnector {
    /// Fails to construct if the connector config has no `api_key` — a
    /// text-search API without credentials cannot fetch anything.
    pub fn new(source: impl Into<String>, config: &ConnectorConfig) -> Result<Self> {
        let source = source.into();
        let api_key = config.api_key.clone().ok_or_else(|| {
            catalogue_common::error::CatalogueError::Config(format!(
                "{source}: missing required api_key"
            ))
        })?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| connector_error(&source, e))?;
        Ok(Self {
            source,
            api_key,
            base_url: config.base_url.clone(),
            http,
        })
    }
}

#[async_trait]
impl Connector for TextSearchConnector {
    fn source_name(&self) -> &str {
        &self.source
    }

    async fn fetch(&self, query: &str) -> Result<Value> {
        let body = json!({ "q": query });
        let response = self
            .http
            .post(&self.base_url)
            .header("X-API-KEY", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
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
        format!("search_{}", &content_hash[..8])
    }

    fn capture_metadata(&self, payload: &Value) -> Value {
        let result_count = payload
            .get("organic")
            .and_then(|v| v.as_array())
            .map(|a| a.len())
            .unwrap_or(0);
        json!({ "result_count": result_count })
    }
}
