use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use catalogue_common::config::ConnectorConfig;
use catalogue_common::error::Result;

use crate::connector::{connector_error, Connector};

/// Static release artifact connector: resolves a "latest release" pointer
/// (an index/manifest URL) to a concrete download URL, then fetches the
/// artifact itself. Grounded on Overture Maps' release-manifest pattern —
/// a released dataset is large, versioned, and changes infrequently, so
/// the content hash of the manifest response is what gates re-downloading.
pub struct ReleaseArtifactConnector {
    source: String,
    manifest_url: String,
    default_params: std::collections::HashMap<String, String>,
    http: reqwest::Client,
}

impl ReleaseArtifactConnector {
    pub fn new(source: impl Into<String>, config: &ConnectorConfig) -> Result<Self> {
        let source = source.into();
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| connector_error(&source, e))?;
        Ok(Self {
            source,
            manifest_url: config.base_url.clone(),
            default_params: config.default_params.clone(),
            http,
        })
    }

    /// Resolve the manifest to a concrete release identifier and download
    /// URL. `query` selects a layer/theme within the release when the
    /// manifest lists more than one (empty string selects the default).
    async fn resolve_latest(&self, query: &str) -> Result<(String, String)> {
        let params: Vec<(String, String)> = self
            .default_params
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let response = self
            .http
            .get(&self.manifest_url)
            .query(&params)
            .send()
            .await
            .map_err(|e| connector_error(&self.source, e))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(connector_error(&self.source, format!("manifest HTTP {status}")));
        }

        let manifest: Value = response
            .json()
            .await
            .map_err(|e| connector_error(&self.source, e))?;

        let release_id = manifest
            .get("latest")
            .or_else(|| manifest.get("release_id"))
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                connector_error(&self.source, "manifest missing latest release identifier")
            })?
            .to_string();

        let download_url = manifest
            .get("themes")
            .and_then(|themes| {
                if query.is_empty() {
                    themes.get(0)
                } else {
                    themes.as_array()?.iter().find(|t| t.get("name").and_then(|n| n.as_str()) == Some(query))
                }
            })
            .and_then(|theme| theme.get("download_url"))
            .or_else(|| manifest.get("download_url"))
            .and_then(|v| v.as_str())
            .ok_or_else(|| connector_error(&self.source, "manifest missing download_url"))?
            .to_string();

        Ok((release_id, download_url))
    }
}

#[async_trait]
impl Connector for ReleaseArtifactConnector {
    fn source_name(&self) -> &str {
        &self.source
    }

    async fn fetch(&self, query: &str) -> Result<Value> {
        let (release_id, download_url) = self.resolve_latest(query).await?;

        let response = self
            .http
            .get(&download_url)
            .send()
            .await
            .map_err(|e| connector_error(&self.source, e))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(connector_error(&self.source, format!("artifact HTTP {status}")));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| connector_error(&self.source, e))?;

        match body {
            Value::Object(mut map) => {
                map.insert("_release_id".to_string(), json!(release_id));
                Ok(Value::Object(map))
            }
            other => Ok(json!({ "_release_id": release_id, "data": other })),
        }
    }

    fn record_id(&self, payload: &Value, content_hash: &str) -> String {
        let release_id = payload
            .get("_release_id")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        format!("{release_id}_{}", &content_hash[..8])
    }

    fn capture_metadata(&self, payload: &Value) -> Value {
        json!({
            "release_id": payload.get("_release_id").cloned().unwrap_or(Value::Null),
        })
    }
}
