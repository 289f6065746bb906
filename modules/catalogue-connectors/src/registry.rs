use std::collections::HashMap;
use std::sync::Arc;

use catalogue_common::config::ConnectorConfig;
use catalogue_common::error::{CatalogueError, Result};

use crate::connector::Connector;
use crate::coordinate_aggregation::CoordinateAggregationConnector;
use crate::geojson_feed::GeoJsonFeedConnector;
use crate::place_details::PlaceDetailsConnector;
use crate::release_artifact::ReleaseArtifactConnector;
use crate::text_search::TextSearchConnector;

/// Which concrete wire shape a source speaks. Sources are matched to a
/// shape explicitly rather than inferred, since two sources with
/// structurally similar responses (e.g. two text-search APIs) may still
/// need different record-id or metadata conventions captured in their
/// connector's own `impl`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorKind {
    TextSearch,
    PlaceDetails,
    GeoJsonFeed,
    ReleaseArtifact,
    CoordinateAggregation,
}

/// Builds a `Connector` trait object for a named source, given that
/// source's `ConnectorConfig` and declared kind. Centralizing this keeps
/// the orchestrator ignorant of which concrete connector struct backs a
/// given source name.
pub fn build_connector(
    source: &str,
    kind: ConnectorKind,
    config: &ConnectorConfig,
) -> Result<Arc<dyn Connector>> {
    let connector: Arc<dyn Connector> = match kind {
        ConnectorKind::TextSearch => Arc::new(TextSearchConnector::new(source, config)?),
        ConnectorKind::PlaceDetails => Arc::new(PlaceDetailsConnector::new(source, config)?),
        ConnectorKind::GeoJsonFeed => Arc::new(GeoJsonFeedConnector::new(source, config)?),
        ConnectorKind::ReleaseArtifact => Arc::new(ReleaseArtifactConnector::new(source, config)?),
        ConnectorKind::CoordinateAggregation => {
            Arc::new(CoordinateAggregationConnector::new(source, config)?)
        }
    };
    Ok(connector)
}

/// The default source -> shape mapping for this pipeline's known sources.
/// A deployment with additional sources builds its own map and calls
/// `build_connector` directly rather than extending this table.
pub fn default_kind_for_source(source: &str) -> Option<ConnectorKind> {
    match source {
        "serper" => Some(ConnectorKind::TextSearch),
        "google_places" => Some(ConnectorKind::PlaceDetails),
        "edinburgh_council" | "sport_scotland" => Some(ConnectorKind::GeoJsonFeed),
        "overture_maps" => Some(ConnectorKind::ReleaseArtifact),
        "open_charge_map" => Some(ConnectorKind::CoordinateAggregation),
        _ => None,
    }
}

/// A registry of built connectors keyed by source name, constructed once
/// at startup from the pipeline config's `connectors` map.
pub struct ConnectorRegistry {
    connectors: HashMap<String, Arc<dyn Connector>>,
}

impl ConnectorRegistry {
    pub fn from_configs(configs: &HashMap<String, ConnectorConfig>) -> Result<Self> {
        let mut connectors = HashMap::new();
        for (source, config) in configs {
            let kind = default_kind_for_source(source).ok_or_else(|| {
                CatalogueError::Config(format!("{source}: no known connector kind"))
            })?;
            connectors.insert(source.clone(), build_connector(source, kind, config)?);
        }
        Ok(Self { connectors })
    }

    pub fn get(&self, source: &str) -> Option<Arc<dyn Connector>> {
        self.connectors.get(source).cloned()
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.connectors.keys().map(String::as_str)
    }
}
