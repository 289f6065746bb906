pub mod connector;
pub mod coordinate_aggregation;
pub mod geojson_feed;
pub mod orchestrator;
pub mod place_details;
pub mod registry;
pub mod release_artifact;
pub mod text_search;

pub use connector::{connector_error, Connector};
pub use orchestrator::{ingest_batch, ingest_one, IngestOutcome, IngestSummary};
pub use registry::{build_connector, default_kind_for_source, ConnectorKind, ConnectorRegistry};
