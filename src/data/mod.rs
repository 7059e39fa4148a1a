//! Data access: upstream prediction client, response normalization and
//! placeholder records.

pub mod normalize;
pub mod placeholder;
pub mod upstream;

pub use normalize::{Co2Lookup, NormalizedMetrics, ProjectionShape, normalize_metrics, normalize_projections};
pub use placeholder::{placeholder_projections, placeholder_reading};
pub use upstream::{MetricsRequest, PredictionService, ProjectionsRequest, UpstreamClient};
