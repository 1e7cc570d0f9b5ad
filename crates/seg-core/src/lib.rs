pub mod config;
pub mod error;
pub mod geometry;
pub mod handoff;
pub mod id;
pub mod ingest;
pub mod model;
pub mod slice;
pub mod transform;

pub use config::{EditorConfig, MarkerConfig, ZoomLimits};
pub use error::{ConfigError, IngestError, SliceError, VertexError};
pub use id::PolygonId;
pub use ingest::{IngestDiagnostic, IngestReport, RawPoint, RawPolygon, ingest, ingest_json};
pub use model::*;
pub use slice::{slice_polygon, slice_ring};
pub use transform::{Transform, Viewport};

// Re-export kurbo so downstream crates share one geometry version
pub use kurbo;
