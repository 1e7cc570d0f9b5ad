pub mod frame;
pub mod gpu;
pub mod hit;
pub mod instances;
pub mod paint;

pub use frame::{FrameScheduler, FrameTick, SelectionTransition};
pub use gpu::VertexMarkerRenderer;
pub use hit::{HitTarget, hit_test};
pub use instances::{
    MarkerFrame, MarkerFrameBuilder, MarkerPalette, MarkerState, VertexInstance, VertexVisual, ring_rgba,
};
pub use paint::{
    MarkerShape, OutlineTheme, Overlay, PaintInput, displayed_points, marker_shapes, paint_markers, paint_polygons,
    selected_path,
};
