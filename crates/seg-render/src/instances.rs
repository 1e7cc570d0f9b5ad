//! Per-frame vertex marker instances.
//!
//! Only the selected polygon contributes markers. Each visible vertex
//! becomes one `VertexInstance`; off-screen vertices are culled against the
//! visible world rectangle before the buffer is built. The marker radius is
//! not stored per instance: it is evaluated once per frame from the zoom
//! and shipped in `FrameUniforms`, and instances only carry a scale factor.

use bytemuck::{Pod, Zeroable};
use kurbo::Vec2;
use seg_core::model::Polygon;
use seg_core::transform::{Transform, Viewport};
use seg_core::EditorConfig;

// ─── Visual states ───────────────────────────────────────────────────────

/// The four marker looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u32)]
pub enum VertexVisual {
    #[default]
    Normal = 0,
    Hovered = 1,
    Selected = 2,
    Dragging = 3,
}

impl VertexVisual {
    pub const ALL: [VertexVisual; 4] = [Self::Normal, Self::Hovered, Self::Selected, Self::Dragging];

    pub fn from_u32(v: u32) -> Self {
        match v {
            1 => Self::Hovered,
            2 => Self::Selected,
            3 => Self::Dragging,
            _ => Self::Normal,
        }
    }
}

/// RGBA colors (linear 0..1) for each marker state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerPalette {
    pub normal: [f32; 4],
    pub hovered: [f32; 4],
    pub selected: [f32; 4],
    pub dragging: [f32; 4],
    /// Ring drawn around every marker.
    pub outline: [f32; 4],
}

impl MarkerPalette {
    pub fn light() -> Self {
        Self {
            normal: [1.0, 1.0, 1.0, 1.0],
            hovered: [0.38, 0.65, 0.98, 1.0],
            selected: [0.23, 0.51, 0.96, 1.0],
            dragging: [0.98, 0.75, 0.14, 1.0],
            outline: [0.15, 0.39, 0.92, 1.0],
        }
    }

    pub fn dark() -> Self {
        Self {
            normal: [0.12, 0.16, 0.23, 1.0],
            hovered: [0.58, 0.77, 0.99, 1.0],
            selected: [0.38, 0.65, 0.98, 1.0],
            dragging: [0.99, 0.83, 0.30, 1.0],
            outline: [0.58, 0.77, 0.99, 1.0],
        }
    }

    pub fn color(&self, visual: VertexVisual) -> [f32; 4] {
        match visual {
            VertexVisual::Normal => self.normal,
            VertexVisual::Hovered => self.hovered,
            VertexVisual::Selected => self.selected,
            VertexVisual::Dragging => self.dragging,
        }
    }
}

/// Ring color around a marker of state `visual` filled with `fill`. Kept
/// in step with `fs_main` in the marker shader.
pub fn ring_rgba(visual: VertexVisual, fill: [f32; 4]) -> [f32; 4] {
    match visual {
        VertexVisual::Normal => [0.15, 0.39, 0.92, 1.0],
        VertexVisual::Dragging => [1.0, 1.0, 1.0, 1.0],
        VertexVisual::Hovered | VertexVisual::Selected => [fill[0] * 0.55, fill[1] * 0.55, fill[2] * 0.55, fill[3]],
    }
}

impl Default for MarkerPalette {
    fn default() -> Self {
        Self::light()
    }
}

// ─── GPU layouts ─────────────────────────────────────────────────────────

/// One marker. 8 floats = 32 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct VertexInstance {
    /// World-space center.
    pub position: [f32; 2],
    /// Multiplier on the per-frame radius (hover / drag emphasis).
    pub scale: f32,
    /// `VertexVisual` discriminant.
    pub state: u32,
    pub color: [f32; 4],
}

impl VertexInstance {
    pub const STRIDE_BYTES: u64 = std::mem::size_of::<Self>() as u64;

    pub fn visual(&self) -> VertexVisual {
        VertexVisual::from_u32(self.state)
    }
}

/// Uniforms shared by every instance in a frame. 8 floats = 32 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct FrameUniforms {
    pub viewport: [f32; 2],
    pub translate: [f32; 2],
    pub zoom: f32,
    /// Marker radius in screen pixels for this zoom.
    pub radius_px: f32,
    pub outline: [f32; 2],
}

impl FrameUniforms {
    pub fn new(transform: &Transform, viewport: Viewport, config: &EditorConfig) -> Self {
        Self {
            viewport: [viewport.width as f32, viewport.height as f32],
            translate: [transform.translate_x as f32, transform.translate_y as f32],
            zoom: transform.zoom() as f32,
            radius_px: config.markers.screen_radius(transform.zoom()) as f32,
            outline: [1.5, 0.0],
        }
    }
}

// ─── Frame building ──────────────────────────────────────────────────────

/// Interaction state that decides per-vertex visuals.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MarkerState {
    pub hovered: Option<usize>,
    /// Anchor vertex (AddPoints) or otherwise highlighted vertex.
    pub selected: Option<usize>,
    /// Vertex being dragged and its offset from the stored position.
    pub dragging: Option<(usize, Vec2)>,
}

impl MarkerState {
    pub fn visual(&self, index: usize) -> VertexVisual {
        if self.dragging.is_some_and(|(i, _)| i == index) {
            VertexVisual::Dragging
        } else if self.selected == Some(index) {
            VertexVisual::Selected
        } else if self.hovered == Some(index) {
            VertexVisual::Hovered
        } else {
            VertexVisual::Normal
        }
    }
}

/// The instance list and uniforms for one frame.
#[derive(Debug, Clone, Default)]
pub struct MarkerFrame {
    pub instances: Vec<VertexInstance>,
    pub uniforms: FrameUniforms,
    /// Vertices skipped by viewport culling.
    pub culled: usize,
}

impl MarkerFrame {
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

/// Reuses its instance allocation across frames.
#[derive(Debug, Default)]
pub struct MarkerFrameBuilder {
    pub palette: MarkerPalette,
    frame: MarkerFrame,
}

impl MarkerFrameBuilder {
    pub fn new(palette: MarkerPalette) -> Self {
        Self {
            palette,
            frame: MarkerFrame::default(),
        }
    }

    /// Rebuild the frame for `selected` (or clear it when nothing is selected).
    pub fn build(
        &mut self,
        selected: Option<&Polygon>,
        state: &MarkerState,
        transform: &Transform,
        viewport: Viewport,
        config: &EditorConfig,
    ) -> &MarkerFrame {
        let frame = &mut self.frame;
        frame.instances.clear();
        frame.culled = 0;
        frame.uniforms = FrameUniforms::new(transform, viewport, config);

        let Some(polygon) = selected else {
            return &self.frame;
        };
        let visible = transform.visible_world_rect(viewport, config.cull_margin_px);
        for (index, point) in polygon.points().iter().enumerate() {
            let visual = state.visual(index);
            let position = match state.dragging {
                Some((i, offset)) if i == index => point.offset(offset),
                _ => *point,
            };
            // The dragged vertex is always drawn, even past the edge.
            if visual != VertexVisual::Dragging && !visible.contains(position.to_kurbo()) {
                frame.culled += 1;
                continue;
            }
            let scale = match visual {
                VertexVisual::Hovered => config.markers.hover_scale,
                VertexVisual::Dragging => config.markers.drag_scale,
                VertexVisual::Normal | VertexVisual::Selected => 1.0,
            };
            frame.instances.push(VertexInstance {
                position: [position.x as f32, position.y as f32],
                scale: scale as f32,
                state: visual as u32,
                color: self.palette.color(visual),
            });
        }
        log::trace!(
            "markers: {} instances, {} culled for {}",
            frame.instances.len(),
            frame.culled,
            polygon.id
        );
        &self.frame
    }

    pub fn frame(&self) -> &MarkerFrame {
        &self.frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seg_core::id::PolygonId;
    use seg_core::model::{Point, PolygonKind};

    fn polygon() -> Polygon {
        Polygon::new(
            PolygonId::intern("inst_poly"),
            vec![
                Point::new(10.0, 10.0),
                Point::new(200.0, 10.0),
                Point::new(5000.0, 5000.0),
                Point::new(10.0, 200.0),
            ],
            PolygonKind::External,
        )
    }

    #[test]
    fn instance_layout_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<VertexInstance>(), 32);
        assert_eq!(std::mem::size_of::<FrameUniforms>(), 32);
    }

    #[test]
    fn offscreen_vertices_are_culled() {
        let config = EditorConfig::default();
        let mut builder = MarkerFrameBuilder::default();
        let poly = polygon();
        let frame = builder.build(
            Some(&poly),
            &MarkerState::default(),
            &Transform::default(),
            Viewport::default(),
            &config,
        );
        assert_eq!(frame.len(), 3);
        assert_eq!(frame.culled, 1);
    }

    #[test]
    fn no_selection_means_no_markers() {
        let config = EditorConfig::default();
        let mut builder = MarkerFrameBuilder::default();
        let frame = builder.build(
            None,
            &MarkerState::default(),
            &Transform::default(),
            Viewport::default(),
            &config,
        );
        assert!(frame.is_empty());
    }

    #[test]
    fn states_map_to_visuals_and_scales() {
        let config = EditorConfig::default();
        let mut builder = MarkerFrameBuilder::default();
        let poly = polygon();
        let state = MarkerState {
            hovered: Some(1),
            selected: Some(3),
            dragging: Some((0, Vec2::new(5.0, -2.0))),
        };
        let frame = builder.build(
            Some(&poly),
            &state,
            &Transform::default(),
            Viewport::default(),
            &config,
        );
        let visuals: Vec<VertexVisual> = frame.instances.iter().map(VertexInstance::visual).collect();
        assert_eq!(
            visuals,
            vec![VertexVisual::Dragging, VertexVisual::Hovered, VertexVisual::Selected]
        );
        assert_eq!(frame.instances[0].position, [15.0, 8.0]);
        assert_eq!(frame.instances[0].scale, config.markers.drag_scale as f32);
        assert_eq!(frame.instances[1].scale, config.markers.hover_scale as f32);
    }

    #[test]
    fn radius_is_a_frame_uniform() {
        let config = EditorConfig::default();
        let mut t = Transform::default();
        t.zoom_at(8.0, Point::new(0.0, 0.0));
        let u = FrameUniforms::new(&t, Viewport::default(), &config);
        assert_eq!(u.radius_px, config.markers.screen_radius(8.0) as f32);
    }
}
