//! Polygon set → Vello drawing commands.
//!
//! Outlines are painted in screen space (points pre-transformed) so stroke
//! widths stay constant while zooming. Unselected polygons are outline-only;
//! the selected polygon gets a translucent fill that fades in. The vector
//! marker path draws a `MarkerFrame` with the same four visual states as the
//! GPU path and is used whenever the GPU renderer is unavailable.

use crate::instances::{MarkerFrame, VertexVisual, ring_rgba};
use kurbo::{Affine, BezPath, Circle, Line, Rect, Stroke, Vec2};
use peniko::{Color, Fill};
use seg_core::id::PolygonId;
use seg_core::model::{Point, Polygon, PolygonKind, PolygonSet};
use seg_core::transform::{Transform, Viewport};
use vello::Scene;

/// Colors for outlines and in-progress gestures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlineTheme {
    pub external: Color,
    pub internal: Color,
    pub selected_stroke: Color,
    pub selected_fill: Color,
    pub slice_line: Color,
    pub pending: Color,
    pub stroke_width: f64,
}

impl OutlineTheme {
    pub fn light() -> Self {
        Self {
            external: Color::from_rgba8(0x16, 0xA3, 0x4A, 0xFF),
            internal: Color::from_rgba8(0xDC, 0x26, 0x26, 0xFF),
            selected_stroke: Color::from_rgba8(0x25, 0x63, 0xEB, 0xFF),
            selected_fill: Color::from_rgba8(0x3B, 0x82, 0xF6, 0x40),
            slice_line: Color::from_rgba8(0xF5, 0x9E, 0x0B, 0xFF),
            pending: Color::from_rgba8(0x7C, 0x3A, 0xED, 0xFF),
            stroke_width: 1.5,
        }
    }

    pub fn dark() -> Self {
        Self {
            external: Color::from_rgba8(0x4A, 0xDE, 0x80, 0xFF),
            internal: Color::from_rgba8(0xF8, 0x71, 0x71, 0xFF),
            selected_stroke: Color::from_rgba8(0x60, 0xA5, 0xFA, 0xFF),
            selected_fill: Color::from_rgba8(0x60, 0xA5, 0xFA, 0x40),
            slice_line: Color::from_rgba8(0xFB, 0xBF, 0x24, 0xFF),
            pending: Color::from_rgba8(0xA7, 0x8B, 0xFA, 0xFF),
            stroke_width: 1.5,
        }
    }
}

impl Default for OutlineTheme {
    fn default() -> Self {
        Self::light()
    }
}

/// Transient gesture geometry drawn above the polygons (world space).
#[derive(Debug, Clone, Copy, Default)]
pub struct Overlay<'a> {
    /// Slice line from the first placed point to the second point or the cursor.
    pub slice_line: Option<(Point, Point)>,
    /// Points placed so far in CreatePolygon / AddPoints.
    pub pending_points: &'a [Point],
    /// Where the next pending segment would end.
    pub cursor: Option<Point>,
    /// Closing the in-progress polygon is one click away.
    pub close_hint: bool,
    /// Shift-hover add-point affordance on a vertex.
    pub add_point_hint: Option<Point>,
}

/// Everything one outline pass needs.
#[derive(Debug, Clone, Copy)]
pub struct PaintInput<'a> {
    pub set: &'a PolygonSet,
    pub selected: Option<PolygonId>,
    /// Selection highlight opacity in `0.0..=1.0`.
    pub selection_alpha: f64,
    pub transform: &'a Transform,
    pub viewport: Viewport,
    pub cull_margin_px: f64,
    /// Vertex of the selected polygon being dragged, with its live offset.
    pub drag: Option<(usize, Vec2)>,
    pub overlay: Overlay<'a>,
}

/// Paint polygons and gesture overlays. Call once per frame with a cleared `Scene`.
pub fn paint_polygons(scene: &mut Scene, input: &PaintInput<'_>, theme: &OutlineTheme) {
    let visible = input
        .transform
        .visible_world_rect(input.viewport, input.cull_margin_px);
    let stroke = Stroke::new(theme.stroke_width);

    for poly in input.set.iter() {
        if poly.bounds().is_none_or(|b| !overlaps(b, visible)) {
            continue;
        }
        if Some(poly.id) == input.selected {
            continue;
        }
        let path = screen_path(poly.points().iter().copied(), input.transform, true);
        let color = match poly.kind {
            PolygonKind::External => theme.external,
            PolygonKind::Internal => theme.internal,
        };
        scene.stroke(&stroke, Affine::IDENTITY, color, None, &path);
    }

    // Selected polygon last so it sits above its neighbours.
    if let Some(path) = selected_path(input) {
        paint_selected(scene, &path, input, theme);
    }

    paint_overlay(scene, &input.overlay, input.transform, theme);
}

/// Screen-space outline of the selected polygon, following a drag in progress.
pub fn selected_path(input: &PaintInput<'_>) -> Option<BezPath> {
    let poly = input.selected.and_then(|id| input.set.get(id))?;
    Some(screen_path(displayed_points(poly, input.drag), input.transform, true))
}

/// Ring as drawn this frame: the dragged vertex sits at its live position.
pub fn displayed_points(poly: &Polygon, drag: Option<(usize, Vec2)>) -> impl Iterator<Item = Point> + '_ {
    poly.points().iter().enumerate().map(move |(i, p)| match drag {
        Some((index, offset)) if index == i => p.offset(offset),
        _ => *p,
    })
}

fn paint_selected(scene: &mut Scene, path: &BezPath, input: &PaintInput<'_>, theme: &OutlineTheme) {
    let alpha = input.selection_alpha.clamp(0.0, 1.0) as f32;
    let fill = theme.selected_fill.multiply_alpha(alpha);
    scene.fill(Fill::NonZero, Affine::IDENTITY, fill, None, path);
    let stroke = Stroke::new(theme.stroke_width * 1.5);
    scene.stroke(&stroke, Affine::IDENTITY, theme.selected_stroke, None, path);
}

fn paint_overlay(scene: &mut Scene, overlay: &Overlay<'_>, transform: &Transform, theme: &OutlineTheme) {
    let dashed = Stroke::new(theme.stroke_width).with_dashes(0.0, [6.0, 4.0]);

    if let Some((a, b)) = overlay.slice_line {
        let line = Line::new(
            transform.world_to_screen(a).to_kurbo(),
            transform.world_to_screen(b).to_kurbo(),
        );
        scene.stroke(&dashed, Affine::IDENTITY, theme.slice_line, None, &line);
        for end in [line.p0, line.p1] {
            scene.fill(Fill::NonZero, Affine::IDENTITY, theme.slice_line, None, &Circle::new(end, 4.0));
        }
    }

    if !overlay.pending_points.is_empty() {
        let mut path = screen_path(overlay.pending_points.iter().copied(), transform, false);
        if let Some(cursor) = overlay.cursor {
            path.line_to(transform.world_to_screen(cursor).to_kurbo());
        }
        scene.stroke(&dashed, Affine::IDENTITY, theme.pending, None, &path);
        for (i, p) in overlay.pending_points.iter().enumerate() {
            let center = transform.world_to_screen(*p).to_kurbo();
            let radius = if i == 0 && overlay.close_hint { 6.0 } else { 3.5 };
            scene.fill(Fill::NonZero, Affine::IDENTITY, theme.pending, None, &Circle::new(center, radius));
        }
    }

    if let Some(p) = overlay.add_point_hint {
        let center = transform.world_to_screen(p).to_kurbo();
        let plus = Stroke::new(2.0);
        scene.stroke(
            &plus,
            Affine::IDENTITY,
            theme.pending,
            None,
            &Line::new((center.x - 5.0, center.y - 12.0), (center.x + 5.0, center.y - 12.0)),
        );
        scene.stroke(
            &plus,
            Affine::IDENTITY,
            theme.pending,
            None,
            &Line::new((center.x, center.y - 17.0), (center.x, center.y - 7.0)),
        );
    }
}

/// One vector marker: the instance resolved to screen space and colors.
#[derive(Debug, Clone, Copy)]
pub struct MarkerShape {
    pub circle: Circle,
    pub fill: Color,
    pub ring: Color,
    pub visual: VertexVisual,
}

/// Screen-space shapes for every instance of `frame`.
pub fn marker_shapes(frame: &MarkerFrame) -> impl Iterator<Item = MarkerShape> + '_ {
    let u = &frame.uniforms;
    frame.instances.iter().map(move |inst| {
        let center = kurbo::Point::new(
            inst.position[0] as f64 * u.zoom as f64 + u.translate[0] as f64,
            inst.position[1] as f64 * u.zoom as f64 + u.translate[1] as f64,
        );
        let visual = inst.visual();
        MarkerShape {
            circle: Circle::new(center, (u.radius_px * inst.scale) as f64),
            fill: Color::new(inst.color),
            ring: ring_color(visual, inst.color),
            visual,
        }
    })
}

/// Vector fallback for vertex markers: same instances, same states.
pub fn paint_markers(scene: &mut Scene, frame: &MarkerFrame) {
    let ring = Stroke::new(frame.uniforms.outline[0] as f64);
    for shape in marker_shapes(frame) {
        scene.fill(Fill::NonZero, Affine::IDENTITY, shape.fill, None, &shape.circle);
        scene.stroke(&ring, Affine::IDENTITY, shape.ring, None, &shape.circle);
    }
}

/// Ring color per state; matches the marker shader.
pub fn ring_color(visual: VertexVisual, fill: [f32; 4]) -> Color {
    Color::new(ring_rgba(visual, fill))
}

// ─── Helpers ─────────────────────────────────────────────────────────────

fn screen_path(points: impl IntoIterator<Item = Point>, transform: &Transform, closed: bool) -> BezPath {
    let mut path = BezPath::new();
    let mut iter = points.into_iter().map(|p| transform.world_to_screen(p).to_kurbo());
    if let Some(first) = iter.next() {
        path.move_to(first);
        for p in iter {
            path.line_to(p);
        }
        if closed {
            path.close_path();
        }
    }
    path
}

fn overlaps(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && a.x1 >= b.x0 && a.y0 <= b.y1 && a.y1 >= b.y0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instances::{MarkerFrameBuilder, MarkerPalette, MarkerState};
    use seg_core::config::EditorConfig;

    #[test]
    fn screen_path_applies_transform() {
        let mut t = Transform::default();
        t.zoom_at(2.0, Point::new(0.0, 0.0));
        t.pan_by(kurbo::Vec2::new(10.0, 0.0));
        let path = screen_path([Point::new(1.0, 1.0), Point::new(3.0, 1.0)], &t, false);
        let bbox = kurbo::Shape::bounding_box(&path);
        assert_eq!(bbox, Rect::new(12.0, 2.0, 16.0, 2.0));
    }

    #[test]
    fn overlap_is_inclusive() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(overlaps(a, Rect::new(10.0, 10.0, 20.0, 20.0)));
        assert!(!overlaps(a, Rect::new(10.5, 0.0, 20.0, 20.0)));
    }

    fn square(id: &str, x: f64) -> Polygon {
        Polygon::new(
            PolygonId::intern(id),
            vec![
                Point::new(x, 0.0),
                Point::new(x + 10.0, 0.0),
                Point::new(x + 10.0, 10.0),
                Point::new(x, 10.0),
            ],
            PolygonKind::External,
        )
    }

    fn input<'a>(set: &'a PolygonSet, transform: &'a Transform, selected: Option<&str>) -> PaintInput<'a> {
        PaintInput {
            set,
            selected: selected.map(PolygonId::intern),
            selection_alpha: 1.0,
            transform,
            viewport: Viewport::default(),
            cull_margin_px: 24.0,
            drag: None,
            overlay: Overlay::default(),
        }
    }

    #[test]
    fn selected_outline_follows_the_dragged_vertex() {
        let mut set = PolygonSet::new();
        set.insert(square("paint_drag", 0.0));
        let t = Transform::default();
        let mut input = input(&set, &t, Some("paint_drag"));

        let at_rest = selected_path(&input).unwrap();
        assert_eq!(kurbo::Shape::bounding_box(&at_rest), Rect::new(0.0, 0.0, 10.0, 10.0));

        input.drag = Some((2, Vec2::new(5.0, 5.0)));
        let dragging = selected_path(&input).unwrap();
        assert_eq!(kurbo::Shape::bounding_box(&dragging), Rect::new(0.0, 0.0, 15.0, 15.0));
        let corner = dragging.elements()[2].end_point();
        assert_eq!(corner, Some(kurbo::Point::new(15.0, 15.0)));
    }

    #[test]
    fn unselected_polygons_are_a_single_stroke() {
        let mut set = PolygonSet::new();
        set.insert(square("paint_a", 0.0));
        set.insert(square("paint_b", 20.0));
        let t = Transform::default();
        let theme = OutlineTheme::light();

        let mut scene = Scene::new();
        paint_polygons(&mut scene, &input(&set, &t, None), &theme);
        assert_eq!(scene.encoding().n_paths, 2);

        // The selected one adds its fill on top of the stroke.
        let mut scene = Scene::new();
        paint_polygons(&mut scene, &input(&set, &t, Some("paint_b")), &theme);
        assert_eq!(scene.encoding().n_paths, 3);
    }

    #[test]
    fn vector_markers_cover_all_four_states() {
        let config = EditorConfig::default();
        let mut builder = MarkerFrameBuilder::new(MarkerPalette::light());
        let poly = square("paint_markers", 0.0);
        let state = MarkerState {
            hovered: Some(1),
            selected: Some(3),
            dragging: Some((0, Vec2::new(2.0, 0.0))),
        };
        let frame = builder.build(Some(&poly), &state, &Transform::default(), Viewport::default(), &config);

        let shapes: Vec<MarkerShape> = marker_shapes(frame).collect();
        let visuals: Vec<VertexVisual> = shapes.iter().map(|s| s.visual).collect();
        assert_eq!(
            visuals,
            [
                VertexVisual::Dragging,
                VertexVisual::Hovered,
                VertexVisual::Normal,
                VertexVisual::Selected
            ]
        );
        for shape in &shapes {
            let fill = MarkerPalette::light().color(shape.visual);
            assert_eq!(shape.fill.components, fill);
            assert_eq!(shape.ring.components, ring_rgba(shape.visual, fill));
        }
        assert_eq!(shapes[0].circle.center, kurbo::Point::new(2.0, 0.0));
        assert!(shapes[0].circle.radius > shapes[2].circle.radius);

        let mut scene = Scene::new();
        paint_markers(&mut scene, frame);
        assert_eq!(scene.encoding().n_paths, 8);
    }
}

