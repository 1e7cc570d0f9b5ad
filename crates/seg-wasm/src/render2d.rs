//! Canvas2D software renderer.
//!
//! Draws the same `PaintInput` and `MarkerFrame` the Vello and wgpu paths
//! consume, through `CanvasRenderingContext2d`. Used wherever the page
//! hands us a 2D context instead of a GPU surface.

use seg_core::model::{Point, PolygonKind};
use seg_core::transform::Transform;
use seg_render::{MarkerFrame, Overlay, PaintInput, displayed_points, ring_rgba};
use web_sys::CanvasRenderingContext2d;

/// Theme-dependent colors for the canvas renderer.
pub struct CanvasTheme {
    pub bg: &'static str,
    pub external: &'static str,
    pub internal: &'static str,
    pub selected_stroke: &'static str,
    /// RGB of the selected fill; alpha comes from the fade.
    pub selected_fill: (u8, u8, u8),
    pub slice_line: &'static str,
    pub pending: &'static str,
}

impl CanvasTheme {
    /// Light theme, neutral grey behind the image.
    pub fn light() -> Self {
        Self {
            bg: "#F5F5F7",
            external: "#16A34A",
            internal: "#DC2626",
            selected_stroke: "#2563EB",
            selected_fill: (0x3B, 0x82, 0xF6),
            slice_line: "#F59E0B",
            pending: "#7C3AED",
        }
    }

    /// Dark theme.
    pub fn dark() -> Self {
        Self {
            bg: "#1C1C1E",
            external: "#4ADE80",
            internal: "#F87171",
            selected_stroke: "#60A5FA",
            selected_fill: (0x60, 0xA5, 0xFA),
            slice_line: "#FBBF24",
            pending: "#A78BFA",
        }
    }
}

const STROKE_WIDTH: f64 = 1.5;
/// Peak opacity of the selected fill once the fade completes.
const SELECTED_FILL_ALPHA: f64 = 0.25;

/// Clear the canvas and draw outlines plus gesture overlays.
pub fn render_outlines(ctx: &CanvasRenderingContext2d, input: &PaintInput<'_>, theme: &CanvasTheme) {
    ctx.set_fill_style_str(theme.bg);
    ctx.fill_rect(0.0, 0.0, input.viewport.width, input.viewport.height);

    let visible = input
        .transform
        .visible_world_rect(input.viewport, input.cull_margin_px);
    ctx.set_line_width(STROKE_WIDTH);
    ctx.set_line_join("round");

    for poly in input.set.iter() {
        let Some(b) = poly.bounds() else { continue };
        let overlaps = b.x0 <= visible.x1 && b.x1 >= visible.x0 && b.y0 <= visible.y1 && b.y1 >= visible.y0;
        if !overlaps || Some(poly.id) == input.selected {
            continue;
        }
        trace_path(ctx, poly.points().iter().copied(), input.transform, true);
        ctx.set_stroke_style_str(match poly.kind {
            PolygonKind::External => theme.external,
            PolygonKind::Internal => theme.internal,
        });
        ctx.stroke();
    }

    if let Some(poly) = input.selected.and_then(|id| input.set.get(id)) {
        let (r, g, b) = theme.selected_fill;
        let alpha = input.selection_alpha.clamp(0.0, 1.0) * SELECTED_FILL_ALPHA;
        // A vertex being dragged pulls its two edges along before release.
        trace_path(ctx, displayed_points(poly, input.drag), input.transform, true);
        ctx.set_fill_style_str(&format!("rgba({r}, {g}, {b}, {alpha:.3})"));
        ctx.fill();
        ctx.set_line_width(STROKE_WIDTH * 1.5);
        ctx.set_stroke_style_str(theme.selected_stroke);
        ctx.stroke();
    }

    render_overlay(ctx, &input.overlay, input.transform, theme);
}

fn render_overlay(ctx: &CanvasRenderingContext2d, overlay: &Overlay<'_>, transform: &Transform, theme: &CanvasTheme) {
    ctx.save();
    ctx.set_line_width(STROKE_WIDTH);
    let dash = js_sys::Array::of2(&6.0.into(), &4.0.into());

    if let Some((a, b)) = overlay.slice_line {
        let (a, b) = (transform.world_to_screen(a), transform.world_to_screen(b));
        let _ = ctx.set_line_dash(&dash);
        ctx.set_stroke_style_str(theme.slice_line);
        ctx.begin_path();
        ctx.move_to(a.x, a.y);
        ctx.line_to(b.x, b.y);
        ctx.stroke();
        ctx.set_fill_style_str(theme.slice_line);
        for end in [a, b] {
            dot(ctx, end, 4.0);
        }
    }

    if !overlay.pending_points.is_empty() {
        trace_path(ctx, overlay.pending_points.iter().copied(), transform, false);
        if let Some(cursor) = overlay.cursor {
            let c = transform.world_to_screen(cursor);
            ctx.line_to(c.x, c.y);
        }
        let _ = ctx.set_line_dash(&dash);
        ctx.set_stroke_style_str(theme.pending);
        ctx.stroke();
        ctx.set_fill_style_str(theme.pending);
        for (i, p) in overlay.pending_points.iter().enumerate() {
            let radius = if i == 0 && overlay.close_hint { 6.0 } else { 3.5 };
            dot(ctx, transform.world_to_screen(*p), radius);
        }
    }

    if let Some(p) = overlay.add_point_hint {
        let c = transform.world_to_screen(p);
        let _ = ctx.set_line_dash(&js_sys::Array::new());
        ctx.set_line_width(2.0);
        ctx.set_stroke_style_str(theme.pending);
        ctx.begin_path();
        ctx.move_to(c.x - 5.0, c.y - 12.0);
        ctx.line_to(c.x + 5.0, c.y - 12.0);
        ctx.move_to(c.x, c.y - 17.0);
        ctx.line_to(c.x, c.y - 7.0);
        ctx.stroke();
    }
    ctx.restore();
}

/// Draw vertex markers from the per-frame instances, all four states.
pub fn render_markers(ctx: &CanvasRenderingContext2d, frame: &MarkerFrame) {
    let u = &frame.uniforms;
    ctx.save();
    ctx.set_line_width(u.outline[0] as f64);
    for inst in &frame.instances {
        let x = inst.position[0] as f64 * u.zoom as f64 + u.translate[0] as f64;
        let y = inst.position[1] as f64 * u.zoom as f64 + u.translate[1] as f64;
        let radius = (u.radius_px * inst.scale) as f64;
        ctx.begin_path();
        let _ = ctx.arc(x, y, radius, 0.0, std::f64::consts::TAU);
        ctx.set_fill_style_str(&css_rgba(inst.color));
        ctx.fill();
        ctx.set_stroke_style_str(&css_rgba(ring_rgba(inst.visual(), inst.color)));
        ctx.stroke();
    }
    ctx.restore();
}

// ─── Helpers ─────────────────────────────────────────────────────────────

fn trace_path(
    ctx: &CanvasRenderingContext2d,
    points: impl IntoIterator<Item = Point>,
    transform: &Transform,
    closed: bool,
) {
    ctx.begin_path();
    for (i, p) in points.into_iter().enumerate() {
        let s = transform.world_to_screen(p);
        if i == 0 {
            ctx.move_to(s.x, s.y);
        } else {
            ctx.line_to(s.x, s.y);
        }
    }
    if closed {
        ctx.close_path();
    }
}

fn dot(ctx: &CanvasRenderingContext2d, center: Point, radius: f64) {
    ctx.begin_path();
    let _ = ctx.arc(center.x, center.y, radius, 0.0, std::f64::consts::TAU);
    ctx.fill();
}

/// `[0, 1]` RGBA → CSS `rgba(...)`.
fn css_rgba(c: [f32; 4]) -> String {
    let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!(
        "rgba({}, {}, {}, {:.3})",
        channel(c[0]),
        channel(c[1]),
        channel(c[2]),
        c[3].clamp(0.0, 1.0)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn css_rgba_scales_and_clamps() {
        assert_eq!(css_rgba([1.0, 0.0, 0.5, 1.0]), "rgba(255, 0, 128, 1.000)");
        assert_eq!(css_rgba([2.0, -1.0, 0.0, 0.25]), "rgba(255, 0, 0, 0.250)");
    }
}
