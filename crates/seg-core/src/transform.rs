//! World ↔ screen coordinate mapping.
//!
//! `screen = world * zoom + translate`. Zoom changes are fixed-point: the
//! world point under the cursor stays under the cursor.

use crate::config::ZoomLimits;
use crate::model::Point;
use kurbo::{Affine, Rect, Vec2};

/// Canvas viewport dimensions in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

impl Viewport {
    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Zoom + pan state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    zoom: f64,
    pub translate_x: f64,
    pub translate_y: f64,
    limits: ZoomLimits,
}

impl Default for Transform {
    fn default() -> Self {
        Self::new(ZoomLimits::default())
    }
}

impl Transform {
    pub fn new(limits: ZoomLimits) -> Self {
        Self {
            zoom: 1.0_f64.clamp(limits.min, limits.max),
            translate_x: 0.0,
            translate_y: 0.0,
            limits,
        }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn limits(&self) -> ZoomLimits {
        self.limits
    }

    pub fn translate(&self) -> Vec2 {
        Vec2::new(self.translate_x, self.translate_y)
    }

    pub fn world_to_screen(&self, p: Point) -> Point {
        Point::new(
            p.x * self.zoom + self.translate_x,
            p.y * self.zoom + self.translate_y,
        )
    }

    pub fn screen_to_world(&self, p: Point) -> Point {
        Point::new(
            (p.x - self.translate_x) / self.zoom,
            (p.y - self.translate_y) / self.zoom,
        )
    }

    /// Convert a screen-space length to world units.
    pub fn screen_len_to_world(&self, len: f64) -> f64 {
        len / self.zoom
    }

    /// Set the zoom keeping `anchor` (screen space) stationary.
    /// Returns `false` when the clamped zoom did not change.
    pub fn zoom_at(&mut self, new_zoom: f64, anchor: Point) -> bool {
        if !new_zoom.is_finite() || new_zoom <= 0.0 {
            return false;
        }
        let clamped = new_zoom.clamp(self.limits.min, self.limits.max);
        if (clamped - self.zoom).abs() <= f64::EPSILON * self.zoom {
            return false;
        }
        let world = self.screen_to_world(anchor);
        self.zoom = clamped;
        self.translate_x = anchor.x - world.x * clamped;
        self.translate_y = anchor.y - world.y * clamped;
        true
    }

    /// Multiply the zoom by `factor` around `anchor`.
    pub fn zoom_by(&mut self, factor: f64, anchor: Point) -> bool {
        self.zoom_at(self.zoom * factor, anchor)
    }

    /// One wheel notch in (`steps > 0`) or out.
    pub fn zoom_step(&mut self, steps: f64, anchor: Point) -> bool {
        self.zoom_by(self.limits.step.powf(steps), anchor)
    }

    /// Pan by a screen-space delta.
    pub fn pan_by(&mut self, delta: Vec2) {
        self.translate_x += delta.x;
        self.translate_y += delta.y;
    }

    pub fn set_translate(&mut self, x: f64, y: f64) {
        self.translate_x = x;
        self.translate_y = y;
    }

    /// Frame `world` inside the viewport with `padding` screen pixels on each side.
    pub fn fit_to_bounds(&mut self, world: Rect, viewport: Viewport, padding: f64) {
        if world.width() <= 0.0 || world.height() <= 0.0 {
            return;
        }
        let avail_w = (viewport.width - padding * 2.0).max(1.0);
        let avail_h = (viewport.height - padding * 2.0).max(1.0);
        let zoom = (avail_w / world.width())
            .min(avail_h / world.height())
            .clamp(self.limits.min, self.limits.max);
        self.zoom = zoom;
        let center = world.center();
        self.translate_x = viewport.width / 2.0 - center.x * zoom;
        self.translate_y = viewport.height / 2.0 - center.y * zoom;
    }

    /// The world-space rectangle visible in `viewport`, grown by `margin_px`.
    pub fn visible_world_rect(&self, viewport: Viewport, margin_px: f64) -> Rect {
        let tl = self.screen_to_world(Point::new(-margin_px, -margin_px));
        let br = self.screen_to_world(Point::new(
            viewport.width + margin_px,
            viewport.height + margin_px,
        ));
        Rect::new(tl.x, tl.y, br.x, br.y)
    }

    /// World → screen as a kurbo affine (for Vello paths).
    pub fn to_affine(&self) -> Affine {
        Affine::new([
            self.zoom,
            0.0,
            0.0,
            self.zoom,
            self.translate_x,
            self.translate_y,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
    }

    #[test]
    fn roundtrip_world_screen() {
        let mut t = Transform::default();
        t.zoom_at(3.7, Point::new(120.0, 45.0));
        t.pan_by(Vec2::new(-33.0, 12.5));
        for p in [
            Point::new(0.0, 0.0),
            Point::new(1234.5, -98.25),
            Point::new(-0.001, 7e4),
        ] {
            assert!(close(t.screen_to_world(t.world_to_screen(p)), p));
            assert!(close(t.world_to_screen(t.screen_to_world(p)), p));
        }
    }

    #[test]
    fn zoom_keeps_cursor_point_fixed() {
        let mut t = Transform::default();
        t.pan_by(Vec2::new(40.0, -20.0));
        let cursor = Point::new(300.0, 200.0);
        let under = t.screen_to_world(cursor);
        assert!(t.zoom_by(2.5, cursor));
        assert!(close(t.world_to_screen(under), cursor));
    }

    #[test]
    fn zoom_is_clamped() {
        let mut t = Transform::new(ZoomLimits {
            min: 0.5,
            max: 4.0,
            step: 1.2,
        });
        t.zoom_at(100.0, Point::new(0.0, 0.0));
        assert_eq!(t.zoom(), 4.0);
        assert!(!t.zoom_at(50.0, Point::new(0.0, 0.0)), "already at max");
        t.zoom_at(0.01, Point::new(0.0, 0.0));
        assert_eq!(t.zoom(), 0.5);
        assert!(!t.zoom_at(-1.0, Point::new(0.0, 0.0)));
    }

    #[test]
    fn visible_rect_tracks_pan_and_zoom() {
        let mut t = Transform::default();
        t.zoom_at(2.0, Point::new(0.0, 0.0));
        t.pan_by(Vec2::new(-100.0, -50.0));
        let rect = t.visible_world_rect(Viewport::default(), 0.0);
        assert!((rect.x0 - 50.0).abs() < 1e-9);
        assert!((rect.y0 - 25.0).abs() < 1e-9);
        assert!((rect.width() - 400.0).abs() < 1e-9);
    }

    #[test]
    fn fit_to_bounds_centers_content() {
        let mut t = Transform::default();
        let viewport = Viewport::default();
        t.fit_to_bounds(Rect::new(0.0, 0.0, 100.0, 100.0), viewport, 50.0);
        let center = t.world_to_screen(Point::new(50.0, 50.0));
        assert!(close(center, viewport.center()));
        assert!((t.zoom() - 5.0).abs() < 1e-9);
    }
}
