//! Transient interaction state.
//!
//! Nothing here is persisted or recorded in history. `clear` discards all
//! of it at once, which is what Escape and mode switches rely on.

use crate::vertex::DragState;
use seg_core::id::PolygonId;
use seg_core::model::Point;
use seg_render::HitTarget;
use smallvec::SmallVec;

/// Background or middle-button pan in progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanState {
    /// Last pointer position in screen space.
    pub last: Point,
}

/// Slice line placement.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SliceGesture {
    pub start: Option<Point>,
    /// Live end of the preview line (follows the pointer).
    pub preview: Option<Point>,
}

/// AddPoints start vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub polygon: PolygonId,
    pub index: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Interaction {
    pub drag: Option<DragState>,
    pub pan: Option<PanState>,
    pub slice: SliceGesture,
    /// Points of the polygon being created, or of the AddPoints sequence.
    pub pending: SmallVec<[Point; 8]>,
    pub anchor: Option<Anchor>,
    pub hover: HitTarget,
    /// Last pointer position in world space.
    pub cursor: Option<Point>,
    /// Shift is held (add-point affordance).
    pub shift_held: bool,
}

impl Interaction {
    /// Drop every transient except hover/cursor/modifier tracking.
    pub fn clear(&mut self) {
        self.drag = None;
        self.pan = None;
        self.slice = SliceGesture::default();
        self.pending.clear();
        self.anchor = None;
    }

    /// No multi-step gesture is in progress.
    pub fn is_idle(&self) -> bool {
        self.drag.is_none()
            && self.pan.is_none()
            && self.slice.start.is_none()
            && self.pending.is_empty()
            && self.anchor.is_none()
    }

    /// The slice preview line, when a first point is placed.
    pub fn slice_line(&self) -> Option<(Point, Point)> {
        let start = self.slice.start?;
        Some((start, self.slice.preview.or(self.cursor).unwrap_or(start)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn clear_leaves_nothing_behind() {
        let mut i = Interaction {
            slice: SliceGesture {
                start: Some(Point::new(1.0, 1.0)),
                preview: Some(Point::new(2.0, 2.0)),
            },
            pending: smallvec![Point::new(0.0, 0.0)],
            anchor: Some(Anchor {
                polygon: PolygonId::intern("ix_a"),
                index: 0,
            }),
            shift_held: true,
            ..Default::default()
        };
        assert!(!i.is_idle());
        i.clear();
        assert!(i.is_idle());
        assert!(i.slice_line().is_none());
        assert!(i.shift_held, "modifier tracking survives");
    }
}
