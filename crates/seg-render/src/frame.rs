//! Frame pacing and selection transitions.
//!
//! The host owns the actual display-refresh callback
//! (`requestAnimationFrame` in the browser). `FrameScheduler` decides when
//! a callback is needed and coalesces pointer moves so that state is
//! updated at most once per frame, with the latest sample.

use seg_core::id::PolygonId;
use seg_core::model::Point;

/// What the host should process in a frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTick {
    /// Latest pointer position received since the previous frame.
    pub pointer: Option<Point>,
    pub time_ms: f64,
}

#[derive(Debug, Default)]
pub struct FrameScheduler {
    pending_pointer: Option<Point>,
    requested: bool,
    cancelled: bool,
    frames: u64,
    coalesced: u64,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a pointer move. Returns `true` when the host has to schedule a
    /// frame callback (none is pending yet).
    pub fn queue_pointer_move(&mut self, pointer: Point) -> bool {
        if self.pending_pointer.replace(pointer).is_some() {
            self.coalesced += 1;
        }
        self.request_frame()
    }

    /// Ask for a redraw. Returns `true` only for the first request in a frame.
    pub fn request_frame(&mut self) -> bool {
        if self.cancelled || self.requested {
            return false;
        }
        self.requested = true;
        true
    }

    /// Take the queued pointer move ahead of the frame callback, so a
    /// press or release is handled at the latest pointer position.
    pub fn take_pointer(&mut self) -> Option<Point> {
        self.pending_pointer.take()
    }

    pub fn is_requested(&self) -> bool {
        self.requested
    }

    /// Called from the refresh callback. `None` after `cancel`.
    pub fn begin_frame(&mut self, time_ms: f64) -> Option<FrameTick> {
        if self.cancelled {
            return None;
        }
        self.requested = false;
        self.frames += 1;
        Some(FrameTick {
            pointer: self.pending_pointer.take(),
            time_ms,
        })
    }

    /// Stop scheduling for good (editor teardown).
    pub fn cancel(&mut self) {
        self.cancelled = true;
        self.requested = false;
        self.pending_pointer = None;
        log::debug!(
            "frame scheduler cancelled after {} frames ({} pointer moves coalesced)",
            self.frames,
            self.coalesced
        );
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }
}

// ─── Selection fade ──────────────────────────────────────────────────────

/// Fade-in of the selection highlight.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SelectionTransition {
    target: Option<PolygonId>,
    start_ms: f64,
    duration_ms: f64,
}

impl SelectionTransition {
    /// Animate towards `target` starting at `now_ms`.
    pub fn start(&mut self, target: Option<PolygonId>, now_ms: f64, duration_ms: f64) {
        self.target = target;
        self.start_ms = now_ms;
        self.duration_ms = duration_ms.max(0.0);
    }

    /// Jump straight to `target` (undo/redo).
    pub fn snap(&mut self, target: Option<PolygonId>) {
        self.target = target;
        self.duration_ms = 0.0;
    }

    pub fn target(&self) -> Option<PolygonId> {
        self.target
    }

    /// Highlight opacity at `now_ms`, eased.
    pub fn alpha(&self, now_ms: f64) -> f64 {
        if self.duration_ms <= 0.0 {
            return 1.0;
        }
        let t = ((now_ms - self.start_ms) / self.duration_ms).clamp(0.0, 1.0);
        // ease-out cubic
        1.0 - (1.0 - t).powi(3)
    }

    pub fn is_animating(&self, now_ms: f64) -> bool {
        self.duration_ms > 0.0 && now_ms - self.start_ms < self.duration_ms
    }
}
