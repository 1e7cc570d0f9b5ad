//! Editor configuration.
//!
//! Every field has a default, so a host can pass a partial JSON object
//! (or nothing at all) and only override what it cares about.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

// ─── Zoom ─────────────────────────────────────────────────────────────────

/// Zoom clamp range and wheel step factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomLimits {
    pub min: f64,
    pub max: f64,
    /// Multiplicative factor per wheel notch / keyboard zoom.
    pub step: f64,
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self {
            min: 0.1,
            max: 40.0,
            step: 1.2,
        }
    }
}

// ─── Vertex markers ──────────────────────────────────────────────────────

/// The inverse power-law size curve shared by vertex hit testing and
/// vertex rendering.
///
/// `screen_radius(zoom) = clamp(base_radius_px * zoom^-exponent, min, max)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    pub base_radius_px: f64,
    pub min_radius_px: f64,
    pub max_radius_px: f64,
    pub exponent: f64,
    /// Hit region = visual radius × `hit_slop`.
    pub hit_slop: f64,
    pub hover_scale: f64,
    pub drag_scale: f64,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            base_radius_px: 5.0,
            min_radius_px: 2.5,
            max_radius_px: 8.0,
            exponent: 0.6,
            hit_slop: 1.6,
            hover_scale: 1.3,
            drag_scale: 1.45,
        }
    }
}

impl MarkerConfig {
    /// Marker radius in screen pixels at `zoom`.
    pub fn screen_radius(&self, zoom: f64) -> f64 {
        (self.base_radius_px * zoom.powf(-self.exponent))
            .clamp(self.min_radius_px, self.max_radius_px)
    }

    /// Vertex hit radius in world units at `zoom`.
    pub fn hit_radius_world(&self, zoom: f64) -> f64 {
        self.screen_radius(zoom) * self.hit_slop / zoom
    }
}

// ─── Editor ──────────────────────────────────────────────────────────────

/// Configuration for the editor core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub zoom: ZoomLimits,
    /// Maximum depth of each history stack.
    pub history_depth: usize,
    pub markers: MarkerConfig,
    /// Viewport-culling buffer around the visible rectangle, in screen pixels.
    pub cull_margin_px: f64,
    /// Clicking this close to the first point closes a polygon being created.
    pub close_radius_px: f64,
    /// Selection highlight fade-in duration.
    pub selection_fade_ms: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            zoom: ZoomLimits::default(),
            history_depth: 100,
            markers: MarkerConfig::default(),
            cull_margin_px: 24.0,
            close_radius_px: 10.0,
            selection_fade_ms: 120.0,
        }
    }
}

impl EditorConfig {
    /// Parse and validate a (possibly partial) JSON config.
    ///
    /// # Errors
    /// Returns `ConfigError` for malformed JSON or out-of-range values.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &'static str, reason: String| ConfigError::Invalid { field, reason };
        if !(self.zoom.min > 0.0) {
            return Err(invalid("zoom.min", format!("must be > 0, got {}", self.zoom.min)));
        }
        if self.zoom.min > self.zoom.max {
            return Err(invalid(
                "zoom.max",
                format!("must be >= zoom.min ({}), got {}", self.zoom.min, self.zoom.max),
            ));
        }
        if !(self.zoom.step > 1.0) {
            return Err(invalid("zoom.step", format!("must be > 1, got {}", self.zoom.step)));
        }
        if self.history_depth == 0 {
            return Err(invalid("history_depth", "must be at least 1".into()));
        }
        let m = &self.markers;
        if !(m.min_radius_px > 0.0) || m.min_radius_px > m.max_radius_px {
            return Err(invalid(
                "markers.min_radius_px",
                format!("must be in (0, {}], got {}", m.max_radius_px, m.min_radius_px),
            ));
        }
        if !(m.base_radius_px > 0.0) || !(m.exponent > 0.0) || !(m.hit_slop >= 1.0) {
            return Err(invalid(
                "markers",
                "base_radius_px and exponent must be > 0, hit_slop >= 1".into(),
            ));
        }
        if self.cull_margin_px < 0.0 || self.close_radius_px < 0.0 {
            return Err(invalid("cull_margin_px", "margins must be non-negative".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EditorConfig::from_json(r#"{ "history_depth": 5, "zoom": { "max": 10 } }"#)
            .unwrap();
        assert_eq!(config.history_depth, 5);
        assert_eq!(config.zoom.max, 10.0);
        assert_eq!(config.zoom.min, ZoomLimits::default().min);
        assert_eq!(config.markers, MarkerConfig::default());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = EditorConfig::from_json(r#"{ "zoom": { "min": 0 } }"#).unwrap_err();
        assert_eq!(err.code(), "config.invalid");
        assert!(EditorConfig::from_json(r#"{ "history_depth": 0 }"#).is_err());
        assert!(EditorConfig::from_json("not json").is_err());
    }

    #[test]
    fn marker_radius_shrinks_with_zoom_and_has_a_floor() {
        let m = MarkerConfig::default();
        let r1 = m.screen_radius(1.0);
        let r4 = m.screen_radius(4.0);
        assert!((r1 - 5.0).abs() < 1e-9);
        assert!(r4 < r1);
        assert_eq!(m.screen_radius(10_000.0), m.min_radius_px);
        assert_eq!(m.screen_radius(0.001), m.max_radius_px);
        // Hit radius in world units still shrinks, but never below the floor on screen.
        assert!(m.hit_radius_world(40.0) * 40.0 >= m.min_radius_px * m.hit_slop - 1e-9);
    }
}
