//! Hit testing: world point → polygon / vertex target.
//!
//! Vertices are only hittable on the selected polygon (the only one whose
//! markers are drawn). Polygons are tested front-to-back, so the last
//! painted polygon wins, which makes holes clickable inside their container.

use seg_core::id::PolygonId;
use seg_core::model::{Point, Polygon, PolygonSet};
use seg_core::MarkerConfig;

/// What a pointer event landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HitTarget {
    /// A vertex marker of the selected polygon.
    Vertex { polygon: PolygonId, index: usize },
    /// The interior of a polygon.
    Polygon(PolygonId),
    /// Empty canvas background.
    #[default]
    Canvas,
}

impl HitTarget {
    pub fn polygon(&self) -> Option<PolygonId> {
        match *self {
            Self::Vertex { polygon, .. } | Self::Polygon(polygon) => Some(polygon),
            Self::Canvas => None,
        }
    }

    pub fn is_canvas(&self) -> bool {
        matches!(self, Self::Canvas)
    }
}

/// Resolve `world` to the topmost target at the current `zoom`.
pub fn hit_test(
    set: &PolygonSet,
    selected: Option<PolygonId>,
    world: Point,
    zoom: f64,
    markers: &MarkerConfig,
) -> HitTarget {
    if let Some(id) = selected
        && let Some(poly) = set.get(id)
        && let Some(index) = hit_vertex(poly, world, markers.hit_radius_world(zoom))
    {
        return HitTarget::Vertex { polygon: id, index };
    }
    hit_polygon(set, world).map_or(HitTarget::Canvas, HitTarget::Polygon)
}

/// Topmost polygon whose interior contains `world`.
pub fn hit_polygon(set: &PolygonSet, world: Point) -> Option<PolygonId> {
    let probe = world.to_kurbo();
    set.iter()
        .rev()
        .filter(|p| p.bounds().is_some_and(|b| b.contains(probe)))
        .find(|p| p.contains(world))
        .map(|p| p.id)
}

/// Nearest vertex of `polygon` within `radius` world units.
pub fn hit_vertex(polygon: &Polygon, world: Point, radius: f64) -> Option<usize> {
    let r2 = radius * radius;
    polygon
        .points()
        .iter()
        .enumerate()
        .map(|(i, p)| (i, (p.to_vec2() - world.to_vec2()).hypot2()))
        .filter(|&(_, d2)| d2 <= r2)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}
