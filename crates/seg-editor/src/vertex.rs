//! Vertex manipulation.
//!
//! Every operation takes the current ring and returns the new ring, or a
//! `VertexError` and no changes. The caller commits the result.

use kurbo::Vec2;
use seg_core::geometry;
use seg_core::id::PolygonId;
use seg_core::model::Point;
use seg_core::VertexError;

/// Minimum ring size.
pub const MIN_POINTS: usize = 3;

/// Insert `point` on edge `edge` (between `points[edge]` and `points[edge + 1]`).
pub fn insert_vertex(points: &[Point], edge: usize, point: Point) -> Result<Vec<Point>, VertexError> {
    if !point.is_finite() {
        return Err(VertexError::NonFinite);
    }
    if edge >= points.len() {
        return Err(VertexError::EdgeOutOfRange {
            index: edge,
            len: points.len(),
        });
    }
    let mut out = Vec::with_capacity(points.len() + 1);
    out.extend_from_slice(&points[..=edge]);
    out.push(point);
    out.extend_from_slice(&points[edge + 1..]);
    if geometry::edges_self_intersect(&out, &[edge + 1]) {
        return Err(VertexError::SelfIntersection);
    }
    Ok(out)
}

/// Insert `point` on whichever edge is nearest to it. Returns the new ring
/// and the edge that was split.
pub fn insert_at_nearest_edge(points: &[Point], point: Point) -> Result<(Vec<Point>, usize), VertexError> {
    let edge = geometry::nearest_edge(points, point).ok_or(VertexError::MinPoints {
        count: points.len(),
    })?;
    insert_vertex(points, edge, point).map(|ring| (ring, edge))
}

/// Remove vertex `index`. Rejected when the ring would drop below 3 points.
pub fn remove_vertex(points: &[Point], index: usize) -> Result<Vec<Point>, VertexError> {
    if index >= points.len() {
        return Err(VertexError::IndexOutOfRange {
            index,
            len: points.len(),
        });
    }
    if points.len() <= MIN_POINTS {
        return Err(VertexError::MinPoints {
            count: points.len(),
        });
    }
    let mut out = points.to_vec();
    out.remove(index);
    Ok(out)
}

/// Move vertex `index` by `offset`. Self-intersection is not checked: a
/// drag is committed where the user releases it.
pub fn move_vertex(points: &[Point], index: usize, offset: Vec2) -> Result<Vec<Point>, VertexError> {
    let Some(origin) = points.get(index) else {
        return Err(VertexError::IndexOutOfRange {
            index,
            len: points.len(),
        });
    };
    let moved = origin.offset(offset);
    if !moved.is_finite() {
        return Err(VertexError::NonFinite);
    }
    let mut out = points.to_vec();
    out[index] = moved;
    Ok(out)
}

/// Replace the boundary between vertices `start` and `end` with `inserted`
/// (ordered from `start` towards `end`).
///
/// There are two arcs between the anchors; the one whose replacement
/// yields the larger polygon is replaced. Falls back to the other arc when
/// the larger result self-intersects.
pub fn splice_between(
    points: &[Point],
    start: usize,
    end: usize,
    inserted: &[Point],
) -> Result<Vec<Point>, VertexError> {
    let n = points.len();
    for index in [start, end] {
        if index >= n {
            return Err(VertexError::IndexOutOfRange { index, len: n });
        }
    }
    if start == end {
        return Err(VertexError::SameAnchor);
    }
    if inserted.iter().any(|p| !p.is_finite()) {
        return Err(VertexError::NonFinite);
    }

    // start → inserted → end → (ring forward) → before start
    let mut keep_after_end = Vec::with_capacity(n + inserted.len());
    keep_after_end.push(points[start]);
    keep_after_end.extend_from_slice(inserted);
    let mut i = end;
    while i != start {
        keep_after_end.push(points[i]);
        i = (i + 1) % n;
    }

    // end → inserted reversed → start → (ring forward) → before end
    let mut keep_after_start = Vec::with_capacity(n + inserted.len());
    keep_after_start.push(points[end]);
    keep_after_start.extend(inserted.iter().rev());
    let mut i = start;
    while i != end {
        keep_after_start.push(points[i]);
        i = (i + 1) % n;
    }

    let mut candidates = [keep_after_end, keep_after_start];
    for ring in &mut candidates {
        geometry::normalize_ring(ring);
    }
    candidates.sort_by(|a, b| geometry::area(b).total_cmp(&geometry::area(a)));
    let [larger, smaller] = candidates;
    for ring in [larger, smaller] {
        if ring.len() >= MIN_POINTS && geometry::is_simple(&ring) {
            return Ok(ring);
        }
    }
    Err(VertexError::SelfIntersection)
}

// ─── Drag ────────────────────────────────────────────────────────────────

/// An in-progress vertex drag. The stored ring is untouched until commit;
/// only `offset` changes while the pointer moves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragState {
    pub polygon: PolygonId,
    pub index: usize,
    /// Vertex position when the drag started.
    pub origin: Point,
    /// World position of the pointer when the drag started.
    pub grab: Point,
    pub offset: Vec2,
}

impl DragState {
    pub fn new(polygon: PolygonId, index: usize, origin: Point, grab: Point) -> Self {
        Self {
            polygon,
            index,
            origin,
            grab,
            offset: Vec2::ZERO,
        }
    }

    /// Track the pointer at `world`.
    pub fn update(&mut self, world: Point) {
        self.offset = world.to_vec2() - self.grab.to_vec2();
    }

    /// Where the vertex is drawn right now.
    pub fn position(&self) -> Point {
        self.origin.offset(self.offset)
    }

    pub fn is_noop(&self) -> bool {
        self.offset.hypot2() <= geometry::EPSILON * geometry::EPSILON
    }
}
