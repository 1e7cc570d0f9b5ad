//! Polygon slicing: split one ring into two along a user-drawn line.
//!
//! Pure functions over world coordinates. The outcome depends only on the
//! ring and the two line points, never on zoom or pan.

use crate::error::SliceError;
use crate::geometry::{self, EPSILON};
use crate::id::PolygonId;
use crate::model::{Point, Polygon};
use smallvec::SmallVec;

/// Slice lines shorter than this (world units) are rejected.
pub const MIN_SLICE_LENGTH: f64 = 1.0;

/// Intersections closer than this collapse into one.
const MERGE_DISTANCE: f64 = 1e-6;

/// One crossing of the slice line with a ring edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeHit {
    /// Edge index (`points[edge] → points[edge + 1]`).
    pub edge: usize,
    /// Position along the edge in `0.0..1.0`.
    pub u: f64,
    pub point: Point,
}

type Hits = SmallVec<[EdgeHit; 4]>;

/// Crossings of `p1–p2` with every edge of `points`.
///
/// With `extended`, the line is treated as infinite. Each edge is
/// half-open (`u` in `[0, 1)`) so a line through a shared vertex is
/// counted once.
pub fn intersections(points: &[Point], p1: Point, p2: Point, extended: bool) -> Vec<EdgeHit> {
    collect_hits(points, p1, p2, extended).into_vec()
}

fn collect_hits(points: &[Point], p1: Point, p2: Point, extended: bool) -> Hits {
    let n = points.len();
    let r = p2.to_vec2() - p1.to_vec2();
    let mut hits = Hits::new();
    for edge in 0..n {
        let a = points[edge];
        let b = points[(edge + 1) % n];
        let s = b.to_vec2() - a.to_vec2();
        let Some((t, u)) = geometry::line_params(p1, r, a, s) else {
            continue;
        };
        if !extended && !(-EPSILON..=1.0 + EPSILON).contains(&t) {
            continue;
        }
        if u < -EPSILON || u >= 1.0 - EPSILON {
            continue;
        }
        let u = u.max(0.0);
        let point = a.offset(s * u);
        if hits.iter().any(|h| h.point.distance(point) <= MERGE_DISTANCE) {
            continue;
        }
        hits.push(EdgeHit { edge, u, point });
    }
    hits
}

/// Split `points` along the line through `p1` and `p2`.
///
/// The segment is tried first; if it does not cross the ring exactly twice,
/// or its two crossings are joined by a chord that leaves the polygon (an
/// exit and a re-entry across a notch), the infinite line through the two
/// points is tried. Both rings keep the original winding and point order,
/// and their areas always sum to the source area.
pub fn slice_ring(
    points: &[Point],
    p1: Point,
    p2: Point,
) -> Result<(Vec<Point>, Vec<Point>), SliceError> {
    let length = p1.distance(p2);
    if !p1.is_finite() || !p2.is_finite() {
        return Err(SliceError::NoIntersection);
    }
    if length < MIN_SLICE_LENGTH {
        return Err(SliceError::TooShort { length });
    }

    let segment = collect_hits(points, p1, p2, false);
    if segment.len() == 2
        && let Some(rings) = split_at(points, segment[0], segment[1])
    {
        return Ok(rings);
    }

    let line = collect_hits(points, p1, p2, true);
    match line.len() {
        0 => Err(SliceError::NoIntersection),
        1 => Err(SliceError::TouchesOnly),
        2 => split_at(points, line[0], line[1]).ok_or(SliceError::DegenerateResult),
        count => Err(SliceError::TooManyIntersections { count }),
    }
}

/// Cut the ring at two crossings. `None` when either piece degenerates or
/// the chord between the crossings runs outside the ring.
fn split_at(points: &[Point], x: EdgeHit, y: EdgeHit) -> Option<(Vec<Point>, Vec<Point>)> {
    let (a, b) = if (x.edge, x.u) <= (y.edge, y.u) { (x, y) } else { (y, x) };

    let mid = Point::new((a.point.x + b.point.x) / 2.0, (a.point.y + b.point.y) / 2.0);
    if !geometry::contains_point(points, mid) {
        return None;
    }

    let mut first = Vec::with_capacity(b.edge - a.edge + 2);
    first.push(a.point);
    first.extend_from_slice(&points[a.edge + 1..=b.edge]);
    first.push(b.point);

    let mut second = Vec::with_capacity(points.len() - (b.edge - a.edge) + 2);
    second.push(b.point);
    second.extend_from_slice(&points[b.edge + 1..]);
    second.extend_from_slice(&points[..=a.edge]);
    second.push(a.point);

    geometry::normalize_ring(&mut first);
    geometry::normalize_ring(&mut second);
    if first.len() < 3 || second.len() < 3 {
        return None;
    }
    let (area_first, area_second) = (geometry::area(&first), geometry::area(&second));
    if area_first <= EPSILON || area_second <= EPSILON {
        return None;
    }
    let source = geometry::area(points);
    if (area_first + area_second - source).abs() > EPSILON * source.max(1.0) {
        return None;
    }
    Some((first, second))
}

/// Slice `polygon` into two new polygons with ids from `next_id`.
///
/// Both halves inherit the source type, classification and parent.
pub fn slice_polygon(
    polygon: &Polygon,
    p1: Point,
    p2: Point,
    mut next_id: impl FnMut() -> PolygonId,
) -> Result<[Polygon; 2], SliceError> {
    let (first, second) = slice_ring(polygon.points(), p1, p2)?;
    Ok([
        polygon.derive(next_id(), first),
        polygon.derive(next_id(), second),
    ])
}
