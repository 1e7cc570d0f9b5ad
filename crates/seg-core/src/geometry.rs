//! Planar geometry helpers over polygon rings.
//!
//! Rings are implicitly closed: edge `i` runs from `points[i]` to
//! `points[(i + 1) % n]`.

use crate::model::Point;
use kurbo::{Rect, Vec2};

/// Tolerance used for parallelism and coincidence tests.
pub const EPSILON: f64 = 1e-9;

/// Signed shoelace area (positive for counter-clockwise in a y-up frame).
pub fn signed_area(points: &[Point]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut acc = 0.0;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        acc += a.x * b.y - b.x * a.y;
    }
    acc * 0.5
}

/// Unsigned polygon area.
pub fn area(points: &[Point]) -> f64 {
    signed_area(points).abs()
}

/// Axis-aligned bounds of a ring, `None` when empty.
pub fn bounds(points: &[Point]) -> Option<Rect> {
    let first = points.first()?;
    let mut rect = Rect::new(first.x, first.y, first.x, first.y);
    for p in &points[1..] {
        rect = rect.union_pt(p.to_kurbo());
    }
    Some(rect)
}

/// Even-odd point-in-polygon test.
pub fn contains_point(points: &[Point], p: Point) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let a = points[i];
        let b = points[j];
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Squared distance from `p` to the segment `a–b`, plus the segment parameter.
pub fn segment_distance_sq(p: Point, a: Point, b: Point) -> (f64, f64) {
    let ab = b.to_vec2() - a.to_vec2();
    let ap = p.to_vec2() - a.to_vec2();
    let len_sq = ab.hypot2();
    let t = if len_sq <= EPSILON {
        0.0
    } else {
        (ap.dot(ab) / len_sq).clamp(0.0, 1.0)
    };
    let closest = a.to_vec2() + ab * t;
    ((p.to_vec2() - closest).hypot2(), t)
}

/// Index of the ring edge nearest to `p`.
pub fn nearest_edge(points: &[Point], p: Point) -> Option<usize> {
    let n = points.len();
    if n < 2 {
        return None;
    }
    let mut best = (f64::INFINITY, 0);
    for i in 0..n {
        let (d, _) = segment_distance_sq(p, points[i], points[(i + 1) % n]);
        if d < best.0 {
            best = (d, i);
        }
    }
    Some(best.1)
}

/// Parameters of the crossing between `p + t·r` and `q + u·s`, if not parallel.
pub fn line_params(p: Point, r: Vec2, q: Point, s: Vec2) -> Option<(f64, f64)> {
    let denom = r.cross(s);
    if denom.abs() <= EPSILON {
        return None;
    }
    let qp = q.to_vec2() - p.to_vec2();
    Some((qp.cross(s) / denom, qp.cross(r) / denom))
}

/// Proper or touching intersection of two closed segments.
pub fn segments_intersect(a1: Point, a2: Point, b1: Point, b2: Point) -> bool {
    let r = a2.to_vec2() - a1.to_vec2();
    let s = b2.to_vec2() - b1.to_vec2();
    match line_params(a1, r, b1, s) {
        Some((t, u)) => (-EPSILON..=1.0 + EPSILON).contains(&t) && (-EPSILON..=1.0 + EPSILON).contains(&u),
        None => {
            // Parallel: only collinear overlap counts.
            let qp = b1.to_vec2() - a1.to_vec2();
            if qp.cross(r).abs() > EPSILON {
                return false;
            }
            let len_sq = r.hypot2();
            if len_sq <= EPSILON {
                return a1.distance(b1) <= EPSILON;
            }
            let t0 = qp.dot(r) / len_sq;
            let t1 = (b2.to_vec2() - a1.to_vec2()).dot(r) / len_sq;
            let (lo, hi) = if t0 <= t1 { (t0, t1) } else { (t1, t0) };
            hi >= -EPSILON && lo <= 1.0 + EPSILON
        }
    }
}

/// Whether any ring edge touching one of `changed` vertices crosses a
/// non-adjacent edge. Only the edges incident to `changed` are tested, so
/// the cost is linear in the ring size.
pub fn edges_self_intersect(points: &[Point], changed: &[usize]) -> bool {
    let n = points.len();
    if n < 4 {
        return false;
    }
    let mut edges: smallvec::SmallVec<[usize; 4]> = smallvec::SmallVec::new();
    for &v in changed {
        for e in [(v + n - 1) % n, v % n] {
            if !edges.contains(&e) {
                edges.push(e);
            }
        }
    }
    for &e in &edges {
        let (a1, a2) = (points[e], points[(e + 1) % n]);
        for other in 0..n {
            // Skip the edge itself and its two neighbours (they share endpoints).
            if other == e || other == (e + 1) % n || (other + 1) % n == e {
                continue;
            }
            let (b1, b2) = (points[other], points[(other + 1) % n]);
            if segments_intersect(a1, a2, b1, b2) {
                return true;
            }
        }
    }
    false
}

/// Whether the whole ring is simple (no two non-adjacent edges touch).
pub fn is_simple(points: &[Point]) -> bool {
    let all: Vec<usize> = (0..points.len()).collect();
    !edges_self_intersect(points, &all)
}

/// Drop consecutive duplicates and a trailing closing point equal to the first.
pub fn normalize_ring(points: &mut Vec<Point>) {
    points.dedup_by(|b, a| a.distance(*b) <= EPSILON);
    while points.len() > 1 && points[0].distance(points[points.len() - 1]) <= EPSILON {
        points.pop();
    }
}
