//! Integration tests: slicing results partition the source polygon.

use seg_core::geometry;
use seg_core::*;

fn square(id: &str) -> Polygon {
    Polygon::new(
        PolygonId::intern(id),
        vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ],
        PolygonKind::External,
    )
}

fn ids() -> impl FnMut() -> PolygonId {
    let mut n = 0;
    move || {
        n += 1;
        PolygonId::intern(&format!("slice_it_{n}"))
    }
}

/// Both halves share exactly the two cut points, and every original vertex
/// lands in exactly one half.
fn assert_partitions(source: &Polygon, halves: &[Polygon; 2]) {
    let total: f64 = halves.iter().map(Polygon::area).sum();
    assert!(
        (total - source.area()).abs() < 1e-6,
        "area {total} != {}",
        source.area()
    );
    for p in source.points() {
        let owners = halves
            .iter()
            .filter(|h| h.points().iter().any(|q| q.distance(*p) < 1e-9))
            .count();
        assert!(owners >= 1, "vertex {p:?} lost");
    }
    for half in halves {
        assert!(half.len() >= 3);
        assert!(geometry::is_simple(half.points()));
    }
}

// ─── Scenarios ───────────────────────────────────────────────────────────

#[test]
fn square_vertical_cut_gives_two_quadrilaterals() {
    let sq = square("it_sq");
    let halves = slice_polygon(&sq, Point::new(5.0, -5.0), Point::new(5.0, 15.0), ids()).unwrap();
    for half in &halves {
        assert_eq!(half.len(), 4);
        assert!((half.area() - 50.0).abs() < 1e-9);
    }
    assert_partitions(&sq, &halves);
}

#[test]
fn oblique_cuts_partition_area() {
    let sq = square("it_sq_oblique");
    let lines = [
        (Point::new(-1.0, 2.0), Point::new(11.0, 7.0)),
        (Point::new(2.0, -3.0), Point::new(9.0, 14.0)),
        (Point::new(4.0, 4.0), Point::new(6.0, 5.0)),
        (Point::new(0.0, 0.0), Point::new(10.0, 10.0)),
    ];
    for (p1, p2) in lines {
        let halves = slice_polygon(&sq, p1, p2, ids()).unwrap();
        assert_partitions(&sq, &halves);
    }
}

#[test]
fn slice_is_independent_of_direction() {
    let sq = square("it_sq_dir");
    let forward = slice_polygon(&sq, Point::new(5.0, -5.0), Point::new(5.0, 15.0), ids()).unwrap();
    let backward = slice_polygon(&sq, Point::new(5.0, 15.0), Point::new(5.0, -5.0), ids()).unwrap();
    let mut fa: Vec<f64> = forward.iter().map(Polygon::area).collect();
    let mut ba: Vec<f64> = backward.iter().map(Polygon::area).collect();
    fa.sort_by(f64::total_cmp);
    ba.sort_by(f64::total_cmp);
    for (f, b) in fa.iter().zip(&ba) {
        assert!((f - b).abs() < 1e-9);
    }
}

#[test]
fn failures_leave_nothing_behind() {
    let sq = square("it_sq_fail");
    let err = slice_polygon(&sq, Point::new(50.0, 0.0), Point::new(50.0, 10.0), ids()).unwrap_err();
    assert_eq!(err.code(), "slice.no_intersection");
    assert_eq!(
        err.to_string(),
        "slice line does not intersect the polygon"
    );
}

fn u_shape(id: &str) -> Polygon {
    Polygon::new(
        PolygonId::intern(id),
        vec![
            Point::new(0.0, 0.0),
            Point::new(30.0, 0.0),
            Point::new(30.0, 30.0),
            Point::new(20.0, 30.0),
            Point::new(20.0, 10.0),
            Point::new(10.0, 10.0),
            Point::new(10.0, 30.0),
            Point::new(0.0, 30.0),
        ],
        PolygonKind::External,
    )
}

#[test]
fn concave_cuts_partition_or_fail() {
    let u = u_shape("it_u");
    assert!((u.area() - 700.0).abs() < 1e-9);

    // Across one arm each, and straight through the base.
    for (p1, p2) in [
        (Point::new(-5.0, 20.0), Point::new(15.0, 20.0)),
        (Point::new(15.0, -5.0), Point::new(15.0, 5.0)),
        (Point::new(15.0, 25.0), Point::new(35.0, 25.0)),
    ] {
        let halves = slice_polygon(&u, p1, p2, ids()).unwrap();
        assert_partitions(&u, &halves);
    }

    // Clicks in the two arms: the segment spans the notch between them.
    let err = slice_polygon(&u, Point::new(5.0, 20.0), Point::new(25.0, 20.0), ids()).unwrap_err();
    assert_eq!(err.code(), "slice.too_many_intersections");
}
