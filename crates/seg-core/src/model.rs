//! Core polygon data model.
//!
//! A `PolygonSet` is a flat, ordered list of polygons (later entries paint
//! on top). Holes reference their container through a non-owning
//! `parent_id`; there is no ownership tree. Polygons are stored behind
//! `Arc` so history snapshots share every polygon an edit did not touch.

use crate::geometry;
use crate::id::PolygonId;
use kurbo::{Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

// ─── Point ───────────────────────────────────────────────────────────────

/// A point in world (image) space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn to_kurbo(self) -> kurbo::Point {
        kurbo::Point::new(self.x, self.y)
    }

    pub fn to_vec2(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn distance(self, other: Point) -> f64 {
        (self.to_vec2() - other.to_vec2()).hypot()
    }

    pub fn offset(self, delta: Vec2) -> Self {
        Self::new(self.x + delta.x, self.y + delta.y)
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<kurbo::Point> for Point {
    fn from(p: kurbo::Point) -> Self {
        Self::new(p.x, p.y)
    }
}

impl From<Point> for kurbo::Point {
    fn from(p: Point) -> Self {
        p.to_kurbo()
    }
}

impl From<Vec2> for Point {
    fn from(v: Vec2) -> Self {
        Self::new(v.x, v.y)
    }
}

// ─── Polygon ─────────────────────────────────────────────────────────────

/// Whether a polygon is an outer boundary or a hole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolygonKind {
    #[default]
    External,
    Internal,
}

impl PolygonKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::External => "external",
            Self::Internal => "internal",
        }
    }
}

/// One segmentation outline.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub id: PolygonId,
    pub kind: PolygonKind,
    /// Container polygon for holes. Non-owning; always resolvable in the set.
    pub parent_id: Option<PolygonId>,
    /// Classification label from the producer (e.g. `spheroid`).
    pub class: Option<String>,
    /// Producer confidence in `0.0..=1.0`.
    pub confidence: Option<f64>,
    points: Vec<Point>,
    area: f64,
}

impl Polygon {
    pub fn new(id: PolygonId, points: Vec<Point>, kind: PolygonKind) -> Self {
        let area = geometry::area(&points);
        Self {
            id,
            kind,
            parent_id: None,
            class: None,
            confidence: None,
            points,
            area,
        }
    }

    /// A new polygon with a different id and ring that keeps this polygon's
    /// type, classification and parent.
    pub fn derive(&self, id: PolygonId, points: Vec<Point>) -> Self {
        let mut derived = Self::new(id, points, self.kind);
        derived.parent_id = self.parent_id;
        derived.class = self.class.clone();
        derived.confidence = self.confidence;
        derived
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn point(&self, index: usize) -> Option<Point> {
        self.points.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Cached unsigned area.
    pub fn area(&self) -> f64 {
        self.area
    }

    pub fn bounds(&self) -> Option<Rect> {
        geometry::bounds(&self.points)
    }

    pub fn contains(&self, p: Point) -> bool {
        geometry::contains_point(&self.points, p)
    }

    /// Replace the ring and refresh the cached area.
    pub fn set_points(&mut self, points: Vec<Point>) {
        self.area = geometry::area(&points);
        self.points = points;
    }
}

// ─── Polygon set (data store) ───────────────────────────────────────────

/// Immutable copy of a whole polygon set, used by history.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    polygons: Vec<Arc<Polygon>>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Polygon> {
        self.polygons.iter().map(|p| p.as_ref())
    }
}

/// The canonical in-memory polygon collection.
#[derive(Debug, Clone, Default)]
pub struct PolygonSet {
    polygons: Vec<Arc<Polygon>>,
    /// Index from PolygonId → position in `polygons`.
    index: HashMap<PolygonId, usize>,
}

impl PolygonSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Polygons in paint order (last = topmost).
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Polygon> {
        self.polygons.iter().map(|p| p.as_ref())
    }

    pub fn ids(&self) -> Vec<PolygonId> {
        self.polygons.iter().map(|p| p.id).collect()
    }

    pub fn get(&self, id: PolygonId) -> Option<&Polygon> {
        self.index.get(&id).map(|&i| self.polygons[i].as_ref())
    }

    pub fn contains(&self, id: PolygonId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn position(&self, id: PolygonId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// Total vertex count across all polygons.
    pub fn vertex_count(&self) -> usize {
        self.polygons.iter().map(|p| p.len()).sum()
    }

    /// Append a polygon. Returns `false` (and leaves the set untouched) if
    /// the id is already taken.
    pub fn insert(&mut self, polygon: Polygon) -> bool {
        if self.index.contains_key(&polygon.id) {
            return false;
        }
        self.index.insert(polygon.id, self.polygons.len());
        self.polygons.push(Arc::new(polygon));
        true
    }

    /// Remove a polygon, clearing `parent_id` on any hole that pointed at it.
    pub fn remove(&mut self, id: PolygonId) -> Option<Arc<Polygon>> {
        let pos = self.index.remove(&id)?;
        let removed = self.polygons.remove(pos);
        for poly in &mut self.polygons {
            if poly.parent_id == Some(id) {
                Arc::make_mut(poly).parent_id = None;
            }
        }
        self.rebuild_index();
        Some(removed)
    }

    /// Mutate one polygon in place (copy-on-write if a snapshot shares it).
    pub fn update<R>(&mut self, id: PolygonId, f: impl FnOnce(&mut Polygon) -> R) -> Option<R> {
        let pos = *self.index.get(&id)?;
        Some(f(Arc::make_mut(&mut self.polygons[pos])))
    }

    /// Replace `id` with `pieces` at the same paint position.
    ///
    /// Holes of the replaced polygon are re-parented to the first piece that
    /// contains the hole's first vertex, or detached.
    pub fn split_replace(&mut self, id: PolygonId, pieces: Vec<Polygon>) -> bool {
        let Some(pos) = self.index.get(&id).copied() else {
            return false;
        };
        if pieces.iter().any(|p| p.id != id && self.index.contains_key(&p.id)) {
            return false;
        }
        let new_parent = |hole: &Polygon| -> Option<PolygonId> {
            let probe = hole.point(0)?;
            pieces.iter().find(|p| p.contains(probe)).map(|p| p.id)
        };
        let reparent: Vec<(usize, Option<PolygonId>)> = self
            .polygons
            .iter()
            .enumerate()
            .filter(|(_, p)| p.parent_id == Some(id))
            .map(|(i, p)| (i, new_parent(p.as_ref())))
            .collect();
        for (i, parent) in reparent {
            Arc::make_mut(&mut self.polygons[i]).parent_id = parent;
        }
        self.polygons
            .splice(pos..=pos, pieces.into_iter().map(Arc::new));
        self.rebuild_index();
        true
    }

    /// Holes whose `parent_id` is `id`.
    pub fn children_of(&self, id: PolygonId) -> Vec<PolygonId> {
        self.polygons
            .iter()
            .filter(|p| p.parent_id == Some(id))
            .map(|p| p.id)
            .collect()
    }

    /// An id with the given prefix that is not used in this set.
    pub fn fresh_id(&self, prefix: &str) -> PolygonId {
        loop {
            let candidate = PolygonId::with_prefix(prefix);
            if !self.index.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    /// Bounds of every vertex in the set.
    pub fn bounds(&self) -> Option<Rect> {
        self.polygons
            .iter()
            .filter_map(|p| p.bounds())
            .reduce(|a, b| a.union(b))
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            polygons: self.polygons.clone(),
        }
    }

    pub fn restore(&mut self, snapshot: Snapshot) {
        self.polygons = snapshot.polygons;
        self.rebuild_index();
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for (i, p) in self.polygons.iter().enumerate() {
            self.index.insert(p.id, i);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tri(id: &str, dx: f64) -> Polygon {
        Polygon::new(
            PolygonId::intern(id),
            vec![
                Point::new(dx, 0.0),
                Point::new(dx + 4.0, 0.0),
                Point::new(dx, 3.0),
            ],
            PolygonKind::External,
        )
    }

    #[test]
    fn polygon_set_basics() {
        let mut set = PolygonSet::new();
        assert!(set.insert(tri("model_a", 0.0)));
        assert!(set.insert(tri("model_b", 10.0)));
        assert!(!set.insert(tri("model_a", 20.0)), "duplicate id rejected");
        assert_eq!(set.len(), 2);
        assert_eq!(set.vertex_count(), 6);
        assert!((set.get(PolygonId::intern("model_b")).unwrap().area() - 6.0).abs() < 1e-9);
    }

    #[test]
    fn remove_detaches_holes_and_reindexes() {
        let mut set = PolygonSet::new();
        set.insert(tri("outer_rm", 0.0));
        let mut hole = tri("hole_rm", 1.0);
        hole.kind = PolygonKind::Internal;
        hole.parent_id = Some(PolygonId::intern("outer_rm"));
        set.insert(hole);

        set.remove(PolygonId::intern("outer_rm"));
        let hole = set.get(PolygonId::intern("hole_rm")).unwrap();
        assert_eq!(hole.parent_id, None);
        assert_eq!(set.position(PolygonId::intern("hole_rm")), Some(0));
    }

    #[test]
    fn snapshot_is_unaffected_by_later_edits() {
        let mut set = PolygonSet::new();
        set.insert(tri("snap_a", 0.0));
        let before = set.snapshot();
        set.update(PolygonId::intern("snap_a"), |p| {
            p.set_points(vec![
                Point::new(0.0, 0.0),
                Point::new(8.0, 0.0),
                Point::new(0.0, 8.0),
            ])
        });
        let restored_area = before.iter().next().unwrap().area();
        assert!((restored_area - 6.0).abs() < 1e-9);
        set.restore(before.clone());
        assert_eq!(set.snapshot(), before);
    }

    #[test]
    fn fresh_id_skips_taken_ids() {
        let set = PolygonSet::new();
        let a = set.fresh_id("polygon");
        let b = set.fresh_id("polygon");
        assert_ne!(a, b);
    }
}
