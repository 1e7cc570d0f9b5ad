//! Ingestion of externally produced polygon lists.
//!
//! Accepts the ML producer / persistence shape:
//!
//! ```json
//! [{ "id": "polygon_1", "points": [{"x": 1, "y": 2}, [3, 4], ...],
//!    "type": "external", "parentId": null, "class": "spheroid", "confidence": 0.93 }]
//! ```
//!
//! Each entry is validated on its own. A bad entry is dropped with a
//! diagnostic and the rest of the set still loads.

use crate::error::IngestError;
use crate::geometry;
use crate::id::PolygonId;
use crate::model::{Point, Polygon, PolygonKind, PolygonSet};
use petgraph::algo::has_path_connecting;
use petgraph::graphmap::DiGraphMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Prefix for ids synthesized when the source omits one.
pub const SYNTHETIC_ID_PREFIX: &str = "polygon";

// ─── Raw input shape ─────────────────────────────────────────────────────

/// A point as either `{ "x": .., "y": .. }` or `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawPoint {
    Object { x: f64, y: f64 },
    Pair([f64; 2]),
}

impl From<RawPoint> for Point {
    fn from(raw: RawPoint) -> Self {
        match raw {
            RawPoint::Object { x, y } => Point::new(x, y),
            RawPoint::Pair([x, y]) => Point::new(x, y),
        }
    }
}

/// One unvalidated ingestion entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPolygon {
    #[serde(default)]
    pub id: Option<String>,
    pub points: Vec<RawPoint>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default, alias = "parent_id")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// Either a bare list or `{ "polygons": [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope {
    List(Vec<serde_json::Value>),
    Wrapped { polygons: Vec<serde_json::Value> },
}

// ─── Report ──────────────────────────────────────────────────────────────

/// Why entry `index` was dropped or repaired.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestDiagnostic {
    /// Position in the source list.
    pub index: usize,
    /// Id of the entry, when it had (or was given) one.
    pub id: Option<String>,
    pub error: IngestError,
}

/// The loaded set plus everything that went wrong along the way.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub set: PolygonSet,
    pub diagnostics: Vec<IngestDiagnostic>,
}

impl IngestReport {
    /// Number of entries that did not make it into the set.
    pub fn dropped(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.error.drops_entry()).count()
    }
}

// ─── Entry points ────────────────────────────────────────────────────────

/// Parse and ingest a JSON document.
///
/// # Errors
/// Only fails when the document as a whole is not a list of entries;
/// individual bad entries are reported in the returned diagnostics.
pub fn ingest_json(json: &str) -> Result<IngestReport, IngestError> {
    let envelope: Envelope =
        serde_json::from_str(json).map_err(|e| IngestError::Malformed(e.to_string()))?;
    let values = match envelope {
        Envelope::List(v) | Envelope::Wrapped { polygons: v } => v,
    };
    let mut report = IngestReport::default();
    let mut entries = Vec::with_capacity(values.len());
    for (index, value) in values.into_iter().enumerate() {
        match serde_json::from_value::<RawPolygon>(value) {
            Ok(raw) => entries.push((index, raw)),
            Err(e) => report.reject(index, None, IngestError::Malformed(e.to_string())),
        }
    }
    load_entries(&mut report, entries);
    Ok(report)
}

/// Ingest entries that were already deserialized.
pub fn ingest(entries: Vec<RawPolygon>) -> IngestReport {
    let mut report = IngestReport::default();
    load_entries(&mut report, entries.into_iter().enumerate().collect());
    report
}

/// Ingest a MessagePack hand-off produced by [`crate::handoff::to_msgpack`].
pub fn ingest_msgpack(bytes: &[u8]) -> Result<IngestReport, IngestError> {
    let entries: Vec<RawPolygon> =
        rmp_serde::from_slice(bytes).map_err(|e| IngestError::Malformed(e.to_string()))?;
    Ok(ingest(entries))
}

// ─── Pipeline ────────────────────────────────────────────────────────────

impl IngestReport {
    fn reject(&mut self, index: usize, id: Option<String>, error: IngestError) {
        log::warn!(
            "ingest: entry {index} ({}) {}: {error}",
            id.as_deref().unwrap_or("<no id>"),
            error.code()
        );
        self.diagnostics.push(IngestDiagnostic { index, id, error });
    }
}

fn load_entries(report: &mut IngestReport, entries: Vec<(usize, RawPolygon)>) {
    // Explicit ids are reserved up front so a synthesized id never steals
    // one that a later entry spells out.
    let reserved: HashSet<&str> = entries
        .iter()
        .filter_map(|(_, raw)| raw.id.as_deref())
        .filter(|id| !id.is_empty())
        .collect();
    let mut next_synthetic = 1usize;
    let mut synthesize = |set: &PolygonSet| loop {
        let candidate = format!("{SYNTHETIC_ID_PREFIX}_{next_synthetic}");
        next_synthetic += 1;
        if reserved.contains(candidate.as_str()) {
            continue;
        }
        let id = PolygonId::intern(&candidate);
        if !set.contains(id) {
            return id;
        }
    };

    // Parent references are resolved after every entry is in.
    let mut parents: Vec<(usize, PolygonId, String)> = Vec::new();

    for (index, raw) in &entries {
        let index = *index;
        let explicit = raw.id.as_deref().filter(|id| !id.is_empty());
        let polygon = match build_polygon(raw) {
            Ok(parts) => parts,
            Err(error) => {
                report.reject(index, explicit.map(str::to_owned), error);
                continue;
            }
        };
        let id = match explicit {
            Some(id) => {
                let id = PolygonId::intern(id);
                if report.set.contains(id) {
                    report.reject(index, Some(id.to_string()), IngestError::DuplicateId(id.to_string()));
                    continue;
                }
                id
            }
            None => synthesize(&report.set),
        };
        let (points, kind) = polygon;
        let mut polygon = Polygon::new(id, points, kind);
        polygon.class = raw.class.clone();
        polygon.confidence = raw.confidence.filter(|c| c.is_finite());
        if let Some(parent) = raw.parent_id.as_deref().filter(|p| !p.is_empty()) {
            parents.push((index, id, parent.to_owned()));
        }
        report.set.insert(polygon);
    }

    resolve_parents(report, parents);
    log::info!(
        "ingest: loaded {} polygons ({} vertices), dropped {}",
        report.set.len(),
        report.set.vertex_count(),
        report.dropped()
    );
}

fn build_polygon(raw: &RawPolygon) -> Result<(Vec<Point>, PolygonKind), IngestError> {
    let kind = match raw.kind.as_deref() {
        None | Some("external") => PolygonKind::External,
        Some("internal") | Some("hole") => PolygonKind::Internal,
        Some(other) => return Err(IngestError::UnknownType(other.to_owned())),
    };
    let mut points: Vec<Point> = raw.points.iter().copied().map(Point::from).collect();
    if let Some(index) = points.iter().position(|p| !p.is_finite()) {
        return Err(IngestError::NonFinite { index });
    }
    geometry::normalize_ring(&mut points);
    if points.len() < 3 {
        return Err(IngestError::TooFewPoints {
            count: points.len(),
        });
    }
    Ok((points, kind))
}

/// Attach parent references, clearing dangling ones and any reference that
/// would close a cycle.
fn resolve_parents(report: &mut IngestReport, parents: Vec<(usize, PolygonId, String)>) {
    let mut graph: DiGraphMap<PolygonId, ()> = DiGraphMap::new();
    for (index, child, parent_name) in parents {
        let Some(parent) = PolygonId::lookup(&parent_name).filter(|p| report.set.contains(*p))
        else {
            report.reject(
                index,
                Some(child.to_string()),
                IngestError::DanglingParent {
                    parent: parent_name,
                },
            );
            continue;
        };
        // Edges run child → parent; a path parent ⇝ child means this edge closes a loop.
        if parent == child
            || (graph.contains_node(parent)
                && graph.contains_node(child)
                && has_path_connecting(&graph, parent, child, None))
        {
            report.reject(
                index,
                Some(child.to_string()),
                IngestError::ParentCycle {
                    parent: parent_name,
                },
            );
            continue;
        }
        graph.add_edge(child, parent, ());
        report.set.update(child, |p| p.parent_id = Some(parent));
    }
}
