//! Hand-off of the current polygon set back to the persistence layer.
//!
//! The output mirrors the ingestion shape, so a hand-off can be fed
//! straight back through `ingest`.

use crate::model::{Point, Polygon, PolygonKind, PolygonSet};
use serde::{Deserialize, Serialize};

/// Serialized form of one polygon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPolygon {
    pub id: String,
    pub points: Vec<Point>,
    #[serde(rename = "type")]
    pub kind: PolygonKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl From<&Polygon> for ExportPolygon {
    fn from(p: &Polygon) -> Self {
        Self {
            id: p.id.to_string(),
            points: p.points().to_vec(),
            kind: p.kind,
            parent_id: p.parent_id.map(|id| id.to_string()),
            class: p.class.clone(),
            confidence: p.confidence,
        }
    }
}

/// Polygons in paint order, ready to serialize.
pub fn export(set: &PolygonSet) -> Vec<ExportPolygon> {
    set.iter().map(ExportPolygon::from).collect()
}

pub fn to_json(set: &PolygonSet) -> Result<String, serde_json::Error> {
    serde_json::to_string(&export(set))
}

pub fn to_json_pretty(set: &PolygonSet) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&export(set))
}

/// Compact binary hand-off. Field names are kept so the decoder can use
/// the same shape as JSON ingestion.
pub fn to_msgpack(set: &PolygonSet) -> Result<Vec<u8>, rmp_serde::encode::Error> {
    rmp_serde::to_vec_named(&export(set))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::PolygonId;
    use crate::ingest;
    use pretty_assertions::assert_eq;

    fn sample() -> PolygonSet {
        let mut set = PolygonSet::new();
        let mut outer = Polygon::new(
            PolygonId::intern("ho_outer"),
            vec![Point::new(0.0, 0.0), Point::new(8.0, 0.0), Point::new(8.0, 8.0), Point::new(0.0, 8.0)],
            PolygonKind::External,
        );
        outer.class = Some("spheroid".into());
        outer.confidence = Some(0.75);
        let mut hole = Polygon::new(
            PolygonId::intern("ho_hole"),
            vec![Point::new(2.0, 2.0), Point::new(4.0, 2.0), Point::new(4.0, 4.0)],
            PolygonKind::Internal,
        );
        hole.parent_id = Some(outer.id);
        set.insert(outer);
        set.insert(hole);
        set
    }

    #[test]
    fn json_uses_ingestion_field_names() {
        let json = to_json(&sample()).unwrap();
        assert!(json.contains(r#""type":"internal""#));
        assert!(json.contains(r#""parentId":"ho_outer""#));
        assert!(!json.contains("parent_id"));
    }

    #[test]
    fn json_handoff_reingests_identically() {
        let set = sample();
        let report = ingest::ingest_json(&to_json(&set).unwrap()).unwrap();
        assert!(report.diagnostics.is_empty());
        assert_eq!(export(&report.set), export(&set));
    }

    #[test]
    fn msgpack_handoff_reingests_identically() {
        let set = sample();
        let bytes = to_msgpack(&set).unwrap();
        let report = ingest::ingest_msgpack(&bytes).unwrap();
        assert_eq!(export(&report.set), export(&set));
    }
}
