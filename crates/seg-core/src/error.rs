//! Diagnostic error types.
//!
//! Every variant maps to a stable diagnostic code (`code()`) so hosts can
//! branch on the failure without parsing the human-readable message.

use thiserror::Error;

/// Why a slice line could not split a polygon.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SliceError {
    #[error("slice line is too short ({length:.2} units)")]
    TooShort { length: f64 },

    #[error("slice line does not intersect the polygon")]
    NoIntersection,

    #[error("slice line only touches the polygon")]
    TouchesOnly,

    #[error("too many intersections ({count}), try a simpler cut")]
    TooManyIntersections { count: usize },

    #[error("slice would produce a piece with fewer than 3 points")]
    DegenerateResult,
}

impl SliceError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::TooShort { .. } => "slice.too_short",
            Self::NoIntersection => "slice.no_intersection",
            Self::TouchesOnly => "slice.touches_only",
            Self::TooManyIntersections { .. } => "slice.too_many_intersections",
            Self::DegenerateResult => "slice.degenerate",
        }
    }
}

/// Rejected vertex operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VertexError {
    #[error("a polygon needs at least 3 points (has {count})")]
    MinPoints { count: usize },

    #[error("vertex index {index} out of range (polygon has {len} points)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("edge index {index} out of range (polygon has {len} edges)")]
    EdgeOutOfRange { index: usize, len: usize },

    #[error("the new vertex would make the outline self-intersect")]
    SelfIntersection,

    #[error("coordinates must be finite")]
    NonFinite,

    #[error("start and end vertex of an added sequence must differ")]
    SameAnchor,
}

impl VertexError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MinPoints { .. } => "vertex.min_points",
            Self::IndexOutOfRange { .. } => "vertex.index_out_of_range",
            Self::EdgeOutOfRange { .. } => "vertex.edge_out_of_range",
            Self::SelfIntersection => "vertex.self_intersection",
            Self::NonFinite => "vertex.non_finite",
            Self::SameAnchor => "vertex.same_anchor",
        }
    }
}

/// Why a single ingestion entry was dropped (or its parent reference cleared).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IngestError {
    #[error("entry is not a polygon object: {0}")]
    Malformed(String),

    #[error("polygon has {count} distinct points, at least 3 are required")]
    TooFewPoints { count: usize },

    #[error("point {index} has a non-finite coordinate")]
    NonFinite { index: usize },

    #[error("duplicate polygon id `{0}`")]
    DuplicateId(String),

    #[error("unknown polygon type `{0}`")]
    UnknownType(String),

    #[error("parent `{parent}` does not exist; reference cleared")]
    DanglingParent { parent: String },

    #[error("parent reference to `{parent}` closes a cycle; reference cleared")]
    ParentCycle { parent: String },
}

impl IngestError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "ingest.malformed",
            Self::TooFewPoints { .. } => "ingest.too_few_points",
            Self::NonFinite { .. } => "ingest.non_finite",
            Self::DuplicateId(_) => "ingest.duplicate_id",
            Self::UnknownType(_) => "ingest.unknown_type",
            Self::DanglingParent { .. } => "ingest.dangling_parent",
            Self::ParentCycle { .. } => "ingest.parent_cycle",
        }
    }

    /// Parent problems keep the polygon; everything else drops it.
    pub fn drops_entry(&self) -> bool {
        !matches!(self, Self::DanglingParent { .. } | Self::ParentCycle { .. })
    }
}

/// Invalid editor configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Json(_) => "config.json",
            Self::Invalid { .. } => "config.invalid",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_messages_are_specific() {
        assert_eq!(
            SliceError::TooManyIntersections { count: 4 }.to_string(),
            "too many intersections (4), try a simpler cut"
        );
        assert_eq!(SliceError::TouchesOnly.code(), "slice.touches_only");
    }

    #[test]
    fn parent_problems_do_not_drop() {
        assert!(!IngestError::DanglingParent { parent: "p".into() }.drops_entry());
        assert!(IngestError::TooFewPoints { count: 2 }.drops_entry());
    }
}
