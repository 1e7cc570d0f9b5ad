//! Editor operation errors.

use seg_core::{SliceError, VertexError};
use thiserror::Error;

/// Why an editor operation was rejected. The polygon set is unchanged
/// whenever one of these is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditError {
    #[error(transparent)]
    Slice(#[from] SliceError),

    #[error(transparent)]
    Vertex(#[from] VertexError),

    #[error("polygon `{0}` does not exist")]
    UnknownPolygon(String),

    #[error("select a polygon first")]
    NoSelection,

    #[error("a polygon needs at least 3 points (got {count})")]
    TooFewPoints { count: usize },

    #[error("the outline would self-intersect")]
    SelfIntersecting,

    #[error("the outline encloses no area")]
    ZeroArea,

    #[error("no vertex drag in progress")]
    NoDrag,
}

impl EditError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Slice(e) => e.code(),
            Self::Vertex(e) => e.code(),
            Self::UnknownPolygon(_) => "edit.unknown_polygon",
            Self::NoSelection => "edit.no_selection",
            Self::TooFewPoints { .. } => "edit.too_few_points",
            Self::SelfIntersecting => "edit.self_intersecting",
            Self::ZeroArea => "edit.zero_area",
            Self::NoDrag => "edit.no_drag",
        }
    }
}

/// Last rejection, kept for the host to display.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub code: &'static str,
    pub message: String,
}

impl From<&EditError> for Diagnostic {
    fn from(e: &EditError) -> Self {
        Self {
            code: e.code(),
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_errors_keep_their_code_and_message() {
        let e = EditError::from(VertexError::MinPoints { count: 3 });
        assert_eq!(e.code(), "vertex.min_points");
        assert_eq!(e.to_string(), "a polygon needs at least 3 points (has 3)");
        let d = Diagnostic::from(&EditError::from(SliceError::TouchesOnly));
        assert_eq!(d.code, "slice.touches_only");
    }
}
