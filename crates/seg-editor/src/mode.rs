//! Edit modes and click dispatch.
//!
//! All mode-dependent behavior lives here: `EditMode::behavior()` is the
//! one table of per-mode flags, and `resolve_click` is the one place that
//! maps `(mode, target)` to what a primary click does. Nothing else in the
//! crate matches on the mode to decide click semantics.
//!
//! | Mode | Polygon click | Vertex click | Background click |
//! |------|---------------|--------------|------------------|
//! | View | select → EditVertices | select → EditVertices | deselect (+ pan) |
//! | EditVertices | select | drag (Shift: anchor → AddPoints) | deselect |
//! | AddPoints | other: select, selected: place point | anchor | place point |
//! | Slice | other: select, selected: place point | place point | place point |
//! | DeletePolygon | delete | delete | deselect |
//! | CreatePolygon | place point | place point | place point |

use seg_core::id::PolygonId;
use seg_render::HitTarget;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

/// The closed set of editing modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EditMode {
    #[default]
    View,
    EditVertices,
    AddPoints,
    Slice,
    DeletePolygon,
    CreatePolygon,
}

/// The multi-click gesture a mode feeds with placed points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointGesture {
    AddPoints,
    Slice,
    CreatePolygon,
}

/// Per-mode configuration, consulted everywhere a mode matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeBehavior {
    /// Gesture fed by background clicks. Modes with a gesture never
    /// deselect on a background click.
    pub point_gesture: Option<PointGesture>,
    /// The gesture needs a selected polygon to act on.
    pub requires_selection: bool,
    /// Vertex markers of the selected polygon are drawn and hittable.
    pub shows_vertices: bool,
    /// Primary drag on the background pans the view.
    pub background_pans: bool,
    /// Selecting via click switches to this mode.
    pub select_enters: Option<EditMode>,
}

impl ModeBehavior {
    /// Background clicks place points instead of deselecting.
    pub fn background_places_points(&self) -> bool {
        self.point_gesture.is_some()
    }
}

impl EditMode {
    pub const ALL: [EditMode; 6] = [
        Self::View,
        Self::EditVertices,
        Self::AddPoints,
        Self::Slice,
        Self::DeletePolygon,
        Self::CreatePolygon,
    ];

    pub fn behavior(self) -> ModeBehavior {
        match self {
            Self::View => ModeBehavior {
                point_gesture: None,
                requires_selection: false,
                shows_vertices: false,
                background_pans: true,
                select_enters: Some(Self::EditVertices),
            },
            Self::EditVertices => ModeBehavior {
                point_gesture: None,
                requires_selection: false,
                shows_vertices: true,
                background_pans: false,
                select_enters: None,
            },
            Self::AddPoints => ModeBehavior {
                point_gesture: Some(PointGesture::AddPoints),
                requires_selection: true,
                shows_vertices: true,
                background_pans: false,
                select_enters: None,
            },
            Self::Slice => ModeBehavior {
                point_gesture: Some(PointGesture::Slice),
                requires_selection: true,
                shows_vertices: false,
                background_pans: false,
                select_enters: None,
            },
            Self::DeletePolygon => ModeBehavior {
                point_gesture: None,
                requires_selection: false,
                shows_vertices: false,
                background_pans: false,
                select_enters: None,
            },
            Self::CreatePolygon => ModeBehavior {
                point_gesture: Some(PointGesture::CreatePolygon),
                requires_selection: false,
                shows_vertices: false,
                background_pans: false,
                select_enters: None,
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::EditVertices => "editVertices",
            Self::AddPoints => "addPoints",
            Self::Slice => "slice",
            Self::DeletePolygon => "deletePolygon",
            Self::CreatePolygon => "createPolygon",
        }
    }
}

impl fmt::Display for EditMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EditMode {
    type Err = String;

    /// Accepts the camelCase name, snake_case, or the PascalCase variant name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s.chars().filter(|c| *c != '_').flat_map(char::to_lowercase).collect();
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().to_lowercase() == folded)
            .ok_or_else(|| format!("unknown edit mode `{s}`"))
    }
}

// ─── Click dispatch ──────────────────────────────────────────────────────

/// Extra inputs to `resolve_click`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClickContext {
    pub selected: Option<PolygonId>,
    /// The add-point modifier (Shift) is held.
    pub add_modifier: bool,
}

/// What a primary click does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Select `id`, then switch to `enter` if given.
    Select { id: PolygonId, enter: Option<EditMode> },
    Delete(PolygonId),
    /// Feed the click position to the mode's point-placing gesture.
    PlacePoint(PointGesture),
    /// Start or finish an AddPoints sequence at this vertex, switching to
    /// `enter` first if given.
    Anchor {
        polygon: PolygonId,
        index: usize,
        enter: Option<EditMode>,
    },
    BeginDrag { polygon: PolygonId, index: usize },
    Deselect,
}

/// Resolve a primary click on `target` in `mode`. Pure: the result depends
/// only on its arguments.
pub fn resolve_click(mode: EditMode, target: HitTarget, ctx: ClickContext) -> ClickOutcome {
    let behavior = mode.behavior();
    // Vertex targets only exist where markers are shown.
    let target = match target {
        HitTarget::Vertex { polygon, .. } if !behavior.shows_vertices => HitTarget::Polygon(polygon),
        other => other,
    };

    match (mode, target) {
        (_, HitTarget::Canvas) => match behavior.point_gesture {
            Some(gesture) => ClickOutcome::PlacePoint(gesture),
            None => ClickOutcome::Deselect,
        },

        (EditMode::CreatePolygon, _) => ClickOutcome::PlacePoint(PointGesture::CreatePolygon),

        (EditMode::DeletePolygon, t) => match t.polygon() {
            Some(id) => ClickOutcome::Delete(id),
            None => ClickOutcome::Deselect,
        },

        (EditMode::EditVertices, HitTarget::Vertex { polygon, index }) if ctx.add_modifier => {
            ClickOutcome::Anchor {
                polygon,
                index,
                enter: Some(EditMode::AddPoints),
            }
        }
        (EditMode::EditVertices, HitTarget::Vertex { polygon, index }) => {
            ClickOutcome::BeginDrag { polygon, index }
        }
        (EditMode::AddPoints, HitTarget::Vertex { polygon, index }) => ClickOutcome::Anchor {
            polygon,
            index,
            enter: None,
        },

        (EditMode::AddPoints, HitTarget::Polygon(id)) if ctx.selected == Some(id) => {
            ClickOutcome::PlacePoint(PointGesture::AddPoints)
        }
        (EditMode::Slice, HitTarget::Polygon(id)) if ctx.selected == Some(id) => {
            ClickOutcome::PlacePoint(PointGesture::Slice)
        }

        (_, t) => match t.polygon() {
            Some(id) => ClickOutcome::Select {
                id,
                enter: behavior.select_enters,
            },
            None => ClickOutcome::Deselect,
        },
    }
}

// ─── Always-current mode cell ────────────────────────────────────────────

/// Mode + selection as one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModeState {
    pub mode: EditMode,
    pub selected: Option<PolygonId>,
}

/// Shared, synchronously updated mode/selection cell.
///
/// Every clone sees the same value. Event handlers read it when they run,
/// never a copy taken when the handler was created.
#[derive(Debug, Clone, Default)]
pub struct ModeCell(Rc<Cell<ModeState>>);

impl ModeCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> ModeState {
        self.0.get()
    }

    pub fn mode(&self) -> EditMode {
        self.0.get().mode
    }

    pub fn selected(&self) -> Option<PolygonId> {
        self.0.get().selected
    }

    pub fn set_mode(&self, mode: EditMode) {
        let mut state = self.0.get();
        state.mode = mode;
        self.0.set(state);
    }

    pub fn set_selected(&self, selected: Option<PolygonId>) {
        let mut state = self.0.get();
        state.selected = selected;
        self.0.set(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> PolygonId {
        PolygonId::intern(s)
    }

    fn ctx(selected: Option<&str>) -> ClickContext {
        ClickContext {
            selected: selected.map(id),
            add_modifier: false,
        }
    }

    #[test]
    fn view_click_selects_and_enters_edit_vertices() {
        assert_eq!(
            resolve_click(EditMode::View, HitTarget::Polygon(id("m_a")), ctx(None)),
            ClickOutcome::Select {
                id: id("m_a"),
                enter: Some(EditMode::EditVertices)
            }
        );
    }

    #[test]
    fn slice_click_selects_without_leaving_slice() {
        let outcome = resolve_click(EditMode::Slice, HitTarget::Polygon(id("m_a")), ctx(None));
        assert_eq!(
            outcome,
            ClickOutcome::Select {
                id: id("m_a"),
                enter: None
            }
        );
        // Clicking inside the operand places a slice point.
        assert_eq!(
            resolve_click(EditMode::Slice, HitTarget::Polygon(id("m_a")), ctx(Some("m_a"))),
            ClickOutcome::PlacePoint(PointGesture::Slice)
        );
    }

    #[test]
    fn background_semantics_come_from_the_table() {
        for mode in EditMode::ALL {
            let outcome = resolve_click(mode, HitTarget::Canvas, ctx(Some("m_a")));
            if let Some(gesture) = mode.behavior().point_gesture {
                assert_eq!(outcome, ClickOutcome::PlacePoint(gesture), "{mode}");
            } else {
                assert_eq!(outcome, ClickOutcome::Deselect, "{mode}");
            }
        }
        assert!(EditMode::AddPoints.behavior().background_places_points());
        assert!(EditMode::Slice.behavior().background_places_points());
        assert!(EditMode::CreatePolygon.behavior().background_places_points());
        assert!(!EditMode::EditVertices.behavior().background_places_points());
    }

    #[test]
    fn delete_mode_deletes_and_stays() {
        assert_eq!(
            resolve_click(EditMode::DeletePolygon, HitTarget::Polygon(id("m_b")), ctx(None)),
            ClickOutcome::Delete(id("m_b"))
        );
    }

    #[test]
    fn vertex_clicks_by_mode() {
        let v = HitTarget::Vertex {
            polygon: id("m_c"),
            index: 2,
        };
        assert_eq!(
            resolve_click(EditMode::EditVertices, v, ctx(Some("m_c"))),
            ClickOutcome::BeginDrag {
                polygon: id("m_c"),
                index: 2
            }
        );
        assert_eq!(
            resolve_click(
                EditMode::EditVertices,
                v,
                ClickContext {
                    selected: Some(id("m_c")),
                    add_modifier: true
                }
            ),
            ClickOutcome::Anchor {
                polygon: id("m_c"),
                index: 2,
                enter: Some(EditMode::AddPoints)
            }
        );
        // Slice does not show markers, so the vertex behaves like its polygon.
        assert_eq!(
            resolve_click(EditMode::Slice, v, ctx(Some("m_c"))),
            ClickOutcome::PlacePoint(PointGesture::Slice)
        );
    }

    #[test]
    fn mode_names_parse_loosely() {
        assert_eq!("slice".parse::<EditMode>(), Ok(EditMode::Slice));
        assert_eq!("edit_vertices".parse::<EditMode>(), Ok(EditMode::EditVertices));
        assert_eq!("CreatePolygon".parse::<EditMode>(), Ok(EditMode::CreatePolygon));
        assert!("paint".parse::<EditMode>().is_err());
    }

    #[test]
    fn mode_cell_clones_share_state() {
        let cell = ModeCell::new();
        let handler_view = cell.clone();
        cell.set_mode(EditMode::Slice);
        cell.set_selected(Some(id("m_d")));
        assert_eq!(handler_view.mode(), EditMode::Slice);
        assert_eq!(handler_view.selected(), Some(id("m_d")));
    }
}
