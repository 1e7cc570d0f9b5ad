//! The editor: one instance owns the polygon set, the camera, the mode,
//! the history and every in-progress gesture.
//!
//! Input arrives either as `InputEvent`s (`handle_event`) or through the
//! imperative operations (`select_polygon`, `slice_polygon`, ...). Both
//! paths share validation and history recording: an operation either
//! commits and pushes exactly one history entry, or returns an `EditError`
//! and leaves the set untouched.

use crate::error::{Diagnostic, EditError};
use crate::history::History;
use crate::input::{InputEvent, Modifiers, PointerButton};
use crate::interaction::{Anchor, Interaction, PanState, SliceGesture};
use crate::mode::{ClickContext, ClickOutcome, EditMode, ModeCell, PointGesture, resolve_click};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::vertex::{self, DragState};
use kurbo::Vec2;
use seg_core::geometry;
use seg_core::id::PolygonId;
use seg_core::ingest::{self, IngestDiagnostic};
use seg_core::model::{Point, Polygon, PolygonKind, PolygonSet};
use seg_core::{ConfigError, EditorConfig, IngestError, Transform, VertexError, Viewport};
use seg_render::{
    FrameScheduler, FrameTick, HitTarget, MarkerFrame, MarkerFrameBuilder, MarkerPalette, MarkerState, Overlay,
    PaintInput, SelectionTransition, hit_test,
};

/// Padding around the content when fitting the view.
const FIT_PADDING_PX: f64 = 32.0;

/// Id prefix for polygons created or sliced in the editor.
const ID_PREFIX: &str = "polygon";

pub struct Editor {
    config: EditorConfig,
    set: PolygonSet,
    state: ModeCell,
    transform: Transform,
    viewport: Viewport,
    history: History,
    interaction: Interaction,
    scheduler: FrameScheduler,
    transition: SelectionTransition,
    markers: MarkerFrameBuilder,
    last_diagnostic: Option<Diagnostic>,
    /// Host clock in ms, advanced by `tick` and `frame`.
    clock_ms: f64,
}

impl Editor {
    /// # Errors
    /// `ConfigError` when `config` fails `EditorConfig::validate`.
    pub fn try_new(config: EditorConfig, viewport: Viewport) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config, viewport))
    }

    /// Like `try_new`, but an invalid config is logged and replaced by the
    /// defaults.
    pub fn new(config: EditorConfig, viewport: Viewport) -> Self {
        Self::try_new(config, viewport).unwrap_or_else(|err| {
            log::error!("invalid editor config, using defaults: {err}");
            Self::build(EditorConfig::default(), viewport)
        })
    }

    fn build(config: EditorConfig, viewport: Viewport) -> Self {
        Self {
            transform: Transform::new(config.zoom),
            history: History::new(config.history_depth),
            config,
            set: PolygonSet::new(),
            state: ModeCell::new(),
            viewport,
            interaction: Interaction::default(),
            scheduler: FrameScheduler::new(),
            transition: SelectionTransition::default(),
            markers: MarkerFrameBuilder::new(MarkerPalette::light()),
            last_diagnostic: None,
            clock_ms: 0.0,
        }
    }

    /// Seed the editor with `set`. History, selection and gestures from a
    /// previous set are discarded and the view is fitted to the content.
    pub fn load(&mut self, set: PolygonSet) {
        self.set = set;
        self.history.clear();
        self.interaction = Interaction::default();
        self.state.set_selected(None);
        self.state.set_mode(EditMode::View);
        self.transition.snap(None);
        self.last_diagnostic = None;
        self.fit_to_content();
        log::info!(
            "loaded {} polygons ({} vertices)",
            self.set.len(),
            self.set.vertex_count()
        );
    }

    /// Ingest producer JSON and load the valid polygons. Returns one
    /// diagnostic per dropped or repaired entry.
    ///
    /// # Errors
    /// Only when the document itself is unreadable; bad entries are dropped.
    pub fn load_json(&mut self, json: &str) -> Result<Vec<IngestDiagnostic>, IngestError> {
        let report = ingest::ingest_json(json)?;
        self.load(report.set);
        Ok(report.diagnostics)
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn polygons(&self) -> &PolygonSet {
        &self.set
    }

    pub fn mode(&self) -> EditMode {
        self.state.mode()
    }

    pub fn selected(&self) -> Option<PolygonId> {
        self.state.selected()
    }

    /// A handle to the live mode/selection cell.
    pub fn mode_cell(&self) -> ModeCell {
        self.state.clone()
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn hover(&self) -> HitTarget {
        self.interaction.hover
    }

    /// The most recent rejection, cleared by the next successful commit.
    pub fn last_diagnostic(&self) -> Option<&Diagnostic> {
        self.last_diagnostic.as_ref()
    }

    pub fn take_diagnostic(&mut self) -> Option<Diagnostic> {
        self.last_diagnostic.take()
    }

    pub fn clock_ms(&self) -> f64 {
        self.clock_ms
    }

    /// What a primary click at `world` would land on right now.
    pub fn hit(&self, world: Point) -> HitTarget {
        let state = self.state.get();
        let vertex_owner = state.selected.filter(|_| state.mode.behavior().shows_vertices);
        hit_test(&self.set, vertex_owner, world, self.transform.zoom(), &self.config.markers)
    }

    /// Resolve an id supplied by the host. Strings never interned are
    /// rejected without being interned, so typos don't grow the id table.
    pub fn resolve_id(&mut self, id: &str) -> Result<PolygonId, EditError> {
        match PolygonId::lookup(id) {
            Some(id) if self.set.contains(id) => Ok(id),
            _ => self.reject(EditError::UnknownPolygon(id.to_string())),
        }
    }

    // ─── Mode & selection ────────────────────────────────────────────────

    /// Select `id`, or clear the selection with `None`.
    ///
    /// # Errors
    /// `UnknownPolygon` when `id` is not in the set.
    pub fn select_polygon(&mut self, id: Option<PolygonId>) -> Result<(), EditError> {
        if let Some(id) = id
            && !self.set.contains(id)
        {
            return self.reject(EditError::UnknownPolygon(id.to_string()));
        }
        let previous = self.state.selected();
        if previous == id {
            return Ok(());
        }
        self.state.set_selected(id);
        self.transition.start(id, self.clock_ms, self.config.selection_fade_ms);

        // Gestures bound to the previous selection do not carry over. The
        // outline being drawn in CreatePolygon belongs to no polygon.
        self.interaction.drag = None;
        self.interaction.slice = SliceGesture::default();
        self.interaction.anchor = None;
        if self.mode().behavior().point_gesture != Some(PointGesture::CreatePolygon) {
            self.interaction.pending.clear();
        }
        log::debug!("selection {previous:?} -> {id:?}");
        self.scheduler.request_frame();
        Ok(())
    }

    /// Switch mode. Every in-progress gesture is discarded; the selection
    /// is kept.
    pub fn set_mode(&mut self, mode: EditMode) {
        let previous = self.state.mode();
        if previous == mode {
            return;
        }
        self.interaction.clear();
        self.state.set_mode(mode);
        log::debug!("mode {previous} -> {mode}");
        self.scheduler.request_frame();
    }

    /// Back to View from any mode, dropping every partial gesture at once.
    pub fn escape(&mut self) {
        self.interaction.clear();
        self.state.set_mode(EditMode::View);
        log::debug!("escape: back to view");
        self.scheduler.request_frame();
    }

    // ─── Operations ──────────────────────────────────────────────────────

    /// Insert `point` on edge `edge` of `id`.
    ///
    /// # Errors
    /// The edge does not exist, or the new ring would self-intersect.
    pub fn add_vertex(&mut self, id: PolygonId, edge: usize, point: Point) -> Result<(), EditError> {
        let result = self.try_add_vertex(id, edge, point);
        self.report(result)
    }

    fn try_add_vertex(&mut self, id: PolygonId, edge: usize, point: Point) -> Result<(), EditError> {
        let ring = vertex::insert_vertex(self.polygon(id)?.points(), edge, point)?;
        self.replace_ring(id, ring, "Add vertex")
    }

    /// Replace the boundary between vertices `start` and `end` of `id` with
    /// `points` (ordered from `start` towards `end`).
    ///
    /// # Errors
    /// Anchors out of range or identical, or no simple ring results.
    pub fn add_points(&mut self, id: PolygonId, start: usize, end: usize, points: &[Point]) -> Result<(), EditError> {
        let result = self.try_add_points(id, start, end, points);
        self.report(result)
    }

    fn try_add_points(&mut self, id: PolygonId, start: usize, end: usize, points: &[Point]) -> Result<(), EditError> {
        let ring = vertex::splice_between(self.polygon(id)?.points(), start, end, points)?;
        self.replace_ring(id, ring, "Add points")
    }

    /// Remove vertex `index` of `id`.
    ///
    /// # Errors
    /// Index out of range, or the polygon already has only 3 points.
    pub fn delete_vertex(&mut self, id: PolygonId, index: usize) -> Result<(), EditError> {
        let result = self.try_delete_vertex(id, index);
        self.report(result)
    }

    fn try_delete_vertex(&mut self, id: PolygonId, index: usize) -> Result<(), EditError> {
        let ring = vertex::remove_vertex(self.polygon(id)?.points(), index)?;
        self.replace_ring(id, ring, "Delete vertex")
    }

    /// Move the drag of vertex `index` of `id` to `offset` from its
    /// original position. Starts a drag if none is running on that vertex.
    /// Nothing is stored until `commit_drag`.
    ///
    /// # Errors
    /// Unknown polygon or vertex, or a non-finite offset.
    pub fn drag_vertex(&mut self, id: PolygonId, index: usize, offset: Vec2) -> Result<(), EditError> {
        let result = self.try_drag_vertex(id, index, offset);
        self.report(result)
    }

    fn try_drag_vertex(&mut self, id: PolygonId, index: usize, offset: Vec2) -> Result<(), EditError> {
        if !(offset.x.is_finite() && offset.y.is_finite()) {
            return Err(VertexError::NonFinite.into());
        }
        let polygon = self.polygon(id)?;
        let origin = polygon.point(index).ok_or(VertexError::IndexOutOfRange {
            index,
            len: polygon.len(),
        })?;
        let fresh = DragState::new(id, index, origin, origin);
        let drag = self.interaction.drag.get_or_insert(fresh);
        if drag.polygon != id || drag.index != index {
            *drag = fresh;
        }
        drag.offset = offset;
        self.scheduler.request_frame();
        Ok(())
    }

    /// Store the dragged vertex at its final position. Returns `false` for
    /// a drag that ended where it started (nothing is recorded).
    ///
    /// # Errors
    /// `NoDrag` when no drag is running; the polygon vanished.
    pub fn commit_drag(&mut self) -> Result<bool, EditError> {
        let result = self.try_commit_drag();
        self.report(result)
    }

    fn try_commit_drag(&mut self) -> Result<bool, EditError> {
        let drag = self.interaction.drag.take().ok_or(EditError::NoDrag)?;
        self.scheduler.request_frame();
        if drag.is_noop() {
            log::trace!("drag of {}[{}] released in place", drag.polygon, drag.index);
            return Ok(false);
        }
        let ring = vertex::move_vertex(self.polygon(drag.polygon)?.points(), drag.index, drag.offset)?;
        self.replace_ring(drag.polygon, ring, "Move vertex")?;
        Ok(true)
    }

    /// Drop the running drag without storing anything.
    pub fn cancel_drag(&mut self) -> bool {
        let cancelled = self.interaction.drag.take().is_some();
        if cancelled {
            self.scheduler.request_frame();
        }
        cancelled
    }

    /// Split `id` along the line `p1`–`p2`, replacing it with two new
    /// polygons. If `id` was selected, the larger piece becomes selected.
    ///
    /// # Errors
    /// The slice diagnostics of `seg_core::slice`, or an unknown polygon.
    pub fn slice_polygon(&mut self, id: PolygonId, p1: Point, p2: Point) -> Result<[PolygonId; 2], EditError> {
        let result = self.try_slice_polygon(id, p1, p2);
        self.report(result)
    }

    fn try_slice_polygon(&mut self, id: PolygonId, p1: Point, p2: Point) -> Result<[PolygonId; 2], EditError> {
        let set = &self.set;
        let source = set
            .get(id)
            .ok_or_else(|| EditError::UnknownPolygon(id.to_string()))?;
        let pieces = seg_core::slice::slice_polygon(source, p1, p2, || set.fresh_id(ID_PREFIX))?;
        let ids = [pieces[0].id, pieces[1].id];
        let larger = if pieces[0].area() >= pieces[1].area() { ids[0] } else { ids[1] };

        if !self.commit("Slice polygon", |set| set.split_replace(id, Vec::from(pieces))) {
            return Err(EditError::UnknownPolygon(id.to_string()));
        }
        self.interaction.slice = SliceGesture::default();
        if self.state.selected() == Some(id) {
            self.state.set_selected(Some(larger));
            self.transition.snap(Some(larger));
        }
        log::debug!("sliced {id} into {} and {}", ids[0], ids[1]);
        Ok(ids)
    }

    /// Add a new external polygon with the ring `points` and select it.
    ///
    /// # Errors
    /// Fewer than 3 distinct points, a self-intersecting or zero-area ring,
    /// or non-finite coordinates.
    pub fn create_polygon(&mut self, points: &[Point]) -> Result<PolygonId, EditError> {
        let result = self.try_create_polygon(points);
        self.report(result)
    }

    fn try_create_polygon(&mut self, points: &[Point]) -> Result<PolygonId, EditError> {
        if points.iter().any(|p| !p.is_finite()) {
            return Err(VertexError::NonFinite.into());
        }
        let mut ring = points.to_vec();
        geometry::normalize_ring(&mut ring);
        if ring.len() < vertex::MIN_POINTS {
            return Err(EditError::TooFewPoints { count: ring.len() });
        }
        if geometry::area(&ring) <= geometry::EPSILON {
            return Err(EditError::ZeroArea);
        }
        if !geometry::is_simple(&ring) {
            return Err(EditError::SelfIntersecting);
        }

        let id = self.set.fresh_id(ID_PREFIX);
        let polygon = Polygon::new(id, ring, PolygonKind::External);
        if !self.commit("Create polygon", |set| set.insert(polygon)) {
            return Err(EditError::UnknownPolygon(id.to_string()));
        }
        self.select_polygon(Some(id))?;
        Ok(id)
    }

    /// Remove `id` from the set. Holes inside it lose their parent.
    ///
    /// # Errors
    /// `UnknownPolygon` when `id` is not in the set.
    pub fn delete_polygon(&mut self, id: PolygonId) -> Result<(), EditError> {
        let result = self.try_delete_polygon(id);
        self.report(result)
    }

    fn try_delete_polygon(&mut self, id: PolygonId) -> Result<(), EditError> {
        if !self.commit("Delete polygon", |set| set.remove(id).is_some()) {
            return Err(EditError::UnknownPolygon(id.to_string()));
        }
        if self.interaction.drag.is_some_and(|d| d.polygon == id) {
            self.interaction.drag = None;
        }
        if self.state.selected() == Some(id) {
            self.state.set_selected(None);
            self.transition.snap(None);
        }
        Ok(())
    }

    /// Step back one edit. Returns its label, or `None` when there is
    /// nothing to undo.
    pub fn undo(&mut self) -> Option<String> {
        let entry = self.history.undo(self.set.snapshot(), self.clock_ms)?;
        self.set.restore(entry.snapshot);
        self.after_time_travel();
        log::debug!("undo: {}", entry.label);
        Some(entry.label)
    }

    pub fn redo(&mut self) -> Option<String> {
        let entry = self.history.redo(self.set.snapshot(), self.clock_ms)?;
        self.set.restore(entry.snapshot);
        self.after_time_travel();
        log::debug!("redo: {}", entry.label);
        Some(entry.label)
    }

    /// Restored state is shown at once: no fade, no stale gestures.
    fn after_time_travel(&mut self) {
        self.interaction.clear();
        self.interaction.hover = HitTarget::Canvas;
        let selected = self.state.selected().filter(|id| self.set.contains(*id));
        self.state.set_selected(selected);
        self.transition.snap(selected);
        self.last_diagnostic = None;
        self.scheduler.request_frame();
    }

    // ─── Commit plumbing ─────────────────────────────────────────────────

    fn polygon(&self, id: PolygonId) -> Result<&Polygon, EditError> {
        self.set
            .get(id)
            .ok_or_else(|| EditError::UnknownPolygon(id.to_string()))
    }

    fn replace_ring(&mut self, id: PolygonId, ring: Vec<Point>, label: &str) -> Result<(), EditError> {
        if !self.commit(label, |set| set.update(id, |p| p.set_points(ring)).is_some()) {
            return Err(EditError::UnknownPolygon(id.to_string()));
        }
        // Vertex indices of this polygon have shifted.
        if self.interaction.anchor.is_some_and(|a| a.polygon == id) {
            self.interaction.anchor = None;
            self.interaction.pending.clear();
        }
        Ok(())
    }

    /// Apply `edit` and record the prior state under `label`. An edit that
    /// returns `false` is rolled back and records nothing.
    fn commit(&mut self, label: &str, edit: impl FnOnce(&mut PolygonSet) -> bool) -> bool {
        let before = self.set.snapshot();
        if !edit(&mut self.set) {
            self.set.restore(before);
            return false;
        }
        self.history.push(before, label, self.clock_ms);
        self.last_diagnostic = None;
        self.interaction.hover = HitTarget::Canvas;
        log::debug!(
            "{label}: {} polygons, {} vertices, {} undo entries",
            self.set.len(),
            self.set.vertex_count(),
            self.history.undo_len()
        );
        self.scheduler.request_frame();
        true
    }

    fn reject<T>(&mut self, err: EditError) -> Result<T, EditError> {
        log::warn!("{}: {err}", err.code());
        self.last_diagnostic = Some(Diagnostic::from(&err));
        Err(err)
    }

    fn report<T>(&mut self, result: Result<T, EditError>) -> Result<T, EditError> {
        result.or_else(|err| self.reject(err))
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Feed one input event. Pointer moves are queued and applied by the
    /// next `frame`; everything else is handled immediately.
    ///
    /// Returns `true` when the host has to schedule a frame callback.
    pub fn handle_event(&mut self, event: &InputEvent) -> bool {
        let already_requested = self.scheduler.is_requested();
        match event {
            InputEvent::PointerMove { x, y, modifiers } => {
                self.interaction.shift_held = modifiers.shift;
                self.scheduler.queue_pointer_move(Point::new(*x, *y));
            }
            InputEvent::PointerDown {
                x,
                y,
                button,
                modifiers,
            } => {
                self.flush_pointer();
                self.pointer_down(Point::new(*x, *y), *button, *modifiers);
            }
            InputEvent::PointerUp { x, y, button } => {
                self.flush_pointer();
                self.pointer_up(Point::new(*x, *y), *button);
            }
            InputEvent::Wheel { x, y, delta_y } => self.wheel(Point::new(*x, *y), *delta_y),
            InputEvent::KeyDown { key, modifiers } => {
                self.key_down(key, *modifiers);
            }
            InputEvent::KeyUp { key, .. } => self.key_up(key),
        }
        !already_requested && self.scheduler.is_requested()
    }

    /// Apply a queued pointer move before a press or release, so the
    /// button event sees the latest position.
    fn flush_pointer(&mut self) {
        if let Some(screen) = self.scheduler.take_pointer() {
            self.apply_pointer(screen);
        }
    }

    /// Primary, middle or secondary press at screen position `screen`.
    pub fn pointer_down(&mut self, screen: Point, button: PointerButton, modifiers: Modifiers) {
        self.interaction.shift_held = modifiers.shift;
        let world = self.transform.screen_to_world(screen);
        self.interaction.cursor = Some(world);
        match button {
            PointerButton::Middle => {
                self.interaction.pan = Some(PanState { last: screen });
                return;
            }
            PointerButton::Secondary => return,
            PointerButton::Primary => {}
        }

        // Read at the moment of the click, never cached.
        let state = self.state.get();
        let target = self.hit(world);
        let outcome = resolve_click(
            state.mode,
            target,
            ClickContext {
                selected: state.selected,
                add_modifier: modifiers.shift,
            },
        );
        log::trace!("click in {} on {target:?} -> {outcome:?}", state.mode);

        match outcome {
            ClickOutcome::Select { id, enter } => {
                if self.select_polygon(Some(id)).is_ok()
                    && let Some(mode) = enter
                {
                    self.set_mode(mode);
                }
            }
            ClickOutcome::Delete(id) => {
                let _ = self.delete_polygon(id);
            }
            ClickOutcome::PlacePoint(gesture) => self.place_point(gesture, world, screen),
            ClickOutcome::Anchor { polygon, index, enter } => {
                if let Some(mode) = enter {
                    self.set_mode(mode);
                }
                self.anchor_click(polygon, index);
            }
            ClickOutcome::BeginDrag { polygon, index } => {
                if let Some(origin) = self.set.get(polygon).and_then(|p| p.point(index)) {
                    self.interaction.drag = Some(DragState::new(polygon, index, origin, world));
                }
            }
            ClickOutcome::Deselect => {
                let _ = self.select_polygon(None);
                if state.mode.behavior().background_pans {
                    self.interaction.pan = Some(PanState { last: screen });
                }
            }
        }
        self.scheduler.request_frame();
    }

    /// Pointer moved to `screen`, applied immediately (no coalescing).
    pub fn pointer_move(&mut self, screen: Point) {
        self.apply_pointer(screen);
        self.scheduler.request_frame();
    }

    fn apply_pointer(&mut self, screen: Point) {
        let world = self.transform.screen_to_world(screen);
        self.interaction.cursor = Some(world);
        if let Some(pan) = &mut self.interaction.pan {
            let delta = screen.to_vec2() - pan.last.to_vec2();
            pan.last = screen;
            self.transform.pan_by(delta);
        } else if let Some(drag) = &mut self.interaction.drag {
            drag.update(world);
        } else {
            if self.interaction.slice.start.is_some() {
                self.interaction.slice.preview = Some(world);
            }
            self.interaction.hover = self.hit(world);
        }
    }

    pub fn pointer_up(&mut self, screen: Point, button: PointerButton) {
        if self.interaction.pan.is_some() || self.interaction.drag.is_some() {
            self.apply_pointer(screen);
        }
        if self.interaction.pan.take().is_some() {
            self.scheduler.request_frame();
            return;
        }
        if button == PointerButton::Primary && self.interaction.drag.is_some() {
            let _ = self.commit_drag();
        }
    }

    /// Wheel notch at `screen`: zoom one step, keeping the point under the
    /// cursor in place.
    pub fn wheel(&mut self, screen: Point, delta_y: f64) {
        if delta_y == 0.0 || !delta_y.is_finite() {
            return;
        }
        if self.transform.zoom_step(-delta_y.signum(), screen) {
            self.scheduler.request_frame();
        }
    }

    /// Returns `true` when the key was consumed.
    pub fn key_down(&mut self, key: &str, modifiers: Modifiers) -> bool {
        if key == "Shift" {
            self.interaction.shift_held = true;
            self.scheduler.request_frame();
            return true;
        }
        self.interaction.shift_held = modifiers.shift;
        let Some(action) = ShortcutMap::resolve(key, modifiers.ctrl, modifiers.shift, modifiers.alt, modifiers.meta)
        else {
            return false;
        };
        log::trace!("shortcut {key:?} -> {action:?}");
        self.apply_shortcut(action);
        true
    }

    pub fn key_up(&mut self, key: &str) {
        if key == "Shift" {
            self.interaction.shift_held = false;
            self.scheduler.request_frame();
        }
    }

    pub fn apply_shortcut(&mut self, action: ShortcutAction) {
        match action {
            ShortcutAction::Escape => self.escape(),
            ShortcutAction::SetMode(mode) => self.set_mode(mode),
            ShortcutAction::Undo => {
                self.undo();
            }
            ShortcutAction::Redo => {
                self.redo();
            }
            ShortcutAction::DeleteSelected => match self.interaction.hover {
                HitTarget::Vertex { polygon, index } => {
                    let _ = self.delete_vertex(polygon, index);
                }
                _ => {
                    if let Some(id) = self.selected() {
                        let _ = self.delete_polygon(id);
                    }
                }
            },
            ShortcutAction::FinishPolygon => {
                self.finish_polygon();
            }
            ShortcutAction::RemoveLastPoint => self.remove_last_point(),
            ShortcutAction::ZoomIn => self.zoom_step(1.0),
            ShortcutAction::ZoomOut => self.zoom_step(-1.0),
            ShortcutAction::ZoomToFit => self.fit_to_content(),
        }
    }

    // ─── Point gestures ──────────────────────────────────────────────────

    fn place_point(&mut self, gesture: PointGesture, world: Point, screen: Point) {
        if self.mode().behavior().requires_selection && self.selected().is_none() {
            let _ = self.reject::<()>(EditError::NoSelection);
            return;
        }
        match gesture {
            PointGesture::Slice => self.place_slice_point(world),
            PointGesture::CreatePolygon => self.place_outline_point(world, screen),
            PointGesture::AddPoints => self.place_add_point(world),
        }
    }

    /// First click anchors the line, the second one cuts.
    fn place_slice_point(&mut self, world: Point) {
        let Some(id) = self.selected() else {
            return;
        };
        match self.interaction.slice.start {
            None => {
                self.interaction.slice = SliceGesture {
                    start: Some(world),
                    preview: Some(world),
                };
            }
            Some(start) => {
                self.interaction.slice = SliceGesture::default();
                let _ = self.slice_polygon(id, start, world);
            }
        }
    }

    fn place_outline_point(&mut self, world: Point, screen: Point) {
        if self.closes_outline(screen) {
            self.finish_polygon();
            return;
        }
        self.interaction.pending.push(world);
    }

    /// With an anchor the point extends the sequence; without one it is
    /// inserted on the nearest edge of the selected polygon.
    fn place_add_point(&mut self, world: Point) {
        if self.interaction.anchor.is_some() {
            self.interaction.pending.push(world);
            return;
        }
        let Some(id) = self.selected() else {
            return;
        };
        let Some(edge) = self.set.get(id).and_then(|p| geometry::nearest_edge(p.points(), world)) else {
            return;
        };
        let _ = self.add_vertex(id, edge, world);
    }

    fn anchor_click(&mut self, polygon: PolygonId, index: usize) {
        match self.interaction.anchor {
            Some(start) if start.polygon == polygon && start.index != index => {
                let inserted = std::mem::take(&mut self.interaction.pending);
                if self.add_points(polygon, start.index, index, &inserted).is_err() {
                    // Keep the sequence so the user can fix it up.
                    self.interaction.pending = inserted;
                }
            }
            _ => {
                self.interaction.anchor = Some(Anchor { polygon, index });
                self.interaction.pending.clear();
            }
        }
    }

    /// A click at `screen` lands on the first point of an outline that can
    /// be closed.
    fn closes_outline(&self, screen: Point) -> bool {
        let pending = &self.interaction.pending;
        self.mode().behavior().point_gesture == Some(PointGesture::CreatePolygon)
            && pending.len() >= vertex::MIN_POINTS
            && pending
                .first()
                .is_some_and(|first| self.transform.world_to_screen(*first).distance(screen) <= self.config.close_radius_px)
    }

    /// Commit the outline drawn in CreatePolygon mode. On rejection the
    /// points stay so the user can fix the outline.
    pub fn finish_polygon(&mut self) -> Option<PolygonId> {
        if self.mode().behavior().point_gesture != Some(PointGesture::CreatePolygon)
            || self.interaction.pending.is_empty()
        {
            return None;
        }
        let points = self.interaction.pending.to_vec();
        let id = self.create_polygon(&points).ok()?;
        self.interaction.pending.clear();
        Some(id)
    }

    /// Undo the last placed point of the current gesture.
    pub fn remove_last_point(&mut self) {
        if self.interaction.slice.start.is_some() {
            self.interaction.slice = SliceGesture::default();
        } else {
            self.interaction.pending.pop();
        }
        self.scheduler.request_frame();
    }

    // ─── View ────────────────────────────────────────────────────────────

    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport = Viewport { width, height };
        self.scheduler.request_frame();
    }

    pub fn fit_to_content(&mut self) {
        if let Some(bounds) = self.set.bounds() {
            self.transform.fit_to_bounds(bounds, self.viewport, FIT_PADDING_PX);
            self.scheduler.request_frame();
        }
    }

    /// Zoom by `steps` around the viewport center.
    pub fn zoom_step(&mut self, steps: f64) {
        if self.transform.zoom_step(steps, self.viewport.center()) {
            self.scheduler.request_frame();
        }
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.transform.pan_by(delta);
        self.scheduler.request_frame();
    }

    // ─── Frames ──────────────────────────────────────────────────────────

    /// Advance the editor clock without running a frame.
    pub fn tick(&mut self, time_ms: f64) {
        self.clock_ms = time_ms;
    }

    /// Frame callback: applies the coalesced pointer move and keeps frames
    /// coming while the selection fades in. `None` after `teardown`.
    pub fn frame(&mut self, time_ms: f64) -> Option<FrameTick> {
        self.clock_ms = time_ms;
        let tick = self.scheduler.begin_frame(time_ms)?;
        if let Some(screen) = tick.pointer {
            self.apply_pointer(screen);
        }
        if self.transition.is_animating(time_ms) {
            self.scheduler.request_frame();
        }
        Some(tick)
    }

    /// Whether a frame callback is outstanding.
    pub fn needs_frame(&self) -> bool {
        self.scheduler.is_requested()
    }

    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    /// Stop frame scheduling for good and drop transient state.
    pub fn teardown(&mut self) {
        self.scheduler.cancel();
        self.interaction.clear();
        log::info!("editor torn down with {} polygons", self.set.len());
    }

    // ─── Render input ────────────────────────────────────────────────────

    pub fn set_marker_palette(&mut self, palette: MarkerPalette) {
        self.markers.palette = palette;
        self.scheduler.request_frame();
    }

    pub fn selection_alpha(&self) -> f64 {
        self.transition.alpha(self.clock_ms)
    }

    /// Visual state of the selected polygon's markers.
    pub fn marker_state(&self) -> MarkerState {
        let selected = self.selected();
        let on_selected = |id: PolygonId| selected == Some(id);
        MarkerState {
            hovered: match self.interaction.hover {
                HitTarget::Vertex { polygon, index } if on_selected(polygon) => Some(index),
                _ => None,
            },
            selected: self
                .interaction
                .anchor
                .filter(|a| on_selected(a.polygon))
                .map(|a| a.index),
            dragging: self
                .interaction
                .drag
                .filter(|d| on_selected(d.polygon))
                .map(|d| (d.index, d.offset)),
        }
    }

    /// Rebuild the marker instances for this frame. Empty unless the mode
    /// shows vertices and a polygon is selected.
    pub fn marker_frame(&mut self) -> &MarkerFrame {
        let markers = self.marker_state();
        let state = self.state.get();
        let polygon = state
            .selected
            .filter(|_| state.mode.behavior().shows_vertices)
            .and_then(|id| self.set.get(id));
        self.markers
            .build(polygon, &markers, &self.transform, self.viewport, &self.config)
    }

    pub fn overlay(&self) -> Overlay<'_> {
        let cursor = self.interaction.cursor;
        let add_point_hint = match self.interaction.hover {
            HitTarget::Vertex { polygon, index } => {
                let ctx = ClickContext {
                    selected: self.selected(),
                    add_modifier: self.interaction.shift_held,
                };
                match resolve_click(self.mode(), self.interaction.hover, ctx) {
                    ClickOutcome::Anchor { .. } => self.set.get(polygon).and_then(|p| p.point(index)),
                    _ => None,
                }
            }
            _ => None,
        };
        Overlay {
            slice_line: self.interaction.slice_line(),
            pending_points: self.interaction.pending.as_slice(),
            cursor: cursor.filter(|_| !self.interaction.pending.is_empty()),
            close_hint: cursor.is_some_and(|c| self.closes_outline(self.transform.world_to_screen(c))),
            add_point_hint,
        }
    }

    pub fn paint_input(&self) -> PaintInput<'_> {
        PaintInput {
            set: &self.set,
            selected: self.selected(),
            selection_alpha: self.selection_alpha(),
            transform: &self.transform,
            viewport: self.viewport,
            cull_margin_px: self.config.cull_margin_px,
            drag: self.marker_state().dragging,
            overlay: self.overlay(),
        }
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default(), Viewport::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn square_set(id: &str) -> PolygonSet {
        let mut set = PolygonSet::new();
        set.insert(Polygon::new(
            PolygonId::intern(id),
            vec![
                Point::new(0.0, 0.0),
                Point::new(10.0, 0.0),
                Point::new(10.0, 10.0),
                Point::new(0.0, 10.0),
            ],
            PolygonKind::External,
        ));
        set
    }

    /// Editor with an identity transform (fit is undone), so screen == world.
    fn editor_with(id: &str) -> Editor {
        let mut editor = Editor::default();
        editor.load(square_set(id));
        editor.transform = Transform::new(editor.config.zoom);
        editor
    }

    #[test]
    fn rejection_records_diagnostic_and_keeps_state() {
        let mut editor = editor_with("ed_reject");
        let id = PolygonId::intern("ed_reject");
        let err = editor
            .slice_polygon(id, Point::new(20.0, 20.0), Point::new(30.0, 20.0))
            .unwrap_err();
        assert_eq!(err.code(), "slice.no_intersection");
        assert_eq!(editor.last_diagnostic().map(|d| d.code), Some("slice.no_intersection"));
        assert!(!editor.can_undo());
        assert_eq!(editor.polygons().len(), 1);
    }

    #[test]
    fn drag_commits_only_on_release() {
        let mut editor = editor_with("ed_drag");
        let id = PolygonId::intern("ed_drag");
        editor.drag_vertex(id, 2, Vec2::new(3.0, 4.0)).unwrap();
        assert_eq!(editor.polygons().get(id).unwrap().point(2), Some(Point::new(10.0, 10.0)));
        assert!(!editor.can_undo());

        assert_eq!(editor.commit_drag(), Ok(true));
        assert_eq!(editor.polygons().get(id).unwrap().point(2), Some(Point::new(13.0, 14.0)));
        assert_eq!(editor.history().undo_label(), Some("Move vertex"));
        assert_eq!(editor.commit_drag(), Err(EditError::NoDrag));
    }

    #[test]
    fn inverted_zoom_limits_never_reach_the_transform() {
        let mut config = EditorConfig::default();
        config.zoom.min = 10.0;
        config.zoom.max = 2.0;
        assert!(Editor::try_new(config.clone(), Viewport::default()).is_err());

        let editor = Editor::new(config, Viewport::default());
        assert_eq!(editor.config().zoom, EditorConfig::default().zoom);
        assert_eq!(editor.transform().zoom(), 1.0);
    }

    #[test]
    fn host_ids_resolve_without_interning() {
        let mut editor = editor_with("ed_resolve");
        assert_eq!(editor.resolve_id("ed_resolve"), Ok(PolygonId::intern("ed_resolve")));

        let err = editor.resolve_id("ed_resolve_typo").unwrap_err();
        assert_eq!(err.code(), "edit.unknown_polygon");
        assert_eq!(PolygonId::lookup("ed_resolve_typo"), None);
        assert_eq!(editor.last_diagnostic().map(|d| d.code), Some("edit.unknown_polygon"));
    }

    #[test]
    fn outline_tracks_a_drag_before_release() {
        let mut editor = editor_with("ed_outline");
        let id = PolygonId::intern("ed_outline");
        editor.select_polygon(Some(id)).unwrap();
        editor.drag_vertex(id, 2, Vec2::new(3.0, 4.0)).unwrap();

        let input = editor.paint_input();
        assert_eq!(input.drag, Some((2, Vec2::new(3.0, 4.0))));
        let path = seg_render::selected_path(&input).unwrap();
        assert_eq!(
            kurbo::Shape::bounding_box(&path),
            kurbo::Rect::new(0.0, 0.0, 13.0, 14.0)
        );

        editor.cancel_drag();
        assert_eq!(editor.paint_input().drag, None);
    }

    #[test]
    fn zero_drag_records_nothing() {
        let mut editor = editor_with("ed_zero_drag");
        editor
            .drag_vertex(PolygonId::intern("ed_zero_drag"), 0, Vec2::ZERO)
            .unwrap();
        assert_eq!(editor.commit_drag(), Ok(false));
        assert!(!editor.can_undo());
    }

    #[test]
    fn pointer_moves_coalesce_into_one_frame() {
        let mut editor = editor_with("ed_coalesce");
        editor.frame(0.0);
        let first = editor.handle_event(&InputEvent::PointerMove {
            x: 1.0,
            y: 1.0,
            modifiers: Modifiers::NONE,
        });
        let second = editor.handle_event(&InputEvent::PointerMove {
            x: 5.0,
            y: 5.0,
            modifiers: Modifiers::NONE,
        });
        assert!(first);
        assert!(!second, "a frame is already pending");
        let tick = editor.frame(16.0).unwrap();
        assert_eq!(tick.pointer, Some(Point::new(5.0, 5.0)));
        assert_eq!(editor.hover(), HitTarget::Polygon(PolygonId::intern("ed_coalesce")));
    }

    #[test]
    fn create_outline_closes_on_first_point() {
        let mut editor = editor_with("ed_create");
        editor.set_mode(EditMode::CreatePolygon);
        for (x, y) in [(20.0, 20.0), (30.0, 20.0), (30.0, 30.0)] {
            editor.handle_event(&InputEvent::click(x, y));
        }
        assert_eq!(editor.interaction().pending.len(), 3);
        editor.handle_event(&InputEvent::click(21.0, 21.0));

        assert_eq!(editor.polygons().len(), 2);
        assert!(editor.interaction().pending.is_empty());
        assert_eq!(editor.mode(), EditMode::CreatePolygon);
        assert!(editor.selected().is_some());
        assert_eq!(editor.history().undo_label(), Some("Create polygon"));
    }

    #[test]
    fn teardown_stops_frames() {
        let mut editor = editor_with("ed_teardown");
        editor.teardown();
        assert!(editor.frame(1.0).is_none());
        assert!(!editor.handle_event(&InputEvent::click(5.0, 5.0)));
    }
}
