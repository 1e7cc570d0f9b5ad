//! WASM bridge for SegEdit: exposes the polygon editor to JavaScript.
//!
//! Compiled via `wasm-pack build --target web`. The page owns the canvas
//! and the `requestAnimationFrame` loop; every input method returns whether
//! a frame callback has to be scheduled, and `frame` returns whether
//! another one is wanted.

mod render2d;

use seg_core::ingest::{self, IngestDiagnostic, RawPoint};
use seg_core::model::Point;
use seg_core::{EditorConfig, Viewport, handoff};
use seg_editor::{EditError, EditMode, Editor, InputEvent, Modifiers, PointerButton};
use seg_render::MarkerPalette;
use serde::Serialize;
use serde_json::json;
use wasm_bindgen::prelude::*;
use web_sys::CanvasRenderingContext2d;

/// The main WASM-facing canvas controller.
///
/// Owns one `Editor`. All interaction from the page goes through this
/// struct; mutating calls answer with a JSON result string.
#[wasm_bindgen]
pub struct SegCanvas {
    editor: Editor,
    /// `false` = light (default), `true` = dark.
    dark_mode: bool,
}

#[wasm_bindgen]
impl SegCanvas {
    /// Create a canvas controller with default settings.
    #[wasm_bindgen(constructor)]
    pub fn new(width: f64, height: f64) -> Self {
        console_error_panic_hook_setup();
        console_logger_setup();
        Self::with_editor(Editor::new(EditorConfig::default(), Viewport { width, height }))
    }

    /// Create a canvas controller from a (possibly partial) JSON config.
    /// Throws when the config is malformed or out of range.
    pub fn with_config(width: f64, height: f64, config_json: &str) -> Result<SegCanvas, JsValue> {
        console_error_panic_hook_setup();
        console_logger_setup();
        let config = EditorConfig::from_json(config_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(Self::with_editor(Editor::new(config, Viewport { width, height })))
    }

    // ─── Ingestion & hand-off ────────────────────────────────────────────

    /// Replace the polygon set with producer JSON. Returns
    /// `{"ok":true,"loaded":n,"dropped":[...]}` or `{"ok":false,...}`.
    pub fn load_polygons(&mut self, json: &str) -> String {
        match self.editor.load_json(json) {
            Ok(diagnostics) => self.loaded_json(&diagnostics),
            Err(e) => json!({ "ok": false, "code": e.code(), "message": e.to_string() }).to_string(),
        }
    }

    /// Same as `load_polygons`, from a MessagePack document.
    pub fn load_msgpack(&mut self, bytes: &[u8]) -> String {
        match ingest::ingest_msgpack(bytes) {
            Ok(report) => {
                self.editor.load(report.set);
                self.loaded_json(&report.diagnostics)
            }
            Err(e) => json!({ "ok": false, "code": e.code(), "message": e.to_string() }).to_string(),
        }
    }

    /// The current polygon set as hand-off JSON.
    pub fn export_polygons(&self) -> String {
        handoff::to_json(self.editor.polygons()).unwrap_or_else(|e| {
            log::error!("export failed: {e}");
            "[]".to_string()
        })
    }

    pub fn export_msgpack(&self) -> Vec<u8> {
        handoff::to_msgpack(self.editor.polygons()).unwrap_or_else(|e| {
            log::error!("msgpack export failed: {e}");
            Vec::new()
        })
    }

    // ─── Rendering ───────────────────────────────────────────────────────

    /// Draw outlines, gesture overlays and vertex markers.
    pub fn render(&mut self, ctx: &CanvasRenderingContext2d) {
        let theme = if self.dark_mode {
            render2d::CanvasTheme::dark()
        } else {
            render2d::CanvasTheme::light()
        };
        render2d::render_outlines(ctx, &self.editor.paint_input(), &theme);
        render2d::render_markers(ctx, self.editor.marker_frame());
    }

    /// Frame callback. Returns `true` when another frame is wanted.
    pub fn frame(&mut self, time_ms: f64) -> bool {
        self.editor.frame(time_ms).is_some() && self.editor.needs_frame()
    }

    /// Set the canvas theme.
    pub fn set_theme(&mut self, is_dark: bool) {
        self.dark_mode = is_dark;
        self.editor.set_marker_palette(if is_dark {
            MarkerPalette::dark()
        } else {
            MarkerPalette::light()
        });
    }

    /// Resize the canvas.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.editor.set_viewport(width, height);
    }

    pub fn fit_to_view(&mut self) {
        self.editor.fit_to_content();
    }

    /// Stop frame scheduling; call when the editor is unmounted.
    pub fn teardown(&mut self) {
        self.editor.teardown();
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// `button` is the DOM `PointerEvent.button` value.
    #[allow(clippy::too_many_arguments)]
    pub fn handle_pointer_down(
        &mut self,
        x: f64,
        y: f64,
        button: i16,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
    ) -> bool {
        self.editor.handle_event(&InputEvent::PointerDown {
            x,
            y,
            button: PointerButton::from_dom(button),
            modifiers: Modifiers {
                shift,
                ctrl,
                alt,
                meta,
            },
        })
    }

    pub fn handle_pointer_move(&mut self, x: f64, y: f64, shift: bool, ctrl: bool, alt: bool, meta: bool) -> bool {
        self.editor.handle_event(&InputEvent::PointerMove {
            x,
            y,
            modifiers: Modifiers {
                shift,
                ctrl,
                alt,
                meta,
            },
        })
    }

    pub fn handle_pointer_up(&mut self, x: f64, y: f64, button: i16) -> bool {
        self.editor.handle_event(&InputEvent::PointerUp {
            x,
            y,
            button: PointerButton::from_dom(button),
        })
    }

    pub fn handle_wheel(&mut self, x: f64, y: f64, delta_y: f64) -> bool {
        self.editor.handle_event(&InputEvent::Wheel { x, y, delta_y })
    }

    /// Handle a keyboard event. Returns a JSON string:
    /// `{"handled":bool,"mode":"<mode>","frame":bool}`.
    pub fn handle_key(&mut self, key: &str, ctrl: bool, shift: bool, alt: bool, meta: bool) -> String {
        let already_requested = self.editor.needs_frame();
        let handled = self.editor.key_down(
            key,
            Modifiers {
                shift,
                ctrl,
                alt,
                meta,
            },
        );
        json!({
            "handled": handled,
            "mode": self.editor.mode().as_str(),
            "frame": !already_requested && self.editor.needs_frame(),
        })
        .to_string()
    }

    pub fn handle_key_up(&mut self, key: &str) -> bool {
        let already_requested = self.editor.needs_frame();
        self.editor.key_up(key);
        !already_requested && self.editor.needs_frame()
    }

    // ─── Imperative operations ───────────────────────────────────────────

    /// Switch mode by name (`"slice"`, `"editVertices"`, ...). Returns
    /// `false` for an unknown name.
    pub fn set_mode(&mut self, name: &str) -> bool {
        match name.parse::<EditMode>() {
            Ok(mode) => {
                self.editor.set_mode(mode);
                true
            }
            Err(e) => {
                log::warn!("{e}");
                false
            }
        }
    }

    pub fn get_mode(&self) -> String {
        self.editor.mode().as_str().to_string()
    }

    /// Select by id; an empty id clears the selection.
    pub fn select_polygon(&mut self, id: &str) -> String {
        let result = if id.is_empty() {
            self.editor.select_polygon(None)
        } else {
            self.editor.resolve_id(id).and_then(|id| self.editor.select_polygon(Some(id)))
        };
        edit_result(result)
    }

    /// Get the selected polygon id, or an empty string.
    pub fn get_selected_id(&self) -> String {
        self.editor.selected().map(|id| id.to_string()).unwrap_or_default()
    }

    pub fn add_vertex(&mut self, id: &str, edge: usize, x: f64, y: f64) -> String {
        let point = Point::new(x, y);
        edit_result(self.editor.resolve_id(id).and_then(|id| self.editor.add_vertex(id, edge, point)))
    }

    pub fn delete_vertex(&mut self, id: &str, index: usize) -> String {
        edit_result(self.editor.resolve_id(id).and_then(|id| self.editor.delete_vertex(id, index)))
    }

    /// Update the drag of a vertex (world-space offset). Nothing is stored
    /// until `commit_drag`.
    pub fn drag_vertex(&mut self, id: &str, index: usize, dx: f64, dy: f64) -> String {
        let offset = seg_core::kurbo::Vec2::new(dx, dy);
        edit_result(self.editor.resolve_id(id).and_then(|id| self.editor.drag_vertex(id, index, offset)))
    }

    /// `value` is `true` when the drag moved the vertex.
    pub fn commit_drag(&mut self) -> String {
        edit_result(self.editor.commit_drag())
    }

    pub fn cancel_drag(&mut self) -> bool {
        self.editor.cancel_drag()
    }

    /// `value` holds the two new polygon ids.
    pub fn slice_polygon(&mut self, id: &str, x1: f64, y1: f64, x2: f64, y2: f64) -> String {
        let result = self
            .editor
            .resolve_id(id)
            .and_then(|id| self.editor.slice_polygon(id, Point::new(x1, y1), Point::new(x2, y2)))
            .map(|ids| ids.map(|id| id.to_string()));
        edit_result(result)
    }

    /// `points_json` is `[{"x":..,"y":..}, ...]` or `[[x, y], ...]`.
    /// `value` holds the new polygon id.
    pub fn create_polygon(&mut self, points_json: &str) -> String {
        let points: Vec<RawPoint> = match serde_json::from_str(points_json) {
            Ok(points) => points,
            Err(e) => {
                return json!({ "ok": false, "code": "edit.malformed_points", "message": e.to_string() }).to_string();
            }
        };
        let points: Vec<Point> = points.into_iter().map(Point::from).collect();
        edit_result(self.editor.create_polygon(&points).map(|id| id.to_string()))
    }

    pub fn delete_polygon(&mut self, id: &str) -> String {
        edit_result(self.editor.resolve_id(id).and_then(|id| self.editor.delete_polygon(id)))
    }

    /// Undo the last edit.
    pub fn undo(&mut self) -> bool {
        self.editor.undo().is_some()
    }

    /// Redo the last undone edit.
    pub fn redo(&mut self) -> bool {
        self.editor.redo().is_some()
    }

    /// Editor state for the toolbar, as JSON.
    pub fn get_state(&self) -> String {
        let diagnostic = self
            .editor
            .last_diagnostic()
            .map(|d| json!({ "code": d.code, "message": d.message }));
        json!({
            "mode": self.editor.mode().as_str(),
            "selected": self.editor.selected().map(|id| id.to_string()),
            "canUndo": self.editor.can_undo(),
            "canRedo": self.editor.can_redo(),
            "undoLabel": self.editor.history().undo_label(),
            "redoLabel": self.editor.history().redo_label(),
            "polygons": self.editor.polygons().len(),
            "vertices": self.editor.polygons().vertex_count(),
            "zoom": self.editor.transform().zoom(),
            "diagnostic": diagnostic,
        })
        .to_string()
    }

    /// Set the console log level (`"error"` … `"trace"`).
    pub fn set_log_level(&self, level: &str) -> bool {
        match level.parse::<log::LevelFilter>() {
            Ok(filter) => {
                log::set_max_level(filter);
                true
            }
            Err(_) => false,
        }
    }
}

impl SegCanvas {
    fn with_editor(editor: Editor) -> Self {
        Self {
            editor,
            dark_mode: false,
        }
    }

    fn loaded_json(&self, diagnostics: &[IngestDiagnostic]) -> String {
        let dropped: Vec<_> = diagnostics
            .iter()
            .map(|d| {
                json!({
                    "index": d.index,
                    "id": d.id,
                    "code": d.error.code(),
                    "message": d.error.to_string(),
                })
            })
            .collect();
        json!({
            "ok": true,
            "loaded": self.editor.polygons().len(),
            "dropped": dropped,
        })
        .to_string()
    }
}

/// `{"ok":true,"value":...}` or `{"ok":false,"code":...,"message":...}`.
fn edit_result<T: Serialize>(result: Result<T, EditError>) -> String {
    match result {
        Ok(value) => json!({ "ok": true, "value": value }).to_string(),
        Err(e) => json!({ "ok": false, "code": e.code(), "message": e.to_string() }).to_string(),
    }
}

// ─── Console logging ─────────────────────────────────────────────────────

#[cfg(target_arch = "wasm32")]
struct ConsoleLogger;

#[cfg(target_arch = "wasm32")]
impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let msg = JsValue::from_str(&format!("[{}] {}", record.target(), record.args()));
        match record.level() {
            log::Level::Error => web_sys::console::error_1(&msg),
            log::Level::Warn => web_sys::console::warn_1(&msg),
            log::Level::Info => web_sys::console::info_1(&msg),
            log::Level::Debug | log::Level::Trace => web_sys::console::debug_1(&msg),
        }
    }

    fn flush(&self) {}
}

fn console_logger_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        static LOGGER: ConsoleLogger = ConsoleLogger;
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(log::LevelFilter::Info);
        }
    }
}

// ─── Panic hook for WASM debugging ───────────────────────────────────────

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("SegEdit WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}
