//! Editor keyboard map.
//!
//! One table turns `KeyboardEvent.key` plus modifiers into a `ShortcutAction`.
//! The map lives in Rust so the browser host and native hosts share it.

use crate::mode::EditMode;

/// What a bound key does to the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    /// Back to View, discarding every in-progress gesture.
    Escape,
    SetMode(EditMode),

    // ── Edit ──
    Undo,
    Redo,
    DeleteSelected,
    /// Commit the polygon being created.
    FinishPolygon,
    /// Drop the last placed point of the current gesture.
    RemoveLastPoint,

    // ── View ──
    ZoomIn,
    ZoomOut,
    ZoomToFit,
}

/// Key table. `ctrl` and `meta` (⌘) are interchangeable command modifiers.
pub struct ShortcutMap;

impl ShortcutMap {
    /// `None` when the combination is unbound and should reach the host.
    pub fn resolve(key: &str, ctrl: bool, shift: bool, _alt: bool, meta: bool) -> Option<ShortcutAction> {
        let cmd = ctrl || meta;

        // Escape wins regardless of modifiers.
        if key == "Escape" {
            return Some(ShortcutAction::Escape);
        }

        // Command combos before bare keys.
        if cmd && shift {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Redo),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Undo),
                "y" | "Y" => Some(ShortcutAction::Redo),
                "0" => Some(ShortcutAction::ZoomToFit),
                _ => None,
            };
        }

        // Shift alone only toggles the add-point affordance (handled by the editor);
        // `+` arrives with Shift on most layouts.
        match key {
            "v" | "V" if !shift => Some(ShortcutAction::SetMode(EditMode::View)),
            "e" | "E" if !shift => Some(ShortcutAction::SetMode(EditMode::EditVertices)),
            "a" | "A" if !shift => Some(ShortcutAction::SetMode(EditMode::AddPoints)),
            "s" | "S" if !shift => Some(ShortcutAction::SetMode(EditMode::Slice)),
            "d" | "D" if !shift => Some(ShortcutAction::SetMode(EditMode::DeletePolygon)),
            "n" | "N" if !shift => Some(ShortcutAction::SetMode(EditMode::CreatePolygon)),
            "Delete" => Some(ShortcutAction::DeleteSelected),
            "Backspace" => Some(ShortcutAction::RemoveLastPoint),
            "Enter" => Some(ShortcutAction::FinishPolygon),
            "+" | "=" => Some(ShortcutAction::ZoomIn),
            "-" | "_" => Some(ShortcutAction::ZoomOut),
            "0" => Some(ShortcutAction::ZoomToFit),
            _ => None,
        }
    }
}
