//! Input abstraction layer.
//!
//! Normalizes browser pointer, wheel and keyboard events into a single
//! `InputEvent` enum. Coordinates are screen pixels relative to the canvas.

/// Modifier keys held during an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };

    /// Ctrl on Windows/Linux, ⌘ on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerButton {
    #[default]
    Primary,
    Middle,
    Secondary,
}

impl PointerButton {
    /// From `PointerEvent.button`.
    pub fn from_dom(button: i16) -> Self {
        match button {
            1 => Self::Middle,
            2 => Self::Secondary,
            _ => Self::Primary,
        }
    }
}

/// A normalized input event.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown {
        x: f64,
        y: f64,
        button: PointerButton,
        modifiers: Modifiers,
    },

    /// Rate-limited to one state update per frame.
    PointerMove { x: f64, y: f64, modifiers: Modifiers },

    PointerUp { x: f64, y: f64, button: PointerButton },

    /// Wheel notch; negative `delta_y` zooms in.
    Wheel { x: f64, y: f64, delta_y: f64 },

    KeyDown { key: String, modifiers: Modifiers },

    KeyUp { key: String, modifiers: Modifiers },
}

impl InputEvent {
    pub fn click(x: f64, y: f64) -> Self {
        Self::PointerDown {
            x,
            y,
            button: PointerButton::Primary,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn key(key: &str) -> Self {
        Self::KeyDown {
            key: key.to_owned(),
            modifiers: Modifiers::NONE,
        }
    }

    /// Extract position if this is a pointer event.
    pub fn position(&self) -> Option<(f64, f64)> {
        match self {
            Self::PointerDown { x, y, .. }
            | Self::PointerMove { x, y, .. }
            | Self::PointerUp { x, y, .. }
            | Self::Wheel { x, y, .. } => Some((*x, *y)),
            Self::KeyDown { .. } | Self::KeyUp { .. } => None,
        }
    }
}
