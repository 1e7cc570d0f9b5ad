//! Interactive editing on top of `seg-core`: modes, click dispatch,
//! vertex and slice gestures, and undo/redo.

pub mod editor;
pub mod error;
pub mod history;
pub mod input;
pub mod interaction;
pub mod mode;
pub mod shortcuts;
pub mod vertex;

pub use editor::Editor;
pub use error::{Diagnostic, EditError};
pub use history::{History, HistoryEntry};
pub use input::{InputEvent, Modifiers, PointerButton};
pub use mode::{ClickContext, ClickOutcome, EditMode, ModeBehavior, ModeCell, ModeState, PointGesture, resolve_click};
pub use shortcuts::{ShortcutAction, ShortcutMap};
