//! Input abstraction layer.
//!
//! Normalizes document-surface clicks, keyboard events, and drag-and-drop
//! callbacks into a unified `InputEvent` enum consumed by the engine.
//! All coordinates are client pixels, the same space page rectangles use.

use fp_core::{FieldKind, InstanceId, Point, Rect};

/// Modifier keys held during an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    /// ⌘ on macOS, Ctrl elsewhere.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// What is being dragged, tagged by where the drag started.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DragPayload {
    /// An already-placed field.
    Field(InstanceId),
    /// A new field dragged in from the palette.
    Palette(FieldKind),
}

/// Droppable region under the pointer when a drag ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    /// A rendered page.
    Page(u32),
    /// The document surface outside any page.
    Surface,
}

/// Final state of a drag gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragEnd {
    /// Rectangle of the dragged element at release.
    pub active_rect: Rect,
    /// Pointer position at release.
    pub pointer: Point,
    /// Drop target, `None` when released over nothing droppable.
    pub over: Option<DropTarget>,
}

/// A normalized interaction event.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Click on the document surface. `target` is the field the host saw
    /// under the pointer, if it knows; otherwise the engine hit-tests.
    Click {
        x: f64,
        y: f64,
        target: Option<InstanceId>,
    },

    /// Keyboard event. Ignored entirely while a text input has focus.
    Key {
        key: String,
        modifiers: Modifiers,
        text_input_focused: bool,
    },

    /// Drag began with the dragged element at `rect`.
    DragStart { payload: DragPayload, rect: Rect },

    /// Pointer moved while dragging.
    DragMove { x: f64, y: f64 },

    /// Drag released.
    DragEnd(DragEnd),

    /// Drag aborted (Escape, pointer lost).
    DragCancel,
}

impl InputEvent {
    pub fn click(x: f64, y: f64) -> Self {
        Self::Click { x, y, target: None }
    }

    pub fn key(key: &str, modifiers: Modifiers) -> Self {
        Self::Key {
            key: key.to_string(),
            modifiers,
            text_input_focused: false,
        }
    }

    /// Extract position if this is a pointer event.
    pub fn position(&self) -> Option<Point> {
        match self {
            Self::Click { x, y, .. } | Self::DragMove { x, y } => Some(Point::new(*x, *y)),
            Self::DragEnd(end) => Some(end.pointer),
            _ => None,
        }
    }
}
