//! Interaction modes.
//!
//! Exactly one mode is active at a time. Any non-`Idle` mode is entered
//! explicitly and always exits back to `Idle`; switching between two
//! non-`Idle` modes passes through `Idle` so every exit side effect runs.
//!
//! Hosts read cursor and scroll hints from the mode instead of the engine
//! poking global page state.

use crate::input::DragPayload;
use fp_core::FieldKind;
use smallvec::{SmallVec, smallvec};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InteractionMode {
    /// Clicks record a pending position; fields may be selected.
    #[default]
    Idle,
    /// Clicks open the palette menu at the click point.
    AddingFromPalette,
    /// The next click places the latest provisional field of this kind.
    Positioning(FieldKind),
    /// A field or palette entry is being dragged.
    Dragging(DragPayload),
}

impl InteractionMode {
    pub fn is_idle(&self) -> bool {
        matches!(self, InteractionMode::Idle)
    }

    pub fn name(&self) -> &'static str {
        match self {
            InteractionMode::Idle => "idle",
            InteractionMode::AddingFromPalette => "addingFromPalette",
            InteractionMode::Positioning(_) => "positioning",
            InteractionMode::Dragging(_) => "dragging",
        }
    }

    /// The steps to get from `self` to `next`.
    ///
    /// Empty when already there; one step when either end is `Idle`;
    /// `[Idle, next]` when hopping between two non-idle modes.
    pub fn path_to(&self, next: &InteractionMode) -> SmallVec<[InteractionMode; 2]> {
        if self == next {
            smallvec![]
        } else if self.is_idle() || next.is_idle() {
            smallvec![next.clone()]
        } else {
            smallvec![InteractionMode::Idle, next.clone()]
        }
    }

    /// UI hints for the host renderer.
    pub fn hints(&self) -> UiHints {
        match self {
            InteractionMode::Idle => UiHints::default(),
            InteractionMode::AddingFromPalette | InteractionMode::Positioning(_) => UiHints {
                cursor: Cursor::Crosshair,
                ..UiHints::default()
            },
            InteractionMode::Dragging(DragPayload::Field(_)) => UiHints {
                cursor: Cursor::Grabbing,
                ..UiHints::default()
            },
            InteractionMode::Dragging(DragPayload::Palette(_)) => UiHints {
                cursor: Cursor::Copy,
                show_ghost: true,
                ..UiHints::default()
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    #[default]
    Default,
    Crosshair,
    Grabbing,
    Copy,
}

impl Cursor {
    /// CSS `cursor` value.
    pub fn css(self) -> &'static str {
        match self {
            Cursor::Default => "default",
            Cursor::Crosshair => "crosshair",
            Cursor::Grabbing => "grabbing",
            Cursor::Copy => "copy",
        }
    }
}

/// Presentation hints derived from engine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UiHints {
    pub cursor: Cursor,
    /// Document scrolling should be suspended (palette menu open).
    pub scroll_locked: bool,
    pub palette_open: bool,
    /// Paint the drag ghost.
    pub show_ghost: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use fp_core::InstanceId;

    fn positioning() -> InteractionMode {
        InteractionMode::Positioning(FieldKind::new("clientName"))
    }

    #[test]
    fn same_mode_has_empty_path() {
        assert!(InteractionMode::Idle.path_to(&InteractionMode::Idle).is_empty());
        assert!(positioning().path_to(&positioning()).is_empty());
    }

    #[test]
    fn idle_edges_are_single_step() {
        let path = InteractionMode::Idle.path_to(&positioning());
        assert_eq!(path.as_slice(), &[positioning()]);
        let path = positioning().path_to(&InteractionMode::Idle);
        assert_eq!(path.as_slice(), &[InteractionMode::Idle]);
    }

    #[test]
    fn non_idle_hop_passes_through_idle() {
        let drag = InteractionMode::Dragging(DragPayload::Field(InstanceId::intern("mode_f")));
        let path = positioning().path_to(&drag);
        assert_eq!(path.as_slice(), &[InteractionMode::Idle, drag]);
    }

    #[test]
    fn hints_follow_mode() {
        assert_eq!(InteractionMode::Idle.hints().cursor, Cursor::Default);
        assert_eq!(positioning().hints().cursor, Cursor::Crosshair);
        let ghost = InteractionMode::Dragging(DragPayload::Palette(FieldKind::new("x"))).hints();
        assert!(ghost.show_ghost);
        assert_eq!(ghost.cursor.css(), "copy");
    }
}
