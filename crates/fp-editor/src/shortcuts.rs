//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s.
//! The map lives in Rust so every host resolves keys the same way.
//! What an action does depends on the engine state when it fires.

use crate::input::Modifiers;

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    /// Escape: back out of whatever is active.
    Cancel,
    /// Delete / Backspace: remove the selected field.
    Delete,
    ZoomIn,
    ZoomOut,
    ZoomReset,
}

impl ShortcutAction {
    pub fn name(self) -> &'static str {
        match self {
            ShortcutAction::Cancel => "cancel",
            ShortcutAction::Delete => "delete",
            ShortcutAction::ZoomIn => "zoomIn",
            ShortcutAction::ZoomOut => "zoomOut",
            ShortcutAction::ZoomReset => "zoomReset",
        }
    }
}

/// Resolves key events into shortcut actions.
///
/// On macOS `meta` is ⌘; elsewhere `ctrl` plays the same role.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action.
    ///
    /// `key` is the `KeyboardEvent.key` value (e.g. `"Escape"`, `"Delete"`).
    /// Returns `None` if the key combo has no binding.
    pub fn resolve(key: &str, modifiers: &Modifiers) -> Option<ShortcutAction> {
        // ── Modifier combos first (most specific) ──
        if modifiers.command() {
            return match key {
                "=" | "+" => Some(ShortcutAction::ZoomIn),
                "-" | "_" => Some(ShortcutAction::ZoomOut),
                "0" => Some(ShortcutAction::ZoomReset),
                _ => None,
            };
        }

        // ── Single keys ──
        match key {
            "Escape" | "Esc" => Some(ShortcutAction::Cancel),
            "Delete" | "Backspace" => Some(ShortcutAction::Delete),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CMD: Modifiers = Modifiers {
        meta: true,
        ..Modifiers::NONE
    };
    const CTRL: Modifiers = Modifiers {
        ctrl: true,
        ..Modifiers::NONE
    };

    #[test]
    fn resolve_escape() {
        assert_eq!(
            ShortcutMap::resolve("Escape", &Modifiers::NONE),
            Some(ShortcutAction::Cancel)
        );
    }

    #[test]
    fn resolve_delete() {
        assert_eq!(
            ShortcutMap::resolve("Delete", &Modifiers::NONE),
            Some(ShortcutAction::Delete)
        );
        assert_eq!(
            ShortcutMap::resolve("Backspace", &Modifiers::NONE),
            Some(ShortcutAction::Delete)
        );
    }

    #[test]
    fn resolve_zoom() {
        assert_eq!(ShortcutMap::resolve("=", &CMD), Some(ShortcutAction::ZoomIn));
        assert_eq!(ShortcutMap::resolve("-", &CTRL), Some(ShortcutAction::ZoomOut));
        assert_eq!(ShortcutMap::resolve("0", &CMD), Some(ShortcutAction::ZoomReset));
    }

    #[test]
    fn resolve_modifier_precedence() {
        // Cmd+Backspace is not a plain delete.
        assert_eq!(ShortcutMap::resolve("Backspace", &CMD), None);
        // Plain "=" is not a zoom.
        assert_eq!(ShortcutMap::resolve("=", &Modifiers::NONE), None);
    }

    #[test]
    fn resolve_unknown_key() {
        assert_eq!(ShortcutMap::resolve("q", &Modifiers::NONE), None);
        assert_eq!(ShortcutMap::resolve("7", &CMD), None);
    }
}
