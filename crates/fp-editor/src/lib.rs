pub mod control;
pub mod drag;
pub mod engine;
pub mod input;
pub mod mode;
pub mod shortcuts;
pub mod subscriptions;

pub use control::{EngineEvent, EngineObserver, EventQueue};
pub use drag::{AbortReason, DragController, DropOutcome, Ghost};
pub use engine::{ClickOutcome, EventOutcome, KeyOutcome, PaletteMenu, PlacementEngine};
pub use input::{DragEnd, DragPayload, DropTarget, InputEvent, Modifiers};
pub use mode::{Cursor, InteractionMode, UiHints};
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use subscriptions::{ListenerHandle, ListenerHost, ListenerKind, SubscriptionScope};
