//! Mode-scoped event listener subscriptions.
//!
//! Each interaction mode needs a fixed set of host listeners (keyboard,
//! scroll, resize, ...). A `SubscriptionScope` attaches exactly that set
//! through the host and detaches all of it when dropped, so re-entering a
//! mode can never stack duplicate handlers.

use crate::mode::InteractionMode;
use smallvec::{SmallVec, smallvec};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Host events the engine needs to hear about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    Keyboard,
    Scroll,
    Resize,
    /// Document visibility; the host re-reports geometry when the tab returns.
    Visibility,
    PointerMove,
}

impl ListenerKind {
    pub fn name(self) -> &'static str {
        match self {
            ListenerKind::Keyboard => "keyboard",
            ListenerKind::Scroll => "scroll",
            ListenerKind::Resize => "resize",
            ListenerKind::Visibility => "visibility",
            ListenerKind::PointerMove => "pointermove",
        }
    }
}

/// Token returned by the host for one attached listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerHandle(pub u32);

/// Host side of listener management (e.g. `addEventListener`).
pub trait ListenerHost {
    fn attach(&mut self, kind: ListenerKind) -> ListenerHandle;
    fn detach(&mut self, handle: ListenerHandle);
}

type ListenerSet = SmallVec<[ListenerKind; 5]>;
type Attached = SmallVec<[(ListenerKind, ListenerHandle); 5]>;

/// Listener table: which host events each mode listens to.
pub fn listeners_for(mode: &InteractionMode) -> ListenerSet {
    use ListenerKind::*;
    match mode {
        InteractionMode::Idle | InteractionMode::AddingFromPalette => {
            smallvec![Keyboard, Scroll, Resize]
        }
        InteractionMode::Positioning(_) => smallvec![Keyboard, Scroll, Resize, Visibility],
        InteractionMode::Dragging(_) => smallvec![PointerMove, Keyboard, Scroll, Resize],
    }
}

/// Listeners attached for one mode; released on drop.
pub struct SubscriptionScope {
    host: Rc<RefCell<dyn ListenerHost>>,
    active: Attached,
}

impl SubscriptionScope {
    /// Attach every listener `mode` needs.
    pub fn acquire(host: Rc<RefCell<dyn ListenerHost>>, mode: &InteractionMode) -> Self {
        let kinds = listeners_for(mode);
        let active: Attached = match host.try_borrow_mut() {
            Ok(mut h) => kinds.iter().map(|&k| (k, h.attach(k))).collect(),
            Err(_) => {
                log::warn!("listener host busy; {} listeners not attached", mode.name());
                Attached::new()
            }
        };
        log::trace!("attached {} listeners for {}", active.len(), mode.name());
        Self { host, active }
    }

    pub fn kinds(&self) -> impl Iterator<Item = ListenerKind> + '_ {
        self.active.iter().map(|(k, _)| *k)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

impl Drop for SubscriptionScope {
    fn drop(&mut self) {
        if self.active.is_empty() {
            return;
        }
        match self.host.try_borrow_mut() {
            Ok(mut h) => {
                for (_, handle) in self.active.drain(..) {
                    h.detach(handle);
                }
            }
            Err(_) => log::warn!("listener host busy; {} listeners leaked", self.active.len()),
        }
    }
}

impl fmt::Debug for SubscriptionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionScope")
            .field("active", &self.active)
            .finish()
    }
}
