//! Controlled/uncontrolled state and change notification.
//!
//! Every piece of state the host can see (fields, mode, selection, pending
//! position) lives in a `Slot`. An uncontrolled slot commits engine-made
//! changes itself; a controlled slot keeps the host's value and only
//! reports what the engine wanted, waiting for the host to push it back.
//! Either way observers hear about every proposed change.

use crate::mode::InteractionMode;
use fp_core::{FieldRegistry, InstanceId, Ownership, PagePosition, Zoom};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone)]
pub(crate) struct Slot<T> {
    value: T,
    ownership: Ownership,
}

impl<T: Clone + PartialEq> Slot<T> {
    pub(crate) fn new(value: T, ownership: Ownership) -> Self {
        Self { value, ownership }
    }

    pub(crate) fn get(&self) -> &T {
        &self.value
    }

    /// Engine-originated change. Returns `true` when `next` differs from
    /// the current value (observers should be told), whether or not it was
    /// committed.
    pub(crate) fn propose(&mut self, next: T) -> bool {
        if next == self.value {
            return false;
        }
        if !self.ownership.is_controlled() {
            self.value = next;
        }
        true
    }

    /// Host-originated value. Always committed. Returns `true` on change.
    pub(crate) fn sync(&mut self, value: T) -> bool {
        if value == self.value {
            return false;
        }
        self.value = value;
        true
    }
}

/// Outbound notification.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Full field list after a mutation.
    FieldsChanged(FieldRegistry),
    ModeChanged(InteractionMode),
    SelectionChanged(Option<InstanceId>),
    PendingChanged(Option<PagePosition>),
    /// Zoom changed; page rectangles are stale until the host re-reports them.
    ZoomChanged(Zoom),
}

impl EngineEvent {
    pub fn name(&self) -> &'static str {
        match self {
            EngineEvent::FieldsChanged(_) => "fieldsChanged",
            EngineEvent::ModeChanged(_) => "modeChanged",
            EngineEvent::SelectionChanged(_) => "selectionChanged",
            EngineEvent::PendingChanged(_) => "pendingChanged",
            EngineEvent::ZoomChanged(_) => "zoomChanged",
        }
    }
}

/// Subscriber to engine changes.
pub trait EngineObserver {
    fn notify(&mut self, event: &EngineEvent);
}

/// Observer that buffers events for the host to drain.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: Rc<RefCell<Vec<EngineEvent>>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every buffered event, oldest first.
    pub fn drain(&self) -> Vec<EngineEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }
}

impl EngineObserver for EventQueue {
    fn notify(&mut self, event: &EngineEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}
