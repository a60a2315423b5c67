//! Placement engine: the single owner of interaction state.
//!
//! Pointer, keyboard, and drag events come in; registry mutations, mode
//! changes, selection, and pending positions go out through observers.
//!
//! ## Click routing (first match wins)
//!
//! | Priority | Condition                | Effect                                   |
//! |----------|--------------------------|------------------------------------------|
//! | 1        | click lands on a field   | mode untouched; selects it when idle     |
//! | 2        | `Positioning(kind)`      | place latest `kind` instance, go idle    |
//! | 3        | `AddingFromPalette`      | open palette menu at the click           |
//! | 4        | `Idle`                   | deselect, record pending position        |
//!
//! Page geometry is a cached snapshot the host refreshes on scroll, resize,
//! and zoom. Nothing here blocks or retries.

use crate::control::{EngineEvent, EngineObserver, Slot};
use crate::drag::{DragController, DropOutcome, Ghost};
use crate::input::{DragEnd, DragPayload, InputEvent, Modifiers};
use crate::mode::{InteractionMode, UiHints};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::subscriptions::{ListenerHost, SubscriptionScope};
use fp_core::{
    DocPoint, EngineConfig, FieldInstance, FieldKind, FieldPatch, FieldRegistry, FieldResolver,
    IdGenerator, InstanceId, PageGeometry, PageLayout, PagePosition, Point, Rect, Zoom, fit_scale,
    pixels_to_points,
};
use fp_render::{OverlayItem, hit_test, layout_overlay};
use std::cell::RefCell;
use std::rc::Rc;

/// Palette menu opened by a click in `AddingFromPalette`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaletteMenu {
    /// Client-space click point the menu is anchored to.
    pub anchor: Point,
    /// Where a chosen entry will be placed.
    pub target: PagePosition,
}

/// What a document-surface click did.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// The click hit a rendered field; `selected` says whether it was
    /// selected (only when idle).
    FieldHit { id: InstanceId, selected: bool },
    /// A provisional field was placed and selected.
    Positioned { id: InstanceId, at: PagePosition },
    PaletteOpened(PaletteMenu),
    PendingSet(PagePosition),
    /// Outside click that only cleared the selection.
    Deselected,
    Ignored,
}

/// What a key press did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyOutcome {
    PositioningCancelled,
    PaletteClosed,
    DragCancelled,
    PendingCleared,
    Deselected,
    Deleted(InstanceId),
    Zoomed(Zoom),
    Ignored,
}

/// Result of `dispatch`.
#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    Click(ClickOutcome),
    Key(KeyOutcome),
    DragStarted(bool),
    DragMoved(Option<Ghost>),
    Dropped(DropOutcome),
    DragCancelled(bool),
}

type Clock = Box<dyn Fn() -> u64>;

pub struct PlacementEngine {
    config: EngineConfig,
    fields: Slot<FieldRegistry>,
    /// Last snapshot proposed to a controlled host and not yet pushed back.
    proposed_fields: Option<FieldRegistry>,
    mode: Slot<InteractionMode>,
    selection: Slot<Option<InstanceId>>,
    pending: Slot<Option<PagePosition>>,
    zoom: Zoom,
    viewport_height: f64,
    pages: PageLayout,
    /// Set on zoom change until the host re-reports page geometry.
    geometry_stale: bool,
    palette: Option<PaletteMenu>,
    drag: DragController,
    ids: IdGenerator,
    clock: Clock,
    /// Last overlay layout, used to hit-test clicks without a target.
    overlay: Vec<OverlayItem>,
    observers: Vec<Box<dyn EngineObserver>>,
    listener_host: Option<Rc<RefCell<dyn ListenerHost>>>,
    scope: Option<SubscriptionScope>,
}

impl PlacementEngine {
    pub fn new(config: EngineConfig) -> Self {
        let clock: Clock = Box::new(system_clock_ms);
        let seed = config.id_seed.unwrap_or_else(|| clock());
        let control = config.control;
        Self {
            fields: Slot::new(FieldRegistry::new(), control.fields),
            proposed_fields: None,
            mode: Slot::new(InteractionMode::Idle, control.mode),
            selection: Slot::new(None, control.selection),
            pending: Slot::new(None, control.pending),
            zoom: config.initial_zoom,
            viewport_height: config.page_height_pt,
            pages: PageLayout::default(),
            geometry_stale: false,
            palette: None,
            drag: DragController::new(),
            ids: IdGenerator::new(seed),
            clock,
            overlay: Vec::new(),
            observers: Vec::new(),
            listener_host: None,
            scope: None,
            config,
        }
    }

    /// Replace the millisecond clock used in generated ids.
    pub fn with_clock(mut self, clock: impl Fn() -> u64 + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn add_observer(&mut self, observer: Box<dyn EngineObserver>) {
        self.observers.push(observer);
    }

    /// Install the host listener API and attach listeners for the current mode.
    pub fn set_listener_host(&mut self, host: Rc<RefCell<dyn ListenerHost>>) {
        drop(self.scope.take());
        self.scope = Some(SubscriptionScope::acquire(host.clone(), self.mode.get()));
        self.listener_host = Some(host);
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn fields(&self) -> &FieldRegistry {
        self.fields.get()
    }

    pub fn mode(&self) -> &InteractionMode {
        self.mode.get()
    }

    pub fn selected(&self) -> Option<InstanceId> {
        *self.selection.get()
    }

    pub fn pending(&self) -> Option<PagePosition> {
        *self.pending.get()
    }

    pub fn palette(&self) -> Option<&PaletteMenu> {
        self.palette.as_ref()
    }

    pub fn ghost(&self) -> Option<Ghost> {
        self.drag.ghost()
    }

    pub fn zoom(&self) -> Zoom {
        self.zoom
    }

    /// Current points → pixels scale: fit-to-height times zoom.
    pub fn scale(&self) -> f64 {
        fit_scale(self.zoom, self.viewport_height, self.config.page_height_pt)
    }

    pub fn pages(&self) -> &PageLayout {
        &self.pages
    }

    pub fn geometry_stale(&self) -> bool {
        self.geometry_stale
    }

    pub fn ui_hints(&self) -> UiHints {
        let mut hints = self.mode.get().hints();
        if self.palette.is_some() {
            hints.palette_open = true;
            hints.scroll_locked = true;
        }
        hints
    }

    // ─── Host-pushed state (controlled overrides) ────────────────────────

    /// Host push of the field list. Settles any outstanding proposal, so a
    /// selection made against it is dropped if the host did not accept it.
    pub fn set_fields(&mut self, fields: FieldRegistry) {
        let proposal = self.proposed_fields.take();
        if self.fields.sync(fields) || proposal.is_some() {
            self.prune_selection();
        }
    }

    /// Host push of the mode. Refused when it names nothing to act on:
    /// `Positioning` needs an instance of its kind and `Dragging` needs the
    /// matching drag in flight.
    pub fn set_mode(&mut self, mode: InteractionMode) {
        if !self.mode_reachable(&mode) {
            log::debug!("host mode {} refused", mode.name());
            return;
        }
        let prev = self.mode.get().clone();
        if self.mode.sync(mode) {
            self.mode_committed(&prev);
        }
    }

    pub fn set_selection(&mut self, id: Option<InstanceId>) {
        let id = id.filter(|id| self.fields().contains(*id));
        self.selection.sync(id);
    }

    pub fn set_pending(&mut self, pending: Option<PagePosition>) {
        self.pending.sync(pending);
    }

    // ─── Geometry & zoom ─────────────────────────────────────────────────

    pub fn set_viewport_height(&mut self, height: f64) {
        self.viewport_height = height;
    }

    pub fn set_container_origin(&mut self, origin: Point) {
        self.pages.set_container_origin(origin);
    }

    pub fn set_page_rect(&mut self, page: u32, rect: Rect) {
        self.pages.set_page(page, rect);
        self.geometry_stale = false;
    }

    /// Re-read every page rectangle. Call on scroll, resize, and zoom.
    pub fn refresh_geometry(&mut self, source: &dyn PageGeometry) {
        self.pages.refresh_from(source);
        self.geometry_stale = false;
    }

    pub fn set_zoom(&mut self, zoom: Zoom) -> Zoom {
        if zoom != self.zoom {
            self.zoom = zoom;
            self.geometry_stale = true;
            log::debug!("zoom → {:.2}", zoom.value());
            self.emit(EngineEvent::ZoomChanged(zoom));
        }
        self.zoom
    }

    pub fn zoom_in(&mut self) -> Zoom {
        self.set_zoom(self.zoom.zoom_in())
    }

    pub fn zoom_out(&mut self) -> Zoom {
        self.set_zoom(self.zoom.zoom_out())
    }

    pub fn zoom_reset(&mut self) -> Zoom {
        self.set_zoom(Zoom::reset())
    }

    /// Lay out every mounted field for painting and cache it for hit testing.
    pub fn overlay(&mut self, resolver: &dyn FieldResolver) -> &[OverlayItem] {
        self.overlay = layout_overlay(self.fields.get(), &self.pages, self.scale(), resolver);
        &self.overlay
    }

    // ─── Event dispatch ──────────────────────────────────────────────────

    pub fn dispatch(&mut self, event: InputEvent) -> EventOutcome {
        match event {
            InputEvent::Click { x, y, target } => {
                EventOutcome::Click(self.handle_click(Point::new(x, y), target))
            }
            InputEvent::Key {
                key,
                modifiers,
                text_input_focused,
            } => EventOutcome::Key(self.handle_key(&key, &modifiers, text_input_focused)),
            InputEvent::DragStart { payload, rect } => {
                EventOutcome::DragStarted(self.drag_start(payload, rect))
            }
            InputEvent::DragMove { x, y } => EventOutcome::DragMoved(self.drag_move(Point::new(x, y))),
            InputEvent::DragEnd(end) => EventOutcome::Dropped(self.drag_end(&end)),
            InputEvent::DragCancel => EventOutcome::DragCancelled(self.drag_cancel()),
        }
    }

    /// Route a document-surface click. `point` is in client pixels.
    pub fn handle_click(&mut self, point: Point, target: Option<InstanceId>) -> ClickOutcome {
        if let Some(id) = target.or_else(|| self.field_at(point)) {
            let selected = self.mode.get().is_idle() && self.fields().contains(id);
            if selected {
                self.select(Some(id));
            }
            return ClickOutcome::FieldHit { id, selected };
        }

        match self.mode.get().clone() {
            InteractionMode::Positioning(kind) => {
                let Some(at) = self.doc_position_at(point) else {
                    return ClickOutcome::Ignored;
                };
                let Some(id) = self.fields().latest_of_kind(&kind).map(|f| f.instance_id) else {
                    // Provisional field vanished; nothing left to place.
                    self.request_mode(InteractionMode::Idle);
                    return ClickOutcome::Ignored;
                };
                self.commit_fields(self.fields().update(id, &FieldPatch::place(at)));
                self.request_mode(InteractionMode::Idle);
                self.select(Some(id));
                log::debug!("positioned {id} at {at:?}");
                ClickOutcome::Positioned { id, at }
            }
            InteractionMode::AddingFromPalette => {
                let Some(target) = self.doc_position_at(point) else {
                    return ClickOutcome::Ignored;
                };
                let menu = PaletteMenu {
                    anchor: point,
                    target,
                };
                self.palette = Some(menu);
                ClickOutcome::PaletteOpened(menu)
            }
            InteractionMode::Idle => {
                let had_selection = self.selected().is_some();
                self.select(None);
                match self.doc_position_at(point) {
                    Some(at) => {
                        self.set_pending_internal(Some(at));
                        ClickOutcome::PendingSet(at)
                    }
                    None if had_selection => ClickOutcome::Deselected,
                    None => ClickOutcome::Ignored,
                }
            }
            InteractionMode::Dragging(_) => ClickOutcome::Ignored,
        }
    }

    /// Keyboard contract. Nothing fires while a text input has focus.
    pub fn handle_key(
        &mut self,
        key: &str,
        modifiers: &Modifiers,
        text_input_focused: bool,
    ) -> KeyOutcome {
        if text_input_focused {
            return KeyOutcome::Ignored;
        }
        let Some(action) = ShortcutMap::resolve(key, modifiers) else {
            return KeyOutcome::Ignored;
        };
        match action {
            ShortcutAction::Cancel => self.cancel_active(),
            ShortcutAction::Delete => {
                let placing = matches!(
                    self.mode.get(),
                    InteractionMode::Positioning(_) | InteractionMode::Dragging(_)
                );
                match self.selected() {
                    Some(id) if !placing => {
                        self.remove_field(id);
                        KeyOutcome::Deleted(id)
                    }
                    _ => KeyOutcome::Ignored,
                }
            }
            ShortcutAction::ZoomIn => KeyOutcome::Zoomed(self.zoom_in()),
            ShortcutAction::ZoomOut => KeyOutcome::Zoomed(self.zoom_out()),
            ShortcutAction::ZoomReset => KeyOutcome::Zoomed(self.zoom_reset()),
        }
    }

    fn cancel_active(&mut self) -> KeyOutcome {
        match self.mode.get().clone() {
            InteractionMode::Positioning(_) => {
                self.cancel_positioning();
                KeyOutcome::PositioningCancelled
            }
            InteractionMode::AddingFromPalette => {
                self.close_palette();
                KeyOutcome::PaletteClosed
            }
            InteractionMode::Dragging(_) => {
                self.drag_cancel();
                KeyOutcome::DragCancelled
            }
            InteractionMode::Idle if self.pending().is_some() => {
                self.set_pending_internal(None);
                KeyOutcome::PendingCleared
            }
            InteractionMode::Idle if self.selected().is_some() => {
                self.select(None);
                KeyOutcome::Deselected
            }
            InteractionMode::Idle => KeyOutcome::Ignored,
        }
    }

    // ─── Palette ─────────────────────────────────────────────────────────

    /// Enter `AddingFromPalette`; the next click opens the menu.
    pub fn begin_palette_add(&mut self) {
        self.request_mode(InteractionMode::AddingFromPalette);
    }

    /// Create a field of `kind` where the palette menu was opened.
    pub fn select_palette_entry(&mut self, kind: FieldKind) -> Option<InstanceId> {
        if !matches!(self.mode.get(), InteractionMode::AddingFromPalette) {
            return None;
        }
        let menu = self.palette.take()?;
        let id = self.create_field(kind, menu.target, None);
        self.request_mode(InteractionMode::Idle);
        self.select(Some(id));
        Some(id)
    }

    pub fn close_palette(&mut self) -> bool {
        if !matches!(self.mode.get(), InteractionMode::AddingFromPalette) {
            return false;
        }
        self.palette = None;
        self.request_mode(InteractionMode::Idle);
        true
    }

    // ─── Positioning ─────────────────────────────────────────────────────

    /// Enter `Positioning(kind)`. No-op if no instance of `kind` exists.
    pub fn begin_positioning(&mut self, kind: FieldKind) -> bool {
        if self.fields().latest_of_kind(&kind).is_none() {
            log::debug!("nothing to position for {kind}");
            return false;
        }
        self.request_mode(InteractionMode::Positioning(kind));
        true
    }

    /// Accept the provisional field where it is.
    pub fn confirm_positioning(&mut self) -> Option<InstanceId> {
        let InteractionMode::Positioning(kind) = self.mode.get().clone() else {
            return None;
        };
        let id = self.fields().latest_of_kind(&kind).map(|f| f.instance_id);
        self.request_mode(InteractionMode::Idle);
        self.select(id);
        id
    }

    pub fn cancel_positioning(&mut self) -> bool {
        if !matches!(self.mode.get(), InteractionMode::Positioning(_)) {
            return false;
        }
        self.request_mode(InteractionMode::Idle);
        self.select(None);
        true
    }

    /// External "add to form" trigger.
    ///
    /// With a pending position the field lands there directly and is
    /// selected. Otherwise it is created at the top-left of page 1 and the
    /// engine enters `Positioning` so the next click places it.
    pub fn add_from_form(&mut self, kind: FieldKind, custom_value: Option<String>) -> InstanceId {
        if let Some(at) = self.pending() {
            let id = self.create_field(kind, at, custom_value);
            self.set_pending_internal(None);
            self.request_mode(InteractionMode::Idle);
            self.select(Some(id));
            return id;
        }
        let id = self.create_field(
            kind.clone(),
            PagePosition::new(1, DocPoint::ORIGIN),
            custom_value,
        );
        self.request_mode(InteractionMode::Positioning(kind));
        id
    }

    // ─── Field operations ────────────────────────────────────────────────

    /// Select a field (or clear with `None`). Unknown ids clear the selection.
    pub fn select(&mut self, id: Option<InstanceId>) {
        let id = id.filter(|id| self.knows_field(*id));
        if self.selection.propose(id) {
            self.emit(EngineEvent::SelectionChanged(id));
        }
    }

    /// Properties-panel hand-off: apply `patch` to `id`.
    pub fn update_field(&mut self, id: InstanceId, patch: &FieldPatch) -> bool {
        self.commit_fields(self.fields().update(id, patch))
    }

    /// Delete a field. Unknown ids are a no-op.
    pub fn remove_field(&mut self, id: InstanceId) -> bool {
        let removed = self.commit_fields(self.fields().remove(id));
        if removed && self.selected() == Some(id) {
            self.select(None);
        }
        removed
    }

    pub fn delete_selected(&mut self) -> Option<InstanceId> {
        let id = self.selected()?;
        self.remove_field(id).then_some(id)
    }

    // ─── Drag & drop ─────────────────────────────────────────────────────

    /// Begin dragging. A field drag needs a field that exists.
    pub fn drag_start(&mut self, payload: DragPayload, rect: Rect) -> bool {
        if let DragPayload::Field(id) = &payload
            && !self.fields().contains(*id)
        {
            return false;
        }
        self.palette = None;
        self.request_mode(InteractionMode::Dragging(payload.clone()));
        self.drag.begin(payload, rect);
        true
    }

    pub fn drag_move(&mut self, pointer: Point) -> Option<Ghost> {
        let scale = self.scale();
        self.drag.track(pointer, &self.pages, scale)
    }

    /// Resolve a drop: exactly one mutation on success, none on abort.
    pub fn drag_end(&mut self, end: &DragEnd) -> DropOutcome {
        let was_active = self.drag.is_active();
        let scale = self.scale();
        let outcome = self.drag.finish(end, self.fields.get(), &self.pages, scale);
        if !was_active {
            if matches!(self.mode.get(), InteractionMode::Dragging(_)) {
                self.request_mode(InteractionMode::Idle);
            }
            return outcome;
        }
        self.request_mode(InteractionMode::Idle);
        match &outcome {
            DropOutcome::Moved { id, to, .. } => {
                self.commit_fields(self.fields().update(*id, &FieldPatch::position(to.point())));
                self.select(Some(*id));
            }
            DropOutcome::Added { kind, at } => {
                let id = self.create_field(kind.clone(), *at, None);
                self.select(Some(id));
            }
            DropOutcome::Aborted(reason) => log::debug!("drop aborted: {reason:?}"),
        }
        outcome
    }

    /// Abandon the drag and leave `Dragging`. Returns `true` if either a
    /// drag was in flight or the mode still said `Dragging`.
    pub fn drag_cancel(&mut self) -> bool {
        let cancelled = self.drag.cancel();
        let dragging = matches!(self.mode.get(), InteractionMode::Dragging(_));
        if dragging {
            self.request_mode(InteractionMode::Idle);
        }
        cancelled || dragging
    }

    // ─── Internals ───────────────────────────────────────────────────────

    fn mode_reachable(&self, mode: &InteractionMode) -> bool {
        match mode {
            InteractionMode::Positioning(kind) => {
                self.fields().latest_of_kind(kind).is_some()
                    || self
                        .proposed_fields
                        .as_ref()
                        .is_some_and(|f| f.latest_of_kind(kind).is_some())
            }
            InteractionMode::Dragging(payload) => self.drag.payload() == Some(payload),
            InteractionMode::Idle | InteractionMode::AddingFromPalette => true,
        }
    }

    /// Known to the committed list, or to the list awaiting the host.
    fn knows_field(&self, id: InstanceId) -> bool {
        self.fields().contains(id)
            || self
                .proposed_fields
                .as_ref()
                .is_some_and(|f| f.contains(id))
    }

    fn field_at(&self, point: Point) -> Option<InstanceId> {
        hit_test(&self.overlay, self.pages.to_container(point))
            .filter(|id| self.fields().contains(*id))
    }

    /// Client point → document position on the page under it.
    fn doc_position_at(&self, point: Point) -> Option<PagePosition> {
        let scale = self.scale();
        if !(scale.is_finite() && scale > 0.0) {
            return None;
        }
        let page = self.pages.page_at(point)?;
        let local = self.pages.to_page_local(page, point)?;
        Some(PagePosition::new(
            page,
            DocPoint::new(
                pixels_to_points(local.x, scale),
                pixels_to_points(local.y, scale),
            ),
        ))
    }

    fn create_field(
        &mut self,
        kind: FieldKind,
        at: PagePosition,
        custom_value: Option<String>,
    ) -> InstanceId {
        let mut id = self.ids.next(&kind, (self.clock)());
        while self.fields().contains(id) {
            id = self.ids.next(&kind, (self.clock)());
        }
        let field = FieldInstance::new(id, kind, at)
            .with_custom_value(custom_value)
            .with_presentation(self.config.default_presentation.clone());
        log::debug!("add {id} ({}) at {at:?}", field.field_kind);
        self.commit_fields(self.fields().add(field));
        id
    }

    /// Publish a new registry snapshot. Returns `true` if it differed.
    fn commit_fields(&mut self, next: FieldRegistry) -> bool {
        if next.same_snapshot(self.fields.get()) {
            return false;
        }
        if !self.fields.propose(next.clone()) {
            return false;
        }
        if !next.same_snapshot(self.fields.get()) {
            self.proposed_fields = Some(next.clone());
        }
        self.emit(EngineEvent::FieldsChanged(next));
        true
    }

    fn set_pending_internal(&mut self, pending: Option<PagePosition>) {
        if self.pending.propose(pending) {
            self.emit(EngineEvent::PendingChanged(pending));
        }
    }

    /// Walk to `next` one step at a time, committing each step's effects.
    fn request_mode(&mut self, next: InteractionMode) {
        for step in self.mode.get().path_to(&next) {
            let prev = self.mode.get().clone();
            if self.mode.propose(step.clone()) {
                self.emit(EngineEvent::ModeChanged(step));
                if self.mode.get() != &prev {
                    self.mode_committed(&prev);
                }
            }
        }
    }

    fn mode_committed(&mut self, prev: &InteractionMode) {
        let now = self.mode.get().clone();
        log::debug!("mode {} → {}", prev.name(), now.name());
        if !now.is_idle() {
            self.select(None);
            self.set_pending_internal(None);
        }
        if !matches!(now, InteractionMode::AddingFromPalette) {
            self.palette = None;
        }
        if !matches!(now, InteractionMode::Dragging(_)) && self.drag.cancel() {
            log::debug!("drag dropped by mode change");
        }
        if let Some(host) = self.listener_host.clone() {
            // Release the old mode's listeners before attaching the new set.
            drop(self.scope.take());
            self.scope = Some(SubscriptionScope::acquire(host, &now));
        }
    }

    fn prune_selection(&mut self) {
        if let Some(id) = self.selected()
            && !self.knows_field(id)
        {
            self.select(None);
        }
    }

    fn emit(&mut self, event: EngineEvent) {
        log::trace!("emit {}", event.name());
        for observer in &mut self.observers {
            observer.notify(&event);
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn system_clock_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(target_arch = "wasm32")]
fn system_clock_ms() -> u64 {
    // No system clock on wasm32-unknown-unknown; the bridge installs one.
    0
}
