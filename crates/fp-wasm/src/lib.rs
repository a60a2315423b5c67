//! WASM bridge for FP: exposes the placement engine to JavaScript.
//!
//! Compiled via `wasm-pack build --target web` and driven by the document
//! editor webview. Every call takes plain numbers/strings and returns a
//! bool, a number, or a JSON string.

mod host;
pub mod wire;

use fp_core::{
    EngineConfig, FieldKind, FieldRegistry, InstanceId, PageLayout, Point, Rect, Zoom,
};
use fp_editor::{DragEnd, DragPayload, EventQueue, Modifiers, PlacementEngine};
use host::{HostResolver, JsListenerHost};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

/// The webview-facing placement controller.
///
/// Wraps a `PlacementEngine`. Engine notifications are buffered and
/// delivered to the `on_event` callback after each call returns, so the
/// callback may call straight back into this object.
#[wasm_bindgen]
pub struct FieldPlacer {
    engine: PlacementEngine,
    events: EventQueue,
    on_event: Option<js_sys::Function>,
    resolver: HostResolver,
}

#[wasm_bindgen]
impl FieldPlacer {
    /// Create a placer from a JSON `EngineConfig` (`""` for defaults).
    /// A malformed config falls back to the defaults; use `validate_config`
    /// to see why.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Self {
        console_error_panic_hook_setup();

        let mut config = EngineConfig::from_json(config_json).unwrap_or_else(|e| {
            log::warn!("{e}; using defaults");
            EngineConfig::default()
        });
        if config.id_seed.is_none() {
            config.id_seed = entropy_seed();
        }

        let engine = PlacementEngine::new(config);
        #[cfg(target_arch = "wasm32")]
        let engine = engine.with_clock(|| js_sys::Date::now() as u64);

        let mut placer = Self {
            engine,
            events: EventQueue::new(),
            on_event: None,
            resolver: HostResolver::default(),
        };
        placer.engine.add_observer(Box::new(placer.events.clone()));
        placer
    }

    // ─── Host wiring ─────────────────────────────────────────────────────

    /// `callback(name, payloadJson)` for every engine notification.
    pub fn on_event(&mut self, callback: js_sys::Function) {
        self.on_event = Some(callback);
    }

    /// `attach(kind) -> handle` and `detach(handle)`. Listeners for the
    /// current mode are attached immediately.
    pub fn set_listener_host(&mut self, attach: js_sys::Function, detach: js_sys::Function) {
        let host: Rc<RefCell<dyn fp_editor::ListenerHost>> =
            Rc::new(RefCell::new(JsListenerHost::new(attach, detach)));
        self.engine.set_listener_host(host);
    }

    /// `label(kind) -> string` and `display(kind, instanceId) -> string`.
    pub fn set_resolver(&mut self, label: js_sys::Function, display: js_sys::Function) {
        self.resolver.set_callbacks(label, display);
    }

    /// Palette catalog as a JSON array of kind strings.
    pub fn set_palette_json(&mut self, json: &str) -> bool {
        match serde_json::from_str::<Vec<FieldKind>>(json) {
            Ok(kinds) => {
                self.resolver.set_palette(kinds);
                true
            }
            Err(e) => {
                log::warn!("invalid palette: {e}");
                false
            }
        }
    }

    /// `[{"kind":..,"label":..}]` in menu order.
    pub fn get_palette_json(&self) -> String {
        use fp_core::FieldResolver;
        let entries: Vec<serde_json::Value> = self
            .resolver
            .available_kinds()
            .into_iter()
            .map(|e| serde_json::json!({ "kind": e.kind.as_str(), "label": e.label }))
            .collect();
        serde_json::Value::Array(entries).to_string()
    }

    // ─── State ───────────────────────────────────────────────────────────

    /// Replace the field list (controlled hosts push their value here).
    /// Returns `false` on malformed JSON.
    pub fn set_fields_json(&mut self, json: &str) -> bool {
        match serde_json::from_str::<FieldRegistry>(json) {
            Ok(fields) => {
                self.engine.set_fields(fields);
                self.flush();
                true
            }
            Err(e) => {
                log::warn!("invalid field list: {e}");
                false
            }
        }
    }

    pub fn get_fields_json(&self) -> String {
        serde_json::to_string(self.engine.fields()).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn get_mode_json(&self) -> String {
        wire::mode(self.engine.mode()).to_string()
    }

    pub fn set_mode_json(&mut self, json: &str) -> bool {
        match wire::parse_mode(json) {
            Ok(mode) => {
                self.engine.set_mode(mode);
                self.flush();
                true
            }
            Err(e) => {
                log::warn!("{e}");
                false
            }
        }
    }

    /// Selected instance id, `""` when nothing is selected.
    pub fn get_selected_id(&self) -> String {
        self.engine
            .selected()
            .map(|id| id.to_string())
            .unwrap_or_default()
    }

    pub fn set_selected_id(&mut self, id: &str) {
        self.engine.set_selection(lookup(id));
        self.flush();
    }

    pub fn get_pending_json(&self) -> String {
        wire::pending(self.engine.pending())
    }

    pub fn set_pending_json(&mut self, json: &str) -> bool {
        match wire::parse_pending(json) {
            Ok(at) => {
                self.engine.set_pending(at);
                self.flush();
                true
            }
            Err(e) => {
                log::warn!("{e}");
                false
            }
        }
    }

    pub fn get_ui_hints_json(&self) -> String {
        wire::hints(self.engine.ui_hints())
    }

    /// The open palette menu, `null` when closed.
    pub fn get_palette_menu_json(&self) -> String {
        match self.engine.palette() {
            Some(menu) => serde_json::json!({
                "anchor": { "x": menu.anchor.x, "y": menu.anchor.y },
                "target": { "page": menu.target.page, "x": menu.target.x, "y": menu.target.y },
            })
            .to_string(),
            None => "null".to_string(),
        }
    }

    pub fn get_ghost_json(&self) -> String {
        wire::ghost(self.engine.ghost())
    }

    // ─── Geometry & zoom ─────────────────────────────────────────────────

    /// Report one page's client rectangle (`getBoundingClientRect`).
    pub fn set_page_rect(&mut self, page: u32, left: f64, top: f64, width: f64, height: f64) {
        self.engine
            .set_page_rect(page, Rect::from_origin_size((left, top), (width, height)));
    }

    /// Replace every page rectangle at once:
    /// `[{"page":1,"left":..,"top":..,"width":..,"height":..}]`.
    pub fn refresh_pages_json(&mut self, json: &str) -> bool {
        let rects: Vec<PageRect> = match serde_json::from_str(json) {
            Ok(r) => r,
            Err(e) => {
                log::warn!("invalid page rects: {e}");
                return false;
            }
        };
        let mut layout = PageLayout::new(self.engine.pages().container_origin());
        for r in rects {
            layout.set_page(
                r.page,
                Rect::from_origin_size((r.left, r.top), (r.width, r.height)),
            );
        }
        self.engine.refresh_geometry(&layout);
        true
    }

    pub fn set_container_origin(&mut self, left: f64, top: f64) {
        self.engine.set_container_origin(Point::new(left, top));
    }

    pub fn set_viewport_height(&mut self, height: f64) {
        self.engine.set_viewport_height(height);
    }

    pub fn geometry_stale(&self) -> bool {
        self.engine.geometry_stale()
    }

    pub fn get_scale(&self) -> f64 {
        self.engine.scale()
    }

    pub fn get_zoom(&self) -> f64 {
        self.engine.zoom().value()
    }

    pub fn set_zoom(&mut self, zoom: f64) -> f64 {
        let z = self.engine.set_zoom(Zoom::new(zoom)).value();
        self.flush();
        z
    }

    pub fn zoom_in(&mut self) -> f64 {
        let z = self.engine.zoom_in().value();
        self.flush();
        z
    }

    pub fn zoom_out(&mut self) -> f64 {
        let z = self.engine.zoom_out().value();
        self.flush();
        z
    }

    pub fn zoom_reset(&mut self) -> f64 {
        let z = self.engine.zoom_reset().value();
        self.flush();
        z
    }

    /// Paint list for the overlay layer; also refreshes the hit-test cache.
    pub fn overlay_json(&mut self) -> String {
        let items = self.engine.overlay(&self.resolver);
        wire::overlay(items)
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Document-surface click in client pixels. `target_id` is the field the
    /// DOM reported under the pointer, or `""`.
    pub fn handle_click(&mut self, x: f64, y: f64, target_id: &str) -> String {
        let outcome = self
            .engine
            .handle_click(Point::new(x, y), lookup(target_id));
        self.flush();
        wire::click(&outcome)
    }

    /// Returns `{"changed":bool,"action":"<name>"}`.
    #[allow(clippy::too_many_arguments)]
    pub fn handle_key(
        &mut self,
        key: &str,
        ctrl: bool,
        shift: bool,
        alt: bool,
        meta: bool,
        text_input_focused: bool,
    ) -> String {
        let mods = Modifiers {
            shift,
            ctrl,
            alt,
            meta,
        };
        let outcome = self.engine.handle_key(key, &mods, text_input_focused);
        self.flush();
        wire::key(&outcome)
    }

    pub fn drag_start_field(
        &mut self,
        id: &str,
        left: f64,
        top: f64,
        width: f64,
        height: f64,
    ) -> bool {
        let Some(id) = lookup(id) else {
            return false;
        };
        let rect = Rect::from_origin_size((left, top), (width, height));
        let started = self.engine.drag_start(DragPayload::Field(id), rect);
        self.flush();
        started
    }

    pub fn drag_start_palette(&mut self, kind: &str) -> bool {
        let started = self
            .engine
            .drag_start(DragPayload::Palette(FieldKind::new(kind)), Rect::ZERO);
        self.flush();
        started
    }

    /// Returns the ghost preview JSON, `null` when not over a page.
    pub fn drag_move(&mut self, x: f64, y: f64) -> String {
        wire::ghost(self.engine.drag_move(Point::new(x, y)))
    }

    /// Release. `over` is `""`, `"surface"`, or `"page:<n>"`.
    #[allow(clippy::too_many_arguments)]
    pub fn drag_end(
        &mut self,
        left: f64,
        top: f64,
        width: f64,
        height: f64,
        pointer_x: f64,
        pointer_y: f64,
        over: &str,
    ) -> String {
        let end = DragEnd {
            active_rect: Rect::from_origin_size((left, top), (width, height)),
            pointer: Point::new(pointer_x, pointer_y),
            over: wire::parse_drop_target(over),
        };
        let outcome = self.engine.drag_end(&end);
        self.flush();
        wire::dropped(&outcome)
    }

    pub fn drag_cancel(&mut self) -> bool {
        let cancelled = self.engine.drag_cancel();
        self.flush();
        cancelled
    }

    // ─── Commands ────────────────────────────────────────────────────────

    pub fn begin_palette_add(&mut self) {
        self.engine.begin_palette_add();
        self.flush();
    }

    /// Returns the new instance id, `""` when no menu was open.
    pub fn select_palette_entry(&mut self, kind: &str) -> String {
        let id = self.engine.select_palette_entry(FieldKind::new(kind));
        self.flush();
        id.map(|id| id.to_string()).unwrap_or_default()
    }

    pub fn close_palette(&mut self) -> bool {
        let closed = self.engine.close_palette();
        self.flush();
        closed
    }

    pub fn begin_positioning(&mut self, kind: &str) -> bool {
        let entered = self.engine.begin_positioning(FieldKind::new(kind));
        self.flush();
        entered
    }

    pub fn confirm_positioning(&mut self) -> String {
        let id = self.engine.confirm_positioning();
        self.flush();
        id.map(|id| id.to_string()).unwrap_or_default()
    }

    pub fn cancel_positioning(&mut self) -> bool {
        let cancelled = self.engine.cancel_positioning();
        self.flush();
        cancelled
    }

    /// "Add to form" from the properties panel. Returns the new id.
    pub fn add_from_form(&mut self, kind: &str, custom_value: Option<String>) -> String {
        let id = self
            .engine
            .add_from_form(FieldKind::new(kind), custom_value);
        self.flush();
        id.to_string()
    }

    pub fn select(&mut self, id: &str) {
        self.engine.select(lookup(id));
        self.flush();
    }

    /// Apply a properties-panel patch. Returns `{"ok":bool,...}`.
    pub fn update_field_json(&mut self, id: &str, patch_json: &str) -> String {
        let Some(id) = lookup(id) else {
            return wire::error_json(&format!("unknown field '{id}'"));
        };
        let patch = match wire::parse_patch(patch_json) {
            Ok(p) => p,
            Err(e) => return wire::error_json(&e),
        };
        self.engine.update_field(id, &patch);
        self.flush();
        wire::ok_json()
    }

    pub fn remove_field(&mut self, id: &str) -> bool {
        let removed = lookup(id).is_some_and(|id| self.engine.remove_field(id));
        self.flush();
        removed
    }

    pub fn delete_selected(&mut self) -> String {
        let id = self.engine.delete_selected();
        self.flush();
        id.map(|id| id.to_string()).unwrap_or_default()
    }
}

impl FieldPlacer {
    /// Deliver buffered engine events to the host callback.
    fn flush(&mut self) {
        let events = self.events.drain();
        let Some(callback) = &self.on_event else {
            return;
        };
        for event in &events {
            let (name, payload) = wire::event(event);
            if let Err(e) = callback.call2(
                &JsValue::NULL,
                &JsValue::from_str(name),
                &JsValue::from_str(&payload),
            ) {
                log::warn!("{name} callback threw: {e:?}");
            }
        }
    }
}

#[derive(serde::Deserialize)]
struct PageRect {
    page: u32,
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

/// Ids the engine has never seen resolve to `None` without being interned.
fn lookup(id: &str) -> Option<InstanceId> {
    if id.is_empty() {
        return None;
    }
    InstanceId::lookup(id)
}

#[cfg(target_arch = "wasm32")]
fn entropy_seed() -> Option<u64> {
    Some((js_sys::Math::random() * u32::MAX as f64) as u64 ^ js_sys::Date::now() as u64)
}

/// Native builds let the engine seed from the system clock.
#[cfg(not(target_arch = "wasm32"))]
fn entropy_seed() -> Option<u64> {
    None
}

// ─── Panic hook for WASM debugging ───────────────────────────────────────

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("FP WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}

// ─── Standalone helpers (no placer needed) ───────────────────────────────

/// Validate an engine config. Returns `{"ok":true}` or `{"ok":false,"error":"..."}`.
#[wasm_bindgen]
pub fn validate_config(json: &str) -> String {
    match EngineConfig::from_json(json) {
        Ok(_) => wire::ok_json(),
        Err(e) => wire::error_json(&e),
    }
}

/// Validate and normalize a saved field list.
/// Returns `{"ok":true,"fields":[...]}` or `{"ok":false,"error":"..."}`.
#[wasm_bindgen]
pub fn normalize_fields(json: &str) -> String {
    match serde_json::from_str::<FieldRegistry>(json) {
        Ok(fields) => serde_json::json!({ "ok": true, "fields": fields }).to_string(),
        Err(e) => wire::error_json(&format!("invalid field list: {e}")),
    }
}
