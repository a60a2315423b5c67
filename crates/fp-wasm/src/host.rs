//! Engine host traits backed by JavaScript callbacks.

use fp_core::{FieldInstance, FieldKind, FieldResolver, PaletteEntry};
use fp_editor::{ListenerHandle, ListenerHost, ListenerKind};
use js_sys::Function;
use wasm_bindgen::JsValue;

/// Forwards listener management to `attach(kind) -> number` and
/// `detach(number)` supplied by the webview.
pub struct JsListenerHost {
    attach: Function,
    detach: Function,
}

impl JsListenerHost {
    pub fn new(attach: Function, detach: Function) -> Self {
        Self { attach, detach }
    }
}

impl ListenerHost for JsListenerHost {
    fn attach(&mut self, kind: ListenerKind) -> ListenerHandle {
        let handle = match self
            .attach
            .call1(&JsValue::NULL, &JsValue::from_str(kind.name()))
        {
            Ok(v) => match handle_from(v.as_f64()) {
                Ok(handle) => handle,
                Err(e) => {
                    log::warn!("attach {} returned {e}", kind.name());
                    0
                }
            },
            Err(e) => {
                log::warn!("attach {} threw: {e:?}", kind.name());
                0
            }
        };
        ListenerHandle(handle)
    }

    fn detach(&mut self, handle: ListenerHandle) {
        if let Err(e) = self.detach.call1(&JsValue::NULL, &JsValue::from(handle.0)) {
            log::warn!("detach {} threw: {e:?}", handle.0);
        }
    }
}

/// Listener handles must be integers in `u32` range.
fn handle_from(value: Option<f64>) -> Result<u32, String> {
    match value {
        Some(n) if n.fract() == 0.0 && (0.0..=u32::MAX as f64).contains(&n) => Ok(n as u32),
        Some(n) => Err(format!("unusable handle {n}")),
        None => Err("a non-number handle".to_string()),
    }
}

/// Labels, display values, and the palette catalog.
///
/// Until the host installs its callbacks, both label and display value fall
/// back to the raw kind name so fields are still visible and grabbable.
#[derive(Default)]
pub struct HostResolver {
    label: Option<Function>,
    display: Option<Function>,
    palette: Vec<FieldKind>,
}

impl HostResolver {
    pub fn set_callbacks(&mut self, label: Function, display: Function) {
        self.label = Some(label);
        self.display = Some(display);
    }

    pub fn set_palette(&mut self, kinds: Vec<FieldKind>) {
        self.palette = kinds;
    }
}

fn call_for_string(f: &Function, args: &[&str]) -> Option<String> {
    let result = match args {
        [a] => f.call1(&JsValue::NULL, &JsValue::from_str(a)),
        [a, b] => f.call2(&JsValue::NULL, &JsValue::from_str(a), &JsValue::from_str(b)),
        _ => f.call0(&JsValue::NULL),
    };
    result.ok().and_then(|v| v.as_string())
}

impl FieldResolver for HostResolver {
    fn label(&self, kind: &FieldKind) -> String {
        self.label
            .as_ref()
            .and_then(|f| call_for_string(f, &[kind.as_str()]))
            .unwrap_or_else(|| kind.to_string())
    }

    fn display_value(&self, field: &FieldInstance) -> String {
        self.display
            .as_ref()
            .and_then(|f| {
                call_for_string(f, &[field.field_kind.as_str(), field.instance_id.as_str()])
            })
            .unwrap_or_else(|| field.field_kind.to_string())
    }

    fn available_kinds(&self) -> Vec<PaletteEntry> {
        self.palette
            .iter()
            .map(|kind| PaletteEntry {
                kind: kind.clone(),
                label: self.label(kind),
            })
            .collect()
    }
}
