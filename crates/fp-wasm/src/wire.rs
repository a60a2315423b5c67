//! JSON shapes exchanged with the JavaScript host.
//!
//! Everything crossing the bridge is a JSON string with camelCase keys.
//! Kept free of `js_sys` so it can be tested natively.

use fp_core::{DocPoint, FieldKind, FieldPatch, InstanceId, PagePosition, Presentation};
use fp_editor::{
    ClickOutcome, DragPayload, DropOutcome, DropTarget, EngineEvent, Ghost, InteractionMode,
    KeyOutcome, UiHints,
};
use fp_render::OverlayItem;
use serde_json::{Value, json};

pub fn ok_json() -> String {
    r#"{"ok":true}"#.to_string()
}

pub fn error_json(message: &str) -> String {
    json!({ "ok": false, "error": message }).to_string()
}

fn position(at: &PagePosition) -> Value {
    json!({ "page": at.page, "x": at.x, "y": at.y })
}

fn optional_position(at: Option<PagePosition>) -> Value {
    at.as_ref().map(position).unwrap_or(Value::Null)
}

fn payload(payload: &DragPayload) -> Value {
    match payload {
        DragPayload::Field(id) => json!({ "field": id.as_str() }),
        DragPayload::Palette(kind) => json!({ "palette": kind.as_str() }),
    }
}

pub fn mode(mode: &InteractionMode) -> Value {
    let mut out = json!({ "mode": mode.name() });
    match mode {
        InteractionMode::Positioning(kind) => out["kind"] = json!(kind.as_str()),
        InteractionMode::Dragging(p) => out["payload"] = payload(p),
        InteractionMode::Idle | InteractionMode::AddingFromPalette => {}
    }
    out
}

/// Inverse of [`mode`], for hosts that control the mode.
pub fn parse_mode(json: &str) -> Result<InteractionMode, String> {
    let value: Value = serde_json::from_str(json).map_err(|e| format!("invalid mode: {e}"))?;
    let name = value["mode"].as_str().unwrap_or_default();
    match name {
        "idle" => Ok(InteractionMode::Idle),
        "addingFromPalette" => Ok(InteractionMode::AddingFromPalette),
        "positioning" => value["kind"]
            .as_str()
            .map(|k| InteractionMode::Positioning(FieldKind::new(k)))
            .ok_or_else(|| "positioning mode needs a kind".to_string()),
        "dragging" => {
            let p = &value["payload"];
            if let Some(id) = p["field"].as_str() {
                Ok(InteractionMode::Dragging(DragPayload::Field(
                    InstanceId::intern(id),
                )))
            } else if let Some(kind) = p["palette"].as_str() {
                Ok(InteractionMode::Dragging(DragPayload::Palette(
                    FieldKind::new(kind),
                )))
            } else {
                Err("dragging mode needs a field or palette payload".to_string())
            }
        }
        other => Err(format!("unknown mode '{other}'")),
    }
}

pub fn click(outcome: &ClickOutcome) -> String {
    match outcome {
        ClickOutcome::FieldHit { id, selected } => {
            json!({ "outcome": "fieldHit", "id": id.as_str(), "selected": selected })
        }
        ClickOutcome::Positioned { id, at } => {
            json!({ "outcome": "positioned", "id": id.as_str(), "at": position(at) })
        }
        ClickOutcome::PaletteOpened(menu) => json!({
            "outcome": "paletteOpened",
            "anchor": { "x": menu.anchor.x, "y": menu.anchor.y },
            "target": position(&menu.target),
        }),
        ClickOutcome::PendingSet(at) => json!({ "outcome": "pendingSet", "at": position(at) }),
        ClickOutcome::Deselected => json!({ "outcome": "deselected" }),
        ClickOutcome::Ignored => json!({ "outcome": "ignored" }),
    }
    .to_string()
}

pub fn key(outcome: &KeyOutcome) -> String {
    let (action, changed) = match outcome {
        KeyOutcome::PositioningCancelled => ("positioningCancelled", true),
        KeyOutcome::PaletteClosed => ("paletteClosed", true),
        KeyOutcome::DragCancelled => ("dragCancelled", true),
        KeyOutcome::PendingCleared => ("pendingCleared", true),
        KeyOutcome::Deselected => ("deselected", true),
        KeyOutcome::Deleted(_) => ("deleted", true),
        KeyOutcome::Zoomed(_) => ("zoomed", true),
        KeyOutcome::Ignored => ("none", false),
    };
    let mut out = json!({ "changed": changed, "action": action });
    match outcome {
        KeyOutcome::Deleted(id) => out["id"] = json!(id.as_str()),
        KeyOutcome::Zoomed(z) => out["zoom"] = json!(z.value()),
        _ => {}
    }
    out.to_string()
}

pub fn dropped(outcome: &DropOutcome) -> String {
    match outcome {
        DropOutcome::Moved { id, from, to } => json!({
            "outcome": "moved",
            "id": id.as_str(),
            "from": position(from),
            "to": position(to),
        }),
        DropOutcome::Added { kind, at } => {
            json!({ "outcome": "added", "kind": kind.as_str(), "at": position(at) })
        }
        DropOutcome::Aborted(reason) => {
            json!({ "outcome": "aborted", "reason": format!("{reason:?}") })
        }
    }
    .to_string()
}

pub fn ghost(ghost: Option<Ghost>) -> String {
    match ghost {
        Some(g) => json!({
            "pointer": { "x": g.pointer.x, "y": g.pointer.y },
            "at": position(&g.position),
        })
        .to_string(),
        None => "null".to_string(),
    }
}

pub fn pending(at: Option<PagePosition>) -> String {
    optional_position(at).to_string()
}

/// `null` clears the pending position.
pub fn parse_pending(json: &str) -> Result<Option<PagePosition>, String> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| format!("invalid pending position: {e}"))?;
    if value.is_null() {
        return Ok(None);
    }
    let page = value["page"].as_u64().unwrap_or(1);
    let (Some(x), Some(y)) = (value["x"].as_f64(), value["y"].as_f64()) else {
        return Err("pending position needs numeric x and y".to_string());
    };
    let page = u32::try_from(page).map_err(|_| format!("page {page} out of range"))?;
    Ok(Some(PagePosition::new(page, DocPoint::new(x, y))))
}

pub fn hints(hints: UiHints) -> String {
    json!({
        "cursor": hints.cursor.css(),
        "scrollLocked": hints.scroll_locked,
        "paletteOpen": hints.palette_open,
        "showGhost": hints.show_ghost,
    })
    .to_string()
}

pub fn overlay(items: &[OverlayItem]) -> String {
    let items: Vec<Value> = items
        .iter()
        .map(|item| {
            json!({
                "id": item.id.as_str(),
                "page": item.page,
                "x": item.rect.x0,
                "y": item.rect.y0,
                "width": item.rect.width(),
                "height": item.rect.height(),
                "text": item.text,
                "fontSizePx": item.font_size_px,
                "presentation": serde_json::to_value(&item.presentation).unwrap_or(Value::Null),
            })
        })
        .collect();
    Value::Array(items).to_string()
}

/// Event name and JSON payload handed to the host callback.
pub fn event(event: &EngineEvent) -> (&'static str, String) {
    let body = match event {
        EngineEvent::FieldsChanged(fields) => {
            serde_json::to_value(fields).unwrap_or_else(|_| json!([]))
        }
        EngineEvent::ModeChanged(m) => mode(m),
        EngineEvent::SelectionChanged(id) => json!(id.map(|id| id.to_string())),
        EngineEvent::PendingChanged(at) => optional_position(*at),
        EngineEvent::ZoomChanged(z) => json!(z.value()),
    };
    (event.name(), body.to_string())
}

/// `""` → none, `"surface"`, or `"page:<n>"`.
pub fn parse_drop_target(over: &str) -> Option<DropTarget> {
    match over {
        "" => None,
        "surface" => Some(DropTarget::Surface),
        other => other
            .strip_prefix("page:")
            .and_then(|n| n.parse().ok())
            .map(DropTarget::Page),
    }
}

/// Properties-panel patch. Absent keys are left alone; `"customValue":null`
/// clears the override.
pub fn parse_patch(json: &str) -> Result<FieldPatch, String> {
    let value: Value = serde_json::from_str(json).map_err(|e| format!("invalid patch: {e}"))?;
    let Some(obj) = value.as_object() else {
        return Err("patch must be an object".to_string());
    };
    let mut patch = FieldPatch::default();
    if let Some(page) = obj.get("page") {
        let page = page.as_u64().ok_or("page must be a positive integer")?;
        patch.page = Some(u32::try_from(page).map_err(|_| format!("page {page} out of range"))?);
    }
    if let Some(pos) = obj.get("position") {
        let point: DocPoint =
            serde_json::from_value(pos.clone()).map_err(|e| format!("invalid position: {e}"))?;
        patch.position = Some(point);
    }
    if let Some(custom) = obj.get("customValue") {
        patch.custom_value = Some(match custom {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            _ => return Err("customValue must be a string or null".to_string()),
        });
    }
    if let Some(pres) = obj.get("presentation") {
        let pres: Presentation = serde_json::from_value(pres.clone())
            .map_err(|e| format!("invalid presentation: {e}"))?;
        patch.presentation = Some(pres);
    }
    Ok(patch)
}
