//! Integration tests: drag-and-drop through the engine.
//!
//! Every drop yields at most one registry mutation; aborted and cancelled
//! drags yield none.

use fp_core::{
    DocPoint, EngineConfig, FieldInstance, FieldKind, InstanceId, Ownership, PageGeometry,
    PagePosition, Point, Rect, Vec2, pixels_to_points,
};
use fp_editor::{
    AbortReason, DragEnd, DragPayload, DropOutcome, DropTarget, EngineEvent, EventOutcome,
    EventQueue, InputEvent, InteractionMode, KeyOutcome, Modifiers, PlacementEngine,
};
use pretty_assertions::assert_eq;

fn engine_at_scale(scale: f64) -> PlacementEngine {
    let _ = env_logger::builder().is_test(true).try_init();
    let config = EngineConfig {
        id_seed: Some(7),
        ..EngineConfig::default()
    };
    let page_h = config.page_height_pt;
    let mut engine = PlacementEngine::new(config).with_clock(|| 1_700_000_000_000);
    engine.set_viewport_height(page_h * scale);
    engine.set_page_rect(1, Rect::new(0.0, 0.0, 794.0 * scale, 1123.0 * scale));
    engine.set_page_rect(
        2,
        Rect::new(0.0, 1123.0 * scale + 20.0, 794.0 * scale, 2246.0 * scale + 20.0),
    );
    engine
}

fn observe(engine: &mut PlacementEngine) -> EventQueue {
    let queue = EventQueue::new();
    engine.add_observer(Box::new(queue.clone()));
    queue
}

fn seed(engine: &mut PlacementEngine, id: &str, page: u32, at: DocPoint) -> InstanceId {
    let id = InstanceId::intern(id);
    let fields = engine.fields().add(FieldInstance::new(
        id,
        FieldKind::new("clientName"),
        PagePosition::new(page, at),
    ));
    engine.set_fields(fields);
    id
}

fn field_mutations(events: &[EngineEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, EngineEvent::FieldsChanged(_)))
        .count()
}

fn release(rect: Rect, pointer: Point, over: Option<DropTarget>) -> DragEnd {
    DragEnd {
        active_rect: rect,
        pointer,
        over,
    }
}

// ─── Field moves ────────────────────────────────────────────────────────

#[test]
fn move_at_fractional_scale_uses_rect_delta() {
    let scale = 1.33;
    let mut engine = engine_at_scale(scale);
    assert!((engine.scale() - scale).abs() < 1e-9);
    let start = DocPoint::new(pixels_to_points(120.0, scale), pixels_to_points(80.0, scale));
    let id = seed(&mut engine, "frac_move", 1, start);
    let events = observe(&mut engine);

    let rect = Rect::from_origin_size((120.0, 80.0), (60.0, 16.0));
    assert!(engine.drag_start(DragPayload::Field(id), rect));
    assert_eq!(engine.mode(), &InteractionMode::Dragging(DragPayload::Field(id)));

    let out = engine.drag_end(&release(
        rect + Vec2::new(20.0, 15.0),
        Point::new(150.0, 100.0),
        Some(DropTarget::Page(1)),
    ));

    assert!(matches!(out, DropOutcome::Moved { .. }), "{out:?}");
    let field = engine.fields().find(id).unwrap();
    assert!((field.position.x - pixels_to_points(140.0, scale)).abs() < 1e-6);
    assert!((field.position.y - pixels_to_points(95.0, scale)).abs() < 1e-6);
    assert_eq!(field.page, 1);
    assert_eq!(field_mutations(&events.drain()), 1);
    assert_eq!(engine.mode(), &InteractionMode::Idle);
    assert_eq!(engine.selected(), Some(id));
}

#[test]
fn move_ignores_stale_page_geometry() {
    let mut engine = engine_at_scale(1.0);
    let id = seed(&mut engine, "stale_move", 2, DocPoint::new(30.0, 30.0));
    let rect = Rect::from_origin_size((40.0, 1200.0), (50.0, 16.0));
    engine.drag_start(DragPayload::Field(id), rect);
    // Page rects jump mid-drag (scroll); only the rect delta matters.
    engine.set_page_rect(2, Rect::new(0.0, 300.0, 794.0, 1423.0));

    engine.drag_end(&release(
        rect + Vec2::new(72.0 / 0.75, 0.0),
        Point::ZERO,
        Some(DropTarget::Page(2)),
    ));

    let field = engine.fields().find(id).unwrap();
    assert!((field.position.x - 102.0).abs() < 1e-6, "{:?}", field.position);
    assert!((field.position.y - 30.0).abs() < 1e-6);
}

#[test]
fn moves_never_go_negative() {
    let mut engine = engine_at_scale(1.5);
    let id = seed(&mut engine, "clamp_sweep", 1, DocPoint::new(20.0, 40.0));
    let rect = Rect::from_origin_size((40.0, 80.0), (30.0, 10.0));
    for step in 0..25 {
        let delta = Vec2::new(-13.0 * step as f64, -7.0 * step as f64);
        assert!(engine.drag_start(DragPayload::Field(id), rect));
        engine.drag_end(&release(rect + delta, Point::ZERO, Some(DropTarget::Surface)));
        let at = engine.fields().find(id).unwrap().position;
        assert!(at.x >= 0.0 && at.y >= 0.0, "step {step}: {at:?}");
    }
    assert_eq!(engine.fields().find(id).unwrap().position, DocPoint::ORIGIN);
}

// ─── Aborts and cancellation ────────────────────────────────────────────

#[test]
fn drop_on_nothing_mutates_nothing() {
    let mut engine = engine_at_scale(1.0);
    let id = seed(&mut engine, "nowhere", 1, DocPoint::new(10.0, 10.0));
    let before = engine.fields().clone();
    let events = observe(&mut engine);

    engine.drag_start(DragPayload::Field(id), Rect::ZERO);
    let out = engine.drag_end(&release(Rect::new(50.0, 50.0, 60.0, 60.0), Point::ZERO, None));

    assert_eq!(out, DropOutcome::Aborted(AbortReason::NoTarget));
    assert!(engine.fields().same_snapshot(&before));
    assert_eq!(field_mutations(&events.drain()), 0);
    assert_eq!(engine.mode(), &InteractionMode::Idle);
}

#[test]
fn second_release_is_ignored() {
    let mut engine = engine_at_scale(1.0);
    let id = seed(&mut engine, "double_drop", 1, DocPoint::new(10.0, 10.0));
    let events = observe(&mut engine);
    let rect = Rect::from_origin_size((10.0, 10.0), (10.0, 10.0));
    let end = release(rect + Vec2::new(5.0, 5.0), Point::ZERO, Some(DropTarget::Page(1)));

    engine.drag_start(DragPayload::Field(id), rect);
    engine.drag_end(&end);
    let after_first = engine.fields().clone();
    let again = engine.drag_end(&end);

    assert_eq!(again, DropOutcome::Aborted(AbortReason::NoActiveDrag));
    assert!(engine.fields().same_snapshot(&after_first));
    assert_eq!(field_mutations(&events.drain()), 1);
}

#[test]
fn escape_cancels_drag_without_mutation() {
    let mut engine = engine_at_scale(1.0);
    let id = seed(&mut engine, "esc_drag", 1, DocPoint::new(10.0, 10.0));
    let events = observe(&mut engine);

    engine.drag_start(DragPayload::Field(id), Rect::ZERO);
    assert_eq!(
        engine.handle_key("Escape", &Modifiers::NONE, false),
        KeyOutcome::DragCancelled
    );
    assert_eq!(engine.mode(), &InteractionMode::Idle);
    assert!(!engine.drag_cancel());

    let out = engine.drag_end(&release(
        Rect::new(99.0, 99.0, 100.0, 100.0),
        Point::ZERO,
        Some(DropTarget::Page(1)),
    ));
    assert_eq!(out, DropOutcome::Aborted(AbortReason::NoActiveDrag));
    assert_eq!(field_mutations(&events.drain()), 0);
}

#[test]
fn dragging_unknown_field_is_refused() {
    let mut engine = engine_at_scale(1.0);
    assert!(!engine.drag_start(DragPayload::Field(InstanceId::intern("never_added")), Rect::ZERO));
    assert_eq!(engine.mode(), &InteractionMode::Idle);
}

#[test]
fn field_removed_mid_drag_aborts() {
    let mut engine = engine_at_scale(1.0);
    let id = seed(&mut engine, "vanishing", 1, DocPoint::new(10.0, 10.0));
    engine.drag_start(DragPayload::Field(id), Rect::ZERO);
    engine.remove_field(id);

    let out = engine.drag_end(&release(
        Rect::new(5.0, 5.0, 6.0, 6.0),
        Point::ZERO,
        Some(DropTarget::Page(1)),
    ));
    assert_eq!(out, DropOutcome::Aborted(AbortReason::UnknownField));
    assert!(engine.fields().is_empty());
}

// ─── Palette drags ──────────────────────────────────────────────────────

#[test]
fn palette_drop_creates_exactly_one_field() {
    let mut engine = engine_at_scale(1.0);
    let events = observe(&mut engine);
    let kind = FieldKind::new("projectTotal");
    let page2 = engine.pages().page_rect(2).unwrap();

    assert!(engine.drag_start(DragPayload::Palette(kind.clone()), Rect::ZERO));
    assert!(engine.ui_hints().show_ghost);
    let ghost = engine
        .drag_move(page2.origin() + Vec2::new(96.0, 48.0))
        .unwrap();
    assert_eq!(ghost.position.page, 2);
    assert_eq!(engine.ghost(), Some(ghost));

    let pointer = page2.origin() + Vec2::new(96.0, 48.0);
    let out = engine.drag_end(&release(Rect::ZERO, pointer, Some(DropTarget::Page(2))));

    let DropOutcome::Added { at, .. } = out else {
        panic!("expected Added, got {out:?}");
    };
    assert_eq!(at.page, 2);
    assert!((at.x - 72.0).abs() < 1e-6 && (at.y - 36.0).abs() < 1e-6);
    assert_eq!(engine.fields().len(), 1);
    let created = &engine.fields().as_slice()[0];
    assert_eq!(created.field_kind, kind);
    assert_eq!(engine.selected(), Some(created.instance_id));
    assert_eq!(field_mutations(&events.drain()), 1);
    assert!(engine.ghost().is_none());
}

#[test]
fn palette_drop_off_page_adds_nothing() {
    let mut engine = engine_at_scale(1.0);
    engine.drag_start(DragPayload::Palette(FieldKind::new("x")), Rect::ZERO);
    let out = engine.drag_end(&release(
        Rect::ZERO,
        Point::new(-50.0, -50.0),
        Some(DropTarget::Surface),
    ));
    assert_eq!(out, DropOutcome::Aborted(AbortReason::NotOverPage));
    assert!(engine.fields().is_empty());
}

#[test]
fn drag_from_positioning_passes_through_idle() {
    let mut engine = engine_at_scale(1.0);
    engine.add_from_form(FieldKind::new("clientName"), None);
    let events = observe(&mut engine);

    let payload = DragPayload::Palette(FieldKind::new("projectTotal"));
    engine.drag_start(payload.clone(), Rect::ZERO);

    let modes: Vec<_> = events
        .drain()
        .into_iter()
        .filter_map(|e| match e {
            EngineEvent::ModeChanged(m) => Some(m),
            _ => None,
        })
        .collect();
    assert_eq!(
        modes,
        vec![InteractionMode::Idle, InteractionMode::Dragging(payload)]
    );
}

#[test]
fn dispatch_routes_drag_events() {
    let mut engine = engine_at_scale(1.0);
    let id = seed(&mut engine, "dispatched", 1, DocPoint::new(0.0, 0.0));
    let rect = Rect::from_origin_size((0.0, 0.0), (20.0, 10.0));

    let started = engine.dispatch(InputEvent::DragStart {
        payload: DragPayload::Field(id),
        rect,
    });
    assert_eq!(started, EventOutcome::DragStarted(true));
    assert_eq!(
        engine.dispatch(InputEvent::DragMove { x: 5.0, y: 5.0 }),
        EventOutcome::DragMoved(None)
    );
    let dropped = engine.dispatch(InputEvent::DragEnd(release(
        rect + Vec2::new(96.0, 0.0),
        Point::new(100.0, 5.0),
        Some(DropTarget::Page(1)),
    )));
    assert!(matches!(dropped, EventOutcome::Dropped(DropOutcome::Moved { .. })));
    assert!((engine.fields().find(id).unwrap().position.x - 72.0).abs() < 1e-6);
    assert_eq!(engine.dispatch(InputEvent::DragCancel), EventOutcome::DragCancelled(false));
}

// ─── Host-driven mode ───────────────────────────────────────────────────

fn controlled_mode_engine() -> PlacementEngine {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut config = EngineConfig {
        id_seed: Some(7),
        ..EngineConfig::default()
    };
    config.control.mode = Ownership::Controlled;
    let page_h = config.page_height_pt;
    let mut engine = PlacementEngine::new(config).with_clock(|| 1_700_000_000_000);
    engine.set_viewport_height(page_h);
    engine.set_page_rect(1, Rect::new(0.0, 0.0, 794.0, 1123.0));
    engine
}

#[test]
fn host_cannot_enter_dragging_without_a_drag() {
    let mut engine = engine_at_scale(1.0);
    let id = seed(&mut engine, "host_drag", 1, DocPoint::new(10.0, 10.0));

    engine.set_mode(InteractionMode::Dragging(DragPayload::Field(InstanceId::intern(
        "host_drag_missing",
    ))));
    assert_eq!(engine.mode(), &InteractionMode::Idle);
    assert_eq!(
        engine.handle_key("Escape", &Modifiers::NONE, false),
        KeyOutcome::Ignored
    );

    // A drag in flight only matches its own payload.
    assert!(engine.drag_start(DragPayload::Field(id), Rect::ZERO));
    engine.set_mode(InteractionMode::Dragging(DragPayload::Palette(FieldKind::new(
        "clientName",
    ))));
    assert_eq!(engine.mode(), &InteractionMode::Dragging(DragPayload::Field(id)));
}

#[test]
fn controlled_dragging_always_proposes_idle_on_exit() {
    let mut engine = controlled_mode_engine();
    let id = seed(&mut engine, "ctl_drag", 1, DocPoint::new(10.0, 10.0));
    let events = observe(&mut engine);
    let payload = DragPayload::Field(id);

    assert!(engine.drag_start(payload.clone(), Rect::ZERO));
    engine.set_mode(InteractionMode::Dragging(payload.clone()));
    assert_eq!(engine.mode(), &InteractionMode::Dragging(payload.clone()));
    events.drain();

    // The drop consumes the drag, but the host has not pushed Idle yet.
    let out = engine.drag_end(&release(Rect::ZERO, Point::ZERO, None));
    assert_eq!(out, DropOutcome::Aborted(AbortReason::NoTarget));
    assert_eq!(events.drain(), vec![EngineEvent::ModeChanged(InteractionMode::Idle)]);
    assert_eq!(engine.mode(), &InteractionMode::Dragging(payload));

    // Escape still asks to leave Dragging instead of reporting a phantom cancel.
    assert_eq!(
        engine.handle_key("Escape", &Modifiers::NONE, false),
        KeyOutcome::DragCancelled
    );
    assert_eq!(events.drain(), vec![EngineEvent::ModeChanged(InteractionMode::Idle)]);
    let again = engine.drag_end(&release(Rect::ZERO, Point::ZERO, Some(DropTarget::Page(1))));
    assert_eq!(again, DropOutcome::Aborted(AbortReason::NoActiveDrag));
    assert_eq!(events.drain(), vec![EngineEvent::ModeChanged(InteractionMode::Idle)]);

    engine.set_mode(InteractionMode::Idle);
    assert_eq!(engine.mode(), &InteractionMode::Idle);
    assert!(!engine.drag_cancel());
}
