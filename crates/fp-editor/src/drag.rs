//! Drag controller for moving placed fields and dropping new ones.
//!
//! Two drag sources, told apart by `DragPayload`:
//!
//! - **Existing field**: the move is the pixel delta between the dragged
//!   element's rectangle at release and at start, added to the field's
//!   current pixel position. Using the delta (not absolute page geometry)
//!   keeps the result right even if page rects went stale mid-drag.
//! - **Palette entry**: the pointer is tracked on every move so a ghost can
//!   follow it across pages. On release over a page, the pointer is mapped
//!   into that page and a new field is created there.
//!
//! The controller only computes outcomes; the engine applies them. An
//! active drag is consumed by `finish`/`cancel`, so one drag yields at most
//! one outcome.

use crate::input::{DragEnd, DragPayload, DropTarget};
use fp_core::{
    DocPoint, FieldKind, FieldRegistry, InstanceId, PageLayout, PagePosition, Point, Rect, Vec2,
    pixels_to_points, points_to_pixels,
};

/// Live preview of a palette drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ghost {
    /// Client-space pointer.
    pub pointer: Point,
    /// Where the field would land if dropped now.
    pub position: PagePosition,
}

/// Why a drag produced no mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    NoActiveDrag,
    /// Released over nothing droppable.
    NoTarget,
    /// Palette entry released somewhere other than a page.
    NotOverPage,
    /// The dragged field is gone from the registry.
    UnknownField,
    /// The target page has no geometry.
    PageNotMounted,
    /// Scale is zero or non-finite; positions can't be converted.
    InvalidScale,
    Cancelled,
}

/// What a finished drag means for the registry.
#[derive(Debug, Clone, PartialEq)]
pub enum DropOutcome {
    Moved {
        id: InstanceId,
        from: PagePosition,
        to: PagePosition,
    },
    Added {
        kind: FieldKind,
        at: PagePosition,
    },
    Aborted(AbortReason),
}

impl DropOutcome {
    pub fn is_aborted(&self) -> bool {
        matches!(self, DropOutcome::Aborted(_))
    }
}

#[derive(Debug, Clone)]
struct ActiveDrag {
    payload: DragPayload,
    initial_rect: Rect,
    ghost: Option<Ghost>,
}

#[derive(Debug, Default)]
pub struct DragController {
    active: Option<ActiveDrag>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a drag. Replaces any drag still in flight.
    pub fn begin(&mut self, payload: DragPayload, initial_rect: Rect) {
        if let Some(prev) = &self.active {
            log::debug!("drag {:?} superseded before drop", prev.payload);
        }
        self.active = Some(ActiveDrag {
            payload,
            initial_rect,
            ghost: None,
        });
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn payload(&self) -> Option<&DragPayload> {
        self.active.as_ref().map(|d| &d.payload)
    }

    pub fn ghost(&self) -> Option<Ghost> {
        self.active.as_ref().and_then(|d| d.ghost)
    }

    /// Follow the pointer during a palette drag.
    ///
    /// The page under the pointer is recomputed every call. Field drags
    /// don't use a ghost and return `None`.
    pub fn track(&mut self, pointer: Point, pages: &PageLayout, scale: f64) -> Option<Ghost> {
        let drag = self.active.as_mut()?;
        if !matches!(drag.payload, DragPayload::Palette(_)) {
            return None;
        }
        drag.ghost = pages
            .page_at(pointer)
            .and_then(|page| drop_position(pages, page, pointer, scale))
            .map(|position| Ghost { pointer, position });
        log::trace!("ghost → {:?}", drag.ghost);
        drag.ghost
    }

    /// Resolve the drop. Consumes the active drag.
    pub fn finish(
        &mut self,
        end: &DragEnd,
        registry: &FieldRegistry,
        pages: &PageLayout,
        scale: f64,
    ) -> DropOutcome {
        let Some(drag) = self.active.take() else {
            return DropOutcome::Aborted(AbortReason::NoActiveDrag);
        };
        let Some(over) = end.over else {
            return DropOutcome::Aborted(AbortReason::NoTarget);
        };
        if !valid_scale(scale) {
            return DropOutcome::Aborted(AbortReason::InvalidScale);
        }

        match drag.payload {
            DragPayload::Field(id) => {
                let Some(field) = registry.find(id) else {
                    return DropOutcome::Aborted(AbortReason::UnknownField);
                };
                let delta = end.active_rect.origin() - drag.initial_rect.origin();
                let from = field.placement();
                let to = PagePosition::new(field.page, moved_position(field.position, delta, scale));
                DropOutcome::Moved { id, from, to }
            }
            DragPayload::Palette(kind) => {
                let DropTarget::Page(page) = over else {
                    return DropOutcome::Aborted(AbortReason::NotOverPage);
                };
                match drop_position(pages, page, end.pointer, scale) {
                    Some(at) => DropOutcome::Added { kind, at },
                    None => DropOutcome::Aborted(AbortReason::PageNotMounted),
                }
            }
        }
    }

    /// Abandon the drag. Returns `true` if one was active.
    pub fn cancel(&mut self) -> bool {
        self.active.take().is_some()
    }
}

fn valid_scale(scale: f64) -> bool {
    scale.is_finite() && scale > 0.0
}

/// Shift a stored point position by a screen-pixel delta, clamped to `>= 0`.
pub fn moved_position(current: DocPoint, delta: Vec2, scale: f64) -> DocPoint {
    let px = points_to_pixels(current.x, scale) + delta.x;
    let py = points_to_pixels(current.y, scale) + delta.y;
    DocPoint::new(pixels_to_points(px, scale), pixels_to_points(py, scale)).clamped()
}

/// Client pointer → clamped document position on `page`.
fn drop_position(pages: &PageLayout, page: u32, pointer: Point, scale: f64) -> Option<PagePosition> {
    if !valid_scale(scale) {
        return None;
    }
    let local = pages.to_page_local(page, pointer)?;
    let point = DocPoint::new(
        pixels_to_points(local.x, scale),
        pixels_to_points(local.y, scale),
    );
    Some(PagePosition::new(page, point))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fp_core::FieldInstance;
    use pretty_assertions::assert_eq;

    fn pages() -> PageLayout {
        let mut layout = PageLayout::default();
        layout.set_page(1, Rect::new(0.0, 0.0, 800.0, 1000.0));
        layout.set_page(2, Rect::new(0.0, 1020.0, 800.0, 2020.0));
        layout
    }

    fn registry_with(id: &str, x: f64, y: f64) -> FieldRegistry {
        FieldRegistry::new().add(FieldInstance::new(
            InstanceId::intern(id),
            FieldKind::new("clientName"),
            PagePosition::new(1, DocPoint::new(x, y)),
        ))
    }

    fn end(rect: Rect, pointer: Point, over: Option<DropTarget>) -> DragEnd {
        DragEnd {
            active_rect: rect,
            pointer,
            over,
        }
    }

    #[test]
    fn field_move_adds_pixel_delta() {
        let reg = registry_with("drag_a", 72.0, 72.0);
        let mut ctl = DragController::new();
        ctl.begin(
            DragPayload::Field(InstanceId::intern("drag_a")),
            Rect::new(96.0, 96.0, 150.0, 110.0),
        );
        let out = ctl.finish(
            &end(
                Rect::new(192.0, 144.0, 246.0, 158.0),
                Point::new(200.0, 150.0),
                Some(DropTarget::Page(1)),
            ),
            &reg,
            &pages(),
            1.0,
        );
        match out {
            DropOutcome::Moved { to, from, .. } => {
                assert_eq!(from.point(), DocPoint::new(72.0, 72.0));
                assert!((to.x - 144.0).abs() < 1e-9);
                assert!((to.y - 108.0).abs() < 1e-9);
                assert_eq!(to.page, 1);
            }
            other => panic!("expected Moved, got {other:?}"),
        }
        assert!(!ctl.is_active());
    }

    #[test]
    fn field_move_clamps_to_origin() {
        let reg = registry_with("drag_clamp", 10.0, 10.0);
        let mut ctl = DragController::new();
        ctl.begin(
            DragPayload::Field(InstanceId::intern("drag_clamp")),
            Rect::new(500.0, 500.0, 520.0, 510.0),
        );
        let out = ctl.finish(
            &end(
                Rect::new(-4000.0, -9000.0, -3980.0, -8990.0),
                Point::ZERO,
                Some(DropTarget::Surface),
            ),
            &reg,
            &pages(),
            2.0,
        );
        match out {
            DropOutcome::Moved { to, .. } => assert_eq!(to.point(), DocPoint::ORIGIN),
            other => panic!("expected Moved, got {other:?}"),
        }
    }

    #[test]
    fn drop_without_target_aborts_and_consumes() {
        let reg = registry_with("drag_none", 10.0, 10.0);
        let mut ctl = DragController::new();
        ctl.begin(
            DragPayload::Field(InstanceId::intern("drag_none")),
            Rect::ZERO,
        );
        let released = end(Rect::new(5.0, 5.0, 6.0, 6.0), Point::ZERO, None);
        assert_eq!(
            ctl.finish(&released, &reg, &pages(), 1.0),
            DropOutcome::Aborted(AbortReason::NoTarget)
        );
        // A second release for the same gesture does nothing.
        assert_eq!(
            ctl.finish(&released, &reg, &pages(), 1.0),
            DropOutcome::Aborted(AbortReason::NoActiveDrag)
        );
    }

    #[test]
    fn palette_drop_maps_pointer_into_page() {
        let mut ctl = DragController::new();
        ctl.begin(DragPayload::Palette(FieldKind::new("projectTotal")), Rect::ZERO);
        let out = ctl.finish(
            &end(
                Rect::ZERO,
                Point::new(96.0, 1020.0 + 48.0),
                Some(DropTarget::Page(2)),
            ),
            &FieldRegistry::new(),
            &pages(),
            1.0,
        );
        match out {
            DropOutcome::Added { kind, at } => {
                assert_eq!(kind, FieldKind::new("projectTotal"));
                assert_eq!(at.page, 2);
                assert!((at.x - 72.0).abs() < 1e-9);
                assert!((at.y - 36.0).abs() < 1e-9);
            }
            other => panic!("expected Added, got {other:?}"),
        }
    }

    #[test]
    fn palette_drop_off_page_aborts() {
        let mut ctl = DragController::new();
        ctl.begin(DragPayload::Palette(FieldKind::new("x")), Rect::ZERO);
        let out = ctl.finish(
            &end(Rect::ZERO, Point::ZERO, Some(DropTarget::Surface)),
            &FieldRegistry::new(),
            &pages(),
            1.0,
        );
        assert_eq!(out, DropOutcome::Aborted(AbortReason::NotOverPage));

        ctl.begin(DragPayload::Palette(FieldKind::new("x")), Rect::ZERO);
        let out = ctl.finish(
            &end(Rect::ZERO, Point::ZERO, Some(DropTarget::Page(7))),
            &FieldRegistry::new(),
            &pages(),
            1.0,
        );
        assert_eq!(out, DropOutcome::Aborted(AbortReason::PageNotMounted));
    }

    #[test]
    fn ghost_follows_pointer_across_pages() {
        let mut ctl = DragController::new();
        ctl.begin(DragPayload::Palette(FieldKind::new("x")), Rect::ZERO);
        let g1 = ctl.track(Point::new(10.0, 10.0), &pages(), 1.0).unwrap();
        assert_eq!(g1.position.page, 1);
        let g2 = ctl.track(Point::new(10.0, 1500.0), &pages(), 1.0).unwrap();
        assert_eq!(g2.position.page, 2);
        assert!(ctl.track(Point::new(10.0, 1010.0), &pages(), 1.0).is_none());
        assert!(ctl.ghost().is_none());
        assert!(ctl.cancel());
        assert!(!ctl.cancel());
    }

    #[test]
    fn invalid_scale_aborts_instead_of_zeroing() {
        let reg = registry_with("drag_scale", 100.0, 100.0);
        let mut ctl = DragController::new();
        ctl.begin(DragPayload::Field(InstanceId::intern("drag_scale")), Rect::ZERO);
        let out = ctl.finish(
            &end(Rect::new(1.0, 1.0, 2.0, 2.0), Point::ZERO, Some(DropTarget::Page(1))),
            &reg,
            &pages(),
            0.0,
        );
        assert_eq!(out, DropOutcome::Aborted(AbortReason::InvalidScale));
    }
}
