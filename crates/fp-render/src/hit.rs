//! Hit testing: point → field lookup.
//!
//! Walks the laid-out overlay back-to-front (last painted = topmost) to find
//! which field, if any, sits under a container-relative point.

use crate::layout::OverlayItem;
use fp_core::InstanceId;
use kurbo::Point;

/// Find the topmost field at `point` (container pixels).
/// Returns `None` if the point is over bare document.
pub fn hit_test(items: &[OverlayItem], point: Point) -> Option<InstanceId> {
    items
        .iter()
        .rev()
        .find(|item| contains(item, point))
        .map(|item| item.id)
}

fn contains(item: &OverlayItem, p: Point) -> bool {
    let r = item.rect;
    p.x >= r.x0 && p.x <= r.x1 && p.y >= r.y0 && p.y <= r.y1
}
