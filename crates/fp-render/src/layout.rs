//! Overlay layout: field registry → absolute container rectangles.
//!
//! Each field's stored document-point position is converted to page-local
//! pixels, then offset by its page's position in the overlay container.
//! A field whose page has no geometry yet is left out of this frame; the
//! next layout pass after the page mounts picks it up.
//!
//! Painting is the host's job. This module only says where and what.

use fp_core::model::{FieldInstance, Presentation};
use fp_core::{
    FieldRegistry, FieldResolver, InstanceId, PageLayout, display_text, points_to_pixels,
};
use kurbo::{Point, Rect, Size};

/// Average glyph advance as a fraction of the font size.
const GLYPH_ADVANCE_EM: f64 = 0.6;
/// Line box height as a fraction of the font size.
const LINE_HEIGHT_EM: f64 = 1.25;
/// Minimum hit/paint width in pixels so empty values stay grabbable.
const MIN_WIDTH_PX: f64 = 24.0;

/// One field, ready to paint.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayItem {
    pub id: InstanceId,
    pub page: u32,
    /// Absolute rectangle in container pixels.
    pub rect: Rect,
    pub text: String,
    /// Font size after scaling to screen pixels.
    pub font_size_px: f64,
    pub presentation: Presentation,
}

/// Lay out every renderable field in registry order (paint order).
pub fn layout_overlay(
    registry: &FieldRegistry,
    pages: &PageLayout,
    scale: f64,
    resolver: &dyn FieldResolver,
) -> Vec<OverlayItem> {
    let items: Vec<OverlayItem> = registry
        .iter()
        .filter_map(|field| layout_field(field, pages, scale, resolver))
        .collect();
    log::trace!(
        "overlay layout: {}/{} fields placed at scale {scale:.3}",
        items.len(),
        registry.len()
    );
    items
}

fn layout_field(
    field: &FieldInstance,
    pages: &PageLayout,
    scale: f64,
    resolver: &dyn FieldResolver,
) -> Option<OverlayItem> {
    let offset = pages.page_offset_in_container(field.page)?;
    let origin = Point::new(
        points_to_pixels(field.position.x, scale),
        points_to_pixels(field.position.y, scale),
    ) + offset;

    let text = display_text(field, resolver);
    let font_size_px = points_to_pixels(field.presentation.font_size, scale);
    let size = estimate_extent(&text, font_size_px);

    Some(OverlayItem {
        id: field.instance_id,
        page: field.page,
        rect: Rect::from_origin_size(origin, size),
        text,
        font_size_px,
        presentation: field.presentation.clone(),
    })
}

/// Rough text box for `text` at `font_size_px`.
///
/// Good enough for hit testing; the host's renderer measures for real.
pub fn estimate_extent(text: &str, font_size_px: f64) -> Size {
    let chars = text.chars().count().max(1) as f64;
    let width = (chars * font_size_px * GLYPH_ADVANCE_EM).max(MIN_WIDTH_PX);
    Size::new(width, font_size_px * LINE_HEIGHT_EM)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fp_core::model::{DocPoint, FieldKind, PagePosition};
    use pretty_assertions::assert_eq;

    struct Echo;

    impl FieldResolver for Echo {
        fn label(&self, kind: &FieldKind) -> String {
            kind.to_string()
        }

        fn display_value(&self, field: &FieldInstance) -> String {
            field.field_kind.to_string()
        }
    }

    fn pages() -> PageLayout {
        let mut layout = PageLayout::new(Point::new(0.0, 100.0));
        layout.set_page(1, Rect::new(20.0, 100.0, 820.0, 1100.0));
        layout.set_page(2, Rect::new(20.0, 1120.0, 820.0, 2120.0));
        layout
    }

    fn field(id: &str, page: u32, x: f64, y: f64) -> FieldInstance {
        FieldInstance::new(
            InstanceId::intern(id),
            FieldKind::new("clientName"),
            PagePosition::new(page, DocPoint::new(x, y)),
        )
    }

    #[test]
    fn places_field_at_page_offset_plus_pixels() {
        let reg = FieldRegistry::new().add(field("lay_a", 2, 72.0, 36.0));
        let items = layout_overlay(&reg, &pages(), 1.0, &Echo);
        assert_eq!(items.len(), 1);
        // 72pt → 96px, 36pt → 48px; page 2 sits at (20, 1020) in the container.
        assert_eq!(items[0].rect.origin(), Point::new(116.0, 1068.0));
        assert_eq!(items[0].text, "clientName");
        assert!((items[0].font_size_px - 16.0).abs() < 1e-9);
    }

    #[test]
    fn unmounted_page_is_skipped() {
        let reg = FieldRegistry::new()
            .add(field("lay_b", 1, 0.0, 0.0))
            .add(field("lay_c", 9, 0.0, 0.0));
        let items = layout_overlay(&reg, &pages(), 1.0, &Echo);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, InstanceId::intern("lay_b"));
    }

    #[test]
    fn zero_scale_collapses_to_page_origin() {
        let reg = FieldRegistry::new().add(field("lay_d", 1, 50.0, 50.0));
        let items = layout_overlay(&reg, &pages(), 0.0, &Echo);
        assert_eq!(items[0].rect.origin(), Point::new(20.0, 0.0));
        assert!(items[0].rect.width() >= MIN_WIDTH_PX);
    }

    #[test]
    fn extent_grows_with_text() {
        let short = estimate_extent("ab", 10.0);
        let long = estimate_extent("abcdefghijklmnop", 10.0);
        assert!(long.width > short.width);
        assert_eq!(short.height, 12.5);
    }
}
