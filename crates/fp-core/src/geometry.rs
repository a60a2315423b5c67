//! Page geometry: where each rendered page currently sits on screen.
//!
//! The host's renderer owns the pages; the engine only needs each page's
//! bounding rectangle (in the same client coordinates pointer events use)
//! and the container origin, so it can move between client, container, and
//! page-local pixels. Rectangles go stale on scroll, resize, and zoom, so
//! the host re-reports them on each of those events.

use kurbo::{Point, Rect, Vec2};
use std::collections::BTreeMap;

/// Host collaborator: resolves a page number to its on-screen rectangle.
pub trait PageGeometry {
    /// Current client-space bounding box of `page`, or `None` if that page
    /// is not mounted yet.
    fn page_rect(&self, page: u32) -> Option<Rect>;

    /// Page numbers currently mounted, ascending.
    fn pages(&self) -> Vec<u32>;
}

/// Cached snapshot of page rectangles plus the overlay container origin.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    container_origin: Point,
    rects: BTreeMap<u32, Rect>,
}

impl PageLayout {
    pub fn new(container_origin: Point) -> Self {
        Self {
            container_origin,
            rects: BTreeMap::new(),
        }
    }

    pub fn container_origin(&self) -> Point {
        self.container_origin
    }

    pub fn set_container_origin(&mut self, origin: Point) {
        self.container_origin = origin;
    }

    /// Record a page rectangle. Degenerate or non-finite rects are dropped.
    pub fn set_page(&mut self, page: u32, rect: Rect) {
        let usable = rect.is_finite() && rect.width() > 0.0 && rect.height() > 0.0;
        if usable {
            self.rects.insert(page, rect.abs());
        } else {
            self.rects.remove(&page);
        }
    }

    pub fn remove_page(&mut self, page: u32) {
        self.rects.remove(&page);
    }

    pub fn clear(&mut self) {
        self.rects.clear();
    }

    /// Replace every cached rectangle with a fresh read from `source`.
    pub fn refresh_from(&mut self, source: &dyn PageGeometry) {
        self.rects.clear();
        for page in source.pages() {
            if let Some(rect) = source.page_rect(page) {
                self.set_page(page, rect);
            }
        }
        log::trace!("page layout refreshed: {} pages", self.rects.len());
    }

    /// Page under `point`.
    ///
    /// When the point falls inside several page boxes (overlap during
    /// layout transitions), the page whose center is nearest wins; exact
    /// ties go to the lowest page number.
    pub fn page_at(&self, point: Point) -> Option<u32> {
        let mut best: Option<(u32, f64)> = None;
        for (&page, rect) in &self.rects {
            if !contains_inclusive(rect, point) {
                continue;
            }
            let dist = rect.center().distance_squared(point);
            match best {
                Some((_, d)) if dist >= d => {}
                _ => best = Some((page, dist)),
            }
        }
        best.map(|(page, _)| page)
    }

    /// Client point → pixels relative to `page`'s top-left.
    pub fn to_page_local(&self, page: u32, point: Point) -> Option<Vec2> {
        self.rects.get(&page).map(|r| point - r.origin())
    }

    /// Page top-left relative to the overlay container.
    pub fn page_offset_in_container(&self, page: u32) -> Option<Vec2> {
        self.rects
            .get(&page)
            .map(|r| r.origin() - self.container_origin)
    }

    /// Client point → container-relative point.
    pub fn to_container(&self, point: Point) -> Point {
        (point - self.container_origin).to_point()
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }
}

impl PageGeometry for PageLayout {
    fn page_rect(&self, page: u32) -> Option<Rect> {
        self.rects.get(&page).copied()
    }

    fn pages(&self) -> Vec<u32> {
        self.rects.keys().copied().collect()
    }
}

fn contains_inclusive(rect: &Rect, p: Point) -> bool {
    p.x >= rect.x0 && p.x <= rect.x1 && p.y >= rect.y0 && p.y <= rect.y1
}
