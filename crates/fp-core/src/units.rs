//! Document points ↔ screen pixels.
//!
//! Field positions are stored in document points (72 per inch) so they stay
//! put under zoom. The screen baseline is 96 DPI, multiplied by a single
//! scale factor that folds together fit-to-height and the user zoom.
//!
//! Degenerate input never produces `NaN`: a non-finite value or a
//! non-positive scale converts to `0.0`.

use serde::{Deserialize, Serialize};

/// Document convention: 72 points per inch.
pub const POINTS_PER_INCH: f64 = 72.0;

/// Screen baseline: 96 CSS pixels per inch.
pub const SCREEN_DPI: f64 = 96.0;

fn valid_scale(scale: f64) -> bool {
    scale.is_finite() && scale > 0.0
}

/// Convert document points to screen pixels at `scale`.
pub fn points_to_pixels(points: f64, scale: f64) -> f64 {
    if !points.is_finite() || !valid_scale(scale) {
        return 0.0;
    }
    points / POINTS_PER_INCH * SCREEN_DPI * scale
}

/// Convert screen pixels to document points at `scale`.
pub fn pixels_to_points(pixels: f64, scale: f64) -> f64 {
    if !pixels.is_finite() || !valid_scale(scale) {
        return 0.0;
    }
    pixels / scale / SCREEN_DPI * POINTS_PER_INCH
}

/// Scale factor for a page fit to the container height, times the user zoom.
///
/// Returns `0.0` when the viewport or page height is unusable; the
/// converters treat that as "unpositioned".
pub fn fit_scale(zoom: Zoom, viewport_height: f64, page_height_pt: f64) -> f64 {
    if !viewport_height.is_finite()
        || !page_height_pt.is_finite()
        || viewport_height <= 0.0
        || page_height_pt <= 0.0
    {
        return 0.0;
    }
    zoom.value() * (viewport_height / page_height_pt)
}

/// User-controlled zoom level, always within `[Zoom::MIN, Zoom::MAX]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Zoom(f64);

impl Zoom {
    pub const MIN: f64 = 0.5;
    pub const MAX: f64 = 3.0;
    pub const STEP: f64 = 0.25;
    pub const DEFAULT: f64 = 1.0;

    /// Clamp `value` into range. Non-finite input falls back to 1.0.
    pub fn new(value: f64) -> Self {
        if !value.is_finite() {
            return Self(Self::DEFAULT);
        }
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn zoom_in(self) -> Self {
        Self::new(self.0 + Self::STEP)
    }

    pub fn zoom_out(self) -> Self {
        Self::new(self.0 - Self::STEP)
    }

    pub fn reset() -> Self {
        Self(Self::DEFAULT)
    }
}

impl Default for Zoom {
    fn default() -> Self {
        Self::reset()
    }
}

impl From<f64> for Zoom {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<Zoom> for f64 {
    fn from(zoom: Zoom) -> Self {
        zoom.0
    }
}
