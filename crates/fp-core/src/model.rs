//! Placed-field data model.
//!
//! A `FieldInstance` anchors one occurrence of a field kind to a page at a
//! position in document points. Presentation attributes ride along as an
//! opaque payload: the engine stores and forwards them, never reads them.

use crate::id::InstanceId;
use serde::{Deserialize, Serialize};
use std::fmt;

// ─── Field kind ──────────────────────────────────────────────────────────

/// Which data a field renders (e.g. `"clientName"`, `"customCurrency"`).
///
/// Opaque to the engine: only the host's `FieldResolver` interprets it.
/// Never used as identity; several instances may share a kind.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldKind(String);

impl FieldKind {
    pub fn new(kind: impl Into<String>) -> Self {
        Self(kind.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FieldKind {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// ─── Positions ───────────────────────────────────────────────────────────

/// A point in document space, `(0,0)` at the page's top-left.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DocPoint {
    pub x: f64,
    pub y: f64,
}

impl DocPoint {
    pub const ORIGIN: DocPoint = DocPoint { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Force both axes finite and `>= 0`. Non-finite components become 0.
    pub fn clamped(self) -> Self {
        fn axis(v: f64) -> f64 {
            if v.is_finite() { v.max(0.0) } else { 0.0 }
        }
        Self {
            x: axis(self.x),
            y: axis(self.y),
        }
    }
}

/// A document point on a specific 1-based page.
///
/// Also the shape of a pending position: a candidate placement awaiting a
/// follow-up action.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PagePosition {
    pub page: u32,
    pub x: f64,
    pub y: f64,
}

impl PagePosition {
    /// Build a position with the point clamped and page floored at 1.
    pub fn new(page: u32, point: DocPoint) -> Self {
        let point = point.clamped();
        Self {
            page: page.max(1),
            x: point.x,
            y: point.y,
        }
    }

    pub fn point(&self) -> DocPoint {
        DocPoint::new(self.x, self.y)
    }
}

// ─── Presentation payload ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

/// Font/color/alignment attributes owned by the properties panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Presentation {
    pub font_size: f64,
    pub color: String,
    pub align: TextAlign,
    pub weight: FontWeight,
    pub family: String,
}

impl Default for Presentation {
    fn default() -> Self {
        Self {
            font_size: 12.0,
            color: "#000000".to_string(),
            align: TextAlign::Left,
            weight: FontWeight::Normal,
            family: "Helvetica".to_string(),
        }
    }
}

// ─── Field instance ──────────────────────────────────────────────────────

/// One placed, positioned occurrence of a field kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldInstance {
    pub instance_id: InstanceId,
    pub field_kind: FieldKind,
    /// 1-based page number.
    pub page: u32,
    pub position: DocPoint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_value: Option<String>,
    #[serde(default)]
    pub presentation: Presentation,
}

impl FieldInstance {
    pub fn new(instance_id: InstanceId, field_kind: FieldKind, at: PagePosition) -> Self {
        Self {
            instance_id,
            field_kind,
            page: at.page,
            position: at.point(),
            custom_value: None,
            presentation: Presentation::default(),
        }
    }

    pub fn with_custom_value(mut self, value: Option<String>) -> Self {
        self.custom_value = value;
        self
    }

    pub fn with_presentation(mut self, presentation: Presentation) -> Self {
        self.presentation = presentation;
        self
    }

    pub fn placement(&self) -> PagePosition {
        PagePosition {
            page: self.page,
            x: self.position.x,
            y: self.position.y,
        }
    }

    /// Re-establish the position invariants after deserialization.
    pub(crate) fn normalize(&mut self) {
        self.page = self.page.max(1);
        self.position = self.position.clamped();
    }
}

/// Partial update applied by `FieldRegistry::update`.
///
/// `None` leaves the attribute untouched. `custom_value: Some(None)` clears
/// the override.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldPatch {
    pub page: Option<u32>,
    pub position: Option<DocPoint>,
    pub custom_value: Option<Option<String>>,
    pub presentation: Option<Presentation>,
}

impl FieldPatch {
    /// Patch that moves a field to `at`.
    pub fn place(at: PagePosition) -> Self {
        Self {
            page: Some(at.page),
            position: Some(at.point()),
            ..Self::default()
        }
    }

    /// Patch that moves a field within its current page.
    pub fn position(point: DocPoint) -> Self {
        Self {
            position: Some(point),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.page.is_none()
            && self.position.is_none()
            && self.custom_value.is_none()
            && self.presentation.is_none()
    }

    pub(crate) fn apply_to(&self, field: &mut FieldInstance) {
        if let Some(page) = self.page {
            field.page = page.max(1);
        }
        if let Some(point) = self.position {
            field.position = point.clamped();
        }
        if let Some(value) = &self.custom_value {
            field.custom_value = value.clone();
        }
        if let Some(presentation) = &self.presentation {
            field.presentation = presentation.clone();
        }
    }
}
