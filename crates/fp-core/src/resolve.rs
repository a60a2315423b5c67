//! Field value lookup.
//!
//! Mapping a field kind to a label and to a display string from business
//! data belongs to the host. The engine calls through `FieldResolver` and
//! never interprets the result.

use crate::model::{FieldInstance, FieldKind};

/// One entry of the field palette.
#[derive(Debug, Clone, PartialEq)]
pub struct PaletteEntry {
    pub kind: FieldKind,
    pub label: String,
}

/// Host collaborator for labels and display values.
///
/// Implemented differently by each host:
/// - WASM: calls back into JavaScript
/// - tests: a fixed table
pub trait FieldResolver {
    /// Human-readable name of `kind` (e.g. "Client name").
    fn label(&self, kind: &FieldKind) -> String;

    /// Display string for `field` given the current business data.
    fn display_value(&self, field: &FieldInstance) -> String;

    /// Kinds offered by the palette, in menu order.
    fn available_kinds(&self) -> Vec<PaletteEntry> {
        Vec::new()
    }
}

/// Text painted for `field`: the literal override wins over the lookup.
pub fn display_text(field: &FieldInstance, resolver: &dyn FieldResolver) -> String {
    match &field.custom_value {
        Some(value) if !value.is_empty() => value.clone(),
        _ => resolver.display_value(field),
    }
}
