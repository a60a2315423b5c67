//! Engine configuration.
//!
//! Parsed from host JSON (camelCase) with every field optional.

use crate::model::Presentation;
use crate::units::Zoom;
use serde::Deserialize;

/// Who commits a piece of state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ownership {
    /// The engine commits its own changes and notifies observers.
    #[default]
    Uncontrolled,
    /// The engine only notifies; the host pushes the value back.
    Controlled,
}

impl Ownership {
    pub fn is_controlled(self) -> bool {
        matches!(self, Ownership::Controlled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    pub fields: Ownership,
    pub mode: Ownership,
    pub selection: Ownership,
    pub pending: Ownership,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub control: ControlConfig,
    /// Page height in document points, for fit-to-height scale.
    pub page_height_pt: f64,
    pub initial_zoom: Zoom,
    /// Presentation given to newly created fields.
    pub default_presentation: Presentation,
    /// Seed for the random part of generated ids. `None` derives one from
    /// the clock at construction.
    pub id_seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            control: ControlConfig::default(),
            page_height_pt: 842.0,
            initial_zoom: Zoom::default(),
            default_presentation: Presentation::default(),
            id_seed: None,
        }
    }
}

impl EngineConfig {
    /// Parse a JSON config object.
    ///
    /// # Errors
    /// Returns a message describing the malformed input.
    pub fn from_json(json: &str) -> Result<Self, String> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        let mut config: Self =
            serde_json::from_str(json).map_err(|e| format!("invalid engine config: {e}"))?;
        if !config.page_height_pt.is_finite() || config.page_height_pt <= 0.0 {
            log::warn!(
                "pageHeightPt {} unusable, using default",
                config.page_height_pt
            );
            config.page_height_pt = Self::default().page_height_pt;
        }
        Ok(config)
    }
}
