//! # Summer Dike
//!
//! Secondary storage feature of tabulated (ZW) profiles: a low dike that
//! floods the area behind it once the water rises above its crest.

use serde::{Deserialize, Serialize};

/// Summer dike parameters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SummerDike {
    /// Whether the dike takes part in the computation
    pub active: bool,
    /// Crest level of the dike
    pub crest_level: f64,
    /// Base level of the floodplain behind the dike
    pub floodplain_level: f64,
    /// Flow area behind the dike
    pub flood_surface: f64,
    /// Total area behind the dike
    pub total_surface: f64,
}

impl SummerDike {
    /// Creates an active dike.
    pub fn new(crest_level: f64, floodplain_level: f64, flood_surface: f64, total_surface: f64) -> Self {
        Self {
            active: true,
            crest_level,
            floodplain_level,
            flood_surface,
            total_surface,
        }
    }

    /// Returns a copy with both levels moved by `delta`.
    pub fn shifted(&self, delta: f64) -> Self {
        Self {
            crest_level: self.crest_level + delta,
            floodplain_level: self.floodplain_level + delta,
            ..*self
        }
    }

    /// Moves both levels when the dike is active.
    pub fn shift_level(&mut self, delta: f64) {
        if self.active {
            *self = self.shifted(delta);
        }
    }
}
