//! Linear map between function space and the renderer's point space.
//!
//! The renderer applies its own zoom and y-flip on top of this.

use crate::curve::SamplePoint;
use serde::{Deserialize, Serialize};

/// Renderer points per function-space unit.
pub const DEFAULT_SCALE: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    /// Vertical gap to `other`. Consecutive samples are always one step apart
    /// horizontally, so only the vertical gap says whether the curve jumped.
    pub fn vertical_distance_to(&self, other: &ScreenPoint) -> f64 {
        (self.y - other.y).abs()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlotTransform {
    pub scale: f64,
}

impl Default for PlotTransform {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
        }
    }
}

impl PlotTransform {
    pub fn new(scale: f64) -> Self {
        Self { scale }
    }

    pub fn to_screen(&self, point: SamplePoint) -> ScreenPoint {
        ScreenPoint {
            x: point.x * self.scale,
            y: point.y * self.scale,
        }
    }

    pub fn to_value(&self, point: ScreenPoint) -> SamplePoint {
        SamplePoint {
            x: point.x / self.scale,
            y: point.y / self.scale,
        }
    }
}
