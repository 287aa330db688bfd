use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// A trait for types the expression VM can evaluate over.
/// Must support basic arithmetic, trig, debug printing, and conversion from f64.
pub trait Scalar: Float + FromPrimitive + Debug + 'static {}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}

/// Unit in which trigonometric functions read their argument
/// (and in which inverse trig functions report their result).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleUnit {
    #[default]
    Degrees,
    Radians,
}

impl AngleUnit {
    /// Converts an angle expressed in this unit to radians.
    pub fn to_radians<T: Scalar>(self, angle: T) -> T {
        match self {
            AngleUnit::Degrees => angle.to_radians(),
            AngleUnit::Radians => angle,
        }
    }

    /// Converts an angle in radians back to this unit.
    pub fn from_radians<T: Scalar>(self, radians: T) -> T {
        match self {
            AngleUnit::Degrees => radians.to_degrees(),
            AngleUnit::Radians => radians,
        }
    }
}
