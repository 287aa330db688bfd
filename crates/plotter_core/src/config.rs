//! Sampler configuration.
//!
//! Every field is optional when deserializing; missing fields take the
//! graphing view's defaults (domain [-10, 10], step 0.05, scale 20,
//! discontinuity threshold 50, radians).

use crate::error::{SampleError, SampleResult};
use crate::traits::AngleUnit;
use crate::transform::{PlotTransform, DEFAULT_SCALE};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Hard cap on samples per curve.
pub const MAX_SAMPLES: usize = 100_000;

/// Tolerance, in steps, for the last sample landing on the domain maximum.
const STEP_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    pub domain_min: f64,
    pub domain_max: f64,
    pub step: f64,
    /// Renderer points per function-space unit.
    pub scale: f64,
    /// Largest distance, in renderer points, still drawn as a connected line.
    pub discontinuity_threshold: f64,
    pub angle_unit: AngleUnit,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            domain_min: -10.0,
            domain_max: 10.0,
            step: 0.05,
            scale: DEFAULT_SCALE,
            discontinuity_threshold: 50.0,
            angle_unit: AngleUnit::Radians,
        }
    }
}

impl SamplerConfig {
    /// Default config over a different domain and step.
    pub fn with_domain(domain: (f64, f64), step: f64) -> Self {
        Self {
            domain_min: domain.0,
            domain_max: domain.1,
            step,
            ..Self::default()
        }
    }

    /// Loads a (possibly partial) TOML document over the defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: SamplerConfig =
            toml::from_str(text).context("failed to parse sampler config")?;
        config
            .validate()
            .context("sampler config rejected")?;
        Ok(config)
    }

    pub fn transform(&self) -> PlotTransform {
        PlotTransform::new(self.scale)
    }

    /// Number of samples the domain yields, both endpoints included.
    pub fn sample_count(&self) -> usize {
        let span = (self.domain_max - self.domain_min) / self.step;
        (span + STEP_EPSILON).floor() as usize + 1
    }

    /// The i-th sample position. Computed by multiplication so positions
    /// never drift with the number of steps taken.
    pub fn sample_x(&self, index: usize) -> f64 {
        self.domain_min + self.step * index as f64
    }

    pub fn validate(&self) -> SampleResult<()> {
        let (min, max) = (self.domain_min, self.domain_max);
        if !min.is_finite() || !max.is_finite() || max < min {
            return Err(SampleError::InvalidDomain { min, max });
        }
        if !self.step.is_finite() || self.step <= 0.0 {
            return Err(SampleError::InvalidStep(self.step));
        }
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(SampleError::InvalidScale(self.scale));
        }
        if self.discontinuity_threshold.is_nan() || self.discontinuity_threshold <= 0.0 {
            return Err(SampleError::InvalidThreshold(self.discontinuity_threshold));
        }
        let span = (max - min) / self.step;
        if !span.is_finite() || span >= MAX_SAMPLES as f64 {
            return Err(SampleError::TooManySamples {
                requested: if span.is_finite() {
                    span as usize + 1
                } else {
                    usize::MAX
                },
                limit: MAX_SAMPLES,
            });
        }
        Ok(())
    }
}
