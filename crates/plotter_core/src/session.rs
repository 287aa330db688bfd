//! Curve list owned by the presentation layer.
//!
//! The session holds what the UI edits (expression text, enabled flag,
//! color) and turns it into a [`PlotReport`] on demand. Sampling itself is
//! delegated to a stateless [`CurveSampler`].

use crate::config::SamplerConfig;
use crate::curve::CurveData;
use crate::error::{SampleError, SampleResult};
use crate::sampler::CurveSampler;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Banner shown when nothing at all could be plotted.
pub const NO_POINTS_MESSAGE: &str = "Invalid equation(s) or no points to plot";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveEntry {
    pub expression: String,
    pub enabled: bool,
    /// Display color, passed through to the renderer untouched.
    pub color: String,
}

impl CurveEntry {
    pub fn new(expression: &str, color: &str) -> Self {
        Self {
            expression: expression.to_string(),
            enabled: true,
            color: color.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CurveOutcome {
    Plotted { curve: CurveData },
    Disabled,
    NoValidPoints { message: String },
    /// The sampler refused the run itself, e.g. an out-of-range config.
    Rejected { message: String },
}

impl CurveOutcome {
    fn from_sample(result: SampleResult<CurveData>) -> Self {
        match result {
            Ok(curve) => CurveOutcome::Plotted { curve },
            Err(SampleError::NoValidPoints {
                cause: Some(cause), ..
            }) => CurveOutcome::NoValidPoints {
                message: cause.to_string(),
            },
            Err(err @ SampleError::NoValidPoints { cause: None, .. }) => {
                CurveOutcome::NoValidPoints {
                    message: err.to_string(),
                }
            }
            Err(err) => CurveOutcome::Rejected {
                message: err.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurveReport {
    pub expression: String,
    pub color: String,
    #[serde(flatten)]
    pub outcome: CurveOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotReport {
    pub curves: Vec<CurveReport>,
    /// Set when at least one curve is enabled and none of them plotted.
    pub error: Option<String>,
}

impl PlotReport {
    pub fn plotted(&self) -> impl Iterator<Item = &CurveData> {
        self.curves.iter().filter_map(|report| match &report.outcome {
            CurveOutcome::Plotted { curve } => Some(curve),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlotSession {
    sampler: CurveSampler,
    curves: Vec<CurveEntry>,
}

impl Default for PlotSession {
    /// `sin(x)` in blue and `cos(x)` in red, both enabled.
    fn default() -> Self {
        Self {
            sampler: CurveSampler::default(),
            curves: vec![CurveEntry::new("sin(x)", "blue"), CurveEntry::new("cos(x)", "red")],
        }
    }
}

impl PlotSession {
    /// An empty session sampling with `config`.
    pub fn new(config: SamplerConfig) -> SampleResult<Self> {
        Ok(Self {
            sampler: CurveSampler::new(config)?,
            curves: Vec::new(),
        })
    }

    pub fn config(&self) -> &SamplerConfig {
        self.sampler.config()
    }

    pub fn set_config(&mut self, config: SamplerConfig) -> SampleResult<()> {
        self.sampler = CurveSampler::new(config)?;
        Ok(())
    }

    pub fn curves(&self) -> &[CurveEntry] {
        &self.curves
    }

    /// Appends an enabled curve and returns its index.
    pub fn add_curve(&mut self, expression: &str, color: &str) -> usize {
        self.curves.push(CurveEntry::new(expression, color));
        self.curves.len() - 1
    }

    pub fn remove_curve(&mut self, index: usize) -> Result<CurveEntry> {
        self.check_index(index)?;
        Ok(self.curves.remove(index))
    }

    pub fn set_enabled(&mut self, index: usize, enabled: bool) -> Result<()> {
        self.check_index(index)?;
        self.curves[index].enabled = enabled;
        Ok(())
    }

    pub fn set_expression(&mut self, index: usize, expression: &str) -> Result<()> {
        self.check_index(index)?;
        self.curves[index].expression = expression.to_string();
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.curves.len() {
            bail!(
                "Curve index {} out of range ({} curves).",
                index,
                self.curves.len()
            );
        }
        Ok(())
    }

    /// Samples every enabled curve. Each call builds fresh curve data.
    pub fn plot(&self) -> PlotReport {
        let curves: Vec<CurveReport> = self
            .curves
            .iter()
            .map(|entry| CurveReport {
                expression: entry.expression.clone(),
                color: entry.color.clone(),
                outcome: self.plot_entry(entry),
            })
            .collect();

        let mut enabled = curves
            .iter()
            .filter(|report| report.outcome != CurveOutcome::Disabled)
            .peekable();
        let nothing_plotted = enabled.peek().is_some()
            && enabled.all(|report| matches!(report.outcome, CurveOutcome::NoValidPoints { .. }));

        let error = nothing_plotted.then(|| NO_POINTS_MESSAGE.to_string());
        debug!(curves = curves.len(), nothing_plotted, "plotted session");
        PlotReport { curves, error }
    }

    fn plot_entry(&self, entry: &CurveEntry) -> CurveOutcome {
        if !entry.enabled {
            return CurveOutcome::Disabled;
        }
        CurveOutcome::from_sample(self.sampler.sample(&entry.expression))
    }
}

#[cfg(test)]
mod tests {
    use super::{CurveOutcome, PlotSession, NO_POINTS_MESSAGE};
    use crate::config::SamplerConfig;
    use crate::error::SampleError;

    #[test]
    fn default_session_plots_sine_and_cosine() {
        let report = PlotSession::default().plot();
        assert_eq!(report.curves.len(), 2);
        assert_eq!(report.curves[0].expression, "sin(x)");
        assert_eq!(report.curves[0].color, "blue");
        assert_eq!(report.curves[1].color, "red");
        assert_eq!(report.plotted().count(), 2);
        assert_eq!(report.error, None);
    }

    #[test]
    fn disabled_curves_are_not_sampled() {
        let mut session = PlotSession::default();
        session.set_enabled(1, false).expect("index exists");
        let report = session.plot();
        assert_eq!(report.curves[1].outcome, CurveOutcome::Disabled);
        assert_eq!(report.plotted().count(), 1);
    }

    #[test]
    fn banner_shows_when_every_enabled_curve_fails() {
        let mut session = PlotSession::default();
        session.set_expression(0, "bogus(x)").expect("index exists");
        session.set_expression(1, "asin(x) + ").expect("index exists");
        let report = session.plot();
        assert_eq!(report.error.as_deref(), Some(NO_POINTS_MESSAGE));
        match &report.curves[0].outcome {
            CurveOutcome::NoValidPoints { message } => {
                assert!(message.contains("bogus"), "unexpected message: {message}")
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn banner_stays_hidden_while_one_curve_plots() {
        let mut session = PlotSession::default();
        session.set_expression(0, "bogus(x)").expect("index exists");
        assert_eq!(session.plot().error, None);
    }

    #[test]
    fn banner_stays_hidden_when_everything_is_disabled() {
        let mut session = PlotSession::default();
        session.set_enabled(0, false).expect("index exists");
        session.set_enabled(1, false).expect("index exists");
        let report = session.plot();
        assert_eq!(report.error, None);
        assert_eq!(report.plotted().count(), 0);
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let mut session = PlotSession::default();
        let err = session.set_enabled(5, true).expect_err("no such curve");
        assert!(err.to_string().contains("out of range"), "unexpected error: {err}");
        assert!(session.remove_curve(2).is_err());
    }

    #[test]
    fn add_and_remove_curves() {
        let mut session = PlotSession::new(SamplerConfig::default()).expect("valid config");
        assert!(session.curves().is_empty());
        let index = session.add_curve("x^2", "green");
        assert_eq!(index, 0);
        let removed = session.remove_curve(index).expect("index exists");
        assert_eq!(removed.expression, "x^2");
        assert!(session.curves().is_empty());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = SamplerConfig::with_domain((0.0, 1.0), -0.1);
        assert!(PlotSession::new(config).is_err());
        let mut session = PlotSession::default();
        assert!(session.set_config(config).is_err());
        assert_eq!(session.config(), &SamplerConfig::default());
    }

    #[test]
    fn report_serializes_with_status_tags() {
        let mut session = PlotSession::default();
        session.set_enabled(1, false).expect("index exists");
        let json = serde_json::to_value(session.plot()).expect("report serializes");
        assert_eq!(json["curves"][0]["status"], "plotted");
        assert_eq!(json["curves"][1]["status"], "disabled");
        assert!(json["curves"][0]["curve"]["segments"][0][0]["x"].is_number());
    }

    #[test]
    fn only_no_valid_points_counts_as_nothing_to_plot() {
        let empty = CurveOutcome::from_sample(Err(SampleError::NoValidPoints {
            samples: 3,
            cause: None,
        }));
        assert_eq!(
            empty,
            CurveOutcome::NoValidPoints {
                message: "no valid points to plot across 3 samples".into()
            }
        );

        let rejected = CurveOutcome::from_sample(Err(SampleError::InvalidStep(0.0)));
        match rejected {
            CurveOutcome::Rejected { message } => {
                assert!(message.contains("invalid step"), "unexpected message: {message}")
            }
            other => panic!("a rejected run is not an empty plot, got {other:?}"),
        }
    }
}
