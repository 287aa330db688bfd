use crate::config::SamplerConfig;
use crate::curve::{CurveData, SamplePoint, Segment};
use crate::error::{SampleError, SampleResult};
use crate::expression::CompiledExpression;
use tracing::{debug, trace};

/// Samples expressions over a validated domain.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveSampler {
    config: SamplerConfig,
}

impl Default for CurveSampler {
    fn default() -> Self {
        Self {
            config: SamplerConfig::default(),
        }
    }
}

impl CurveSampler {
    pub fn new(config: SamplerConfig) -> SampleResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Compiles and samples `expression`. An expression that does not
    /// compile has no defined sample, so it reports `NoValidPoints`.
    pub fn sample(&self, expression: &str) -> SampleResult<CurveData> {
        match CompiledExpression::compile(expression, self.config.angle_unit) {
            Ok(compiled) => self.sample_compiled(&compiled),
            Err(err) => {
                debug!(expression, error = %err, "expression did not compile");
                Err(SampleError::NoValidPoints {
                    samples: self.config.sample_count(),
                    cause: Some(err),
                })
            }
        }
    }

    pub fn sample_compiled(&self, compiled: &CompiledExpression) -> SampleResult<CurveData> {
        let config = &self.config;
        let transform = config.transform();
        let sample_count = config.sample_count();
        let mut stack = Vec::with_capacity(16);
        let mut segments = Vec::new();
        let mut open: Option<Segment> = None;
        let mut first_error = None;

        for i in 0..sample_count {
            let x = config.sample_x(i);
            let y = match compiled.evaluate_with(x, &mut stack) {
                Ok(y) => y,
                Err(err) => {
                    trace!(x, error = %err, "undefined sample");
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                    segments.extend(open.take());
                    continue;
                }
            };

            // A jump of exactly the threshold still connects.
            let point = SamplePoint { x, y };
            let screen = transform.to_screen(point);
            match open.as_mut() {
                Some(segment)
                    if transform
                        .to_screen(segment.last())
                        .vertical_distance_to(&screen)
                        <= config.discontinuity_threshold =>
                {
                    segment.push(point);
                }
                _ => {
                    if let Some(segment) = open.replace(Segment::start(point)) {
                        trace!(x, "discontinuity, starting new segment");
                        segments.push(segment);
                    }
                }
            }
        }
        segments.extend(open);

        if segments.is_empty() {
            debug!(
                expression = compiled.source(),
                samples = sample_count,
                "no valid points"
            );
            return Err(SampleError::NoValidPoints {
                samples: sample_count,
                cause: first_error,
            });
        }

        let curve = CurveData::new(compiled.source(), segments, sample_count);
        debug!(
            expression = compiled.source(),
            samples = sample_count,
            defined = curve.defined_count(),
            segments = curve.segments().len(),
            "sampled curve"
        );
        Ok(curve)
    }
}

/// Samples `expression` over `domain` (inclusive) at a fixed `step`, with the
/// remaining settings at their defaults.
pub fn sample_curve(expression: &str, domain: (f64, f64), step: f64) -> SampleResult<CurveData> {
    CurveSampler::new(SamplerConfig::with_domain(domain, step))?.sample(expression)
}

#[cfg(test)]
mod tests {
    use super::{sample_curve, CurveSampler};
    use crate::config::SamplerConfig;
    use crate::curve::CurveData;
    use crate::error::{EvalError, SampleError};
    use crate::traits::AngleUnit;

    const DOMAIN: (f64, f64) = (-10.0, 10.0);
    const STEP: f64 = 0.05;

    fn assert_segment_invariants(curve: &CurveData, step: f64) {
        for segment in curve.segments() {
            assert!(!segment.is_empty(), "segments must not be empty");
            for pair in segment.points().windows(2) {
                let dx = pair[1].x - pair[0].x;
                assert!(
                    (dx - step).abs() < 1e-9,
                    "points inside a segment must be one step apart, got {dx}"
                );
            }
        }
        for pair in curve.segments().windows(2) {
            assert!(
                pair[0].last().x < pair[1].first().x,
                "segments must be ordered and disjoint"
            );
        }
    }

    #[test]
    fn tan_breaks_into_several_segments() {
        let curve = sample_curve("tan(x)", DOMAIN, STEP).expect("tan should plot");
        assert!(
            curve.segments().len() > 1,
            "expected discontinuities, got {} segment(s)",
            curve.segments().len()
        );
        assert_eq!(curve.sample_count(), 401);
        assert_eq!(curve.defined_count(), 401);
        assert_segment_invariants(&curve, STEP);
    }

    #[test]
    fn constant_far_from_origin_stays_in_one_segment() {
        let curve = sample_curve("0*x+999", DOMAIN, STEP).expect("constant should plot");
        assert_eq!(curve.sample_count(), 401);

        // Coarse steps put consecutive samples more than the threshold apart
        // horizontally; a flat line must still not break.
        for step in [STEP, 1.0, 5.0] {
            let curve = sample_curve("0*x+999", DOMAIN, step).expect("constant should plot");
            assert_eq!(curve.segments().len(), 1, "fragmented at step {step}");
            assert_eq!(curve.segments()[0].len(), curve.sample_count());
            assert!(curve.points().all(|p| p.y == 999.0));
        }
    }

    #[test]
    fn jump_of_exactly_the_threshold_stays_connected() {
        let config = SamplerConfig {
            domain_min: 0.0,
            domain_max: 4.0,
            step: 1.0,
            scale: 10.0,
            discontinuity_threshold: 10.0,
            ..SamplerConfig::default()
        };
        let sampler = CurveSampler::new(config).expect("config is valid");

        // Rises exactly 1 per step, i.e. 10 scaled units.
        let curve = sampler.sample("x").expect("line should plot");
        assert_eq!(curve.segments().len(), 1);
        assert_eq!(curve.segments()[0].len(), 5);

        // Anything steeper breaks at every sample.
        let curve = sampler.sample("2*x").expect("line should plot");
        assert_eq!(curve.segments().len(), 5);
        assert_segment_invariants(&curve, 1.0);
    }

    #[test]
    fn unknown_function_reports_no_valid_points() {
        let err = sample_curve("bogus(x)", DOMAIN, STEP).expect_err("nothing to plot");
        assert!(err.is_no_valid_points());
        assert_eq!(
            err,
            SampleError::NoValidPoints {
                samples: 401,
                cause: Some(EvalError::UnknownFunction("bogus".into())),
            }
        );
    }

    #[test]
    fn always_undefined_expression_reports_no_valid_points() {
        let err = sample_curve("1/(x-x)", DOMAIN, STEP).expect_err("nothing to plot");
        assert_eq!(
            err,
            SampleError::NoValidPoints {
                samples: 401,
                cause: Some(EvalError::DivisionByZero),
            }
        );
    }

    #[test]
    fn rejected_domain_is_not_reported_as_no_valid_points() {
        let err = sample_curve("x", (5.0, -5.0), STEP).expect_err("reversed domain");
        assert!(!err.is_no_valid_points());
        assert!(matches!(err, SampleError::InvalidDomain { .. }));

        let err = sample_curve("x", DOMAIN, 0.0).expect_err("zero step");
        assert_eq!(err, SampleError::InvalidStep(0.0));
    }

    #[test]
    fn sampling_is_deterministic() {
        for expression in ["tan(x)", "sin(x)*x", "sqrt(x)", "1/x"] {
            let first = sample_curve(expression, DOMAIN, STEP);
            let second = sample_curve(expression, DOMAIN, STEP);
            assert_eq!(first, second, "{expression} should sample identically");
        }
    }

    #[test]
    fn undefined_samples_split_the_curve() {
        let curve = sample_curve("1/x", DOMAIN, STEP).expect("1/x should plot");
        assert!(curve.segments().len() >= 2);
        assert!(curve.defined_count() < curve.sample_count());
        assert!(curve.points().all(|p| p.x.abs() > 1e-9));
        assert_segment_invariants(&curve, STEP);
    }

    #[test]
    fn inverse_sine_is_restricted_to_its_domain() {
        let curve = sample_curve("sin^(-1)(x)", DOMAIN, STEP).expect("asin should plot");
        assert_eq!(curve.segments().len(), 1);
        let segment = &curve.segments()[0];
        assert!(segment.points().iter().all(|p| (-1.0..=1.0).contains(&p.x)));
        assert!((39..=41).contains(&segment.len()), "got {}", segment.len());
    }

    #[test]
    fn smooth_curves_are_not_fragmented() {
        for expression in ["sin(x)", "cos(x)", "x", "x/2 - 3", "atan(x)"] {
            let curve = sample_curve(expression, DOMAIN, STEP).expect("should plot");
            assert_eq!(curve.segments().len(), 1, "{expression} fragmented");
        }
    }

    #[test]
    fn infinite_threshold_only_breaks_on_undefined_samples() {
        let config = SamplerConfig {
            discontinuity_threshold: f64::INFINITY,
            ..SamplerConfig::default()
        };
        let sampler = CurveSampler::new(config).expect("config is valid");
        let curve = sampler.sample("tan(x)").expect("tan should plot");
        assert_eq!(curve.segments().len(), 1);
    }

    #[test]
    fn degree_sampler_uses_degree_trig() {
        let config = SamplerConfig {
            angle_unit: AngleUnit::Degrees,
            domain_min: 0.0,
            domain_max: 180.0,
            step: 1.0,
            ..SamplerConfig::default()
        };
        let sampler = CurveSampler::new(config).expect("config is valid");
        let curve = sampler.sample("tan(x)").expect("tan should plot");
        // The pole at 90 degrees is an undefined sample.
        assert!(curve.points().all(|p| p.x != 90.0));
        assert_eq!(curve.defined_count(), curve.sample_count() - 1);
        assert!(curve.segments().len() >= 2);
    }
}
