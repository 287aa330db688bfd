//! The `plotter_core` crate is the math engine behind the graph plotter.
//! It turns a user-typed, single-variable expression into sampled curve
//! segments ready to be drawn.
//!
//! Key components:
//! - **Expression**: tokenizer, recursive-descent parser and a small bytecode VM.
//!   `evaluate` reads trig arguments in degrees and returns `None` wherever the
//!   expression has no real value.
//! - **Sampler**: walks a domain at a fixed step and splits the curve at undefined
//!   samples and at jumps larger than the discontinuity threshold.
//! - **Session**: the UI-owned curve list (expression, enabled flag, color).

pub mod config;
pub mod curve;
pub mod error;
pub mod expression;
pub mod sampler;
pub mod session;
pub mod traits;
pub mod transform;

pub use config::SamplerConfig;
pub use curve::{CurveData, SamplePoint, Segment};
pub use error::{ErrorKind, EvalError, SampleError};
pub use expression::{evaluate, try_evaluate, CompiledExpression};
pub use sampler::{sample_curve, CurveSampler};
pub use session::{CurveEntry, CurveOutcome, PlotReport, PlotSession};
pub use traits::AngleUnit;
