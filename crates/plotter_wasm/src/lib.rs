//! WASM bindings for the graph plotter core.
//!
//! Free functions cover one-off evaluation and sampling; `WasmPlotSession`
//! keeps the curve list for a plotting view.

mod plot;
mod session;

pub use plot::{evaluate, sample_curve, sample_curve_points};
pub use session::WasmPlotSession;
