//! Stateless evaluation and sampling entry points.

use js_sys::Float64Array;
use plotter_core::transform::PlotTransform;
use plotter_core::{CurveData, CurveSampler, SamplerConfig};
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

/// Evaluates `expression` at `x` (trig in degrees); `undefined` where it has no value.
#[wasm_bindgen]
pub fn evaluate(expression: &str, x: f64) -> Option<f64> {
    plotter_core::evaluate(expression, x)
}

/// Samples `expression` and returns the serialized curve, or throws the
/// sampling error message (including "no valid points").
#[wasm_bindgen]
pub fn sample_curve(
    expression: &str,
    domain_min: f64,
    domain_max: f64,
    step: f64,
) -> Result<JsValue, JsValue> {
    let curve = plotter_core::sample_curve(expression, (domain_min, domain_max), step)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    to_value(&curve).map_err(|e| JsValue::from_str(&format!("Failed to serialize curve: {}", e)))
}

/// Samples `expression` with `config_val` (or defaults when undefined) and
/// returns renderer points as `[x0, y0, x1, y1, ...]`, with a `NaN, NaN`
/// pair between segments.
#[wasm_bindgen]
pub fn sample_curve_points(expression: &str, config_val: JsValue) -> Result<Float64Array, JsValue> {
    let config = parse_config(config_val)?;
    let sampler = CurveSampler::new(config).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let curve = sampler
        .sample(expression)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    let flat = flatten_segments(&curve, &config.transform());
    Ok(Float64Array::from(flat.as_slice()))
}

pub(crate) fn parse_config(config_val: JsValue) -> Result<SamplerConfig, JsValue> {
    if config_val.is_undefined() || config_val.is_null() {
        return Ok(SamplerConfig::default());
    }
    from_value(config_val)
        .map_err(|e| JsValue::from_str(&format!("Invalid sampler config: {}", e)))
}

pub(crate) fn flatten_segments(curve: &CurveData, transform: &PlotTransform) -> Vec<f64> {
    let mut flat = Vec::with_capacity(2 * (curve.defined_count() + curve.segments().len()));
    for (i, segment) in curve.segments().iter().enumerate() {
        if i > 0 {
            flat.extend([f64::NAN, f64::NAN]);
        }
        for point in segment.points() {
            let screen = transform.to_screen(*point);
            flat.extend([screen.x, screen.y]);
        }
    }
    flat
}
