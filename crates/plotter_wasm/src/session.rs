//! Plot session wrapper.

use crate::plot::parse_config;
use plotter_core::PlotSession;
use serde_wasm_bindgen::to_value;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WasmPlotSession {
    session: PlotSession,
}

fn to_js_error(err: anyhow::Error) -> JsValue {
    JsValue::from_str(&format!("{err:#}"))
}

#[wasm_bindgen]
impl WasmPlotSession {
    /// An empty session; `config_val` may be `undefined` for the default config.
    #[wasm_bindgen(constructor)]
    pub fn new(config_val: JsValue) -> Result<WasmPlotSession, JsValue> {
        console_error_panic_hook::set_once();

        let config = parse_config(config_val)?;
        let session = PlotSession::new(config)
            .map_err(|e| JsValue::from_str(&format!("Invalid sampler config: {}", e)))?;
        Ok(WasmPlotSession { session })
    }

    /// A session preloaded with `sin(x)` and `cos(x)`.
    pub fn with_default_curves() -> WasmPlotSession {
        console_error_panic_hook::set_once();
        WasmPlotSession {
            session: PlotSession::default(),
        }
    }

    pub fn set_config(&mut self, config_val: JsValue) -> Result<(), JsValue> {
        let config = parse_config(config_val)?;
        self.session
            .set_config(config)
            .map_err(|e| JsValue::from_str(&format!("Invalid sampler config: {}", e)))
    }

    pub fn add_curve(&mut self, expression: &str, color: &str) -> usize {
        self.session.add_curve(expression, color)
    }

    pub fn remove_curve(&mut self, index: usize) -> Result<(), JsValue> {
        self.session.remove_curve(index).map(|_| ()).map_err(to_js_error)
    }

    pub fn set_enabled(&mut self, index: usize, enabled: bool) -> Result<(), JsValue> {
        self.session.set_enabled(index, enabled).map_err(to_js_error)
    }

    pub fn set_expression(&mut self, index: usize, expression: &str) -> Result<(), JsValue> {
        self.session
            .set_expression(index, expression)
            .map_err(to_js_error)
    }

    pub fn curves(&self) -> Result<JsValue, JsValue> {
        to_value(self.session.curves())
            .map_err(|e| JsValue::from_str(&format!("Failed to serialize curves: {}", e)))
    }

    /// Samples every enabled curve and returns the serialized plot report.
    pub fn plot(&self) -> Result<JsValue, JsValue> {
        to_value(&self.session.plot())
            .map_err(|e| JsValue::from_str(&format!("Failed to serialize plot report: {}", e)))
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::WasmPlotSession;
    use plotter_core::SamplerConfig;
    use serde_wasm_bindgen::to_value;
    use wasm_bindgen::JsValue;
    use wasm_bindgen_test::wasm_bindgen_test;

    fn error_message(err: JsValue) -> String {
        err.as_string().unwrap_or_default()
    }

    #[wasm_bindgen_test]
    fn session_rejects_invalid_config() {
        let config = SamplerConfig::with_domain((1.0, -1.0), 0.1);
        let result = WasmPlotSession::new(to_value(&config).expect("config"));
        assert!(result.is_err(), "should reject reversed domain");
        let message = result.err().map(error_message).unwrap_or_default();
        assert!(message.contains("Invalid sampler config"));
    }

    #[wasm_bindgen_test]
    fn session_accepts_undefined_config() {
        let mut session = WasmPlotSession::new(JsValue::UNDEFINED).expect("defaults");
        assert_eq!(session.add_curve("x", "green"), 0);
        assert!(session.plot().is_ok());
    }

    #[wasm_bindgen_test]
    fn out_of_range_index_is_reported() {
        let mut session = WasmPlotSession::with_default_curves();
        let message = session
            .set_enabled(9, false)
            .err()
            .map(error_message)
            .unwrap_or_default();
        assert!(message.contains("out of range"), "unexpected error: {message}");
    }

    #[wasm_bindgen_test]
    fn evaluate_is_exposed() {
        assert_eq!(crate::evaluate("asin(x)", 2.0), None);
        let value = crate::evaluate("sin(x)", 30.0).expect("defined");
        assert!((value - 0.5).abs() < 1e-12);
    }
}
