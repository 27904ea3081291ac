//! WASM bridge exposing virus simulations to a JavaScript plotting front end.

use anyhow::{bail, Result};
use std::collections::BTreeMap;
use virus_core::config::{ModelSpec, SimulationConfig};
use virus_core::model::{AnyModel, ModelKind};
use virus_core::presets::Preset;
use virus_core::simulation::{Simulation, ValidationPolicy};
use virus_core::solvers::IntegratorKind;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WasmSimulation {
    inner: Simulation<f64, AnyModel<f64>>,
}

fn to_js_error(err: anyhow::Error) -> JsValue {
    JsValue::from_str(&format!("{err:#}"))
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn build_config(
    model_kind: &str,
    param_names: &[String],
    params: &[f64],
    x0: Vec<f64>,
    v0: Vec<f64>,
    z0: f64,
    step: f64,
    start: f64,
    integrator: &str,
) -> Result<SimulationConfig> {
    if param_names.len() != params.len() {
        bail!(
            "Parameter names and values differ in length ({} vs {}).",
            param_names.len(),
            params.len()
        );
    }
    let kind: ModelKind = model_kind.parse()?;
    let integrator: IntegratorKind = integrator.parse()?;
    let params: BTreeMap<String, f64> = param_names
        .iter()
        .cloned()
        .zip(params.iter().copied())
        .collect();

    Ok(SimulationConfig {
        model: ModelSpec { kind, params },
        x0,
        v0,
        z0,
        step,
        start,
        integrator,
        validation: ValidationPolicy::default(),
    })
}

impl WasmSimulation {
    fn from_simulation_config(config: &SimulationConfig) -> Result<WasmSimulation, JsValue> {
        console_error_panic_hook::set_once();
        let inner = config.build().map_err(to_js_error)?;
        Ok(WasmSimulation { inner })
    }
}

#[wasm_bindgen]
impl WasmSimulation {
    #[wasm_bindgen(constructor)]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        model_kind: &str,
        param_names: Vec<String>,
        params: Vec<f64>,
        x0: Vec<f64>,
        v0: Vec<f64>,
        z0: f64,
        step: f64,
        start: f64,
        integrator: &str,
    ) -> Result<WasmSimulation, JsValue> {
        let config = build_config(
            model_kind,
            &param_names,
            &params,
            x0,
            v0,
            z0,
            step,
            start,
            integrator,
        )
        .map_err(to_js_error)?;
        Self::from_simulation_config(&config)
    }

    pub fn from_config(json: &str) -> Result<WasmSimulation, JsValue> {
        let config = SimulationConfig::from_json(json).map_err(to_js_error)?;
        Self::from_simulation_config(&config)
    }

    pub fn from_preset(name: &str) -> Result<WasmSimulation, JsValue> {
        let preset: Preset = name.parse().map_err(to_js_error)?;
        Self::from_simulation_config(&preset.config())
    }

    pub fn step(&mut self) {
        self.inner.step();
    }

    pub fn step_n(&mut self, steps: usize) {
        self.inner.step_n(steps);
    }

    pub fn reset(&mut self) {
        self.inner.reset();
    }

    pub fn len(&self) -> usize {
        self.inner.history().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.history().is_empty()
    }

    pub fn strains(&self) -> usize {
        self.inner.strains()
    }

    pub fn integrator(&self) -> String {
        self.inner.integrator().to_string()
    }

    pub fn times(&self) -> Vec<f64> {
        self.inner.history().times().to_vec()
    }

    pub fn z(&self) -> Vec<f64> {
        self.inner.history().z().to_vec()
    }

    /// `x` time series of one strain; empty for an out-of-range strain.
    pub fn x_series(&self, strain: usize) -> Vec<f64> {
        self.inner.history().x_series(strain).unwrap_or_default()
    }

    /// `v` time series of one strain; empty for an out-of-range strain.
    pub fn v_series(&self, strain: usize) -> Vec<f64> {
        self.inner.history().v_series(strain).unwrap_or_default()
    }

    pub fn history(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner.history().snapshot())
            .map_err(|err| JsValue::from_str(&format!("Failed to serialize history: {err}")))
    }
}
