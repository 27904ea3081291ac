//! Serializable simulation descriptions.

use crate::model::{AnyModel, ModelKind};
use crate::simulation::{Simulation, ValidationPolicy};
use crate::solvers::IntegratorKind;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn default_step() -> f64 {
    0.1
}

/// Which model to build and with which coefficients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub kind: ModelKind,
    pub params: BTreeMap<String, f64>,
}

impl ModelSpec {
    pub fn new(kind: ModelKind, params: &[(&str, f64)]) -> Self {
        Self {
            kind,
            params: params
                .iter()
                .map(|(name, value)| (name.to_string(), *value))
                .collect(),
        }
    }

    pub fn build(&self) -> Result<AnyModel<f64>> {
        AnyModel::from_params(self.kind, &self.params)
            .with_context(|| format!("Invalid parameters for {} model.", self.kind))
    }
}

/// Everything needed to start a simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub model: ModelSpec,
    pub x0: Vec<f64>,
    pub v0: Vec<f64>,
    pub z0: f64,
    #[serde(default = "default_step")]
    pub step: f64,
    #[serde(default)]
    pub start: f64,
    #[serde(default)]
    pub integrator: IntegratorKind,
    #[serde(default)]
    pub validation: ValidationPolicy,
}

impl SimulationConfig {
    pub fn from_json(input: &str) -> Result<Self> {
        serde_json::from_str(input).context("Failed to parse simulation config.")
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize simulation config.")
    }

    pub fn build(&self) -> Result<Simulation<f64, AnyModel<f64>>> {
        let model = self.model.build()?;
        Simulation::with_policy(
            model,
            self.x0.clone(),
            self.v0.clone(),
            self.z0,
            self.step,
            self.start,
            self.integrator,
            self.validation,
        )
        .context("Invalid simulation setup.")
    }
}
