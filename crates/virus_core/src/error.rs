//! Errors raised while building models and simulations.

use thiserror::Error;

/// Construction-time failures. Stepping itself never fails: numerical blow-ups
/// propagate into the history as non-finite values instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("Missing parameter '{0}'.")]
    MissingParameter(String),

    #[error("Parameter '{name}' = {value} is not representable in the scalar type.")]
    InvalidParameter { name: String, value: f64 },

    #[error("Initial state dimension mismatch: x0 has {x} strains, v0 has {v}.")]
    DimensionMismatch { x: usize, v: usize },

    #[error("Invalid step size {0}.")]
    InvalidStepSize(f64),

    #[error("Simulation has no strains.")]
    NoStrains,
}
