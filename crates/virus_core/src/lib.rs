//! The `virus_core` crate models within-host viral dynamics over several competing strains
//! sharing one immune-response term, and advances them with fixed-step integrators.
//! It is generic over the scalar type (`f32`, `f64`) through the `Scalar` trait.
//!
//! Key components:
//! - **Traits**: `Scalar`, `VirusModel` (the `dv`/`dx`/`dz` capability set), `Integrator`.
//! - **Model**: `GenericVirusModel`, `HivModel` and the runtime-selected `AnyModel`.
//! - **State**: `StateRow` snapshots and the per-channel `StrainHistory`.
//! - **Solvers**: `RawMap`, `Euler`, `Heun`, `Rk4`, dispatched through `Solver`.
//! - **Simulation**: the runner that owns a history and appends one row per step.
//! - **Config / Presets**: serde-backed scenario descriptions, including the stock HIV runs.
pub mod config;
pub mod error;
pub mod model;
pub mod presets;
pub mod simulation;
pub mod solvers;
pub mod state;
pub mod traits;
