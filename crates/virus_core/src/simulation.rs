//! The simulation runner: owns a history and appends one row per step.

use crate::error::ModelError;
use crate::solvers::{IntegratorKind, Solver};
use crate::state::{StateRow, StrainHistory};
use crate::traits::{Integrator, Scalar, VirusModel};
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

/// Optional guards applied when a simulation is built.
///
/// The default is permissive: zero or negative step sizes and strain-free
/// simulations are allowed, which raw-map exploration relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationPolicy {
    pub reject_non_positive_step: bool,
    pub reject_empty_strains: bool,
}

impl ValidationPolicy {
    pub fn strict() -> Self {
        Self {
            reject_non_positive_step: true,
            reject_empty_strains: true,
        }
    }

    fn check<T: Scalar>(&self, strains: usize, step: T) -> Result<(), ModelError> {
        let step_value = step.to_f64().unwrap_or(f64::NAN);
        if !step.is_finite() || (self.reject_non_positive_step && step <= T::zero()) {
            return Err(ModelError::InvalidStepSize(step_value));
        }
        if self.reject_empty_strains && strains == 0 {
            return Err(ModelError::NoStrains);
        }
        Ok(())
    }
}

/// Drives an integrator over a model, keeping the full history.
///
/// The model is only read; pass `&model` to share one model between simulations.
pub struct Simulation<T: Scalar, M> {
    model: M,
    solver: Solver<T>,
    history: StrainHistory<T>,
    step: T,
    warned_non_finite: bool,
}

impl<T: Scalar, M: VirusModel<T>> Simulation<T, M> {
    pub fn new(
        model: M,
        x0: Vec<T>,
        v0: Vec<T>,
        z0: T,
        step: T,
        start: T,
        integrator: IntegratorKind,
    ) -> Result<Self, ModelError> {
        Self::with_policy(
            model,
            x0,
            v0,
            z0,
            step,
            start,
            integrator,
            ValidationPolicy::default(),
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn with_policy(
        model: M,
        x0: Vec<T>,
        v0: Vec<T>,
        z0: T,
        step: T,
        start: T,
        integrator: IntegratorKind,
        policy: ValidationPolicy,
    ) -> Result<Self, ModelError> {
        let initial = StateRow::new(x0, v0, z0, start)?;
        let strains = initial.strains();
        policy.check(strains, step)?;

        debug!(
            "Creating {} simulation: {} strains, step {:?}, start {:?}.",
            integrator, strains, step, start
        );

        Ok(Self {
            model,
            solver: Solver::new(integrator, strains),
            history: StrainHistory::new(initial),
            step,
            warned_non_finite: false,
        })
    }

    /// Appends exactly one row computed from the current last row.
    pub fn step(&mut self) {
        let next = self
            .solver
            .step(&self.model, self.history.last_row(), self.step);
        trace!("Step {} reached t = {:?}.", self.history.len(), next.t);

        if !self.warned_non_finite && !next.is_finite() {
            warn!(
                "Non-finite values appeared at row {} (t = {:?}); the trajectory has diverged.",
                self.history.len(),
                next.t
            );
            self.warned_non_finite = true;
        }

        self.history.push(next);
    }

    pub fn step_n(&mut self, steps: usize) {
        for _ in 0..steps {
            self.step();
        }
    }

    /// Truncates the history back to the initial row.
    pub fn reset(&mut self) {
        debug!("Resetting simulation with {} rows.", self.history.len());
        self.history.truncate_to_initial();
        self.warned_non_finite = false;
    }

    pub fn history(&self) -> &StrainHistory<T> {
        &self.history
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn step_size(&self) -> T {
        self.step
    }

    pub fn strains(&self) -> usize {
        self.history.strains()
    }

    pub fn integrator(&self) -> IntegratorKind {
        self.solver.kind()
    }

    /// The active solver, e.g. to inspect RK4 stages after a step.
    pub fn solver(&self) -> &Solver<T> {
        &self.solver
    }
}
