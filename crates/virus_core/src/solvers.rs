use crate::state::{total, RowView, StateRow};
use crate::traits::{Integrator, Scalar, VirusModel};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Discrete Map Stepper
/// The model output replaces the state: x_{n+1} = dx(x_n, ...), and likewise for v and z.
/// dt does not scale anything, it only advances t.
#[derive(Debug, Clone, Default)]
pub struct RawMap;

impl RawMap {
    pub fn new() -> Self {
        Self
    }
}

impl<T: Scalar> Integrator<T> for RawMap {
    fn step(&mut self, model: &impl VirusModel<T>, row: RowView<'_, T>, dt: T) -> StateRow<T> {
        let svi = row.svi();
        let n = row.strains();
        let mut x = Vec::with_capacity(n);
        let mut v = Vec::with_capacity(n);
        for i in 0..n {
            x.push(model.dx(row.x[i], row.v[i], row.z, svi));
            v.push(model.dv(row.x[i], row.v[i], row.z));
        }

        StateRow {
            x,
            v,
            z: model.dz(row.z, svi),
            t: row.t + dt,
        }
    }
}

/// Forward Euler, first order.
#[derive(Debug, Clone, Default)]
pub struct Euler;

impl Euler {
    pub fn new() -> Self {
        Self
    }
}

impl<T: Scalar> Integrator<T> for Euler {
    fn step(&mut self, model: &impl VirusModel<T>, row: RowView<'_, T>, dt: T) -> StateRow<T> {
        let svi = row.svi();
        let n = row.strains();
        let mut x = Vec::with_capacity(n);
        let mut v = Vec::with_capacity(n);
        for i in 0..n {
            x.push(row.x[i] + dt * model.dx(row.x[i], row.v[i], row.z, svi));
            v.push(row.v[i] + dt * model.dv(row.x[i], row.v[i], row.z));
        }

        StateRow {
            x,
            v,
            z: row.z + dt * model.dz(row.z, svi),
            t: row.t + dt,
        }
    }
}

/// Heun's predictor-corrector, second order.
///
/// The predictor holds absolute next-state values (a full Euler row), not increments.
pub struct Heun<T: Scalar> {
    k1x: Vec<T>,
    k1v: Vec<T>,
}

impl<T: Scalar> Heun<T> {
    pub fn new(strains: usize) -> Self {
        Self {
            k1x: vec![T::zero(); strains],
            k1v: vec![T::zero(); strains],
        }
    }
}

impl<T: Scalar> Integrator<T> for Heun<T> {
    fn step(&mut self, model: &impl VirusModel<T>, row: RowView<'_, T>, dt: T) -> StateRow<T> {
        let half_dt = dt * T::from_f64(0.5).unwrap();
        let n = row.strains();
        self.k1x.resize(n, T::zero());
        self.k1v.resize(n, T::zero());

        // Predictor: k1 = y + dt * f(y)
        let svi = row.svi();
        let k1z = row.z + dt * model.dz(row.z, svi);
        for i in 0..n {
            self.k1x[i] = row.x[i] + dt * model.dx(row.x[i], row.v[i], row.z, svi);
            self.k1v[i] = row.v[i] + dt * model.dv(row.x[i], row.v[i], row.z);
        }

        // Corrector: y_next = y + dt/2 * f(y) + dt/2 * f(k1)
        let sv1i = total(&self.k1v);
        let mut x = Vec::with_capacity(n);
        let mut v = Vec::with_capacity(n);
        for i in 0..n {
            x.push(
                row.x[i]
                    + half_dt * model.dx(row.x[i], row.v[i], row.z, svi)
                    + half_dt * model.dx(self.k1x[i], self.k1v[i], k1z, sv1i),
            );
            v.push(
                row.v[i]
                    + half_dt * model.dv(row.x[i], row.v[i], row.z)
                    + half_dt * model.dv(self.k1x[i], self.k1v[i], k1z),
            );
        }
        let z = row.z + half_dt * model.dz(row.z, svi) + half_dt * model.dz(k1z, sv1i);

        StateRow {
            x,
            v,
            z,
            t: row.t + dt,
        }
    }
}

/// One RK4 stage: scaled increments `dt * f(...)` for every channel,
/// plus the summed viral input the stage was evaluated with.
#[derive(Debug, Clone, PartialEq)]
pub struct Rk4Stage<T> {
    pub x: Vec<T>,
    pub v: Vec<T>,
    pub z: T,
    pub svi: T,
}

impl<T: Scalar> Rk4Stage<T> {
    fn new(strains: usize) -> Self {
        Self {
            x: vec![T::zero(); strains],
            v: vec![T::zero(); strains],
            z: T::zero(),
            svi: T::zero(),
        }
    }
}

/// The four stages of the most recent RK4 step.
#[derive(Debug, Clone, PartialEq)]
pub struct Rk4Stages<T> {
    pub k1: Rk4Stage<T>,
    pub k2: Rk4Stage<T>,
    pub k3: Rk4Stage<T>,
    pub k4: Rk4Stage<T>,
}

/// Classic Runge-Kutta 4th Order Solver
///
/// Stages store increments (already multiplied by dt). Each later stage is evaluated at
/// `row + weight * previous` with its `svi` taken as the sum of the previous stage's
/// `v` increments, and the final row adds the weighted increment sum to the original row.
pub struct Rk4<T: Scalar> {
    stages: Rk4Stages<T>,
}

impl<T: Scalar> Rk4<T> {
    pub fn new(strains: usize) -> Self {
        Self {
            stages: Rk4Stages {
                k1: Rk4Stage::new(strains),
                k2: Rk4Stage::new(strains),
                k3: Rk4Stage::new(strains),
                k4: Rk4Stage::new(strains),
            },
        }
    }

    /// Stages computed by the last call to `step`.
    pub fn stages(&self) -> &Rk4Stages<T> {
        &self.stages
    }
}

/// Evaluates one RK4 stage into `out`.
/// `offset` is the previous stage and its weight; `None` evaluates at the row itself.
fn evaluate_stage<T: Scalar>(
    model: &impl VirusModel<T>,
    row: RowView<'_, T>,
    dt: T,
    offset: Option<(&Rk4Stage<T>, T)>,
    out: &mut Rk4Stage<T>,
) {
    let n = row.strains();
    out.x.resize(n, T::zero());
    out.v.resize(n, T::zero());

    match offset {
        None => {
            let svi = row.svi();
            for i in 0..n {
                out.x[i] = dt * model.dx(row.x[i], row.v[i], row.z, svi);
                out.v[i] = dt * model.dv(row.x[i], row.v[i], row.z);
            }
            out.z = dt * model.dz(row.z, svi);
            out.svi = svi;
        }
        Some((prev, weight)) => {
            let svi = total(&prev.v);
            let z = row.z + weight * prev.z;
            for i in 0..n {
                let x = row.x[i] + weight * prev.x[i];
                let v = row.v[i] + weight * prev.v[i];
                out.x[i] = dt * model.dx(x, v, z, svi);
                out.v[i] = dt * model.dv(x, v, z);
            }
            out.z = dt * model.dz(z, svi);
            out.svi = svi;
        }
    }
}

impl<T: Scalar> Integrator<T> for Rk4<T> {
    fn step(&mut self, model: &impl VirusModel<T>, row: RowView<'_, T>, dt: T) -> StateRow<T> {
        let half = T::from_f64(0.5).unwrap();
        let sixth = T::from_f64(1.0 / 6.0).unwrap();
        let two = T::from_f64(2.0).unwrap();
        let stages = &mut self.stages;

        // k1 = dt * f(y)
        evaluate_stage(model, row, dt, None, &mut stages.k1);
        // k2 = dt * f(y + k1/2)
        evaluate_stage(model, row, dt, Some((&stages.k1, half)), &mut stages.k2);
        // k3 = dt * f(y + k2/2)
        evaluate_stage(model, row, dt, Some((&stages.k2, half)), &mut stages.k3);
        // k4 = dt * f(y + k3)
        evaluate_stage(model, row, dt, Some((&stages.k3, T::one())), &mut stages.k4);

        let combine = |k1: T, k2: T, k3: T, k4: T| sixth * (k1 + two * k2 + two * k3 + k4);
        let n = row.strains();
        let mut x = Vec::with_capacity(n);
        let mut v = Vec::with_capacity(n);
        for i in 0..n {
            x.push(
                row.x[i]
                    + combine(stages.k1.x[i], stages.k2.x[i], stages.k3.x[i], stages.k4.x[i]),
            );
            v.push(
                row.v[i]
                    + combine(stages.k1.v[i], stages.k2.v[i], stages.k3.v[i], stages.k4.v[i]),
            );
        }
        let z = row.z + combine(stages.k1.z, stages.k2.z, stages.k3.z, stages.k4.z);

        StateRow {
            x,
            v,
            z,
            t: row.t + dt,
        }
    }
}

/// Selects which fixed-step scheme a simulation uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegratorKind {
    RawMap,
    #[default]
    Euler,
    Heun,
    Rk4,
}

impl IntegratorKind {
    pub const ALL: [IntegratorKind; 4] = [
        IntegratorKind::RawMap,
        IntegratorKind::Euler,
        IntegratorKind::Heun,
        IntegratorKind::Rk4,
    ];

    pub fn name(self) -> &'static str {
        match self {
            IntegratorKind::RawMap => "raw_map",
            IntegratorKind::Euler => "euler",
            IntegratorKind::Heun => "heun",
            IntegratorKind::Rk4 => "rk4",
        }
    }
}

impl fmt::Display for IntegratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for IntegratorKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw_map" | "raw" | "map" | "discrete" => Ok(IntegratorKind::RawMap),
            "euler" => Ok(IntegratorKind::Euler),
            "heun" | "rk2" => Ok(IntegratorKind::Heun),
            "rk4" => Ok(IntegratorKind::Rk4),
            other => anyhow::bail!("Unknown integrator '{}'.", other),
        }
    }
}

/// Runtime-selected integrator.
pub enum Solver<T: Scalar> {
    RawMap(RawMap),
    Euler(Euler),
    Heun(Heun<T>),
    Rk4(Rk4<T>),
}

impl<T: Scalar> Solver<T> {
    pub fn new(kind: IntegratorKind, strains: usize) -> Self {
        match kind {
            IntegratorKind::RawMap => Solver::RawMap(RawMap::new()),
            IntegratorKind::Euler => Solver::Euler(Euler::new()),
            IntegratorKind::Heun => Solver::Heun(Heun::new(strains)),
            IntegratorKind::Rk4 => Solver::Rk4(Rk4::new(strains)),
        }
    }

    pub fn kind(&self) -> IntegratorKind {
        match self {
            Solver::RawMap(_) => IntegratorKind::RawMap,
            Solver::Euler(_) => IntegratorKind::Euler,
            Solver::Heun(_) => IntegratorKind::Heun,
            Solver::Rk4(_) => IntegratorKind::Rk4,
        }
    }
}

impl<T: Scalar> Integrator<T> for Solver<T> {
    fn step(&mut self, model: &impl VirusModel<T>, row: RowView<'_, T>, dt: T) -> StateRow<T> {
        match self {
            Solver::RawMap(s) => s.step(model, row, dt),
            Solver::Euler(s) => s.step(model, row, dt),
            Solver::Heun(s) => s.step(model, row, dt),
            Solver::Rk4(s) => s.step(model, row, dt),
        }
    }
}
