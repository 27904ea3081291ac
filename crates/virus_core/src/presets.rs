//! Stock scenarios.

use crate::config::{ModelSpec, SimulationConfig};
use crate::model::ModelKind;
use crate::simulation::ValidationPolicy;
use crate::solvers::IntegratorKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const HIV_TWO_STRAIN: [(&str, f64); 7] = [
    ("r", 0.5),
    ("p", 0.5),
    ("q", 0.2),
    ("b", 0.2),
    ("c", 1.0),
    ("u", 0.01),
    ("k", 0.8),
];

const HIV_RK4: [(&str, f64); 7] = [
    ("r", 0.3),
    ("p", 0.2),
    ("q", 0.2),
    ("b", 0.2),
    ("c", 0.4),
    ("u", 0.02),
    ("k", 0.8),
];

const HIV_PHASE_SPACE: [(&str, f64); 7] = [
    ("r", 0.5),
    ("p", 0.5),
    ("q", 0.2),
    ("b", 0.2),
    ("c", 0.2),
    ("u", 0.2),
    ("k", 0.8),
];

const GENERIC_FIXED_POINT: [(&str, f64); 6] = [
    ("r", 2.0),
    ("p", 3.0),
    ("q", 2.0),
    ("c", 3.0),
    ("k", 0.0),
    ("b", 2.0),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    HivEuler,
    HivHeun,
    HivRk4,
    HivPhaseSpace,
    GenericFixedPoint,
}

impl Preset {
    pub const ALL: [Preset; 5] = [
        Preset::HivEuler,
        Preset::HivHeun,
        Preset::HivRk4,
        Preset::HivPhaseSpace,
        Preset::GenericFixedPoint,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Preset::HivEuler => "hiv_euler",
            Preset::HivHeun => "hiv_heun",
            Preset::HivRk4 => "hiv_rk4",
            Preset::HivPhaseSpace => "hiv_phase_space",
            Preset::GenericFixedPoint => "generic_fixed_point",
        }
    }

    pub fn config(self) -> SimulationConfig {
        let (kind, params, x0, v0, z0, step, integrator): (
            ModelKind,
            &[(&str, f64)],
            Vec<f64>,
            Vec<f64>,
            f64,
            f64,
            IntegratorKind,
        ) = match self {
            Preset::HivEuler => (
                ModelKind::Hiv,
                &HIV_TWO_STRAIN[..],
                vec![150.0, 150.0],
                vec![100.0, 200.0],
                100.0,
                0.01,
                IntegratorKind::Euler,
            ),
            Preset::HivHeun => (
                ModelKind::Hiv,
                &HIV_TWO_STRAIN[..],
                vec![150.0, 150.0],
                vec![100.0, 200.0],
                100.0,
                0.01,
                IntegratorKind::Heun,
            ),
            Preset::HivRk4 => (
                ModelKind::Hiv,
                &HIV_RK4[..],
                vec![1000.0, 150.0],
                vec![80.0, 30.0],
                0.0,
                0.01,
                IntegratorKind::Rk4,
            ),
            Preset::HivPhaseSpace => (
                ModelKind::Hiv,
                &HIV_PHASE_SPACE[..],
                vec![10.0],
                vec![5.0],
                10.0,
                0.1,
                IntegratorKind::RawMap,
            ),
            Preset::GenericFixedPoint => (
                ModelKind::Generic,
                &GENERIC_FIXED_POINT[..],
                vec![0.0],
                vec![0.0],
                0.0,
                0.1,
                IntegratorKind::Euler,
            ),
        };

        SimulationConfig {
            model: ModelSpec::new(kind, params),
            x0,
            v0,
            z0,
            step,
            start: 0.0,
            integrator,
            validation: ValidationPolicy::default(),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Preset::ALL
            .into_iter()
            .find(|preset| preset.name() == wanted)
            .ok_or_else(|| anyhow::anyhow!("Unknown preset '{}'.", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_preset_builds() {
        for preset in Preset::ALL {
            let mut sim = preset.config().build().expect("preset should build");
            sim.step_n(5);
            assert_eq!(sim.history().len(), 6, "{preset}");
            assert!(sim.history().last_row().is_finite(), "{preset}");
        }
    }

    #[test]
    fn presets_parse_by_name() {
        for preset in Preset::ALL {
            assert_eq!(preset.name().parse::<Preset>().expect("preset"), preset);
        }
        assert_eq!(" HIV_RK4 ".parse::<Preset>().expect("preset"), Preset::HivRk4);
        assert!("hiv_tsit5".parse::<Preset>().is_err());
    }

    #[test]
    fn euler_and_heun_presets_share_initial_state() {
        let euler = Preset::HivEuler.config();
        let heun = Preset::HivHeun.config();
        assert_eq!(euler.model, heun.model);
        assert_eq!(euler.x0, heun.x0);
        assert_eq!(euler.v0, heun.v0);
        assert_ne!(euler.integrator, heun.integrator);
    }
}
