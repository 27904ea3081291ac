use crate::error::ModelError;
use crate::traits::{Scalar, VirusModel};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// Coefficient names required by every model variant.
pub const BASE_PARAMS: [&str; 6] = ["r", "p", "q", "c", "k", "b"];

/// Extra coefficient required by the HIV variant.
pub const HIV_COUPLING_PARAM: &str = "u";

/// Anything coefficients can be looked up from by name.
pub trait ParamLookup {
    fn lookup(&self, name: &str) -> Option<f64>;
}

impl ParamLookup for HashMap<String, f64> {
    fn lookup(&self, name: &str) -> Option<f64> {
        self.get(name).copied()
    }
}

impl ParamLookup for BTreeMap<String, f64> {
    fn lookup(&self, name: &str) -> Option<f64> {
        self.get(name).copied()
    }
}

impl ParamLookup for [(&str, f64)] {
    fn lookup(&self, name: &str) -> Option<f64> {
        self.iter().find(|(key, _)| *key == name).map(|(_, value)| *value)
    }
}

impl<const N: usize> ParamLookup for [(&str, f64); N] {
    fn lookup(&self, name: &str) -> Option<f64> {
        self.as_slice().lookup(name)
    }
}

fn require<T: Scalar, P: ParamLookup + ?Sized>(params: &P, name: &str) -> Result<T, ModelError> {
    let value = params
        .lookup(name)
        .ok_or_else(|| ModelError::MissingParameter(name.to_string()))?;
    T::from_f64(value).ok_or_else(|| ModelError::InvalidParameter {
        name: name.to_string(),
        value,
    })
}

/// Coefficients shared by all virus models.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VirusParams<T> {
    /// Intrinsic viral clearance rate.
    pub r: T,
    /// Strain-specific immune suppression of viral clearance.
    pub p: T,
    /// Global immune suppression of viral clearance.
    pub q: T,
    /// Viral stimulation of the strain-specific response.
    pub c: T,
    /// Decay rate of both immune compartments.
    pub b: T,
    /// Viral stimulation of the global response.
    pub k: T,
}

impl<T: Scalar> VirusParams<T> {
    pub fn from_params<P: ParamLookup + ?Sized>(params: &P) -> Result<Self, ModelError> {
        Ok(Self {
            r: require(params, "r")?,
            p: require(params, "p")?,
            q: require(params, "q")?,
            c: require(params, "c")?,
            k: require(params, "k")?,
            b: require(params, "b")?,
        })
    }
}

/// Coefficients of the HIV variant: the base set plus the viral coupling `u`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HivParams<T> {
    pub base: VirusParams<T>,
    pub u: T,
}

impl<T: Scalar> HivParams<T> {
    pub fn from_params<P: ParamLookup + ?Sized>(params: &P) -> Result<Self, ModelError> {
        Ok(Self {
            base: VirusParams::from_params(params)?,
            u: require(params, HIV_COUPLING_PARAM)?,
        })
    }
}

/// The generic within-host virus model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenericVirusModel<T> {
    params: VirusParams<T>,
}

impl<T: Scalar> GenericVirusModel<T> {
    pub fn new(params: VirusParams<T>) -> Self {
        Self { params }
    }

    pub fn from_params<P: ParamLookup + ?Sized>(params: &P) -> Result<Self, ModelError> {
        VirusParams::from_params(params).map(Self::new)
    }

    pub fn params(&self) -> VirusParams<T> {
        self.params
    }
}

impl<T: Scalar> VirusModel<T> for GenericVirusModel<T> {
    fn dv(&self, x: T, v: T, z: T) -> T {
        let VirusParams { r, p, q, .. } = self.params;
        -v * (r - p * x - q * z)
    }

    fn dx(&self, x: T, v: T, _z: T, _svi: T) -> T {
        -self.params.c * v - self.params.b * x
    }

    fn dz(&self, z: T, svi: T) -> T {
        self.params.k * svi - self.params.b * z
    }
}

/// HIV specialization: the total viral load also depletes both immune compartments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HivModel<T> {
    generic: GenericVirusModel<T>,
    u: T,
}

impl<T: Scalar> HivModel<T> {
    pub fn new(params: HivParams<T>) -> Self {
        Self {
            generic: GenericVirusModel::new(params.base),
            u: params.u,
        }
    }

    pub fn from_params<P: ParamLookup + ?Sized>(params: &P) -> Result<Self, ModelError> {
        HivParams::from_params(params).map(Self::new)
    }

    pub fn params(&self) -> HivParams<T> {
        HivParams {
            base: self.generic.params(),
            u: self.u,
        }
    }
}

impl<T: Scalar> VirusModel<T> for HivModel<T> {
    fn dv(&self, x: T, v: T, z: T) -> T {
        self.generic.dv(x, v, z)
    }

    fn dx(&self, x: T, v: T, z: T, svi: T) -> T {
        self.generic.dx(x, v, z, svi) - self.u * svi * x
    }

    fn dz(&self, z: T, svi: T) -> T {
        self.generic.dz(z, svi) - self.u * svi * z
    }
}

/// Model variant tag used by configuration and the WASM bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Generic,
    Hiv,
}

impl ModelKind {
    pub fn name(self) -> &'static str {
        match self {
            ModelKind::Generic => "generic",
            ModelKind::Hiv => "hiv",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "generic" | "virus" => Ok(ModelKind::Generic),
            "hiv" => Ok(ModelKind::Hiv),
            other => anyhow::bail!("Unknown model kind '{}'.", other),
        }
    }
}

/// A model whose variant is chosen at run time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnyModel<T> {
    Generic(GenericVirusModel<T>),
    Hiv(HivModel<T>),
}

impl<T: Scalar> AnyModel<T> {
    pub fn from_params<P: ParamLookup + ?Sized>(
        kind: ModelKind,
        params: &P,
    ) -> Result<Self, ModelError> {
        match kind {
            ModelKind::Generic => GenericVirusModel::from_params(params).map(AnyModel::Generic),
            ModelKind::Hiv => HivModel::from_params(params).map(AnyModel::Hiv),
        }
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            AnyModel::Generic(_) => ModelKind::Generic,
            AnyModel::Hiv(_) => ModelKind::Hiv,
        }
    }
}

impl<T: Scalar> VirusModel<T> for AnyModel<T> {
    fn dv(&self, x: T, v: T, z: T) -> T {
        match self {
            AnyModel::Generic(m) => m.dv(x, v, z),
            AnyModel::Hiv(m) => m.dv(x, v, z),
        }
    }

    fn dx(&self, x: T, v: T, z: T, svi: T) -> T {
        match self {
            AnyModel::Generic(m) => m.dx(x, v, z, svi),
            AnyModel::Hiv(m) => m.dx(x, v, z, svi),
        }
    }

    fn dz(&self, z: T, svi: T) -> T {
        match self {
            AnyModel::Generic(m) => m.dz(z, svi),
            AnyModel::Hiv(m) => m.dz(z, svi),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: [(&str, f64); 6] = [
        ("r", 2.0),
        ("p", 3.0),
        ("q", 2.0),
        ("c", 3.0),
        ("k", 0.0),
        ("b", 2.0),
    ];

    fn with_u(u: f64) -> Vec<(&'static str, f64)> {
        let mut params = BASE.to_vec();
        params.push(("u", u));
        params
    }

    #[test]
    fn generic_model_rejects_each_missing_parameter() {
        for missing in BASE_PARAMS {
            let params: Vec<(&str, f64)> =
                BASE.iter().copied().filter(|(name, _)| *name != missing).collect();
            let err = GenericVirusModel::<f64>::from_params(params.as_slice())
                .expect_err("missing parameter should fail");
            assert_eq!(err, ModelError::MissingParameter(missing.to_string()));
        }
    }

    #[test]
    fn generic_model_accepts_complete_map_and_ignores_extras() {
        let mut params: HashMap<String, f64> =
            BASE.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        params.insert("unused".to_string(), 9.0);
        let model = GenericVirusModel::<f64>::from_params(&params).expect("model");
        assert_eq!(model.params().r, 2.0);
        assert_eq!(model.params().b, 2.0);
    }

    #[test]
    fn hiv_model_requires_coupling_parameter() {
        let err = HivModel::<f64>::from_params(&BASE).expect_err("u is required");
        assert_eq!(err, ModelError::MissingParameter("u".to_string()));
        assert!(err.to_string().contains("'u'"));
    }

    #[test]
    fn hiv_model_still_requires_base_parameters() {
        let params = [("u", 2.0), ("r", 1.0)];
        let err = HivModel::<f64>::from_params(&params).expect_err("base is required");
        assert!(matches!(err, ModelError::MissingParameter(_)));
    }

    #[test]
    fn generic_derivatives_match_closed_form() {
        let model = GenericVirusModel::<f64>::from_params(&BASE).expect("model");
        let (x, v, z, svi) = (1.5, 0.5, 0.25, 4.0);

        assert_eq!(model.dv(x, v, z), -v * (2.0 - 3.0 * x - 2.0 * z));
        assert_eq!(model.dx(x, v, z, svi), -3.0 * v - 2.0 * x);
        assert_eq!(model.dz(z, svi), 0.0 * svi - 2.0 * z);
    }

    #[test]
    fn evaluation_is_bitwise_repeatable() {
        let model = HivModel::<f64>::from_params(with_u(0.37).as_slice()).expect("model");
        let args = (0.123_456_789, 98.765, 3.21, 101.5);
        let first = (
            model.dv(args.0, args.1, args.2),
            model.dx(args.0, args.1, args.2, args.3),
            model.dz(args.2, args.3),
        );
        for _ in 0..10 {
            let again = (
                model.dv(args.0, args.1, args.2),
                model.dx(args.0, args.1, args.2, args.3),
                model.dz(args.2, args.3),
            );
            assert_eq!(first.0.to_bits(), again.0.to_bits());
            assert_eq!(first.1.to_bits(), again.1.to_bits());
            assert_eq!(first.2.to_bits(), again.2.to_bits());
        }
    }

    #[test]
    fn hiv_coupling_diverges_from_generic_when_viral_input_present() {
        let generic = GenericVirusModel::<f64>::from_params(&BASE).expect("generic");
        let hiv = HivModel::<f64>::from_params(with_u(2.0).as_slice()).expect("hiv");
        let (x, v, z) = (1.0, 2.0, 3.0);

        for svi in [0.5, 2.0, -1.0] {
            assert_ne!(generic.dx(x, v, z, svi), hiv.dx(x, v, z, svi));
            assert_ne!(generic.dz(z, svi), hiv.dz(z, svi));
            assert_eq!(hiv.dx(x, v, z, svi), generic.dx(x, v, z, svi) - 2.0 * svi * x);
            assert_eq!(hiv.dz(z, svi), generic.dz(z, svi) - 2.0 * svi * z);
        }

        assert_eq!(generic.dx(x, v, z, 0.0), hiv.dx(x, v, z, 0.0));
        assert_eq!(generic.dz(z, 0.0), hiv.dz(z, 0.0));
        assert_eq!(generic.dv(x, v, z), hiv.dv(x, v, z));
    }

    #[test]
    fn any_model_dispatches_to_variant() {
        let params: BTreeMap<String, f64> =
            with_u(2.0).into_iter().map(|(k, v)| (k.to_string(), v)).collect();
        let model = AnyModel::<f64>::from_params(ModelKind::Hiv, &params).expect("model");
        let hiv = HivModel::<f64>::from_params(&params).expect("hiv");

        assert_eq!(model.kind(), ModelKind::Hiv);
        assert_eq!(model.dx(1.0, 2.0, 3.0, 4.0), hiv.dx(1.0, 2.0, 3.0, 4.0));
        assert_eq!(model.dz(3.0, 4.0), hiv.dz(3.0, 4.0));
    }

    #[test]
    fn model_kind_parses_names() {
        assert_eq!("HIV".parse::<ModelKind>().expect("kind"), ModelKind::Hiv);
        assert_eq!("generic".parse::<ModelKind>().expect("kind"), ModelKind::Generic);
        assert!("flu".parse::<ModelKind>().is_err());
    }
}
