use crate::state::{RowView, StateRow};
use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// A trait for types that can be used as scalars in the virus models.
/// Must support basic arithmetic, debug printing, and conversion from f64.
pub trait Scalar: Float + FromPrimitive + Debug + 'static {}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}

/// The capability set every virus model variant provides.
///
/// All three functions must be pure: integrators call them several times per step
/// with perturbed inputs and rely on identical inputs giving identical outputs.
pub trait VirusModel<T: Scalar> {
    /// Rate of change of the viral load `v_i` of one strain.
    fn dv(&self, x: T, v: T, z: T) -> T;

    /// Rate of change of the immune-target compartment `x_i` of one strain.
    /// `svi` is the summed viral load across all strains at the same evaluation point.
    fn dx(&self, x: T, v: T, z: T, svi: T) -> T;

    /// Rate of change of the shared immune response `z`.
    fn dz(&self, z: T, svi: T) -> T;
}

impl<T: Scalar, M: VirusModel<T> + ?Sized> VirusModel<T> for &M {
    fn dv(&self, x: T, v: T, z: T) -> T {
        (**self).dv(x, v, z)
    }

    fn dx(&self, x: T, v: T, z: T, svi: T) -> T {
        (**self).dx(x, v, z, svi)
    }

    fn dz(&self, z: T, svi: T) -> T {
        (**self).dz(z, svi)
    }
}

/// A trait for fixed-step schemes that advance one history row.
pub trait Integrator<T: Scalar> {
    /// Computes the row following `row`.
    /// row: the most recent history row (the only one an integrator may read)
    /// dt: step size, added to `row.t` for the new row
    fn step(&mut self, model: &impl VirusModel<T>, row: RowView<'_, T>, dt: T) -> StateRow<T>;
}
