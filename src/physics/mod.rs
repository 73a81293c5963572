extern crate nalgebra as na;

pub mod artificial_compressibility;
pub mod euler;
pub mod scalar_advection;
pub mod volume_fraction;

pub use artificial_compressibility::{ArtificialCompressibility, ArtificialCompressibilityVof};
pub use euler::EulerEquations;
pub use scalar_advection::ScalarAdvection;
pub use volume_fraction::VolumeFractionAdvection;

use crate::error::Result;
use crate::fv_core::geometry::Vector;

/// Admissible range of one conserved variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limits {
    pub min: f64,
    pub max: f64,
}

impl Limits {
    pub const UNBOUNDED: Limits = Limits {
        min: f64::NEG_INFINITY,
        max: f64::INFINITY,
    };

    pub const NON_NEGATIVE: Limits = Limits {
        min: 0.0,
        max: f64::INFINITY,
    };

    pub fn new(min: f64, max: f64) -> Self {
        Limits { min, max }
    }

    pub fn clip(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }
}

/// Physics of a system of conservation laws. Implementations hold parameters
/// only; the solver never mutates them.
///
/// Flux functions return the flux leaving the cell on the side opposite to
/// `n`, i.e. a positive component transports the quantity along `n`. The
/// diffusive flux follows the same convention.
pub trait GoverningEquations {
    fn description(&self) -> &'static str;

    fn num_vars(&self) -> usize;

    fn var_names(&self) -> Vec<&'static str>;

    fn physical_limits(&self) -> &[Limits];

    fn convective_flux(&self, u: &[f64], n: &Vector) -> na::DVector<f64>;

    /// Eigenvalues of the convective flux Jacobian along `n`, ascending.
    fn sorted_eigenvalues(&self, u: &[f64], n: &Vector) -> Vec<f64>;

    fn max_abs_eigenvalue(&self, u: &[f64], n: &Vector) -> f64 {
        self.sorted_eigenvalues(u, n)
            .iter()
            .fold(0.0, |max, &v| max.max(v.abs()))
    }

    fn diffusion_flux(&self, _u: &[f64], _grad_u: &[Vector], _n: &Vector) -> na::DVector<f64> {
        na::DVector::zeros(self.num_vars())
    }

    /// Largest diffusion coefficient, used for the viscous time-step limit.
    fn max_diffusivity(&self, _u: &[f64]) -> f64 {
        0.0
    }

    /// Volumetric source per unit volume, if the model has one.
    fn source(&self, _u: &[f64]) -> Option<na::DVector<f64>> {
        None
    }

    /// Whether `var` carries a derivative in real time. Dual time stepping
    /// adds the backward difference only to these variables; the others are
    /// constraints (artificial compressibility pressure) or are recomputed
    /// between iterations.
    fn has_real_time_derivative(&self, _var: usize) -> bool {
        true
    }

    /// Rejects states that the model cannot evaluate (negative density or
    /// pressure and the like).
    fn check_physical(&self, _u: &[f64]) -> Result<()> {
        Ok(())
    }
}

/// Velocity stored at `u[offset..offset + 3]`.
pub(crate) fn velocity_at(u: &[f64], offset: usize) -> Vector {
    Vector::new(u[offset], u[offset + 1], u[offset + 2])
}
