extern crate nalgebra as na;

use crate::fv_core::geometry::Vector;
use crate::physics::{GoverningEquations, Limits};

/// Linear advection-diffusion of one scalar in a uniform velocity field.
#[derive(Debug, Clone)]
pub struct ScalarAdvection {
    pub velocity: Vector,
    pub diffusivity: f64,
    limits: [Limits; 1],
}

impl ScalarAdvection {
    pub fn new(velocity: Vector, diffusivity: f64) -> Self {
        ScalarAdvection {
            velocity,
            diffusivity,
            limits: [Limits::UNBOUNDED],
        }
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = [limits];
        self
    }
}

impl GoverningEquations for ScalarAdvection {
    fn description(&self) -> &'static str {
        "Scalar advection"
    }

    fn num_vars(&self) -> usize {
        1
    }

    fn var_names(&self) -> Vec<&'static str> {
        vec!["phi"]
    }

    fn physical_limits(&self) -> &[Limits] {
        &self.limits
    }

    fn convective_flux(&self, u: &[f64], n: &Vector) -> na::DVector<f64> {
        na::DVector::from_element(1, u[0] * self.velocity.dot(n))
    }

    fn sorted_eigenvalues(&self, _u: &[f64], n: &Vector) -> Vec<f64> {
        vec![self.velocity.dot(n)]
    }

    fn diffusion_flux(&self, _u: &[f64], grad_u: &[Vector], n: &Vector) -> na::DVector<f64> {
        na::DVector::from_element(1, -self.diffusivity * grad_u[0].dot(n))
    }

    fn max_diffusivity(&self, _u: &[f64]) -> f64 {
        self.diffusivity
    }
}
