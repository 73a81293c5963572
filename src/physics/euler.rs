extern crate nalgebra as na;

use crate::error::{Result, SolverError};
use crate::fv_core::geometry::Vector;
use crate::physics::{GoverningEquations, Limits};

/// Compressible inviscid flow of a calorically perfect gas.
///
/// Conserved variables: `[rho, rho*u, rho*v, rho*w, rho*E]`.
#[derive(Debug, Clone)]
pub struct EulerEquations {
    pub gamma: f64,
    pub gas_constant: f64,
    limits: [Limits; 5],
}

impl EulerEquations {
    pub fn new(gamma: f64, gas_constant: f64) -> Self {
        EulerEquations {
            gamma,
            gas_constant,
            limits: [
                Limits::NON_NEGATIVE,
                Limits::UNBOUNDED,
                Limits::UNBOUNDED,
                Limits::UNBOUNDED,
                Limits::NON_NEGATIVE,
            ],
        }
    }

    pub fn conservative(&self, rho: f64, velocity: &Vector, pressure: f64) -> [f64; 5] {
        let rho_e = pressure / (self.gamma - 1.0) + 0.5 * rho * velocity.norm_squared();
        [
            rho,
            rho * velocity.x,
            rho * velocity.y,
            rho * velocity.z,
            rho_e,
        ]
    }

    pub fn velocity(&self, u: &[f64]) -> Vector {
        Vector::new(u[1], u[2], u[3]) / u[0]
    }

    pub fn pressure(&self, u: &[f64]) -> f64 {
        let m2 = u[1] * u[1] + u[2] * u[2] + u[3] * u[3];
        (self.gamma - 1.0) * (u[4] - 0.5 * m2 / u[0])
    }

    pub fn sound_speed(&self, u: &[f64]) -> f64 {
        (self.gamma * self.pressure(u) / u[0]).sqrt()
    }

    pub fn temperature(&self, u: &[f64]) -> f64 {
        self.pressure(u) / (u[0] * self.gas_constant)
    }
}

impl GoverningEquations for EulerEquations {
    fn description(&self) -> &'static str {
        "Euler equations"
    }

    fn num_vars(&self) -> usize {
        5
    }

    fn var_names(&self) -> Vec<&'static str> {
        vec!["rho", "rho_u", "rho_v", "rho_w", "rho_e"]
    }

    fn physical_limits(&self) -> &[Limits] {
        &self.limits
    }

    fn convective_flux(&self, u: &[f64], n: &Vector) -> na::DVector<f64> {
        let p = self.pressure(u);
        let vn = self.velocity(u).dot(n);
        na::DVector::from_vec(vec![
            u[0] * vn,
            u[1] * vn + p * n.x,
            u[2] * vn + p * n.y,
            u[3] * vn + p * n.z,
            (u[4] + p) * vn,
        ])
    }

    fn sorted_eigenvalues(&self, u: &[f64], n: &Vector) -> Vec<f64> {
        let vn = self.velocity(u).dot(n);
        let a = self.sound_speed(u);
        vec![vn - a, vn, vn, vn, vn + a]
    }

    fn check_physical(&self, u: &[f64]) -> Result<()> {
        if !(u[0] > 0.0) {
            return Err(SolverError::NonPhysicalState {
                what: "density",
                value: u[0],
            });
        }
        let p = self.pressure(u);
        if !(p > 0.0) {
            return Err(SolverError::NonPhysicalState {
                what: "pressure",
                value: p,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn primitive_round_trip() {
        let eqn = EulerEquations::new(1.4, 287.0);
        let v = Vector::new(700.0, -20.0, 3.0);
        let u = eqn.conservative(1.2, &v, 101325.0);
        assert_relative_eq!(eqn.pressure(&u), 101325.0, max_relative = 1e-12);
        assert_relative_eq!(eqn.velocity(&u), v, max_relative = 1e-12);
        assert_relative_eq!(
            eqn.temperature(&u),
            101325.0 / (1.2 * 287.0),
            max_relative = 1e-12
        );
    }

    #[test]
    fn flux_of_fluid_at_rest_is_pressure_only() {
        let eqn = EulerEquations::new(1.4, 287.0);
        let u = eqn.conservative(1.0, &Vector::zeros(), 2.5);
        let n = Vector::new(0.6, 0.8, 0.0);
        let f = eqn.convective_flux(&u, &n);
        assert_relative_eq!(f[0], 0.0);
        assert_relative_eq!(f[1], 1.5, epsilon = 1e-14);
        assert_relative_eq!(f[2], 2.0, epsilon = 1e-14);
        assert_relative_eq!(f[4], 0.0);
        let ev = eqn.sorted_eigenvalues(&u, &n);
        assert_relative_eq!(ev[4], (1.4f64 * 2.5).sqrt(), epsilon = 1e-14);
        assert_relative_eq!(eqn.max_abs_eigenvalue(&u, &n), ev[4]);
    }

    #[test]
    fn negative_pressure_is_rejected() {
        let eqn = EulerEquations::new(1.4, 287.0);
        let u = [1.0, 10.0, 0.0, 0.0, 1.0];
        assert!(matches!(
            eqn.check_physical(&u),
            Err(SolverError::NonPhysicalState { what: "pressure", .. })
        ));
        assert!(eqn.check_physical(&[-1.0, 0.0, 0.0, 0.0, 1.0]).is_err());
    }
}
