extern crate nalgebra as na;

use crate::error::{Result, SolverError};
use crate::fv_core::geometry::Vector;
use crate::physics::{velocity_at, GoverningEquations, Limits};

/// Incompressible single-phase flow with artificial compressibility `beta`.
///
/// Variables: `[p, u, v, w]` with kinematic pressure `p`.
#[derive(Debug, Clone)]
pub struct ArtificialCompressibility {
    pub beta: f64,
    pub viscosity: f64,
    pub gravity: Vector,
    limits: [Limits; 4],
}

impl ArtificialCompressibility {
    pub fn new(beta: f64, viscosity: f64, gravity: Vector) -> Self {
        ArtificialCompressibility {
            beta,
            viscosity,
            gravity,
            limits: [Limits::UNBOUNDED; 4],
        }
    }
}

impl GoverningEquations for ArtificialCompressibility {
    fn description(&self) -> &'static str {
        "Artificial compressibility equations"
    }

    fn num_vars(&self) -> usize {
        4
    }

    fn var_names(&self) -> Vec<&'static str> {
        vec!["p", "u", "v", "w"]
    }

    fn physical_limits(&self) -> &[Limits] {
        &self.limits
    }

    fn convective_flux(&self, u: &[f64], n: &Vector) -> na::DVector<f64> {
        let p = u[0];
        let v = velocity_at(u, 1);
        let vn = v.dot(n);
        na::DVector::from_vec(vec![
            self.beta * vn,
            v.x * vn + p * n.x,
            v.y * vn + p * n.y,
            v.z * vn + p * n.z,
        ])
    }

    fn sorted_eigenvalues(&self, u: &[f64], n: &Vector) -> Vec<f64> {
        let vn = velocity_at(u, 1).dot(n);
        let c = (vn * vn + self.beta).sqrt();
        vec![vn - c, vn, vn, vn + c]
    }

    fn diffusion_flux(&self, _u: &[f64], grad_u: &[Vector], n: &Vector) -> na::DVector<f64> {
        na::DVector::from_vec(vec![
            0.0,
            -self.viscosity * grad_u[1].dot(n),
            -self.viscosity * grad_u[2].dot(n),
            -self.viscosity * grad_u[3].dot(n),
        ])
    }

    fn max_diffusivity(&self, _u: &[f64]) -> f64 {
        self.viscosity
    }

    // pseudo-time only: the pressure enforces continuity
    fn has_real_time_derivative(&self, var: usize) -> bool {
        var != 0
    }

    fn source(&self, _u: &[f64]) -> Option<na::DVector<f64>> {
        Some(na::DVector::from_vec(vec![
            0.0,
            self.gravity.x,
            self.gravity.y,
            self.gravity.z,
        ]))
    }
}

/// Two immiscible incompressible phases tracked by the volume fraction `C`
/// of phase 1, with mixture density and viscosity interpolated linearly.
///
/// Variables: `[p, u, v, w, C]`.
#[derive(Debug, Clone)]
pub struct ArtificialCompressibilityVof {
    pub rho1: f64,
    pub mu1: f64,
    pub rho2: f64,
    pub mu2: f64,
    pub gravity: Vector,
    pub beta: f64,
    limits: [Limits; 5],
}

impl ArtificialCompressibilityVof {
    pub fn new(rho1: f64, mu1: f64, rho2: f64, mu2: f64, gravity: Vector, beta: f64) -> Self {
        ArtificialCompressibilityVof {
            rho1,
            mu1,
            rho2,
            mu2,
            gravity,
            beta,
            limits: [
                Limits::UNBOUNDED,
                Limits::UNBOUNDED,
                Limits::UNBOUNDED,
                Limits::UNBOUNDED,
                Limits::new(0.0, 1.0),
            ],
        }
    }

    pub fn density(&self, c: f64) -> f64 {
        c * self.rho1 + (1.0 - c) * self.rho2
    }

    pub fn viscosity(&self, c: f64) -> f64 {
        c * self.mu1 + (1.0 - c) * self.mu2
    }
}

impl GoverningEquations for ArtificialCompressibilityVof {
    fn description(&self) -> &'static str {
        "Artificial compressibility VOF equations"
    }

    fn num_vars(&self) -> usize {
        5
    }

    fn var_names(&self) -> Vec<&'static str> {
        vec!["p", "u", "v", "w", "C"]
    }

    fn physical_limits(&self) -> &[Limits] {
        &self.limits
    }

    fn convective_flux(&self, u: &[f64], n: &Vector) -> na::DVector<f64> {
        let p = u[0];
        let v = velocity_at(u, 1);
        let c = u[4];
        let vn = v.dot(n);
        let p_rho = p / self.density(c);
        na::DVector::from_vec(vec![
            self.beta * vn,
            v.x * vn + p_rho * n.x,
            v.y * vn + p_rho * n.y,
            v.z * vn + p_rho * n.z,
            c * vn,
        ])
    }

    fn sorted_eigenvalues(&self, u: &[f64], n: &Vector) -> Vec<f64> {
        let vn = velocity_at(u, 1).dot(n);
        let a = (vn * vn + self.beta / self.density(u[4])).sqrt();
        vec![vn - a, vn, vn, vn, vn + a]
    }

    fn diffusion_flux(&self, u: &[f64], grad_u: &[Vector], n: &Vector) -> na::DVector<f64> {
        let nu = self.viscosity(u[4]) / self.density(u[4]);
        na::DVector::from_vec(vec![
            0.0,
            -nu * grad_u[1].dot(n),
            -nu * grad_u[2].dot(n),
            -nu * grad_u[3].dot(n),
            0.0,
        ])
    }

    fn max_diffusivity(&self, u: &[f64]) -> f64 {
        self.viscosity(u[4]) / self.density(u[4])
    }

    fn has_real_time_derivative(&self, var: usize) -> bool {
        var != 0
    }

    fn source(&self, _u: &[f64]) -> Option<na::DVector<f64>> {
        Some(na::DVector::from_vec(vec![
            0.0,
            self.gravity.x,
            self.gravity.y,
            self.gravity.z,
            0.0,
        ]))
    }

    fn check_physical(&self, u: &[f64]) -> Result<()> {
        let rho = self.density(u[4]);
        if !(rho > 0.0) {
            return Err(SolverError::NonPhysicalState {
                what: "mixture density",
                value: rho,
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
    fn single_phase_flux_and_speeds() {
        let eqn = ArtificialCompressibility::new(5.6, 4e-4, Vector::new(-4.0, -9.2, 7.0));
        let u = [2.0, 1.0, -3.0, 0.5];
        let n = Vector::new(0.0, 1.0, 0.0);
        let f = eqn.convective_flux(&u, &n);
        assert_relative_eq!(f[0], 5.6 * -3.0);
        assert_relative_eq!(f[1], -3.0);
        assert_relative_eq!(f[2], 9.0 + 2.0);
        assert_relative_eq!(f[3], -1.5);

        let ev = eqn.sorted_eigenvalues(&u, &n);
        assert_relative_eq!(ev[0], -3.0 - (9.0f64 + 5.6).sqrt());
        assert_relative_eq!(ev[3], -3.0 + (9.0f64 + 5.6).sqrt());
        assert!(ev.windows(2).all(|w| w[0] <= w[1]));

        let s = eqn.source(&u).unwrap();
        assert_relative_eq!(s[2], -9.2);
    }

    #[test]
    fn viscous_flux_opposes_the_gradient() {
        let eqn = ArtificialCompressibility::new(1.0, 0.1, Vector::zeros());
        let grad = [
            Vector::zeros(),
            Vector::new(2.0, 0.0, 0.0),
            Vector::zeros(),
            Vector::zeros(),
        ];
        let f = eqn.diffusion_flux(&[0.0; 4], &grad, &Vector::x());
        assert_relative_eq!(f[1], -0.2);
        assert_relative_eq!(f[0], 0.0);
    }

    #[test]
    fn vof_mixture_properties() {
        let eqn = ArtificialCompressibilityVof::new(
            1000.0,
            1e-3,
            1.0,
            1e-5,
            Vector::new(0.0, -9.81, 0.0),
            10.0,
        );
        assert_relative_eq!(eqn.density(1.0), 1000.0);
        assert_relative_eq!(eqn.density(0.0), 1.0);
        assert_relative_eq!(eqn.density(0.5), 500.5);
        assert_relative_eq!(eqn.viscosity(0.25), 0.25e-3 + 0.75e-5);

        let u = [1000.0, 0.0, 2.0, 0.0, 1.0];
        let f = eqn.convective_flux(&u, &Vector::y());
        assert_relative_eq!(f[2], 4.0 + 1.0);
        assert_relative_eq!(f[4], 2.0);
        assert_eq!(eqn.physical_limits()[4], Limits::new(0.0, 1.0));

        assert!(eqn.check_physical(&[0.0, 0.0, 0.0, 0.0, -0.5]).is_err());
        assert!(eqn.check_physical(&u).is_ok());
    }
}
