extern crate nalgebra as na;

use crate::fv_core::geometry::Vector;
use crate::fv_core::mesh::Mesh;
use crate::physics::{velocity_at, GoverningEquations, Limits};

/// Advection of a volume fraction `C` by a prescribed velocity `V` plus an
/// interface-compression velocity `Vr`.
///
/// Variables: `[C, u, v, w, Vrx, Vry, Vrz]`. Only `C` is transported; the
/// velocities are carried as data and have zero flux.
#[derive(Debug, Clone)]
pub struct VolumeFractionAdvection {
    limits: [Limits; 7],
}

impl VolumeFractionAdvection {
    pub fn new() -> Self {
        let mut limits = [Limits::UNBOUNDED; 7];
        limits[0] = Limits::new(0.0, 1.0);
        VolumeFractionAdvection { limits }
    }

    fn transport_velocity(u: &[f64]) -> Vector {
        velocity_at(u, 1) + velocity_at(u, 4)
    }
}

impl Default for VolumeFractionAdvection {
    fn default() -> Self {
        Self::new()
    }
}

impl GoverningEquations for VolumeFractionAdvection {
    fn description(&self) -> &'static str {
        "Volume fraction advection"
    }

    fn num_vars(&self) -> usize {
        7
    }

    fn var_names(&self) -> Vec<&'static str> {
        vec!["C", "u", "v", "w", "Vrx", "Vry", "Vrz"]
    }

    fn physical_limits(&self) -> &[Limits] {
        &self.limits
    }

    fn convective_flux(&self, u: &[f64], n: &Vector) -> na::DVector<f64> {
        let mut flux = na::DVector::zeros(7);
        flux[0] = u[0] * Self::transport_velocity(u).dot(n);
        flux
    }

    fn sorted_eigenvalues(&self, u: &[f64], n: &Vector) -> Vec<f64> {
        let mut ev = vec![0.0; 7];
        ev[0] = Self::transport_velocity(u).dot(n);
        ev.sort_by(|a, b| a.total_cmp(b));
        ev
    }

    fn has_real_time_derivative(&self, var: usize) -> bool {
        var == 0
    }
}

/// Recomputes the interface-compression velocity of every cell from the
/// current volume-fraction gradient:
/// `Vr = (1 - C) * Ca * |V| * gradC/|gradC|` with `Ca = 0.5 * sqrt(|n_C . V/|V||)`.
pub fn update_compression_velocity(mesh: &mut Mesh) {
    const SMALL: f64 = 1e-6;
    let fields = &mut mesh.fields;
    for i in 0..fields.num_cells() {
        let grad_c = fields.gradient(i)[0];
        let u = fields.u(i);
        let c = u[0];
        let v = velocity_at(u, 1);

        let mag_grad = grad_c.norm();
        let unit_grad = if mag_grad > SMALL {
            grad_c / mag_grad
        } else {
            Vector::zeros()
        };
        let mag_v = v.norm();
        let unit_v = if mag_v > SMALL { v / mag_v } else { Vector::zeros() };

        let ca = 0.5 * unit_grad.dot(&unit_v).abs().sqrt();
        let vr = unit_grad * (ca * mag_v) * (1.0 - c);

        let u = fields.u_mut(i);
        u[4] = vr.x;
        u[5] = vr.y;
        u[6] = vr.z;
    }
}
