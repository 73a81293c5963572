extern crate nalgebra as na;

use std::rc::Rc;

use crate::error::{Result, SolverError};
use crate::fv_core::geometry::Vector;
use crate::physics::{velocity_at, ArtificialCompressibilityVof, EulerEquations, GoverningEquations};

//TRAITS
/// Numerical flux between a left and a right state across a face with unit
/// normal `n` pointing from left to right.
pub trait RiemannSolver {
    fn flux(&self, ul: &[f64], ur: &[f64], n: &Vector) -> Result<na::DVector<f64>>;
}

//STRUCTS
pub struct RusanovRiemannSolver {
    eqn: Rc<dyn GoverningEquations>,
}

pub struct HllRiemannSolver {
    eqn: Rc<dyn GoverningEquations>,
}

/// Three-wave solver for the Euler equations.
pub struct HllcRiemannSolver {
    eqn: Rc<EulerEquations>,
}

/// Three-wave solver for two-phase artificial compressibility: the pressure
/// and normal velocity come from the HLL average, the contact carries the
/// tangential velocity and the volume fraction.
pub struct HllcVofRiemannSolver {
    eqn: Rc<ArtificialCompressibilityVof>,
}

//HELPER FUNCTIONS
/// Orthonormal pair spanning the plane orthogonal to the unit vector `n`.
pub fn unit_tangents(n: &Vector) -> (Vector, Vector) {
    let a = n.abs();
    let axis = if a.x <= a.y && a.x <= a.z {
        Vector::x()
    } else if a.y <= a.z {
        Vector::y()
    } else {
        Vector::z()
    };
    let t0 = n.cross(&axis).normalize();
    let t1 = n.cross(&t0);
    (t0, t1)
}

fn check_states(eqn: &dyn GoverningEquations, ul: &[f64], ur: &[f64]) -> Result<()> {
    eqn.check_physical(ul)?;
    eqn.check_physical(ur)
}

fn hll_combination(
    ul: &[f64],
    ur: &[f64],
    fl: &na::DVector<f64>,
    fr: &na::DVector<f64>,
    sl: f64,
    sr: f64,
) -> na::DVector<f64> {
    let dul = na::DVector::from_iterator(ul.len(), ur.iter().zip(ul).map(|(r, l)| r - l));
    (fl * sr - fr * sl + dul * (sl * sr)) / (sr - sl)
}

// Velocity at `offset` replaced by its components along (n, t0, t1).
fn rotate(u: &[f64], offset: usize, frame: &[Vector; 3]) -> Vec<f64> {
    let v = velocity_at(u, offset);
    let mut r = u.to_vec();
    for (k, axis) in frame.iter().enumerate() {
        r[offset + k] = v.dot(axis);
    }
    r
}

fn rotate_back(f: &mut na::DVector<f64>, offset: usize, frame: &[Vector; 3]) {
    let v = frame[0] * f[offset] + frame[1] * f[offset + 1] + frame[2] * f[offset + 2];
    f[offset] = v.x;
    f[offset + 1] = v.y;
    f[offset + 2] = v.z;
}

//IMPLEMENTATION
impl RusanovRiemannSolver {
    pub fn new(eqn: Rc<dyn GoverningEquations>) -> Self {
        RusanovRiemannSolver { eqn }
    }
}

impl RiemannSolver for RusanovRiemannSolver {
    fn flux(&self, ul: &[f64], ur: &[f64], n: &Vector) -> Result<na::DVector<f64>> {
        check_states(self.eqn.as_ref(), ul, ur)?;
        let fl = self.eqn.convective_flux(ul, n);
        let fr = self.eqn.convective_flux(ur, n);
        let s = self
            .eqn
            .max_abs_eigenvalue(ul, n)
            .max(self.eqn.max_abs_eigenvalue(ur, n));
        Ok(na::DVector::from_iterator(
            ul.len(),
            (0..ul.len()).map(|k| 0.5 * (fl[k] + fr[k]) - 0.5 * s * (ur[k] - ul[k])),
        ))
    }
}

impl HllRiemannSolver {
    pub fn new(eqn: Rc<dyn GoverningEquations>) -> Self {
        HllRiemannSolver { eqn }
    }
}

impl RiemannSolver for HllRiemannSolver {
    fn flux(&self, ul: &[f64], ur: &[f64], n: &Vector) -> Result<na::DVector<f64>> {
        check_states(self.eqn.as_ref(), ul, ur)?;
        let el = self.eqn.sorted_eigenvalues(ul, n);
        let er = self.eqn.sorted_eigenvalues(ur, n);
        let sl = el[0].min(er[0]);
        let sr = el[el.len() - 1].max(er[er.len() - 1]);

        let fl = self.eqn.convective_flux(ul, n);
        if sl >= 0.0 {
            return Ok(fl);
        }
        let fr = self.eqn.convective_flux(ur, n);
        if sr <= 0.0 {
            return Ok(fr);
        }
        Ok(hll_combination(ul, ur, &fl, &fr, sl, sr))
    }
}

impl HllcRiemannSolver {
    pub fn new(eqn: Rc<EulerEquations>) -> Self {
        HllcRiemannSolver { eqn }
    }

    fn star_state(&self, u: &[f64], n: &Vector, s: f64, s_star: f64) -> [f64; 5] {
        let rho = u[0];
        let v = self.eqn.velocity(u);
        let un = v.dot(n);
        let p = self.eqn.pressure(u);
        let factor = rho * (s - un) / (s - s_star);
        let v_star = v + n * (s_star - un);
        let e_star = u[4] / rho + (s_star - un) * (s_star + p / (rho * (s - un)));
        [
            factor,
            factor * v_star.x,
            factor * v_star.y,
            factor * v_star.z,
            factor * e_star,
        ]
    }
}

impl RiemannSolver for HllcRiemannSolver {
    fn flux(&self, ul: &[f64], ur: &[f64], n: &Vector) -> Result<na::DVector<f64>> {
        let eqn = self.eqn.as_ref();
        check_states(eqn, ul, ur)?;
        let (rho_l, rho_r) = (ul[0], ur[0]);
        let (un_l, un_r) = (eqn.velocity(ul).dot(n), eqn.velocity(ur).dot(n));
        let (p_l, p_r) = (eqn.pressure(ul), eqn.pressure(ur));
        let (a_l, a_r) = (eqn.sound_speed(ul), eqn.sound_speed(ur));

        let sl = (un_l - a_l).min(un_r - a_r);
        let sr = (un_l + a_l).max(un_r + a_r);

        let fl = eqn.convective_flux(ul, n);
        if sl >= 0.0 {
            return Ok(fl);
        }
        let fr = eqn.convective_flux(ur, n);
        if sr <= 0.0 {
            return Ok(fr);
        }

        let s_star = (p_r - p_l + rho_l * un_l * (sl - un_l) - rho_r * un_r * (sr - un_r))
            / (rho_l * (sl - un_l) - rho_r * (sr - un_r));

        let (u, f, s) = if s_star >= 0.0 { (ul, fl, sl) } else { (ur, fr, sr) };
        let star = self.star_state(u, n, s, s_star);
        if !(star[0] > 0.0) {
            return Err(SolverError::NonPhysicalState {
                what: "star density",
                value: star[0],
            });
        }
        Ok(na::DVector::from_iterator(
            5,
            (0..5).map(|k| f[k] + s * (star[k] - u[k])),
        ))
    }
}

impl HllcVofRiemannSolver {
    pub fn new(eqn: Rc<ArtificialCompressibilityVof>) -> Self {
        HllcVofRiemannSolver { eqn }
    }
}

impl RiemannSolver for HllcVofRiemannSolver {
    fn flux(&self, ul: &[f64], ur: &[f64], n: &Vector) -> Result<na::DVector<f64>> {
        let eqn = self.eqn.as_ref();
        check_states(eqn, ul, ur)?;
        let (t0, t1) = unit_tangents(n);
        let frame = [*n, t0, t1];
        let x = Vector::x();

        // Everything below works in the (n, t0, t1) frame with normal x.
        let ql = rotate(ul, 1, &frame);
        let qr = rotate(ur, 1, &frame);
        let el = eqn.sorted_eigenvalues(&ql, &x);
        let er = eqn.sorted_eigenvalues(&qr, &x);
        let sl = el[0].min(er[0]);
        let sr = el[4].max(er[4]);

        let fl = eqn.convective_flux(&ql, &x);
        let fr = eqn.convective_flux(&qr, &x);
        let mut flux = if sl >= 0.0 {
            fl
        } else if sr <= 0.0 {
            fr
        } else {
            // pressure and normal velocity from the HLL average; the rest
            // moves with the contact speed from the upwind side
            let s_star = (sr * qr[1] - sl * ql[1] - (fr[1] - fl[1])) / (sr - sl);
            let upwind = if s_star >= 0.0 { &ql } else { &qr };
            let mut flux = hll_combination(&ql, &qr, &fl, &fr, sl, sr);
            for k in 2..5 {
                flux[k] = s_star * upwind[k];
            }
            flux
        };
        rotate_back(&mut flux, 1, &frame);
        Ok(flux)
    }
}
