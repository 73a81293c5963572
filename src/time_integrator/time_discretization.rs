use crate::fv_core::mesh::Mesh;
use crate::physics::GoverningEquations;

//TRAITS
/// Backward difference for the real-time derivative in dual time stepping,
/// written as `dU/dt ~ a0 * U + b`, with `b` built from stored time levels.
pub trait TimeDiscretization {
    fn real_time_step(&self) -> f64;

    fn a0(&self) -> f64;

    /// Constant part for the flat (cell-major) state index.
    fn b(&self, index: usize) -> f64;

    /// Variables without a real-time derivative get no `a0 * U + b` term.
    fn has_real_time_derivative(&self, var: usize) -> bool;

    /// Moves one real time level forward, `current` becoming level `n`.
    fn shift_solution(&mut self, current: &[f64]);

    /// Higher order scheme taking over the stored levels, if any.
    fn next_order(&self) -> Option<Box<dyn TimeDiscretization>>;
}

//STRUCTS
/// First-order backward difference `(U - U^n) / dt`.
pub struct TwoPointTimeDiscretization {
    dt: f64,
    unsteady: Vec<bool>,
    u_n: Vec<f64>,
    u_nm1: Vec<f64>,
}

/// Second-order backward difference `(3U - 4U^n + U^(n-1)) / (2 dt)`.
pub struct ThreePointTimeDiscretization {
    dt: f64,
    unsteady: Vec<bool>,
    u_n: Vec<f64>,
    u_nm1: Vec<f64>,
}

//HELPER FUNCTIONS
fn unsteady_vars(eqn: &dyn GoverningEquations) -> Vec<bool> {
    (0..eqn.num_vars())
        .map(|var| eqn.has_real_time_derivative(var))
        .collect()
}

//IMPLEMENTATION
impl TwoPointTimeDiscretization {
    pub fn new(mesh: &Mesh, eqn: &dyn GoverningEquations, real_dt: f64) -> Self {
        let u = mesh.fields.u_all().to_vec();
        TwoPointTimeDiscretization {
            dt: real_dt,
            unsteady: unsteady_vars(eqn),
            u_nm1: u.clone(),
            u_n: u,
        }
    }
}

impl TimeDiscretization for TwoPointTimeDiscretization {
    fn real_time_step(&self) -> f64 {
        self.dt
    }

    fn a0(&self) -> f64 {
        1.0 / self.dt
    }

    fn b(&self, index: usize) -> f64 {
        -self.u_n[index] / self.dt
    }

    fn has_real_time_derivative(&self, var: usize) -> bool {
        self.unsteady[var]
    }

    fn shift_solution(&mut self, current: &[f64]) {
        std::mem::swap(&mut self.u_nm1, &mut self.u_n);
        self.u_n.copy_from_slice(current);
    }

    fn next_order(&self) -> Option<Box<dyn TimeDiscretization>> {
        Some(Box::new(ThreePointTimeDiscretization::from(self)))
    }
}

impl ThreePointTimeDiscretization {
    /// Starts with both stored levels equal to the current state.
    pub fn new(mesh: &Mesh, eqn: &dyn GoverningEquations, real_dt: f64) -> Self {
        let u = mesh.fields.u_all().to_vec();
        ThreePointTimeDiscretization {
            dt: real_dt,
            unsteady: unsteady_vars(eqn),
            u_nm1: u.clone(),
            u_n: u,
        }
    }
}

impl From<&TwoPointTimeDiscretization> for ThreePointTimeDiscretization {
    fn from(two: &TwoPointTimeDiscretization) -> Self {
        ThreePointTimeDiscretization {
            dt: two.dt,
            unsteady: two.unsteady.clone(),
            u_n: two.u_n.clone(),
            u_nm1: two.u_nm1.clone(),
        }
    }
}

impl TimeDiscretization for ThreePointTimeDiscretization {
    fn real_time_step(&self) -> f64 {
        self.dt
    }

    fn a0(&self) -> f64 {
        1.5 / self.dt
    }

    fn b(&self, index: usize) -> f64 {
        (-4.0 * self.u_n[index] + self.u_nm1[index]) / (2.0 * self.dt)
    }

    fn has_real_time_derivative(&self, var: usize) -> bool {
        self.unsteady[var]
    }

    fn shift_solution(&mut self, current: &[f64]) {
        std::mem::swap(&mut self.u_nm1, &mut self.u_n);
        self.u_n.copy_from_slice(current);
    }

    fn next_order(&self) -> Option<Box<dyn TimeDiscretization>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fv_core::geometry::Vector;
    use crate::fv_core::mesh_builder::Structured2D;
    use crate::physics::{ScalarAdvection, VolumeFractionAdvection};
    use approx::assert_relative_eq;

    fn scalar() -> ScalarAdvection {
        ScalarAdvection::new(Vector::x(), 0.0)
    }

    fn mesh_with(values: [f64; 4]) -> Mesh {
        let mut mesh = Structured2D::cartesian((0.0, 0.0), (2.0, 2.0), (2, 2))
            .periodic(true, true)
            .build(1, vec![])
            .unwrap();
        mesh.fields.u_all_mut().copy_from_slice(&values);
        mesh
    }

    #[test]
    fn differences_of_a_linear_history_are_exact() {
        // U(t) = 1 + 3t sampled at t = 0, 0.1, 0.2
        let mesh = mesh_with([1.0; 4]);
        let mut two = TwoPointTimeDiscretization::new(&mesh, &scalar(), 0.1);
        let u1 = [1.3; 4];
        let derivative = two.a0() * u1[0] + two.b(0);
        assert_relative_eq!(derivative, 3.0, epsilon = 1e-12);

        two.shift_solution(&u1);
        let three = two.next_order().unwrap();
        let u2 = 1.6;
        assert_relative_eq!(three.a0() * u2 + three.b(1), 3.0, epsilon = 1e-12);
        assert!(three.next_order().is_none());
    }

    #[test]
    fn shifting_keeps_the_previous_level() {
        let mesh = mesh_with([2.0, 4.0, 2.0, 4.0]);
        let mut three = ThreePointTimeDiscretization::new(&mesh, &scalar(), 0.5);
        assert_relative_eq!(three.b(0), (-8.0 + 2.0) / 1.0);
        three.shift_solution(&[3.0, 5.0, 3.0, 5.0]);
        assert_relative_eq!(three.b(1), (-20.0 + 4.0) / 1.0);
        assert_eq!(three.real_time_step(), 0.5);
    }

    #[test]
    fn only_unsteady_variables_are_flagged() {
        let mesh = Structured2D::cartesian((0.0, 0.0), (2.0, 2.0), (2, 2))
            .periodic(true, true)
            .build(7, vec![])
            .unwrap();
        let two = TwoPointTimeDiscretization::new(&mesh, &VolumeFractionAdvection::new(), 0.1);
        assert!(two.has_real_time_derivative(0));
        assert!(!two.has_real_time_derivative(4));
        let three = two.next_order().unwrap();
        assert!(three.has_real_time_derivative(0));
        assert!((1..7).all(|var| !three.has_real_time_derivative(var)));
    }
}
