use std::rc::Rc;

use crate::fv_core::mesh::{FaceNeighbor, Mesh};
use crate::physics::GoverningEquations;

//TRAITS
/// Fills `mesh.fields` time steps for the given Courant number.
pub trait TimeStep {
    fn update_time_steps(&self, mesh: &mut Mesh, courant_number: f64);
}

//STRUCTS
/// Per-cell stable step from the convective and diffusive spectral radii
/// summed over the cell faces.
pub struct LocalTimeStep {
    eqn: Rc<dyn GoverningEquations>,
}

/// Smallest local step, applied everywhere.
pub struct GlobalTimeStep {
    local: LocalTimeStep,
}

//IMPLEMENTATION
impl LocalTimeStep {
    pub fn new(eqn: Rc<dyn GoverningEquations>) -> Self {
        LocalTimeStep { eqn }
    }
}

impl TimeStep for LocalTimeStep {
    fn update_time_steps(&self, mesh: &mut Mesh, courant_number: f64) {
        let mut radii = vec![0.0; mesh.num_cells()];
        for face in mesh.grid.faces() {
            let n = face.unit_normal();
            let ul = mesh.fields.u(face.left);
            let ur = mesh.right_state(face);
            let lambda = self
                .eqn
                .max_abs_eigenvalue(ul, n)
                .max(self.eqn.max_abs_eigenvalue(ur, n));
            let nu = self
                .eqn
                .max_diffusivity(ul)
                .max(self.eqn.max_diffusivity(ur));
            let area = face.area();

            let mut add = |cell: usize| {
                let volume = mesh.grid[cell].volume();
                radii[cell] += lambda * area + 2.0 * nu * area * area / volume;
            };
            add(face.left);
            if let FaceNeighbor::Cell(right) = face.right {
                add(right);
            }
        }

        for (i, radius) in radii.into_iter().enumerate() {
            let volume = mesh.grid[i].volume();
            mesh.fields
                .set_dt(i, courant_number * volume / radius.max(f64::MIN_POSITIVE));
        }
    }
}

impl GlobalTimeStep {
    pub fn new(eqn: Rc<dyn GoverningEquations>) -> Self {
        GlobalTimeStep {
            local: LocalTimeStep::new(eqn),
        }
    }
}

impl TimeStep for GlobalTimeStep {
    fn update_time_steps(&self, mesh: &mut Mesh, courant_number: f64) {
        self.local.update_time_steps(mesh, courant_number);
        let n = mesh.num_cells();
        let dt = (0..n)
            .map(|i| mesh.fields.dt(i))
            .fold(f64::INFINITY, f64::min);
        for i in 0..n {
            mesh.fields.set_dt(i, dt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fv_core::geometry::Vector;
    use crate::fv_core::mesh_builder::Structured2D;
    use crate::physics::ScalarAdvection;
    use approx::assert_relative_eq;

    #[test]
    fn advective_step_on_a_uniform_grid() {
        let eqn: Rc<dyn GoverningEquations> =
            Rc::new(ScalarAdvection::new(Vector::new(2.0, 0.0, 0.0), 0.0));
        let mut mesh = Structured2D::cartesian((0.0, 0.0), (1.0, 1.0), (4, 4))
            .periodic(true, true)
            .build(1, vec![])
            .unwrap();
        LocalTimeStep::new(eqn).update_time_steps(&mut mesh, 0.8);
        // two faces of length 0.25 see |V.n| = 2; area 1/16
        let expected = 0.8 * 0.0625 / (2.0 * 2.0 * 0.25);
        for i in 0..mesh.num_cells() {
            assert_relative_eq!(mesh.fields.dt(i), expected);
        }
    }

    #[test]
    fn global_step_is_the_smallest_local_step() {
        let eqn: Rc<dyn GoverningEquations> =
            Rc::new(ScalarAdvection::new(Vector::new(1.0, 1.0, 0.0), 0.1));
        let mut structured = Structured2D::cartesian((0.0, 0.0), (3.0, 3.0), (3, 3));
        structured.nodes[1][1].x += 0.3;
        let mut mesh = structured.periodic(true, true).build(1, vec![]).unwrap();

        LocalTimeStep::new(eqn.clone()).update_time_steps(&mut mesh, 1.0);
        let local: Vec<f64> = (0..9).map(|i| mesh.fields.dt(i)).collect();
        let min = local.iter().cloned().fold(f64::INFINITY, f64::min);
        assert!(local.iter().any(|&dt| dt > min));

        GlobalTimeStep::new(eqn).update_time_steps(&mut mesh, 1.0);
        for i in 0..9 {
            assert_eq!(mesh.fields.dt(i), min);
        }
    }
}
