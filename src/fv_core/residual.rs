extern crate nalgebra as na;

use std::rc::Rc;

use crate::error::Result;
use crate::fv_core::geometry::Vector;
use crate::fv_core::mesh::{Face, FaceNeighbor, Mesh};
use crate::fv_core::reconstruction::SolutionReconstructor;
use crate::fv_core::riemann::RiemannSolver;
use crate::physics::GoverningEquations;

//TRAITS
/// One contribution to the cell residuals. Residuals hold the net inflow
/// integrated over the cell, so `dU/dt = residual / volume`.
pub trait ResidualCalculator {
    /// Runs after gradients are known and before ghost states are written.
    fn prepare(&self, _mesh: &mut Mesh) {}

    /// Adds this contribution to `mesh.fields` residuals; never zeroes them.
    fn calculate_residual(&self, mesh: &mut Mesh, time: f64) -> Result<()>;
}

//STRUCTS
pub struct ConvectionResidual {
    reconstructor: Box<dyn SolutionReconstructor>,
    riemann_solver: Box<dyn RiemannSolver>,
}

/// Gradient-based viscous fluxes. The face gradient is the average of the
/// two cell gradients with its component along the centroid line replaced
/// by the two-point difference.
pub struct DiffusionResidual {
    eqn: Rc<dyn GoverningEquations>,
}

/// Volumetric source terms of the governing equations.
pub struct SourceResidual {
    eqn: Rc<dyn GoverningEquations>,
}

//HELPER FUNCTIONS
// Left loses, right gains.
fn accumulate(mesh: &mut Mesh, face: usize, flux: &na::DVector<f64>) {
    let (left, right, area) = {
        let f = &mesh.grid.faces[face];
        (f.left, f.right, f.area())
    };
    for (r, fl) in mesh.fields.residual_mut(left).iter_mut().zip(flux.iter()) {
        *r -= fl * area;
    }
    if let FaceNeighbor::Cell(right) = right {
        for (r, fl) in mesh.fields.residual_mut(right).iter_mut().zip(flux.iter()) {
            *r += fl * area;
        }
    }
}

//IMPLEMENTATION
impl ConvectionResidual {
    pub fn new(
        reconstructor: Box<dyn SolutionReconstructor>,
        riemann_solver: Box<dyn RiemannSolver>,
    ) -> Self {
        ConvectionResidual {
            reconstructor,
            riemann_solver,
        }
    }

    /// Numerical flux through `face` from the reconstructed states on both
    /// sides, or the boundary condition's own flux where it provides one.
    pub fn face_flux(&self, mesh: &Mesh, face: &Face, time: f64) -> Result<na::DVector<f64>> {
        let at = face.centroid();
        let ul = self
            .reconstructor
            .conservative_vars(mesh, face.left, at);
        match face.right {
            FaceNeighbor::Cell(right) => {
                let at_right = at - face.right_offset;
                let ur = self.reconstructor.conservative_vars(mesh, right, &at_right);
                self.riemann_solver.flux(&ul, &ur, face.unit_normal())
            }
            FaceNeighbor::Ghost { boundary, slot } => {
                let condition = &mesh.boundaries[boundary].condition;
                match condition.convective_flux(face, &ul, time)? {
                    Some(flux) => Ok(flux),
                    None => {
                        let ur = mesh.fields.ghost(slot);
                        self.riemann_solver.flux(&ul, ur, face.unit_normal())
                    }
                }
            }
        }
    }
}

impl ResidualCalculator for ConvectionResidual {
    fn prepare(&self, mesh: &mut Mesh) {
        self.reconstructor.reconstruct(mesh);
    }

    fn calculate_residual(&self, mesh: &mut Mesh, time: f64) -> Result<()> {
        for f in 0..mesh.grid.faces.len() {
            let flux = self.face_flux(mesh, &mesh.grid.faces[f], time)?;
            accumulate(mesh, f, &flux);
        }
        Ok(())
    }
}

impl DiffusionResidual {
    pub fn new(eqn: Rc<dyn GoverningEquations>) -> Self {
        DiffusionResidual { eqn }
    }

    fn face_flux(&self, mesh: &Mesh, face: &Face) -> na::DVector<f64> {
        let fields = &mesh.fields;
        let ul = fields.u(face.left);
        let ur = mesh.right_state(face);
        let gl = fields.gradient(face.left);
        let gr = match face.right {
            FaceNeighbor::Cell(r) => fields.gradient(r),
            FaceNeighbor::Ghost { .. } => gl,
        };

        let d = face.right_centroid(&mesh.grid) - mesh.grid[face.left].centroid();
        let d2 = d.norm_squared();
        let u_face: Vec<f64> = ul.iter().zip(ur).map(|(l, r)| 0.5 * (l + r)).collect();
        let grad_face: Vec<Vector> = (0..ul.len())
            .map(|v| {
                let avg = 0.5 * (gl[v] + gr[v]);
                avg + d * ((ur[v] - ul[v] - avg.dot(&d)) / d2)
            })
            .collect();
        self.eqn
            .diffusion_flux(&u_face, &grad_face, face.unit_normal())
    }
}

impl ResidualCalculator for DiffusionResidual {
    fn calculate_residual(&self, mesh: &mut Mesh, _time: f64) -> Result<()> {
        for f in 0..mesh.grid.faces.len() {
            let flux = self.face_flux(mesh, &mesh.grid.faces[f]);
            accumulate(mesh, f, &flux);
        }
        Ok(())
    }
}

impl SourceResidual {
    pub fn new(eqn: Rc<dyn GoverningEquations>) -> Self {
        SourceResidual { eqn }
    }
}

impl ResidualCalculator for SourceResidual {
    fn calculate_residual(&self, mesh: &mut Mesh, _time: f64) -> Result<()> {
        let Mesh { grid, fields, .. } = mesh;
        for cell in grid.cells() {
            if let Some(source) = self.eqn.source(fields.u(cell.index)) {
                let volume = cell.volume();
                for (r, s) in fields.residual_mut(cell.index).iter_mut().zip(source.iter()) {
                    *r += s * volume;
                }
            }
        }
        Ok(())
    }
}
