use std::rc::Rc;

use crate::fv_core::geometry::{Point, Vector};
use crate::fv_core::mesh::Mesh;
use crate::fv_core::neighbors::Stencil;
use crate::physics::GoverningEquations;

//TRAITS
pub trait SolutionReconstructor {
    /// Fills the per-cell reconstruction coefficients from the current
    /// cell averages and gradients.
    fn reconstruct(&self, mesh: &mut Mesh);

    /// State of `cell` extrapolated to `at` with the stored coefficients.
    fn conservative_vars(&self, mesh: &Mesh, cell: usize, at: &Point) -> Vec<f64> {
        let r = at - mesh.grid[cell].centroid();
        mesh.fields
            .u(cell)
            .iter()
            .zip(mesh.fields.coeffs(cell))
            .map(|(u, c)| u + c.dot(&r))
            .collect()
    }
}

/// Limiter function `phi(dp, dm)` where `dm` is the unlimited change from
/// the cell average and `dp` the admissible change in the same direction.
pub trait Limiter {
    fn limit(&self, dp: f64, dm: f64) -> f64;
}

//STRUCTS
// Limiters
pub struct VenkatakrishnanLimiter;
pub struct BarthJespersenLimiter;

/// First order: the face state is the cell average.
pub struct PiecewiseConstant;

/// Gradient scaled per cell and variable by the most restrictive limiter
/// value over the cell's nodes, against the extrema of the cell and its
/// stencil clipped to the physical limits.
pub struct VkLimiterReconstructor<L: Limiter> {
    pub limiter: L,
    eqn: Rc<dyn GoverningEquations>,
    stencil: Stencil,
}

//IMPLEMENTATION
impl Limiter for VenkatakrishnanLimiter {
    fn limit(&self, dp: f64, dm: f64) -> f64 {
        let y = dp / dm;
        (y * y + 2.0 * y) / (y * y + y + 2.0)
    }
}

impl Limiter for BarthJespersenLimiter {
    fn limit(&self, dp: f64, dm: f64) -> f64 {
        (dp / dm).min(1.0)
    }
}

impl SolutionReconstructor for PiecewiseConstant {
    fn reconstruct(&self, mesh: &mut Mesh) {
        for i in 0..mesh.num_cells() {
            mesh.fields
                .coeffs_mut(i)
                .iter_mut()
                .for_each(|c| *c = Vector::zeros());
        }
    }

    fn conservative_vars(&self, mesh: &Mesh, cell: usize, _at: &Point) -> Vec<f64> {
        mesh.fields.u(cell).to_vec()
    }
}

impl VkLimiterReconstructor<VenkatakrishnanLimiter> {
    pub fn new(eqn: Rc<dyn GoverningEquations>, stencil: Stencil) -> Self {
        VkLimiterReconstructor {
            limiter: VenkatakrishnanLimiter,
            eqn,
            stencil,
        }
    }
}

impl<L: Limiter> VkLimiterReconstructor<L> {
    pub fn with_limiter(limiter: L, eqn: Rc<dyn GoverningEquations>, stencil: Stencil) -> Self {
        VkLimiterReconstructor {
            limiter,
            eqn,
            stencil,
        }
    }

    fn node_phi(&self, du_min: f64, du_max: f64, diff: f64) -> f64 {
        if diff > 0.0 {
            self.limiter.limit(du_max, diff)
        } else if diff < 0.0 {
            self.limiter.limit(du_min, diff)
        } else {
            1.0
        }
    }
}

impl<L: Limiter> SolutionReconstructor for VkLimiterReconstructor<L> {
    fn reconstruct(&self, mesh: &mut Mesh) {
        let Mesh { grid, fields, .. } = mesh;
        let limits = self.eqn.physical_limits();
        let num_vars = fields.num_vars();
        let mut limited = vec![Vector::zeros(); num_vars];

        for cell in grid.cells() {
            let i = cell.index;
            let centroid = cell.centroid();
            for var in 0..num_vars {
                let ui = fields.u(i)[var];
                let (mut u_max, mut u_min) = (ui, ui);
                for n in &self.stencil[i] {
                    let value = fields.u(n.cell)[var];
                    u_max = u_max.max(value);
                    u_min = u_min.min(value);
                }
                let du_max = limits[var].clip(u_max) - ui;
                let du_min = limits[var].clip(u_min) - ui;

                let gradient = fields.gradient(i)[var];
                let phi = cell
                    .shape
                    .points()
                    .iter()
                    .map(|p| self.node_phi(du_min, du_max, gradient.dot(&(p - centroid))))
                    .fold(f64::INFINITY, f64::min);
                limited[var] = gradient * phi;
            }
            fields.coeffs_mut(i).copy_from_slice(&limited);
        }
    }
}
