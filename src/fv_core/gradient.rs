extern crate nalgebra as na;

use crate::error::{Result, SolverError};
use crate::fv_core::geometry::Vector;
use crate::fv_core::mesh::{Grid, Mesh};
use crate::fv_core::neighbors::Stencil;
use crate::linalg::{invert_leading_block, LinalgError};

//traits
pub trait CellGradientCalculator {
    fn compute(&self, mesh: &mut Mesh) -> Result<()>;
}

//structs
/// Gradients stay zero; used with first-order reconstruction.
pub struct ZeroCellGradient;

/// Inverse-distance weighted least-squares gradient. The normal equations
/// only depend on geometry, so each cell stores the coefficients `c_k` with
/// `grad u_i = sum_k c_k (u_k - u_i)`.
pub struct LeastSquareCellGradient {
    coefficients: Vec<Vec<(usize, Vector)>>,
}

//implementation
impl CellGradientCalculator for ZeroCellGradient {
    fn compute(&self, mesh: &mut Mesh) -> Result<()> {
        for i in 0..mesh.num_cells() {
            mesh.fields
                .gradient_mut(i)
                .iter_mut()
                .for_each(|g| *g = Vector::zeros());
        }
        Ok(())
    }
}

impl LeastSquareCellGradient {
    pub fn new(grid: &Grid, stencil: &Stencil) -> Result<Self> {
        let dim = grid.dimension;
        let mut coefficients = Vec::with_capacity(grid.num_cells());
        for cell in grid.cells() {
            let xi = cell.centroid();
            let mut a = na::Matrix3::zeros();
            let mut weighted = Vec::with_capacity(stencil[cell.index].len());
            for n in &stencil[cell.index] {
                let dx = grid[n.cell].centroid() + n.offset - xi;
                let w = 1.0 / dx.norm();
                a += w * dx * dx.transpose();
                weighted.push((n.cell, w * dx));
            }
            let inv = invert_leading_block(&a, dim).map_err(|e| match e {
                LinalgError::Singular => SolverError::SingularStencil { cell: cell.index },
                other => SolverError::from(other),
            })?;
            coefficients.push(weighted.into_iter().map(|(k, wdx)| (k, inv * wdx)).collect());
        }
        Ok(LeastSquareCellGradient { coefficients })
    }
}

impl CellGradientCalculator for LeastSquareCellGradient {
    fn compute(&self, mesh: &mut Mesh) -> Result<()> {
        let fields = &mut mesh.fields;
        let num_vars = fields.num_vars();
        let mut grad = vec![Vector::zeros(); num_vars];
        for (i, coeffs) in self.coefficients.iter().enumerate() {
            grad.iter_mut().for_each(|g| *g = Vector::zeros());
            let ui = fields.u(i);
            for (k, c) in coeffs {
                let uk = fields.u(*k);
                for v in 0..num_vars {
                    grad[v] += c * (uk[v] - ui[v]);
                }
            }
            fields.gradient_mut(i).copy_from_slice(&grad);
        }
        Ok(())
    }
}
