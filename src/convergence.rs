use serde::{Deserialize, Serialize};

use crate::error::{ensure_len, Result};
use crate::fv_core::mesh::Mesh;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Norm {
    #[default]
    One,
    Two,
    Infinity,
}

/// Per-variable tolerances; converged once every variable is below its own.
#[derive(Debug, Clone)]
pub struct Convergence {
    tolerances: Vec<f64>,
}

//HELPER FUNCTIONS
/// Norm of the cell residuals per variable: sum of magnitudes, root of the
/// sum of squares, or largest magnitude.
pub fn total_residual(mesh: &Mesh, norm: Norm) -> Vec<f64> {
    let mut total = vec![0.0; mesh.num_vars()];
    for cell in mesh.grid.cells() {
        for (t, r) in total.iter_mut().zip(mesh.fields.residual(cell.index)) {
            let r = r.abs();
            match norm {
                Norm::One => *t += r,
                Norm::Two => *t += r * r,
                Norm::Infinity => *t = f64::max(*t, r),
            }
        }
    }
    if norm == Norm::Two {
        total.iter_mut().for_each(|t| *t = t.sqrt());
    }
    total
}

//IMPLEMENTATION
impl Convergence {
    pub fn new(tolerances: Vec<f64>) -> Self {
        Convergence { tolerances }
    }

    /// Same tolerance for all `num_vars` variables.
    pub fn uniform(num_vars: usize, tolerance: f64) -> Self {
        Convergence::new(vec![tolerance; num_vars])
    }

    pub fn tolerances(&self) -> &[f64] {
        &self.tolerances
    }

    pub fn has_converged(&self, total_residual: &[f64]) -> Result<bool> {
        ensure_len("total residual", self.tolerances.len(), total_residual.len())?;
        Ok(total_residual
            .iter()
            .zip(&self.tolerances)
            .all(|(r, tol)| r < tol))
    }
}
