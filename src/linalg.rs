extern crate nalgebra as na;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LinalgError {
    #[error("matrix must be square, got {rows}x{cols}")]
    NotSquare { rows: usize, cols: usize },

    #[error("matrix is singular")]
    Singular,
}

fn ensure_square(a: &na::DMatrix<f64>) -> Result<(), LinalgError> {
    if a.nrows() != a.ncols() {
        return Err(LinalgError::NotSquare {
            rows: a.nrows(),
            cols: a.ncols(),
        });
    }
    Ok(())
}

/// Determinant of a square matrix. A zero (or non-finite) determinant is
/// reported as `Singular` so callers cannot mistake it for a usable value.
pub fn determinant(a: &na::DMatrix<f64>) -> Result<f64, LinalgError> {
    ensure_square(a)?;
    let det = a.determinant();
    if det == 0.0 || !det.is_finite() {
        return Err(LinalgError::Singular);
    }
    Ok(det)
}

pub fn invert(a: &na::DMatrix<f64>) -> Result<na::DMatrix<f64>, LinalgError> {
    determinant(a)?;
    a.clone().try_inverse().ok_or(LinalgError::Singular)
}

/// Inverse of a 2x2 or 3x3 symmetric positive semi-definite matrix embedded
/// in a `Matrix3`. For `dim == 2` only the upper-left block is inverted and
/// the z row and column of the result stay zero. A determinant that is tiny
/// relative to the diagonal scale counts as singular.
pub fn invert_leading_block(
    a: &na::Matrix3<f64>,
    dim: usize,
) -> Result<na::Matrix3<f64>, LinalgError> {
    const RELATIVE_TOLERANCE: f64 = 1e-12;
    let block = na::DMatrix::from_fn(dim, dim, |i, j| a[(i, j)]);
    let scale = block.trace() / dim as f64;
    if determinant(&block)?.abs() <= RELATIVE_TOLERANCE * scale.abs().powi(dim as i32) {
        return Err(LinalgError::Singular);
    }
    let inv = invert(&block)?;
    let mut out = na::Matrix3::zeros();
    for i in 0..dim {
        for j in 0..dim {
            out[(i, j)] = inv[(i, j)];
        }
    }
    Ok(out)
}
