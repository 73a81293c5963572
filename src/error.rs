use thiserror::Error;

use crate::linalg::LinalgError;

pub type Result<T> = std::result::Result<T, SolverError>;

#[derive(Debug, Error)]
pub enum SolverError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("{what}: expected length {expected}, found {found}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("no boundary condition registered under the name \"{0}\"")]
    UnknownBoundary(String),

    #[error(transparent)]
    Linalg(#[from] LinalgError),

    #[error("least-squares stencil of cell {cell} is geometrically degenerate")]
    SingularStencil { cell: usize },

    #[error("non-physical state: {what} = {value}")]
    NonPhysicalState { what: &'static str, value: f64 },

    #[error("cannot calculate {operation} of a {shape}")]
    UndefinedGeometry {
        operation: &'static str,
        shape: &'static str,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Checks that a per-variable vector has the expected length.
pub fn ensure_len(what: &'static str, expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(SolverError::DimensionMismatch {
            what,
            expected,
            found,
        });
    }
    Ok(())
}
