//! Cell-centred finite-volume solver for systems of conservation laws on
//! unstructured meshes, with explicit pseudo-time integration and dual time
//! stepping.

pub mod config;
pub mod convergence;
pub mod error;
pub mod fv_core;
pub mod linalg;
pub mod physics;
pub mod solver;
pub mod time_integrator;

pub use error::{Result, SolverError};
