use crate::fv_core::condition::FunctionInitializer;
use crate::fv_core::geometry::{Point, Vector};
use crate::physics::EulerEquations;

/// The same state in every cell.
pub fn uniform(state: Vec<f64>) -> FunctionInitializer<Box<dyn Fn(&Point) -> Vec<f64>>> {
    FunctionInitializer {
        f: Box::new(move |_| state.clone()),
    }
}

/// Uniform Euler flow given in primitive variables.
pub fn euler_freestream(
    eqn: &EulerEquations,
    density: f64,
    velocity: Vector,
    pressure: f64,
) -> FunctionInitializer<Box<dyn Fn(&Point) -> Vec<f64>>> {
    uniform(eqn.conservative(density, &velocity, pressure).to_vec())
}

/// Volume fraction 1 inside a circle (sphere in 3D) around `center`, 0
/// outside, advected by the uniform `velocity`. Compression velocity
/// starts at zero.
pub fn circular_volume_fraction(
    center: Point,
    radius: f64,
    velocity: Vector,
) -> FunctionInitializer<Box<dyn Fn(&Point) -> Vec<f64>>> {
    FunctionInitializer {
        f: Box::new(move |p| {
            let c = if (p - center).norm() < radius { 1.0 } else { 0.0 };
            vec![c, velocity.x, velocity.y, velocity.z, 0.0, 0.0, 0.0]
        }),
    }
}

/// Gaussian bump of a single scalar, `exp(-|x - mu|^2 / (2 sigma)^2)`.
pub fn gauss_scalar(mu: Point, sigma: f64) -> FunctionInitializer<Box<dyn Fn(&Point) -> Vec<f64>>> {
    FunctionInitializer {
        f: Box::new(move |p| {
            let exponent = -((p - mu).norm() / (2.0 * sigma)).powi(2);
            vec![exponent.exp()]
        }),
    }
}
