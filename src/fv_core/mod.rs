pub mod condition;
pub mod geometry;
pub mod gradient;
pub mod initial;
pub mod mesh;
pub mod mesh_builder;
pub mod neighbors;
pub mod reconstruction;
pub mod residual;
pub mod riemann;
pub mod space_disc;
