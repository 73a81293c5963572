extern crate nalgebra as na;

use std::rc::Rc;

use crate::error::{ensure_len, Result};
use crate::fv_core::geometry::{Point, Vector};
use crate::fv_core::mesh::{Face, Mesh};
use crate::physics::{EulerEquations, GoverningEquations};

//traits
pub trait InitialCondition {
    fn initialize(&self, mesh: &mut Mesh) -> Result<()>;
}

/// Supplies the state on the outer side of a boundary face.
///
/// `inside` is the interior state the condition reacts to: the cell average
/// when ghosts are written, the reconstructed face value when a direct flux
/// is requested.
pub trait BoundaryCondition {
    fn set_ghost_cell_values(&self, face: &Face, inside: &[f64], ghost: &mut [f64], time: f64);

    /// Exact boundary flux along the face normal. `None` means the flux is
    /// obtained from the Riemann solver against the ghost state.
    fn convective_flux(
        &self,
        _face: &Face,
        _inside: &[f64],
        _time: f64,
    ) -> Result<Option<na::DVector<f64>>> {
        Ok(None)
    }
}

//structs for initial
pub struct FunctionInitializer<F>
where
    F: Fn(&Point) -> Vec<f64>,
{
    pub f: F,
}

//structs for boundary
/// Zero-gradient condition: the ghost copies the interior state.
pub struct ExtrapolatedBc {
    eqn: Rc<dyn GoverningEquations>,
}

/// Slip wall: the normal part of the velocity stored at
/// `u[velocity_offset..velocity_offset + 3]` is reflected.
pub struct InviscidWallBc {
    eqn: Rc<dyn GoverningEquations>,
    velocity_offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InletProperties {
    pub speed: f64,
    pub density: f64,
    pub pressure: f64,
}

/// Compressible inflow normal to the boundary, with data given as a function
/// of time.
pub struct InletBc {
    eqn: Rc<EulerEquations>,
    properties: Box<dyn Fn(f64) -> InletProperties>,
}

/// Prescribed (kinematic) pressure in variable 0; every other variable is
/// transmitted from the interior.
pub struct PressureOutletBc {
    eqn: Rc<dyn GoverningEquations>,
    pressure: Box<dyn Fn(f64) -> f64>,
}

/// Ghost state given entirely as a function of time.
pub struct FixedStateBc {
    state: Box<dyn Fn(f64) -> Vec<f64>>,
}

//implementation for initial
impl<F> InitialCondition for FunctionInitializer<F>
where
    F: Fn(&Point) -> Vec<f64>,
{
    fn initialize(&self, mesh: &mut Mesh) -> Result<()> {
        let Mesh { grid, fields, .. } = mesh;
        for cell in grid.cells() {
            let values = (self.f)(&cell.centroid());
            fields.set_u(cell.index, &values)?;
        }
        Ok(())
    }
}

//implementation for boundary
impl ExtrapolatedBc {
    pub fn new(eqn: Rc<dyn GoverningEquations>) -> Self {
        ExtrapolatedBc { eqn }
    }
}

impl BoundaryCondition for ExtrapolatedBc {
    fn set_ghost_cell_values(&self, _face: &Face, inside: &[f64], ghost: &mut [f64], _time: f64) {
        ghost.copy_from_slice(inside);
    }

    fn convective_flux(
        &self,
        face: &Face,
        inside: &[f64],
        _time: f64,
    ) -> Result<Option<na::DVector<f64>>> {
        Ok(Some(self.eqn.convective_flux(inside, face.unit_normal())))
    }
}

impl InviscidWallBc {
    pub fn new(eqn: Rc<dyn GoverningEquations>, velocity_offset: usize) -> Self {
        InviscidWallBc {
            eqn,
            velocity_offset,
        }
    }

    fn remove_normal_velocity(&self, n: &Vector, u: &mut [f64], factor: f64) {
        let k = self.velocity_offset;
        let v = Vector::new(u[k], u[k + 1], u[k + 2]);
        let v = v - n * (factor * v.dot(n));
        u[k] = v.x;
        u[k + 1] = v.y;
        u[k + 2] = v.z;
    }
}

impl BoundaryCondition for InviscidWallBc {
    fn set_ghost_cell_values(&self, face: &Face, inside: &[f64], ghost: &mut [f64], _time: f64) {
        ghost.copy_from_slice(inside);
        self.remove_normal_velocity(face.unit_normal(), ghost, 2.0);
    }

    // Flux of the interior state with its normal velocity removed, so no
    // mass crosses the wall.
    fn convective_flux(
        &self,
        face: &Face,
        inside: &[f64],
        _time: f64,
    ) -> Result<Option<na::DVector<f64>>> {
        let mut wall = inside.to_vec();
        self.remove_normal_velocity(face.unit_normal(), &mut wall, 1.0);
        Ok(Some(self.eqn.convective_flux(&wall, face.unit_normal())))
    }
}

impl InletBc {
    pub fn new<F>(eqn: Rc<EulerEquations>, properties: F) -> Self
    where
        F: Fn(f64) -> InletProperties + 'static,
    {
        InletBc {
            eqn,
            properties: Box::new(properties),
        }
    }
}

impl BoundaryCondition for InletBc {
    fn set_ghost_cell_values(&self, face: &Face, _inside: &[f64], ghost: &mut [f64], time: f64) {
        let props = (self.properties)(time);
        let velocity = face.unit_normal() * -props.speed;
        let state = self
            .eqn
            .conservative(props.density, &velocity, props.pressure);
        ghost.copy_from_slice(&state);
    }
}

impl PressureOutletBc {
    pub fn new<F>(eqn: Rc<dyn GoverningEquations>, pressure: F) -> Self
    where
        F: Fn(f64) -> f64 + 'static,
    {
        PressureOutletBc {
            eqn,
            pressure: Box::new(pressure),
        }
    }
}

impl BoundaryCondition for PressureOutletBc {
    fn set_ghost_cell_values(&self, _face: &Face, inside: &[f64], ghost: &mut [f64], time: f64) {
        ghost.copy_from_slice(inside);
        ghost[0] = 2.0 * (self.pressure)(time) - inside[0];
    }

    fn convective_flux(
        &self,
        face: &Face,
        inside: &[f64],
        time: f64,
    ) -> Result<Option<na::DVector<f64>>> {
        let mut boundary = inside.to_vec();
        boundary[0] = (self.pressure)(time);
        Ok(Some(self.eqn.convective_flux(&boundary, face.unit_normal())))
    }
}

impl FixedStateBc {
    pub fn new<F>(num_vars: usize, state: F) -> Result<Self>
    where
        F: Fn(f64) -> Vec<f64> + 'static,
    {
        ensure_len("fixed boundary state", num_vars, state(0.0).len())?;
        Ok(FixedStateBc {
            state: Box::new(state),
        })
    }
}

impl BoundaryCondition for FixedStateBc {
    fn set_ghost_cell_values(&self, _face: &Face, _inside: &[f64], ghost: &mut [f64], time: f64) {
        ghost.copy_from_slice(&(self.state)(time));
    }
}

pub fn initialize_mesh<I>(mesh: &mut Mesh, init: &I, time: f64) -> Result<()>
where
    I: InitialCondition,
{
    init.initialize(mesh)?;
    mesh.set_ghost_cell_values(time);
    Ok(())
}
