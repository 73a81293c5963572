use crate::error::Result;
use crate::fv_core::{mesh::Mesh, space_disc::SpaceDiscretization};
use crate::time_integrator::{time_discretization::TimeDiscretization, time_step::TimeStep};

//TRAITS
pub trait TimeIntegrator {
    /// One explicit (pseudo) time step of the cell averages. On return the
    /// mesh residuals hold the residual of the state the step started from.
    fn update_cell_averages(&mut self, mesh: &mut Mesh, time: f64) -> Result<()>;

    fn stepper(&self) -> &ExplicitStepper;

    fn stepper_mut(&mut self) -> &mut ExplicitStepper;

    fn courant_number(&self) -> f64 {
        self.stepper().courant_number
    }

    fn set_courant_number(&mut self, courant_number: f64) {
        self.stepper_mut().courant_number = courant_number;
    }

    /// Switches dual time stepping on (`Some`) or off (`None`).
    fn set_time_discretization(&mut self, time_disc: Option<Box<dyn TimeDiscretization>>) {
        self.stepper_mut().time_disc = time_disc;
    }

    fn time_discretization_mut(&mut self) -> Option<&mut Box<dyn TimeDiscretization>> {
        self.stepper_mut().time_disc.as_mut()
    }
}

//STRUCTS
/// Shared forward-Euler stage: spatial residual, local pseudo time step and
/// the point-implicit treatment of the real-time derivative when dual time
/// stepping is active. Variables without a real-time derivative keep the
/// plain pseudo-time update.
pub struct ExplicitStepper {
    space: SpaceDiscretization,
    time_step: Box<dyn TimeStep>,
    courant_number: f64,
    time_disc: Option<Box<dyn TimeDiscretization>>,
}

pub struct ExplicitEulerTimeIntegrator {
    stepper: ExplicitStepper,
}

pub struct SspRk2TimeIntegrator {
    stepper: ExplicitStepper,
}

pub struct SspRk3TimeIntegrator {
    stepper: ExplicitStepper,
}

//HELPER FUNCTIONS
// u = a * u0 + (1 - a) * u
fn blend(mesh: &mut Mesh, u0: &[f64], a: f64) {
    for (u, u0) in mesh.fields.u_all_mut().iter_mut().zip(u0) {
        *u = a * u0 + (1.0 - a) * *u;
    }
}

//IMPLEMENTATIONS
impl ExplicitStepper {
    pub fn new(space: SpaceDiscretization, time_step: Box<dyn TimeStep>) -> Self {
        ExplicitStepper {
            space,
            time_step,
            courant_number: 0.5,
            time_disc: None,
        }
    }

    /// Forward-Euler stage `U <- U + dtau * R_total / V`. Stage time steps
    /// are recomputed only when `update_dt` is set.
    pub fn stage(&self, mesh: &mut Mesh, time: f64, update_dt: bool) -> Result<()> {
        self.space.update_residual(mesh, time)?;
        if update_dt {
            self.time_step
                .update_time_steps(mesh, self.courant_number);
        }

        let Mesh { grid, fields, .. } = mesh;
        let num_vars = fields.num_vars();
        for cell in grid.cells() {
            let i = cell.index;
            let volume = cell.volume();
            let dtau = fields.dt(i);
            for var in 0..num_vars {
                let index = i * num_vars + var;
                let u = fields.u(i)[var];
                let r = fields.residual(i)[var];
                let updated = match &self.time_disc {
                    Some(td) if td.has_real_time_derivative(var) => {
                        let a0 = td.a0();
                        let total = r - volume * (a0 * u + td.b(index));
                        fields.residual_mut(i)[var] = total;
                        (u + dtau * (total / volume + a0 * u)) / (1.0 + dtau * a0)
                    }
                    _ => u + dtau * r / volume,
                };
                fields.u_mut(i)[var] = updated;
            }
        }
        Ok(())
    }
}

impl ExplicitEulerTimeIntegrator {
    pub fn new(space: SpaceDiscretization, time_step: Box<dyn TimeStep>) -> Self {
        ExplicitEulerTimeIntegrator {
            stepper: ExplicitStepper::new(space, time_step),
        }
    }
}

impl TimeIntegrator for ExplicitEulerTimeIntegrator {
    fn update_cell_averages(&mut self, mesh: &mut Mesh, time: f64) -> Result<()> {
        self.stepper.stage(mesh, time, true)
    }

    fn stepper(&self) -> &ExplicitStepper {
        &self.stepper
    }

    fn stepper_mut(&mut self) -> &mut ExplicitStepper {
        &mut self.stepper
    }
}

impl SspRk2TimeIntegrator {
    pub fn new(space: SpaceDiscretization, time_step: Box<dyn TimeStep>) -> Self {
        SspRk2TimeIntegrator {
            stepper: ExplicitStepper::new(space, time_step),
        }
    }
}

impl TimeIntegrator for SspRk2TimeIntegrator {
    fn update_cell_averages(&mut self, mesh: &mut Mesh, time: f64) -> Result<()> {
        let u0 = mesh.fields.u_all().to_vec();

        //stage 1
        self.stepper.stage(mesh, time, true)?;
        let r0 = mesh.fields.residual_all().to_vec();

        //stage 2
        self.stepper.stage(mesh, time, false)?;
        blend(mesh, &u0, 0.5);

        mesh.fields.residual_all_mut().copy_from_slice(&r0);
        Ok(())
    }

    fn stepper(&self) -> &ExplicitStepper {
        &self.stepper
    }

    fn stepper_mut(&mut self) -> &mut ExplicitStepper {
        &mut self.stepper
    }
}

impl SspRk3TimeIntegrator {
    pub fn new(space: SpaceDiscretization, time_step: Box<dyn TimeStep>) -> Self {
        SspRk3TimeIntegrator {
            stepper: ExplicitStepper::new(space, time_step),
        }
    }
}

impl TimeIntegrator for SspRk3TimeIntegrator {
    fn update_cell_averages(&mut self, mesh: &mut Mesh, time: f64) -> Result<()> {
        let u0 = mesh.fields.u_all().to_vec();

        //stage 1
        self.stepper.stage(mesh, time, true)?;
        let r0 = mesh.fields.residual_all().to_vec();

        //stage 2
        self.stepper.stage(mesh, time, false)?;
        blend(mesh, &u0, 3.0 / 4.0);

        //stage 3
        self.stepper.stage(mesh, time, false)?;
        blend(mesh, &u0, 1.0 / 3.0);

        mesh.fields.residual_all_mut().copy_from_slice(&r0);
        Ok(())
    }

    fn stepper(&self) -> &ExplicitStepper {
        &self.stepper
    }

    fn stepper_mut(&mut self) -> &mut ExplicitStepper {
        &mut self.stepper
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fv_core::geometry::{Point, Vector};
    use crate::fv_core::gradient::ZeroCellGradient;
    use crate::fv_core::initial::uniform;
    use crate::fv_core::condition::{FunctionInitializer, InitialCondition};
    use crate::fv_core::mesh_builder::Structured2D;
    use crate::fv_core::reconstruction::PiecewiseConstant;
    use crate::fv_core::residual::{ConvectionResidual, ResidualCalculator, SourceResidual};
    use crate::fv_core::riemann::RusanovRiemannSolver;
    use crate::physics::{
        ArtificialCompressibility, GoverningEquations, ScalarAdvection, VolumeFractionAdvection,
    };
    use crate::time_integrator::time_discretization::TwoPointTimeDiscretization;
    use crate::time_integrator::time_step::{GlobalTimeStep, LocalTimeStep};
    use approx::assert_relative_eq;
    use std::rc::Rc;

    fn periodic_mesh(num_vars: usize) -> Mesh {
        Structured2D::cartesian((0.0, 0.0), (1.0, 1.0), (10, 10))
            .periodic(true, true)
            .build(num_vars, vec![])
            .unwrap()
    }

    fn advection_space(eqn: Rc<dyn GoverningEquations>) -> SpaceDiscretization {
        let residuals: Vec<Box<dyn ResidualCalculator>> = vec![Box::new(ConvectionResidual::new(
            Box::new(PiecewiseConstant),
            Box::new(RusanovRiemannSolver::new(eqn)),
        ))];
        SpaceDiscretization::new(Box::new(ZeroCellGradient), residuals)
    }

    fn integrators(eqn: Rc<dyn GoverningEquations>) -> Vec<Box<dyn TimeIntegrator>> {
        vec![
            Box::new(ExplicitEulerTimeIntegrator::new(
                advection_space(eqn.clone()),
                Box::new(GlobalTimeStep::new(eqn.clone())),
            )),
            Box::new(SspRk2TimeIntegrator::new(
                advection_space(eqn.clone()),
                Box::new(GlobalTimeStep::new(eqn.clone())),
            )),
            Box::new(SspRk3TimeIntegrator::new(
                advection_space(eqn.clone()),
                Box::new(LocalTimeStep::new(eqn)),
            )),
        ]
    }

    #[test]
    fn every_scheme_conserves_and_stays_bounded() {
        let eqn: Rc<dyn GoverningEquations> =
            Rc::new(ScalarAdvection::new(Vector::new(1.0, 0.5, 0.0), 0.0));
        for mut integrator in integrators(eqn.clone()) {
            let mut mesh = periodic_mesh(1);
            FunctionInitializer {
                f: |p: &Point| {
                    let inside = (p.x - 0.5).abs() < 0.2 && (p.y - 0.5).abs() < 0.2;
                    vec![if inside { 1.0 } else { 0.0 }]
                },
            }
            .initialize(&mut mesh)
            .unwrap();
            let before = mesh.integral()[0];
            integrator.set_courant_number(0.9);
            for _ in 0..10 {
                integrator.update_cell_averages(&mut mesh, 0.0).unwrap();
            }
            assert_relative_eq!(mesh.integral()[0], before, epsilon = 1e-12);
            for &u in mesh.fields.u_all() {
                assert!((-1e-12..=1.0 + 1e-12).contains(&u));
            }
        }
    }

    #[test]
    fn residual_of_the_starting_state_is_kept() {
        let eqn: Rc<dyn GoverningEquations> =
            Rc::new(ScalarAdvection::new(Vector::new(1.0, 0.0, 0.0), 0.0));
        let mut mesh = periodic_mesh(1);
        FunctionInitializer {
            f: |p: &Point| vec![(std::f64::consts::TAU * p.x).cos()],
        }
        .initialize(&mut mesh)
        .unwrap();
        let space = advection_space(eqn.clone());
        space.update_residual(&mut mesh, 0.0).unwrap();
        let expected = mesh.fields.residual_all().to_vec();

        let mut rk3 = SspRk3TimeIntegrator::new(space, Box::new(GlobalTimeStep::new(eqn)));
        rk3.update_cell_averages(&mut mesh, 0.0).unwrap();
        assert_eq!(mesh.fields.residual_all(), expected.as_slice());
    }

    #[test]
    fn dual_time_converges_to_the_implicit_euler_step() {
        // dU/dt = g for the momentum: one implicit step gives U + g * dt
        let eqn: Rc<dyn GoverningEquations> = Rc::new(ArtificialCompressibility::new(
            1.0,
            0.0,
            Vector::new(0.0, -2.0, 0.0),
        ));
        let mut mesh = periodic_mesh(4);
        uniform(vec![0.0, 0.0, 0.0, 0.0])
            .initialize(&mut mesh)
            .unwrap();
        let residuals: Vec<Box<dyn ResidualCalculator>> = vec![
            Box::new(ConvectionResidual::new(
                Box::new(PiecewiseConstant),
                Box::new(RusanovRiemannSolver::new(eqn.clone())),
            )),
            Box::new(SourceResidual::new(eqn.clone())),
        ];
        let mut integrator = ExplicitEulerTimeIntegrator::new(
            SpaceDiscretization::new(Box::new(ZeroCellGradient), residuals),
            Box::new(LocalTimeStep::new(eqn.clone())),
        );
        integrator.set_courant_number(1.0);
        integrator.set_time_discretization(Some(Box::new(TwoPointTimeDiscretization::new(
            &mesh,
            eqn.as_ref(),
            0.05,
        ))));
        for _ in 0..200 {
            integrator.update_cell_averages(&mut mesh, 0.0).unwrap();
        }
        for i in 0..mesh.num_cells() {
            assert_relative_eq!(mesh.fields.u(i)[2], -0.1, epsilon = 1e-9);
            assert_relative_eq!(mesh.fields.u(i)[0], 0.0, epsilon = 1e-12);
        }
        assert!(integrator.time_discretization_mut().is_some());
    }

    #[test]
    fn recomputed_variables_get_no_real_time_term() {
        let eqn: Rc<dyn GoverningEquations> = Rc::new(VolumeFractionAdvection::new());
        let mut mesh = periodic_mesh(7);
        uniform(vec![0.5, 1.0, 0.5, 0.0, 0.0, 0.0, 0.0])
            .initialize(&mut mesh)
            .unwrap();
        let mut integrator = ExplicitEulerTimeIntegrator::new(
            advection_space(eqn.clone()),
            Box::new(LocalTimeStep::new(eqn.clone())),
        );
        integrator.set_time_discretization(Some(Box::new(TwoPointTimeDiscretization::new(
            &mesh,
            eqn.as_ref(),
            0.01,
        ))));
        // compression velocity overwritten between iterations
        for i in 0..mesh.num_cells() {
            mesh.fields.u_mut(i)[4] = 0.3;
        }
        integrator.update_cell_averages(&mut mesh, 0.01).unwrap();
        for i in 0..mesh.num_cells() {
            assert_eq!(mesh.fields.u(i)[4], 0.3);
            assert_eq!(mesh.fields.residual(i)[4], 0.0);
            assert_relative_eq!(mesh.fields.u(i)[0], 0.5, epsilon = 1e-12);
        }
    }
}
