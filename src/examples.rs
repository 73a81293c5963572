use pp_fvm::{
    config::SolverConfig,
    convergence::Convergence,
    fv_core::{
        condition::{
            initialize_mesh, BoundaryCondition, ExtrapolatedBc, FunctionInitializer, InletBc,
            InletProperties, InviscidWallBc, PressureOutletBc,
        },
        geometry::{Point, Vector},
        gradient::LeastSquareCellGradient,
        initial,
        mesh_builder::{Structured2D, ETA_MAX, ETA_MIN, XI_MAX, XI_MIN},
        neighbors::{CellNeighborCalculator, FaceBasedCellNeighbors},
        reconstruction::VkLimiterReconstructor,
        residual::{ConvectionResidual, DiffusionResidual, ResidualCalculator, SourceResidual},
        riemann::{HllRiemannSolver, HllcRiemannSolver, HllcVofRiemannSolver},
        space_disc::SpaceDiscretization,
    },
    physics::{
        volume_fraction::update_compression_velocity, ArtificialCompressibilityVof,
        EulerEquations, GoverningEquations, VolumeFractionAdvection,
    },
    solver::Solver,
    time_integrator::{
        fvm_ssp_rk::{SspRk2TimeIntegrator, SspRk3TimeIntegrator},
        time_step::LocalTimeStep,
    },
};

use std::f64::consts::PI;
use std::path::PathBuf;
use std::rc::Rc;
use tracing::info;

fn with_output(config: &SolverConfig, name: &str) -> SolverConfig {
    let mut config = config.clone();
    if config.working_directory.is_none() {
        config.working_directory = Some(PathBuf::from("results/csv_files").join(name));
    }
    config
}

/// Subsonic channel flow over a circular-arc bump in the lower wall.
pub fn euler_bump(config: &SolverConfig) -> Result<(), Box<dyn std::error::Error>> {
    let gamma = 1.4;
    let rho = 1.0;
    let p = 1.0 / gamma;
    let mach = 0.5;
    let bump_height = 0.04;

    let eqn = Rc::new(EulerEquations::new(gamma, 287.0));
    let shared: Rc<dyn GoverningEquations> = eqn.clone();

    let mut structured = Structured2D::cartesian((-1.5, 0.0), (3.0, 1.0), (60, 20));
    for col in structured.nodes.iter_mut() {
        for node in col.iter_mut() {
            if node.x.abs() < 0.5 {
                node.y += bump_height * (PI * node.x).cos().powi(2) * (1.0 - node.y);
            }
        }
    }

    let inlet = InletBc::new(eqn.clone(), move |_| InletProperties {
        speed: mach,
        density: rho,
        pressure: p,
    });
    let boundaries: Vec<(&str, Box<dyn BoundaryCondition>)> = vec![
        (XI_MIN, Box::new(inlet)),
        (XI_MAX, Box::new(ExtrapolatedBc::new(shared.clone()))),
        (ETA_MIN, Box::new(InviscidWallBc::new(shared.clone(), 1))),
        (ETA_MAX, Box::new(InviscidWallBc::new(shared.clone(), 1))),
    ];
    let mut mesh = structured.build(eqn.num_vars(), boundaries)?;

    let stencil = FaceBasedCellNeighbors.calculate(&mesh.grid);
    let gradient = LeastSquareCellGradient::new(&mesh.grid, &stencil)?;
    let residuals: Vec<Box<dyn ResidualCalculator>> = vec![Box::new(ConvectionResidual::new(
        Box::new(VkLimiterReconstructor::new(shared.clone(), stencil)),
        Box::new(HllcRiemannSolver::new(eqn.clone())),
    ))];
    let mut integrator = SspRk2TimeIntegrator::new(
        SpaceDiscretization::new(Box::new(gradient), residuals),
        Box::new(LocalTimeStep::new(shared.clone())),
    );

    let init = initial::euler_freestream(&eqn, rho, Vector::new(mach, 0.0, 0.0), p);
    initialize_mesh(&mut mesh, &init, 0.0)?;

    let solver = Solver::new(
        shared,
        Convergence::uniform(eqn.num_vars(), 1e-6),
        with_output(config, "euler_bump"),
    );
    let report = solver.solve_steady(&mut mesh, &mut integrator)?;
    info!(
        "bump: {} iterations, converged: {}",
        report.iterations, report.converged
    );

    Ok(())
}

/// Circular blob of volume fraction carried diagonally through a 40x40
/// grid with dual time stepping.
pub fn volume_fraction_advection(
    config: &SolverConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let real_dt = 0.01;
    let num_steps = 20;

    let eqn: Rc<dyn GoverningEquations> = Rc::new(VolumeFractionAdvection::new());
    let boundaries: Vec<(&str, Box<dyn BoundaryCondition>)> = [XI_MIN, XI_MAX, ETA_MIN, ETA_MAX]
        .iter()
        .map(|&name| {
            let bc: Box<dyn BoundaryCondition> = Box::new(ExtrapolatedBc::new(eqn.clone()));
            (name, bc)
        })
        .collect();
    let mut mesh = Structured2D::cartesian((-5.0, -5.0), (10.0, 10.0), (40, 40))
        .build(eqn.num_vars(), boundaries)?;

    let stencil = FaceBasedCellNeighbors.calculate(&mesh.grid);
    let gradient = LeastSquareCellGradient::new(&mesh.grid, &stencil)?;
    let residuals: Vec<Box<dyn ResidualCalculator>> = vec![
        Box::new(ConvectionResidual::new(
            Box::new(VkLimiterReconstructor::new(eqn.clone(), stencil)),
            Box::new(HllRiemannSolver::new(eqn.clone())),
        )),
        Box::new(DiffusionResidual::new(eqn.clone())),
    ];
    let mut integrator = SspRk2TimeIntegrator::new(
        SpaceDiscretization::new(Box::new(gradient), residuals),
        Box::new(LocalTimeStep::new(eqn.clone())),
    );

    let init = initial::circular_volume_fraction(Point::origin(), 0.5, Vector::new(1.0, 0.5, 0.0));
    initialize_mesh(&mut mesh, &init, 0.0)?;
    let volume = mesh.integral()[0];

    let mut config = with_output(config, "volume_fraction_advection");
    config.courant_number = 1.0;
    let solver = Solver::new(eqn.clone(), Convergence::uniform(eqn.num_vars(), 1e-3), config);
    let report = solver.solve_transient(
        &mut mesh,
        &mut integrator,
        0.0,
        real_dt,
        num_steps,
        update_compression_velocity,
    )?;

    info!("iterations per step: {:?}", report.iterations);
    info!(
        "volume of phase 1: {:.6} -> {:.6}",
        volume,
        mesh.integral()[0]
    );

    Ok(())
}

/// Two-phase column settling under gravity below a pressure outlet.
pub fn settling_column(config: &SolverConfig) -> Result<(), Box<dyn std::error::Error>> {
    let gravity = Vector::new(0.0, -1.0, 0.0);
    let eqn = Rc::new(ArtificialCompressibilityVof::new(
        10.0, 1e-2, 1.0, 1e-3, gravity, 10.0,
    ));
    let shared: Rc<dyn GoverningEquations> = eqn.clone();

    let boundaries: Vec<(&str, Box<dyn BoundaryCondition>)> = vec![
        (XI_MIN, Box::new(InviscidWallBc::new(shared.clone(), 1))),
        (XI_MAX, Box::new(InviscidWallBc::new(shared.clone(), 1))),
        (ETA_MIN, Box::new(InviscidWallBc::new(shared.clone(), 1))),
        (ETA_MAX, Box::new(PressureOutletBc::new(shared.clone(), |_| 0.0))),
    ];
    let mut mesh = Structured2D::cartesian((0.0, 0.0), (0.5, 1.0), (10, 20))
        .build(eqn.num_vars(), boundaries)?;

    let stencil = FaceBasedCellNeighbors.calculate(&mesh.grid);
    let gradient = LeastSquareCellGradient::new(&mesh.grid, &stencil)?;
    let residuals: Vec<Box<dyn ResidualCalculator>> = vec![
        Box::new(ConvectionResidual::new(
            Box::new(VkLimiterReconstructor::new(shared.clone(), stencil)),
            Box::new(HllcVofRiemannSolver::new(eqn.clone())),
        )),
        Box::new(DiffusionResidual::new(shared.clone())),
        Box::new(SourceResidual::new(shared.clone())),
    ];
    let mut integrator = SspRk3TimeIntegrator::new(
        SpaceDiscretization::new(Box::new(gradient), residuals),
        Box::new(LocalTimeStep::new(shared.clone())),
    );

    let init = FunctionInitializer {
        f: |p: &Point| {
            let c = if p.y > 0.5 && p.y < 0.75 { 1.0 } else { 0.0 };
            vec![0.0, 0.0, 0.0, 0.0, c]
        },
    };
    initialize_mesh(&mut mesh, &init, 0.0)?;

    let solver = Solver::new(
        shared,
        Convergence::uniform(eqn.num_vars(), 1e-4),
        with_output(config, "settling_column"),
    );
    let report = solver.solve_transient(&mut mesh, &mut integrator, 0.0, 0.01, 10, |_| {})?;
    info!("iterations per step: {:?}", report.iterations);

    Ok(())
}
