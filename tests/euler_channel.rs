use std::f64::consts::PI;
use std::rc::Rc;

use approx::assert_relative_eq;

use pp_fvm::config::SolverConfig;
use pp_fvm::convergence::{Convergence, Norm};
use pp_fvm::fv_core::condition::{
    initialize_mesh, BoundaryCondition, ExtrapolatedBc, InletBc, InletProperties, InviscidWallBc,
};
use pp_fvm::fv_core::geometry::Vector;
use pp_fvm::fv_core::gradient::{LeastSquareCellGradient, ZeroCellGradient};
use pp_fvm::fv_core::initial::euler_freestream;
use pp_fvm::fv_core::mesh::Mesh;
use pp_fvm::fv_core::mesh_builder::{Structured2D, ETA_MAX, ETA_MIN, XI_MAX, XI_MIN};
use pp_fvm::fv_core::neighbors::{CellNeighborCalculator, FaceBasedCellNeighbors};
use pp_fvm::fv_core::reconstruction::{PiecewiseConstant, VkLimiterReconstructor};
use pp_fvm::fv_core::residual::{ConvectionResidual, ResidualCalculator};
use pp_fvm::fv_core::riemann::{HllRiemannSolver, HllcRiemannSolver};
use pp_fvm::fv_core::space_disc::SpaceDiscretization;
use pp_fvm::physics::{EulerEquations, GoverningEquations};
use pp_fvm::solver::Solver;
use pp_fvm::time_integrator::fvm_ssp_rk::{ExplicitEulerTimeIntegrator, SspRk2TimeIntegrator};
use pp_fvm::time_integrator::time_step::LocalTimeStep;

const GAMMA: f64 = 1.4;
const RHO: f64 = 1.0;
const P: f64 = 1.0 / GAMMA;

fn channel(eqn: &Rc<EulerEquations>, structured: Structured2D, mach: f64) -> Mesh {
    let shared: Rc<dyn GoverningEquations> = eqn.clone();
    let inlet = InletBc::new(eqn.clone(), move |_| InletProperties {
        speed: mach,
        density: RHO,
        pressure: P,
    });
    let boundaries: Vec<(&str, Box<dyn BoundaryCondition>)> = vec![
        (XI_MIN, Box::new(inlet)),
        (XI_MAX, Box::new(ExtrapolatedBc::new(shared.clone()))),
        (ETA_MIN, Box::new(InviscidWallBc::new(shared.clone(), 1))),
        (ETA_MAX, Box::new(InviscidWallBc::new(shared, 1))),
    ];
    let mut mesh = structured.build(5, boundaries).unwrap();
    let init = euler_freestream(eqn, RHO, Vector::new(mach, 0.0, 0.0), P);
    initialize_mesh(&mut mesh, &init, 0.0).unwrap();
    mesh
}

fn quiet(max_iterations: usize) -> SolverConfig {
    SolverConfig {
        max_iterations,
        show_progress: false,
        ..Default::default()
    }
}

#[test]
fn freestream_is_preserved_on_a_distorted_channel() {
    let eqn = Rc::new(EulerEquations::new(GAMMA, 287.0));
    let shared: Rc<dyn GoverningEquations> = eqn.clone();

    let mut structured = Structured2D::cartesian((0.0, 0.0), (3.0, 1.0), (24, 8));
    let (ni, nj) = (structured.nodes.len(), structured.nodes[0].len());
    for i in 1..ni - 1 {
        for j in 1..nj - 1 {
            let p = &mut structured.nodes[i][j];
            p.x += 0.01 * ((3 * i + j) % 5) as f64 - 0.02;
            p.y += 0.02 * ((i + 2 * j) % 3) as f64 - 0.02;
        }
    }
    let mut mesh = channel(&eqn, structured, 0.5);
    let expected = mesh.fields.u(0).to_vec();

    let stencil = FaceBasedCellNeighbors.calculate(&mesh.grid);
    let residuals: Vec<Box<dyn ResidualCalculator>> = vec![Box::new(ConvectionResidual::new(
        Box::new(VkLimiterReconstructor::new(shared.clone(), stencil.clone())),
        Box::new(HllcRiemannSolver::new(eqn.clone())),
    ))];
    let mut integrator = SspRk2TimeIntegrator::new(
        SpaceDiscretization::new(
            Box::new(LeastSquareCellGradient::new(&mesh.grid, &stencil).unwrap()),
            residuals,
        ),
        Box::new(LocalTimeStep::new(shared.clone())),
    );

    let solver = Solver::new(shared, Convergence::uniform(5, 1e-8), quiet(20));
    let report = solver.solve_steady(&mut mesh, &mut integrator).unwrap();
    assert!(report.converged);
    assert_eq!(report.iterations, 1);
    for i in 0..mesh.num_cells() {
        for (u, e) in mesh.fields.u(i).iter().zip(&expected) {
            assert_relative_eq!(*u, *e, epsilon = 1e-10);
        }
    }
}

#[test]
fn supersonic_flow_over_a_bump_settles() {
    let eqn = Rc::new(EulerEquations::new(GAMMA, 287.0));
    let shared: Rc<dyn GoverningEquations> = eqn.clone();

    let mut structured = Structured2D::cartesian((-1.5, 0.0), (3.0, 1.0), (30, 10));
    for col in structured.nodes.iter_mut() {
        for p in col.iter_mut() {
            if p.x.abs() < 0.5 {
                p.y += 0.02 * (PI * p.x).cos().powi(2) * (1.0 - p.y);
            }
        }
    }
    let mut mesh = channel(&eqn, structured, 2.0);

    let residuals: Vec<Box<dyn ResidualCalculator>> = vec![Box::new(ConvectionResidual::new(
        Box::new(PiecewiseConstant),
        Box::new(HllRiemannSolver::new(shared.clone())),
    ))];
    let mut integrator = ExplicitEulerTimeIntegrator::new(
        SpaceDiscretization::new(Box::new(ZeroCellGradient), residuals),
        Box::new(LocalTimeStep::new(shared.clone())),
    );

    let config = SolverConfig {
        convergence_norm: Norm::Two,
        ..quiet(2000)
    };
    let solver = Solver::new(shared, Convergence::uniform(5, 1e-14), config);
    let report = solver.solve_steady(&mut mesh, &mut integrator).unwrap();

    let first = &report.history[0];
    let last = &report.history[report.history.len() - 1];
    assert!(first[0] > 0.0);
    assert!(last[0] < 1e-2 * first[0], "{:?} vs {:?}", last, first);

    for i in 0..mesh.num_cells() {
        let u = mesh.fields.u(i);
        assert!(u[0] > 0.0);
        assert!(eqn.pressure(u) > 0.0);
    }

    // compression ahead of the crest
    let front = mesh
        .grid
        .cells()
        .iter()
        .filter(|c| {
            let x = c.centroid().x;
            x > -0.35 && x < -0.1 && c.centroid().y < 0.1
        })
        .map(|c| eqn.pressure(mesh.fields.u(c.index)))
        .fold(f64::NEG_INFINITY, f64::max);
    assert!(front > P);
}
