use std::rc::Rc;

use approx::assert_relative_eq;

use pp_fvm::fv_core::condition::{initialize_mesh, FunctionInitializer};
use pp_fvm::fv_core::geometry::{Point, Vector};
use pp_fvm::fv_core::gradient::LeastSquareCellGradient;
use pp_fvm::fv_core::mesh::Mesh;
use pp_fvm::fv_core::mesh_builder::Structured2D;
use pp_fvm::fv_core::neighbors::{CellNeighborCalculator, NodeBasedCellNeighbors};
use pp_fvm::fv_core::reconstruction::VkLimiterReconstructor;
use pp_fvm::fv_core::residual::{ConvectionResidual, ResidualCalculator};
use pp_fvm::fv_core::riemann::{HllcRiemannSolver, RiemannSolver, RusanovRiemannSolver};
use pp_fvm::fv_core::space_disc::SpaceDiscretization;
use pp_fvm::physics::{EulerEquations, GoverningEquations};
use pp_fvm::time_integrator::fvm_ssp_rk::{SspRk3TimeIntegrator, TimeIntegrator};
use pp_fvm::time_integrator::time_step::GlobalTimeStep;

fn closed_distorted_mesh() -> Mesh {
    let mut structured = Structured2D::cartesian((0.0, 0.0), (2.0, 1.0), (16, 8));
    let (ni, nj) = (structured.nodes.len(), structured.nodes[0].len());
    for i in 1..ni - 1 {
        for j in 1..nj - 1 {
            let p = &mut structured.nodes[i][j];
            p.x += 0.01 * ((5 * i + 3 * j) % 4) as f64 - 0.015;
            p.y += 0.01 * ((i + j) % 3) as f64 - 0.01;
        }
    }
    structured.periodic(true, true).build(5, vec![]).unwrap()
}

fn run(riemann: Box<dyn RiemannSolver>, eqn: Rc<EulerEquations>) {
    let shared: Rc<dyn GoverningEquations> = eqn.clone();
    let mut mesh = closed_distorted_mesh();

    let pulse = {
        let eqn = eqn.clone();
        move |p: &Point| {
            let r2 = (p.x - 1.0).powi(2) + (p.y - 0.5).powi(2);
            let rho = 1.0 + 0.3 * (-r2 / 0.02).exp();
            let pressure = 1.0 + 0.1 * (-r2 / 0.05).exp();
            eqn.conservative(rho, &Vector::new(0.3, 0.1, 0.0), pressure).to_vec()
        }
    };
    initialize_mesh(&mut mesh, &FunctionInitializer { f: pulse }, 0.0).unwrap();
    let before = mesh.integral();
    let initial = mesh.fields.u_all().to_vec();

    let stencil = NodeBasedCellNeighbors.calculate(&mesh.grid);
    let residuals: Vec<Box<dyn ResidualCalculator>> = vec![Box::new(ConvectionResidual::new(
        Box::new(VkLimiterReconstructor::new(shared.clone(), stencil.clone())),
        riemann,
    ))];
    let mut integrator = SspRk3TimeIntegrator::new(
        SpaceDiscretization::new(
            Box::new(LeastSquareCellGradient::new(&mesh.grid, &stencil).unwrap()),
            residuals,
        ),
        Box::new(GlobalTimeStep::new(shared)),
    );
    integrator.set_courant_number(0.8);

    for _ in 0..25 {
        integrator.update_cell_averages(&mut mesh, 0.0).unwrap();
    }

    let after = mesh.integral();
    for (a, b) in after.iter().zip(&before) {
        assert_relative_eq!(*a, *b, epsilon = 1e-11, max_relative = 1e-12);
    }
    for i in 0..mesh.num_cells() {
        let u = mesh.fields.u(i);
        assert!(u[0] > 0.8 && u[0] < 1.4, "density {}", u[0]);
        assert!(eqn.pressure(u) > 0.0);
    }
    // the pulse has actually moved
    let change = mesh
        .fields
        .u_all()
        .iter()
        .zip(&initial)
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, f64::max);
    assert!(change > 1e-3);
}

#[test]
fn hllc_conserves_mass_momentum_and_energy_on_a_closed_mesh() {
    let eqn = Rc::new(EulerEquations::new(1.4, 287.0));
    run(Box::new(HllcRiemannSolver::new(eqn.clone())), eqn);
}

#[test]
fn rusanov_conserves_mass_momentum_and_energy_on_a_closed_mesh() {
    let eqn = Rc::new(EulerEquations::new(1.4, 287.0));
    run(Box::new(RusanovRiemannSolver::new(eqn.clone())), eqn);
}
