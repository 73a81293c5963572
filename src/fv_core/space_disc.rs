use crate::error::Result;
use crate::fv_core::gradient::CellGradientCalculator;
use crate::fv_core::mesh::Mesh;
use crate::fv_core::residual::ResidualCalculator;

/// Spatial operator: turns the cell averages in `mesh.fields` into cell
/// residuals.
pub struct SpaceDiscretization {
    gradient: Box<dyn CellGradientCalculator>,
    residuals: Vec<Box<dyn ResidualCalculator>>,
}

impl SpaceDiscretization {
    pub fn new(
        gradient: Box<dyn CellGradientCalculator>,
        residuals: Vec<Box<dyn ResidualCalculator>>,
    ) -> Self {
        SpaceDiscretization {
            gradient,
            residuals,
        }
    }

    pub fn update_residual(&self, mesh: &mut Mesh, time: f64) -> Result<()> {
        mesh.fields.zero_residuals();
        self.gradient.compute(mesh)?;
        for r in &self.residuals {
            r.prepare(mesh);
        }
        mesh.set_ghost_cell_values(time);
        for r in &self.residuals {
            r.calculate_residual(mesh, time)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fv_core::condition::{FunctionInitializer, InitialCondition};
    use crate::fv_core::geometry::{Point, Vector};
    use crate::fv_core::gradient::LeastSquareCellGradient;
    use crate::fv_core::mesh_builder::Structured2D;
    use crate::fv_core::neighbors::{CellNeighborCalculator, FaceBasedCellNeighbors};
    use crate::fv_core::reconstruction::VkLimiterReconstructor;
    use crate::fv_core::residual::ConvectionResidual;
    use crate::fv_core::riemann::RusanovRiemannSolver;
    use crate::physics::{GoverningEquations, ScalarAdvection};
    use approx::assert_relative_eq;
    use std::rc::Rc;

    #[test]
    fn stale_residuals_are_cleared_before_accumulation() {
        let eqn: Rc<dyn GoverningEquations> =
            Rc::new(ScalarAdvection::new(Vector::new(0.7, 0.2, 0.0), 0.0));
        let mut mesh = Structured2D::cartesian((0.0, 0.0), (1.0, 1.0), (8, 8))
            .periodic(true, true)
            .build(1, vec![])
            .unwrap();
        FunctionInitializer {
            f: |p: &Point| vec![(std::f64::consts::TAU * p.x).sin()],
        }
        .initialize(&mut mesh)
        .unwrap();
        let stencil = FaceBasedCellNeighbors.calculate(&mesh.grid);
        let space = SpaceDiscretization::new(
            Box::new(LeastSquareCellGradient::new(&mesh.grid, &stencil).unwrap()),
            vec![Box::new(ConvectionResidual::new(
                Box::new(VkLimiterReconstructor::new(eqn.clone(), stencil)),
                Box::new(RusanovRiemannSolver::new(eqn)),
            ))],
        );

        space.update_residual(&mut mesh, 0.0).unwrap();
        let first = mesh.fields.residual_all().to_vec();
        space.update_residual(&mut mesh, 0.0).unwrap();
        assert_eq!(first, mesh.fields.residual_all());
        let total: f64 = first.iter().sum();
        assert_relative_eq!(total, 0.0, epsilon = 1e-12);
    }
}
