use std::ops::Index;

use crate::error::{ensure_len, Result};
use crate::fv_core::condition::BoundaryCondition;
use crate::fv_core::geometry::{Point, Shape, Surface, Vector, VtkType};

pub struct Cell {
    pub index: usize,
    pub nodes: Vec<usize>,
    pub faces: Vec<usize>,
    pub shape: Shape,
}

impl Cell {
    pub fn vtk_type(&self) -> VtkType {
        self.shape.vtk_type()
    }

    pub fn volume(&self) -> f64 {
        self.shape.volume()
    }

    pub fn centroid(&self) -> Point {
        self.shape.centroid()
    }
}

/// What sits on the right-hand side of a face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceNeighbor {
    Cell(usize),
    /// Boundary face: `slot` indexes the ghost state owned by this face,
    /// `boundary` the boundary condition that writes it.
    Ghost { boundary: usize, slot: usize },
}

pub struct Face {
    pub index: usize,
    pub nodes: Vec<usize>,
    pub surface: Surface,
    pub left: usize,
    pub right: FaceNeighbor,
    /// Translation taking the right cell's geometry into the frame of the
    /// left cell. Nonzero only across periodic seams.
    pub right_offset: Vector,
}

impl Face {
    pub fn is_boundary(&self) -> bool {
        matches!(self.right, FaceNeighbor::Ghost { .. })
    }

    pub fn unit_normal(&self) -> &Vector {
        &self.surface.unit_normal
    }

    pub fn area(&self) -> f64 {
        self.surface.area
    }

    pub fn centroid(&self) -> &Point {
        &self.surface.centroid
    }

    /// Centroid of the right-hand side as seen from the left cell: the
    /// neighbor centroid, or the mirror image of the left centroid for a
    /// ghost.
    pub fn right_centroid(&self, grid: &Grid) -> Point {
        match self.right {
            FaceNeighbor::Cell(r) => grid[r].centroid() + self.right_offset,
            FaceNeighbor::Ghost { .. } => self.mirror(&grid[self.left].centroid()),
        }
    }

    /// Mirror image of `point` through the face plane.
    pub fn mirror(&self, point: &Point) -> Point {
        let n = self.surface.unit_normal;
        let d = (self.surface.centroid.coords - point.coords).dot(&n);
        Point::from(point.coords + n * (2.0 * d))
    }
}

/// Immutable nodes, cells and faces of a mesh.
pub struct Grid {
    pub dimension: usize,
    pub nodes: Vec<Point>,
    pub cells: Vec<Cell>,
    pub faces: Vec<Face>,
}

impl Grid {
    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn num_ghosts(&self) -> usize {
        self.faces.iter().filter(|f| f.is_boundary()).count()
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn node(&self, i: usize) -> &Point {
        &self.nodes[i]
    }
}

impl Index<usize> for Grid {
    type Output = Cell;

    fn index(&self, index: usize) -> &Self::Output {
        &self.cells[index]
    }
}

/// Dense per-cell arrays, indexed by cell index (and by ghost slot for the
/// boundary ghost states).
pub struct CellFields {
    num_vars: usize,
    u: Vec<f64>,
    residual: Vec<f64>,
    dt: Vec<f64>,
    gradient: Vec<Vector>,
    coeffs: Vec<Vector>,
    ghost_u: Vec<f64>,
}

impl CellFields {
    pub fn new(num_cells: usize, num_ghosts: usize, num_vars: usize) -> Self {
        CellFields {
            num_vars,
            u: vec![0.0; num_cells * num_vars],
            residual: vec![0.0; num_cells * num_vars],
            dt: vec![0.0; num_cells],
            gradient: vec![Vector::zeros(); num_cells * num_vars],
            coeffs: vec![Vector::zeros(); num_cells * num_vars],
            ghost_u: vec![0.0; num_ghosts * num_vars],
        }
    }

    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    pub fn num_cells(&self) -> usize {
        self.dt.len()
    }

    fn range(&self, i: usize) -> std::ops::Range<usize> {
        i * self.num_vars..(i + 1) * self.num_vars
    }

    pub fn u(&self, cell: usize) -> &[f64] {
        &self.u[self.range(cell)]
    }

    pub fn u_mut(&mut self, cell: usize) -> &mut [f64] {
        let r = self.range(cell);
        &mut self.u[r]
    }

    pub fn set_u(&mut self, cell: usize, values: &[f64]) -> Result<()> {
        ensure_len("cell state", self.num_vars, values.len())?;
        self.u_mut(cell).copy_from_slice(values);
        Ok(())
    }

    /// Whole state field, cell-major.
    pub fn u_all(&self) -> &[f64] {
        &self.u
    }

    pub fn u_all_mut(&mut self) -> &mut [f64] {
        &mut self.u
    }

    pub fn residual(&self, cell: usize) -> &[f64] {
        &self.residual[self.range(cell)]
    }

    pub fn residual_mut(&mut self, cell: usize) -> &mut [f64] {
        let r = self.range(cell);
        &mut self.residual[r]
    }

    pub fn residual_all(&self) -> &[f64] {
        &self.residual
    }

    pub fn residual_all_mut(&mut self) -> &mut [f64] {
        &mut self.residual
    }

    pub fn zero_residuals(&mut self) {
        self.residual.iter_mut().for_each(|r| *r = 0.0);
    }

    pub fn dt(&self, cell: usize) -> f64 {
        self.dt[cell]
    }

    pub fn set_dt(&mut self, cell: usize, dt: f64) {
        self.dt[cell] = dt;
    }

    pub fn gradient(&self, cell: usize) -> &[Vector] {
        &self.gradient[self.range(cell)]
    }

    pub fn gradient_mut(&mut self, cell: usize) -> &mut [Vector] {
        let r = self.range(cell);
        &mut self.gradient[r]
    }

    pub fn coeffs(&self, cell: usize) -> &[Vector] {
        &self.coeffs[self.range(cell)]
    }

    pub fn coeffs_mut(&mut self, cell: usize) -> &mut [Vector] {
        let r = self.range(cell);
        &mut self.coeffs[r]
    }

    pub fn ghost(&self, slot: usize) -> &[f64] {
        &self.ghost_u[self.range(slot)]
    }

    /// Interior state of `cell` together with the writable ghost state in
    /// `slot`.
    pub fn interior_and_ghost_mut(&mut self, cell: usize, slot: usize) -> (&[f64], &mut [f64]) {
        let (ri, rg) = (self.range(cell), self.range(slot));
        (&self.u[ri], &mut self.ghost_u[rg])
    }
}

/// A named group of boundary faces sharing one boundary condition.
pub struct Boundary {
    pub name: String,
    pub condition: Box<dyn BoundaryCondition>,
    pub faces: Vec<usize>,
}

pub struct Mesh {
    pub grid: Grid,
    pub boundaries: Vec<Boundary>,
    pub fields: CellFields,
}

impl Mesh {
    pub fn new(grid: Grid, boundaries: Vec<Boundary>, num_vars: usize) -> Self {
        let fields = CellFields::new(grid.num_cells(), grid.num_ghosts(), num_vars);
        Mesh {
            grid,
            boundaries,
            fields,
        }
    }

    pub fn num_cells(&self) -> usize {
        self.grid.num_cells()
    }

    pub fn num_vars(&self) -> usize {
        self.fields.num_vars()
    }

    pub fn dimension(&self) -> usize {
        self.grid.dimension
    }

    pub fn boundary(&self, name: &str) -> Option<&Boundary> {
        self.boundaries.iter().find(|b| b.name == name)
    }

    /// Lets every boundary condition write the ghost states of its faces.
    pub fn set_ghost_cell_values(&mut self, time: f64) {
        let Mesh {
            grid,
            boundaries,
            fields,
        } = self;
        for face in grid.faces.iter() {
            if let FaceNeighbor::Ghost { boundary, slot } = face.right {
                let (inside, ghost) = fields.interior_and_ghost_mut(face.left, slot);
                boundaries[boundary]
                    .condition
                    .set_ghost_cell_values(face, inside, ghost, time);
            }
        }
    }

    /// State on the right-hand side of a face: neighbor cell average or the
    /// ghost state.
    pub fn right_state(&self, face: &Face) -> &[f64] {
        match face.right {
            FaceNeighbor::Cell(c) => self.fields.u(c),
            FaceNeighbor::Ghost { slot, .. } => self.fields.ghost(slot),
        }
    }

    /// Sum of `U * volume` over all cells, per variable.
    pub fn integral(&self) -> Vec<f64> {
        let mut total = vec![0.0; self.num_vars()];
        for cell in self.grid.cells() {
            for (t, u) in total.iter_mut().zip(self.fields.u(cell.index)) {
                *t += u * cell.volume();
            }
        }
        total
    }
}
