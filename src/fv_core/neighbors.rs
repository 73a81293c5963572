use crate::fv_core::geometry::{Point, Vector};
use crate::fv_core::mesh::{Cell, FaceNeighbor, Grid};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub cell: usize,
    /// Translation taking the neighbor's geometry into the frame of the
    /// stencil owner (nonzero across periodic seams).
    pub offset: Vector,
}

/// Per-cell neighbor lists, indexed by cell index.
pub type Stencil = Vec<Vec<Neighbor>>;

pub trait CellNeighborCalculator {
    fn calculate(&self, grid: &Grid) -> Stencil;
}

/// Cells sharing a face. Ghosts are not part of the stencil.
pub struct FaceBasedCellNeighbors;

/// Cells sharing at least one node.
pub struct NodeBasedCellNeighbors;

impl CellNeighborCalculator for FaceBasedCellNeighbors {
    fn calculate(&self, grid: &Grid) -> Stencil {
        grid.cells()
            .iter()
            .map(|cell| {
                cell.faces
                    .iter()
                    .filter_map(|&f| {
                        let face = &grid.faces[f];
                        match face.right {
                            FaceNeighbor::Cell(r) if face.left == cell.index => Some(Neighbor {
                                cell: r,
                                offset: face.right_offset,
                            }),
                            FaceNeighbor::Cell(_) => Some(Neighbor {
                                cell: face.left,
                                offset: -face.right_offset,
                            }),
                            FaceNeighbor::Ghost { .. } => None,
                        }
                    })
                    .collect()
            })
            .collect()
    }
}

impl CellNeighborCalculator for NodeBasedCellNeighbors {
    fn calculate(&self, grid: &Grid) -> Stencil {
        let mut node_cells: Vec<Vec<usize>> = vec![Vec::new(); grid.nodes.len()];
        for cell in grid.cells() {
            for &n in &cell.nodes {
                if !node_cells[n].contains(&cell.index) {
                    node_cells[n].push(cell.index);
                }
            }
        }
        grid.cells()
            .iter()
            .map(|cell| {
                let mut stencil: Vec<Neighbor> = Vec::new();
                for (k, &n) in cell.nodes.iter().enumerate() {
                    for &c in &node_cells[n] {
                        if c == cell.index || stencil.iter().any(|s| s.cell == c) {
                            continue;
                        }
                        if let Some(p) = node_point(&grid[c], n) {
                            let offset = cell.shape.points()[k] - p;
                            stencil.push(Neighbor { cell: c, offset });
                        }
                    }
                }
                stencil.sort_by_key(|s| s.cell);
                stencil
            })
            .collect()
    }
}

// Position of `node` in the geometry of `cell`, if the cell uses it.
fn node_point(cell: &Cell, node: usize) -> Option<Point> {
    cell.nodes
        .iter()
        .zip(cell.shape.points())
        .find(|&(&n, _)| n == node)
        .map(|(_, p)| *p)
}
