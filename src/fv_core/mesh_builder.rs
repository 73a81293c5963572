use std::collections::HashMap;

use crate::error::{Result, SolverError};
use crate::fv_core::condition::BoundaryCondition;
use crate::fv_core::geometry::{Point, Shape, Surface, Vector, VtkType};
use crate::fv_core::mesh::{Boundary, Cell, Face, FaceNeighbor, Grid, Mesh};

/// Topology and coordinates of one cell. `points` normally repeat the node
/// coordinates; periodic meshes use them to keep the true geometry of cells
/// whose node ids wrap around.
pub struct CellSpec {
    pub vtk_type: VtkType,
    pub nodes: Vec<usize>,
    pub points: Vec<Point>,
}

/// Assembles cells into a face-connected mesh by matching faces through
/// their node sets and positions; across a periodic seam the positions
/// differ by one rigid translation. Faces seen only once become boundary faces and are
/// tagged by a classifier.
pub struct MeshBuilder {
    dimension: usize,
    nodes: Vec<Point>,
    cells: Vec<CellSpec>,
    boundaries: Vec<(String, Box<dyn BoundaryCondition>)>,
}

struct PendingFace {
    nodes: Vec<usize>,
    points: Vec<Point>,
    surface: Surface,
    left: usize,
    right: Option<usize>,
    right_offset: Vector,
}

impl PendingFace {
    /// Translation carrying `points` onto this face when both list the same
    /// nodes at rigidly shifted positions. Zero for an interior face, a
    /// period across a seam, `None` for a different face on the same nodes.
    fn translation_onto(&self, nodes: &[usize], points: &[Point]) -> Option<Vector> {
        let size = (self.points[1] - self.points[0]).norm();
        let mut translation: Option<Vector> = None;
        for (n, p) in nodes.iter().zip(points) {
            let k = self.nodes.iter().position(|m| m == n)?;
            let d = self.points[k] - *p;
            if let Some(t) = translation {
                if (d - t).norm() > 1e-8 * size {
                    return None;
                }
            } else {
                translation = Some(d);
            }
        }
        translation
    }
}

impl MeshBuilder {
    pub fn new(dimension: usize, nodes: Vec<Point>) -> Self {
        MeshBuilder {
            dimension,
            nodes,
            cells: Vec::new(),
            boundaries: Vec::new(),
        }
    }

    pub fn add_cell(&mut self, vtk_type: VtkType, nodes: Vec<usize>) -> Result<&mut Self> {
        let mut points = Vec::with_capacity(nodes.len());
        for &n in nodes.iter() {
            let p = self.nodes.get(n).ok_or_else(|| {
                SolverError::Config(format!("cell references missing node {}", n))
            })?;
            points.push(*p);
        }
        self.add_cell_with_points(vtk_type, nodes, points)
    }

    pub fn add_cell_with_points(
        &mut self,
        vtk_type: VtkType,
        nodes: Vec<usize>,
        points: Vec<Point>,
    ) -> Result<&mut Self> {
        let admissible = match self.dimension {
            2 => matches!(vtk_type, VtkType::Triangle | VtkType::Quad),
            3 => vtk_type.is_volumetric(),
            _ => false,
        };
        if !admissible {
            return Err(SolverError::Config(format!(
                "{:?} cell in a {}D mesh",
                vtk_type, self.dimension
            )));
        }
        self.cells.push(CellSpec {
            vtk_type,
            nodes,
            points,
        });
        Ok(self)
    }

    pub fn boundary(mut self, name: &str, condition: Box<dyn BoundaryCondition>) -> Self {
        self.boundaries.push((name.to_string(), condition));
        self
    }

    /// `classify` receives the node ids and surface of every unmatched face
    /// and returns the name of the boundary it belongs to.
    pub fn build<F>(self, num_vars: usize, classify: F) -> Result<Mesh>
    where
        F: Fn(&[usize], &Surface) -> String,
    {
        let MeshBuilder {
            dimension,
            nodes,
            cells: specs,
            boundaries,
        } = self;

        let mut cells: Vec<Cell> = Vec::with_capacity(specs.len());
        let mut pending: Vec<PendingFace> = Vec::new();
        // Periodic wrapping can give distinct faces the same node set, so a
        // key maps to every face seen with it.
        let mut lookup: HashMap<Vec<usize>, Vec<usize>> = HashMap::new();

        for (index, mut spec) in specs.into_iter().enumerate() {
            if dimension == 2 {
                orient_counter_clockwise(&mut spec);
            }
            let shape = Shape::new(spec.vtk_type, spec.points.clone())?;
            let mut cell_faces = Vec::new();
            for local in spec.vtk_type.face_node_lists() {
                let face_nodes: Vec<usize> = local.iter().map(|&k| spec.nodes[k]).collect();
                let points: Vec<Point> = local.iter().map(|&k| spec.points[k]).collect();
                let mut key = face_nodes.clone();
                key.sort_unstable();
                let candidates = lookup.entry(key).or_default();
                let matched = candidates.iter().copied().find_map(|f| {
                    let face = &pending[f];
                    if face.left == index {
                        return None;
                    }
                    face.translation_onto(&face_nodes, &points).map(|t| (f, t))
                });
                match matched {
                    Some((f, _)) if pending[f].right.is_some() => {
                        return Err(SolverError::Config(format!(
                            "face with nodes {:?} is shared by more than two cells",
                            face_nodes
                        )));
                    }
                    Some((f, offset)) => {
                        let face = &mut pending[f];
                        face.right = Some(index);
                        face.right_offset = offset;
                        cell_faces.push(f);
                    }
                    None => {
                        let surface = if dimension == 2 {
                            Surface::edge(&points[0], &points[1])
                        } else {
                            Surface::polygon(&points)
                        };
                        candidates.push(pending.len());
                        cell_faces.push(pending.len());
                        pending.push(PendingFace {
                            nodes: face_nodes,
                            points,
                            surface,
                            left: index,
                            right: None,
                            right_offset: Vector::zeros(),
                        });
                    }
                }
            }
            cells.push(Cell {
                index,
                nodes: spec.nodes,
                faces: cell_faces,
                shape,
            });
        }

        let mut boundary_faces: Vec<Vec<usize>> = vec![Vec::new(); boundaries.len()];
        let mut faces = Vec::with_capacity(pending.len());
        let mut slot = 0;
        for (index, p) in pending.into_iter().enumerate() {
            let right = match p.right {
                Some(c) => FaceNeighbor::Cell(c),
                None => {
                    let name = classify(&p.nodes, &p.surface);
                    let boundary = boundaries
                        .iter()
                        .position(|(n, _)| *n == name)
                        .ok_or(SolverError::UnknownBoundary(name))?;
                    boundary_faces[boundary].push(index);
                    slot += 1;
                    FaceNeighbor::Ghost {
                        boundary,
                        slot: slot - 1,
                    }
                }
            };
            faces.push(Face {
                index,
                nodes: p.nodes,
                surface: p.surface,
                left: p.left,
                right,
                right_offset: p.right_offset,
            });
        }

        let boundaries = boundaries
            .into_iter()
            .zip(boundary_faces)
            .map(|((name, condition), faces)| Boundary {
                name,
                condition,
                faces,
            })
            .collect();

        let grid = Grid {
            dimension,
            nodes,
            cells,
            faces,
        };
        Ok(Mesh::new(grid, boundaries, num_vars))
    }
}

fn orient_counter_clockwise(spec: &mut CellSpec) {
    if Surface::polygon(&spec.points).unit_normal.z < 0.0 {
        spec.nodes.reverse();
        spec.points.reverse();
    }
}

/// Logical sides of a structured 2D mesh, used as boundary names.
pub const XI_MIN: &str = "xi_min";
pub const XI_MAX: &str = "xi_max";
pub const ETA_MIN: &str = "eta_min";
pub const ETA_MAX: &str = "eta_max";

/// Quadrilateral mesh from a logically rectangular node array `nodes[i][j]`.
/// A periodic direction wraps its last cell layer onto the first, so that
/// side has no boundary faces.
pub struct Structured2D {
    pub nodes: Vec<Vec<Point>>,
    pub periodic_xi: bool,
    pub periodic_eta: bool,
}

impl Structured2D {
    /// Uniform Cartesian grid over `[min_x, min_x + lx] x [min_y, min_y + ly]`.
    pub fn cartesian(min: (f64, f64), lengths: (f64, f64), num_cells: (usize, usize)) -> Self {
        let (nx, ny) = (num_cells.0 + 1, num_cells.1 + 1);
        let nodes = (0..nx)
            .map(|i| {
                let x = min.0 + i as f64 / (nx as f64 - 1.0) * lengths.0;
                (0..ny)
                    .map(|j| {
                        let y = min.1 + j as f64 / (ny as f64 - 1.0) * lengths.1;
                        Point::new(x, y, 0.0)
                    })
                    .collect()
            })
            .collect();
        Structured2D {
            nodes,
            periodic_xi: false,
            periodic_eta: false,
        }
    }

    pub fn periodic(mut self, xi: bool, eta: bool) -> Self {
        self.periodic_xi = xi;
        self.periodic_eta = eta;
        self
    }

    pub fn build(
        self,
        num_vars: usize,
        boundaries: Vec<(&str, Box<dyn BoundaryCondition>)>,
    ) -> Result<Mesh> {
        let ni = self.nodes.len();
        let nj = self.nodes.first().map_or(0, |col| col.len());
        if ni < 2 || nj < 2 || self.nodes.iter().any(|col| col.len() != nj) {
            return Err(SolverError::Config(
                "structured mesh needs a rectangular node array of at least 2x2".to_string(),
            ));
        }
        if (self.periodic_xi && ni < 3) || (self.periodic_eta && nj < 3) {
            return Err(SolverError::Config(
                "a periodic direction needs at least 2 cells".to_string(),
            ));
        }
        // Number of distinct node columns/rows once periodic wrapping applies.
        let ui = if self.periodic_xi { ni - 1 } else { ni };
        let uj = if self.periodic_eta { nj - 1 } else { nj };
        let id = |i: usize, j: usize| (i % ui) * uj + (j % uj);

        let mut unique = vec![Point::origin(); ui * uj];
        for i in 0..ui {
            for j in 0..uj {
                unique[id(i, j)] = self.nodes[i][j];
            }
        }

        let mut builder = MeshBuilder::new(2, unique);
        for i in 0..ni - 1 {
            for j in 0..nj - 1 {
                let corners = [(i, j), (i + 1, j), (i + 1, j + 1), (i, j + 1)];
                let ids = corners.iter().map(|&(a, b)| id(a, b)).collect();
                let points = corners.iter().map(|&(a, b)| self.nodes[a][b]).collect();
                builder.add_cell_with_points(VtkType::Quad, ids, points)?;
            }
        }
        for (name, condition) in boundaries {
            builder = builder.boundary(name, condition);
        }

        let (periodic_xi, periodic_eta) = (self.periodic_xi, self.periodic_eta);
        builder.build(num_vars, move |face_nodes, _| {
            let all = |pred: &dyn Fn(usize, usize) -> bool| {
                face_nodes.iter().all(|&n| pred(n / uj, n % uj))
            };
            let side = if !periodic_xi && all(&|i, _| i == 0) {
                XI_MIN
            } else if !periodic_xi && all(&|i, _| i == ui - 1) {
                XI_MAX
            } else if !periodic_eta && all(&|_, j| j == 0) {
                ETA_MIN
            } else {
                ETA_MAX
            };
            side.to_string()
        })
    }
}
