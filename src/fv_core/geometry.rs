extern crate nalgebra as na;

use crate::error::{Result, SolverError};

pub type Point = na::Point3<f64>;
pub type Vector = na::Vector3<f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VtkType {
    Line,
    Triangle,
    Quad,
    Tetra,
    Hexahedron,
    Wedge,
    Pyramid,
}

impl VtkType {
    pub fn id(&self) -> u8 {
        match self {
            VtkType::Line => 3,
            VtkType::Triangle => 5,
            VtkType::Quad => 9,
            VtkType::Tetra => 10,
            VtkType::Hexahedron => 12,
            VtkType::Wedge => 13,
            VtkType::Pyramid => 14,
        }
    }

    pub fn num_points(&self) -> usize {
        match self {
            VtkType::Line => 2,
            VtkType::Triangle => 3,
            VtkType::Quad => 4,
            VtkType::Tetra => 4,
            VtkType::Hexahedron => 8,
            VtkType::Wedge => 6,
            VtkType::Pyramid => 5,
        }
    }

    pub fn is_volumetric(&self) -> bool {
        matches!(
            self,
            VtkType::Tetra | VtkType::Hexahedron | VtkType::Wedge | VtkType::Pyramid
        )
    }

    fn name(&self) -> &'static str {
        match self {
            VtkType::Line => "line",
            VtkType::Triangle => "triangle",
            VtkType::Quad => "quad",
            VtkType::Tetra => "tetrahedron",
            VtkType::Hexahedron => "hexahedron",
            VtkType::Wedge => "wedge",
            VtkType::Pyramid => "pyramid",
        }
    }

    /// Local node lists of the bounding faces, ordered so that the right-hand
    /// rule gives an outward normal.
    pub fn face_node_lists(&self) -> Vec<Vec<usize>> {
        match self {
            VtkType::Line => vec![vec![0], vec![1]],
            VtkType::Triangle => vec![vec![0, 1], vec![1, 2], vec![2, 0]],
            VtkType::Quad => vec![vec![0, 1], vec![1, 2], vec![2, 3], vec![3, 0]],
            VtkType::Tetra => vec![
                vec![0, 2, 1],
                vec![0, 1, 3],
                vec![1, 2, 3],
                vec![0, 3, 2],
            ],
            VtkType::Hexahedron => vec![
                vec![0, 3, 2, 1],
                vec![4, 5, 6, 7],
                vec![1, 2, 6, 5],
                vec![0, 4, 7, 3],
                vec![0, 1, 5, 4],
                vec![3, 7, 6, 2],
            ],
            VtkType::Wedge => vec![
                vec![0, 2, 1],
                vec![3, 4, 5],
                vec![0, 1, 4, 3],
                vec![1, 2, 5, 4],
                vec![2, 0, 3, 5],
            ],
            VtkType::Pyramid => vec![
                vec![0, 3, 2, 1],
                vec![0, 1, 4],
                vec![1, 2, 4],
                vec![2, 3, 4],
                vec![3, 0, 4],
            ],
        }
    }
}

/// Area, unit normal and centroid of a face.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pub area: f64,
    pub unit_normal: Vector,
    pub centroid: Point,
}

impl Surface {
    pub fn new(area: f64, unit_normal: Vector, centroid: Point) -> Self {
        Surface {
            area,
            unit_normal,
            centroid,
        }
    }

    /// Surface of a planar (or nearly planar) polygon, normal by the
    /// right-hand rule over the point order.
    pub fn polygon(points: &[Point]) -> Self {
        let origin = points[0];
        let mut area_vector = Vector::zeros();
        let mut weighted = Vector::zeros();
        let mut fan_area = 0.0;
        for k in 1..points.len() - 1 {
            let tri = 0.5 * (points[k] - origin).cross(&(points[k + 1] - origin));
            let tri_centroid = (origin.coords + points[k].coords + points[k + 1].coords) / 3.0;
            weighted += tri.norm() * tri_centroid;
            fan_area += tri.norm();
            area_vector += tri;
        }
        let area = area_vector.norm();
        Surface {
            area,
            unit_normal: area_vector / area,
            centroid: Point::from(weighted / fan_area),
        }
    }

    /// Edge of a 2D cell seen as a face of unit depth; the normal lies in
    /// the xy-plane pointing to the right of the direction `p0 -> p1`.
    pub fn edge(p0: &Point, p1: &Point) -> Self {
        let d = p1 - p0;
        let length = d.norm();
        Surface {
            area: length,
            unit_normal: Vector::new(d.y, -d.x, 0.0) / length,
            centroid: na::center(p0, p1),
        }
    }
}

/// Geometric descriptor of a cell.
#[derive(Debug, Clone)]
pub struct Shape {
    vtk_type: VtkType,
    points: Vec<Point>,
    volume: f64,
    centroid: Point,
}

impl Shape {
    pub fn new(vtk_type: VtkType, points: Vec<Point>) -> Result<Self> {
        if points.len() != vtk_type.num_points() {
            return Err(SolverError::DimensionMismatch {
                what: "shape points",
                expected: vtk_type.num_points(),
                found: points.len(),
            });
        }
        let (volume, centroid) = match vtk_type {
            VtkType::Line => {
                let d = points[1] - points[0];
                (d.norm(), na::center(&points[0], &points[1]))
            }
            VtkType::Triangle | VtkType::Quad => {
                let s = Surface::polygon(&points);
                (s.area, s.centroid)
            }
            _ => polyhedron_volume_centroid(vtk_type, &points),
        };
        Ok(Shape {
            vtk_type,
            points,
            volume,
            centroid,
        })
    }

    pub fn vtk_type(&self) -> VtkType {
        self.vtk_type
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Volume of a 3D cell, area of a 2D cell (unit depth), length of a line.
    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn centroid(&self) -> Point {
        self.centroid
    }

    pub fn length(&self) -> Result<f64> {
        match self.vtk_type {
            VtkType::Line => Ok(self.volume),
            other => Err(undefined("length", other)),
        }
    }

    pub fn area(&self) -> Result<f64> {
        match self.vtk_type {
            VtkType::Triangle | VtkType::Quad => Ok(self.volume),
            other => Err(undefined("area", other)),
        }
    }

    pub fn unit_normal(&self) -> Result<Vector> {
        match self.vtk_type {
            VtkType::Triangle | VtkType::Quad => Ok(Surface::polygon(&self.points).unit_normal),
            other => Err(undefined("normal", other)),
        }
    }
}

fn undefined(operation: &'static str, vtk_type: VtkType) -> SolverError {
    SolverError::UndefinedGeometry {
        operation,
        shape: vtk_type.name(),
    }
}

// Divergence theorem over a fan triangulation of the outward-oriented faces.
fn polyhedron_volume_centroid(vtk_type: VtkType, points: &[Point]) -> (f64, Point) {
    let mut volume = 0.0;
    let mut moment = Vector::zeros();
    for face in vtk_type.face_node_lists() {
        let p0 = points[face[0]].coords;
        for k in 1..face.len() - 1 {
            let p1 = points[face[k]].coords;
            let p2 = points[face[k + 1]].coords;
            let n = (p1 - p0).cross(&(p2 - p0));
            volume += n.dot(&(p0 + p1 + p2)) / 18.0;
            let sq = |i: usize| {
                (p0[i] + p1[i]).powi(2) + (p1[i] + p2[i]).powi(2) + (p2[i] + p0[i]).powi(2)
            };
            moment += Vector::new(n.x * sq(0), n.y * sq(1), n.z * sq(2)) / 48.0;
        }
    }
    (volume, Point::from(moment / volume))
}
