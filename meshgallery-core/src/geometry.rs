/// Geometry primitives for 3D rendering
use nalgebra::{Point3, Vector3};

/// A 3D vertex with position and normal
#[derive(Debug, Clone, Copy)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
}

impl Vertex {
    pub fn new(x: f32, y: f32, z: f32, nx: f32, ny: f32, nz: f32) -> Self {
        Self {
            position: Point3::new(x, y, z),
            normal: Vector3::new(nx, ny, nz),
        }
    }
}

/// A triangle face defined by three vertices
#[derive(Debug, Clone)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

impl Triangle {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    /// Face normal from the winding order; zero for degenerate faces
    pub fn calculate_normal(&self) -> Vector3<f32> {
        let [v0, v1, v2] = self.vertices.map(|v| v.position);
        (v1 - v0)
            .cross(&(v2 - v0))
            .try_normalize(1e-12)
            .unwrap_or_else(Vector3::zeros)
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    pub fn center(&self) -> Point3<f32> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn extent(&self) -> Vector3<f32> {
        self.max - self.min
    }

    pub fn longest_dimension(&self) -> f32 {
        self.extent().max()
    }
}

/// A 3D mesh composed of triangles
#[derive(Debug, Clone)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            triangles: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            triangles: Vec::with_capacity(capacity),
        }
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    /// Bounds over every vertex, `None` for an empty mesh
    pub fn bounds(&self) -> Option<Aabb> {
        let mut points = self
            .triangles
            .iter()
            .flat_map(|t| t.vertices.iter().map(|v| v.position));
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), p| {
            (min.inf(&p), max.sup(&p))
        });
        Some(Aabb { min, max })
    }

    /// Axis-aligned box with the given dimensions, centred on the origin
    pub fn cuboid(sx: f32, sy: f32, sz: f32) -> Self {
        let (hx, hy, hz) = (sx / 2.0, sy / 2.0, sz / 2.0);
        let corner = |x: f32, y: f32, z: f32| Point3::new(x * hx, y * hy, z * hz);
        // (normal, four corners counter-clockwise seen from outside)
        let faces = [
            (Vector3::z(), [(-1., -1., 1.), (1., -1., 1.), (1., 1., 1.), (-1., 1., 1.)]),
            (-Vector3::z(), [(1., -1., -1.), (-1., -1., -1.), (-1., 1., -1.), (1., 1., -1.)]),
            (Vector3::y(), [(-1., 1., 1.), (1., 1., 1.), (1., 1., -1.), (-1., 1., -1.)]),
            (-Vector3::y(), [(-1., -1., -1.), (1., -1., -1.), (1., -1., 1.), (-1., -1., 1.)]),
            (Vector3::x(), [(1., -1., 1.), (1., -1., -1.), (1., 1., -1.), (1., 1., 1.)]),
            (-Vector3::x(), [(-1., -1., -1.), (-1., -1., 1.), (-1., 1., 1.), (-1., 1., -1.)]),
        ];

        let mut mesh = Self::with_capacity(12);
        for (n, quad) in faces {
            let v = quad.map(|(x, y, z)| {
                let p = corner(x, y, z);
                Vertex::new(p.x, p.y, p.z, n.x, n.y, n.z)
            });
            mesh.add_triangle(Triangle::new(v[0], v[1], v[2]));
            mesh.add_triangle(Triangle::new(v[0], v[2], v[3]));
        }
        mesh
    }

    pub fn cube(size: f32) -> Self {
        Self::cuboid(size, size, size)
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}
