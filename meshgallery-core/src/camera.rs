/// Camera, viewport and picking-ray utilities
use nalgebra::{Isometry3, Matrix4, Perspective3, Point2, Point3, Vector3};

/// Drawable area in pixels. Dimensions never drop below one pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    width: f32,
    height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: clamp_dimension(width),
            height: clamp_dimension(height),
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }

    /// Pixel coordinates (origin top-left) to normalized device coordinates
    pub fn to_ndc(&self, pixel: Point2<f32>) -> Point2<f32> {
        Point2::new(
            pixel.x / self.width * 2.0 - 1.0,
            1.0 - pixel.y / self.height * 2.0,
        )
    }

    pub fn from_ndc(&self, ndc: Point2<f32>) -> Point2<f32> {
        Point2::new(
            (ndc.x + 1.0) * 0.5 * self.width,
            (1.0 - ndc.y) * 0.5 * self.height,
        )
    }
}

fn clamp_dimension(value: f32) -> f32 {
    if value.is_finite() {
        value.max(1.0)
    } else {
        1.0
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

/// A half-line used for hit-testing
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Point3<f32>,
    /// Unit length
    pub direction: Vector3<f32>,
}

impl Ray {
    /// Distance along the ray to the first sphere surface crossing, if any.
    /// A ray starting inside the sphere hits at distance zero.
    pub fn intersect_sphere(&self, center: &Point3<f32>, radius: f32) -> Option<f32> {
        let to_center = center - self.origin;
        let along = to_center.dot(&self.direction);
        let closest_sq = to_center.norm_squared() - along * along;
        let radius_sq = radius * radius;
        if closest_sq > radius_sq {
            return None;
        }
        let half_chord = (radius_sq - closest_sq).sqrt();
        let (near, far) = (along - half_chord, along + half_chord);
        if far < 0.0 {
            None
        } else {
            Some(near.max(0.0))
        }
    }
}

/// Perspective camera for 3D rendering
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    /// Vertical field of view in radians
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(viewport: Viewport, fov: f32) -> Self {
        Self {
            position: Point3::new(0.0, 0.0, 5.0),
            target: Point3::origin(),
            up: Vector3::y(),
            fov,
            aspect: viewport.aspect(),
            near: 0.1,
            far: 1000.0,
        }
    }

    fn view(&self) -> Isometry3<f32> {
        Isometry3::look_at_rh(&self.position, &self.target, &self.up)
    }

    fn perspective(&self) -> Perspective3<f32> {
        Perspective3::new(self.aspect, self.fov, self.near, self.far)
    }

    /// Create the view matrix (camera transformation)
    pub fn view_matrix(&self) -> Matrix4<f32> {
        self.view().to_homogeneous()
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        self.perspective().to_homogeneous()
    }

    /// Unit vector from the camera towards its target
    pub fn forward(&self) -> Vector3<f32> {
        (self.target - self.position)
            .try_normalize(1e-9)
            .unwrap_or_else(|| -Vector3::z())
    }

    /// Project a world-space point to pixel coordinates plus NDC depth.
    ///
    /// Points behind the camera yield `None`; points outside the viewport are
    /// still returned so callers can anchor overlays at the edges.
    pub fn project(&self, point: &Point3<f32>, viewport: Viewport) -> Option<Point3<f32>> {
        let in_view = self.view().transform_point(point);
        if in_view.z >= -1e-6 {
            return None;
        }
        let ndc = self.perspective().project_point(&in_view);
        let pixel = viewport.from_ndc(Point2::new(ndc.x, ndc.y));
        Some(Point3::new(pixel.x, pixel.y, ndc.z))
    }

    /// Ray from the eye through a pixel
    pub fn ray_through(&self, pixel: Point2<f32>, viewport: Viewport) -> Ray {
        let ndc = viewport.to_ndc(pixel);
        let half_height = (self.fov / 2.0).tan();
        let in_view = Vector3::new(ndc.x * half_height * self.aspect, ndc.y * half_height, -1.0);
        let direction = self.view().inverse_transform_vector(&in_view).normalize();
        Ray {
            origin: self.position,
            direction,
        }
    }
}
