/// Model transforms for placing meshes in the gallery
use nalgebra::{Matrix4, Point3, Vector3};

/// Rotation state around three axes (in radians)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationState {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl RotationState {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Rotate by delta amounts (in radians), keeping each angle in [-π, π)
    pub fn rotate(&mut self, dx: f32, dy: f32, dz: f32) {
        self.x = wrap_angle(self.x + dx);
        self.y = wrap_angle(self.y + dy);
        self.z = wrap_angle(self.z + dz);
    }
}

impl Default for RotationState {
    fn default() -> Self {
        Self::zero()
    }
}

fn wrap_angle(angle: f32) -> f32 {
    use std::f32::consts::PI;
    if angle.is_finite() {
        (angle + PI).rem_euclid(2.0 * PI) - PI
    } else {
        0.0
    }
}

/// Transform builder for 3D transformations
pub struct Transform;

impl Transform {
    /// Create a rotation matrix from a rotation state, applied Z, Y, X
    pub fn rotation_matrix(rotation: &RotationState) -> Matrix4<f32> {
        let rx = Matrix4::new_rotation(Vector3::new(rotation.x, 0.0, 0.0));
        let ry = Matrix4::new_rotation(Vector3::new(0.0, rotation.y, 0.0));
        let rz = Matrix4::new_rotation(Vector3::new(0.0, 0.0, rotation.z));
        rz * ry * rx
    }

    /// Model matrix that recentres a mesh on its bounding-box centre, scales
    /// it uniformly, spins it and moves it to `position`
    pub fn placement(
        position: &Point3<f32>,
        rotation: &RotationState,
        scale: f32,
        mesh_center: &Point3<f32>,
    ) -> Matrix4<f32> {
        Matrix4::new_translation(&position.coords)
            * Self::rotation_matrix(rotation)
            * Matrix4::new_scaling(scale)
            * Matrix4::new_translation(&-mesh_center.coords)
    }
}
