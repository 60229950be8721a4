/// Hover highlight and tooltip anchoring
use nalgebra::{Point3, Vector3};

use crate::camera::{Camera, Viewport};
use crate::config::{GlowConfig, SceneConfig};
use crate::registry::{ObjectId, SceneObject};

/// Tooltip data for the object under the pointer
#[derive(Debug, Clone, PartialEq)]
pub struct HoverInfo {
    pub id: ObjectId,
    pub name: String,
    /// Screen anchor just below the object, pixels
    pub x: f32,
    pub y: f32,
}

impl HoverInfo {
    pub fn new(object: &SceneObject, camera: &Camera, viewport: Viewport, config: &SceneConfig) -> Option<Self> {
        let anchor = object.grid_position() - Vector3::y() * config.tooltip_drop;
        let screen = camera.project(&anchor, viewport)?;
        Some(Self {
            id: object.id(),
            name: object.name().to_string(),
            x: screen.x,
            y: screen.y,
        })
    }
}

/// Animated highlight drawn behind the hovered object
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlowState {
    pub intensity: f32,
    pub size: f32,
    /// World position, valid while something is or was hovered
    pub position: Point3<f32>,
    active: bool,
}

impl GlowState {
    pub fn new(config: &GlowConfig) -> Self {
        Self {
            intensity: config.idle_intensity,
            size: config.idle_size,
            position: Point3::origin(),
            active: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Aim the glow at `target`, or let it decay when `None`. The position is
    /// pushed away from the camera so the glow never covers the object.
    pub fn set_target(&mut self, target: Option<Point3<f32>>, camera_position: Point3<f32>, config: &GlowConfig) {
        self.active = target.is_some();
        if let Some(target) = target {
            let away = (target - camera_position)
                .try_normalize(1e-6)
                .unwrap_or_else(|| -Vector3::z());
            self.position = target + away * config.push_distance;
        }
    }

    /// One frame of interpolation toward the active or idle targets
    pub fn update(&mut self, config: &GlowConfig) {
        let (intensity, size, rate) = if self.active {
            (config.active_intensity, config.active_size, config.grow_rate)
        } else {
            (config.idle_intensity, config.idle_size, config.decay_rate)
        };
        self.intensity += (intensity - self.intensity) * rate;
        self.size += (size - self.size) * rate;
    }
}
