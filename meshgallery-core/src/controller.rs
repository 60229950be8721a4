/// Camera controller easing toward the target of the current view mode
use std::f32::consts::FRAC_PI_2;

use nalgebra::{Point3, Vector3};

use crate::camera::{Camera, Viewport};
use crate::config::SceneConfig;
use crate::layout::GridMetrics;
use crate::registry::ObjectId;

/// What the camera is doing. Orbiting always names its object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewMode {
    /// Looking at the grid, offset downward by `scroll` world units
    Resting { scroll: f32 },
    /// Circling one object; `scroll` is kept for the return trip
    Orbiting {
        selected: ObjectId,
        azimuth: f32,
        polar: f32,
        scroll: f32,
    },
}

impl ViewMode {
    pub fn scroll(&self) -> f32 {
        match *self {
            ViewMode::Resting { scroll } | ViewMode::Orbiting { scroll, .. } => scroll,
        }
    }

    pub fn selected(&self) -> Option<ObjectId> {
        match *self {
            ViewMode::Resting { .. } => None,
            ViewMode::Orbiting { selected, .. } => Some(selected),
        }
    }

    pub fn is_orbiting(&self) -> bool {
        matches!(self, ViewMode::Orbiting { .. })
    }
}

/// Screen area covered by host UI (e.g. a detail panel), in pixels
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReservedPanel {
    /// Width taken from the right edge
    pub right: f32,
    /// Height taken from the bottom edge
    pub bottom: f32,
}

#[derive(Debug, Clone)]
pub struct CameraController {
    mode: ViewMode,
    position: Point3<f32>,
    look_at: Point3<f32>,
    target_position: Point3<f32>,
    target_look_at: Point3<f32>,
    pivot: Point3<f32>,
    panel: ReservedPanel,
    /// Orbit pan along camera right/up, world units
    pan: (f32, f32),
}

impl CameraController {
    /// Start at rest with the camera already in place
    pub fn new(metrics: &GridMetrics) -> Self {
        let (position, look_at) = resting_frame(0.0, metrics);
        Self {
            mode: ViewMode::Resting { scroll: 0.0 },
            position,
            look_at,
            target_position: position,
            target_look_at: look_at,
            pivot: Point3::origin(),
            panel: ReservedPanel::default(),
            pan: (0.0, 0.0),
        }
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn position(&self) -> Point3<f32> {
        self.position
    }

    pub fn look_at(&self) -> Point3<f32> {
        self.look_at
    }

    pub fn target_position(&self) -> Point3<f32> {
        self.target_position
    }

    pub fn target_look_at(&self) -> Point3<f32> {
        self.target_look_at
    }

    /// Add to the scroll offset, clamped to `[0, max_scroll]`. Ignored while orbiting.
    pub fn scroll_by(&mut self, delta: f32, max_scroll: f32) {
        if let ViewMode::Resting { scroll } = &mut self.mode {
            if delta.is_finite() {
                *scroll = (*scroll + delta).clamp(0.0, max_scroll.max(0.0));
            }
        }
    }

    /// Pull the scroll offset back inside a bound that may have shrunk
    pub fn clamp_scroll(&mut self, max_scroll: f32) {
        match &mut self.mode {
            ViewMode::Resting { scroll } | ViewMode::Orbiting { scroll, .. } => {
                *scroll = scroll.clamp(0.0, max_scroll.max(0.0));
            }
        }
    }

    /// Begin orbiting `selected`, centred on `pivot`. The pivot snaps; the
    /// camera itself glides there.
    pub fn enter_orbit(&mut self, selected: ObjectId, pivot: Point3<f32>) {
        let scroll = self.mode.scroll();
        self.pivot = pivot;
        self.mode = ViewMode::Orbiting {
            selected,
            azimuth: 0.0,
            polar: FRAC_PI_2,
            scroll,
        };
    }

    /// Back to the grid at the scroll offset held before orbiting
    pub fn exit_orbit(&mut self) {
        let scroll = self.mode.scroll();
        self.mode = ViewMode::Resting { scroll };
    }

    /// Follow the selected object after a relayout
    pub fn set_pivot(&mut self, pivot: Point3<f32>) {
        self.pivot = pivot;
    }

    pub fn orbit_by(&mut self, d_azimuth: f32, d_polar: f32, config: &SceneConfig) {
        if let ViewMode::Orbiting { azimuth, polar, .. } = &mut self.mode {
            if d_azimuth.is_finite() && d_polar.is_finite() {
                let (min, max) = config.polar_range();
                *azimuth += d_azimuth;
                *polar = (*polar + d_polar).clamp(min, max);
            }
        }
    }

    pub fn panel(&self) -> ReservedPanel {
        self.panel
    }

    /// Recompute the orbit pan for a new panel or viewport size
    pub fn set_panel(&mut self, panel: ReservedPanel, viewport: Viewport, config: &SceneConfig) {
        self.panel = panel;
        let world_per_px = 2.0 * config.orbit_radius * (config.fov / 2.0).tan() / viewport.height();
        let right = (panel.right.max(0.0) / 2.0) * world_per_px;
        let down = (panel.bottom.max(0.0) / 2.0) * world_per_px;
        self.pan = (right, -down);
    }

    /// Advance one frame toward the current mode's target
    pub fn update(&mut self, metrics: &GridMetrics, config: &SceneConfig) {
        let (target_position, target_look_at, factor) = match self.mode {
            ViewMode::Resting { scroll } => {
                let (position, look_at) = resting_frame(scroll, metrics);
                (position, look_at, config.resting_lerp)
            }
            ViewMode::Orbiting { azimuth, polar, .. } => {
                let offset = spherical(azimuth, polar);
                let forward = -offset;
                let right = forward
                    .cross(&Vector3::y())
                    .try_normalize(1e-6)
                    .unwrap_or_else(Vector3::x);
                let up = right.cross(&forward);
                let pan = right * self.pan.0 + up * self.pan.1;
                let look_at = self.pivot + pan;
                (look_at + offset * config.orbit_radius, look_at, config.orbiting_lerp)
            }
        };

        self.target_position = target_position;
        self.target_look_at = target_look_at;
        self.position += (target_position - self.position) * factor;
        self.look_at += (target_look_at - self.look_at) * factor;
    }

    /// Render camera for the current (interpolated) frame
    pub fn camera(&self, viewport: Viewport, config: &SceneConfig) -> Camera {
        let mut camera = Camera::new(viewport, config.fov);
        camera.position = self.position;
        camera.target = self.look_at;
        camera.near = config.near;
        camera.far = config.far;
        camera
    }
}

fn resting_frame(scroll: f32, metrics: &GridMetrics) -> (Point3<f32>, Point3<f32>) {
    (
        Point3::new(0.0, -scroll, metrics.home_distance),
        Point3::new(0.0, -scroll, 0.0),
    )
}

/// Unit offset from the pivot; polar measured from +y, azimuth around y from +z
fn spherical(azimuth: f32, polar: f32) -> Vector3<f32> {
    Vector3::new(
        polar.sin() * azimuth.sin(),
        polar.cos(),
        polar.sin() * azimuth.cos(),
    )
}
