/// Tunable constants for the gallery scene
use std::time::Duration;

/// Scene-wide tuning. `Default` gives the values the gallery ships with.
#[derive(Debug, Clone)]
pub struct SceneConfig {
    /// World-space size of an object's longest dimension after scaling
    pub visual_size: f32,
    /// Gap between neighbouring grid cells
    pub grid_margin: f32,
    /// Hit sphere radius as a fraction of `visual_size`
    pub hit_radius_fraction: f32,
    /// Vertical field of view in radians
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    /// Closest the resting camera may get to the grid
    pub min_home_distance: f32,
    /// Pixels between the viewport top edge and the first row
    pub top_offset_px: f32,
    /// Camera distance from the selected object while orbiting
    pub orbit_radius: f32,
    /// Polar angle margin kept away from both poles
    pub polar_margin: f32,
    pub resting_lerp: f32,
    pub orbiting_lerp: f32,
    pub opacity_lerp: f32,
    /// Opacity at or below which an object is hidden
    pub visibility_threshold: f32,
    /// Idle spin around the vertical axis, radians per frame
    pub spin_per_frame: f32,
    pub drag_threshold_px: f32,
    /// Radians of orbit per pixel of drag
    pub orbit_sensitivity: f32,
    /// World units of scroll per wheel pixel
    pub wheel_scroll_scale: f32,
    /// World units of scroll per pixel of mouse drag
    pub drag_scroll_scale: f32,
    /// World units of scroll per pixel of touch swipe
    pub touch_scroll_scale: f32,
    pub glow: GlowConfig,
    /// World units below the object centre the tooltip is anchored at
    pub tooltip_drop: f32,
}

/// Hover highlight animation targets and rates
#[derive(Debug, Clone)]
pub struct GlowConfig {
    pub active_intensity: f32,
    pub active_size: f32,
    pub idle_intensity: f32,
    pub idle_size: f32,
    pub grow_rate: f32,
    pub decay_rate: f32,
    /// Distance the glow sits behind the hovered object, away from the camera
    pub push_distance: f32,
}

impl SceneConfig {
    /// Row and column pitch of the grid
    pub fn pitch(&self) -> f32 {
        self.visual_size + self.grid_margin
    }

    pub fn hit_radius(&self) -> f32 {
        self.visual_size * self.hit_radius_fraction
    }

    /// Closed clamp bounds for the orbit polar angle. They sit a hair inside
    /// the margins so the angle never reaches `polar_margin` or
    /// `PI - polar_margin` themselves.
    pub fn polar_range(&self) -> (f32, f32) {
        const INSET: f32 = 1e-4;
        (
            self.polar_margin + INSET,
            std::f32::consts::PI - self.polar_margin - INSET,
        )
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            visual_size: 2.0,
            grid_margin: 1.0,
            hit_radius_fraction: 0.6,
            fov: 60f32.to_radians(),
            near: 0.1,
            far: 1000.0,
            min_home_distance: 8.0,
            top_offset_px: 120.0,
            orbit_radius: 6.0,
            polar_margin: 0.1,
            resting_lerp: 0.05,
            orbiting_lerp: 0.1,
            opacity_lerp: 0.1,
            visibility_threshold: 0.01,
            spin_per_frame: 0.005,
            drag_threshold_px: 5.0,
            orbit_sensitivity: 0.01,
            wheel_scroll_scale: 0.01,
            drag_scroll_scale: 0.03,
            touch_scroll_scale: 0.05,
            glow: GlowConfig::default(),
            tooltip_drop: 1.4,
        }
    }
}

impl Default for GlowConfig {
    fn default() -> Self {
        Self {
            active_intensity: 1.0,
            active_size: 3.2,
            idle_intensity: 0.0,
            idle_size: 1.0,
            grow_rate: 0.2,
            decay_rate: 0.05,
            push_distance: 1.5,
        }
    }
}

/// Ingestion worker pool settings
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub workers: usize,
    /// Pause a worker takes before starting each job
    pub stagger: Duration,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            stagger: Duration::from_millis(40),
        }
    }
}
