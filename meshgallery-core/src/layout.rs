/// Row-major grid layout of the matching objects
use nalgebra::Point3;

use crate::camera::Viewport;
use crate::config::SceneConfig;
use crate::registry::MeshRegistry;

/// Columns for a viewport width in pixels
pub fn column_count(width: f32) -> usize {
    if width > 1200.0 {
        6
    } else if width > 768.0 {
        4
    } else {
        2
    }
}

/// Everything layout and the resting camera derive from the viewport
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridMetrics {
    pub columns: usize,
    pub pitch: f32,
    /// Resting camera distance from the grid plane
    pub home_distance: f32,
    /// World y of the first row when the scroll offset is zero
    pub vertical_origin: f32,
}

impl GridMetrics {
    pub fn new(viewport: Viewport, config: &SceneConfig) -> Self {
        let columns = column_count(viewport.width());
        let pitch = config.pitch();
        let home_distance = home_distance(columns, viewport, config);

        // Half the visible height at the grid plane, then step down by the
        // pixel offset converted to world units.
        let half_height = home_distance * (config.fov / 2.0).tan();
        let world_per_px = 2.0 * half_height / viewport.height();
        let vertical_origin = half_height - config.top_offset_px * world_per_px;

        Self {
            columns,
            pitch,
            home_distance,
            vertical_origin,
        }
    }

    /// Grid position of the `k`-th matching object
    pub fn slot(&self, k: usize) -> Point3<f32> {
        let row = k / self.columns;
        let col = k % self.columns;
        let center_col = (self.columns as f32 - 1.0) / 2.0;
        Point3::new(
            (col as f32 - center_col) * self.pitch,
            self.vertical_origin - row as f32 * self.pitch,
            0.0,
        )
    }

    pub fn rows(&self, matching: usize) -> usize {
        matching.div_ceil(self.columns)
    }

    /// Largest scroll offset: `max(0, rows × pitch − vertical_origin)`
    pub fn max_scroll(&self, matching: usize) -> f32 {
        let content_height = self.rows(matching) as f32 * self.pitch;
        (content_height - self.vertical_origin).max(0.0)
    }
}

/// Distance at which the full grid width fits the horizontal field of view
pub fn home_distance(columns: usize, viewport: Viewport, config: &SceneConfig) -> f32 {
    let grid_width = (columns as f32 - 1.0) * config.pitch() + config.visual_size;
    let half_fov_x = (config.fov / 2.0).tan() * viewport.aspect();
    let fit = (grid_width / 2.0) / half_fov_x.max(1e-3);
    fit.max(config.min_home_distance)
}

/// Assign grid positions to matching objects and hide the rest.
/// Returns the number of matching objects placed.
pub fn compute_layout(registry: &mut MeshRegistry, metrics: &GridMetrics) -> usize {
    let mut placed = 0;
    for object in registry.objects_mut() {
        if object.matches_filter() {
            object.set_grid_position(metrics.slot(placed));
            placed += 1;
        } else {
            object.visual.visible = false;
        }
    }
    placed
}
