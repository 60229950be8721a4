/// Pointer, touch and wheel input
use nalgebra::Point2;

use crate::camera::{Camera, Viewport};
use crate::config::SceneConfig;
use crate::controller::ViewMode;
use crate::registry::{MeshRegistry, ObjectId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Touch,
}

/// What a piece of input asks the scene to do
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intent {
    /// Change the resting scroll offset by this many world units
    Scroll(f32),
    /// Change orbit angles, radians
    Orbit { azimuth: f32, polar: f32 },
    /// Press and release without dragging
    Click(Point2<f32>),
}

#[derive(Debug, Clone, Copy)]
struct Press {
    origin: Point2<f32>,
    last: Point2<f32>,
    kind: PointerKind,
    dragging: bool,
}

#[derive(Debug, Clone, Default)]
pub struct InteractionRouter {
    press: Option<Press>,
    pointer: Option<Point2<f32>>,
}

impl InteractionRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last known pointer position, if the pointer is over the view
    pub fn pointer(&self) -> Option<Point2<f32>> {
        self.pointer
    }

    pub fn is_dragging(&self) -> bool {
        self.press.is_some_and(|p| p.dragging)
    }

    pub fn pointer_down(&mut self, at: Point2<f32>, kind: PointerKind) {
        self.pointer = Some(at);
        self.press = Some(Press {
            origin: at,
            last: at,
            kind,
            dragging: false,
        });
    }

    pub fn pointer_move(&mut self, at: Point2<f32>, mode: &ViewMode, config: &SceneConfig) -> Option<Intent> {
        self.pointer = Some(at);
        let press = self.press.as_mut()?;

        if !press.dragging {
            if (at - press.origin).norm() <= config.drag_threshold_px {
                return None;
            }
            press.dragging = true;
        }

        let delta = at - press.last;
        press.last = at;

        match mode {
            ViewMode::Orbiting { .. } => Some(Intent::Orbit {
                azimuth: -delta.x * config.orbit_sensitivity,
                polar: -delta.y * config.orbit_sensitivity,
            }),
            ViewMode::Resting { .. } => {
                let scale = match press.kind {
                    PointerKind::Mouse => config.drag_scroll_scale,
                    PointerKind::Touch => config.touch_scroll_scale,
                };
                Some(Intent::Scroll(-delta.y * scale))
            }
        }
    }

    pub fn pointer_up(&mut self, at: Point2<f32>) -> Option<Intent> {
        self.pointer = Some(at);
        let press = self.press.take()?;
        (!press.dragging).then_some(Intent::Click(at))
    }

    /// Pointer left the view or the gesture was cancelled
    pub fn pointer_leave(&mut self) {
        self.pointer = None;
        self.press = None;
    }

    /// Wheel delta in pixels, positive scrolls down the grid
    pub fn wheel(&self, delta_y: f32, mode: &ViewMode, config: &SceneConfig) -> Option<Intent> {
        match mode {
            ViewMode::Orbiting { .. } => None,
            ViewMode::Resting { .. } => Some(Intent::Scroll(delta_y * config.wheel_scroll_scale)),
        }
    }
}

/// First matching object, in ascending id, whose hit sphere the pointer ray crosses
pub fn hit_test(
    registry: &MeshRegistry,
    camera: &Camera,
    viewport: Viewport,
    pixel: Point2<f32>,
) -> Option<ObjectId> {
    let ray = camera.ray_through(pixel, viewport);
    registry
        .matching()
        .find(|object| {
            ray.intersect_sphere(&object.grid_position(), object.geometry().hit_radius)
                .is_some()
        })
        .map(|object| object.id())
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESTING: ViewMode = ViewMode::Resting { scroll: 0.0 };
    const ORBITING: ViewMode = ViewMode::Orbiting {
        selected: ObjectId(0),
        azimuth: 0.0,
        polar: 1.5,
        scroll: 0.0,
    };

    #[test]
    fn test_release_without_movement_is_a_click() {
        let config = SceneConfig::default();
        let mut router = InteractionRouter::new();
        router.pointer_down(Point2::new(10.0, 10.0), PointerKind::Mouse);
        assert_eq!(router.pointer_move(Point2::new(12.0, 13.0), &RESTING, &config), None);
        assert_eq!(
            router.pointer_up(Point2::new(12.0, 13.0)),
            Some(Intent::Click(Point2::new(12.0, 13.0)))
        );
    }

    #[test]
    fn test_drag_past_threshold_never_clicks() {
        let config = SceneConfig::default();
        let mut router = InteractionRouter::new();
        router.pointer_down(Point2::new(10.0, 10.0), PointerKind::Mouse);
        assert!(router.pointer_move(Point2::new(10.0, 16.0), &RESTING, &config).is_some());
        assert!(router.is_dragging());
        // Returning to the origin does not undo the drag
        router.pointer_move(Point2::new(10.0, 10.0), &RESTING, &config);
        assert_eq!(router.pointer_up(Point2::new(10.0, 10.0)), None);
        assert!(!router.is_dragging());
    }

    #[test]
    fn test_resting_drag_scrolls_with_touch_scaled_more_than_wheel() {
        let config = SceneConfig::default();
        let mut router = InteractionRouter::new();
        router.pointer_down(Point2::new(0.0, 100.0), PointerKind::Touch);
        let intent = router.pointer_move(Point2::new(0.0, 80.0), &RESTING, &config);
        assert_eq!(intent, Some(Intent::Scroll(20.0 * config.touch_scroll_scale)));

        let wheel = router.wheel(20.0, &RESTING, &config);
        assert_eq!(wheel, Some(Intent::Scroll(20.0 * config.wheel_scroll_scale)));
        assert!(config.touch_scroll_scale > config.wheel_scroll_scale);
    }

    #[test]
    fn test_orbiting_drag_maps_to_angles() {
        let config = SceneConfig::default();
        let mut router = InteractionRouter::new();
        router.pointer_down(Point2::new(0.0, 0.0), PointerKind::Mouse);
        let intent = router.pointer_move(Point2::new(10.0, -4.0), &ORBITING, &config);
        match intent {
            Some(Intent::Orbit { azimuth, polar }) => {
                assert!((azimuth + 10.0 * config.orbit_sensitivity).abs() < 1e-6);
                assert!((polar - 4.0 * config.orbit_sensitivity).abs() < 1e-6);
            }
            other => panic!("expected orbit, got {other:?}"),
        }
    }

    #[test]
    fn test_wheel_is_ignored_while_orbiting() {
        let router = InteractionRouter::new();
        assert_eq!(router.wheel(120.0, &ORBITING, &SceneConfig::default()), None);
    }

    #[test]
    fn test_move_without_press_only_tracks_pointer() {
        let mut router = InteractionRouter::new();
        let config = SceneConfig::default();
        assert_eq!(router.pointer_move(Point2::new(5.0, 5.0), &RESTING, &config), None);
        assert_eq!(router.pointer(), Some(Point2::new(5.0, 5.0)));
        router.pointer_leave();
        assert_eq!(router.pointer(), None);
    }
}
