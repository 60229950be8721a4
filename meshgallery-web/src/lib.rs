/// Mesh Gallery Web - WASM host for the gallery scene
///
/// The page owns fetching and drawing. It feeds mesh bytes and pointer input
/// in, calls `frame()` once per animation frame, and draws the returned
/// instance data with whatever WebGL/WebGPU pipeline it has.
use std::sync::mpsc::Receiver;

use log::info;
use meshgallery_core::ingest::IngestSession;
use meshgallery_core::{
    FetchError, FrameView, GalleryScene, IngestError, ObjectId, PointerKind, ReservedPanel, SceneConfig,
    SceneEvent, SceneRenderer, StlDecoder, Viewport,
};
use nalgebra::Matrix4;
use wasm_bindgen::prelude::*;

/// Floats per instance: id, opacity, selected flag, then a column-major 4x4
/// model matrix
pub const INSTANCE_STRIDE: usize = 19;

/// Collects per-object draw data for the page
#[derive(Debug, Default)]
struct InstanceBuffer {
    instances: Vec<f32>,
    view_projection: Vec<f32>,
    glow: [f32; 5],
    frame: u64,
}

impl SceneRenderer for InstanceBuffer {
    fn draw(&mut self, frame: &FrameView<'_>) {
        self.frame = frame.frame;
        self.instances.clear();
        for view in frame.visible_objects() {
            self.instances.push(view.object.id().0 as f32);
            self.instances.push(view.opacity);
            self.instances.push(if view.selected { 1.0 } else { 0.0 });
            push_matrix(&mut self.instances, &view.model);
        }

        self.view_projection.clear();
        let camera = frame.camera;
        push_matrix(&mut self.view_projection, &(camera.projection_matrix() * camera.view_matrix()));

        let glow = frame.glow;
        self.glow = [glow.position.x, glow.position.y, glow.position.z, glow.intensity, glow.size];
    }
}

fn push_matrix(out: &mut Vec<f32>, matrix: &Matrix4<f32>) {
    out.extend_from_slice(matrix.as_slice());
}

/// A scene notification flattened for JavaScript
#[wasm_bindgen(getter_with_clone)]
#[derive(Debug, Clone, PartialEq)]
pub struct WebEvent {
    /// "progress", "selected" or "hover"
    pub kind: String,
    pub completed: u32,
    pub total: u32,
    /// Object index, -1 when the selection or hover was cleared
    pub id: i32,
    pub name: Option<String>,
    pub source: Option<String>,
    pub x: f32,
    pub y: f32,
}

impl WebEvent {
    fn blank(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            completed: 0,
            total: 0,
            id: -1,
            name: None,
            source: None,
            x: 0.0,
            y: 0.0,
        }
    }
}

impl From<SceneEvent> for WebEvent {
    fn from(event: SceneEvent) -> Self {
        match event {
            SceneEvent::Progress { completed, total } => Self {
                completed: completed as u32,
                total: total as u32,
                ..Self::blank("progress")
            },
            SceneEvent::Selected(None) => Self::blank("selected"),
            SceneEvent::Selected(Some(selection)) => Self {
                id: selection.id.0 as i32,
                name: Some(selection.name),
                source: selection.source,
                ..Self::blank("selected")
            },
            SceneEvent::Hover(None) => Self::blank("hover"),
            SceneEvent::Hover(Some(hover)) => Self {
                id: hover.id.0 as i32,
                name: Some(hover.name),
                x: hover.x,
                y: hover.y,
                ..Self::blank("hover")
            },
        }
    }
}

#[wasm_bindgen]
pub struct WebGallery {
    scene: GalleryScene,
    events: Receiver<SceneEvent>,
    session: Option<IngestSession>,
    buffer: InstanceBuffer,
}

#[wasm_bindgen]
impl WebGallery {
    #[wasm_bindgen(constructor)]
    pub fn new(width: f32, height: f32) -> WebGallery {
        let (scene, events) = GalleryScene::new(SceneConfig::default(), Viewport::new(width, height));
        WebGallery {
            scene,
            events,
            session: None,
            buffer: InstanceBuffer::default(),
        }
    }

    /// Start a new gallery of `total` meshes; earlier meshes are discarded
    pub fn begin(&mut self, total: u32) {
        info!("web gallery expecting {total} meshes");
        self.session = Some(self.scene.begin_session(total as usize));
    }

    /// Decode the mesh at position `index` of the current gallery. It shows up
    /// on the next frame, or counts as a failure if it cannot be decoded.
    /// Returns `false` if no gallery has been started.
    pub fn add_mesh(&mut self, index: u32, name: &str, bytes: &[u8], source: Option<String>) -> bool {
        match &self.session {
            Some(session) => session.complete_bytes(ObjectId(index as usize), name, bytes, source, &StlDecoder),
            None => false,
        }
    }

    /// Record that the page could not fetch the mesh at `index`
    pub fn add_failure(&mut self, index: u32, locator: &str) {
        if let Some(session) = &self.session {
            let error = IngestError::Fetch(FetchError::NotFound(locator.to_string()));
            session.complete(ObjectId(index as usize), Err(error));
        }
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.scene.resize(width, height);
    }

    pub fn set_filter(&mut self, text: &str) {
        self.scene.set_filter(text);
    }

    /// Reserve screen space for page UI covering the right or bottom edge
    pub fn set_panel(&mut self, right: f32, bottom: f32) {
        self.scene.set_reserved_panel(ReservedPanel { right, bottom });
    }

    pub fn clear_selection(&mut self) {
        self.scene.clear_selection();
    }

    pub fn pointer_down(&mut self, x: f32, y: f32, is_touch: bool) {
        let kind = if is_touch { PointerKind::Touch } else { PointerKind::Mouse };
        self.scene.pointer_down(x, y, kind);
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        self.scene.pointer_move(x, y);
    }

    pub fn pointer_up(&mut self, x: f32, y: f32) {
        self.scene.pointer_up(x, y);
    }

    pub fn pointer_leave(&mut self) {
        self.scene.pointer_leave();
    }

    pub fn wheel(&mut self, delta_y: f32) {
        self.scene.wheel(delta_y);
    }

    /// Advance one frame and return the instance data, `INSTANCE_STRIDE`
    /// floats per visible object
    pub fn frame(&mut self) -> Vec<f32> {
        self.scene.frame(&mut self.buffer);
        self.buffer.instances.clone()
    }

    /// Column-major view-projection matrix of the last frame
    pub fn view_projection(&self) -> Vec<f32> {
        self.buffer.view_projection.clone()
    }

    /// Glow of the last frame: x, y, z, intensity, size
    pub fn glow(&self) -> Vec<f32> {
        self.buffer.glow.to_vec()
    }

    /// Index of the last frame drawn, counting from zero
    pub fn frame_number(&self) -> f64 {
        self.buffer.frame as f64
    }

    /// Vertex positions of a loaded mesh, 9 floats per triangle in model space
    pub fn mesh_positions(&self, index: u32) -> Vec<f32> {
        self.scene
            .registry()
            .get(ObjectId(index as usize))
            .map(|object| {
                object
                    .geometry()
                    .mesh
                    .triangles
                    .iter()
                    .flat_map(|triangle| triangle.vertices.iter())
                    .flat_map(|vertex| [vertex.position.x, vertex.position.y, vertex.position.z])
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Next pending notification, if any
    pub fn poll_event(&mut self) -> Option<WebEvent> {
        self.events.try_recv().ok().map(WebEvent::from)
    }
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshgallery_core::{stl, Mesh};

    fn drain(gallery: &mut WebGallery) -> Vec<WebEvent> {
        std::iter::from_fn(|| gallery.poll_event()).collect()
    }

    #[test]
    fn test_meshes_added_by_the_page_become_instances() {
        let mut gallery = WebGallery::new(1300.0, 800.0);
        gallery.begin(2);
        let bytes = stl::encode_binary(&Mesh::cube(1.0));
        assert!(gallery.add_mesh(0, "a.stl", &bytes, None));
        assert!(gallery.add_mesh(1, "b.stl", &bytes, Some("cube(1);".into())));

        let instances = gallery.frame();
        assert_eq!(instances.len(), 2 * INSTANCE_STRIDE);
        assert_eq!(instances[0], 0.0);
        assert_eq!(instances[INSTANCE_STRIDE], 1.0);
        assert_eq!(gallery.view_projection().len(), 16);
        assert_eq!(gallery.mesh_positions(0).len(), 12 * 9);

        let events = drain(&mut gallery);
        let last = events.iter().rev().find(|e| e.kind == "progress").unwrap();
        assert_eq!((last.completed, last.total), (2, 2));
    }

    #[test]
    fn test_failures_count_toward_progress() {
        let mut gallery = WebGallery::new(800.0, 600.0);
        assert!(!gallery.add_mesh(0, "early.stl", &[], None));

        gallery.begin(2);
        assert!(gallery.add_mesh(0, "junk.stl", &[1, 2, 3], None));
        gallery.add_failure(1, "missing.stl");
        assert!(gallery.frame().is_empty());

        let progress: Vec<_> = drain(&mut gallery)
            .into_iter()
            .filter(|e| e.kind == "progress")
            .map(|e| e.completed)
            .collect();
        assert_eq!(progress, vec![0, 1, 2]);
    }

    #[test]
    fn test_filter_hides_instances() {
        let mut gallery = WebGallery::new(1300.0, 800.0);
        gallery.begin(2);
        let bytes = stl::encode_binary(&Mesh::cube(1.0));
        gallery.add_mesh(0, "gear.stl", &bytes, None);
        gallery.add_mesh(1, "bracket.stl", &bytes, None);
        gallery.frame();

        gallery.set_filter("gr");
        let instances = gallery.frame();
        assert_eq!(instances.len(), INSTANCE_STRIDE);
        assert_eq!(instances[0], 0.0);
    }

    #[test]
    fn test_hover_is_polled_once_per_frame() {
        let mut gallery = WebGallery::new(1300.0, 800.0);
        gallery.begin(1);
        gallery.add_mesh(0, "gear.stl", &stl::encode_binary(&Mesh::cube(1.0)), None);
        for _ in 0..4 {
            gallery.frame();
        }
        assert_eq!(gallery.frame_number(), 3.0);

        let hovers = drain(&mut gallery).into_iter().filter(|e| e.kind == "hover").count();
        assert_eq!(hovers, 4);
    }
}
