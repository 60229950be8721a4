/// Gallery scene: owns the interaction state and runs the frame loop
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use log::{debug, info, warn};
use nalgebra::{Matrix4, Point2};

use crate::camera::{Camera, Viewport};
use crate::config::{LoaderConfig, SceneConfig};
use crate::controller::{CameraController, ReservedPanel, ViewMode};
use crate::filter::FuzzyQuery;
use crate::hover::{GlowState, HoverInfo};
use crate::ingest::{ContentSource, FileEntry, IngestSession, Loader, MeshDecoder, SceneCommand};
use crate::interaction::{hit_test, Intent, InteractionRouter, PointerKind};
use crate::layout::{compute_layout, GridMetrics};
use crate::registry::{MeshRegistry, ObjectId, SceneObject};

/// Detail of the object being inspected
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub id: ObjectId,
    pub name: String,
    pub source: Option<String>,
}

impl Selection {
    fn of(object: &SceneObject) -> Self {
        Self {
            id: object.id(),
            name: object.name().to_string(),
            source: object.source().map(str::to_string),
        }
    }
}

/// Notifications for the host UI
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    /// After every ingestion attempt, successful or not
    Progress { completed: usize, total: usize },
    /// Entering (`Some`) or leaving (`None`) the orbit view
    Selected(Option<Selection>),
    /// Current tooltip, sent once per frame whether or not anything is hovered
    Hover(Option<HoverInfo>),
}

/// One object as it should be drawn this frame
#[derive(Debug, Clone, Copy)]
pub struct ObjectView<'a> {
    pub object: &'a SceneObject,
    pub model: Matrix4<f32>,
    pub opacity: f32,
    pub selected: bool,
}

/// Read-only snapshot handed to the renderer
pub struct FrameView<'a> {
    pub camera: &'a Camera,
    pub viewport: Viewport,
    pub registry: &'a MeshRegistry,
    pub mode: ViewMode,
    pub glow: &'a GlowState,
    pub hover: Option<&'a HoverInfo>,
    pub frame: u64,
}

impl<'a> FrameView<'a> {
    /// Visible objects in ascending id order
    pub fn visible_objects(&self) -> impl Iterator<Item = ObjectView<'a>> + 'a {
        let selected = self.mode.selected();
        let registry: &'a MeshRegistry = self.registry;
        registry
            .iter()
            .filter(|object| object.visual.visible)
            .map(move |object| ObjectView {
                object,
                model: object.model_matrix(),
                opacity: object.visual.opacity,
                selected: Some(object.id()) == selected,
            })
    }
}

/// Draw step of the frame loop
pub trait SceneRenderer {
    fn draw(&mut self, frame: &FrameView<'_>);
}

/// Renderer that draws nothing, for headless hosts
impl SceneRenderer for () {
    fn draw(&mut self, _frame: &FrameView<'_>) {}
}

pub struct GalleryScene {
    config: SceneConfig,
    viewport: Viewport,
    metrics: GridMetrics,
    registry: MeshRegistry,
    controller: CameraController,
    router: InteractionRouter,
    camera: Camera,
    glow: GlowState,
    hover: Option<HoverInfo>,
    matching: usize,
    generation: u64,
    frame: u64,
    commands_tx: Sender<SceneCommand>,
    commands_rx: Receiver<SceneCommand>,
    events: Sender<SceneEvent>,
}

impl GalleryScene {
    /// Create an empty scene and the receiving end of its event channel
    pub fn new(config: SceneConfig, viewport: Viewport) -> (Self, Receiver<SceneEvent>) {
        let (commands_tx, commands_rx) = mpsc::channel();
        let (events, events_rx) = mpsc::channel();
        let metrics = GridMetrics::new(viewport, &config);
        let controller = CameraController::new(&metrics);
        let camera = controller.camera(viewport, &config);
        let glow = GlowState::new(&config.glow);

        let scene = Self {
            config,
            viewport,
            metrics,
            registry: MeshRegistry::new(),
            controller,
            router: InteractionRouter::new(),
            camera,
            glow,
            hover: None,
            matching: 0,
            generation: 0,
            frame: 0,
            commands_tx,
            commands_rx,
            events,
        };
        (scene, events_rx)
    }

    /// Start a new ingestion session of `total` entries, discarding the
    /// current objects. Results from earlier sessions are ignored from now on.
    pub fn begin_session(&mut self, total: usize) -> IngestSession {
        self.generation += 1;
        self.clear_selection();
        self.registry.reset(total);
        self.hover = None;
        self.relayout();
        self.emit(SceneEvent::Progress { completed: 0, total });
        info!("ingest session {} started with {total} entries", self.generation);

        IngestSession {
            generation: self.generation,
            tx: self.commands_tx.clone(),
            config: self.config.clone(),
        }
    }

    /// Begin a session and load `entries` on background workers
    pub fn load(
        &mut self,
        entries: Vec<FileEntry>,
        source: Arc<dyn ContentSource>,
        decoder: Arc<dyn MeshDecoder>,
        loader: &LoaderConfig,
    ) -> std::io::Result<Loader> {
        let session = self.begin_session(entries.len());
        Loader::spawn(entries, source, decoder, session, loader)
    }

    pub fn set_filter(&mut self, text: &str) {
        let query = FuzzyQuery::compile(text);
        if &query == self.registry.query() {
            return;
        }
        self.registry.apply_filter(query);

        let selected_hidden = self
            .controller
            .mode()
            .selected()
            .and_then(|id| self.registry.get(id))
            .is_some_and(|object| !object.matches_filter());
        if selected_hidden {
            self.clear_selection();
        }
        self.relayout();
        debug!("filter {text:?} matches {} objects", self.matching);
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.viewport = Viewport::new(width, height);
        self.metrics = GridMetrics::new(self.viewport, &self.config);
        let panel = self.controller.panel();
        self.controller.set_panel(panel, self.viewport, &self.config);
        self.relayout();
    }

    pub fn set_reserved_panel(&mut self, panel: ReservedPanel) {
        self.controller.set_panel(panel, self.viewport, &self.config);
    }

    /// Leave the orbit view, if in it
    pub fn clear_selection(&mut self) {
        if self.controller.mode().is_orbiting() {
            self.controller.exit_orbit();
            self.emit(SceneEvent::Selected(None));
        }
    }

    pub fn pointer_down(&mut self, x: f32, y: f32, kind: PointerKind) {
        self.router.pointer_down(Point2::new(x, y), kind);
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        let mode = self.controller.mode();
        if let Some(intent) = self.router.pointer_move(Point2::new(x, y), &mode, &self.config) {
            self.apply(intent);
        }
    }

    pub fn pointer_up(&mut self, x: f32, y: f32) {
        if let Some(intent) = self.router.pointer_up(Point2::new(x, y)) {
            self.apply(intent);
        }
    }

    pub fn pointer_leave(&mut self) {
        self.router.pointer_leave();
    }

    pub fn wheel(&mut self, delta_y: f32) {
        let mode = self.controller.mode();
        if let Some(intent) = self.router.wheel(delta_y, &mode, &self.config) {
            self.apply(intent);
        }
    }

    fn apply(&mut self, intent: Intent) {
        match intent {
            Intent::Scroll(delta) => {
                self.controller.scroll_by(delta, self.metrics.max_scroll(self.matching));
            }
            Intent::Orbit { azimuth, polar } => {
                self.controller.orbit_by(azimuth, polar, &self.config);
            }
            Intent::Click(at) => {
                if self.controller.mode().is_orbiting() {
                    self.clear_selection();
                } else if let Some(id) = hit_test(&self.registry, &self.camera, self.viewport, at) {
                    self.select(id);
                }
            }
        }
    }

    fn select(&mut self, id: ObjectId) {
        let Some(object) = self.registry.get(id) else {
            return;
        };
        let selection = Selection::of(object);
        self.controller.enter_orbit(id, object.grid_position());
        info!("selected {} ({id})", selection.name);
        self.emit(SceneEvent::Selected(Some(selection)));
    }

    fn relayout(&mut self) {
        self.matching = compute_layout(&mut self.registry, &self.metrics);
        self.controller.clamp_scroll(self.metrics.max_scroll(self.matching));
        if let Some(object) = self.controller.mode().selected().and_then(|id| self.registry.get(id)) {
            self.controller.set_pivot(object.grid_position());
        }
    }

    fn emit(&self, event: SceneEvent) {
        // The host may have stopped listening; the scene keeps running.
        let _ = self.events.send(event);
    }

    fn drain_commands(&mut self) {
        let mut added = false;
        while let Ok(command) = self.commands_rx.try_recv() {
            match command {
                SceneCommand::Loaded { generation, object } if generation == self.generation => {
                    added |= self.registry.insert(object);
                }
                SceneCommand::Failed { generation, id, error } if generation == self.generation => {
                    warn!("object {id} skipped: {error}");
                    self.registry.record_failure();
                }
                SceneCommand::Loaded { generation, .. } | SceneCommand::Failed { generation, .. } => {
                    debug!("dropping result from stale session {generation}");
                    continue;
                }
            }
            let (completed, total) = self.registry.progress();
            self.emit(SceneEvent::Progress { completed, total });
        }
        if added {
            self.relayout();
        }
    }

    fn update_hover(&mut self) {
        let hovered = match (self.controller.mode(), self.router.pointer()) {
            (ViewMode::Resting { .. }, Some(pointer)) if !self.router.is_dragging() => {
                hit_test(&self.registry, &self.camera, self.viewport, pointer).and_then(|id| self.registry.get(id))
            }
            _ => None,
        };

        let hover = hovered.and_then(|object| HoverInfo::new(object, &self.camera, self.viewport, &self.config));
        self.glow.set_target(
            hovered.map(|object| object.grid_position()),
            self.camera.position,
            &self.config.glow,
        );

        self.hover = hover;
        self.emit(SceneEvent::Hover(self.hover.clone()));
    }

    fn update_objects(&mut self) {
        let mode = self.controller.mode();
        let selected = mode.selected();
        let target = if mode.is_orbiting() { 0.0 } else { 1.0 };
        let config = &self.config;

        for object in self.registry.iter_mut() {
            let id = object.id();
            let matches = object.matches_filter();
            let visual = &mut object.visual;
            if Some(id) == selected {
                visual.opacity = 1.0;
                visual.visible = true;
            } else {
                visual.opacity += (target - visual.opacity) * config.opacity_lerp;
                visual.visible = visual.opacity > config.visibility_threshold;
                visual.rotation.rotate(0.0, config.spin_per_frame, 0.0);
            }
            if !matches {
                visual.visible = false;
            }
        }
    }

    /// Run one frame: apply finished loads, hover, glow, camera, object
    /// visuals, then draw.
    pub fn frame(&mut self, renderer: &mut dyn SceneRenderer) {
        self.drain_commands();
        self.update_hover();
        self.glow.update(&self.config.glow);
        self.controller.update(&self.metrics, &self.config);
        self.camera = self.controller.camera(self.viewport, &self.config);
        self.update_objects();

        let view = FrameView {
            camera: &self.camera,
            viewport: self.viewport,
            registry: &self.registry,
            mode: self.controller.mode(),
            glow: &self.glow,
            hover: self.hover.as_ref(),
            frame: self.frame,
        };
        renderer.draw(&view);
        self.frame += 1;
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn metrics(&self) -> &GridMetrics {
        &self.metrics
    }

    pub fn registry(&self) -> &MeshRegistry {
        &self.registry
    }

    pub fn mode(&self) -> ViewMode {
        self.controller.mode()
    }

    pub fn controller(&self) -> &CameraController {
        &self.controller
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn glow(&self) -> &GlowState {
        &self.glow
    }

    /// Current tooltip, refreshed every frame
    pub fn hover(&self) -> Option<&HoverInfo> {
        self.hover.as_ref()
    }

    pub fn selection(&self) -> Option<Selection> {
        self.controller
            .mode()
            .selected()
            .and_then(|id| self.registry.get(id))
            .map(Selection::of)
    }

    pub fn progress(&self) -> (usize, usize) {
        self.registry.progress()
    }

    /// Number of objects passing the current filter
    pub fn matching(&self) -> usize {
        self.matching
    }
}
