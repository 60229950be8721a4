/// Headless scenario tests for the gallery scene, fed synchronously so every frame is deterministic
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::{Duration, Instant};

use meshgallery_core::ingest::IngestSession;
use meshgallery_core::stl;
use meshgallery_core::{
    FileEntry, FrameView, GalleryScene, LoaderConfig, MemorySource, Mesh, ObjectId, PointerKind, ReservedPanel,
    SceneConfig, SceneEvent, SceneRenderer, StlDecoder, ViewMode, Viewport,
};

// ── Helpers ─────────────────────────────────────────────────

#[derive(Default)]
struct RecordingRenderer {
    frames: usize,
    visible: Vec<ObjectId>,
    selected: Option<ObjectId>,
}

impl SceneRenderer for RecordingRenderer {
    fn draw(&mut self, frame: &FrameView<'_>) {
        self.frames += 1;
        self.visible = frame.visible_objects().map(|v| v.object.id()).collect();
        self.selected = frame.visible_objects().find(|v| v.selected).map(|v| v.object.id());
    }
}

fn scene(width: f32, height: f32) -> (GalleryScene, Receiver<SceneEvent>) {
    GalleryScene::new(SceneConfig::default(), Viewport::new(width, height))
}

fn feed(session: &IngestSession, names: &[&str]) {
    let bytes = stl::encode_binary(&Mesh::cube(1.0));
    for (i, name) in names.iter().enumerate() {
        session.complete_bytes(ObjectId(i), name, &bytes, None, &StlDecoder);
    }
}

fn loaded_scene(width: f32, names: &[&str]) -> (GalleryScene, Receiver<SceneEvent>) {
    let (mut scene, events) = scene(width, 800.0);
    let session = scene.begin_session(names.len());
    feed(&session, names);
    scene.frame(&mut ());
    (scene, events)
}

fn screen_position(scene: &GalleryScene, id: ObjectId) -> (f32, f32) {
    let object = scene.registry().get(id).unwrap();
    let p = scene.camera().project(&object.grid_position(), scene.viewport()).unwrap();
    (p.x, p.y)
}

fn click(scene: &mut GalleryScene, (x, y): (f32, f32)) {
    scene.pointer_down(x, y, PointerKind::Mouse);
    scene.pointer_up(x, y);
}

fn selections(events: &Receiver<SceneEvent>) -> Vec<Option<ObjectId>> {
    events
        .try_iter()
        .filter_map(|e| match e {
            SceneEvent::Selected(s) => Some(s.map(|s| s.id)),
            _ => None,
        })
        .collect()
}

const NINE: [&str; 9] = ["a", "b", "c", "d", "e", "f", "g", "h", "i"];

// ── Layout scenarios ────────────────────────────────────────

#[test]
fn test_nine_objects_at_1300px_wrap_after_six() {
    let (scene, _) = loaded_scene(1300.0, &NINE);
    let metrics = scene.metrics();
    assert_eq!(metrics.columns, 6);

    let first = scene.registry().get(ObjectId(0)).unwrap().grid_position();
    let seventh = scene.registry().get(ObjectId(6)).unwrap().grid_position();
    assert_eq!(seventh.x, first.x);
    assert!((first.y - seventh.y - metrics.pitch).abs() < 1e-5);
}

#[test]
fn test_filter_leaves_single_match_in_first_slot() {
    let (mut scene, _) = loaded_scene(1300.0, &["gear.stl", "nut.stl", "redbox.stl", "washer.stl"]);
    scene.set_filter("");
    assert_eq!(scene.matching(), 4);

    scene.set_filter("box");
    let matching: Vec<_> = scene.registry().matching().map(|o| o.name().to_string()).collect();
    assert_eq!(matching, vec!["redbox.stl"]);
    let redbox = scene.registry().get(ObjectId(2)).unwrap();
    assert_eq!(redbox.grid_position(), scene.metrics().slot(0));

    let mut renderer = RecordingRenderer::default();
    scene.frame(&mut renderer);
    assert_eq!(renderer.visible, vec![ObjectId(2)]);
}

#[test]
fn test_resize_changes_columns_and_relayouts() {
    let (mut scene, _) = loaded_scene(1300.0, &NINE);
    scene.resize(700.0, 800.0);
    assert_eq!(scene.metrics().columns, 2);
    let third = scene.registry().get(ObjectId(2)).unwrap().grid_position();
    assert_eq!(third, scene.metrics().slot(2));
    assert_eq!(third.x, scene.metrics().slot(0).x);
}

#[test]
fn test_resize_while_orbiting_recenters_pivot_beside_panel() {
    let (mut scene, _) = loaded_scene(1000.0, &NINE);
    let at = screen_position(&scene, ObjectId(4));
    click(&mut scene, at);
    scene.set_reserved_panel(ReservedPanel { right: 400.0, bottom: 0.0 });
    for _ in 0..400 {
        scene.frame(&mut ());
    }
    let (x, y) = screen_position(&scene, ObjectId(4));
    assert!((x - 300.0).abs() < 1.0, "x = {x}");
    assert!((y - 400.0).abs() < 1.0, "y = {y}");

    scene.resize(1600.0, 1000.0);
    for _ in 0..400 {
        scene.frame(&mut ());
    }
    assert_eq!(scene.mode().selected(), Some(ObjectId(4)));
    let (x, y) = screen_position(&scene, ObjectId(4));
    // Centre of the 1200px wide area left of the panel
    assert!((x - 600.0).abs() < 1.0, "x = {x}");
    assert!((y - 500.0).abs() < 1.0, "y = {y}");
}

// ── Selection scenarios ─────────────────────────────────────

#[test]
fn test_click_selects_then_click_clears() {
    let (mut scene, events) = loaded_scene(1300.0, &NINE);
    let _ = events.try_iter().count();

    let at = screen_position(&scene, ObjectId(4));
    click(&mut scene, at);
    assert_eq!(scene.mode().selected(), Some(ObjectId(4)));
    assert_eq!(selections(&events), vec![Some(ObjectId(4))]);

    scene.frame(&mut ());
    click(&mut scene, (5.0, 5.0));
    assert_eq!(scene.mode().selected(), None);
    assert_eq!(selections(&events), vec![None]);
}

#[test]
fn test_drag_beyond_threshold_never_selects() {
    let (mut scene, events) = loaded_scene(1300.0, &NINE);
    let _ = events.try_iter().count();

    let (x, y) = screen_position(&scene, ObjectId(0));
    scene.pointer_down(x, y, PointerKind::Mouse);
    scene.pointer_move(x + 6.0, y);
    scene.pointer_up(x, y);
    assert!(matches!(scene.mode(), ViewMode::Resting { .. }));
    assert!(selections(&events).is_empty());
}

#[test]
fn test_click_on_empty_space_does_nothing() {
    let (mut scene, events) = loaded_scene(1300.0, &NINE);
    let _ = events.try_iter().count();
    click(&mut scene, (2.0, 790.0));
    assert!(!scene.mode().is_orbiting());
    assert!(selections(&events).is_empty());
}

#[test]
fn test_clearing_selection_restores_scroll_offset() {
    let names: Vec<String> = (0..40).map(|i| format!("part-{i}")).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let (mut scene, _) = loaded_scene(1300.0, &refs);

    scene.wheel(300.0);
    let scroll = scene.mode().scroll();
    assert!(scroll > 0.0);
    for _ in 0..200 {
        scene.frame(&mut ());
    }

    let visible = scene
        .registry()
        .iter()
        .find(|o| scene.camera().project(&o.grid_position(), scene.viewport()).is_some_and(|p| p.y > 0.0 && p.y < 800.0))
        .map(|o| o.id())
        .unwrap();
    let at = screen_position(&scene, visible);
    click(&mut scene, at);
    assert!(scene.mode().is_orbiting());

    scene.wheel(500.0);
    for _ in 0..50 {
        scene.frame(&mut ());
    }
    scene.clear_selection();
    assert_eq!(scene.mode(), ViewMode::Resting { scroll });

    for _ in 0..400 {
        scene.frame(&mut ());
    }
    assert!((scene.controller().look_at().y + scroll).abs() < 1e-3);
}

#[test]
fn test_selecting_another_object_replaces_selection() {
    let (mut scene, events) = loaded_scene(1300.0, &NINE);
    let at = screen_position(&scene, ObjectId(1));
    click(&mut scene, at);
    scene.clear_selection();
    scene.frame(&mut ());
    let at = screen_position(&scene, ObjectId(3));
    click(&mut scene, at);
    assert_eq!(scene.mode().selected(), Some(ObjectId(3)));
    assert_eq!(
        selections(&events),
        vec![Some(ObjectId(1)), None, Some(ObjectId(3))]
    );
}

#[test]
fn test_filtering_out_selected_object_clears_selection() {
    let (mut scene, events) = loaded_scene(1300.0, &["gear.stl", "redbox.stl"]);
    let at = screen_position(&scene, ObjectId(0));
    click(&mut scene, at);
    assert!(scene.mode().is_orbiting());

    scene.set_filter("box");
    assert!(!scene.mode().is_orbiting());
    assert_eq!(selections(&events), vec![Some(ObjectId(0)), None]);
}

// ── Frame loop ──────────────────────────────────────────────

#[test]
fn test_orbiting_fades_everything_but_selection() {
    let (mut scene, _) = loaded_scene(1300.0, &NINE);
    let at = screen_position(&scene, ObjectId(2));
    click(&mut scene, at);

    let mut renderer = RecordingRenderer::default();
    for _ in 0..120 {
        scene.frame(&mut renderer);
    }
    assert_eq!(renderer.visible, vec![ObjectId(2)]);
    assert_eq!(renderer.selected, Some(ObjectId(2)));

    let selected = scene.registry().get(ObjectId(2)).unwrap();
    assert_eq!(selected.visual.opacity, 1.0);

    scene.clear_selection();
    for _ in 0..120 {
        scene.frame(&mut renderer);
    }
    assert_eq!(renderer.visible.len(), 9);
    assert_eq!(renderer.frames, 240);
}

#[test]
fn test_idle_objects_spin_and_selection_holds_still() {
    let (mut scene, _) = loaded_scene(1300.0, &NINE);
    let at = screen_position(&scene, ObjectId(0));
    click(&mut scene, at);
    let held = scene.registry().get(ObjectId(0)).unwrap().visual.rotation;
    let before = scene.registry().get(ObjectId(1)).unwrap().visual.rotation;
    for _ in 0..10 {
        scene.frame(&mut ());
    }
    assert_eq!(scene.registry().get(ObjectId(0)).unwrap().visual.rotation, held);
    assert_ne!(scene.registry().get(ObjectId(1)).unwrap().visual.rotation, before);
}

#[test]
fn test_hover_reports_tooltip_below_object() {
    let (mut scene, events) = loaded_scene(1300.0, &NINE);
    let _ = events.try_iter().count();

    let (x, y) = screen_position(&scene, ObjectId(5));
    scene.pointer_move(x, y);
    scene.frame(&mut ());

    let hover = scene.hover().cloned().unwrap();
    assert_eq!(hover.name, "f");
    assert!(hover.y > y);
    assert!(scene.glow().is_active());
    assert!(events.try_iter().any(|e| matches!(e, SceneEvent::Hover(Some(_)))));

    click(&mut scene, (x, y));
    scene.frame(&mut ());
    assert!(scene.hover().is_none());
    assert!(!scene.glow().is_active());
}

#[test]
fn test_hover_is_reported_on_every_frame() {
    let (mut scene, events) = loaded_scene(1300.0, &["a"]);
    let _ = events.try_iter().count();

    let (x, y) = screen_position(&scene, ObjectId(0));
    scene.pointer_move(x, y);
    for _ in 0..10 {
        scene.frame(&mut ());
    }
    let hovers: Vec<_> = events
        .try_iter()
        .filter_map(|e| match e {
            SceneEvent::Hover(h) => Some(h),
            _ => None,
        })
        .collect();
    assert_eq!(hovers.len(), 10);
    assert!(hovers.iter().all(|h| h.as_ref().is_some_and(|h| h.name == "a")));

    scene.pointer_leave();
    for _ in 0..3 {
        scene.frame(&mut ());
    }
    let cleared = events.try_iter().filter(|e| matches!(e, SceneEvent::Hover(None))).count();
    assert_eq!(cleared, 3);
}

#[test]
fn test_hover_is_suppressed_while_dragging() {
    let (mut scene, _) = loaded_scene(1300.0, &NINE);
    let (x, y) = screen_position(&scene, ObjectId(0));
    scene.pointer_down(x - 20.0, y, PointerKind::Touch);
    scene.pointer_move(x, y);
    scene.frame(&mut ());
    assert!(scene.hover().is_none());
}

// ── Ingestion ───────────────────────────────────────────────

#[test]
fn test_progress_counts_failures_and_out_of_order_completions() {
    let (mut scene, events) = scene(1000.0, 800.0);
    let session = scene.begin_session(3);
    let bytes = stl::encode_binary(&Mesh::cube(1.0));
    session.complete_bytes(ObjectId(2), "late", &bytes, None, &StlDecoder);
    session.complete_bytes(ObjectId(1), "broken", b"not a mesh", None, &StlDecoder);
    session.complete_bytes(ObjectId(0), "early", &bytes, Some("cube();".into()), &StlDecoder);
    scene.frame(&mut ());

    let progress: Vec<_> = events
        .try_iter()
        .filter_map(|e| match e {
            SceneEvent::Progress { completed, total } => Some((completed, total)),
            _ => None,
        })
        .collect();
    assert_eq!(progress, vec![(0, 3), (1, 3), (2, 3), (3, 3)]);

    let ids: Vec<_> = scene.registry().iter().map(|o| o.id()).collect();
    assert_eq!(ids, vec![ObjectId(0), ObjectId(2)]);
    assert_eq!(scene.registry().get(ObjectId(0)).unwrap().grid_position(), scene.metrics().slot(0));
    assert_eq!(scene.registry().get(ObjectId(2)).unwrap().grid_position(), scene.metrics().slot(1));
    assert_eq!(scene.registry().get(ObjectId(0)).unwrap().source(), Some("cube();"));
}

#[test]
fn test_results_from_a_previous_session_are_ignored() {
    let (mut scene, _) = scene(1000.0, 800.0);
    let old = scene.begin_session(2);
    let new = scene.begin_session(1);
    feed(&old, &["stale-a", "stale-b"]);
    feed(&new, &["fresh"]);
    scene.frame(&mut ());

    let names: Vec<_> = scene.registry().iter().map(|o| o.name().to_string()).collect();
    assert_eq!(names, vec!["fresh"]);
    assert_eq!(scene.progress(), (1, 1));
}

#[test]
fn test_threaded_loader_fills_the_registry() {
    let mut source = MemorySource::new();
    let mut entries = Vec::new();
    for i in 0..8 {
        let name = format!("part-{i}.stl");
        source.insert(name.clone(), stl::encode_binary(&Mesh::cuboid(1.0, 1.0 + i as f32, 2.0)));
        entries.push(FileEntry::new(name.clone(), name));
    }

    let (mut scene, _) = scene(1300.0, 800.0);
    let config = LoaderConfig {
        workers: 3,
        stagger: Duration::from_millis(1),
    };
    let loader = scene
        .load(entries, Arc::new(source), Arc::new(StlDecoder), &config)
        .unwrap();

    let deadline = Instant::now() + Duration::from_secs(10);
    while scene.progress().0 < 8 && Instant::now() < deadline {
        scene.frame(&mut ());
        std::thread::sleep(Duration::from_millis(2));
    }
    loader.wait();

    assert_eq!(scene.progress(), (8, 8));
    let ids: Vec<_> = scene.registry().iter().map(|o| o.id().0).collect();
    assert_eq!(ids, (0..8).collect::<Vec<_>>());
}

#[test]
fn test_dropping_the_scene_mid_load_is_harmless() {
    let mut source = MemorySource::new();
    let entries: Vec<_> = (0..6)
        .map(|i| {
            let name = format!("{i}.stl");
            source.insert(name.clone(), stl::encode_binary(&Mesh::cube(1.0)));
            FileEntry::new(name.clone(), name)
        })
        .collect();

    let (mut scene, events) = scene(1000.0, 800.0);
    let config = LoaderConfig {
        workers: 2,
        stagger: Duration::from_millis(5),
    };
    let loader = scene
        .load(entries, Arc::new(source), Arc::new(StlDecoder), &config)
        .unwrap();
    drop(scene);
    drop(events);
    loader.shutdown();
    loader.wait();
}
