/// ASCII rasterizer for terminal rendering
use crossterm::{
    cursor,
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use meshgallery_core::{Camera, FrameView, HoverInfo, ObjectView, SceneRenderer, Triangle, Viewport};
use nalgebra::Point3;
use std::io::Write;

/// Character luminosity ramp for depth/shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Glow characters from faint to strong
const GLOW_RAMP: &[char] = &['.', ':', '~'];

/// Size of one terminal cell in virtual pixels, roughly a 1:2 glyph
pub const CELL_WIDTH_PX: f32 = 8.0;
pub const CELL_HEIGHT_PX: f32 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Cell {
    depth: f32,
    character: char,
    color: Color,
}

const EMPTY: Cell = Cell {
    depth: f32::INFINITY,
    character: ' ',
    color: Color::Reset,
};

/// ASCII renderer that converts gallery frames to terminal characters
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
    tooltip: Option<HoverInfo>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![EMPTY; width * height],
            tooltip: None,
        }
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.cells = vec![EMPTY; width * height];
    }

    pub fn clear(&mut self) {
        self.cells.fill(EMPTY);
    }

    /// Viewport in virtual pixels for a cell grid
    pub fn viewport_for(width: usize, height: usize) -> Viewport {
        Viewport::new(width as f32 * CELL_WIDTH_PX, height as f32 * CELL_HEIGHT_PX)
    }

    fn render_glow(&mut self, frame: &FrameView<'_>) {
        let glow = frame.glow;
        if glow.intensity < 0.05 {
            return;
        }
        let Some(center) = frame.camera.project(&glow.position, frame.viewport) else {
            return;
        };

        // Screen radius of a sphere of diameter `size` at the glow's distance
        let distance = (glow.position - frame.camera.position).norm().max(1e-3);
        let px_per_world = frame.viewport.height() / (2.0 * distance * (frame.camera.fov / 2.0).tan());
        let radius = glow.size / 2.0 * px_per_world;

        let level = ((glow.intensity * GLOW_RAMP.len() as f32) as usize).min(GLOW_RAMP.len() - 1);
        let character = GLOW_RAMP[level];
        let (cx, cy) = (center.x / CELL_WIDTH_PX, center.y / CELL_HEIGHT_PX);
        let (rx, ry) = (radius / CELL_WIDTH_PX, radius / CELL_HEIGHT_PX);

        let min_y = (cy - ry).floor().max(0.0) as usize;
        let max_y = ((cy + ry).ceil().max(0.0) as usize).min(self.height);
        let min_x = (cx - rx).floor().max(0.0) as usize;
        let max_x = ((cx + rx).ceil().max(0.0) as usize).min(self.width);
        for y in min_y..max_y {
            for x in min_x..max_x {
                let dx = (x as f32 + 0.5 - cx) / rx.max(1e-3);
                let dy = (y as f32 + 0.5 - cy) / ry.max(1e-3);
                if dx * dx + dy * dy <= 1.0 {
                    // Behind every mesh, so depth stays at infinity
                    let cell = &mut self.cells[y * self.width + x];
                    cell.character = character;
                    cell.color = Color::DarkYellow;
                }
            }
        }
    }

    fn render_object(&mut self, view: &ObjectView<'_>, camera: &Camera, viewport: Viewport) {
        let light = -camera.forward();
        let mesh = &view.object.geometry().mesh;
        for triangle in &mesh.triangles {
            self.render_triangle(triangle, view, camera, viewport, &light);
        }
    }

    fn render_triangle(
        &mut self,
        triangle: &Triangle,
        view: &ObjectView<'_>,
        camera: &Camera,
        viewport: Viewport,
        light: &nalgebra::Vector3<f32>,
    ) {
        // Project vertices to cell space
        let mut screen_coords = [(0.0f32, 0.0f32, 0.0f32); 3];
        for (slot, vertex) in screen_coords.iter_mut().zip(&triangle.vertices) {
            let world: Point3<f32> = view.model.transform_point(&vertex.position);
            match camera.project(&world, viewport) {
                Some(p) => *slot = (p.x / CELL_WIDTH_PX, p.y / CELL_HEIGHT_PX, p.z),
                None => return,
            }
        }

        // Face normal in world space for shading
        let normal = view
            .model
            .transform_vector(&triangle.calculate_normal())
            .try_normalize(1e-9);
        let Some(normal) = normal else {
            return;
        };
        let brightness = normal.dot(light).max(0.0) * view.opacity;

        // Map brightness to character
        let char_index = (brightness * (LUMINOSITY_RAMP.len() - 1) as f32) as usize;
        let char_index = char_index.clamp(1, LUMINOSITY_RAMP.len() - 1);
        let character = LUMINOSITY_RAMP[char_index];
        let color = if view.selected {
            Color::Yellow
        } else {
            shade_color(character)
        };

        self.rasterize_triangle(&screen_coords, character, color);
    }

    fn rasterize_triangle(&mut self, coords: &[(f32, f32, f32); 3], character: char, color: Color) {
        let (v0, v1, v2) = (coords[0], coords[1], coords[2]);

        // Bounding box clipped to screen bounds
        let min_x = (v0.0.min(v1.0).min(v2.0).floor() as i32).max(0);
        let max_x = (v0.0.max(v1.0).max(v2.0).ceil() as i32).min(self.width as i32 - 1);
        let min_y = (v0.1.min(v1.1).min(v2.1).floor() as i32).max(0);
        let max_y = (v0.1.max(v1.1).max(v2.1).ceil() as i32).min(self.height as i32 - 1);

        // Scanline rasterization
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                let Some((w0, w1, w2)) = barycentric((v0.0, v0.1), (v1.0, v1.1), (v2.0, v2.1), (px, py)) else {
                    continue;
                };
                if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                    let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;
                    let cell = &mut self.cells[y as usize * self.width + x as usize];
                    if depth < cell.depth {
                        *cell = Cell {
                            depth,
                            character,
                            color,
                        };
                    }
                }
            }
        }
    }

    /// Hover tooltip of the last drawn frame
    pub fn tooltip(&self) -> Option<&HoverInfo> {
        self.tooltip.as_ref()
    }

    /// Character at a cell, for inspection
    pub fn char_at(&self, x: usize, y: usize) -> Option<char> {
        (x < self.width && y < self.height).then(|| self.cells[y * self.width + x].character)
    }

    /// Write the buffer starting at terminal row `top`
    pub fn draw<W: Write>(&self, writer: &mut W, top: u16) -> std::io::Result<()> {
        for y in 0..self.height {
            writer.queue(cursor::MoveTo(0, top + y as u16))?;
            let mut current = None;
            for cell in &self.cells[y * self.width..(y + 1) * self.width] {
                if current != Some(cell.color) {
                    writer.queue(SetForegroundColor(cell.color))?;
                    current = Some(cell.color);
                }
                writer.queue(Print(cell.character))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

impl SceneRenderer for AsciiRenderer {
    fn draw(&mut self, frame: &FrameView<'_>) {
        self.clear();
        self.tooltip = frame.hover.cloned();
        self.render_glow(frame);
        for view in frame.visible_objects() {
            self.render_object(&view, frame.camera, frame.viewport);
        }
    }
}

/// Color based on character intensity
fn shade_color(c: char) -> Color {
    match c {
        ' ' | '.' | ':' => Color::DarkGrey,
        '-' | '=' => Color::Grey,
        '+' | '*' => Color::White,
        '#' | '%' | '@' => Color::Cyan,
        _ => Color::White,
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshgallery_core::ingest::IngestSession;
    use meshgallery_core::{stl, GalleryScene, Mesh, ObjectId, SceneConfig, StlDecoder};

    fn scene_with_cube(width: usize, height: usize) -> (GalleryScene, IngestSession) {
        let viewport = AsciiRenderer::viewport_for(width, height);
        let (mut scene, _events) = GalleryScene::new(SceneConfig::default(), viewport);
        let session = scene.begin_session(1);
        let bytes = stl::encode_binary(&Mesh::cube(1.0));
        session.complete_bytes(ObjectId(0), "cube.stl", &bytes, None, &StlDecoder);
        (scene, session)
    }

    #[test]
    fn test_barycentric_center_is_equal_weights() {
        let (w0, w1, w2) = barycentric((0.0, 0.0), (3.0, 0.0), (0.0, 3.0), (1.0, 1.0)).unwrap();
        assert!((w0 - 1.0 / 3.0).abs() < 1e-5);
        assert!((w1 - 1.0 / 3.0).abs() < 1e-5);
        assert!((w2 - 1.0 / 3.0).abs() < 1e-5);
        assert!(barycentric((0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (1.0, 1.0)).is_none());
    }

    #[test]
    fn test_loaded_object_is_drawn_at_its_grid_cell() {
        let (mut scene, _session) = scene_with_cube(100, 40);
        let mut renderer = AsciiRenderer::new(100, 40);
        scene.frame(&mut renderer);

        let object = scene.registry().get(ObjectId(0)).unwrap();
        let p = scene.camera().project(&object.grid_position(), scene.viewport()).unwrap();
        let (x, y) = ((p.x / CELL_WIDTH_PX) as usize, (p.y / CELL_HEIGHT_PX) as usize);
        assert_ne!(renderer.char_at(x, y), Some(' '));
        assert_eq!(renderer.char_at(0, 39), Some(' '));
    }

    #[test]
    fn test_tooltip_follows_the_hovered_object() {
        let (mut scene, _session) = scene_with_cube(100, 40);
        let mut renderer = AsciiRenderer::new(100, 40);
        scene.frame(&mut renderer);
        assert!(renderer.tooltip().is_none());

        let object = scene.registry().get(ObjectId(0)).unwrap();
        let p = scene.camera().project(&object.grid_position(), scene.viewport()).unwrap();
        scene.pointer_move(p.x, p.y);
        scene.frame(&mut renderer);
        let tooltip = renderer.tooltip().unwrap();
        assert_eq!(tooltip.name, "cube.stl");
        assert!(tooltip.y > p.y);

        scene.pointer_leave();
        scene.frame(&mut renderer);
        assert!(renderer.tooltip().is_none());
    }

    #[test]
    fn test_draw_writes_every_row() {
        let mut renderer = AsciiRenderer::new(4, 3);
        renderer.clear();
        let mut out = Vec::new();
        renderer.draw(&mut out, 2).unwrap();
        assert!(!out.is_empty());
    }
}
