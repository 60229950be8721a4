/// Terminal host for the mesh gallery
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
        MouseButton, MouseEvent, MouseEventKind,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, ClearType},
};
use log::{debug, info};
use meshgallery_core::{
    ContentSource, FileEntry, GalleryScene, HoverInfo, Loader, LoaderConfig, PointerKind, ReservedPanel,
    SceneConfig, SceneEvent, Selection, StlDecoder,
};
use std::io::{self, stdout, Write};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub mod demo;
pub mod renderer;

pub use renderer::{AsciiRenderer, CELL_HEIGHT_PX, CELL_WIDTH_PX};

/// Rows above the 3D view: title bar and search line
const HEADER_ROWS: u16 = 2;

/// Wheel delta for one scroll notch, in pixels
const WHEEL_NOTCH: f32 = 100.0;

/// Detail panel width as a share of the terminal, capped in columns
const PANEL_FRACTION: f32 = 0.4;
const PANEL_MAX_COLUMNS: u16 = 48;

/// Main application struct for the terminal gallery
pub struct TerminalApp {
    scene: GalleryScene,
    events: Receiver<SceneEvent>,
    loader: Option<Loader>,
    renderer: AsciiRenderer,
    filter: String,
    selection: Option<Selection>,
    progress: (usize, usize),
    columns: u16,
    rows: u16,
    running: bool,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(config: SceneConfig) -> io::Result<Self> {
        let (columns, rows) = terminal::size()?;
        let view_rows = rows.saturating_sub(HEADER_ROWS);
        let viewport = AsciiRenderer::viewport_for(columns as usize, view_rows as usize);
        let (scene, events) = GalleryScene::new(config, viewport);

        Ok(Self {
            scene,
            events,
            loader: None,
            renderer: AsciiRenderer::new(columns as usize, view_rows as usize),
            filter: String::new(),
            selection: None,
            progress: (0, 0),
            columns,
            rows,
            running: true,
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        })
    }

    /// Start loading `entries` in the background, replacing any earlier load
    pub fn load(
        &mut self,
        entries: Vec<FileEntry>,
        source: Arc<dyn ContentSource>,
        loader: &LoaderConfig,
    ) -> io::Result<()> {
        if let Some(previous) = self.loader.take() {
            previous.shutdown();
        }
        info!("loading {} entries with {} workers", entries.len(), loader.workers);
        self.loader = Some(self.scene.load(entries, source, Arc::new(StlDecoder), loader)?);
        Ok(())
    }

    /// Apply an initial search before the UI starts
    pub fn set_filter(&mut self, text: &str) {
        self.filter = text.to_string();
        self.scene.set_filter(&self.filter);
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, EnableMouseCapture, cursor::Hide)?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), DisableMouseCapture, terminal::LeaveAlternateScreen, cursor::Show)?;

        if let Some(loader) = self.loader.take() {
            loader.shutdown();
        }
        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = Duration::from_millis(1000 / 30); // 30 FPS target

        while self.running {
            let frame_start = Instant::now();

            // Handle every pending input event
            while event::poll(Duration::from_millis(0))? {
                self.handle_event(event::read()?);
            }

            // Update and render
            self.scene.frame(&mut self.renderer);
            self.drain_scene_events();
            self.render()?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Resize(columns, rows) => self.resize(columns, rows),
            _ => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        match KeyAction::from(key) {
            KeyAction::Quit => self.running = false,
            KeyAction::Back => {
                if self.selection.is_some() {
                    self.scene.clear_selection();
                } else if !self.filter.is_empty() {
                    self.set_filter("");
                } else {
                    self.running = false;
                }
            }
            KeyAction::Erase => {
                if self.filter.pop().is_some() {
                    self.scene.set_filter(&self.filter);
                }
            }
            KeyAction::Type(c) => {
                self.filter.push(c);
                self.scene.set_filter(&self.filter);
            }
            KeyAction::Ignore => {}
        }
    }

    fn handle_mouse(&mut self, MouseEvent { kind, column, row, .. }: MouseEvent) {
        let Some((x, y)) = cell_to_pixel(column, row) else {
            // Pointer is over the header
            self.scene.pointer_leave();
            return;
        };
        match kind {
            MouseEventKind::Down(MouseButton::Left) => self.scene.pointer_down(x, y, PointerKind::Mouse),
            MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Moved => self.scene.pointer_move(x, y),
            MouseEventKind::Up(MouseButton::Left) => self.scene.pointer_up(x, y),
            MouseEventKind::ScrollDown => self.scene.wheel(WHEEL_NOTCH),
            MouseEventKind::ScrollUp => self.scene.wheel(-WHEEL_NOTCH),
            _ => {}
        }
    }

    fn resize(&mut self, columns: u16, rows: u16) {
        debug!("terminal resized to {columns}x{rows}");
        self.columns = columns;
        self.rows = rows;
        let view_rows = rows.saturating_sub(HEADER_ROWS) as usize;
        self.renderer.resize(columns as usize, view_rows);
        let viewport = AsciiRenderer::viewport_for(columns as usize, view_rows);
        self.scene.resize(viewport.width(), viewport.height());
        self.update_panel();
    }

    fn panel_columns(&self) -> u16 {
        match self.selection {
            Some(_) => ((self.columns as f32 * PANEL_FRACTION) as u16).min(PANEL_MAX_COLUMNS),
            None => 0,
        }
    }

    fn update_panel(&mut self) {
        let panel = ReservedPanel {
            right: self.panel_columns() as f32 * CELL_WIDTH_PX,
            bottom: 0.0,
        };
        self.scene.set_reserved_panel(panel);
    }

    fn drain_scene_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                SceneEvent::Progress { completed, total } => self.progress = (completed, total),
                SceneEvent::Selected(selection) => {
                    self.selection = selection;
                    self.update_panel();
                }
                // The renderer keeps the tooltip of the frame it drew
                SceneEvent::Hover(_) => {}
            }
        }
    }

    fn render(&mut self) -> io::Result<()> {
        let mut stdout = stdout();
        self.renderer.draw(&mut stdout, HEADER_ROWS)?;

        // Title bar
        let (completed, total) = self.progress;
        let status = if completed < total {
            format!("loading {completed}/{total}")
        } else {
            format!("{} of {total} shown", self.scene.matching())
        };
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            terminal::Clear(ClearType::CurrentLine),
            SetForegroundColor(Color::Yellow),
            Print(fit(
                &format!(
                    "Mesh Gallery | {status} | FPS: {:.1} | Drag=Scroll/Orbit Click=Select Esc=Back Ctrl-C=Quit",
                    self.fps
                ),
                self.columns
            )),
            cursor::MoveTo(0, 1),
            terminal::Clear(ClearType::CurrentLine),
            SetForegroundColor(Color::Cyan),
            Print(fit(&format!("Search: {}_", self.filter), self.columns)),
            ResetColor
        )?;

        if let Some(hover) = self.renderer.tooltip() {
            self.render_tooltip(&mut stdout, hover)?;
        }
        if let Some(selection) = &self.selection {
            self.render_panel(&mut stdout, selection)?;
        }

        stdout.flush()?;
        Ok(())
    }

    fn render_tooltip<W: Write>(&self, out: &mut W, hover: &HoverInfo) -> io::Result<()> {
        let width = hover.name.chars().count() as f32;
        let column = (hover.x / CELL_WIDTH_PX - width / 2.0).max(0.0) as u16;
        let row = (hover.y / CELL_HEIGHT_PX) as u16 + HEADER_ROWS;
        if row >= self.rows || column >= self.columns {
            return Ok(());
        }
        queue!(
            out,
            cursor::MoveTo(column, row),
            SetForegroundColor(Color::Black),
            SetBackgroundColor(Color::Yellow),
            Print(fit(&hover.name, self.columns - column)),
            SetBackgroundColor(Color::Reset),
            ResetColor
        )
    }

    fn render_panel<W: Write>(&self, out: &mut W, selection: &Selection) -> io::Result<()> {
        let width = self.panel_columns();
        if width < 4 {
            return Ok(());
        }
        let left = self.columns - width;
        let inner = width - 2;

        let source = selection.source.as_deref().unwrap_or("no source available");
        let mut lines = vec![selection.name.clone(), "-".repeat(inner as usize)];
        lines.extend(source.lines().flat_map(|line| wrap(line, inner as usize)));

        for row in HEADER_ROWS..self.rows {
            let text = lines.get((row - HEADER_ROWS) as usize).map(String::as_str).unwrap_or("");
            queue!(
                out,
                cursor::MoveTo(left, row),
                SetForegroundColor(Color::DarkGrey),
                Print('|'),
                SetForegroundColor(if row == HEADER_ROWS { Color::Yellow } else { Color::White }),
                Print(format!(" {:<width$}", fit(text, inner), width = inner as usize)),
            )?;
        }
        queue!(out, ResetColor)
    }
}

/// What a key press does to the gallery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyAction {
    Quit,
    /// Leave selection, then clear search, then quit
    Back,
    Erase,
    Type(char),
    Ignore,
}

impl From<KeyEvent> for KeyAction {
    fn from(KeyEvent { code, modifiers, kind, .. }: KeyEvent) -> Self {
        if kind != KeyEventKind::Press {
            return KeyAction::Ignore;
        }
        let chord = modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);
        match code {
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => KeyAction::Quit,
            KeyCode::Esc => KeyAction::Back,
            KeyCode::Backspace => KeyAction::Erase,
            // Shift only changes case; other chords are not search text
            KeyCode::Char(c) if !chord => KeyAction::Type(c),
            _ => KeyAction::Ignore,
        }
    }
}

/// Centre of a terminal cell in scene pixels, or `None` over the header
pub fn cell_to_pixel(column: u16, row: u16) -> Option<(f32, f32)> {
    let row = row.checked_sub(HEADER_ROWS)?;
    Some((
        (column as f32 + 0.5) * CELL_WIDTH_PX,
        (row as f32 + 0.5) * CELL_HEIGHT_PX,
    ))
}

/// Truncate to at most `columns` characters
fn fit(text: &str, columns: u16) -> String {
    text.chars().take(columns as usize).collect()
}

/// Split a line into chunks of at most `width` characters
fn wrap(line: &str, width: usize) -> Vec<String> {
    if line.is_empty() || width == 0 {
        return vec![String::new()];
    }
    let chars: Vec<char> = line.chars().collect();
    chars.chunks(width).map(|chunk| chunk.iter().collect()).collect()
}
