/// Mesh Gallery - browse STL meshes in the terminal
///
/// Controls:
///   - Drag: scroll the grid, or orbit the selected mesh
///   - Wheel: scroll the grid
///   - Click: select a mesh / return to the grid
///   - Type: search by name, Backspace to edit
///   - Esc: leave selection, then clear search, then quit
///   - Ctrl-C: quit
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use log::info;
use meshgallery_core::{ContentSource, DirectorySource, LoaderConfig, SceneConfig};
use meshgallery_terminal::{demo, TerminalApp};

#[derive(Parser, Debug)]
#[command(name = "meshgallery")]
#[command(about = "Browse a directory of STL meshes as a 3D grid in the terminal")]
struct Cli {
    /// Directory of .stl files; the built-in demo gallery is shown when omitted
    dir: Option<PathBuf>,

    /// Initial search text
    #[arg(long, default_value = "")]
    filter: String,

    /// Number of background loader threads
    #[arg(long, default_value_t = 4)]
    workers: usize,

    /// Pause before each load, in milliseconds
    #[arg(long, default_value_t = 40)]
    stagger_ms: u64,

    /// Write logs to this file (the terminal is busy drawing)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_logging(log_file: Option<&Path>) -> io::Result<()> {
    let default = if log_file.is_some() { "info" } else { "error" };
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default));
    builder.format_timestamp_millis();
    if let Some(path) = log_file {
        builder.target(env_logger::Target::Pipe(Box::new(File::create(path)?)));
    }
    let _ = builder.try_init();
    Ok(())
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref())?;

    let (source, entries) = match &cli.dir {
        Some(dir) => {
            let source = DirectorySource::new(dir);
            let entries = source.list().map_err(io::Error::other)?;
            (Arc::new(source) as Arc<dyn ContentSource>, entries)
        }
        None => {
            let (source, entries) = demo::demo_gallery();
            (Arc::new(source) as Arc<dyn ContentSource>, entries)
        }
    };
    info!("starting gallery with {} entries", entries.len());

    let loader = LoaderConfig {
        workers: cli.workers.max(1),
        stagger: Duration::from_millis(cli.stagger_ms),
    };

    let mut app = TerminalApp::new(SceneConfig::default())?;
    app.set_filter(&cli.filter);
    app.load(entries, source, &loader)?;
    app.run()
}
