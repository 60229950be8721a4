/// Mesh ingestion: fetch and decode off the render thread, one command per entry
use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{debug, info, warn};

use crate::config::{LoaderConfig, SceneConfig};
use crate::error::{FetchError, IngestError, MeshError};
use crate::geometry::Mesh;
use crate::registry::{LoadedObject, ObjectGeometry, ObjectId};
use crate::stl;

/// Where a piece of content lives, as understood by a [`ContentSource`]
pub type Locator = String;

/// One mesh file in a gallery listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub content: Locator,
    pub source: Option<Locator>,
}

impl FileEntry {
    pub fn new(name: impl Into<String>, content: impl Into<Locator>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<Locator>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Retrieves raw bytes for a locator
pub trait ContentSource: Send + Sync {
    fn fetch(&self, locator: &str) -> Result<Vec<u8>, FetchError>;

    fn fetch_text(&self, locator: &str) -> Result<String, FetchError> {
        let bytes = self.fetch(locator)?;
        String::from_utf8(bytes).map_err(|_| FetchError::NotText(locator.to_string()))
    }
}

/// Turns raw bytes into a triangle mesh
pub trait MeshDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<Mesh, MeshError>;
}

/// Binary and ASCII STL
#[derive(Debug, Clone, Copy, Default)]
pub struct StlDecoder;

impl MeshDecoder for StlDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<Mesh, MeshError> {
        stl::parse_stl(bytes)
    }
}

/// Content held in memory, keyed by locator
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: HashMap<Locator, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, locator: impl Into<Locator>, bytes: impl Into<Vec<u8>>) {
        self.files.insert(locator.into(), bytes.into());
    }
}

impl ContentSource for MemorySource {
    fn fetch(&self, locator: &str) -> Result<Vec<u8>, FetchError> {
        self.files
            .get(locator)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(locator.to_string()))
    }
}

/// Extensions tried, in order, for a mesh's paired source file
const SOURCE_EXTENSIONS: &[&str] = &["scad", "txt", "md"];

/// A local directory of `.stl` files with optional same-stem source files
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Every `.stl` file directly under the root, sorted by file name.
    /// Sources pair by exact stem only.
    pub fn list(&self) -> Result<Vec<FileEntry>, FetchError> {
        let io_err = |source| FetchError::Io {
            locator: self.root.display().to_string(),
            source,
        };

        let mut names: Vec<String> = fs::read_dir(&self.root)
            .map_err(io_err)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        names.sort();

        let entries: Vec<FileEntry> = names
            .iter()
            .filter(|name| is_stl(name))
            .map(|name| {
                let entry = FileEntry::new(name.clone(), name.clone());
                match paired_source(name, &names) {
                    Some(source) => entry.with_source(source),
                    None => entry,
                }
            })
            .collect();

        info!("found {} meshes in {}", entries.len(), self.root.display());
        Ok(entries)
    }

    fn resolve(&self, locator: &str) -> Option<PathBuf> {
        let relative = Path::new(locator);
        let plain = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        plain.then(|| self.root.join(relative))
    }
}

fn is_stl(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("stl"))
}

fn paired_source(name: &str, names: &[String]) -> Option<String> {
    let stem = Path::new(name).file_stem()?.to_str()?;
    SOURCE_EXTENSIONS
        .iter()
        .map(|ext| format!("{stem}.{ext}"))
        .find(|candidate| names.iter().any(|n| n == candidate))
}

impl ContentSource for DirectorySource {
    fn fetch(&self, locator: &str) -> Result<Vec<u8>, FetchError> {
        let path = self
            .resolve(locator)
            .ok_or_else(|| FetchError::NotFound(locator.to_string()))?;
        fs::read(&path).map_err(|source| FetchError::Io {
            locator: locator.to_string(),
            source,
        })
    }
}

/// Result of one ingestion attempt, tagged with the session it belongs to
#[derive(Debug)]
pub enum SceneCommand {
    Loaded {
        generation: u64,
        object: LoadedObject,
    },
    Failed {
        generation: u64,
        id: ObjectId,
        error: IngestError,
    },
}

/// Handle that reports ingestion results for one load session
#[derive(Debug, Clone)]
pub struct IngestSession {
    pub(crate) generation: u64,
    pub(crate) tx: Sender<SceneCommand>,
    pub(crate) config: SceneConfig,
}

impl IngestSession {
    /// Report an attempt. Returns `false` once the scene is gone.
    pub fn complete(&self, id: ObjectId, result: Result<LoadedObject, IngestError>) -> bool {
        let command = match result {
            Ok(object) => SceneCommand::Loaded {
                generation: self.generation,
                object,
            },
            Err(error) => SceneCommand::Failed {
                generation: self.generation,
                id,
                error,
            },
        };
        self.tx.send(command).is_ok()
    }

    /// Decode bytes already in hand and report the outcome
    pub fn complete_bytes(
        &self,
        id: ObjectId,
        name: &str,
        bytes: &[u8],
        source: Option<String>,
        decoder: &dyn MeshDecoder,
    ) -> bool {
        let result = build_object(id, name, bytes, source, decoder, &self.config);
        self.complete(id, result)
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }
}

fn build_object(
    id: ObjectId,
    name: &str,
    bytes: &[u8],
    source: Option<String>,
    decoder: &dyn MeshDecoder,
    config: &SceneConfig,
) -> Result<LoadedObject, IngestError> {
    let decode_err = |source| IngestError::Decode {
        name: name.to_string(),
        source,
    };
    let mesh = decoder.decode(bytes).map_err(decode_err)?;
    let geometry = ObjectGeometry::from_mesh(mesh, config).map_err(decode_err)?;
    Ok(LoadedObject {
        id,
        name: name.to_string(),
        source,
        geometry,
    })
}

/// Fetch, decode and build one entry. A missing paired source is not an error.
pub fn load_entry(
    id: ObjectId,
    entry: &FileEntry,
    source: &dyn ContentSource,
    decoder: &dyn MeshDecoder,
    config: &SceneConfig,
) -> Result<LoadedObject, IngestError> {
    let bytes = source.fetch(&entry.content)?;
    let text = entry.source.as_deref().and_then(|locator| {
        source
            .fetch_text(locator)
            .map_err(|e| warn!("no paired source for {}: {e}", entry.name))
            .ok()
    });
    build_object(id, &entry.name, &bytes, text, decoder, config)
}

/// Background worker pool running one load session.
///
/// Entries are dealt round-robin to the workers; each worker pauses for the
/// configured stagger before every job so loads do not start in one burst.
pub struct Loader {
    cancelled: Arc<AtomicBool>,
    workers: Vec<JoinHandle<()>>,
}

impl Loader {
    pub fn spawn(
        entries: Vec<FileEntry>,
        source: Arc<dyn ContentSource>,
        decoder: Arc<dyn MeshDecoder>,
        session: IngestSession,
        config: &LoaderConfig,
    ) -> std::io::Result<Self> {
        let worker_count = config.workers.max(1).min(entries.len().max(1));
        let mut queues: Vec<Vec<(ObjectId, FileEntry)>> = vec![Vec::new(); worker_count];
        for (index, entry) in entries.into_iter().enumerate() {
            queues[index % worker_count].push((ObjectId(index), entry));
        }

        let cancelled = Arc::new(AtomicBool::new(false));
        let mut workers = Vec::with_capacity(worker_count);
        for (n, jobs) in queues.into_iter().enumerate() {
            let cancelled = Arc::clone(&cancelled);
            let source = Arc::clone(&source);
            let decoder = Arc::clone(&decoder);
            let session = session.clone();
            let stagger = config.stagger;

            let handle = thread::Builder::new()
                .name(format!("mesh-ingest-{n}"))
                .spawn(move || {
                    for (id, entry) in jobs {
                        if !stagger.is_zero() {
                            thread::sleep(stagger);
                        }
                        if cancelled.load(Ordering::Relaxed) {
                            break;
                        }
                        let result = load_entry(id, &entry, source.as_ref(), decoder.as_ref(), session.config());
                        match &result {
                            Ok(_) => debug!("loaded {} ({id})", entry.name),
                            Err(e) => debug!("failed to load {}: {e}", entry.name),
                        }
                        if !session.complete(id, result) {
                            debug!("scene dropped, stopping ingest worker {n}");
                            break;
                        }
                    }
                })?;
            workers.push(handle);
        }

        Ok(Self { cancelled, workers })
    }

    /// Stop workers before their next job. In-flight jobs finish and their
    /// results are discarded if the scene has moved on.
    pub fn shutdown(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Block until every worker has exited
    pub fn wait(mut self) {
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                warn!("ingest worker panicked");
            }
        }
    }
}

impl Drop for Loader {
    fn drop(&mut self) {
        self.shutdown();
    }
}
