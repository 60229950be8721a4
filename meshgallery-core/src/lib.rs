/// Mesh Gallery Core Library - scene interaction engine
///
/// Geometry, STL decoding and camera math, plus the gallery scene built on
/// them: mesh ingestion, grid layout, search filtering, the camera state
/// machine, pointer routing, hover highlighting and the per-frame driver.

pub mod camera;
pub mod config;
pub mod controller;
pub mod error;
pub mod filter;
pub mod geometry;
pub mod hover;
pub mod ingest;
pub mod interaction;
pub mod layout;
pub mod registry;
pub mod scene;
pub mod stl;
pub mod transform;

// Re-export commonly used types
pub use camera::{Camera, Ray, Viewport};
pub use config::{GlowConfig, LoaderConfig, SceneConfig};
pub use controller::{ReservedPanel, ViewMode};
pub use error::{FetchError, IngestError, MeshError};
pub use geometry::{Aabb, Mesh, Triangle, Vertex};
pub use hover::HoverInfo;
pub use ingest::{ContentSource, DirectorySource, FileEntry, Loader, MemorySource, MeshDecoder, StlDecoder};
pub use interaction::PointerKind;
pub use registry::{ObjectId, SceneObject};
pub use scene::{FrameView, GalleryScene, ObjectView, SceneEvent, SceneRenderer, Selection};
pub use transform::{RotationState, Transform};
