/// Loaded gallery objects and their per-frame state
use std::fmt;

use log::warn;
use nalgebra::{Matrix4, Point3};

use crate::config::SceneConfig;
use crate::error::MeshError;
use crate::filter::FuzzyQuery;
use crate::geometry::Mesh;
use crate::transform::{RotationState, Transform};

/// Ingestion index of an object, 0-based. The only stable ordering key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(pub usize);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Render data computed once when a mesh finishes loading
#[derive(Debug, Clone)]
pub struct ObjectGeometry {
    pub mesh: Mesh,
    /// Bounding-box centre in mesh coordinates
    pub center: Point3<f32>,
    /// Uniform scale mapping the longest dimension to the visual size
    pub scale: f32,
    /// Radius of the approximate hit sphere around the grid position
    pub hit_radius: f32,
}

impl ObjectGeometry {
    pub fn from_mesh(mesh: Mesh, config: &SceneConfig) -> Result<Self, MeshError> {
        let bounds = mesh.bounds().ok_or(MeshError::Empty)?;
        let longest = bounds.longest_dimension();
        let scale = if longest.is_finite() && longest > 1e-6 {
            config.visual_size / longest
        } else {
            warn!("mesh has a degenerate bounding box ({longest}), using unit scale");
            1.0
        };

        Ok(Self {
            mesh,
            center: bounds.center(),
            scale,
            hit_radius: config.hit_radius(),
        })
    }
}

/// A fully formed object ready to be appended to the registry
#[derive(Debug, Clone)]
pub struct LoadedObject {
    pub id: ObjectId,
    pub name: String,
    pub source: Option<String>,
    pub geometry: ObjectGeometry,
}

/// Transient render state touched every frame
#[derive(Debug, Clone, Copy)]
pub struct VisualState {
    pub opacity: f32,
    pub visible: bool,
    pub rotation: RotationState,
}

impl Default for VisualState {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            visible: true,
            rotation: RotationState::zero(),
        }
    }
}

/// One mesh in the gallery
#[derive(Debug, Clone)]
pub struct SceneObject {
    id: ObjectId,
    name: String,
    source: Option<String>,
    geometry: ObjectGeometry,
    grid_position: Point3<f32>,
    matches_filter: bool,
    pub visual: VisualState,
}

impl SceneObject {
    fn new(loaded: LoadedObject, query: &FuzzyQuery) -> Self {
        let matches_filter = query.matches(&loaded.name);
        Self {
            id: loaded.id,
            name: loaded.name,
            source: loaded.source,
            geometry: loaded.geometry,
            grid_position: Point3::origin(),
            matches_filter,
            visual: VisualState::default(),
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn geometry(&self) -> &ObjectGeometry {
        &self.geometry
    }

    pub fn grid_position(&self) -> Point3<f32> {
        self.grid_position
    }

    pub fn matches_filter(&self) -> bool {
        self.matches_filter
    }

    /// Only the layout engine writes grid positions
    pub(crate) fn set_grid_position(&mut self, position: Point3<f32>) {
        self.grid_position = position;
    }

    pub fn model_matrix(&self) -> Matrix4<f32> {
        Transform::placement(
            &self.grid_position,
            &self.visual.rotation,
            self.geometry.scale,
            &self.geometry.center,
        )
    }
}

/// Owner of every loaded object, kept sorted by id
#[derive(Debug, Default)]
pub struct MeshRegistry {
    objects: Vec<SceneObject>,
    query: FuzzyQuery,
    succeeded: usize,
    failed: usize,
    total: usize,
}

impl MeshRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every object and start counting toward a new total
    pub fn reset(&mut self, total: usize) {
        self.objects.clear();
        self.succeeded = 0;
        self.failed = 0;
        self.total = total;
    }

    /// Append a loaded object at its id-ordered slot. A duplicate id is ignored.
    pub fn insert(&mut self, loaded: LoadedObject) -> bool {
        match self.objects.binary_search_by_key(&loaded.id, |o| o.id) {
            Ok(_) => {
                warn!("object {} already loaded, ignoring duplicate", loaded.id);
                false
            }
            Err(slot) => {
                let object = SceneObject::new(loaded, &self.query);
                self.objects.insert(slot, object);
                self.succeeded += 1;
                true
            }
        }
    }

    pub fn record_failure(&mut self) {
        self.failed += 1;
    }

    /// `(succeeded + failed, total)`
    pub fn progress(&self) -> (usize, usize) {
        (self.succeeded + self.failed, self.total)
    }

    /// Recompute `matches_filter` for every object
    pub fn apply_filter(&mut self, query: FuzzyQuery) {
        for object in &mut self.objects {
            object.matches_filter = query.matches(&object.name);
        }
        self.query = query;
    }

    pub fn query(&self) -> &FuzzyQuery {
        &self.query
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects
            .binary_search_by_key(&id, |o| o.id)
            .ok()
            .map(|i| &self.objects[i])
    }

    /// Objects in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut SceneObject> {
        self.objects.iter_mut()
    }

    pub fn matching(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.iter().filter(|o| o.matches_filter)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub(crate) fn objects_mut(&mut self) -> &mut [SceneObject] {
        &mut self.objects
    }
}
