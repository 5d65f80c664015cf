//! # Views and Layouts
//!
//! The distributed configuration shared by all processes: logical views,
//! the canvases they are laid out on, and the per-view camera state the
//! coordinator maintains. A view reaches its scene instance through a
//! [`SharedViewInstance`] handed out by [`ViewBinding`].

pub mod binding;
pub mod depth_bounds;

pub use binding::ViewBinding;
pub use depth_bounds::{DepthBounds, DepthBoundsCalculator};

use crate::foundation::math::{Mat4d, Point3d};
use crate::render::SharedViewInstance;
use crate::scene::SceneId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a logical view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ViewId(pub u64);

impl ViewId {
    /// No view
    pub const NONE: Self = Self(0);
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view#{}", self.0)
    }
}

/// Display mode of a view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewMode {
    /// One eye
    Mono,
    /// Two eyes
    Stereo,
}

/// A logical view of the distributed configuration
#[derive(Debug, Clone)]
pub struct View {
    id: ViewId,
    mode: ViewMode,
    scene_id: SceneId,
    view_matrix: Mat4d,
    near: f64,
    far: f64,
    world_pointer: Option<(Point3d, Point3d)>,
    binding: Option<SharedViewInstance>,
}

impl View {
    /// Create a mono view with the given initial depth range
    pub fn new(id: ViewId, near: f64, far: f64) -> Self {
        Self {
            id,
            mode: ViewMode::Mono,
            scene_id: SceneId::default(),
            view_matrix: Mat4d::identity(),
            near,
            far,
            world_pointer: None,
            binding: None,
        }
    }

    /// View identifier
    pub fn id(&self) -> ViewId {
        self.id
    }

    /// Display mode
    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    /// Switch display mode
    pub fn change_mode(&mut self, mode: ViewMode) {
        if self.mode != mode {
            log::info!("{} switched to {:?}", self.id, mode);
        }
        self.mode = mode;
    }

    /// Scene shown by this view
    pub fn scene_id(&self) -> SceneId {
        self.scene_id
    }

    /// Assign the scene shown by this view
    pub fn set_scene_id(&mut self, scene_id: SceneId) {
        self.scene_id = scene_id;
    }

    /// World-to-eye matrix from the last frame update
    pub fn view_matrix(&self) -> &Mat4d {
        &self.view_matrix
    }

    /// Set the world-to-eye matrix
    pub fn set_view_matrix(&mut self, matrix: Mat4d) {
        self.view_matrix = matrix;
    }

    /// Current depth range
    pub fn near_far(&self) -> (f64, f64) {
        (self.near, self.far)
    }

    /// Set the depth range
    pub fn set_near_far(&mut self, near: f64, far: f64) {
        self.near = near;
        self.far = far;
    }

    /// World-space pointer ray (near point, far point)
    pub fn world_pointer(&self) -> Option<(Point3d, Point3d)> {
        self.world_pointer
    }

    /// Store the world-space pointer ray
    pub fn set_world_pointer(&mut self, near: Point3d, far: Point3d) {
        self.world_pointer = Some((near, far));
    }

    /// Scene instance bound to this view
    pub fn binding(&self) -> Option<&SharedViewInstance> {
        self.binding.as_ref()
    }

    /// Bind a scene instance to this view
    pub fn set_binding(&mut self, instance: Option<SharedViewInstance>) {
        self.binding = instance;
    }
}

/// A display surface with alternative layouts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    name: String,
    layout_count: usize,
    active_layout: usize,
}

impl Canvas {
    /// Create a canvas with `layout_count` layouts, the first one active
    pub fn new(name: impl Into<String>, layout_count: usize) -> Self {
        Self {
            name: name.into(),
            layout_count,
            active_layout: 0,
        }
    }

    /// Canvas name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Index of the active layout
    pub fn active_layout_index(&self) -> usize {
        self.active_layout
    }

    /// Activate a layout; out-of-range indices are ignored
    pub fn use_layout(&mut self, index: usize) -> bool {
        if index >= self.layout_count {
            log::warn!("Canvas '{}' has no layout {}", self.name, index);
            return false;
        }
        self.active_layout = index;
        log::info!("Canvas '{}' now uses layout {}", self.name, index);
        true
    }
}

/// Views and canvases shared by every process, views in configuration order
#[derive(Debug, Clone, Default)]
pub struct DistributedConfig {
    /// Logical views
    pub views: Vec<View>,
    /// Canvases
    pub canvases: Vec<Canvas>,
}

impl DistributedConfig {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Find a view by id
    pub fn find_view(&self, id: ViewId) -> Option<&View> {
        self.views.iter().find(|view| view.id == id)
    }

    /// Find a view by id, mutably
    pub fn find_view_mut(&mut self, id: ViewId) -> Option<&mut View> {
        self.views.iter_mut().find(|view| view.id == id)
    }

    /// Find a canvas by name, mutably
    pub fn find_canvas_mut(&mut self, name: &str) -> Option<&mut Canvas> {
        self.canvases.iter_mut().find(|canvas| canvas.name == name)
    }

    /// Find a canvas by name
    pub fn find_canvas(&self, name: &str) -> Option<&Canvas> {
        self.canvases.iter().find(|canvas| canvas.name == name)
    }
}
