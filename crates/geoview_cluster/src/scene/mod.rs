//! # Scene Management
//!
//! Scenes are built once per scene id from the model file, then shared by every
//! view showing them. Only the capabilities the coordinator needs are modelled:
//! whether the scene is geocentric, its ellipsoid, the map root and an optional
//! sky decoration.

pub mod graph;
pub mod scene_cache;

pub use graph::{Ellipsoid, MapNode, Profile, SceneNode, SkyNode};
pub use scene_cache::{SceneCache, SceneLoader};

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Identifier of a scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SceneId(pub u64);

impl SceneId {
    /// The scene built from the init data's model file
    pub const PRIMARY: Self = Self(1);
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scene#{}", self.0)
    }
}

/// Coordinate frame of a scene as far as depth bounds are concerned
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoordinateFrame {
    /// Flat or projected scene; depth bounds are left to the caller
    Projected,
    /// Planet-relative scene around an ellipsoid
    Geocentric {
        /// Polar radius of the reference ellipsoid
        polar_radius: f64,
    },
}

/// A built scene, shared between views
#[derive(Debug, Clone)]
pub struct Scene {
    id: SceneId,
    root: SceneNode,
}

impl Scene {
    /// Wrap a scene graph
    pub fn new(id: SceneId, root: SceneNode) -> Self {
        Self { id, root }
    }

    /// Scene identifier
    pub fn id(&self) -> SceneId {
        self.id
    }

    /// Root node
    pub fn root(&self) -> &SceneNode {
        &self.root
    }

    /// Topmost map node, if the scene contains a map
    pub fn find_map_node(&self) -> Option<&MapNode> {
        self.root.find_map_node()
    }

    /// Topmost sky decoration, if any
    pub fn find_sky(&self) -> Option<&SkyNode> {
        self.root.find_sky()
    }

    /// Whether the scene is planet-relative
    pub fn is_geocentric(&self) -> bool {
        self.find_map_node().is_some_and(MapNode::is_geocentric)
    }

    /// Coordinate frame used for depth bounds
    pub fn coordinate_frame(&self) -> CoordinateFrame {
        match self.find_map_node() {
            Some(map) if map.is_geocentric() => map
                .ellipsoid()
                .map_or(CoordinateFrame::Projected, |ellipsoid| CoordinateFrame::Geocentric {
                    polar_radius: ellipsoid.radius_polar,
                }),
            _ => CoordinateFrame::Projected,
        }
    }
}

/// Scene loading errors
#[derive(Error, Debug)]
pub enum SceneError {
    /// Only a fixed set of scene ids can be built
    #[error("Unsupported scene id {0}")]
    UnsupportedScene(SceneId),

    /// The model file could not be loaded
    #[error("Failed to load model '{path}': {reason}")]
    Load {
        /// Model file path
        path: String,
        /// Loader message
        reason: String,
    },
}
