//! # Geoview Cluster
//!
//! Per-frame coordination layer of a cluster-distributed planet viewer. One
//! coordinating process owns input, cameras and application state; any
//! number of rendering processes draw the views it describes.
//!
//! ## Features
//!
//! - **Frame State Replication**: a small versioned record committed once per
//!   frame and synced by every rendering process
//! - **View Binding**: scene instances handed between the local interactive
//!   viewer and the distributed rendering path
//! - **Geocentric Depth Bounds**: near/far planes derived from altitude above
//!   the ellipsoid
//! - **Input Translation**: framework pointer and key events applied to camera
//!   manipulators with the producing channel's viewport and projection
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use geoview_cluster::prelude::*;
//! use std::sync::Arc;
//!
//! struct EarthLoader;
//!
//! impl SceneLoader for EarthLoader {
//!     fn read_node_file(&self, _path: &str) -> Result<SceneNode, SceneError> {
//!         Ok(SceneNode::Map(MapNode::geocentric("earth", Ellipsoid::WGS84)))
//!     }
//! }
//!
//! struct Headless;
//!
//! impl ContextFactory for Headless {
//!     fn create(&self, _traits: &ContextTraits) -> Option<Box<dyn GraphicsContext>> {
//!         None
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CoordinatorConfig::default();
//!     let store: Arc<dyn ObjectStore> = Arc::new(LocalObjectStore::new(config.store.history_depth));
//!     let mut views = DistributedConfig::new();
//!     views.views.push(View::new(ViewId(1), config.view.near, config.view.far));
//!
//!     let cluster = LocalCluster::new(Arc::clone(&store), views, 2);
//!     let mut coordinator =
//!         FrameCoordinator::new(config, cluster, store, Arc::new(EarthLoader), Arc::new(Headless))?;
//!
//!     coordinator.init()?;
//!     for _ in 0..10 {
//!         coordinator.start_frame()?;
//!         coordinator.finish_frame();
//!     }
//!     coordinator.exit()?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core configuration and utilities
pub mod core;
pub mod config;
pub mod foundation;

// Replication and cluster plumbing
pub mod distrib;
pub mod cluster;

// Scene, views and input
pub mod scene;
pub mod view;
pub mod render;
pub mod manipulator;
pub mod input;

pub mod coordinator;

#[cfg(test)]
mod tests;

pub use coordinator::{CoordinatorError, FrameCoordinator};

/// Common imports for users of the coordination layer
pub mod prelude {
    pub use crate::{
        FrameCoordinator, CoordinatorError,
        cluster::{ClusterFramework, FrameworkError, LocalCluster, NodeObservation, RenderNode},
        core::config::{Config, CoordinatorConfig},
        distrib::{FrameData, InitData, LocalObjectStore, ObjectId, ObjectStore, StoreError},
        input::{ConfigEvent, ConfigEventKind, EventContext, KeySym, PointerButtons},
        render::{ContextFactory, ContextTraits, DrawRequest, GraphicsContext},
        scene::{Ellipsoid, MapNode, SceneError, SceneLoader, SceneNode},
        view::{Canvas, DistributedConfig, View, ViewBinding, ViewId, ViewMode},
        foundation::math::{Frustum, PixelViewport},
    };
}
