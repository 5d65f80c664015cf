//! # Cluster Framework
//!
//! The process and frame management the coordinator builds on. A framework
//! owns the distributed configuration, starts the rendering processes with
//! the init data id, forwards each frame's committed state version and
//! provides the frame barrier.
//!
//! [`LocalCluster`] runs the rendering processes as threads of the current
//! process, sharing one [`crate::distrib::LocalObjectStore`] and the
//! coordinator's [`ViewBinding`].

pub mod local;
pub mod node;

pub use local::{LocalCluster, NodeObservation};
pub use node::RenderNode;

use crate::distrib::{ObjectId, StoreError, Version};
use crate::input::ConfigEvent;
use crate::scene::SceneError;
use crate::view::{DistributedConfig, ViewBinding};
use std::sync::Arc;
use thiserror::Error;

/// Framework errors
#[derive(Error, Debug)]
pub enum FrameworkError {
    /// The framework refused to initialize
    #[error("Cluster init failed: {0}")]
    Init(String),

    /// A rendering process failed
    #[error("Render node {node} failed: {reason}")]
    Node {
        /// Index of the node
        node: usize,
        /// What went wrong
        reason: String,
    },

    /// A rendering process went away
    #[error("Render node {0} disconnected")]
    Disconnected(usize),

    /// Replication error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A rendering process could not get a scene instance
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),
}

/// Process, frame and configuration management consumed by the coordinator
pub trait ClusterFramework: Send {
    /// Hand the coordinator's view binding to rendering processes that live
    /// in this address space; called before [`Self::init`]
    fn share_view_binding(&mut self, _binding: Arc<ViewBinding>) {}

    /// Start every rendering process with the id of the init data
    fn init(&mut self, init_id: ObjectId) -> Result<(), FrameworkError>;

    /// Stop every rendering process
    fn exit(&mut self) -> Result<(), FrameworkError>;

    /// Start a frame showing `version` of the frame state; returns the frame number
    fn start_frame(&mut self, version: Version) -> u32;

    /// Wait until every rendering process finished the current frame; returns its number
    fn finish_frame(&mut self) -> u32;

    /// Default handling of events the coordinator did not consume
    fn handle_event(&mut self, event: &ConfigEvent) -> bool;

    /// Number of rendering processes
    fn node_count(&self) -> usize;

    /// Number of the most recently started frame
    fn current_frame(&self) -> u32;

    /// Milliseconds since the framework started
    fn time_ms(&self) -> i64;

    /// The distributed configuration
    fn config(&self) -> &DistributedConfig;

    /// The distributed configuration, mutably
    fn config_mut(&mut self) -> &mut DistributedConfig;
}
