//! Test collaborators

use crate::cluster::{ClusterFramework, FrameworkError};
use crate::core::config::CoordinatorConfig;
use crate::distrib::{LocalObjectStore, ObjectId, ObjectStore, Version};
use crate::foundation::math::{Frustum, PixelViewport};
use crate::input::{ConfigEvent, ConfigEventKind, EventContext};
use crate::render::{ContextFactory, ContextTraits, DrawRequest, GraphicsContext};
use crate::scene::{Ellipsoid, MapNode, SceneError, SceneLoader, SceneNode};
use crate::view::{Canvas, DistributedConfig, View, ViewId};
use crate::FrameCoordinator;
use parking_lot::Mutex;
use std::sync::Arc;

pub struct EarthLoader;

impl SceneLoader for EarthLoader {
    fn read_node_file(&self, _path: &str) -> Result<SceneNode, SceneError> {
        Ok(SceneNode::Map(MapNode::geocentric("earth", Ellipsoid::WGS84)))
    }
}

pub struct FlatLoader;

impl SceneLoader for FlatLoader {
    fn read_node_file(&self, path: &str) -> Result<SceneNode, SceneError> {
        Ok(SceneNode::model(path))
    }
}

#[derive(Default)]
pub struct ContextLog {
    pub created: u32,
    pub texture_pool: u64,
    pub draws: Vec<DrawRequest>,
    pub finishes: u32,
}

struct RecordingContext {
    log: Arc<Mutex<ContextLog>>,
}

impl GraphicsContext for RecordingContext {
    fn realize(&mut self) -> bool {
        true
    }

    fn make_current(&mut self) {}

    fn set_max_texture_pool_size(&mut self, bytes: u64) {
        self.log.lock().texture_pool = bytes;
    }

    fn set_max_buffer_object_pool_size(&mut self, _bytes: u64) {}

    fn draw(&mut self, request: &DrawRequest) {
        self.log.lock().draws.push(request.clone());
    }

    fn finish(&mut self) {
        self.log.lock().finishes += 1;
    }
}

/// Creates recording contexts, or nothing at all when `available` is false
pub struct RecordingContextFactory {
    pub available: bool,
    pub log: Arc<Mutex<ContextLog>>,
}

impl RecordingContextFactory {
    pub fn new(available: bool) -> Self {
        Self {
            available,
            log: Arc::new(Mutex::new(ContextLog::default())),
        }
    }
}

impl ContextFactory for RecordingContextFactory {
    fn create(&self, _traits: &ContextTraits) -> Option<Box<dyn GraphicsContext>> {
        if !self.available {
            return None;
        }
        self.log.lock().created += 1;
        Some(Box::new(RecordingContext { log: Arc::clone(&self.log) }))
    }
}

/// Framework double recording what the coordinator asked of it
#[derive(Default)]
pub struct RecordingFramework {
    pub config: DistributedConfig,
    pub nodes: usize,
    pub fail_init: bool,
    pub init_ids: Vec<ObjectId>,
    pub versions: Vec<Version>,
    pub finished: u32,
    pub exits: u32,
    pub unhandled: Vec<ConfigEventKind>,
    frame: u32,
}

impl RecordingFramework {
    pub fn new(config: DistributedConfig, nodes: usize) -> Self {
        Self { config, nodes, ..Self::default() }
    }
}

impl ClusterFramework for RecordingFramework {
    fn init(&mut self, init_id: ObjectId) -> Result<(), FrameworkError> {
        self.init_ids.push(init_id);
        if self.fail_init {
            return Err(FrameworkError::Init("refused".to_string()));
        }
        Ok(())
    }

    fn exit(&mut self) -> Result<(), FrameworkError> {
        self.exits += 1;
        Ok(())
    }

    fn start_frame(&mut self, version: Version) -> u32 {
        self.versions.push(version);
        self.frame += 1;
        self.frame
    }

    fn finish_frame(&mut self) -> u32 {
        self.finished = self.frame;
        self.frame
    }

    fn handle_event(&mut self, event: &ConfigEvent) -> bool {
        self.unhandled.push(event.kind.clone());
        false
    }

    fn node_count(&self) -> usize {
        self.nodes
    }

    fn current_frame(&self) -> u32 {
        self.frame
    }

    fn time_ms(&self) -> i64 {
        i64::from(self.frame) * 16
    }

    fn config(&self) -> &DistributedConfig {
        &self.config
    }

    fn config_mut(&mut self) -> &mut DistributedConfig {
        &mut self.config
    }
}

/// Views with the given ids plus the two-layout "clove" canvas
pub fn distributed_config(view_ids: &[u64]) -> DistributedConfig {
    let defaults = CoordinatorConfig::default().view;
    let mut config = DistributedConfig::new();
    for &id in view_ids {
        config.views.push(View::new(ViewId(id), defaults.near, defaults.far));
    }
    config.canvases.push(Canvas::new("clove", 2));
    config
}

pub struct Fixture {
    pub store: Arc<LocalObjectStore>,
    pub contexts: Arc<Mutex<ContextLog>>,
    pub coordinator: FrameCoordinator<RecordingFramework>,
}

pub fn fixture(loader: Arc<dyn SceneLoader>, view_ids: &[u64], context_available: bool) -> Fixture {
    let store = Arc::new(LocalObjectStore::default());
    let factory = RecordingContextFactory::new(context_available);
    let contexts = Arc::clone(&factory.log);
    let framework = RecordingFramework::new(distributed_config(view_ids), 1);

    let coordinator = FrameCoordinator::new(
        CoordinatorConfig::default(),
        framework,
        Arc::clone(&store) as Arc<dyn ObjectStore>,
        loader,
        Arc::new(factory),
    )
    .unwrap();

    Fixture { store, contexts, coordinator }
}

pub fn channel(view_id: u64) -> EventContext {
    EventContext::new(ViewId(view_id), PixelViewport::sized(640, 480), Frustum::default())
}

pub fn event(kind: ConfigEventKind, view_id: u64) -> ConfigEvent {
    ConfigEvent::new(kind, channel(view_id))
}
