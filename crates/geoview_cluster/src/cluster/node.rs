//! A rendering process

use super::FrameworkError;
use crate::distrib::{FrameData, FrameDataReplica, InitData, InitDataSlot, ObjectId, ObjectStore, StoreError, Version};
use crate::render::SharedViewInstance;
use crate::scene::SceneId;
use crate::view::ViewBinding;
use std::sync::Arc;

/// Rendering-process side of the replication: maps the init data once, then
/// follows the frame state version by version.
///
/// A node running in the coordinating process checks an instance of the
/// primary scene out of the shared [`ViewBinding`] for as long as it is
/// initialized, and hands it back on exit.
pub struct RenderNode {
    index: usize,
    store: Arc<dyn ObjectStore>,
    binding: Option<Arc<ViewBinding>>,
    init_data: InitDataSlot,
    frame_data: Option<FrameDataReplica>,
    instance: Option<SharedViewInstance>,
}

impl RenderNode {
    /// Create node `index` reading from `store`
    pub fn new(index: usize, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            index,
            store,
            binding: None,
            init_data: InitDataSlot::default(),
            frame_data: None,
            instance: None,
        }
    }

    /// Render scene instances checked out of `binding`
    #[must_use]
    pub fn with_binding(mut self, binding: Arc<ViewBinding>) -> Self {
        self.binding = Some(binding);
        self
    }

    /// Node index
    pub fn index(&self) -> usize {
        self.index
    }

    /// Map the init data and the frame state it references, then check out
    /// a scene instance if a binding is shared with this node
    pub fn config_init(&mut self, init_id: ObjectId) -> Result<(), FrameworkError> {
        self.init_data.map(self.store.as_ref(), init_id)?;

        let frame_data_id = self.init_data.data().frame_data_id();
        self.frame_data = Some(FrameDataReplica::map(self.store.as_ref(), frame_data_id)?);

        if let Some(binding) = &self.binding {
            let instance = binding.take_or_create(SceneId::PRIMARY, self.init_data.data().model_file_name())?;
            self.instance = Some(instance);
        }

        log::info!(
            "Render node {} initialized with model '{}'",
            self.index,
            self.init_data.data().model_file_name()
        );
        Ok(())
    }

    /// Sync the frame state to `version`, blocking until it is committed
    pub fn frame_start(&mut self, version: Version) -> Result<&FrameData, StoreError> {
        let replica = self
            .frame_data
            .as_mut()
            .ok_or(StoreError::NotRegistered(ObjectId::ZERO))?;
        replica.sync(self.store.as_ref(), version)
    }

    /// Frame state as of the last synced version
    pub fn frame_data(&self) -> Option<&FrameData> {
        self.frame_data.as_ref().map(FrameDataReplica::data)
    }

    /// Init data read at startup
    pub fn init_data(&self) -> &InitData {
        self.init_data.data()
    }

    /// Scene instance checked out by this node
    pub fn instance(&self) -> Option<&SharedViewInstance> {
        self.instance.as_ref()
    }

    /// Scene this node renders, if it holds an instance
    pub fn scene_id(&self) -> Option<SceneId> {
        self.instance.as_ref().map(|instance| instance.lock().scene_id())
    }

    /// Hand the scene instance back, then drop the replica and the init data mapping
    pub fn config_exit(&mut self) {
        if let (Some(binding), Some(instance)) = (&self.binding, self.instance.take()) {
            binding.release(&instance);
        }
        self.frame_data = None;
        self.init_data.reset();
        log::debug!("Render node {} exited", self.index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distrib::LocalObjectStore;
    use crate::render::InteractiveViewer;
    use crate::scene::{Ellipsoid, MapNode, SceneError, SceneLoader, SceneNode};

    struct EarthLoader;

    impl SceneLoader for EarthLoader {
        fn read_node_file(&self, _path: &str) -> Result<SceneNode, SceneError> {
            Ok(SceneNode::Map(MapNode::geocentric("earth", Ellipsoid::WGS84)))
        }
    }

    fn published(store: &LocalObjectStore) -> (FrameData, ObjectId) {
        let mut frame_data = FrameData::new();
        let frame_data_id = frame_data.register(store).unwrap();
        let mut init_data = InitData::new("earth.earth");
        init_data.set_frame_data_id(frame_data_id);
        let init_id = init_data.register(store).unwrap();
        (frame_data, init_id)
    }

    #[test]
    fn test_node_follows_frame_state() {
        let store = Arc::new(LocalObjectStore::default());
        let (mut frame_data, init_id) = published(&store);

        let mut node = RenderNode::new(0, store.clone());
        node.config_init(init_id).unwrap();
        assert_eq!(node.init_data().model_file_name(), "earth.earth");
        assert!(node.instance().is_none());

        frame_data.set_simulation_time(1.25);
        let version = frame_data.commit(store.as_ref()).unwrap();
        let observed = node.frame_start(version).unwrap();
        assert!((observed.simulation_time() - 1.25).abs() < f64::EPSILON);

        node.config_exit();
        assert!(node.frame_data().is_none());
    }

    #[test]
    fn test_frame_start_before_init_fails() {
        let mut node = RenderNode::new(3, Arc::new(LocalObjectStore::default()));
        assert!(node.frame_start(2).is_err());
    }

    #[test]
    fn test_node_checks_instance_out_and_back_in() {
        let store = Arc::new(LocalObjectStore::default());
        let (_frame_data, init_id) = published(&store);
        let binding = Arc::new(ViewBinding::new(SceneId::PRIMARY, Arc::new(EarthLoader)));
        binding.set_viewer(InteractiveViewer::new());

        let preview = binding.take_or_create(SceneId::PRIMARY, "earth.earth").unwrap();
        binding.release(&preview);

        let mut node = RenderNode::new(0, store.clone()).with_binding(Arc::clone(&binding));
        node.config_init(init_id).unwrap();

        assert_eq!(node.scene_id(), Some(SceneId::PRIMARY));
        assert!(Arc::ptr_eq(node.instance().unwrap(), &preview));
        assert_eq!(binding.viewer().unwrap().num_views(), 0);

        node.config_exit();
        assert!(node.instance().is_none());
        assert_eq!(binding.viewer().unwrap().num_views(), 1);
    }
}
