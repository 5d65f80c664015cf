//! Lazily built, process-wide scene cache

use super::{Scene, SceneError, SceneId, SceneNode, SkyNode};
use std::collections::HashMap;
use std::sync::Arc;

/// Model loading provided by the scene-graph engine
pub trait SceneLoader: Send + Sync {
    /// Load the node tree stored in `path`
    fn read_node_file(&self, path: &str) -> Result<SceneNode, SceneError>;
}

/// Scenes keyed by id, built on first use and kept for the process lifetime
pub struct SceneCache {
    supported: SceneId,
    scenes: HashMap<SceneId, Arc<Scene>>,
}

impl SceneCache {
    /// Create a cache that can build `supported`
    pub fn new(supported: SceneId) -> Self {
        Self {
            supported,
            scenes: HashMap::new(),
        }
    }

    /// Return the scene for `id`, building it from `model_file` if needed.
    ///
    /// Geocentric scenes get a sky decoration next to the loaded model.
    pub fn get_or_build(
        &mut self,
        id: SceneId,
        loader: &dyn SceneLoader,
        model_file: &str,
    ) -> Result<Arc<Scene>, SceneError> {
        if id != self.supported {
            return Err(SceneError::UnsupportedScene(id));
        }
        if let Some(scene) = self.scenes.get(&id) {
            return Ok(Arc::clone(scene));
        }

        let mut group = SceneNode::Group(vec![loader.read_node_file(model_file)?]);

        let sky = group
            .find_map_node()
            .filter(|map| map.is_geocentric())
            .and_then(SkyNode::for_map);
        if let Some(sky) = sky {
            log::debug!("Adding sky to geocentric {}", id);
            group.add_child(SceneNode::Sky(sky));
        }

        let scene = Arc::new(Scene::new(id, group));
        self.scenes.insert(id, Arc::clone(&scene));
        log::info!("Built {} from '{}'", id, model_file);
        Ok(scene)
    }

    /// Number of scenes built
    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    /// Whether no scene has been built yet
    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Drop all cached scenes
    pub fn clear(&mut self) {
        self.scenes.clear();
    }
}
