//! Hand-off of scene instances between the interactive viewer and the
//! distributed rendering path

use crate::render::{InteractiveViewer, SharedViewInstance};
use crate::scene::{SceneCache, SceneError, SceneId, SceneLoader};
use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};
use std::sync::Arc;

struct BindingState {
    viewer: Option<InteractiveViewer>,
    scenes: SceneCache,
}

/// Owns the scene cache and the local viewer, and moves instances between
/// the viewer and whoever renders them.
///
/// Shared as `Arc<ViewBinding>` between the coordinator and the rendering
/// threads of the same process; every take and release runs under one lock.
/// A checked-out instance is never held by the viewer at the same time. The
/// viewer only exists on the coordinating process.
pub struct ViewBinding {
    loader: Arc<dyn SceneLoader>,
    state: Mutex<BindingState>,
}

impl ViewBinding {
    /// Binding without a viewer, building scenes for `supported` with `loader`
    pub fn new(supported: SceneId, loader: Arc<dyn SceneLoader>) -> Self {
        Self {
            loader,
            state: Mutex::new(BindingState {
                viewer: None,
                scenes: SceneCache::new(supported),
            }),
        }
    }

    /// Install the local viewer
    pub fn set_viewer(&self, viewer: InteractiveViewer) {
        self.state.lock().viewer = Some(viewer);
    }

    /// Local viewer, on the coordinating process.
    ///
    /// Takes and releases block while the returned guard is alive.
    pub fn viewer(&self) -> Option<MappedMutexGuard<'_, InteractiveViewer>> {
        MutexGuard::try_map(self.state.lock(), |state| state.viewer.as_mut()).ok()
    }

    /// Remove the viewer together with every instance it holds
    pub fn take_viewer(&self) -> Option<InteractiveViewer> {
        self.state.lock().viewer.take()
    }

    /// Number of scenes built so far
    pub fn scene_count(&self) -> usize {
        self.state.lock().scenes.len()
    }

    /// Forget all built scenes
    pub fn clear_scenes(&self) {
        self.state.lock().scenes.clear();
    }

    /// Check out the viewer's instance of `scene_id`, or build a new one.
    ///
    /// A checked-out instance has its context and viewport cleared.
    pub fn take_or_create(&self, scene_id: SceneId, model_file: &str) -> Result<SharedViewInstance, SceneError> {
        let mut state = self.state.lock();

        if let Some(viewer) = state.viewer.as_mut() {
            if let Some(instance) = viewer.find_view_by_id(scene_id) {
                viewer.remove_view(&instance);
                instance.lock().camera.unbind();
                log::debug!("Took viewer instance of {}", scene_id);
                return Ok(instance);
            }
        }

        let scene = state.scenes.get_or_build(scene_id, self.loader.as_ref(), model_file)?;
        log::debug!("Created instance of {}", scene_id);
        Ok(InteractiveViewer::create_view(scene_id, scene))
    }

    /// Return an instance to the viewer so it can be previewed locally again.
    ///
    /// Without a viewer the instance is simply let go.
    pub fn release(&self, instance: &SharedViewInstance) {
        let mut state = self.state.lock();

        if let Some(viewer) = state.viewer.as_mut() {
            instance.lock().camera.unbind();
            viewer.add_view(Arc::clone(instance));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::ContextBinding;
    use crate::scene::{Ellipsoid, MapNode, SceneNode};
    use std::collections::HashSet;
    use std::thread;

    struct EarthLoader;

    impl SceneLoader for EarthLoader {
        fn read_node_file(&self, _path: &str) -> Result<SceneNode, SceneError> {
            Ok(SceneNode::Map(MapNode::geocentric("earth", Ellipsoid::WGS84)))
        }
    }

    fn remote_binding() -> ViewBinding {
        ViewBinding::new(SceneId(1), Arc::new(EarthLoader))
    }

    fn coordinating_binding() -> ViewBinding {
        let binding = remote_binding();
        binding.set_viewer(InteractiveViewer::new());
        binding
    }

    #[test]
    fn test_release_then_take_returns_same_instance() {
        let binding = coordinating_binding();

        let first = binding.take_or_create(SceneId(1), "earth.earth").unwrap();
        binding.release(&first);
        assert_eq!(binding.viewer().unwrap().num_views(), 1);

        let second = binding.take_or_create(SceneId(1), "earth.earth").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(binding.viewer().unwrap().num_views(), 0);
        assert_eq!(binding.scene_count(), 1);
    }

    #[test]
    fn test_take_clears_camera_binding() {
        let binding = coordinating_binding();
        let instance = binding.take_or_create(SceneId(1), "earth.earth").unwrap();
        binding.release(&instance);

        instance.lock().camera.set_graphics_context(Some(ContextBinding::Local));
        let taken = binding.take_or_create(SceneId(1), "earth.earth").unwrap();
        assert!(taken.lock().camera.is_unbound());
    }

    #[test]
    fn test_new_instance_gets_sky_and_no_near_far() {
        let binding = coordinating_binding();
        let instance = binding.take_or_create(SceneId(1), "earth.earth").unwrap();
        let instance = instance.lock();

        assert!(instance.sky_attached());
        assert!(!instance.camera.computes_near_far());
    }

    #[test]
    fn test_without_viewer_instances_share_scene() {
        let binding = remote_binding();
        let a = binding.take_or_create(SceneId(1), "earth.earth").unwrap();
        binding.release(&a);
        let b = binding.take_or_create(SceneId(1), "earth.earth").unwrap();

        assert!(!Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(a.lock().scene(), b.lock().scene()));
        assert!(binding.viewer().is_none());
    }

    #[test]
    fn test_unsupported_scene() {
        let binding = coordinating_binding();
        let result = binding.take_or_create(SceneId(2), "earth.earth");
        assert!(matches!(result, Err(SceneError::UnsupportedScene(SceneId(2)))));
    }

    #[test]
    fn test_take_viewer_and_clear_scenes() {
        let binding = coordinating_binding();
        let instance = binding.take_or_create(SceneId(1), "earth.earth").unwrap();
        binding.release(&instance);

        let viewer = binding.take_viewer().unwrap();
        assert_eq!(viewer.num_views(), 1);
        assert!(binding.viewer().is_none());

        binding.clear_scenes();
        assert_eq!(binding.scene_count(), 0);
    }

    #[test]
    fn test_racing_threads_never_share_an_instance() {
        let binding = Arc::new(coordinating_binding());
        let first = binding.take_or_create(SceneId(1), "earth.earth").unwrap();
        binding.release(&first);

        let held: Arc<Mutex<HashSet<usize>>> = Arc::default();
        let workers: Vec<_> = (0..2)
            .map(|_| {
                let binding = Arc::clone(&binding);
                let held = Arc::clone(&held);
                thread::spawn(move || {
                    for _ in 0..500 {
                        let instance = binding.take_or_create(SceneId(1), "earth.earth").unwrap();
                        let key = Arc::as_ptr(&instance) as usize;
                        assert!(held.lock().insert(key), "instance checked out twice");

                        thread::yield_now();

                        assert!(held.lock().remove(&key));
                        binding.release(&instance);
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        // At most one extra instance per concurrent taker, all on one scene
        let scene = Arc::clone(first.lock().scene());
        let viewer = binding.viewer().unwrap();
        assert!((1..=2).contains(&viewer.num_views()));
        assert!(viewer.views().iter().any(|view| Arc::ptr_eq(view, &first)));
        assert!(viewer.views().iter().all(|view| Arc::ptr_eq(view.lock().scene(), &scene)));
        assert_eq!(binding.scene_count(), 1);
    }
}
