//! # Interactive Viewer
//!
//! The process-local container used for preview rendering on the
//! coordinating process. A scene instance is either held here or checked out
//! by the distributed rendering path; [`crate::view::ViewBinding`] moves it
//! between the two.

use super::camera::{Camera, ContextBinding};
use super::context::{DrawRequest, SharedContext};
use crate::distrib::FrameData;
use crate::foundation::math::PixelViewport;
use crate::input::EventQueue;
use crate::manipulator::CameraManipulator;
use crate::scene::{Scene, SceneId};
use parking_lot::Mutex;
use std::sync::Arc;

/// A renderable instance of a scene with its camera and input state
#[derive(Debug)]
pub struct ViewInstance {
    scene_id: SceneId,
    scene: Arc<Scene>,
    sky_attached: bool,

    /// Camera used for preview rendering and while applying input
    pub camera: Camera,
    /// Manipulator driving the camera, set once when the view is first bound
    pub manipulator: Option<CameraManipulator>,
    /// Pending manipulator events
    pub event_queue: EventQueue,
}

impl ViewInstance {
    /// Instance showing `scene`; near/far computation is left to the coordinator
    pub fn new(scene_id: SceneId, scene: Arc<Scene>) -> Self {
        let mut camera = Camera::new();
        camera.set_compute_near_far(false);

        let sky_attached = scene.find_sky().is_some();
        if sky_attached {
            log::debug!("Attached sky to view of {}", scene_id);
        }

        Self {
            scene_id,
            scene,
            sky_attached,
            camera,
            manipulator: None,
            event_queue: EventQueue::new(),
        }
    }

    /// Scene id
    pub fn scene_id(&self) -> SceneId {
        self.scene_id
    }

    /// Shared scene
    pub fn scene(&self) -> &Arc<Scene> {
        &self.scene
    }

    /// Whether the scene's sky follows this instance's camera
    pub fn sky_attached(&self) -> bool {
        self.sky_attached
    }
}

/// Instance shared between the viewer and the distributed configuration
pub type SharedViewInstance = Arc<Mutex<ViewInstance>>;

/// Local preview container
#[derive(Default)]
pub struct InteractiveViewer {
    views: Vec<SharedViewInstance>,
    context: Option<(SharedContext, PixelViewport)>,
    frame_number: Option<u32>,
    frames_rendered: u64,
}

impl InteractiveViewer {
    /// Create an empty viewer
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct a new instance for `scene` without adding it
    pub fn create_view(scene_id: SceneId, scene: Arc<Scene>) -> SharedViewInstance {
        Arc::new(Mutex::new(ViewInstance::new(scene_id, scene)))
    }

    /// Add an instance; adding one that is already held is a no-op
    pub fn add_view(&mut self, instance: SharedViewInstance) {
        if !self.views.iter().any(|view| Arc::ptr_eq(view, &instance)) {
            self.views.push(instance);
        }
    }

    /// Remove an instance; returns whether it was held
    pub fn remove_view(&mut self, instance: &SharedViewInstance) -> bool {
        let before = self.views.len();
        self.views.retain(|view| !Arc::ptr_eq(view, instance));
        before != self.views.len()
    }

    /// First held instance showing `scene_id`
    pub fn find_view_by_id(&self, scene_id: SceneId) -> Option<SharedViewInstance> {
        self.views
            .iter()
            .find(|view| view.lock().scene_id() == scene_id)
            .cloned()
    }

    /// Number of held instances
    pub fn num_views(&self) -> usize {
        self.views.len()
    }

    /// Context every held camera renders into
    pub fn set_global_context(&mut self, context: SharedContext, viewport: PixelViewport) {
        self.context = Some((context, viewport));
    }

    /// Whether a context has been set
    pub fn has_context(&self) -> bool {
        self.context.is_some()
    }

    /// Prepare a frame: bind cameras and pull their pose from the manipulators
    pub fn frame_start(&mut self, frame_number: u32, frame_data: &FrameData) {
        let Some((_, viewport)) = &self.context else {
            return;
        };

        for view in &self.views {
            let mut instance = view.lock();
            let ViewInstance { camera, manipulator, .. } = &mut *instance;

            camera.set_graphics_context(Some(ContextBinding::Local));
            camera.set_viewport(Some(*viewport));
            if let Some(manipulator) = manipulator {
                camera.set_view_matrix(manipulator.inverse_matrix());
            }
        }

        log::trace!(
            "Preview frame {} at t={:.3}s",
            frame_number,
            frame_data.simulation_time()
        );
        self.frame_number = Some(frame_number);
    }

    /// Draw every held view; returns how many were drawn
    pub fn rendering_traversals(&mut self, frame_data: &FrameData) -> usize {
        let (Some((context, _)), Some(frame_number)) = (&self.context, self.frame_number) else {
            return 0;
        };

        let mut context = context.lock();
        context.make_current();
        for view in &self.views {
            let instance = view.lock();
            context.draw(&DrawRequest {
                frame_number,
                scene_id: instance.scene_id(),
                view_matrix: *instance.camera.view_matrix(),
                projection: *instance.camera.projection(),
                statistics: frame_data.statistics(),
            });
        }
        self.views.len()
    }

    /// Complete the frame started by [`Self::frame_start`]
    pub fn frame_draw_finish(&mut self) {
        if self.frame_number.take().is_none() {
            return;
        }
        if let Some((context, _)) = &self.context {
            context.lock().finish();
        }
        self.frames_rendered += 1;
    }

    /// Number of finished preview frames
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Held instances in insertion order
    pub fn views(&self) -> &[SharedViewInstance] {
        &self.views
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::GraphicsContext;
    use crate::scene::SceneNode;

    #[derive(Default)]
    struct CountingContext {
        draws: Arc<Mutex<Vec<DrawRequest>>>,
        finishes: Arc<Mutex<u32>>,
    }

    impl GraphicsContext for CountingContext {
        fn realize(&mut self) -> bool {
            true
        }
        fn make_current(&mut self) {}
        fn set_max_texture_pool_size(&mut self, _bytes: u64) {}
        fn set_max_buffer_object_pool_size(&mut self, _bytes: u64) {}
        fn draw(&mut self, request: &DrawRequest) {
            self.draws.lock().push(request.clone());
        }
        fn finish(&mut self) {
            *self.finishes.lock() += 1;
        }
    }

    fn scene() -> Arc<Scene> {
        Arc::new(Scene::new(SceneId(1), SceneNode::model("cow.osg")))
    }

    #[test]
    fn test_add_find_remove() {
        let mut viewer = InteractiveViewer::new();
        let instance = InteractiveViewer::create_view(SceneId(1), scene());

        viewer.add_view(Arc::clone(&instance));
        viewer.add_view(Arc::clone(&instance));
        assert_eq!(viewer.num_views(), 1);

        let found = viewer.find_view_by_id(SceneId(1)).unwrap();
        assert!(Arc::ptr_eq(&found, &instance));
        assert!(viewer.find_view_by_id(SceneId(2)).is_none());

        assert!(viewer.remove_view(&instance));
        assert!(!viewer.remove_view(&instance));
        assert_eq!(viewer.num_views(), 0);
    }

    #[test]
    fn test_new_instance_disables_near_far() {
        let instance = ViewInstance::new(SceneId(1), scene());
        assert!(!instance.camera.computes_near_far());
        assert!(!instance.sky_attached());
        assert!(instance.manipulator.is_none());
    }

    #[test]
    fn test_frame_without_context_draws_nothing() {
        let mut viewer = InteractiveViewer::new();
        viewer.add_view(InteractiveViewer::create_view(SceneId(1), scene()));

        viewer.frame_start(1, &FrameData::new());
        assert_eq!(viewer.rendering_traversals(&FrameData::new()), 0);
        viewer.frame_draw_finish();
        assert_eq!(viewer.frames_rendered(), 0);
    }

    #[test]
    fn test_preview_frame_draws_every_view() {
        let context = CountingContext::default();
        let draws = Arc::clone(&context.draws);
        let finishes = Arc::clone(&context.finishes);
        let boxed: Box<dyn GraphicsContext> = Box::new(context);
        let shared: SharedContext = Arc::new(Mutex::new(boxed));

        let mut viewer = InteractiveViewer::new();
        viewer.add_view(InteractiveViewer::create_view(SceneId(1), scene()));
        viewer.set_global_context(shared, PixelViewport::sized(10, 10));

        let mut frame_data = FrameData::new();
        frame_data.toggle_statistics();
        viewer.frame_start(7, &frame_data);
        assert_eq!(viewer.rendering_traversals(&frame_data), 1);
        viewer.frame_draw_finish();

        let draws = draws.lock();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].frame_number, 7);
        assert!(draws[0].statistics);
        assert_eq!(*finishes.lock(), 1);
        assert_eq!(viewer.frames_rendered(), 1);
        assert_eq!(
            viewer.views()[0].lock().camera.graphics_context(),
            Some(ContextBinding::Local)
        );
    }
}
