//! # Frame Coordinator
//!
//! Runs on the coordinating process and drives the whole frame cycle:
//!
//! 1. `init` publishes the frame state and init data, starts the cluster and
//!    gives every view a scene instance with a manipulator.
//! 2. `start_frame` pulls each view's pose from its manipulator, updates depth
//!    bounds, commits the frame state and, once warmed up, renders a local
//!    preview of the views held by the interactive viewer.
//! 3. `finish_frame` completes the preview and waits on the cluster barrier.
//! 4. `handle_event` feeds input to the current view and handles the
//!    reserved keys.
//!
//! `cleanup` tears everything down in reverse order and may run any number
//! of times.

mod error;

pub use error::CoordinatorError;

use crate::cluster::ClusterFramework;
use crate::core::config::CoordinatorConfig;
use crate::distrib::{FrameData, InitData, InitDataSlot, ObjectId, ObjectStore};
use crate::foundation::math::{unproject, PixelViewport};
use crate::foundation::time::{calendar_now, millis_to_seconds};
use crate::input::{ConfigEvent, ConfigEventKind, InputEventTranslator, KeySym};
use crate::manipulator::CameraManipulator;
use crate::render::{ContextFactory, ContextTraits, InteractiveViewer, SharedContext, SharedViewInstance};
use crate::scene::{SceneId, SceneLoader};
use crate::view::{DepthBoundsCalculator, ViewBinding, ViewId, ViewMode};
use parking_lot::{MappedMutexGuard, Mutex};
use std::sync::Arc;

/// Coordinating-process side of the frame cycle
pub struct FrameCoordinator<F: ClusterFramework> {
    config: CoordinatorConfig,
    framework: F,
    store: Arc<dyn ObjectStore>,
    context_factory: Arc<dyn ContextFactory>,

    frame_data: FrameData,
    init_data: InitDataSlot,
    binding: Arc<ViewBinding>,
    depth: DepthBoundsCalculator,
    translator: InputEventTranslator,

    context: Option<SharedContext>,
    current_view: Option<SharedViewInstance>,
    warm_up_ticks: u32,
}

impl<F: ClusterFramework> FrameCoordinator<F> {
    /// Create a coordinator; nothing is published until [`Self::init`]
    pub fn new(
        config: CoordinatorConfig,
        framework: F,
        store: Arc<dyn ObjectStore>,
        scene_loader: Arc<dyn SceneLoader>,
        context_factory: Arc<dyn ContextFactory>,
    ) -> Result<Self, CoordinatorError> {
        config.validate()?;

        let display = &config.display;
        log::info!(
            "Creating coordinator: texture pool {} bytes, buffer object pool {} bytes",
            display.max_texture_pool_size,
            display.max_buffer_object_pool_size
        );

        Ok(Self {
            frame_data: FrameData::new(),
            init_data: InitDataSlot::with_data(InitData::new(config.model_file.clone())),
            binding: Arc::new(ViewBinding::new(SceneId::PRIMARY, scene_loader)),
            depth: DepthBoundsCalculator::from_config(&config.depth),
            translator: InputEventTranslator::new(),
            context: None,
            current_view: None,
            warm_up_ticks: 0,
            config,
            framework,
            store,
            context_factory,
        })
    }

    /// Publish the shared state, start the cluster and bind every view.
    ///
    /// On failure everything is cleaned up before the error is returned.
    pub fn init(&mut self) -> Result<(), CoordinatorError> {
        log::info!("Initializing coordinator");
        let result = self.try_init();
        if let Err(e) = &result {
            log::error!("Coordinator init failed: {}", e);
            self.cleanup();
        }
        result
    }

    fn try_init(&mut self) -> Result<(), CoordinatorError> {
        let frame_data_id = self.frame_data.register(self.store.as_ref())?;
        self.init_data.data_mut().set_frame_data_id(frame_data_id);
        let init_id = self.init_data.data_mut().register(self.store.as_ref())?;

        self.binding.set_viewer(InteractiveViewer::new());
        self.framework.share_view_binding(Arc::clone(&self.binding));

        self.framework.init(init_id).map_err(CoordinatorError::FrameworkInit)?;

        self.collect_views()
    }

    /// Give every view a scene instance and a manipulator, then hand the
    /// instance back to the viewer
    fn collect_views(&mut self) -> Result<(), CoordinatorError> {
        let scene_id = SceneId(self.config.scene_id);
        let view_ids: Vec<ViewId> = self.framework.config().views.iter().map(|view| view.id()).collect();

        for view_id in view_ids {
            let instance = self
                .binding
                .take_or_create(scene_id, self.init_data.data().model_file_name())?;

            {
                let mut instance = instance.lock();
                if instance.manipulator.is_none() {
                    let manipulator = CameraManipulator::for_scene(instance.scene(), &self.config.home);
                    instance.manipulator = Some(manipulator);
                }
            }

            if let Some(view) = self.framework.config_mut().find_view_mut(view_id) {
                view.set_scene_id(scene_id);
                view.set_binding(Some(Arc::clone(&instance)));
            }
            self.binding.release(&instance);

            let selected = self.select_current_view(view_id);
            assert!(selected, "{} vanished while being bound", view_id);
        }
        Ok(())
    }

    /// Stop the cluster, then clean up
    pub fn exit(&mut self) -> Result<(), CoordinatorError> {
        let result = self.framework.exit();
        self.cleanup();
        result.map_err(CoordinatorError::from)
    }

    /// Update views and the frame state, commit it and start a frame.
    ///
    /// From the second frame with views in the local viewer on, a preview is
    /// rendered into the local context, which is created on first use.
    pub fn start_frame(&mut self) -> Result<u32, CoordinatorError> {
        self.update_views();

        let current_view_id = self.frame_data.current_view_id();
        if let Some(view) = self.framework.config().find_view(current_view_id) {
            self.frame_data.set_view_matrix(*view.view_matrix());
        }
        self.frame_data
            .set_simulation_time(millis_to_seconds(self.framework.time_ms()));
        self.frame_data.set_calendar_time(calendar_now());

        let version = self.frame_data.commit(self.store.as_ref())?;
        let local_views = self.local_view_count();
        let frame = self.framework.start_frame(version);

        if local_views > 0 {
            self.warm_up_ticks += 1;
            if self.warm_up_ticks > 1 {
                self.render_preview(frame);
            }
        }
        Ok(frame)
    }

    fn render_preview(&mut self, frame: u32) {
        if self.context.is_none() && !self.init_local_context() {
            log::warn!("Unable to create local preview context");
        }
        let Some(context) = &self.context else {
            return;
        };

        let viewport = PixelViewport::sized(self.config.context.width, self.config.context.height);
        if let Some(mut viewer) = self.binding.viewer() {
            viewer.set_global_context(Arc::clone(context), viewport);
            viewer.frame_start(frame, &self.frame_data);
            viewer.rendering_traversals(&self.frame_data);
        }
    }

    /// Pull every view's pose from its manipulator and refresh depth bounds
    fn update_views(&mut self) {
        let depth = &self.depth;
        for view in &mut self.framework.config_mut().views {
            let Some(instance) = view.binding().cloned() else {
                panic!("{} has no scene instance", view.id());
            };
            let instance = instance.lock();
            let Some(manipulator) = instance.manipulator.as_ref() else {
                panic!("{} has no camera manipulator", view.id());
            };

            if let Some(bounds) = depth.compute(&manipulator.matrix(), instance.scene().coordinate_frame()) {
                view.set_near_far(bounds.near, bounds.far);
            }
            view.set_view_matrix(manipulator.inverse_matrix());
        }
    }

    /// Finish the local preview, if one was started, and the cluster frame.
    ///
    /// Without views in the local viewer the warm-up starts over.
    pub fn finish_frame(&mut self) -> u32 {
        if self.local_view_count() > 0 {
            if self.context.is_some() {
                if let Some(mut viewer) = self.binding.viewer() {
                    viewer.frame_draw_finish();
                }
            }
        } else {
            self.warm_up_ticks = 0;
        }

        self.framework.finish_frame()
    }

    fn local_view_count(&self) -> usize {
        self.binding.viewer().map_or(0, |viewer| viewer.num_views())
    }

    /// Attach to the init data published under `id`.
    ///
    /// Idempotent for the same id.
    ///
    /// # Panics
    /// Attaching under a different id than before is a programming error.
    pub fn map_init_data(&mut self, id: ObjectId) -> Result<(), CoordinatorError> {
        self.init_data.map(self.store.as_ref(), id)?;
        Ok(())
    }

    /// Withdraw the shared state and release everything init acquired
    pub fn cleanup(&mut self) {
        self.init_data.data_mut().deregister(self.store.as_ref());
        self.frame_data.deregister(self.store.as_ref());

        self.init_data.data_mut().set_frame_data_id(ObjectId::ZERO);
        self.init_data.reset();

        self.current_view = None;
        for view in &mut self.framework.config_mut().views {
            view.set_binding(None);
        }
        if let Some(viewer) = self.binding.take_viewer() {
            log::debug!("Dropping local viewer with {} views", viewer.num_views());
        }
        self.binding.clear_scenes();
        self.context = None;
        self.warm_up_ticks = 0;

        log::debug!("Coordinator cleaned up");
    }

    /// Make `view_id` the current view: its id goes into the frame state and
    /// its instance receives input. Returns whether the view exists.
    pub fn select_current_view(&mut self, view_id: ViewId) -> bool {
        let Some(view) = self.framework.config().find_view(view_id) else {
            return false;
        };
        self.frame_data.set_current_view_id(view_id);
        self.current_view = view.binding().cloned();
        true
    }

    /// Create the local preview context; false if the platform has none
    pub fn init_local_context(&mut self) -> bool {
        let traits = ContextTraits::for_preview(&self.config.context);
        let Some(mut context) = self.context_factory.create(&traits) else {
            return false;
        };
        if !context.realize() {
            log::warn!("Local preview context could not be realized");
            return false;
        }
        context.make_current();

        let display = &self.config.display;
        if display.max_texture_pool_size > 0 {
            context.set_max_texture_pool_size(display.max_texture_pool_size);
        }
        if display.max_buffer_object_pool_size > 0 {
            context.set_max_buffer_object_pool_size(display.max_buffer_object_pool_size);
        }

        log::info!(
            "Created local preview context {}x{} on display {}.{}",
            traits.width,
            traits.height,
            traits.display_num,
            traits.screen_num
        );
        self.context = Some(Arc::new(Mutex::new(context)));
        true
    }

    /// Handle one framework event; returns whether it was consumed.
    ///
    /// Events not consumed here go to the framework's default handler.
    pub fn handle_event(&mut self, event: &ConfigEvent) -> bool {
        let time = millis_to_seconds(self.framework.time_ms());

        let handled = match &event.kind {
            ConfigEventKind::PointerWheel { .. }
            | ConfigEventKind::PointerMotion { .. }
            | ConfigEventKind::PointerButtonPress { .. }
            | ConfigEventKind::PointerButtonRelease { .. } => {
                if self.select_current_view(event.context.view_id) && self.current_view.is_some() {
                    self.handle_pointer_event(event, time);
                    true
                } else {
                    false
                }
            }
            ConfigEventKind::KeyPress(key) => {
                if let Some(instance) = &self.current_view {
                    InputEventTranslator::enqueue_key_press(&mut instance.lock().event_queue, *key, time);
                }
                self.drain_current_view(event);
                self.handle_reserved_key(*key)
            }
            ConfigEventKind::KeyRelease(key) => {
                if let Some(instance) = &self.current_view {
                    InputEventTranslator::enqueue_key_release(&mut instance.lock().event_queue, *key, time);
                }
                self.drain_current_view(event);
                false
            }
            ConfigEventKind::Intersection { hit, originator } => {
                log::info!(
                    "Intersection at ({:.3}, {:.3}, {:.3}) from node {}",
                    hit.x,
                    hit.y,
                    hit.z,
                    originator
                );
                true
            }
            ConfigEventKind::Other(_) => false,
        };

        handled || self.framework.handle_event(event)
    }

    fn handle_reserved_key(&mut self, key: KeySym) -> bool {
        let Some(c) = key.as_char() else {
            return false;
        };
        let input = &self.config.input;
        let mut handled = false;

        if c == input.statistics_key {
            self.frame_data.toggle_statistics();
            handled = true;
        }

        if c == input.stereo_key {
            let current = self.frame_data.current_view_id();
            if let Some(view) = self.framework.config_mut().find_view_mut(current) {
                let mode = match view.mode() {
                    ViewMode::Mono => ViewMode::Stereo,
                    ViewMode::Stereo => ViewMode::Mono,
                };
                view.change_mode(mode);
            }
            handled = true;
        }

        if c == input.layout_key {
            let layout = &self.config.layout;
            if let Some(canvas) = self.framework.config_mut().find_canvas_mut(&layout.canvas) {
                let next = if canvas.active_layout_index() == layout.primary {
                    layout.secondary
                } else {
                    layout.primary
                };
                canvas.use_layout(next);
            }
            handled = true;
        }

        handled
    }

    fn handle_pointer_event(&mut self, event: &ConfigEvent, time: f64) {
        let Some(instance) = self.current_view.clone() else {
            return;
        };

        InputEventTranslator::enqueue_pointer(&mut instance.lock().event_queue, event, time);
        if let ConfigEventKind::PointerMotion { x, y } = event.kind {
            self.update_world_pointer(event, x, y);
        }
        self.drain_current_view(event);
    }

    /// Apply everything queued on the current view with the event's channel context
    fn drain_current_view(&mut self, event: &ConfigEvent) {
        let Some(instance) = self.current_view.clone() else {
            return;
        };
        let Some(view) = self.framework.config().find_view(self.frame_data.current_view_id()) else {
            return;
        };
        let applied = self.translator.drain(&mut instance.lock(), view, &event.context);
        log::trace!("Applied {} input events to {}", applied, view.id());
    }

    /// Store the pointer ray through the near and far planes on the event's view
    fn update_world_pointer(&mut self, event: &ConfigEvent, x: u32, y: u32) {
        let context = &event.context;
        let pvp = context.pvp;
        if !pvp.has_area() {
            return;
        }

        let window_x = f64::from(x) + f64::from(pvp.x);
        let window_y = f64::from(pvp.h) - f64::from(y) + f64::from(pvp.y);
        let view_matrix = context.head_transform * self.frame_data.view_matrix();
        let projection = context.frustum.projection_matrix();

        let near = unproject((window_x, window_y, 0.0), &view_matrix, &projection, &pvp);
        let far = unproject((window_x, window_y, 1.0), &view_matrix, &projection, &pvp);
        if let (Some(near), Some(far)) = (near, far) {
            if let Some(view) = self.framework.config_mut().find_view_mut(context.view_id) {
                view.set_world_pointer(near, far);
            }
        }
    }

    /// The shared frame state
    pub fn frame_data(&self) -> &FrameData {
        &self.frame_data
    }

    /// The init data
    pub fn init_data(&self) -> &InitData {
        self.init_data.data()
    }

    /// Frames counted towards the preview warm-up
    pub fn warm_up_ticks(&self) -> u32 {
        self.warm_up_ticks
    }

    /// The local viewer, between init and cleanup.
    ///
    /// Render nodes cannot take or release instances while the guard is held.
    pub fn viewer(&self) -> Option<MappedMutexGuard<'_, InteractiveViewer>> {
        self.binding.viewer()
    }

    /// Coordinator configuration
    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// The cluster framework
    pub fn framework(&self) -> &F {
        &self.framework
    }

    /// The cluster framework, mutably
    pub fn framework_mut(&mut self) -> &mut F {
        &mut self.framework
    }

    /// Whether the local preview context exists
    pub fn has_local_context(&self) -> bool {
        self.context.is_some()
    }

    /// Instance receiving input
    pub fn current_view(&self) -> Option<&SharedViewInstance> {
        self.current_view.as_ref()
    }

    /// The view binding and its scene cache
    pub fn binding(&self) -> &Arc<ViewBinding> {
        &self.binding
    }
}
