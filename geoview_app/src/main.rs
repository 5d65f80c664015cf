//! Geoview cluster demo
//!
//! Runs a coordinating process and two rendering processes (as threads) over
//! an in-process replication store, feeds a scripted sequence of pointer and
//! key events, and logs what every rendering process observed.
//!
//! Usage: `geoview_demo [config.toml|config.ron] [frames]`

use geoview_cluster::prelude::*;
use geoview_cluster::config::ConfigError;
use geoview_cluster::foundation::logging;
use nalgebra::{Matrix4, Vector3};
use std::sync::Arc;
use thiserror::Error;

const RENDER_NODES: usize = 2;
const DEFAULT_FRAMES: u32 = 12;
const CHANNEL: PixelViewport = PixelViewport { x: 0, y: 0, w: 640, h: 480 };

#[derive(Error, Debug)]
enum DemoError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Coordinator error: {0}")]
    Coordinator(#[from] CoordinatorError),

    #[error("Invalid frame count '{0}'")]
    FrameCount(String),
}

/// Loads `.earth` files as a WGS84 globe and anything else as a plain model
struct DemoLoader;

impl SceneLoader for DemoLoader {
    fn read_node_file(&self, path: &str) -> Result<SceneNode, SceneError> {
        if path.ends_with(".earth") {
            Ok(SceneNode::Map(MapNode::geocentric(path, Ellipsoid::WGS84)))
        } else {
            Ok(SceneNode::model(path))
        }
    }
}

/// Context that only counts what it was asked to draw
#[derive(Default)]
struct HeadlessContext {
    draws: u64,
}

impl GraphicsContext for HeadlessContext {
    fn realize(&mut self) -> bool {
        true
    }

    fn make_current(&mut self) {}

    fn set_max_texture_pool_size(&mut self, bytes: u64) {
        log::debug!("Texture pool limited to {} bytes", bytes);
    }

    fn set_max_buffer_object_pool_size(&mut self, bytes: u64) {
        log::debug!("Buffer object pool limited to {} bytes", bytes);
    }

    fn draw(&mut self, request: &DrawRequest) {
        self.draws += 1;
        log::trace!(
            "Preview draw #{} of {} in frame {} (statistics: {})",
            self.draws,
            request.scene_id,
            request.frame_number,
            request.statistics
        );
    }

    fn finish(&mut self) {}
}

struct HeadlessFactory;

impl ContextFactory for HeadlessFactory {
    fn create(&self, traits: &ContextTraits) -> Option<Box<dyn GraphicsContext>> {
        log::debug!("Creating headless {}x{} context", traits.width, traits.height);
        Some(Box::new(HeadlessContext::default()))
    }
}

fn distributed_config(config: &CoordinatorConfig) -> DistributedConfig {
    let mut distributed = DistributedConfig::new();
    for id in 1..=2 {
        distributed
            .views
            .push(View::new(ViewId(id), config.view.near, config.view.far));
    }
    distributed.canvases.push(Canvas::new(config.layout.canvas.clone(), 2));
    distributed
}

fn key_press(c: char, event: &impl Fn(ConfigEventKind) -> ConfigEvent) -> Vec<ConfigEvent> {
    KeySym::from_char(c)
        .map(|key| event(ConfigEventKind::KeyPress(key)))
        .into_iter()
        .collect()
}

/// Scripted input for a frame
fn scripted_events(frame: u32) -> Vec<ConfigEvent> {
    let mut context = EventContext::new(ViewId(1), CHANNEL, Frustum::default());
    context.head_transform = Matrix4::new_translation(&Vector3::new(0.0, 0.0, 0.065));
    let event = |kind: ConfigEventKind| ConfigEvent::new(kind, context.clone());

    match frame {
        2 => vec![event(ConfigEventKind::PointerWheel { x_axis: 1, y_axis: 0 })],
        3 => key_press('s', &event),
        4 => vec![
            event(ConfigEventKind::PointerButtonPress { x: 320, y: 240, button: PointerButtons::BUTTON1 }),
            event(ConfigEventKind::PointerMotion { x: 360, y: 250 }),
            event(ConfigEventKind::PointerButtonRelease { x: 360, y: 250, button: PointerButtons::BUTTON1 }),
        ],
        5 => key_press('1', &event),
        6 => key_press('t', &event),
        7 => vec![event(ConfigEventKind::Intersection {
            hit: nalgebra::Point3::new(1_113_194.9, 0.0, 6_356_752.3),
            originator: 1,
        })],
        _ => Vec::new(),
    }
}

fn run(args: &[String]) -> Result<(), DemoError> {
    logging::init(logging::DEFAULT_LEVEL);

    let config = match args.get(1) {
        Some(path) => CoordinatorConfig::load_from_file(path)?,
        None => CoordinatorConfig::default(),
    };
    let frames = match args.get(2) {
        Some(text) => text.parse().map_err(|_| DemoError::FrameCount(text.clone()))?,
        None => DEFAULT_FRAMES,
    };

    logging::apply_level(&config.log_level);
    log::info!("Starting geoview demo with model '{}' for {} frames", config.model_file, frames);

    let store: Arc<dyn ObjectStore> = Arc::new(LocalObjectStore::new(config.store.history_depth));
    let cluster = LocalCluster::new(Arc::clone(&store), distributed_config(&config), RENDER_NODES);
    let mut coordinator =
        FrameCoordinator::new(config, cluster, store, Arc::new(DemoLoader), Arc::new(HeadlessFactory))?;

    coordinator.init()?;

    for frame in 1..=frames {
        for event in scripted_events(frame) {
            coordinator.handle_event(&event);
        }
        coordinator.start_frame()?;
        coordinator.finish_frame();
    }

    for node in 0..RENDER_NODES {
        if let Some(last) = coordinator.framework().observations(node).last() {
            log::info!(
                "Render node {} last saw frame {} (version {}) at t={:.3}s, {}, statistics {}, rendering {}",
                node,
                last.frame,
                last.version,
                last.simulation_time,
                last.current_view_id,
                if last.statistics { "on" } else { "off" },
                last.scene_id.map_or_else(|| "nothing".to_string(), |id| id.to_string())
            );
        }
    }
    if let Some(viewer) = coordinator.viewer() {
        log::info!("Rendered {} preview frames", viewer.frames_rendered());
    }

    coordinator.exit()?;
    log::info!("Geoview demo finished");
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Fatal coordination invariants panic; report where before unwinding
    std::panic::set_hook(Box::new(|panic_info| {
        if let Some(location) = panic_info.location() {
            eprintln!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
        if let Some(payload) = panic_info.payload().downcast_ref::<&str>() {
            eprintln!("Panic message: {}", payload);
        } else if let Some(payload) = panic_info.payload().downcast_ref::<String>() {
            eprintln!("Panic message: {}", payload);
        }
    }));

    let args: Vec<String> = std::env::args().collect();

    match std::panic::catch_unwind(|| run(&args)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => {
            log::error!("Demo failed: {}", e);
            Err(Box::new(e))
        }
        Err(_) => Err("Demo panicked".into()),
    }
}
