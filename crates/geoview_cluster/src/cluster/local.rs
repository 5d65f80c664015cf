//! In-process cluster
//!
//! Each rendering process is a thread driving a [`RenderNode`]. The
//! coordinator side talks to the threads over channels: one command channel
//! per node and a shared reply channel the frame barrier waits on.
//!
//! When the coordinator shares its view binding, every node checks a scene
//! instance out of it during init and returns it on exit. Those takes and
//! releases race each other, which is what the binding's lock is for.

use super::{ClusterFramework, FrameworkError, RenderNode};
use crate::distrib::{FrameData, ObjectId, ObjectStore, Version};
use crate::foundation::time::FrameClock;
use crate::input::ConfigEvent;
use crate::scene::SceneId;
use crate::view::{DistributedConfig, ViewBinding, ViewId};
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Frame state as a rendering process saw it
#[derive(Debug, Clone, PartialEq)]
pub struct NodeObservation {
    /// Frame number
    pub frame: u32,
    /// Frame state version synced for the frame
    pub version: Version,
    /// Simulation time in seconds
    pub simulation_time: f64,
    /// Calendar time in unix seconds
    pub calendar_time: i64,
    /// Active view
    pub current_view_id: ViewId,
    /// Statistics overlay flag
    pub statistics: bool,
    /// Scene of the instance the node rendered with
    pub scene_id: Option<SceneId>,
}

impl NodeObservation {
    fn new(frame: u32, version: Version, data: &FrameData, scene_id: Option<SceneId>) -> Self {
        Self {
            frame,
            version,
            simulation_time: data.simulation_time(),
            calendar_time: data.calendar_time(),
            current_view_id: data.current_view_id(),
            statistics: data.statistics(),
            scene_id,
        }
    }
}

enum NodeCommand {
    Frame { frame: u32, version: Version },
    Exit,
}

enum NodeReply {
    Ready { node: usize, result: Result<(), String> },
    FrameDone { node: usize, frame: u32, result: Result<(), String> },
}

struct NodeHandle {
    commands: Sender<NodeCommand>,
    thread: Option<JoinHandle<()>>,
    observations: Arc<Mutex<Vec<NodeObservation>>>,
}

/// [`ClusterFramework`] with rendering processes simulated as threads
pub struct LocalCluster {
    store: Arc<dyn ObjectStore>,
    config: DistributedConfig,
    binding: Option<Arc<ViewBinding>>,
    node_count: usize,
    fail_init: bool,
    nodes: Vec<NodeHandle>,
    replies: Option<Receiver<NodeReply>>,
    clock: FrameClock,
    current_frame: u32,
    finished_frame: u32,
    unhandled_events: usize,
}

impl LocalCluster {
    /// Cluster of `node_count` rendering processes sharing `store`
    pub fn new(store: Arc<dyn ObjectStore>, config: DistributedConfig, node_count: usize) -> Self {
        Self {
            store,
            config,
            binding: None,
            node_count,
            fail_init: false,
            nodes: Vec::new(),
            replies: None,
            clock: FrameClock::new(),
            current_frame: 0,
            finished_frame: 0,
            unhandled_events: 0,
        }
    }

    /// Make `init` fail before any rendering process starts
    pub fn with_failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    /// Everything node `node` observed so far, in frame order
    pub fn observations(&self, node: usize) -> Vec<NodeObservation> {
        self.nodes
            .get(node)
            .map(|handle| handle.observations.lock().clone())
            .unwrap_or_default()
    }

    /// Events passed to the default handler
    pub fn unhandled_events(&self) -> usize {
        self.unhandled_events
    }

    /// Number of the last frame every node finished
    pub fn finished_frame(&self) -> u32 {
        self.finished_frame
    }

    fn spawn_node(
        &self,
        index: usize,
        init_id: ObjectId,
        replies: Sender<NodeReply>,
    ) -> Result<NodeHandle, FrameworkError> {
        let (commands, command_rx) = unbounded();
        let observations = Arc::new(Mutex::new(Vec::new()));
        let mut node = RenderNode::new(index, Arc::clone(&self.store));
        if let Some(binding) = &self.binding {
            node = node.with_binding(Arc::clone(binding));
        }

        let thread = {
            let observations = Arc::clone(&observations);
            thread::Builder::new()
                .name(format!("render-node-{index}"))
                .spawn(move || run_node(node, init_id, &command_rx, &replies, &observations))
                .map_err(|e| FrameworkError::Init(format!("Failed to spawn render node {index}: {e}")))?
        };

        Ok(NodeHandle {
            commands,
            thread: Some(thread),
            observations,
        })
    }

    fn shutdown_nodes(&mut self) -> Result<(), FrameworkError> {
        for handle in &self.nodes {
            // A node that already stopped has dropped its receiver
            let _ = handle.commands.send(NodeCommand::Exit);
        }

        let mut result = Ok(());
        for (index, handle) in self.nodes.iter_mut().enumerate() {
            if let Some(thread) = handle.thread.take() {
                if thread.join().is_err() {
                    log::error!("Render node {} panicked", index);
                    result = Err(FrameworkError::Disconnected(index));
                }
            }
        }
        self.replies = None;
        result
    }
}

fn run_node(
    mut node: RenderNode,
    init_id: ObjectId,
    commands: &Receiver<NodeCommand>,
    replies: &Sender<NodeReply>,
    observations: &Mutex<Vec<NodeObservation>>,
) {
    let index = node.index();
    let ready = node.config_init(init_id).map_err(|e| e.to_string());
    let failed = ready.is_err();
    if replies.send(NodeReply::Ready { node: index, result: ready }).is_err() || failed {
        node.config_exit();
        return;
    }
    let scene_id = node.scene_id();

    while let Ok(command) = commands.recv() {
        match command {
            NodeCommand::Frame { frame, version } => {
                let result = node
                    .frame_start(version)
                    .map(|data| observations.lock().push(NodeObservation::new(frame, version, data, scene_id)))
                    .map_err(|e| e.to_string());
                if replies.send(NodeReply::FrameDone { node: index, frame, result }).is_err() {
                    break;
                }
            }
            NodeCommand::Exit => break,
        }
    }
    node.config_exit();
}

impl ClusterFramework for LocalCluster {
    fn share_view_binding(&mut self, binding: Arc<ViewBinding>) {
        self.binding = Some(binding);
    }

    fn init(&mut self, init_id: ObjectId) -> Result<(), FrameworkError> {
        if self.fail_init {
            return Err(FrameworkError::Init("configured to fail".to_string()));
        }
        log::info!("Starting {} render nodes", self.node_count);

        let (reply_tx, reply_rx) = unbounded();
        self.nodes.clear();
        for index in 0..self.node_count {
            let handle = self.spawn_node(index, init_id, reply_tx.clone())?;
            self.nodes.push(handle);
        }
        drop(reply_tx);

        let mut failure = None;
        for _ in 0..self.node_count {
            match reply_rx.recv() {
                Ok(NodeReply::Ready { node, result: Err(reason) }) => {
                    failure.get_or_insert(FrameworkError::Node { node, reason });
                }
                Ok(_) => {}
                Err(_) => {
                    failure.get_or_insert(FrameworkError::Init("render nodes disconnected".to_string()));
                    break;
                }
            }
        }
        self.replies = Some(reply_rx);

        if let Some(error) = failure {
            let _ = self.shutdown_nodes();
            return Err(error);
        }

        self.current_frame = 0;
        self.finished_frame = 0;
        Ok(())
    }

    fn exit(&mut self) -> Result<(), FrameworkError> {
        log::info!("Stopping render nodes");
        self.shutdown_nodes()
    }

    fn start_frame(&mut self, version: Version) -> u32 {
        self.current_frame += 1;
        let frame = self.current_frame;
        for (index, handle) in self.nodes.iter().enumerate() {
            if handle.commands.send(NodeCommand::Frame { frame, version }).is_err() {
                log::error!("Render node {} is gone, frame {} not delivered", index, frame);
            }
        }
        log::trace!("Started frame {} with frame state version {}", frame, version);
        frame
    }

    fn finish_frame(&mut self) -> u32 {
        let frame = self.current_frame;
        if self.finished_frame == frame {
            return frame;
        }

        if let Some(replies) = &self.replies {
            let mut pending = self.nodes.iter().filter(|handle| handle.thread.is_some()).count();
            while pending > 0 {
                match replies.recv() {
                    Ok(NodeReply::FrameDone { node, frame: done, result }) if done == frame => {
                        if let Err(reason) = result {
                            log::error!("Render node {} failed frame {}: {}", node, frame, reason);
                        }
                        pending -= 1;
                    }
                    Ok(_) => {}
                    Err(_) => {
                        log::error!("Render nodes disconnected during frame {}", frame);
                        break;
                    }
                }
            }
        }

        self.finished_frame = frame;
        frame
    }

    fn handle_event(&mut self, event: &ConfigEvent) -> bool {
        log::trace!("Unhandled event {:?}", event.kind);
        self.unhandled_events += 1;
        false
    }

    fn node_count(&self) -> usize {
        self.node_count
    }

    fn current_frame(&self) -> u32 {
        self.current_frame
    }

    fn time_ms(&self) -> i64 {
        self.clock.elapsed_millis()
    }

    fn config(&self) -> &DistributedConfig {
        &self.config
    }

    fn config_mut(&mut self) -> &mut DistributedConfig {
        &mut self.config
    }
}

impl Drop for LocalCluster {
    fn drop(&mut self) {
        if self.nodes.iter().any(|handle| handle.thread.is_some()) {
            let _ = self.shutdown_nodes();
        }
    }
}
