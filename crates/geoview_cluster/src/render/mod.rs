//! # Local Rendering Support
//!
//! The pieces of rendering the coordination layer touches: cameras, graphics
//! contexts (real and placeholder) and the process-local interactive viewer
//! used for preview rendering on the coordinating process.

pub mod camera;
pub mod context;
pub mod viewer;

pub use camera::{Camera, ContextBinding};
pub use context::{
    ContextFactory, ContextTraits, DrawRequest, GraphicsContext, PlaceholderContext, SharedContext,
};
pub use viewer::{InteractiveViewer, SharedViewInstance, ViewInstance};
