//! # Core Module
//!
//! Shared configuration used by every part of the coordination layer.
//!
//! ## Organization
//!
//! - **Config**: Coordinator settings, loadable from TOML or RON
//! - **Foundation**: Low-level utilities (math, time, memory, logging)

pub mod config;

// Re-export foundation modules for convenience
pub use crate::foundation;

// Re-export commonly used config types
pub use config::{
    CoordinatorConfig,
    ContextConfig,
    DepthConfig,
    DisplaySettings,
    HomePose,
    InputConfig,
    LayoutConfig,
    StoreConfig,
    ViewDefaults,
    Config,
    ConfigError,
};
