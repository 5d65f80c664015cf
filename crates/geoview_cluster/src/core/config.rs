//! # Coordinator Configuration
//!
//! All tunables of the frame coordinator in one serializable tree. Every
//! section has defaults so a config file only needs the values it changes.
//!
//! ## Configuration Categories
//!
//! - **Scene**: model file and scene identifier
//! - **Input**: reserved keys and the layout canvas they drive
//! - **Depth**: near/far ratio constants for geocentric scenes
//! - **Display**: pool sizes and the local preview context

use serde::{Serialize, Deserialize};

// Re-export from the file-format module for convenience
pub use crate::config::{Config, ConfigError};

/// # Reserved Keys
///
/// Keys handled by the coordinator itself in addition to being forwarded to
/// the camera manipulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Toggles the statistics overlay flag in the shared frame state
    pub statistics_key: char,
    /// Toggles the current view between mono and stereo
    pub stereo_key: char,
    /// Switches the layout of the layout canvas
    pub layout_key: char,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            statistics_key: 's',
            stereo_key: 't',
            layout_key: '1',
        }
    }
}

/// # Layout Switching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Name of the canvas whose layout is switched
    pub canvas: String,
    /// Layout index used when the other one is active
    pub primary: usize,
    /// Layout index used when the primary one is active
    pub secondary: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            canvas: "clove".to_string(),
            primary: 0,
            secondary: 1,
        }
    }
}

/// # Depth Bounds
///
/// The near/far ratio grows from `near_ratio_at_radius` at the surface towards
/// `near_ratio_at_radius + near_ratio_growth` far away from the planet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthConfig {
    /// Near/far ratio with the eye on the ellipsoid
    pub near_ratio_at_radius: f64,
    /// Additional ratio reached as the eye moves to infinity
    pub near_ratio_growth: f64,
    /// Smallest near plane ever produced
    pub min_near: f64,
}

impl Default for DepthConfig {
    fn default() -> Self {
        Self {
            near_ratio_at_radius: 0.00001,
            near_ratio_growth: 0.0049,
            min_near: 1.0,
        }
    }
}

/// # Orbit Home Pose
///
/// Home position of the generic orbit manipulator used for non-geocentric scenes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HomePose {
    /// Eye position
    pub eye: [f64; 3],
    /// Look-at point
    pub center: [f64; 3],
    /// Up direction
    pub up: [f64; 3],
}

impl Default for HomePose {
    fn default() -> Self {
        Self {
            eye: [0.0, 0.0, 10.0],
            center: [0.0, 0.0, 0.0],
            up: [0.0, 1.0, 0.0],
        }
    }
}

/// # View Defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewDefaults {
    /// Near plane of a view before the first depth update
    pub near: f64,
    /// Far plane of a view before the first depth update
    pub far: f64,
}

impl Default for ViewDefaults {
    fn default() -> Self {
        Self { near: 0.1, far: 100.0 }
    }
}

/// # Display Settings
///
/// Resource limits applied to the local preview context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// Texture pool size in bytes
    pub max_texture_pool_size: u64,
    /// Buffer object pool size in bytes
    pub max_buffer_object_pool_size: u64,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            max_texture_pool_size: 100_000_000,
            max_buffer_object_pool_size: 200_000_000,
        }
    }
}

/// # Local Preview Context
///
/// Traits of the tiny context the coordinating process creates for its
/// interactive preview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Context width in pixels
    pub width: u32,
    /// Context height in pixels
    pub height: u32,
    /// Use an off-screen pixel buffer instead of a window
    pub pbuffer: bool,
    /// Display number; negative means "from the environment, else 0"
    pub display_num: i32,
    /// Screen number; negative means "from the environment, else 0"
    pub screen_num: i32,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            width: 10,
            height: 10,
            pbuffer: false,
            display_num: -1,
            screen_num: -1,
        }
    }
}

/// # Replication Store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Committed versions kept per object for late mappers
    pub history_depth: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { history_depth: 16 }
    }
}

/// # Complete Coordinator Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Log level (`error` to `trace`) when `RUST_LOG` is unset
    pub log_level: String,
    /// Model file every process loads the scene from
    pub model_file: String,
    /// Scene identifier assigned to every view
    pub scene_id: u64,
    /// Reserved keys
    pub input: InputConfig,
    /// Layout switching
    pub layout: LayoutConfig,
    /// Depth bounds constants
    pub depth: DepthConfig,
    /// Orbit manipulator home pose
    pub home: HomePose,
    /// Initial view near/far
    pub view: ViewDefaults,
    /// Resource limits
    pub display: DisplaySettings,
    /// Local preview context
    pub context: ContextConfig,
    /// Replication store
    pub store: StoreConfig,
}

impl CoordinatorConfig {
    /// Create a configuration with defaults and the given model file
    pub fn new(model_file: impl Into<String>) -> Self {
        Self {
            model_file: model_file.into(),
            ..Self::default()
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set the layout canvas name
    pub fn with_layout_canvas(mut self, canvas: impl Into<String>) -> Self {
        self.layout.canvas = canvas.into();
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.depth.min_near <= 0.0 {
            return Err(ConfigError::Parse(format!(
                "depth.min_near must be positive, got {}",
                self.depth.min_near
            )));
        }
        if self.view.near <= 0.0 || self.view.far < self.view.near {
            return Err(ConfigError::Parse(format!(
                "view near/far must satisfy 0 < near <= far, got {}/{}",
                self.view.near, self.view.far
            )));
        }
        if self.store.history_depth == 0 {
            return Err(ConfigError::Parse("store.history_depth must be at least 1".to_string()));
        }
        Ok(())
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            model_file: "earth.earth".to_string(),
            scene_id: 1,
            input: InputConfig::default(),
            layout: LayoutConfig::default(),
            depth: DepthConfig::default(),
            home: HomePose::default(),
            view: ViewDefaults::default(),
            display: DisplaySettings::default(),
            context: ContextConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

impl Config for CoordinatorConfig {}
