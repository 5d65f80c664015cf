//! # Graphics Contexts
//!
//! Context creation belongs to the windowing layer and is reached through
//! [`ContextFactory`]. The [`PlaceholderContext`] is owned by the input
//! translator and only gives manipulators a viewport-sized context to look at.

use crate::core::config::ContextConfig;
use crate::foundation::math::{Mat4d, PixelViewport};
use crate::scene::SceneId;
use parking_lot::Mutex;
use std::sync::Arc;

/// Requested properties of a graphics context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextTraits {
    /// Window x position
    pub x: i32,
    /// Window y position
    pub y: i32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Window border and title bar
    pub window_decoration: bool,
    /// Double-buffered framebuffer
    pub double_buffer: bool,
    /// Off-screen pixel buffer
    pub pbuffer: bool,
    /// X display number
    pub display_num: i32,
    /// X screen number
    pub screen_num: i32,
}

impl ContextTraits {
    /// Traits for the coordinating process's preview context.
    ///
    /// Unset display and screen numbers are taken from `DISPLAY`, falling back to 0.
    pub fn for_preview(config: &ContextConfig) -> Self {
        let mut traits = Self {
            x: 0,
            y: 0,
            width: config.width,
            height: config.height,
            window_decoration: false,
            double_buffer: false,
            pbuffer: config.pbuffer,
            display_num: config.display_num,
            screen_num: config.screen_num,
        };

        if traits.display_num < 0 || traits.screen_num < 0 {
            if let Some((display, screen)) = std::env::var("DISPLAY").ok().as_deref().and_then(parse_display) {
                if traits.display_num < 0 {
                    traits.display_num = display;
                }
                if traits.screen_num < 0 {
                    traits.screen_num = screen;
                }
            }
        }
        traits.display_num = traits.display_num.max(0);
        traits.screen_num = traits.screen_num.max(0);
        traits
    }
}

/// Parse an X display string such as `host:1.2` into (display, screen)
fn parse_display(display: &str) -> Option<(i32, i32)> {
    let (_, numbers) = display.rsplit_once(':')?;
    let mut parts = numbers.splitn(2, '.');
    let display_num = parts.next()?.parse().ok()?;
    let screen_num = parts.next().map_or(Some(0), |screen| screen.parse().ok())?;
    Some((display_num, screen_num))
}

/// One view to draw in a local rendering traversal
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRequest {
    /// Frame being drawn
    pub frame_number: u32,
    /// Scene of the view
    pub scene_id: SceneId,
    /// World-to-eye matrix
    pub view_matrix: Mat4d,
    /// Projection matrix
    pub projection: Mat4d,
    /// Whether the statistics overlay is shown
    pub statistics: bool,
}

/// A realized graphics context
pub trait GraphicsContext: Send {
    /// Create the underlying window or buffer; false on failure
    fn realize(&mut self) -> bool;

    /// Make the context current on the calling thread
    fn make_current(&mut self);

    /// Limit texture memory in bytes
    fn set_max_texture_pool_size(&mut self, bytes: u64);

    /// Limit buffer object memory in bytes
    fn set_max_buffer_object_pool_size(&mut self, bytes: u64);

    /// Draw one view
    fn draw(&mut self, request: &DrawRequest);

    /// Wait for all submitted draws of the frame
    fn finish(&mut self);
}

/// Creates graphics contexts
pub trait ContextFactory: Send + Sync {
    /// Create a context, or `None` if the platform cannot provide one
    fn create(&self, traits: &ContextTraits) -> Option<Box<dyn GraphicsContext>>;
}

/// Context shared between the coordinator and its viewer
pub type SharedContext = Arc<Mutex<Box<dyn GraphicsContext>>>;

/// Zero-size stand-in context used while input events are applied
#[derive(Debug, Default)]
pub struct PlaceholderContext {
    viewport: PixelViewport,
    cameras: usize,
}

impl PlaceholderContext {
    /// Create a placeholder of size zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Resize to the viewport of the event being applied
    pub fn set_pixel_viewport(&mut self, width: u32, height: u32) {
        self.viewport = PixelViewport::sized(width, height);
    }

    /// Current size
    pub fn pixel_viewport(&self) -> PixelViewport {
        self.viewport
    }

    /// Record a camera bound to this context
    pub fn attach_camera(&mut self) {
        self.cameras += 1;
    }

    /// Number of cameras bound to this context
    pub fn camera_count(&self) -> usize {
        self.cameras
    }

    /// Forget all cameras
    pub fn clear_cameras(&mut self) {
        self.cameras = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_display() {
        assert_eq!(parse_display(":0"), Some((0, 0)));
        assert_eq!(parse_display("localhost:1.2"), Some((1, 2)));
        assert_eq!(parse_display("garbage"), None);
    }

    #[test]
    fn test_preview_traits_are_clamped() {
        let config = ContextConfig { display_num: -5, screen_num: -1, ..ContextConfig::default() };
        let traits = ContextTraits::for_preview(&config);

        assert!(traits.display_num >= 0);
        assert!(traits.screen_num >= 0);
        assert_eq!((traits.width, traits.height), (10, 10));
        assert!(!traits.window_decoration);
        assert!(!traits.double_buffer);
    }

    #[test]
    fn test_placeholder_camera_tracking() {
        let mut placeholder = PlaceholderContext::new();
        placeholder.set_pixel_viewport(640, 480);
        placeholder.attach_camera();

        assert_eq!(placeholder.pixel_viewport(), PixelViewport::sized(640, 480));
        assert_eq!(placeholder.camera_count(), 1);

        placeholder.clear_cameras();
        assert_eq!(placeholder.camera_count(), 0);
    }
}
