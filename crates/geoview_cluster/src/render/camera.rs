//! # Camera State
//!
//! A camera is only bound to a context and viewport while something renders
//! through it or while an input event is applied. Outside of that it sits
//! unbound with its last projection and view matrix.

use crate::foundation::math::{Frustum, Mat4d, PixelViewport};

/// Which context a camera is currently bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextBinding {
    /// The zero-size context used while applying input
    Placeholder,
    /// The coordinating process's preview context
    Local,
}

/// Camera of a view instance
#[derive(Debug, Clone)]
pub struct Camera {
    context: Option<ContextBinding>,
    viewport: Option<PixelViewport>,
    projection: Mat4d,
    view_matrix: Mat4d,
    compute_near_far: bool,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            context: None,
            viewport: None,
            projection: Frustum::default().projection_matrix(),
            view_matrix: Mat4d::identity(),
            compute_near_far: true,
        }
    }
}

impl Camera {
    /// Create an unbound camera
    pub fn new() -> Self {
        Self::default()
    }

    /// Context the camera is bound to
    pub fn graphics_context(&self) -> Option<ContextBinding> {
        self.context
    }

    /// Bind or unbind a context
    pub fn set_graphics_context(&mut self, context: Option<ContextBinding>) {
        self.context = context;
    }

    /// Current viewport
    pub fn viewport(&self) -> Option<PixelViewport> {
        self.viewport
    }

    /// Set or clear the viewport
    pub fn set_viewport(&mut self, viewport: Option<PixelViewport>) {
        self.viewport = viewport;
    }

    /// Projection matrix
    pub fn projection(&self) -> &Mat4d {
        &self.projection
    }

    /// Set the projection from an off-axis frustum
    pub fn set_projection_as_frustum(&mut self, frustum: &Frustum) {
        self.projection = frustum.projection_matrix();
    }

    /// World-to-eye matrix
    pub fn view_matrix(&self) -> &Mat4d {
        &self.view_matrix
    }

    /// Set the world-to-eye matrix
    pub fn set_view_matrix(&mut self, matrix: Mat4d) {
        self.view_matrix = matrix;
    }

    /// Whether the renderer may compute near/far itself
    pub fn computes_near_far(&self) -> bool {
        self.compute_near_far
    }

    /// Enable or disable automatic near/far computation
    pub fn set_compute_near_far(&mut self, enabled: bool) {
        self.compute_near_far = enabled;
    }

    /// Drop context and viewport
    pub fn unbind(&mut self) {
        self.context = None;
        self.viewport = None;
    }

    /// Whether the camera has neither context nor viewport
    pub fn is_unbound(&self) -> bool {
        self.context.is_none() && self.viewport.is_none()
    }
}
