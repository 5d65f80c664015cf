//! Math utilities and types
//!
//! Planet-scale scenes need double precision everywhere a camera or a world
//! position is involved, so every alias here is `f64`.

use serde::{Deserialize, Serialize};

pub use nalgebra::{Matrix4, Point3, Vector3, Vector4};

/// 3D vector type
pub type Vec3d = Vector3<f64>;

/// 3D point type
pub type Point3d = Point3<f64>;

/// 4x4 matrix type
pub type Mat4d = Matrix4<f64>;

/// Pixel rectangle of a channel or window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PixelViewport {
    /// Left edge in pixels
    pub x: i32,
    /// Bottom edge in pixels
    pub y: i32,
    /// Width in pixels
    pub w: u32,
    /// Height in pixels
    pub h: u32,
}

impl PixelViewport {
    /// Create a viewport anchored at the origin
    pub const fn sized(w: u32, h: u32) -> Self {
        Self { x: 0, y: 0, w, h }
    }

    /// Whether the viewport covers at least one pixel
    pub const fn has_area(&self) -> bool {
        self.w > 0 && self.h > 0
    }
}

/// Off-axis perspective frustum, as delivered with every channel event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frustum {
    /// Left plane at the near distance
    pub left: f64,
    /// Right plane at the near distance
    pub right: f64,
    /// Bottom plane at the near distance
    pub bottom: f64,
    /// Top plane at the near distance
    pub top: f64,
    /// Near plane distance
    pub near: f64,
    /// Far plane distance
    pub far: f64,
}

impl Default for Frustum {
    fn default() -> Self {
        Self {
            left: -1.0,
            right: 1.0,
            bottom: -1.0,
            top: 1.0,
            near: 1.0,
            far: 100.0,
        }
    }
}

impl Frustum {
    /// Move the near plane while keeping the field of view.
    ///
    /// The side planes are specified at the near distance, so they scale with it.
    pub fn adjust_near(&mut self, near: f64) {
        if approx::relative_eq!(near, self.near) || self.near == 0.0 {
            self.near = near;
            return;
        }
        let ratio = near / self.near;
        self.left *= ratio;
        self.right *= ratio;
        self.bottom *= ratio;
        self.top *= ratio;
        self.near = near;
    }

    /// OpenGL-style projection matrix for this frustum
    pub fn projection_matrix(&self) -> Mat4d {
        let (l, r, b, t, n, f) = (self.left, self.right, self.bottom, self.top, self.near, self.far);
        let mut m = Mat4d::zeros();
        m[(0, 0)] = 2.0 * n / (r - l);
        m[(0, 2)] = (r + l) / (r - l);
        m[(1, 1)] = 2.0 * n / (t - b);
        m[(1, 2)] = (t + b) / (t - b);
        m[(2, 2)] = -(f + n) / (f - n);
        m[(2, 3)] = -2.0 * f * n / (f - n);
        m[(3, 2)] = -1.0;
        m
    }
}

/// Eye position encoded in a camera-to-world matrix
pub fn eye_position(camera_to_world: &Mat4d) -> Point3d {
    camera_to_world.transform_point(&Point3d::origin())
}

/// Unproject a window coordinate into world space.
///
/// `depth` is 0 for the near plane and 1 for the far plane. Returns `None` when
/// the combined matrix is singular.
pub fn unproject(
    window: (f64, f64, f64),
    view: &Mat4d,
    projection: &Mat4d,
    viewport: &PixelViewport,
) -> Option<Point3d> {
    let inverse = (projection * view).try_inverse()?;
    let (x, y, depth) = window;
    let ndc = Vector4::new(
        2.0 * (x - f64::from(viewport.x)) / f64::from(viewport.w) - 1.0,
        2.0 * (y - f64::from(viewport.y)) / f64::from(viewport.h) - 1.0,
        2.0 * depth - 1.0,
        1.0,
    );
    let world = inverse * ndc;
    if world.w == 0.0 {
        return None;
    }
    Some(Point3d::new(world.x / world.w, world.y / world.w, world.z / world.w))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_adjust_near_scales_side_planes() {
        let mut frustum = Frustum { left: -0.5, right: 0.5, bottom: -0.25, top: 0.25, near: 0.5, far: 10.0 };
        frustum.adjust_near(2.0);

        assert_relative_eq!(frustum.near, 2.0);
        assert_relative_eq!(frustum.left, -2.0);
        assert_relative_eq!(frustum.top, 1.0);
        assert_relative_eq!(frustum.far, 10.0);
    }

    #[test]
    fn test_eye_position_from_translation() {
        let camera = Mat4d::new_translation(&Vec3d::new(1.0, 2.0, 3.0));
        assert_relative_eq!(eye_position(&camera), Point3d::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_unproject_center_hits_axis() {
        let frustum = Frustum { left: -1.0, right: 1.0, bottom: -1.0, top: 1.0, near: 1.0, far: 100.0 };
        let viewport = PixelViewport::sized(200, 100);
        let view = Mat4d::identity();
        let projection = frustum.projection_matrix();

        let near = unproject((100.0, 50.0, 0.0), &view, &projection, &viewport).unwrap();
        let far = unproject((100.0, 50.0, 1.0), &view, &projection, &viewport).unwrap();

        assert_relative_eq!(near, Point3d::new(0.0, 0.0, -1.0), epsilon = 1e-9);
        assert_relative_eq!(far, Point3d::new(0.0, 0.0, -100.0), epsilon = 1e-6);
    }
}
