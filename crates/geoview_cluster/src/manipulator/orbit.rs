//! Orbit manipulator for non-geocentric scenes

use super::half_fov_tangent;
use crate::core::config::HomePose;
use crate::foundation::math::{Mat4d, Point3d, Vec3d};
use crate::input::{GuiButton, GuiEvent, GuiEventKind, GuiKey, ScrollMotion};
use crate::render::Camera;
use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};
use std::f64::consts::PI;

const ZOOM_STEP: f64 = 0.1;
const MIN_DISTANCE: f64 = 1e-3;

/// Orbits a center point at a distance
#[derive(Debug, Clone)]
pub struct OrbitManipulator {
    center: Point3d,
    rotation: UnitQuaternion<f64>,
    distance: f64,
    home: (Point3d, Point3d, Vec3d),
    last_pointer: Option<(f64, f64)>,
}

impl OrbitManipulator {
    /// Create a manipulator starting at its home pose
    pub fn with_home(home: &HomePose) -> Self {
        let eye = Point3d::from(home.eye);
        let center = Point3d::from(home.center);
        let up = Vec3d::from(home.up);

        let mut manipulator = Self {
            center,
            rotation: UnitQuaternion::identity(),
            distance: 1.0,
            home: (eye, center, up),
            last_pointer: None,
        };
        manipulator.home();
        manipulator
    }

    /// Return to the home pose
    pub fn home(&mut self) {
        let (eye, center, up) = self.home;
        let view = Isometry3::look_at_rh(&eye, &center, &up);
        self.center = center;
        self.rotation = view.rotation.inverse();
        self.distance = (eye - center).norm().max(MIN_DISTANCE);
        self.last_pointer = None;
    }

    /// Distance from the eye to the center
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Camera-to-world matrix
    pub fn matrix(&self) -> Mat4d {
        let pose = Translation3::from(self.center.coords)
            * self.rotation
            * Translation3::new(0.0, 0.0, self.distance);
        pose.to_homogeneous()
    }

    /// World-to-eye matrix
    pub fn inverse_matrix(&self) -> Mat4d {
        let pose = Translation3::from(self.center.coords)
            * self.rotation
            * Translation3::new(0.0, 0.0, self.distance);
        pose.inverse().to_homogeneous()
    }

    fn zoom(&mut self, factor: f64) {
        self.distance = (self.distance * factor).max(MIN_DISTANCE);
    }

    /// Apply one event
    pub fn handle(&mut self, event: &GuiEvent, camera: &Camera) -> bool {
        match event.kind {
            GuiEventKind::Push(_) => {
                self.last_pointer = Some((event.x_normalized(), event.y_normalized()));
                true
            }
            GuiEventKind::Release(_) => {
                self.last_pointer = None;
                true
            }
            GuiEventKind::Drag => {
                let (x, y) = (event.x_normalized(), event.y_normalized());
                let Some((last_x, last_y)) = self.last_pointer.replace((x, y)) else {
                    return false;
                };
                let (dx, dy) = (x - last_x, y - last_y);

                if event.buttons.contains(GuiButton::Left.mask()) {
                    let yaw = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), -dx * PI);
                    let pitch = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), dy * PI);
                    self.rotation = yaw * self.rotation * pitch;
                } else if event.buttons.contains(GuiButton::Middle.mask()) {
                    let scale = self.distance * half_fov_tangent(camera);
                    let offset = self.rotation * Vec3d::new(-dx * scale, -dy * scale, 0.0);
                    self.center += offset;
                } else if event.buttons.contains(GuiButton::Right.mask()) {
                    self.zoom(1.0 + dy);
                }
                true
            }
            GuiEventKind::Scroll(ScrollMotion::Up) => {
                self.zoom(1.0 - ZOOM_STEP);
                true
            }
            GuiEventKind::Scroll(ScrollMotion::Down) => {
                self.zoom(1.0 + ZOOM_STEP);
                true
            }
            GuiEventKind::KeyDown(GuiKey::Char(' ')) => {
                self.home();
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::eye_position;
    use crate::input::{EventQueue, GuiButton};
    use approx::assert_relative_eq;

    #[test]
    fn test_home_pose_eye() {
        let manipulator = OrbitManipulator::with_home(&HomePose::default());
        assert_relative_eq!(eye_position(&manipulator.matrix()), Point3d::new(0.0, 0.0, 10.0), epsilon = 1e-9);
        assert_relative_eq!(manipulator.distance(), 10.0);
    }

    #[test]
    fn test_scroll_zooms() {
        let mut manipulator = OrbitManipulator::with_home(&HomePose::default());
        let camera = Camera::new();
        let mut queue = EventQueue::new();
        queue.mouse_scroll(ScrollMotion::Up, 0.0);
        queue.mouse_scroll(ScrollMotion::Left, 0.0);

        let events = queue.take_events();
        assert!(manipulator.handle(&events[0], &camera));
        assert!(!manipulator.handle(&events[1], &camera));
        assert_relative_eq!(manipulator.distance(), 9.0);
    }

    #[test]
    fn test_drag_rotates_and_home_restores() {
        let mut manipulator = OrbitManipulator::with_home(&HomePose::default());
        let camera = Camera::new();
        let mut queue = EventQueue::new();
        queue.set_mouse_input_range(0.0, 0.0, 100.0, 100.0);
        queue.mouse_button_press(50.0, 50.0, GuiButton::Left, 0.0);
        queue.mouse_motion(75.0, 50.0, 0.1);
        queue.key_press(GuiKey::Char(' '), 0.2);

        let events = queue.take_events();
        manipulator.handle(&events[0], &camera);
        manipulator.handle(&events[1], &camera);
        let rotated = eye_position(&manipulator.matrix());
        assert!((rotated - Point3d::new(0.0, 0.0, 10.0)).norm() > 1.0);
        assert_relative_eq!(rotated.coords.norm(), 10.0, epsilon = 1e-9);

        manipulator.handle(&events[2], &camera);
        assert_relative_eq!(eye_position(&manipulator.matrix()), Point3d::new(0.0, 0.0, 10.0), epsilon = 1e-9);
    }
}
