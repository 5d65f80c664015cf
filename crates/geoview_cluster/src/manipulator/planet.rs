//! Planet-surface manipulator for geocentric scenes
//!
//! The pose is a focus point on the ellipsoid's polar sphere plus heading,
//! pitch and range measured in the local tangent frame at that point.

use super::half_fov_tangent;
use crate::foundation::math::{Mat4d, Point3d, Vec3d};
use crate::input::{GuiButton, GuiEvent, GuiEventKind, GuiKey, ScrollMotion};
use crate::render::Camera;
use nalgebra::Isometry3;
use std::f64::consts::FRAC_PI_2;

const MIN_PITCH_DEG: f64 = -89.0;
const MAX_PITCH_DEG: f64 = -5.0;
const MIN_RANGE: f64 = 1.0;
const HOME_RANGE_FACTOR: f64 = 3.0;
const MAX_RANGE_FACTOR: f64 = 10.0;
const ZOOM_STEP: f64 = 0.1;

/// Looks at a point on the planet from a heading, pitch and range
#[derive(Debug, Clone)]
pub struct PlanetSurfaceManipulator {
    polar_radius: f64,
    focus: Vec3d,
    heading: f64,
    pitch: f64,
    range: f64,
    last_pointer: Option<(f64, f64)>,
}

impl PlanetSurfaceManipulator {
    /// Create a manipulator over a planet of the given polar radius
    pub fn new(polar_radius: f64) -> Self {
        let mut manipulator = Self {
            polar_radius: polar_radius.max(0.0),
            focus: Vec3d::x(),
            heading: 0.0,
            pitch: MIN_PITCH_DEG.to_radians(),
            range: MIN_RANGE,
            last_pointer: None,
        };
        manipulator.home();
        manipulator
    }

    /// Look straight down from a few planet radii away
    pub fn home(&mut self) {
        self.focus = Vec3d::x();
        self.heading = 0.0;
        self.pitch = MIN_PITCH_DEG.to_radians();
        self.range = (HOME_RANGE_FACTOR * self.polar_radius).clamp(MIN_RANGE, self.max_range());
        self.last_pointer = None;
    }

    fn max_range(&self) -> f64 {
        (MAX_RANGE_FACTOR * self.polar_radius).max(MIN_RANGE)
    }

    /// Distance from the eye to the focus point
    pub fn range(&self) -> f64 {
        self.range
    }

    /// Pitch in radians, negative when looking down
    pub fn pitch(&self) -> f64 {
        self.pitch
    }

    /// Heading in radians, clockwise from north
    pub fn heading(&self) -> f64 {
        self.heading
    }

    /// (up, east, north) at the focus point
    fn tangent_frame(&self) -> (Vec3d, Vec3d, Vec3d) {
        let up = self.focus;
        let east = Vec3d::z()
            .cross(&up)
            .try_normalize(f64::EPSILON)
            .unwrap_or_else(Vec3d::y);
        let north = up.cross(&east);
        (up, east, north)
    }

    fn view(&self) -> Isometry3<f64> {
        let (up, east, north) = self.tangent_frame();
        let horizontal = north * self.heading.cos() + east * self.heading.sin();
        let forward = horizontal * self.pitch.cos() + up * self.pitch.sin();

        let focus = Point3d::from(self.focus * self.polar_radius);
        let eye = focus - forward * self.range;
        Isometry3::look_at_rh(&eye, &focus, &up)
    }

    /// Camera-to-world matrix
    pub fn matrix(&self) -> Mat4d {
        self.view().inverse().to_homogeneous()
    }

    /// World-to-eye matrix
    pub fn inverse_matrix(&self) -> Mat4d {
        self.view().to_homogeneous()
    }

    fn zoom(&mut self, factor: f64) {
        self.range = (self.range * factor).clamp(MIN_RANGE, self.max_range());
    }

    fn pan(&mut self, dx: f64, dy: f64, camera: &Camera) {
        if self.polar_radius <= 0.0 {
            return;
        }
        let (_, east, north) = self.tangent_frame();
        let scale = self.range * half_fov_tangent(camera) / self.polar_radius;
        let (sin, cos) = self.heading.sin_cos();
        let right = east * cos - north * sin;
        let ahead = north * cos + east * sin;
        let moved = self.focus - (right * dx + ahead * dy) * scale;
        if let Some(focus) = moved.try_normalize(f64::EPSILON) {
            self.focus = focus;
        }
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
                    self.pan(dx, dy, camera);
                } else if event.buttons.contains(GuiButton::Middle.mask()) {
                    self.heading += dx * FRAC_PI_2;
                    self.pitch = (self.pitch + dy * FRAC_PI_2)
                        .clamp(MIN_PITCH_DEG.to_radians(), MAX_PITCH_DEG.to_radians());
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
    use crate::input::EventQueue;
    use crate::scene::Ellipsoid;
    use approx::assert_relative_eq;

    const RP: f64 = Ellipsoid::WGS84.radius_polar;

    #[test]
    fn test_home_eye_is_above_surface() {
        let manipulator = PlanetSurfaceManipulator::new(RP);
        let eye = eye_position(&manipulator.matrix());

        assert!(eye.coords.norm() > RP);
        assert_relative_eq!(manipulator.range(), 3.0 * RP);
    }

    #[test]
    fn test_scroll_zoom_is_clamped() {
        let mut manipulator = PlanetSurfaceManipulator::new(RP);
        let camera = Camera::new();
        let mut queue = EventQueue::new();
        for _ in 0..100 {
            queue.mouse_scroll(ScrollMotion::Down, 0.0);
        }
        for event in queue.take_events() {
            manipulator.handle(&event, &camera);
        }
        assert_relative_eq!(manipulator.range(), 10.0 * RP);
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut manipulator = PlanetSurfaceManipulator::new(RP);
        let camera = Camera::new();
        let mut queue = EventQueue::new();
        queue.set_mouse_input_range(0.0, 0.0, 100.0, 100.0);
        queue.mouse_button_press(50.0, 50.0, GuiButton::Middle, 0.0);
        queue.mouse_motion(50.0, 0.0, 0.1);

        for event in queue.take_events() {
            assert!(manipulator.handle(&event, &camera));
        }
        assert_relative_eq!(manipulator.pitch(), MAX_PITCH_DEG.to_radians());
    }

    #[test]
    fn test_pan_moves_focus_along_surface() {
        let mut manipulator = PlanetSurfaceManipulator::new(RP);
        let camera = Camera::new();
        let before = eye_position(&manipulator.matrix());

        let mut queue = EventQueue::new();
        queue.set_mouse_input_range(0.0, 0.0, 100.0, 100.0);
        queue.mouse_button_press(50.0, 50.0, GuiButton::Left, 0.0);
        queue.mouse_motion(60.0, 50.0, 0.1);
        for event in queue.take_events() {
            manipulator.handle(&event, &camera);
        }

        let after = eye_position(&manipulator.matrix());
        assert!((after - before).norm() > 1.0);
        assert_relative_eq!(manipulator.focus.norm(), 1.0, epsilon = 1e-12);
    }
}
