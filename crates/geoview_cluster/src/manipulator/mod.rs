//! # Camera Manipulators
//!
//! A manipulator accumulates input into a camera pose. Which one a view gets
//! is decided once, when its scene instance is first bound: geocentric scenes
//! get the planet-surface manipulator, everything else the orbit manipulator
//! with a fixed home pose.

pub mod orbit;
pub mod planet;

pub use orbit::OrbitManipulator;
pub use planet::PlanetSurfaceManipulator;

use crate::core::config::HomePose;
use crate::foundation::math::Mat4d;
use crate::input::GuiEvent;
use crate::render::Camera;
use crate::scene::{CoordinateFrame, Scene};

/// Camera manipulator variants
#[derive(Debug, Clone)]
pub enum CameraManipulator {
    /// Navigation around an ellipsoid
    PlanetSurface(PlanetSurfaceManipulator),
    /// Trackball-style orbit around a center point
    Orbit(OrbitManipulator),
}

impl CameraManipulator {
    /// Pick the manipulator suited to a scene
    pub fn for_scene(scene: &Scene, home: &HomePose) -> Self {
        match scene.coordinate_frame() {
            CoordinateFrame::Geocentric { polar_radius } => {
                log::debug!("Planet-surface manipulator for {}", scene.id());
                Self::PlanetSurface(PlanetSurfaceManipulator::new(polar_radius))
            }
            CoordinateFrame::Projected => {
                log::debug!("Orbit manipulator for {}", scene.id());
                Self::Orbit(OrbitManipulator::with_home(home))
            }
        }
    }

    /// Apply one event; returns whether the manipulator used it.
    ///
    /// The camera carries the viewport and projection of the channel that
    /// produced the event.
    pub fn handle(&mut self, event: &GuiEvent, camera: &Camera) -> bool {
        match self {
            Self::PlanetSurface(manipulator) => manipulator.handle(event, camera),
            Self::Orbit(manipulator) => manipulator.handle(event, camera),
        }
    }

    /// Camera-to-world matrix of the current pose
    pub fn matrix(&self) -> Mat4d {
        match self {
            Self::PlanetSurface(manipulator) => manipulator.matrix(),
            Self::Orbit(manipulator) => manipulator.matrix(),
        }
    }

    /// World-to-eye (view) matrix of the current pose
    pub fn inverse_matrix(&self) -> Mat4d {
        match self {
            Self::PlanetSurface(manipulator) => manipulator.inverse_matrix(),
            Self::Orbit(manipulator) => manipulator.inverse_matrix(),
        }
    }

    /// Return to the home pose
    pub fn home(&mut self) {
        match self {
            Self::PlanetSurface(manipulator) => manipulator.home(),
            Self::Orbit(manipulator) => manipulator.home(),
        }
    }
}

/// Drag scale derived from the projection: tangent of half the vertical field of view
pub(crate) fn half_fov_tangent(camera: &Camera) -> f64 {
    let scale = camera.projection()[(1, 1)];
    if scale.abs() > f64::EPSILON {
        1.0 / scale
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Ellipsoid, MapNode, SceneId, SceneNode};

    #[test]
    fn test_manipulator_choice_follows_scene() {
        let earth = Scene::new(SceneId(1), SceneNode::Map(MapNode::geocentric("earth", Ellipsoid::WGS84)));
        let flat = Scene::new(SceneId(1), SceneNode::model("cow.osg"));

        assert!(matches!(
            CameraManipulator::for_scene(&earth, &HomePose::default()),
            CameraManipulator::PlanetSurface(_)
        ));
        assert!(matches!(
            CameraManipulator::for_scene(&flat, &HomePose::default()),
            CameraManipulator::Orbit(_)
        ));
    }

    #[test]
    fn test_matrix_and_inverse_agree() {
        let manipulator = CameraManipulator::Orbit(OrbitManipulator::with_home(&HomePose::default()));
        let product = manipulator.matrix() * manipulator.inverse_matrix();
        assert!((product - Mat4d::identity()).norm() < 1e-9);
    }
}
