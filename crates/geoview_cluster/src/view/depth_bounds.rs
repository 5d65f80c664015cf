//! # Depth Bounds for Geocentric Views
//!
//! The far plane sits at the horizon: the tangent distance from the eye to a
//! sphere of the ellipsoid's polar radius. The near plane is a fraction of the
//! far plane that grows with altitude, so the depth range stays tight from the
//! ground up to orbit without looking at scene content.

use crate::core::config::DepthConfig;
use crate::foundation::math::{eye_position, Mat4d};
use crate::scene::CoordinateFrame;

/// Near and far projection planes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthBounds {
    /// Near plane distance
    pub near: f64,
    /// Far plane distance
    pub far: f64,
}

/// Computes near/far planes from the eye's distance to the planet center
#[derive(Debug, Clone, PartialEq)]
pub struct DepthBoundsCalculator {
    ratio_at_radius: f64,
    ratio_growth: f64,
    min_near: f64,
}

impl Default for DepthBoundsCalculator {
    fn default() -> Self {
        Self::from_config(&DepthConfig::default())
    }
}

impl DepthBoundsCalculator {
    /// Build a calculator from configuration
    pub fn from_config(config: &DepthConfig) -> Self {
        Self {
            ratio_at_radius: config.near_ratio_at_radius,
            ratio_growth: config.near_ratio_growth,
            min_near: config.min_near,
        }
    }

    /// Near/far ratio for an eye at distance `d` from the center.
    ///
    /// Equals the surface ratio at `d = rp` and approaches surface ratio plus
    /// growth as `d` goes to infinity.
    pub fn near_far_ratio(&self, d: f64, polar_radius: f64) -> f64 {
        self.ratio_at_radius + self.ratio_growth * ((d - polar_radius) / d)
    }

    /// Bounds for an eye at distance `d`, or `None` at or below the surface
    pub fn bounds_at_distance(&self, d: f64, polar_radius: f64) -> Option<DepthBounds> {
        if d <= polar_radius {
            return None;
        }
        let far = (d * d - polar_radius * polar_radius).sqrt();
        let near = (far * self.near_far_ratio(d, polar_radius)).max(self.min_near);
        Some(DepthBounds { near, far: far.max(near) })
    }

    /// Bounds for a camera, or `None` when the caller should keep its previous values.
    ///
    /// `camera_to_world` is the inverse view matrix; its translation is the eye.
    /// Non-geocentric frames and eyes at or inside the ellipsoid yield `None`.
    pub fn compute(&self, camera_to_world: &Mat4d, frame: CoordinateFrame) -> Option<DepthBounds> {
        let CoordinateFrame::Geocentric { polar_radius } = frame else {
            return None;
        };
        let d = eye_position(camera_to_world).coords.norm();
        self.bounds_at_distance(d, polar_radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3d;
    use crate::scene::Ellipsoid;
    use approx::assert_relative_eq;

    const RP: f64 = Ellipsoid::WGS84.radius_polar;

    fn eye_at(d: f64) -> Mat4d {
        Mat4d::new_translation(&Vec3d::new(0.0, 0.0, d))
    }

    #[test]
    fn test_bounds_above_surface() {
        let calculator = DepthBoundsCalculator::default();
        for altitude in [1.0, 100.0, 10_000.0, 1.0e6, 4.0e7, 1.0e9] {
            let bounds = calculator
                .compute(&eye_at(RP + altitude), CoordinateFrame::Geocentric { polar_radius: RP })
                .unwrap();
            assert!(bounds.near >= 1.0);
            assert!(bounds.near > 0.0 && bounds.near <= bounds.far, "altitude {}", altitude);
        }
    }

    #[test]
    fn test_far_is_horizon_distance() {
        let calculator = DepthBoundsCalculator::default();
        let d = 2.0 * RP;
        let bounds = calculator.bounds_at_distance(d, RP).unwrap();

        assert_relative_eq!(bounds.far, (3.0_f64).sqrt() * RP, max_relative = 1e-12);
        assert_relative_eq!(bounds.near, bounds.far * (0.00001 + 0.0049 * 0.5), max_relative = 1e-12);
    }

    #[test]
    fn test_ratio_limits() {
        let calculator = DepthBoundsCalculator::default();
        assert_relative_eq!(calculator.near_far_ratio(RP * (1.0 + 1e-12), RP), 0.00001, epsilon = 1e-12);
        assert_relative_eq!(calculator.near_far_ratio(RP * 1e12, RP), 0.00001 + 0.0049, epsilon = 1e-12);
    }

    #[test]
    fn test_near_floor_close_to_surface() {
        let calculator = DepthBoundsCalculator::default();
        let bounds = calculator.bounds_at_distance(RP + 0.5, RP).unwrap();
        assert_relative_eq!(bounds.near, 1.0);
    }

    #[test]
    fn test_at_or_below_surface_is_unchanged() {
        let calculator = DepthBoundsCalculator::default();
        let frame = CoordinateFrame::Geocentric { polar_radius: RP };

        assert!(calculator.compute(&eye_at(RP), frame).is_none());
        assert!(calculator.compute(&eye_at(RP - 10.0), frame).is_none());
        assert!(calculator.compute(&Mat4d::identity(), frame).is_none());
    }

    #[test]
    fn test_projected_frame_is_unchanged() {
        let calculator = DepthBoundsCalculator::default();
        assert!(calculator.compute(&eye_at(1.0e9), CoordinateFrame::Projected).is_none());
    }

    #[test]
    fn test_zero_radius() {
        let calculator = DepthBoundsCalculator::default();
        let bounds = calculator.bounds_at_distance(1000.0, 0.0).unwrap();
        assert_relative_eq!(bounds.far, 1000.0);
        assert_relative_eq!(bounds.near, 1000.0 * 0.00491, max_relative = 1e-12);
    }
}
