//! Keyboard-driven orbit camera around the tank origin.

use glam::{Mat4, Vec3};

use crate::input::KeysHeld;
use crate::params::{OrbitControls, RenderConfig};

/// Spherical camera parameters; the Cartesian eye is derived every frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub distance: f32,
    /// Azimuth θ (radians)
    pub azimuth: f32,
    /// Elevation φ (radians)
    pub elevation: f32,
}

impl CameraState {
    /// Starting state from the configured controls
    pub fn new(controls: &OrbitControls) -> Self {
        Self {
            distance: controls.initial_distance.max(controls.min_distance),
            azimuth: controls.initial_azimuth_rad,
            elevation: controls
                .initial_elevation_rad
                .clamp(controls.min_elevation_rad, controls.max_elevation_rad),
        }
    }

    /// Apply one frame of held keys
    pub fn update(self, keys: &KeysHeld, controls: &OrbitControls) -> Self {
        let mut next = self;

        if keys.zoom_in {
            next.distance -= controls.zoom_step;
        }
        if keys.zoom_out {
            next.distance += controls.zoom_step;
        }
        if keys.rotate_left {
            next.azimuth -= controls.rotate_step_rad;
        }
        if keys.rotate_right {
            next.azimuth += controls.rotate_step_rad;
        }
        if keys.rotate_up {
            next.elevation += controls.rotate_step_rad;
        }
        if keys.rotate_down {
            next.elevation -= controls.rotate_step_rad;
        }

        next.distance = next.distance.max(controls.min_distance);
        next.elevation = next
            .elevation
            .clamp(controls.min_elevation_rad, controls.max_elevation_rad);
        next
    }

    /// Eye position `distance * (cos φ cos θ, sin φ, cos φ sin θ)`
    pub fn position(&self) -> Vec3 {
        let (sin_phi, cos_phi) = self.elevation.sin_cos();
        let (sin_theta, cos_theta) = self.azimuth.sin_cos();
        self.distance * Vec3::new(cos_phi * cos_theta, sin_phi, cos_phi * sin_theta)
    }

    /// Look-at toward the origin with +Y up
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), Vec3::ZERO, Vec3::Y)
    }

    /// Perspective projection for the configured surface
    pub fn projection_matrix(render_config: &RenderConfig) -> Mat4 {
        Mat4::perspective_rh(
            render_config.fov_degrees.to_radians(),
            render_config.aspect_ratio(),
            render_config.near_plane,
            render_config.far_plane,
        )
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;

    fn held(f: impl FnOnce(&mut KeysHeld)) -> KeysHeld {
        let mut keys = KeysHeld::default();
        f(&mut keys);
        keys
    }

    #[test]
    fn test_look_up_never_reaches_pole() {
        let controls = OrbitControls::default();
        let keys = held(|k| k.rotate_up = true);
        let mut camera = CameraState::new(&controls);

        for _ in 0..10_000 {
            camera = camera.update(&keys, &controls);
            assert!(camera.elevation < FRAC_PI_2);
        }
        assert_eq!(camera.elevation, controls.max_elevation_rad);

        let keys = held(|k| k.rotate_down = true);
        for _ in 0..10_000 {
            camera = camera.update(&keys, &controls);
            assert!(camera.elevation > -FRAC_PI_2);
        }
    }

    #[test]
    fn test_zoom_in_stops_at_min_distance() {
        let controls = OrbitControls::default();
        let keys = held(|k| k.zoom_in = true);
        let mut camera = CameraState::new(&controls);

        for _ in 0..1_000 {
            camera = camera.update(&keys, &controls);
            assert!(camera.distance >= controls.min_distance);
        }
        assert_eq!(camera.distance, controls.min_distance);
    }

    #[test]
    fn test_opposing_keys_cancel() {
        let controls = OrbitControls::default();
        let keys = held(|k| {
            k.rotate_left = true;
            k.rotate_right = true;
            k.zoom_in = true;
            k.zoom_out = true;
        });
        let camera = CameraState::new(&controls);
        let next = camera.update(&keys, &controls);
        assert!((next.azimuth - camera.azimuth).abs() < 1e-6);
        assert!((next.distance - camera.distance).abs() < 1e-6);
    }

    #[test]
    fn test_position_follows_spherical_formula() {
        let camera = CameraState {
            distance: 6.0,
            azimuth: 0.0,
            elevation: 0.0,
        };
        let eye = camera.position();
        assert!((eye - Vec3::new(6.0, 0.0, 0.0)).length() < 1e-5);

        let camera = CameraState {
            distance: 2.0,
            azimuth: FRAC_PI_2,
            elevation: 0.0,
        };
        assert!((camera.position() - Vec3::new(0.0, 0.0, 2.0)).length() < 1e-5);

        for step in 0..32 {
            let camera = CameraState {
                distance: 3.0,
                azimuth: step as f32 * 0.4,
                elevation: step as f32 * 0.09 - 1.4,
            };
            assert!((camera.position().length() - 3.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_view_matrix_maps_origin_in_front_of_eye() {
        let camera = CameraState::new(&OrbitControls::default());
        let view = camera.view_matrix();
        let origin_in_view = view.transform_point3(Vec3::ZERO);

        // Right-handed view space looks down -Z
        assert!((origin_in_view.z + camera.distance).abs() < 1e-4);
        assert!(origin_in_view.x.abs() < 1e-4);
        assert!(origin_in_view.y.abs() < 1e-4);

        let view_proj = CameraState::projection_matrix(&RenderConfig::default()) * view;
        assert_ne!(view_proj, Mat4::IDENTITY);
        assert!(view_proj.is_finite());
    }
}
