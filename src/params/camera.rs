//! Orbit camera controls and limits.

/// Per-frame orbit increments and clamps
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitControls {
    /// Azimuth/elevation change per frame while a rotate key is held (radians)
    pub rotate_step_rad: f32,

    /// Distance change per frame while a zoom key is held (world units)
    pub zoom_step: f32,

    /// Closest allowed distance to the origin (world units)
    pub min_distance: f32,

    /// Lowest elevation (radians, strictly greater than -π/2)
    pub min_elevation_rad: f32,

    /// Highest elevation (radians, strictly less than π/2)
    pub max_elevation_rad: f32,

    /// Starting distance (world units)
    pub initial_distance: f32,

    /// Starting azimuth (radians)
    pub initial_azimuth_rad: f32,

    /// Starting elevation (radians)
    pub initial_elevation_rad: f32,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            rotate_step_rad: 0.02,
            zoom_step: 0.1,
            min_distance: 1.5, // Keeps the eye outside the displaced surface
            min_elevation_rad: -1.5,
            max_elevation_rad: 1.5,
            initial_distance: 6.0,
            initial_azimuth_rad: 0.0,
            initial_elevation_rad: 0.5,
        }
    }
}
