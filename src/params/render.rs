//! Display pass configuration.

/// Rendering configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Window width (pixels)
    pub window_width: u32,

    /// Window height (pixels)
    pub window_height: u32,

    /// Vertical field of view (degrees)
    pub fov_degrees: f32,

    /// Near clipping plane (world units)
    pub near_plane: f32,

    /// Far clipping plane (world units)
    pub far_plane: f32,

    /// Side length of the displayed mesh (world units), centred on the origin
    pub mesh_extent: f32,

    /// Field height to world height multiplier
    pub height_scale: f32,

    /// Field height mapped to the ends of the colour ramp (±)
    pub color_range: f32,

    /// Colour of troughs (linear RGB)
    pub low_color: [f32; 3],

    /// Colour of crests (linear RGB)
    pub high_color: [f32; 3],

    /// Clear colour (linear RGB)
    pub background: [f64; 3],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_width: 800,
            window_height: 800,
            fov_degrees: 45.0,
            near_plane: 0.1,
            far_plane: 100.0,
            mesh_extent: 4.0,
            height_scale: 0.5,
            color_range: 2.0,
            low_color: [0.02, 0.08, 0.35],
            high_color: [0.55, 0.9, 1.0],
            background: [0.0, 0.0, 0.2],
        }
    }
}

impl RenderConfig {
    pub fn aspect_ratio(&self) -> f32 {
        self.window_width as f32 / self.window_height as f32
    }

    /// Colour for a field height (same ramp as the display shader)
    pub fn color_for_height(&self, height: f32) -> [f32; 3] {
        let t = (0.5 + 0.5 * height / self.color_range).clamp(0.0, 1.0);
        let mut color = [0.0; 3];
        for (i, channel) in color.iter_mut().enumerate() {
            *channel = self.low_color[i] + (self.high_color[i] - self.low_color[i]) * t;
        }
        color
    }
}
