//! Command-line argument parsing.

use clap::Parser;

use crate::error::Result;
use crate::params::{InitialBump, RenderConfig, SimulationParameters};

/// Command line arguments; anything omitted keeps its default
#[derive(Parser, Debug)]
#[command(name = "wavetank")]
#[command(about = "GPU 2D wave-equation tank with an orbit camera", long_about = None)]
pub struct Args {
    /// Field resolution (cells per side)
    #[arg(long, value_name = "CELLS", value_parser = clap::value_parser!(u32).range(3..))]
    pub grid_size: Option<u32>,

    /// Timestep per frame (seconds)
    #[arg(long, value_name = "SECONDS")]
    pub dt: Option<f32>,

    /// Grid spacing (world units per cell)
    #[arg(long, value_name = "UNITS")]
    pub dx: Option<f32>,

    /// Wave propagation speed (units per second)
    #[arg(long, value_name = "SPEED")]
    pub wave_speed: Option<f32>,

    /// Per-step damping factor in (0, 1]
    #[arg(long, value_name = "FACTOR")]
    pub damping: Option<f32>,

    /// Peak height of the initial bump
    #[arg(long, value_name = "HEIGHT")]
    pub amplitude: Option<f32>,

    /// Radius of the initial bump (cells)
    #[arg(long, value_name = "CELLS")]
    pub radius: Option<f32>,

    /// Vertical scale applied to field heights when drawn
    #[arg(long, value_name = "SCALE")]
    pub height_scale: Option<f32>,

    /// Side of the square window (pixels)
    #[arg(long, value_name = "PIXELS", value_parser = clap::value_parser!(u32).range(1..))]
    pub window_size: Option<u32>,

    /// Log field statistics every N frames
    #[arg(long, value_name = "FRAMES", value_parser = clap::value_parser!(u64).range(1..))]
    pub stats_every: Option<u64>,
}

impl Args {
    /// Check everything the solver is seeded with before any window opens
    pub fn validate(&self) -> Result<()> {
        self.simulation_parameters().validate()?;
        self.initial_bump().validate()
    }

    pub fn simulation_parameters(&self) -> SimulationParameters {
        let defaults = SimulationParameters::default();
        SimulationParameters {
            grid_size: self.grid_size.unwrap_or(defaults.grid_size),
            dt: self.dt.unwrap_or(defaults.dt),
            dx: self.dx.unwrap_or(defaults.dx),
            wave_speed: self.wave_speed.unwrap_or(defaults.wave_speed),
            damping: self.damping.unwrap_or(defaults.damping),
        }
    }

    /// Bump centred on the grid
    pub fn initial_bump(&self) -> InitialBump {
        let defaults = InitialBump::default();
        InitialBump {
            amplitude: self.amplitude.unwrap_or(defaults.amplitude),
            radius: self.radius.unwrap_or(defaults.radius),
            center: None,
        }
    }

    pub fn render_config(&self) -> RenderConfig {
        let mut config = RenderConfig::default();
        if let Some(size) = self.window_size {
            config.window_width = size;
            config.window_height = size;
        }
        if let Some(scale) = self.height_scale {
            config.height_scale = scale;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WaveError;

    #[test]
    fn test_no_flags_gives_defaults() {
        let args = Args::try_parse_from(["wavetank"]).unwrap();
        assert_eq!(args.simulation_parameters(), SimulationParameters::default());
        assert_eq!(args.render_config(), RenderConfig::default());
        assert_eq!(args.initial_bump(), InitialBump::default());
        assert_eq!(args.stats_every, None);
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = Args::try_parse_from([
            "wavetank",
            "--grid-size",
            "128",
            "--wave-speed",
            "0.5",
            "--damping",
            "0.99",
            "--radius",
            "20",
            "--window-size",
            "600",
            "--stats-every",
            "30",
        ])
        .unwrap();

        let sim = args.simulation_parameters();
        assert_eq!(sim.grid_size, 128);
        assert_eq!(sim.wave_speed, 0.5);
        assert_eq!(sim.damping, 0.99);
        assert_eq!(sim.dt, SimulationParameters::default().dt);

        assert_eq!(args.initial_bump().radius, 20.0);
        let render = args.render_config();
        assert_eq!((render.window_width, render.window_height), (600, 600));
        assert_eq!(args.stats_every, Some(30));
    }

    #[test]
    fn test_zero_stats_interval_rejected() {
        assert!(Args::try_parse_from(["wavetank", "--stats-every", "0"]).is_err());
    }

    #[test]
    fn test_degenerate_sizes_rejected_at_parse() {
        assert!(Args::try_parse_from(["wavetank", "--window-size", "0"]).is_err());
        assert!(Args::try_parse_from(["wavetank", "--grid-size", "2"]).is_err());
        assert!(Args::try_parse_from(["wavetank", "--grid-size", "3"]).is_ok());
    }

    #[test]
    fn test_zero_radius_fails_validation() {
        let args = Args::try_parse_from(["wavetank", "--radius", "0"]).unwrap();
        assert!(matches!(args.validate(), Err(WaveError::Config(_))));

        let args = Args::try_parse_from(["wavetank"]).unwrap();
        assert!(args.validate().is_ok());
    }
}
