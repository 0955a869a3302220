//! Wave simulation constants and the initial disturbance.

use crate::error::{Result, WaveError};

/// Largest stable Courant number for the explicit five-point leapfrog scheme in 2D
pub const MAX_STABLE_COURANT: f32 = std::f32::consts::FRAC_1_SQRT_2;

/// Wave simulation parameters (constant for a run)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationParameters {
    /// Grid resolution (texels per side)
    pub grid_size: u32,

    /// Timestep (seconds per simulation step)
    pub dt: f32,

    /// Grid spacing (world units per texel), folded into the stencil coefficient
    pub dx: f32,

    /// Wave propagation speed (world units per second)
    pub wave_speed: f32,

    /// Multiplicative decay applied to every new field value (0 < damping ≤ 1)
    pub damping: f32,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            grid_size: 50,
            dt: 0.016,
            dx: 0.1,
            wave_speed: 0.3,
            damping: 0.999,
        }
    }
}

impl SimulationParameters {
    /// Courant number `c * dt / dx`
    pub fn courant_number(&self) -> f32 {
        self.wave_speed * self.dt / self.dx
    }

    /// Weight of the Laplacian in the update rule, `(c * dt / dx)^2`
    pub fn stencil_coefficient(&self) -> f32 {
        let courant = self.courant_number();
        courant * courant
    }

    /// Number of texels in the field
    pub fn texel_count(&self) -> usize {
        (self.grid_size as usize) * (self.grid_size as usize)
    }

    /// Reject constants the explicit scheme cannot integrate
    pub fn validate(&self) -> Result<()> {
        if self.grid_size < 3 {
            return Err(WaveError::Config(format!(
                "grid size must be at least 3, got {}",
                self.grid_size
            )));
        }
        if !(self.dt > 0.0 && self.dx > 0.0 && self.wave_speed >= 0.0) {
            return Err(WaveError::Config(format!(
                "dt and dx must be positive and wave speed non-negative (dt={}, dx={}, c={})",
                self.dt, self.dx, self.wave_speed
            )));
        }
        if !(self.damping > 0.0 && self.damping <= 1.0) {
            return Err(WaveError::Config(format!(
                "damping must lie in (0, 1], got {}",
                self.damping
            )));
        }
        let courant = self.courant_number();
        if courant > MAX_STABLE_COURANT {
            return Err(WaveError::Config(format!(
                "Courant number c*dt/dx = {:.4} exceeds the stability limit {:.4}",
                courant, MAX_STABLE_COURANT
            )));
        }
        Ok(())
    }
}

/// Gaussian bump used as the initial disturbance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InitialBump {
    /// Peak height at the centre (world units)
    pub amplitude: f32,

    /// Support radius in texels; cells farther than this start at zero
    pub radius: f32,

    /// Centre in texel coordinates; `None` means the grid centre
    pub center: Option<[f32; 2]>,
}

impl Default for InitialBump {
    fn default() -> Self {
        Self {
            amplitude: 2.0,
            radius: 12.5,
            center: None,
        }
    }
}

impl InitialBump {
    /// Resolve the centre for a given grid
    pub fn center_for(&self, grid_size: u32) -> [f32; 2] {
        self.center.unwrap_or([grid_size as f32 / 2.0; 2])
    }

    /// Reject bumps that would seed a non-finite field
    pub fn validate(&self) -> Result<()> {
        if !self.amplitude.is_finite() {
            return Err(WaveError::Config(format!(
                "bump amplitude must be finite, got {}",
                self.amplitude
            )));
        }
        if !(self.radius > 0.0 && self.radius.is_finite()) {
            return Err(WaveError::Config(format!(
                "bump radius must be positive and finite, got {}",
                self.radius
            )));
        }
        if let Some([x, y]) = self.center {
            if !(x.is_finite() && y.is_finite()) {
                return Err(WaveError::Config(format!(
                    "bump centre must be finite, got ({}, {})",
                    x, y
                )));
            }
        }
        Ok(())
    }
}
