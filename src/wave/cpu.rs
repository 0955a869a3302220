//! Host-side reference solver mirroring the GPU step texel for texel.

use super::parity::PingPong;
use crate::params::SimulationParameters;

/// Field texel: `[h(t), h(t-1)]`, the same layout as the GPU textures
pub type Texel = [f32; 2];

/// Clamp-to-edge read of the `h(t)` channel
fn height_at(field: &[Texel], n: usize, x: isize, y: isize) -> f32 {
    let max = n as isize - 1;
    let x = x.clamp(0, max) as usize;
    let y = y.clamp(0, max) as usize;
    field[y * n + x][0]
}

/// One texel of the update rule, identical to the fragment program
pub fn step_texel(
    field: &[Texel],
    n: usize,
    x: usize,
    y: usize,
    coefficient: f32,
    damping: f32,
) -> Texel {
    let (xi, yi) = (x as isize, y as isize);
    let [current, previous] = field[y * n + x];

    let up = height_at(field, n, xi, yi - 1);
    let down = height_at(field, n, xi, yi + 1);
    let left = height_at(field, n, xi - 1, yi);
    let right = height_at(field, n, xi + 1, yi);

    let laplacian = up + down + left + right - 4.0 * current;
    let mut next = 2.0 * current - previous + coefficient * laplacian;
    next *= damping;

    [next, current]
}

/// CPU twin of the double-buffered GPU field
pub struct CpuWave {
    params: SimulationParameters,
    fields: PingPong<Vec<Texel>>,
    steps: u64,
}

impl CpuWave {
    /// Seed the field at rest with `initial` (one sample per texel, row-major)
    pub fn new(params: SimulationParameters, initial: &[f32]) -> Self {
        let count = params.texel_count();
        assert_eq!(initial.len(), count, "initial samples must cover the grid");

        let seeded = initial.iter().map(|&h| [h, h]).collect();
        Self {
            params,
            fields: PingPong::new(seeded, vec![[0.0; 2]; count]),
            steps: 0,
        }
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Advance by one timestep: write into the non-current slot, then flip
    pub fn step(&mut self) {
        let n = self.params.grid_size as usize;
        let coefficient = self.params.stencil_coefficient();
        let damping = self.params.damping;

        {
            let (read, write) = self.fields.split_mut();
            for y in 0..n {
                for x in 0..n {
                    write[y * n + x] = step_texel(read, n, x, y, coefficient, damping);
                }
            }
        }

        self.fields.advance();
        self.steps += 1;
    }

    pub fn run(&mut self, steps: usize) {
        for _ in 0..steps {
            self.step();
        }
    }

    /// `h(t)` of the current state, row-major
    pub fn heights(&self) -> Vec<f32> {
        self.fields.current().iter().map(|texel| texel[0]).collect()
    }

    pub fn height(&self, x: usize, y: usize) -> f32 {
        let n = self.params.grid_size as usize;
        self.fields.current()[y * n + x][0]
    }

    pub fn max_abs(&self) -> f32 {
        max_abs(&self.heights())
    }

    /// Plain `Σ h(t)²`
    pub fn sum_of_squares(&self) -> f64 {
        sum_of_squares(&self.heights())
    }

    /// Discrete energy of the damped leapfrog scheme (decays by `damping` per step)
    pub fn energy(&self) -> f64 {
        field_energy(self.fields.current(), &self.params)
    }

    pub fn stats(&self) -> FieldStats {
        FieldStats::from_texels(self.fields.current(), &self.params)
    }

    /// Both channels of the current state, the layout the GPU reads back
    pub fn texels(&self) -> &[Texel] {
        self.fields.current()
    }
}

/// Largest magnitude; NaN anywhere in the field yields NaN
pub fn max_abs(heights: &[f32]) -> f32 {
    heights.iter().fold(0.0f32, |acc, h| {
        if acc.is_nan() || h.is_nan() {
            f32::NAN
        } else {
            acc.max(h.abs())
        }
    })
}

pub fn sum_of_squares(heights: &[f32]) -> f64 {
    heights.iter().map(|&h| (h as f64) * (h as f64)).sum()
}

/// `Σh_t² − d·Σh_t(2h_{t−1} + k·Lh_{t−1}) + d·Σh_{t−1}²`
///
/// Positive definite while the Courant number is within the stability limit.
/// `L` is the clamp-to-edge five-point Laplacian, which is symmetric.
pub fn field_energy(field: &[Texel], params: &SimulationParameters) -> f64 {
    let n = params.grid_size as usize;
    let d = params.damping as f64;
    let k = params.stencil_coefficient() as f64;

    let prev_at = |x: isize, y: isize| -> f64 {
        let max = n as isize - 1;
        field[(y.clamp(0, max) as usize) * n + x.clamp(0, max) as usize][1] as f64
    };

    let mut energy = 0.0f64;
    for y in 0..n {
        for x in 0..n {
            let (xi, yi) = (x as isize, y as isize);
            let current = field[y * n + x][0] as f64;
            let previous = field[y * n + x][1] as f64;
            let laplacian = prev_at(xi, yi - 1)
                + prev_at(xi, yi + 1)
                + prev_at(xi - 1, yi)
                + prev_at(xi + 1, yi)
                - 4.0 * previous;

            energy += current * current - d * current * (2.0 * previous + k * laplacian)
                + d * previous * previous;
        }
    }
    energy
}

/// Periodic diagnostics of a field snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldStats {
    pub max_abs: f32,
    pub sum_of_squares: f64,
    pub energy: f64,
}

impl FieldStats {
    pub fn from_texels(field: &[Texel], params: &SimulationParameters) -> Self {
        let heights: Vec<f32> = field.iter().map(|texel| texel[0]).collect();
        Self {
            max_abs: max_abs(&heights),
            sum_of_squares: sum_of_squares(&heights),
            energy: field_energy(field, params),
        }
    }
}
