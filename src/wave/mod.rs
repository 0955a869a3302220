//! Wave field state, its update rule and the initial condition.

mod cpu;
mod initial;
mod parity;
mod step;

pub use cpu::{field_energy, max_abs, step_texel, sum_of_squares, CpuWave, FieldStats, Texel};
pub use initial::gaussian_bump;
pub use parity::{PingPong, Slot};
pub use step::{step_uniform_layout, WaveStep};
