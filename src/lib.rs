//! Wavetank library - GPU 2D wave-equation tank

pub mod camera;
pub mod cli;
pub mod error;
pub mod frame_loop;
pub mod gpu;
pub mod input;
pub mod params;
pub mod rendering;
pub mod wave;
