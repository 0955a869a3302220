//! Parameter definitions with units and documented semantics.
//!
//! Every tunable constant of the tank lives here with:
//! - Physical units (world units, seconds, radians)
//! - Documented ranges and meanings
//! - Validation where a bad value would break the solver

mod camera;
mod render;
mod simulation;

// Re-export all types
pub use camera::OrbitControls;
pub use render::RenderConfig;
pub use simulation::{InitialBump, SimulationParameters, MAX_STABLE_COURANT};
