//! Error taxonomy for startup and frame-time failures.

use std::fmt;

use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, WaveError>;

/// Stage at which a shader program failed to build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    /// Pipeline creation (interface matching between the two stages and the layout)
    Link,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
            ShaderStage::Link => "link",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while bringing up or running the wave tank.
///
/// Everything except `Readback` and `SurfaceLost` is fatal at startup: the
/// frame loop is never entered without a device, both field textures and all
/// four shader stages. `SurfaceLost` is reported once the loop has shut down.
#[derive(Error, Debug)]
pub enum WaveError {
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter found")]
    NoAdapter,

    #[error("adapter cannot render to {0:?} textures")]
    UnsupportedFormat(wgpu::TextureFormat),

    #[error("failed to request GPU device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),

    #[error("{stage} shader failed:\n{diagnostic}")]
    Compile {
        stage: ShaderStage,
        diagnostic: String,
    },

    #[error("failed to allocate {resource}: {diagnostic}")]
    Allocation {
        resource: &'static str,
        diagnostic: String,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("rendering stopped after {frames} frames: surface lost")]
    SurfaceLost { frames: u64 },

    #[error("field readback failed: {0}")]
    Readback(#[from] wgpu::BufferAsyncError),
}
