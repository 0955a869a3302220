//! GPU device bring-up and the thin resource layer over wgpu.

mod field;
mod mesh;
mod program;
mod uniforms;

pub use field::{FieldBuffers, FieldTexture, FIELD_FORMAT};
pub use mesh::{GridMesh, GridVertex, MeshBuffers, QuadVertex};
pub use program::{compile_program, Program, ProgramDescriptor};
pub use uniforms::{UniformBlock, UniformKind, UniformLayout};

use crate::error::{Result, WaveError};

/// Adapter, device and queue shared by every pass
pub struct GpuContext {
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

async fn request_adapter(
    instance: &wgpu::Instance,
    surface: Option<&wgpu::Surface<'static>>,
    force_fallback_adapter: bool,
) -> Option<wgpu::Adapter> {
    instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: surface,
            force_fallback_adapter,
        })
        .await
}

impl GpuContext {
    /// Device without a presentation surface (tests, offline stepping).
    ///
    /// Falls back to a software adapter when no hardware one is available.
    pub async fn headless() -> Result<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        match request_adapter(&instance, None, false).await {
            Some(adapter) => Self::with_adapter(adapter).await,
            None => {
                log::warn!("No hardware adapter, trying the fallback adapter");
                let adapter = request_adapter(&instance, None, true)
                    .await
                    .ok_or(WaveError::NoAdapter)?;
                Self::with_adapter(adapter).await
            }
        }
    }

    /// Request an adapter (compatible with `surface` if given) and a device
    pub async fn new(
        instance: &wgpu::Instance,
        surface: Option<&wgpu::Surface<'static>>,
    ) -> Result<Self> {
        let adapter = request_adapter(instance, surface, false)
            .await
            .ok_or(WaveError::NoAdapter)?;
        Self::with_adapter(adapter).await
    }

    async fn with_adapter(adapter: wgpu::Adapter) -> Result<Self> {
        let features = adapter.get_texture_format_features(FIELD_FORMAT);
        let needed = wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING;
        if !features.allowed_usages.contains(needed) {
            return Err(WaveError::UnsupportedFormat(FIELD_FORMAT));
        }

        let info = adapter.get_info();
        log::info!("Using adapter: {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Wave Tank Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        // Frame-time validation errors are reported, not fatal
        device.on_uncaptured_error(Box::new(|error| {
            log::error!("GPU error: {}", error);
        }));

        Ok(Self {
            adapter,
            device,
            queue,
        })
    }

    /// Run `f` under validation + out-of-memory error scopes
    pub fn capture<T>(&self, f: impl FnOnce() -> T) -> (T, Option<wgpu::Error>) {
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = f();
        let validation = pollster::block_on(self.device.pop_error_scope());
        let out_of_memory = pollster::block_on(self.device.pop_error_scope());
        (value, validation.or(out_of_memory))
    }
}
