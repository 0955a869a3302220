//! Dual-texture wave state: two render-target textures in strict alternation.

use super::GpuContext;
use crate::error::{Result, WaveError};
use crate::wave::{PingPong, Slot};

/// Texel format: `r = h(t)`, `g = h(t-1)`
pub const FIELD_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rg32Float;

const BYTES_PER_TEXEL: u32 = 8;

/// One field texture and its full view
pub struct FieldTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl FieldTexture {
    fn new(device: &wgpu::Device, label: &str, grid_size: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: field_extent(grid_size),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: FIELD_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }
}

fn field_extent(grid_size: u32) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: grid_size,
        height: grid_size,
        depth_or_array_layers: 1,
    }
}

/// Owner of both field textures. Only the simulation step writes them, and
/// only as a render attachment; everyone else binds them read-only.
pub struct FieldBuffers {
    fields: PingPong<FieldTexture>,
    grid_size: u32,
}

impl FieldBuffers {
    /// Allocate both textures and seed slot A at rest with `initial`
    pub fn initialize(ctx: &GpuContext, grid_size: u32, initial: &[f32]) -> Result<Self> {
        if initial.len() != (grid_size as usize) * (grid_size as usize) {
            return Err(WaveError::Config(format!(
                "expected {} initial samples for a {}x{} grid, got {}",
                grid_size * grid_size,
                grid_size,
                grid_size,
                initial.len()
            )));
        }

        let (textures, error) = ctx.capture(|| {
            (
                FieldTexture::new(&ctx.device, "Wave Field A", grid_size),
                FieldTexture::new(&ctx.device, "Wave Field B", grid_size),
            )
        });
        if let Some(error) = error {
            return Err(WaveError::Allocation {
                resource: "wave field textures",
                diagnostic: error.to_string(),
            });
        }

        let buffers = Self {
            fields: PingPong::new(textures.0, textures.1),
            grid_size,
        };
        buffers.reset(&ctx.queue, initial);

        log::info!("Allocated {}x{} wave field ({:?})", grid_size, grid_size, FIELD_FORMAT);
        Ok(buffers)
    }

    pub fn current_slot(&self) -> Slot {
        self.fields.current_slot()
    }

    /// Most recently completed state
    pub fn current(&self) -> &FieldTexture {
        self.fields.current()
    }

    /// Older state; the next step's write target
    pub fn previous(&self) -> &FieldTexture {
        self.fields.previous()
    }

    pub fn get(&self, slot: Slot) -> &FieldTexture {
        self.fields.get(slot)
    }

    /// Flip roles after a step has been encoded
    pub fn advance(&mut self) {
        self.fields.advance();
    }

    /// Re-seed the current texture at rest and zero the other one
    pub fn reset(&self, queue: &wgpu::Queue, samples: &[f32]) {
        let seeded: Vec<[f32; 2]> = samples.iter().map(|&h| [h, h]).collect();
        let zeros = vec![[0.0f32; 2]; samples.len()];

        self.upload(queue, self.current(), &seeded);
        self.upload(queue, self.previous(), &zeros);
    }

    fn upload(&self, queue: &wgpu::Queue, target: &FieldTexture, texels: &[[f32; 2]]) {
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &target.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(texels),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(self.grid_size * BYTES_PER_TEXEL),
                rows_per_image: Some(self.grid_size),
            },
            field_extent(self.grid_size),
        );
    }

    /// Copy `h(t)` of the current state back to the host (row-major)
    pub fn read_current(&self, ctx: &GpuContext) -> Result<Vec<f32>> {
        let texels = self.read_current_texels(ctx)?;
        Ok(texels.iter().map(|texel| texel[0]).collect())
    }

    /// Copy both channels of the current state back to the host
    pub fn read_current_texels(&self, ctx: &GpuContext) -> Result<Vec<[f32; 2]>> {
        let n = self.grid_size;
        let unpadded_bytes_per_row = n * BYTES_PER_TEXEL;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded_bytes_per_row = unpadded_bytes_per_row.div_ceil(align) * align;

        let buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Wave Field Readback"),
            size: (padded_bytes_per_row * n) as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Wave Field Readback Encoder"),
            });

        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &self.current().texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &buffer,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(n),
                },
            },
            field_extent(n),
        );

        ctx.queue.submit(std::iter::once(encoder.finish()));

        let slice = buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        ctx.device.poll(wgpu::Maintain::Wait);

        match rx.recv() {
            Ok(result) => result?,
            Err(_) => {
                return Err(WaveError::Allocation {
                    resource: "field readback",
                    diagnostic: "map callback never ran".to_string(),
                })
            }
        }

        let texels = {
            let data = slice.get_mapped_range();
            let mut texels = Vec::with_capacity((n * n) as usize);

            // Drop row padding
            for row in data.chunks_exact(padded_bytes_per_row as usize) {
                let row: &[[f32; 2]] =
                    bytemuck::cast_slice(&row[..unpadded_bytes_per_row as usize]);
                texels.extend_from_slice(row);
            }
            texels
        };
        buffer.unmap();

        Ok(texels)
    }
}
