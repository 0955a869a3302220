//! Rendering system: surface, display program and the per-frame GPU work.

use std::sync::Arc;

use winit::window::Window;

use crate::camera::CameraState;
use crate::error::{Result, WaveError};
use crate::frame_loop::{FramePipeline, FrameStatus};
use crate::gpu::{
    compile_program, FieldBuffers, GpuContext, GridMesh, GridVertex, MeshBuffers, Program,
    ProgramDescriptor, UniformKind, UniformLayout,
};
use crate::params::{InitialBump, RenderConfig, SimulationParameters};
use crate::wave::{gaussian_bump, FieldStats, Slot, WaveStep};

const DISPLAY_VERTEX_SHADER: &str = include_str!("shaders/display.vert.wgsl");
const DISPLAY_FRAGMENT_SHADER: &str = include_str!("shaders/display.frag.wgsl");

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Uniform block of the display program, in WGSL declaration order
pub fn display_uniform_layout() -> UniformLayout {
    UniformLayout::new(&[
        ("view", UniformKind::Mat4),
        ("projection", UniformKind::Mat4),
        ("low_color", UniformKind::Vec3),
        ("height_scale", UniformKind::F32),
        ("high_color", UniformKind::Vec3),
        ("grid_size", UniformKind::U32),
        ("color_range", UniformKind::F32),
    ])
}

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

/// Owns the device, both field textures and every pipeline
pub struct RenderSystem {
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    depth_view: wgpu::TextureView,
    display: Program,
    grid: MeshBuffers,
    // Indexed by the slot being displayed
    heightmap_bind_groups: [wgpu::BindGroup; 2],
    step: WaveStep,
    fields: FieldBuffers,
    simulation: SimulationParameters,
    initial: Vec<f32>,
    background: wgpu::Color,
    // Simulation work waiting to share the frame's submission
    pending: Option<wgpu::CommandEncoder>,
    gpu: GpuContext,
}

impl RenderSystem {
    /// Bring up the device, allocate the field and compile both programs
    pub async fn new(
        window: Arc<Window>,
        simulation: SimulationParameters,
        bump: &InitialBump,
        render_config: &RenderConfig,
    ) -> Result<Self> {
        simulation.validate()?;
        bump.validate()?;
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        // Window must have 'static lifetime via Arc
        let surface = instance.create_surface(window)?;
        let gpu = GpuContext::new(&instance, Some(&surface)).await?;

        let surface_caps = surface.get_capabilities(&gpu.adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or(WaveError::UnsupportedFormat(wgpu::TextureFormat::Bgra8UnormSrgb))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&gpu.device, &config);
        log::info!(
            "Surface configured: {}x{} {:?}",
            config.width,
            config.height,
            config.format
        );

        let initial = gaussian_bump(simulation.grid_size, bump);
        let fields = FieldBuffers::initialize(&gpu, simulation.grid_size, &initial)?;
        let step = WaveStep::new(&gpu, &fields, &simulation)?;

        let heightmap_layout =
            gpu.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("Display Bind Group Layout"),
                    entries: &[
                        wgpu::BindGroupLayoutEntry {
                            binding: 0,
                            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Buffer {
                                ty: wgpu::BufferBindingType::Uniform,
                                has_dynamic_offset: false,
                                min_binding_size: None,
                            },
                            count: None,
                        },
                        wgpu::BindGroupLayoutEntry {
                            binding: 1,
                            visibility: wgpu::ShaderStages::VERTEX,
                            ty: wgpu::BindingType::Texture {
                                sample_type: wgpu::TextureSampleType::Float { filterable: false },
                                view_dimension: wgpu::TextureViewDimension::D2,
                                multisampled: false,
                            },
                            count: None,
                        },
                    ],
                });

        let mut display = compile_program(
            &gpu,
            ProgramDescriptor {
                label: "Display",
                vertex_source: DISPLAY_VERTEX_SHADER,
                fragment_source: DISPLAY_FRAGMENT_SHADER,
                vertex_buffers: &[GridVertex::layout()],
                bind_group_layouts: &[&heightmap_layout],
                uniforms: display_uniform_layout(),
                color_format: config.format,
                depth_format: Some(DEPTH_FORMAT),
            },
        )?;

        display.set_mat4(
            "projection",
            &CameraState::projection_matrix(render_config),
        );
        display.set_vec3("low_color", render_config.low_color.into());
        display.set_vec3("high_color", render_config.high_color.into());
        display.set_f32("height_scale", render_config.height_scale);
        display.set_f32("color_range", render_config.color_range);
        display.set_u32("grid_size", simulation.grid_size);

        let bind_group_for = |slot: Slot| {
            gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&format!("Display Bind Group (show {:?})", slot)),
                layout: &heightmap_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: display.uniform_buffer().as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&fields.get(slot).view),
                    },
                ],
            })
        };
        let heightmap_bind_groups = [bind_group_for(Slot::A), bind_group_for(Slot::B)];

        let mesh = GridMesh::new(simulation.grid_size, render_config.mesh_extent);
        let (grid, error) = gpu.capture(|| MeshBuffers::grid(&gpu.device, &mesh));
        if let Some(error) = error {
            return Err(WaveError::Allocation {
                resource: "grid mesh",
                diagnostic: error.to_string(),
            });
        }

        let depth_view = create_depth_view(&gpu.device, config.width, config.height);

        let [r, g, b] = render_config.background;

        Ok(Self {
            surface,
            config,
            depth_view,
            display,
            grid,
            heightmap_bind_groups,
            step,
            fields,
            simulation,
            initial,
            background: wgpu::Color { r, g, b, a: 1.0 },
            pending: None,
            gpu,
        })
    }

    fn reconfigure(&mut self) {
        self.surface.configure(&self.gpu.device, &self.config);
        self.depth_view =
            create_depth_view(&self.gpu.device, self.config.width, self.config.height);
    }

    fn frame_encoder(&mut self) -> wgpu::CommandEncoder {
        self.pending.take().unwrap_or_else(|| {
            self.gpu
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Frame Encoder"),
                })
        })
    }

    /// Submit simulation work even when no frame can be drawn, so the
    /// advanced parity always matches what the GPU has written
    fn submit_pending(&mut self) {
        if let Some(encoder) = self.pending.take() {
            self.gpu.queue.submit(std::iter::once(encoder.finish()));
        }
    }
}

impl FramePipeline for RenderSystem {
    fn update_camera(&mut self, camera: &CameraState) {
        self.display.set_mat4("view", &camera.view_matrix());
    }

    fn simulate(&mut self) {
        let mut encoder = self.frame_encoder();
        self.step.encode(&mut encoder, &self.fields);
        self.fields.advance();
        self.pending = Some(encoder);
    }

    fn render(&mut self) -> FrameStatus {
        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::OutOfMemory) => {
                self.submit_pending();
                return FrameStatus::Fatal;
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Surface texture acquisition timed out");
                self.submit_pending();
                return FrameStatus::Dropped;
            }
            Err(error) => {
                log::warn!("Surface error ({}), reconfiguring", error);
                self.submit_pending();
                self.reconfigure();
                return FrameStatus::Dropped;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.display.flush_uniforms(&self.gpu.queue);
        let mut encoder = self.frame_encoder();

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Display Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.background),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let shown = self.fields.current_slot().index();
            render_pass.set_pipeline(self.display.pipeline());
            render_pass.set_bind_group(0, &self.heightmap_bind_groups[shown], &[]);
            self.grid.draw(&mut render_pass);
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        FrameStatus::Presented
    }

    fn reset(&mut self) {
        self.fields.reset(&self.gpu.queue, &self.initial);
    }

    fn field_stats(&mut self) -> Result<FieldStats> {
        self.submit_pending();
        let texels = self.fields.read_current_texels(&self.gpu)?;
        Ok(FieldStats::from_texels(&texels, &self.simulation))
    }

    fn release(mut self) {
        self.submit_pending();
        self.gpu.device.poll(wgpu::Maintain::Wait);
        log::info!("Released GPU resources");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_layout_matches_wgsl_struct() {
        let layout = display_uniform_layout();
        assert_eq!(layout.offset_of("view"), Some((0, UniformKind::Mat4)));
        assert_eq!(layout.offset_of("height_scale"), Some((140, UniformKind::F32)));
        assert_eq!(layout.offset_of("color_range"), Some((160, UniformKind::F32)));
        assert_eq!(layout.size(), 176);
    }

    #[test]
    #[ignore = "needs a GPU adapter"]
    fn test_display_program_compiles() {
        let ctx = pollster::block_on(GpuContext::headless()).expect("GPU adapter");

        let layout = ctx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Test Display Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::VERTEX,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: false },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                ],
            });

        let result = compile_program(
            &ctx,
            ProgramDescriptor {
                label: "Display",
                vertex_source: DISPLAY_VERTEX_SHADER,
                fragment_source: DISPLAY_FRAGMENT_SHADER,
                vertex_buffers: &[GridVertex::layout()],
                bind_group_layouts: &[&layout],
                uniforms: display_uniform_layout(),
                color_format: wgpu::TextureFormat::Rgba8UnormSrgb,
                depth_format: Some(DEPTH_FORMAT),
            },
        );
        assert!(result.is_ok(), "display program failed: {:?}", result.err());
    }
}
