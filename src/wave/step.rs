//! GPU simulation pass: renders the next field state into the non-current texture.

use crate::error::Result;
use crate::gpu::{
    compile_program, FieldBuffers, GpuContext, MeshBuffers, Program, ProgramDescriptor,
    QuadVertex, UniformKind, UniformLayout, FIELD_FORMAT,
};
use crate::params::SimulationParameters;

use super::parity::Slot;

const STEP_VERTEX_SHADER: &str = include_str!("../shaders/step.vert.wgsl");
const STEP_FRAGMENT_SHADER: &str = include_str!("../shaders/step.frag.wgsl");

/// Uniform block of the step program, in WGSL declaration order
pub fn step_uniform_layout() -> UniformLayout {
    UniformLayout::new(&[
        ("coefficient", UniformKind::F32),
        ("damping", UniformKind::F32),
        ("grid_size", UniformKind::U32),
    ])
}

/// Compiled step program plus one bind group per parity
pub struct WaveStep {
    program: Program,
    quad: MeshBuffers,
    // Indexed by the slot being read
    bind_groups: [wgpu::BindGroup; 2],
    grid_size: u32,
}

impl WaveStep {
    pub fn new(
        ctx: &GpuContext,
        fields: &FieldBuffers,
        params: &SimulationParameters,
    ) -> Result<Self> {
        let bind_group_layout =
            ctx.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("Wave Step Bind Group Layout"),
                    entries: &[
                        wgpu::BindGroupLayoutEntry {
                            binding: 0,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Buffer {
                                ty: wgpu::BufferBindingType::Uniform,
                                has_dynamic_offset: false,
                                min_binding_size: None,
                            },
                            count: None,
                        },
                        wgpu::BindGroupLayoutEntry {
                            binding: 1,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Texture {
                                sample_type: wgpu::TextureSampleType::Float { filterable: false },
                                view_dimension: wgpu::TextureViewDimension::D2,
                                multisampled: false,
                            },
                            count: None,
                        },
                    ],
                });

        let mut program = compile_program(
            ctx,
            ProgramDescriptor {
                label: "Wave Step",
                vertex_source: STEP_VERTEX_SHADER,
                fragment_source: STEP_FRAGMENT_SHADER,
                vertex_buffers: &[QuadVertex::layout()],
                bind_group_layouts: &[&bind_group_layout],
                uniforms: step_uniform_layout(),
                color_format: FIELD_FORMAT,
                depth_format: None,
            },
        )?;

        program.set_f32("coefficient", params.stencil_coefficient());
        program.set_f32("damping", params.damping);
        program.set_u32("grid_size", params.grid_size);
        program.flush_uniforms(&ctx.queue);

        let bind_group_for = |slot: Slot| {
            ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&format!("Wave Step Bind Group (read {:?})", slot)),
                layout: &bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: program.uniform_buffer().as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&fields.get(slot).view),
                    },
                ],
            })
        };
        let bind_groups = [bind_group_for(Slot::A), bind_group_for(Slot::B)];

        log::info!(
            "Wave step ready: coefficient {:.6}, damping {}",
            params.stencil_coefficient(),
            params.damping
        );

        Ok(Self {
            program,
            quad: MeshBuffers::fullscreen_quad(&ctx.device),
            bind_groups,
            grid_size: params.grid_size,
        })
    }

    /// Record one step reading the current texture and writing the other one.
    /// The caller must `advance()` the fields once this is encoded.
    pub fn encode(&self, encoder: &mut wgpu::CommandEncoder, fields: &FieldBuffers) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Wave Step Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &fields.previous().view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        let n = self.grid_size as f32;
        pass.set_viewport(0.0, 0.0, n, n, 0.0, 1.0);
        pass.set_pipeline(self.program.pipeline());
        pass.set_bind_group(0, &self.bind_groups[fields.current_slot().index()], &[]);
        self.quad.draw(&mut pass);
    }

    /// Submit `steps` steps on their own, advancing parity after each
    pub fn run(&self, ctx: &GpuContext, fields: &mut FieldBuffers, steps: usize) {
        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Wave Step Encoder"),
            });
        for _ in 0..steps {
            self.encode(&mut encoder, fields);
            fields.advance();
        }
        ctx.queue.submit(std::iter::once(encoder.finish()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::InitialBump;
    use crate::wave::{gaussian_bump, CpuWave};

    #[test]
    fn test_step_layout_fits_sixteen_bytes() {
        let layout = step_uniform_layout();
        assert_eq!(layout.offset_of("grid_size"), Some((8, UniformKind::U32)));
        assert_eq!(layout.size(), 16);
    }

    #[test]
    #[ignore = "needs a GPU adapter"]
    fn test_gpu_step_matches_cpu_reference() {
        let ctx = pollster::block_on(GpuContext::headless()).expect("GPU adapter");

        let params = SimulationParameters::default();
        let initial = gaussian_bump(params.grid_size, &InitialBump::default());

        let mut fields = FieldBuffers::initialize(&ctx, params.grid_size, &initial).unwrap();
        let step = WaveStep::new(&ctx, &fields, &params).unwrap();
        let mut cpu = CpuWave::new(params, &initial);

        for _ in 0..3 {
            step.run(&ctx, &mut fields, 20);
            cpu.run(20);

            let gpu = fields.read_current_texels(&ctx).unwrap();
            for (i, (g, c)) in gpu.iter().zip(cpu.texels()).enumerate() {
                assert!(
                    (g[0] - c[0]).abs() < 1e-3 && (g[1] - c[1]).abs() < 1e-3,
                    "texel {} differs: gpu {:?} cpu {:?}",
                    i,
                    g,
                    c
                );
            }
        }
    }

    #[test]
    #[ignore = "needs a GPU adapter"]
    fn test_one_step_writes_the_other_slot() {
        let ctx = pollster::block_on(GpuContext::headless()).expect("GPU adapter");

        let params = SimulationParameters {
            grid_size: 16,
            ..Default::default()
        };
        let initial = vec![1.0f32; 256];
        let mut fields = FieldBuffers::initialize(&ctx, 16, &initial).unwrap();
        let step = WaveStep::new(&ctx, &fields, &params).unwrap();

        step.run(&ctx, &mut fields, 1);
        assert_eq!(fields.current_slot(), Slot::B);

        // A flat field at rest only feels damping
        let heights = fields.read_current(&ctx).unwrap();
        assert!(heights.iter().all(|&h| (h - params.damping).abs() < 1e-6));
    }
}
