//! Vertex + fragment shader pair linked into a render pipeline.

use glam::{Mat4, Vec3};

use super::uniforms::{UniformBlock, UniformLayout};
use super::GpuContext;
use crate::error::{Result, ShaderStage, WaveError};

/// Everything needed to build one program
pub struct ProgramDescriptor<'a> {
    pub label: &'static str,
    pub vertex_source: &'a str,
    pub fragment_source: &'a str,
    pub vertex_buffers: &'a [wgpu::VertexBufferLayout<'a>],
    pub bind_group_layouts: &'a [&'a wgpu::BindGroupLayout],
    /// Layout of the program's uniform block (bound at group 0, binding 0)
    pub uniforms: UniformLayout,
    pub color_format: wgpu::TextureFormat,
    pub depth_format: Option<wgpu::TextureFormat>,
}

/// Linked program with its named uniform block
pub struct Program {
    pipeline: wgpu::RenderPipeline,
    uniforms: UniformBlock,
}

impl Program {
    pub fn pipeline(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }

    pub fn uniform_buffer(&self) -> &wgpu::Buffer {
        self.uniforms.buffer()
    }

    pub fn set_f32(&mut self, name: &str, value: f32) {
        self.uniforms.set_f32(name, value);
    }

    pub fn set_u32(&mut self, name: &str, value: u32) {
        self.uniforms.set_u32(name, value);
    }

    pub fn set_vec3(&mut self, name: &str, value: Vec3) {
        self.uniforms.set_vec3(name, value);
    }

    pub fn set_mat4(&mut self, name: &str, value: &Mat4) {
        self.uniforms.set_mat4(name, value);
    }

    /// Upload uniform changes before the pass that uses them is submitted
    pub fn flush_uniforms(&mut self, queue: &wgpu::Queue) {
        self.uniforms.flush(queue);
    }
}

fn compile_stage(
    ctx: &GpuContext,
    label: &str,
    stage: ShaderStage,
    source: &str,
) -> Result<wgpu::ShaderModule> {
    let (module, error) = ctx.capture(|| {
        ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{} {} Shader", label, stage)),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        })
    });

    match error {
        Some(error) => Err(WaveError::Compile {
            stage,
            diagnostic: error.to_string(),
        }),
        None => Ok(module),
    }
}

/// Compile both stages and link them; failures carry the stage and diagnostic
pub fn compile_program(ctx: &GpuContext, desc: ProgramDescriptor<'_>) -> Result<Program> {
    let vertex = compile_stage(ctx, desc.label, ShaderStage::Vertex, desc.vertex_source)?;
    let fragment = compile_stage(ctx, desc.label, ShaderStage::Fragment, desc.fragment_source)?;

    let (pipeline, error) = ctx.capture(|| {
        let layout = ctx
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(&format!("{} Pipeline Layout", desc.label)),
                bind_group_layouts: desc.bind_group_layouts,
                push_constant_ranges: &[],
            });

        ctx.device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(&format!("{} Pipeline", desc.label)),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &vertex,
                    entry_point: Some("vs_main"),
                    buffers: desc.vertex_buffers,
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &fragment,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: desc.color_format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    // The surface is seen from above and below
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: desc.depth_format.map(|format| wgpu::DepthStencilState {
                    format,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
    });

    if let Some(error) = error {
        return Err(WaveError::Compile {
            stage: ShaderStage::Link,
            diagnostic: error.to_string(),
        });
    }

    log::debug!("Linked program '{}'", desc.label);

    Ok(Program {
        pipeline,
        uniforms: UniformBlock::new(&ctx.device, desc.label, desc.uniforms),
    })
}
