// src/programs.rs
//! Named composition programs.
//!
//! Every bake pass is a fullscreen-triangle draw through one of a fixed set
//! of programs, all sharing a single bind layout: one uniform block, two
//! texture inputs, one sampler. Missing inputs are bound to a neutral 1×1
//! white texture. Pipelines are created lazily and cached per
//! (program, write mask, blend) combination.

use std::collections::HashMap;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use parking_lot::Mutex;
use wgpu::util::DeviceExt;

use crate::buffer::{BakeBuffer, BAKE_FORMAT};
use crate::error::{ConvertError, Result};
use crate::gpu::GpuContext;

pub const PROGRAM_BLIT: &str = "Blit";
pub const PROGRAM_MULTIPLY: &str = "Multiply";
pub const PROGRAM_SWIZZLE: &str = "Swizzle";
pub const PROGRAM_MAIN_COLOR: &str = "MainColor";
pub const PROGRAM_EMISSION: &str = "Emission";
pub const PROGRAM_MATCAP: &str = "Matcap";
pub const PROGRAM_RIM: &str = "Rim";
pub const PROGRAM_NORMAL: &str = "Normal";

const PROGRAM_SOURCES: &[(&str, &str)] = &[
    (PROGRAM_BLIT, include_str!("shaders/blit.wgsl")),
    (PROGRAM_MULTIPLY, include_str!("shaders/multiply.wgsl")),
    (PROGRAM_SWIZZLE, include_str!("shaders/swizzle.wgsl")),
    (PROGRAM_MAIN_COLOR, include_str!("shaders/main_color.wgsl")),
    (PROGRAM_EMISSION, include_str!("shaders/emission.wgsl")),
    (PROGRAM_MATCAP, include_str!("shaders/matcap.wgsl")),
    (PROGRAM_RIM, include_str!("shaders/rim.wgsl")),
    (PROGRAM_NORMAL, include_str!("shaders/normal.wgsl")),
];

/// Uniform block shared by every composition program. Field order matches
/// the WGSL `CompositeParams` struct exactly.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CompositeParams {
    /// Tint multiplied onto input A (HDR tints pre-tone-mapped on the CPU).
    pub tint_a: [f32; 4],
    /// Tint multiplied onto input B.
    pub tint_b: [f32; 4],
    /// Program-specific scalars (brightness floor, blend weight, strength…).
    pub factors: [f32; 4],
    /// Tiling transform for input A: scale.xy, offset.xy.
    pub transform_a: [f32; 4],
    /// Per-input channel selection; x selects the source channel for
    /// Swizzle (0..3 = r/g/b/a, 4 = Rec.709 luma).
    pub channels: [u32; 4],
}

impl Default for CompositeParams {
    fn default() -> Self {
        Self {
            tint_a: [1.0, 1.0, 1.0, 1.0],
            tint_b: [1.0, 1.0, 1.0, 1.0],
            factors: [0.0, 0.0, 0.0, 0.0],
            transform_a: [1.0, 1.0, 0.0, 0.0],
            channels: [0, 0, 0, 0],
        }
    }
}

/// How a pass combines with what is already in the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendKind {
    Replace,
    Additive,
    Multiply,
}

impl BlendKind {
    fn state(&self) -> Option<wgpu::BlendState> {
        match self {
            BlendKind::Replace => None,
            BlendKind::Additive => Some(wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::Zero,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
            }),
            BlendKind::Multiply => Some(wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::Dst,
                    dst_factor: wgpu::BlendFactor::Zero,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::Zero,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
            }),
        }
    }

    fn tag(&self) -> u8 {
        match self {
            BlendKind::Replace => 0,
            BlendKind::Additive => 1,
            BlendKind::Multiply => 2,
        }
    }
}

/// One composition pass: a program plus its inputs and raster state.
pub struct CompositePass<'a> {
    pub program: &'a str,
    pub tex_a: Option<&'a BakeBuffer>,
    pub tex_b: Option<&'a BakeBuffer>,
    pub params: CompositeParams,
    pub write_mask: wgpu::ColorWrites,
    pub blend: BlendKind,
    /// Clear the target before drawing; false loads the existing contents.
    pub clear: bool,
}

impl<'a> CompositePass<'a> {
    pub fn new(program: &'a str) -> Self {
        Self {
            program,
            tex_a: None,
            tex_b: None,
            params: CompositeParams::default(),
            write_mask: wgpu::ColorWrites::ALL,
            blend: BlendKind::Replace,
            clear: true,
        }
    }
}

pub struct ProgramLibrary {
    bind_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    modules: HashMap<&'static str, wgpu::ShaderModule>,
    pipelines: Mutex<HashMap<(&'static str, u32, u8), Arc<wgpu::RenderPipeline>>>,
    sampler: wgpu::Sampler,
    white: BakeBuffer,
}

impl ProgramLibrary {
    pub fn new(gpu: &GpuContext) -> Self {
        let bind_layout = gpu
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("composite_bind_layout"),
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
                            multisampled: false,
                            view_dimension: wgpu::TextureViewDimension::D2,
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            multisampled: false,
                            view_dimension: wgpu::TextureViewDimension::D2,
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 3,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let pipeline_layout = gpu
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("composite_pipeline_layout"),
                bind_group_layouts: &[&bind_layout],
                push_constant_ranges: &[],
            });

        let mut modules = HashMap::new();
        for (name, source) in PROGRAM_SOURCES {
            let module = gpu
                .device
                .create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some(name),
                    source: wgpu::ShaderSource::Wgsl((*source).into()),
                });
            modules.insert(*name, module);
        }

        // Repeat addressing so tiling transforms sample correctly; identity
        // transforms stay inside [0,1] and are unaffected.
        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("composite_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let white = BakeBuffer::solid(gpu, [255, 255, 255, 255], "composite_white_1x1");

        Self {
            bind_layout,
            pipeline_layout,
            modules,
            pipelines: Mutex::new(HashMap::new()),
            sampler,
            white,
        }
    }

    fn pipeline(
        &self,
        gpu: &GpuContext,
        program: &str,
        write_mask: wgpu::ColorWrites,
        blend: BlendKind,
    ) -> Result<Arc<wgpu::RenderPipeline>> {
        let (name, module) = self
            .modules
            .get_key_value(program)
            .map(|(name, module)| (*name, module))
            .ok_or_else(|| ConvertError::ProgramMissing(program.to_string()))?;

        let key = (name, write_mask.bits(), blend.tag());
        let mut pipelines = self.pipelines.lock();
        if let Some(existing) = pipelines.get(&key) {
            return Ok(existing.clone());
        }

        let pipeline = gpu
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(name),
                layout: Some(&self.pipeline_layout),
                vertex: wgpu::VertexState {
                    module,
                    entry_point: "vs_main",
                    buffers: &[],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module,
                    entry_point: "fs_main",
                    targets: &[Some(wgpu::ColorTargetState {
                        format: BAKE_FORMAT,
                        blend: blend.state(),
                        write_mask,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState::default(),
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });

        let pipeline = Arc::new(pipeline);
        pipelines.insert(key, pipeline.clone());
        Ok(pipeline)
    }

    /// Run one composition pass onto `target`.
    pub fn run(&self, gpu: &GpuContext, target: &BakeBuffer, pass: &CompositePass) -> Result<()> {
        let pipeline = self.pipeline(gpu, pass.program, pass.write_mask, pass.blend)?;

        let uniform = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("composite_params"),
                contents: bytemuck::bytes_of(&pass.params),
                usage: wgpu::BufferUsages::UNIFORM,
            });

        let view_a = pass.tex_a.map(|b| b.view()).unwrap_or(self.white.view());
        let view_b = pass.tex_b.map(|b| b.view()).unwrap_or(self.white.view());

        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("composite_bind_group"),
            layout: &self.bind_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(view_a),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(view_b),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("composite_encoder"),
            });

        {
            let load = if pass.clear {
                wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT)
            } else {
                wgpu::LoadOp::Load
            };

            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(pass.program),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target.view(),
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            rpass.set_pipeline(&pipeline);
            rpass.set_bind_group(0, &bind_group, &[]);
            rpass.draw(0..3, 0..1);
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }
}
