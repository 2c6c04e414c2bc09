//! Rain particle pipelines.
//!
//! The update pipeline advances the GPU-resident simulation: a fullscreen
//! pass over the `count x 1` ping-pong target writes new positions and
//! velocities, reading the previous frame's target (or initializing from
//! scratch when the reset flag is set). The draw pipeline renders one small
//! alpha-blended billboard triangle per particle, pulling positions straight
//! from the current particle texture by vertex index.

use bytemuck::{Pod, Zeroable};

use crate::render::buffer::FrameBuffer;
use crate::render::texture::ParticleTarget;
use crate::render::texture::rain_targets::PARTICLE_FORMAT;
use crate::render::texture::scene_targets::{
    COLOR_FORMAT, DEPTH_FORMAT, NORMAL_FORMAT, POSITION_FORMAT,
};

/// Uniforms for the update pass.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct RainUpdateParams {
    pub particle_count: u32,
    /// 1 = initialize from scratch, ignoring the previous buffer
    pub reset: u32,
    pub delta: f32,
    pub time: f32,
}

/// Particle simulation update pipeline (ping-pong writer).
pub struct RainUpdatePipeline {
    pipeline: wgpu::RenderPipeline,
    params_buffer: wgpu::Buffer,
    params_bind_group: wgpu::BindGroup,
    input_bind_group_layout: wgpu::BindGroupLayout,
}

impl RainUpdatePipeline {
    pub fn new(device: &wgpu::Device) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("rain_update_shader"),
            source: wgpu::ShaderSource::Wgsl(
                include_str!("../../../shaders/rain_update.wgsl").into(),
            ),
        });

        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("rain_update_params"),
            size: std::mem::size_of::<RainUpdateParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let params_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("rain_update_params_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let params_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("rain_update_params_bg"),
            layout: &params_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: params_buffer.as_entire_binding(),
            }],
        });

        // Previous positions + velocities, read with textureLoad.
        let input_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("rain_update_input_layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: false },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
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

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("rain_update_pipeline_layout"),
            bind_group_layouts: &[&params_layout, &input_bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("rain_update_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[
                    Some(wgpu::ColorTargetState {
                        format: PARTICLE_FORMAT,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    }),
                    Some(wgpu::ColorTargetState {
                        format: PARTICLE_FORMAT,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    }),
                ],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        Self {
            pipeline,
            params_buffer,
            params_bind_group,
            input_bind_group_layout,
        }
    }

    /// Bind group reading a target's position + velocity textures.
    pub fn create_input_bind_group(
        &self,
        device: &wgpu::Device,
        target: &ParticleTarget,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("rain_update_input_bg"),
            layout: &self.input_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(target.position_view()),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(target.velocity_view()),
                },
            ],
        })
    }

    pub fn update_params(&self, queue: &wgpu::Queue, params: &RainUpdateParams) {
        queue.write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(params));
    }

    /// Run one simulation step: fullscreen pass into the next target.
    pub fn run(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        previous_bind_group: &wgpu::BindGroup,
        next: &ParticleTarget,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("rain_update_pass"),
            color_attachments: &[
                Some(wgpu::RenderPassColorAttachment {
                    view: next.position_view(),
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                }),
                Some(wgpu::RenderPassColorAttachment {
                    view: next.velocity_view(),
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                }),
            ],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.params_bind_group, &[]);
        pass.set_bind_group(1, previous_bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}

/// Particle billboard draw pipeline. Writes only the color attachment of the
/// scene target; position and normal are masked off so raindrops never
/// corrupt the deferred inputs.
pub struct RainDrawPipeline {
    pipeline: wgpu::RenderPipeline,
    positions_bind_group_layout: wgpu::BindGroupLayout,
}

impl RainDrawPipeline {
    pub fn new(device: &wgpu::Device, frame: &FrameBuffer) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("rain_draw_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../../../shaders/rain_draw.wgsl").into()),
        });

        let positions_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("rain_draw_positions_layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                }],
            });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("rain_draw_pipeline_layout"),
            bind_group_layouts: &[frame.bind_group_layout(), &positions_bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("rain_draw_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[
                    Some(wgpu::ColorTargetState {
                        format: COLOR_FORMAT,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    }),
                    Some(wgpu::ColorTargetState {
                        format: POSITION_FORMAT,
                        blend: None,
                        write_mask: wgpu::ColorWrites::empty(),
                    }),
                    Some(wgpu::ColorTargetState {
                        format: NORMAL_FORMAT,
                        blend: None,
                        write_mask: wgpu::ColorWrites::empty(),
                    }),
                ],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        Self {
            pipeline,
            positions_bind_group_layout,
        }
    }

    /// Bind group reading a target's position texture.
    pub fn create_positions_bind_group(
        &self,
        device: &wgpu::Device,
        target: &ParticleTarget,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("rain_draw_positions_bg"),
            layout: &self.positions_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(target.position_view()),
            }],
        })
    }

    /// Draw `count` particle billboards (3 vertices each) inside the
    /// geometry pass.
    pub fn draw(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        frame: &FrameBuffer,
        positions_bind_group: &wgpu::BindGroup,
        count: u32,
    ) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, frame.bind_group(), &[]);
        pass.set_bind_group(1, positions_bind_group, &[]);
        pass.draw(0..3 * count, 0..1);
    }
}
