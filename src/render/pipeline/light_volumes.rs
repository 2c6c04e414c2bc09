//! Deferred lighting accumulation pass.
//!
//! For each point light a proxy sphere scaled to the light radius is drawn
//! with additive blending into the lit target; the fragment shader samples
//! the geometry pass attachments at the fragment's screen position and
//! accumulates that light's contribution.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::util::DeviceExt;

use crate::render::buffer::FrameBuffer;
use crate::render::texture::SceneTargets;
use crate::render::texture::scene_targets::LIT_FORMAT;
use crate::scene::{Light, SceneConfig};

/// Per-light instance data for the proxy sphere draw.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct LightInstance {
    pub model: [[f32; 4]; 4],
    /// rgb = light color, w = brightness
    pub color: [f32; 4],
    /// xyz = world position, w = radius
    pub position: [f32; 4],
}

impl LightInstance {
    pub fn new(light: &Light, config: &SceneConfig) -> Self {
        let radius = config.light_radius;
        let model = Mat4::from_translation(light.position.truncate())
            * Mat4::from_scale(glam::Vec3::splat(radius));
        Self {
            model: model.to_cols_array_2d(),
            color: [
                light.color.x,
                light.color.y,
                light.color.z,
                config.light_brightness,
            ],
            position: [
                light.position.x,
                light.position.y,
                light.position.z,
                radius,
            ],
        }
    }

    pub const ATTRIBUTES: [wgpu::VertexAttribute; 6] = wgpu::vertex_attr_array![
        3 => Float32x4, 4 => Float32x4, 5 => Float32x4, 6 => Float32x4,
        7 => Float32x4, 8 => Float32x4
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<LightInstance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Light-volume accumulation pipeline. A fullscreen fill pass lays down the
/// directional light and background first; the per-light sphere proxies then
/// add on top of it.
pub struct LightVolumePipeline {
    fill: wgpu::RenderPipeline,
    pipeline: wgpu::RenderPipeline,
    gbuffer_bind_group_layout: wgpu::BindGroupLayout,
}

impl LightVolumePipeline {
    pub fn new(device: &wgpu::Device, frame: &FrameBuffer) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("light_volume_shader"),
            source: wgpu::ShaderSource::Wgsl(
                include_str!("../../../shaders/light_volume.wgsl").into(),
            ),
        });

        // Geometry pass attachments, read with textureLoad at the fragment
        // coordinate.
        let texture_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: false },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let gbuffer_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("light_volume_gbuffer_layout"),
                entries: &[texture_entry(0), texture_entry(1), texture_entry(2)],
            });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("light_volume_pipeline_layout"),
            bind_group_layouts: &[frame.bind_group_layout(), &gbuffer_bind_group_layout],
            immediate_size: 0,
        });

        let additive = wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
        };

        let fill = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("light_fill_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_fill"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_fill"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: LIT_FORMAT,
                    blend: Some(additive),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("light_volume_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[crate::render::mesh::Vertex::layout(), LightInstance::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: LIT_FORMAT,
                    // Pure additive accumulation across light volumes.
                    blend: Some(additive),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                // Front faces culled so volumes still shade with the camera
                // inside the sphere.
                cull_mode: Some(wgpu::Face::Front),
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        Self {
            fill,
            pipeline,
            gbuffer_bind_group_layout,
        }
    }

    /// Bind group over the geometry pass attachments. Recreated whenever the
    /// scene targets are reallocated.
    pub fn create_gbuffer_bind_group(
        &self,
        device: &wgpu::Device,
        targets: &SceneTargets,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("light_volume_gbuffer_bg"),
            layout: &self.gbuffer_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(targets.color_view()),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(targets.position_view()),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(targets.normal_view()),
                },
            ],
        })
    }

    /// Upload the current light list as an instance buffer.
    pub fn create_instance_buffer(
        &self,
        device: &wgpu::Device,
        lights: &[Light],
        config: &SceneConfig,
    ) -> (wgpu::Buffer, u32) {
        let instances: Vec<LightInstance> = lights
            .iter()
            .map(|light| LightInstance::new(light, config))
            .collect();
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("light_volume_instances"),
            contents: bytemuck::cast_slice(&instances),
            usage: wgpu::BufferUsages::VERTEX,
        });
        (buffer, instances.len() as u32)
    }

    /// Run the accumulation pass: clear the lit target, lay down the fill
    /// lighting, then draw every light volume additively.
    #[allow(clippy::too_many_arguments)]
    pub fn run(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        frame: &FrameBuffer,
        targets: &SceneTargets,
        gbuffer_bind_group: &wgpu::BindGroup,
        sphere: &crate::render::mesh::Mesh,
        instances: &wgpu::Buffer,
        light_count: u32,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("light_volume_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: targets.lit_view(),
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        pass.set_bind_group(0, frame.bind_group(), &[]);
        pass.set_bind_group(1, gbuffer_bind_group, &[]);

        pass.set_pipeline(&self.fill);
        pass.draw(0..3, 0..1);

        if light_count == 0 {
            return;
        }
        pass.set_pipeline(&self.pipeline);
        pass.set_vertex_buffer(1, instances.slice(..));
        sphere.draw(&mut pass, 0..light_count);
    }
}
