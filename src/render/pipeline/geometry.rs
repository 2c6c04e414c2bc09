//! Geometry pass: instanced opaque meshes and leaf billboards into the
//! multi-attachment scene target (color + world position + normal).

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};
use wgpu::util::DeviceExt;

use crate::render::buffer::FrameBuffer;
use crate::render::texture::scene_targets::{
    COLOR_FORMAT, DEPTH_FORMAT, NORMAL_FORMAT, POSITION_FORMAT,
};

/// Material tags consumed by the geometry shader.
pub const MATERIAL_BARK: f32 = 0.0;
pub const MATERIAL_LEAF: f32 = 1.0;
pub const MATERIAL_PUDDLE: f32 = 2.0;

/// Per-instance data: placement matrix plus color. The color's w channel
/// carries the material tag, not alpha.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct Instance {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
}

impl Instance {
    pub fn new(model: Mat4, color: Vec4, material: f32) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            color: [color.x, color.y, color.z, material],
        }
    }

    pub const ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        3 => Float32x4, 4 => Float32x4, 5 => Float32x4, 6 => Float32x4, 7 => Float32x4
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Instance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// An uploaded instance list.
pub struct InstanceBuffer {
    buffer: wgpu::Buffer,
    count: u32,
}

impl InstanceBuffer {
    pub fn new(device: &wgpu::Device, label: &str, instances: &[Instance]) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(instances),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Self {
            buffer,
            count: instances.len() as u32,
        }
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}

/// Instanced geometry pipeline, in two variants: back-face-culled opaque and
/// double-sided for the leaf billboards.
pub struct GeometryPipeline {
    opaque: wgpu::RenderPipeline,
    double_sided: wgpu::RenderPipeline,
}

impl GeometryPipeline {
    pub fn new(device: &wgpu::Device, frame: &FrameBuffer) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("geometry_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../../../shaders/geometry.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("geometry_pipeline_layout"),
            bind_group_layouts: &[frame.bind_group_layout()],
            immediate_size: 0,
        });

        let make = |label: &str, cull: Option<wgpu::Face>| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[crate::render::mesh::Vertex::layout(), Instance::layout()],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[
                        Some(wgpu::ColorTargetState {
                            format: COLOR_FORMAT,
                            blend: None,
                            write_mask: wgpu::ColorWrites::ALL,
                        }),
                        Some(wgpu::ColorTargetState {
                            format: POSITION_FORMAT,
                            blend: None,
                            write_mask: wgpu::ColorWrites::ALL,
                        }),
                        Some(wgpu::ColorTargetState {
                            format: NORMAL_FORMAT,
                            blend: None,
                            write_mask: wgpu::ColorWrites::ALL,
                        }),
                    ],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: cull,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            })
        };

        Self {
            opaque: make("geometry_pipeline", Some(wgpu::Face::Back)),
            double_sided: make("geometry_leaf_pipeline", None),
        }
    }

    /// Draw an instanced mesh with back-face culling.
    pub fn draw_opaque(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        frame: &FrameBuffer,
        mesh: &crate::render::mesh::Mesh,
        instances: &InstanceBuffer,
    ) {
        if instances.count() == 0 {
            return;
        }
        pass.set_pipeline(&self.opaque);
        pass.set_bind_group(0, frame.bind_group(), &[]);
        pass.set_vertex_buffer(1, instances.buffer().slice(..));
        mesh.draw(pass, 0..instances.count());
    }

    /// Draw an instanced mesh with face culling disabled (leaf billboards
    /// are visible from both sides).
    pub fn draw_double_sided(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        frame: &FrameBuffer,
        mesh: &crate::render::mesh::Mesh,
        instances: &InstanceBuffer,
    ) {
        if instances.count() == 0 {
            return;
        }
        pass.set_pipeline(&self.double_sided);
        pass.set_bind_group(0, frame.bind_group(), &[]);
        pass.set_vertex_buffer(1, instances.buffer().slice(..));
        mesh.draw(pass, 0..instances.count());
    }
}
