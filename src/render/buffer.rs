//! Shared per-frame uniform buffer

use bytemuck::{Pod, Zeroable};

use crate::core::camera::Camera;
use crate::scene::Light;

/// Per-frame uniform data shared by every raster pass (must match the WGSL
/// `Frame` struct exactly; vec3 members are padded to 16 bytes).
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct FrameUniform {
    /// Combined view-projection matrix
    pub view_proj: [[f32; 4]; 4],
    /// Camera eye in world space (w = 1)
    pub eye: [f32; 4],
    /// Directional fill light direction (w = 0)
    pub sun_direction: [f32; 4],
    /// Directional fill light color
    pub sun_color: [f32; 4],
    /// Output resolution in pixels
    pub resolution: [f32; 2],
    /// Seconds since startup
    pub time: f32,
    /// 1.0 while rain is enabled (drives puddle ripples)
    pub rain_enabled: f32,
}

impl Default for FrameUniform {
    fn default() -> Self {
        let fill = Light::directional_fill();
        Self {
            view_proj: glam::Mat4::IDENTITY.to_cols_array_2d(),
            eye: [0.0, 0.0, 0.0, 1.0],
            sun_direction: fill.direction.to_array(),
            sun_color: fill.color.to_array(),
            resolution: [1.0, 1.0],
            time: 0.0,
            rain_enabled: 1.0,
        }
    }
}

impl FrameUniform {
    pub fn new(
        camera: &Camera,
        resolution: (u32, u32),
        time: f32,
        rain_enabled: bool,
    ) -> Self {
        let fill = Light::directional_fill();
        Self {
            view_proj: camera.view_projection().to_cols_array_2d(),
            eye: camera.eye_world().to_array(),
            sun_direction: fill.direction.to_array(),
            sun_color: fill.color.to_array(),
            resolution: [resolution.0 as f32, resolution.1 as f32],
            time,
            rain_enabled: if rain_enabled { 1.0 } else { 0.0 },
        }
    }
}

/// GPU buffer for the frame uniform, bound at group 0 of every pass.
pub struct FrameBuffer {
    buffer: wgpu::Buffer,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
}

impl FrameBuffer {
    pub fn new(device: &wgpu::Device) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("frame_uniform"),
            size: std::mem::size_of::<FrameUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });

        Self {
            buffer,
            bind_group_layout,
            bind_group,
        }
    }

    /// Upload this frame's uniform data
    pub fn update(&self, queue: &wgpu::Queue, uniform: &FrameUniform) {
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(uniform));
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_size_is_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<FrameUniform>() % 16, 0);
    }
}
