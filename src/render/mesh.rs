//! Base mesh tessellation and GPU upload.
//!
//! The renderer only ever asks for "this mesh with this transform"; every
//! shape is pre-tessellated once at startup. Shapes follow the unit-size
//! convention: height 1 centered on the origin, radius 0.5.

use bytemuck::{Pod, Zeroable};
use std::f32::consts::{PI, TAU};
use wgpu::util::DeviceExt;

/// Vertex format shared by all scene meshes.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Which base solid a mesh is. Chosen by tag, not dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeshKind {
    /// Branch segment: tapered cylinder, narrow end up
    TaperedCylinder,
    /// Light volume proxy
    Sphere,
    /// Leaf billboard, base at the origin growing +Y
    LeafBillboard,
    /// Ground plane in XZ, normal +Y
    GroundPlane,
}

/// An uploaded mesh: vertex/index buffers plus index count.
pub struct Mesh {
    pub kind: MeshKind,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl Mesh {
    pub fn new(device: &wgpu::Device, kind: MeshKind) -> Self {
        let (vertices, indices) = tessellate(kind);
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_vertices"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_indices"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            kind,
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        }
    }

    /// Bind and draw `instances` copies.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, instances: std::ops::Range<u32>) {
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, instances);
    }
}

/// CPU tessellation for a mesh kind.
pub fn tessellate(kind: MeshKind) -> (Vec<Vertex>, Vec<u32>) {
    match kind {
        MeshKind::TaperedCylinder => tapered_cylinder(24, 0.35),
        MeshKind::Sphere => uv_sphere(20, 20),
        MeshKind::LeafBillboard => leaf_billboard(),
        MeshKind::GroundPlane => ground_plane(),
    }
}

/// Billboard quad with its base on the origin, growing along +Y, facing +Z.
fn leaf_billboard() -> (Vec<Vertex>, Vec<u32>) {
    let n = [0.0, 0.0, 1.0];
    let vertices = vec![
        Vertex { position: [-0.5, 0.0, 0.0], normal: n, uv: [0.0, 0.0] },
        Vertex { position: [0.5, 0.0, 0.0], normal: n, uv: [1.0, 0.0] },
        Vertex { position: [0.5, 1.0, 0.0], normal: n, uv: [1.0, 1.0] },
        Vertex { position: [-0.5, 1.0, 0.0], normal: n, uv: [0.0, 1.0] },
    ];
    (vertices, vec![0, 1, 2, 0, 2, 3])
}

/// Unit quad in the XZ plane, normal +Y.
fn ground_plane() -> (Vec<Vertex>, Vec<u32>) {
    let n = [0.0, 1.0, 0.0];
    let vertices = vec![
        Vertex { position: [-0.5, 0.0, -0.5], normal: n, uv: [0.0, 0.0] },
        Vertex { position: [-0.5, 0.0, 0.5], normal: n, uv: [0.0, 1.0] },
        Vertex { position: [0.5, 0.0, 0.5], normal: n, uv: [1.0, 1.0] },
        Vertex { position: [0.5, 0.0, -0.5], normal: n, uv: [1.0, 0.0] },
    ];
    (vertices, vec![0, 1, 2, 0, 2, 3])
}

/// UV sphere of radius 0.5 centered on the origin.
fn uv_sphere(stacks: u32, slices: u32) -> (Vec<Vertex>, Vec<u32>) {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for stack in 0..=stacks {
        let phi = PI * stack as f32 / stacks as f32;
        let y = phi.cos();
        let ring = phi.sin();
        for slice in 0..=slices {
            let theta = TAU * slice as f32 / slices as f32;
            let x = ring * theta.cos();
            let z = ring * theta.sin();
            vertices.push(Vertex {
                position: [x * 0.5, y * 0.5, z * 0.5],
                normal: [x, y, z],
                uv: [
                    slice as f32 / slices as f32,
                    1.0 - stack as f32 / stacks as f32,
                ],
            });
        }
    }

    let stride = slices + 1;
    for stack in 0..stacks {
        for slice in 0..slices {
            let a = stack * stride + slice;
            let b = a + stride;
            indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
        }
    }
    (vertices, indices)
}

/// Tapered cylinder: base radius 0.5 at y = -0.5, top radius `0.5 * taper`
/// at y = +0.5, capped at both ends.
fn tapered_cylinder(segments: u32, taper: f32) -> (Vec<Vertex>, Vec<u32>) {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    let bottom_r = 0.5;
    let top_r = 0.5 * taper;
    // Side normal tilt from the taper slope.
    let slope = (bottom_r - top_r) / 1.0;
    let normal_scale = 1.0 / (1.0 + slope * slope).sqrt();

    // Side ring vertices
    for seg in 0..=segments {
        let theta = TAU * seg as f32 / segments as f32;
        let (sin, cos) = theta.sin_cos();
        let u = seg as f32 / segments as f32;
        let normal = [
            cos * normal_scale,
            slope * normal_scale,
            sin * normal_scale,
        ];
        vertices.push(Vertex {
            position: [cos * bottom_r, -0.5, sin * bottom_r],
            normal,
            uv: [u, 0.0],
        });
        vertices.push(Vertex {
            position: [cos * top_r, 0.5, sin * top_r],
            normal,
            uv: [u, 1.0],
        });
    }
    for seg in 0..segments {
        let a = seg * 2;
        indices.extend_from_slice(&[a, a + 1, a + 2, a + 2, a + 1, a + 3]);
    }

    // Caps
    for (y, radius, normal_y) in [(-0.5f32, bottom_r, -1.0f32), (0.5, top_r, 1.0)] {
        let center = vertices.len() as u32;
        vertices.push(Vertex {
            position: [0.0, y, 0.0],
            normal: [0.0, normal_y, 0.0],
            uv: [0.5, 0.5],
        });
        for seg in 0..=segments {
            let theta = TAU * seg as f32 / segments as f32;
            let (sin, cos) = theta.sin_cos();
            vertices.push(Vertex {
                position: [cos * radius, y, sin * radius],
                normal: [0.0, normal_y, 0.0],
                uv: [0.5 + cos * 0.5, 0.5 + sin * 0.5],
            });
        }
        for seg in 0..segments {
            let a = center + 1 + seg;
            if normal_y < 0.0 {
                indices.extend_from_slice(&[center, a, a + 1]);
            } else {
                indices.extend_from_slice(&[center, a + 1, a]);
            }
        }
    }

    (vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_vertices_on_radius() {
        let (vertices, indices) = tessellate(MeshKind::Sphere);
        assert!(!indices.is_empty());
        for v in &vertices {
            let r = (v.position[0].powi(2) + v.position[1].powi(2) + v.position[2].powi(2))
                .sqrt();
            assert!((r - 0.5).abs() < 1e-4, "off-sphere vertex: {:?}", v.position);
        }
    }

    #[test]
    fn test_sphere_normals_unit_length() {
        let (vertices, _) = tessellate(MeshKind::Sphere);
        for v in &vertices {
            let n = (v.normal[0].powi(2) + v.normal[1].powi(2) + v.normal[2].powi(2)).sqrt();
            assert!((n - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_tapered_cylinder_spans_unit_height() {
        let (vertices, indices) = tessellate(MeshKind::TaperedCylinder);
        let min_y = vertices.iter().map(|v| v.position[1]).fold(f32::MAX, f32::min);
        let max_y = vertices.iter().map(|v| v.position[1]).fold(f32::MIN, f32::max);
        assert_eq!(min_y, -0.5);
        assert_eq!(max_y, 0.5);
        assert_eq!(indices.len() % 3, 0);
    }

    #[test]
    fn test_indices_in_bounds() {
        for kind in [
            MeshKind::TaperedCylinder,
            MeshKind::Sphere,
            MeshKind::LeafBillboard,
            MeshKind::GroundPlane,
        ] {
            let (vertices, indices) = tessellate(kind);
            for &i in &indices {
                assert!((i as usize) < vertices.len(), "{:?}: index {} out of bounds", kind, i);
            }
        }
    }

    #[test]
    fn test_leaf_billboard_base_at_origin() {
        let (vertices, _) = tessellate(MeshKind::LeafBillboard);
        let min_y = vertices.iter().map(|v| v.position[1]).fold(f32::MAX, f32::min);
        assert_eq!(min_y, 0.0);
    }
}
