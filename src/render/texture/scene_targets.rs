//! Intermediate render targets for the deferred pipeline.
//!
//! Target A is the geometry pass output (color + world position + normal
//! attachments plus depth); target B holds the accumulated lighting for the
//! post-process pass to sample. Both are reallocated wholesale when the
//! output dimensions change and never otherwise.

use wgpu::{Device, Texture, TextureView};

pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
pub const POSITION_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
pub const NORMAL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
pub const LIT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// Geometry + lighting intermediate buffers.
pub struct SceneTargets {
    #[allow(dead_code)]
    color: Texture,
    #[allow(dead_code)]
    position: Texture,
    #[allow(dead_code)]
    normal: Texture,
    #[allow(dead_code)]
    depth: Texture,
    #[allow(dead_code)]
    lit: Texture,

    color_view: TextureView,
    position_view: TextureView,
    normal_view: TextureView,
    depth_view: TextureView,
    lit_view: TextureView,

    width: u32,
    height: u32,
    /// Bumped on every reallocation; lets callers notice buffer identity changes.
    generation: u64,
}

impl SceneTargets {
    pub fn new(device: &Device, width: u32, height: u32) -> Self {
        Self::allocate(device, width.max(1), height.max(1), 0)
    }

    fn allocate(device: &Device, width: u32, height: u32, generation: u64) -> Self {
        let make = |label: &str, format: wgpu::TextureFormat| {
            device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            })
        };

        let color = make("scene_color", COLOR_FORMAT);
        let position = make("scene_position", POSITION_FORMAT);
        let normal = make("scene_normal", NORMAL_FORMAT);
        let depth = make("scene_depth", DEPTH_FORMAT);
        let lit = make("scene_lit", LIT_FORMAT);

        let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());
        let position_view = position.create_view(&wgpu::TextureViewDescriptor::default());
        let normal_view = normal.create_view(&wgpu::TextureViewDescriptor::default());
        let depth_view = depth.create_view(&wgpu::TextureViewDescriptor::default());
        let lit_view = lit.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            color,
            position,
            normal,
            depth,
            lit,
            color_view,
            position_view,
            normal_view,
            depth_view,
            lit_view,
            width,
            height,
            generation,
        }
    }

    /// Whether a `resize` call with these dimensions would reallocate.
    pub fn needs_resize(&self, width: u32, height: u32) -> bool {
        self.width != width.max(1) || self.height != height.max(1)
    }

    /// Reallocate all targets if the dimensions changed. Calling twice with
    /// identical dimensions performs no work on the second call.
    pub fn resize(&mut self, device: &Device, width: u32, height: u32) -> bool {
        if !self.needs_resize(width, height) {
            return false;
        }
        log::debug!("scene targets resize to {}x{}", width, height);
        *self = Self::allocate(device, width.max(1), height.max(1), self.generation + 1);
        true
    }

    pub fn color_view(&self) -> &TextureView {
        &self.color_view
    }

    pub fn position_view(&self) -> &TextureView {
        &self.position_view
    }

    pub fn normal_view(&self) -> &TextureView {
        &self.normal_view
    }

    pub fn depth_view(&self) -> &TextureView {
        &self.depth_view
    }

    pub fn lit_view(&self) -> &TextureView {
        &self.lit_view
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}
