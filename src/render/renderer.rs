//! Frame orchestration for the deferred scene.
//!
//! Per frame: apply any pending regeneration atomically, advance the rain
//! simulation into the write half of the ping-pong pair, lay down geometry
//! into the multi-attachment scene target, accumulate light volumes into the
//! lit target, then post-process to the swapchain. GPU validation errors are
//! captured with an error scope per frame and surfaced in the report rather
//! than tearing the process down.

use glam::{Mat4, Vec3, Vec4};

use crate::core::camera::Camera;
use crate::core::rng::Rng;
use crate::core::types::Result;
use crate::render::buffer::{FrameBuffer, FrameUniform};
use crate::render::context::GpuContext;
use crate::render::mesh::{Mesh, MeshKind};
use crate::render::pipeline::geometry::{MATERIAL_BARK, MATERIAL_LEAF, MATERIAL_PUDDLE};
use crate::render::pipeline::{
    GeometryPipeline, Instance, InstanceBuffer, LightVolumePipeline, RainDrawPipeline,
    RainUpdateParams, RainUpdatePipeline, WindowEffectParams, WindowEffectPipeline,
};
use crate::render::texture::rain_targets::Slot;
use crate::render::texture::{RainBuffers, SceneTargets};
use crate::scene::{LightField, RegenScope, SceneConfig};
use crate::tree::TreeBuilder;

const BARK_COLOR: Vec4 = Vec4::new(0.42, 0.30, 0.19, 1.0);
const LEAF_COLOR: Vec4 = Vec4::new(0.22, 0.55, 0.24, 1.0);
const GROUND_COLOR: Vec4 = Vec4::new(0.10, 0.11, 0.13, 1.0);
const GROUND_EXTENT: f32 = 40.0;
/// Tree root height; the ground plane sits here too.
const GROUND_Y: f32 = -6.0;

/// Per-frame outcome. A present still happened when `gpu_error` is set; the
/// error is informational.
#[derive(Debug, Default)]
pub struct FrameReport {
    pub gpu_error: Option<String>,
}

struct RainBindGroups {
    /// Update-pass inputs (positions + velocities), one per slot.
    update_inputs: [wgpu::BindGroup; 2],
    /// Draw-pass position textures, one per slot.
    draw_positions: [wgpu::BindGroup; 2],
}

impl RainBindGroups {
    fn new(
        device: &wgpu::Device,
        update: &RainUpdatePipeline,
        draw: &RainDrawPipeline,
        rain: &RainBuffers,
    ) -> Self {
        let per_slot = |slot: Slot| {
            (
                update.create_input_bind_group(device, rain.target(slot)),
                draw.create_positions_bind_group(device, rain.target(slot)),
            )
        };
        let (even_input, even_positions) = per_slot(Slot::Even);
        let (odd_input, odd_positions) = per_slot(Slot::Odd);
        Self {
            update_inputs: [even_input, odd_input],
            draw_positions: [even_positions, odd_positions],
        }
    }

    fn update_input(&self, slot: Slot) -> &wgpu::BindGroup {
        &self.update_inputs[slot as usize]
    }

    fn draw_positions(&self, slot: Slot) -> &wgpu::BindGroup {
        &self.draw_positions[slot as usize]
    }
}

/// Owns every GPU resource of the scene and drives the frame sequence.
pub struct SceneRenderer {
    config: SceneConfig,
    pending: RegenScope,
    rng: Rng,
    tree_builder: TreeBuilder,
    light_field: LightField,

    pub camera: Camera,

    frame: FrameBuffer,
    targets: SceneTargets,
    rain: RainBuffers,

    geometry: GeometryPipeline,
    rain_update: RainUpdatePipeline,
    rain_draw: RainDrawPipeline,
    light_volumes: LightVolumePipeline,
    window_effect: WindowEffectPipeline,

    branch_mesh: Mesh,
    leaf_mesh: Mesh,
    ground_mesh: Mesh,
    sphere_mesh: Mesh,

    branch_instances: InstanceBuffer,
    leaf_instances: InstanceBuffer,
    ground_instances: InstanceBuffer,
    light_instances: wgpu::Buffer,
    light_instance_count: u32,

    rain_bind_groups: RainBindGroups,
    gbuffer_bind_group: wgpu::BindGroup,
    window_input_bind_group: wgpu::BindGroup,
}

impl SceneRenderer {
    pub fn new(ctx: &GpuContext, config: SceneConfig, mut rng: Rng) -> Result<Self> {
        let device = &ctx.device;
        let (width, height) = ctx.size();

        let frame = FrameBuffer::new(device);
        let targets = SceneTargets::new(device, width, height);
        let rain = RainBuffers::new(device, config.adjusted_particle_count());

        let geometry = GeometryPipeline::new(device, &frame);
        let rain_update = RainUpdatePipeline::new(device);
        let rain_draw = RainDrawPipeline::new(device, &frame);
        let light_volumes = LightVolumePipeline::new(device, &frame);
        let window_effect = WindowEffectPipeline::new(device, ctx.format());

        let branch_mesh = Mesh::new(device, MeshKind::TaperedCylinder);
        let leaf_mesh = Mesh::new(device, MeshKind::LeafBillboard);
        let ground_mesh = Mesh::new(device, MeshKind::GroundPlane);
        let sphere_mesh = Mesh::new(device, MeshKind::Sphere);

        let tree_builder = TreeBuilder::default();
        let geo = tree_builder.build(&config.tree_params(), &mut rng)?;
        let branch_instances = branch_instance_list(device, &geo.branches);
        let leaf_instances = leaf_instance_list(device, &geo.leaves, &config);
        let ground_instances = ground_instance_list(device);

        let mut light_field = LightField::default();
        light_field.regenerate(&config, &mut rng);
        let (light_instances, light_instance_count) =
            light_volumes.create_instance_buffer(device, light_field.lights(), &config);

        let rain_bind_groups = RainBindGroups::new(device, &rain_update, &rain_draw, &rain);
        let gbuffer_bind_group = light_volumes.create_gbuffer_bind_group(device, &targets);
        let window_input_bind_group = window_effect.create_input_bind_group(device, &targets);

        let camera = Camera::new(
            Vec3::new(0.0, 0.0, 0.0),
            22.0,
            width.max(1) as f32 / height.max(1) as f32,
        );

        log::info!(
            "scene ready: {} branches, {} leaves, {} lights, {} rain particles",
            branch_instances.count(),
            leaf_instances.count(),
            light_instance_count,
            rain.state().count()
        );

        Ok(Self {
            config,
            pending: RegenScope::default(),
            rng,
            tree_builder,
            light_field,
            camera,
            frame,
            targets,
            rain,
            geometry,
            rain_update,
            rain_draw,
            light_volumes,
            window_effect,
            branch_mesh,
            leaf_mesh,
            ground_mesh,
            sphere_mesh,
            branch_instances,
            leaf_instances,
            ground_instances,
            light_instances,
            light_instance_count,
            rain_bind_groups,
            gbuffer_bind_group,
            window_input_bind_group,
        })
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Adopt a new settings snapshot. The required regeneration is derived
    /// from the diff and deferred to the next frame so it lands atomically.
    pub fn apply_config(&mut self, next: SceneConfig) {
        let scope = self.config.diff(&next);
        if !scope.is_empty() {
            log::debug!("config change: {:?}", scope);
        }
        self.pending.merge(scope);
        self.config = next;
    }

    /// Discard the current tree and grow a fresh one next frame.
    pub fn regrow_tree(&mut self) {
        self.pending.tree = true;
    }

    /// Restart the rain simulation from scratch next frame.
    pub fn restart_rain(&mut self) {
        self.rain.state_mut().force_reset();
    }

    fn apply_pending(&mut self, device: &wgpu::Device) {
        let pending = std::mem::take(&mut self.pending);
        if pending.is_empty() {
            return;
        }

        if pending.tree {
            match self
                .tree_builder
                .build(&self.config.tree_params(), &mut self.rng)
            {
                Ok(geo) => {
                    self.branch_instances = branch_instance_list(device, &geo.branches);
                    self.leaf_instances = leaf_instance_list(device, &geo.leaves, &self.config);
                }
                // Keep last good geometry on generation failure.
                Err(e) => log::warn!("tree regeneration failed: {e}"),
            }
        }

        if pending.light_count {
            self.light_field.regenerate(&self.config, &mut self.rng);
        } else if pending.light_colors {
            self.light_field.recolor(&self.config, &mut self.rng);
        }
        if pending.light_count || pending.light_colors {
            let (buffer, count) = self.light_volumes.create_instance_buffer(
                device,
                self.light_field.lights(),
                &self.config,
            );
            self.light_instances = buffer;
            self.light_instance_count = count;
        }

        if pending.rain_buffers
            && self
                .rain
                .resize(device, self.config.adjusted_particle_count())
        {
            self.rain_bind_groups =
                RainBindGroups::new(device, &self.rain_update, &self.rain_draw, &self.rain);
        }
    }

    fn resize_if_needed(&mut self, ctx: &GpuContext) {
        let (width, height) = ctx.size();
        if self.targets.resize(&ctx.device, width, height) {
            self.gbuffer_bind_group = self
                .light_volumes
                .create_gbuffer_bind_group(&ctx.device, &self.targets);
            self.window_input_bind_group = self
                .window_effect
                .create_input_bind_group(&ctx.device, &self.targets);
        }
        self.camera.set_aspect(width, height);
    }

    /// Render one frame to the surface.
    pub fn render(&mut self, ctx: &GpuContext, time: f32, delta: f32) -> Result<FrameReport> {
        // Held for the whole frame; resolved after submit.
        let error_scope = ctx.device.push_error_scope(wgpu::ErrorFilter::Validation);

        self.resize_if_needed(ctx);
        self.apply_pending(&ctx.device);

        let output = ctx.get_current_texture()?;
        let output_view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let uniform = FrameUniform::new(
            &self.camera,
            ctx.size(),
            time,
            self.config.rain_enabled,
        );
        self.frame.update(&ctx.queue, &uniform);

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });

        if self.config.rain_enabled {
            self.rain_update.update_params(
                &ctx.queue,
                &RainUpdateParams {
                    particle_count: self.rain.state().count(),
                    reset: self.rain.state().reset_pending() as u32,
                    delta,
                    time,
                },
            );
            self.rain_update.run(
                &mut encoder,
                self.rain_bind_groups.update_input(self.rain.state().current()),
                self.rain.next_target(),
            );
            // The roles flip even on reset frames; the draw below reads the
            // freshly written target.
            self.rain.state_mut().after_update();
        }

        self.geometry_pass(&mut encoder);

        self.light_volumes.run(
            &mut encoder,
            &self.frame,
            &self.targets,
            &self.gbuffer_bind_group,
            &self.sphere_mesh,
            &self.light_instances,
            self.light_instance_count,
        );

        let effect_on = self.config.rain_enabled && self.config.rain_on_window;
        self.window_effect.update_params(
            &ctx.queue,
            &WindowEffectParams {
                resolution: [self.targets.width() as f32, self.targets.height() as f32],
                time,
                effect_enabled: if effect_on { 1.0 } else { 0.0 },
            },
        );
        self.window_effect
            .run(&mut encoder, &output_view, &self.window_input_bind_group);

        ctx.queue.submit(Some(encoder.finish()));

        let gpu_error = pollster::block_on(error_scope.pop()).map(|e| e.to_string());
        if let Some(ref message) = gpu_error {
            log::error!("gpu validation error: {message}");
        }

        output.present();
        Ok(FrameReport { gpu_error })
    }

    fn geometry_pass(&mut self, encoder: &mut wgpu::CommandEncoder) {
        let clear = wgpu::Operations {
            load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
            store: wgpu::StoreOp::Store,
        };
        let attachment = |view| {
            Some(wgpu::RenderPassColorAttachment {
                view,
                depth_slice: None,
                resolve_target: None,
                ops: clear,
            })
        };
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("geometry_pass"),
            color_attachments: &[
                attachment(self.targets.color_view()),
                attachment(self.targets.position_view()),
                attachment(self.targets.normal_view()),
            ],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: self.targets.depth_view(),
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        self.geometry
            .draw_opaque(&mut pass, &self.frame, &self.ground_mesh, &self.ground_instances);
        self.geometry
            .draw_opaque(&mut pass, &self.frame, &self.branch_mesh, &self.branch_instances);
        self.geometry.draw_double_sided(
            &mut pass,
            &self.frame,
            &self.leaf_mesh,
            &self.leaf_instances,
        );

        if self.config.rain_enabled {
            self.rain_draw.draw(
                &mut pass,
                &self.frame,
                self.rain_bind_groups.draw_positions(self.rain.state().current()),
                self.rain.state().count(),
            );
        }
    }
}

fn branch_instance_list(device: &wgpu::Device, branches: &[Mat4]) -> InstanceBuffer {
    let instances: Vec<Instance> = branches
        .iter()
        .map(|&model| Instance::new(model, BARK_COLOR, MATERIAL_BARK))
        .collect();
    InstanceBuffer::new(device, "branch_instances", &instances)
}

fn leaf_instance_list(
    device: &wgpu::Device,
    leaves: &[Mat4],
    config: &SceneConfig,
) -> InstanceBuffer {
    // Leaf matrices are uniform in leaf_size; the width setting narrows the
    // billboard independently.
    let aspect = if config.leaf_size > 0.0 {
        config.leaf_width / config.leaf_size
    } else {
        1.0
    };
    let narrow = Mat4::from_scale(Vec3::new(aspect, 1.0, 1.0));
    let instances: Vec<Instance> = leaves
        .iter()
        .map(|&model| Instance::new(model * narrow, LEAF_COLOR, MATERIAL_LEAF))
        .collect();
    InstanceBuffer::new(device, "leaf_instances", &instances)
}

fn ground_instance_list(device: &wgpu::Device) -> InstanceBuffer {
    let model = Mat4::from_translation(Vec3::new(0.0, GROUND_Y, 0.0))
        * Mat4::from_scale(Vec3::new(GROUND_EXTENT, 1.0, GROUND_EXTENT));
    InstanceBuffer::new(
        device,
        "ground_instances",
        &[Instance::new(model, GROUND_COLOR, MATERIAL_PUDDLE)],
    )
}
