//! [`SceneRenderer`] implementation on wgpu.
//!
//! Draws are collected while a target is bound. Unbinding uploads the pass
//! globals and instance data, encodes one render pass that issues every draw
//! as a single instance (`instance_index` selects its storage-buffer entry),
//! and submits it.

use crate::material::ShaderVariant;
use crate::mesh::MeshKind;
use crate::renderer::{
    ClearOp, DepthTextureHandle, DrawCall, FrameState, RenderError, RenderTarget, SceneRenderer,
    Viewport,
};
use griffith_sky::Color;

use super::canvas::OffscreenCanvas;
use super::context::{GpuContext, GpuError, init_headless_blocking};
use super::depth_pipeline::{DepthOnlyPipeline, scene_bind_group_layout};
use super::mesh::MeshRegistry;
use super::shaded_pipeline::ShadedPipeline;
use super::shader::SCENE_SHADER_SOURCE;
use super::shadow_map::{ShadowMap, shadow_bind_group_layout};
use super::uniforms::{GlobalsUniform, InstanceData};

const INITIAL_INSTANCE_CAPACITY: usize = 1024;

/// Uniform + storage buffers shared by every pass.
struct PassResources {
    globals_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,
    bind_group: wgpu::BindGroup,
}

impl PassResources {
    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, capacity: usize) -> Self {
        let globals_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("scene-globals"),
            size: std::mem::size_of::<GlobalsUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("scene-instances"),
            size: (capacity * std::mem::size_of::<InstanceData>()) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = Self::bind_group(device, layout, &globals_buffer, &instance_buffer);
        Self {
            globals_buffer,
            instance_buffer,
            instance_capacity: capacity,
            bind_group,
        }
    }

    fn bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        globals: &wgpu::Buffer,
        instances: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene-globals-bg"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: globals.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: instances.as_entire_binding(),
                },
            ],
        })
    }

    /// Grow the instance buffer to hold at least `needed` entries.
    fn ensure_capacity(
        &mut self,
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        needed: usize,
    ) {
        if needed <= self.instance_capacity {
            return;
        }
        let capacity = needed.next_power_of_two();
        log::debug!(
            "Growing instance buffer {} -> {capacity}",
            self.instance_capacity
        );
        self.instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("scene-instances"),
            size: (capacity * std::mem::size_of::<InstanceData>()) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        self.instance_capacity = capacity;
        self.bind_group =
            Self::bind_group(device, layout, &self.globals_buffer, &self.instance_buffer);
    }
}

struct PendingDraw {
    mesh: MeshKind,
    variant: ShaderVariant,
}

#[derive(Default)]
struct PendingPass {
    viewport: Option<Viewport>,
    clear: Option<ClearOp>,
    globals: Option<GlobalsUniform>,
    shadow_map: Option<DepthTextureHandle>,
    draws: Vec<PendingDraw>,
    instances: Vec<InstanceData>,
}

/// Headless wgpu backend rendering into an [`OffscreenCanvas`].
pub struct GpuSceneRenderer {
    context: GpuContext,
    canvas: OffscreenCanvas,
    meshes: MeshRegistry,
    scene_layout: wgpu::BindGroupLayout,
    shadow_layout: wgpu::BindGroupLayout,
    depth_pipeline: DepthOnlyPipeline,
    shaded: ShadedPipeline,
    resources: PassResources,
    shadow_maps: Vec<ShadowMap>,
    shadow_bind_groups: Vec<wgpu::BindGroup>,
    /// Bound in camera passes that have no shadow map of their own.
    fallback_shadow: (ShadowMap, wgpu::BindGroup),
    bound: Option<RenderTarget>,
    pending: PendingPass,
    passes_submitted: u64,
}

impl GpuSceneRenderer {
    /// Bring up a headless device and build all pipelines.
    pub fn new(width: u32, height: u32) -> Result<Self, GpuError> {
        let context = init_headless_blocking()?;
        Ok(Self::from_context(context, width, height))
    }

    pub fn from_context(context: GpuContext, width: u32, height: u32) -> Self {
        let device = &context.device;
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene-shader"),
            source: wgpu::ShaderSource::Wgsl(SCENE_SHADER_SOURCE.into()),
        });
        let scene_layout = scene_bind_group_layout(device);
        let shadow_layout = shadow_bind_group_layout(device);
        let depth_pipeline = DepthOnlyPipeline::new(device, &shader, &scene_layout);
        let shaded = ShadedPipeline::new(
            device,
            &shader,
            &scene_layout,
            &shadow_layout,
            OffscreenCanvas::COLOR_FORMAT,
        );
        let canvas = OffscreenCanvas::new(device, width, height);
        let meshes = MeshRegistry::new(device);
        let resources = PassResources::new(device, &scene_layout, INITIAL_INSTANCE_CAPACITY);
        let fallback_map = ShadowMap::new(device, 1);
        let fallback_group = fallback_map.bind_group(device, &shadow_layout);

        log::info!(
            "GPU scene renderer ready: canvas {}x{}, {} meshes",
            canvas.size().0,
            canvas.size().1,
            meshes.len()
        );

        Self {
            context,
            canvas,
            meshes,
            scene_layout,
            shadow_layout,
            depth_pipeline,
            shaded,
            resources,
            shadow_maps: Vec::new(),
            shadow_bind_groups: Vec::new(),
            fallback_shadow: (fallback_map, fallback_group),
            bound: None,
            pending: PendingPass::default(),
            passes_submitted: 0,
        }
    }

    pub fn context(&self) -> &GpuContext {
        &self.context
    }

    pub fn canvas(&self) -> &OffscreenCanvas {
        &self.canvas
    }

    /// Render passes submitted to the queue so far.
    pub fn passes_submitted(&self) -> u64 {
        self.passes_submitted
    }

    fn target_size(&self, target: RenderTarget) -> Result<(u32, u32), RenderError> {
        match target {
            RenderTarget::Canvas => Ok(self.canvas.size()),
            RenderTarget::Depth(handle) => self
                .shadow_maps
                .get(handle.0 as usize)
                .map(|map| (map.resolution(), map.resolution()))
                .ok_or(RenderError::UnknownDepthTexture(handle)),
        }
    }

    fn flush(&mut self, target: RenderTarget, pending: PendingPass) -> Result<(), RenderError> {
        let (target_width, target_height) = self.target_size(target)?;
        let device = &self.context.device;
        let queue = &self.context.queue;

        self.resources
            .ensure_capacity(device, &self.scene_layout, pending.instances.len());
        if let Some(globals) = &pending.globals {
            queue.write_buffer(&self.resources.globals_buffer, 0, bytemuck::bytes_of(globals));
        }
        if !pending.instances.is_empty() {
            queue.write_buffer(
                &self.resources.instance_buffer,
                0,
                bytemuck::cast_slice(&pending.instances),
            );
        }

        let clear = pending.clear.unwrap_or(ClearOp {
            color: None,
            depth: false,
        });
        let depth_ops = Some(wgpu::Operations {
            load: if clear.depth {
                wgpu::LoadOp::Clear(ShadowMap::CLEAR_VALUE)
            } else {
                wgpu::LoadOp::Load
            },
            store: wgpu::StoreOp::Store,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("griffith-pass-encoder"),
        });
        {
            let mut pass = match target {
                RenderTarget::Depth(handle) => {
                    let map = &self.shadow_maps[handle.0 as usize];
                    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("shadow-depth-pass"),
                        color_attachments: &[],
                        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                            view: &map.view,
                            depth_ops,
                            stencil_ops: None,
                        }),
                        timestamp_writes: None,
                        occlusion_query_set: None,
                        multiview_mask: None,
                    })
                }
                RenderTarget::Canvas => {
                    let load = match clear.color {
                        Some(color) => wgpu::LoadOp::Clear(to_wgpu_color(color)),
                        None => wgpu::LoadOp::Load,
                    };
                    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("camera-pass"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view: &self.canvas.color_view,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load,
                                store: wgpu::StoreOp::Store,
                            },
                            depth_slice: None,
                        })],
                        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                            view: &self.canvas.depth_view,
                            depth_ops,
                            stencil_ops: None,
                        }),
                        timestamp_writes: None,
                        occlusion_query_set: None,
                        multiview_mask: None,
                    })
                }
            };

            let viewport = clamp_viewport(
                pending
                    .viewport
                    .unwrap_or(Viewport::full(target_width, target_height)),
                target_width,
                target_height,
            );
            pass.set_viewport(
                viewport.x as f32,
                viewport.y as f32,
                viewport.width as f32,
                viewport.height as f32,
                0.0,
                1.0,
            );
            pass.set_bind_group(0, &self.resources.bind_group, &[]);
            if target == RenderTarget::Canvas {
                let shadow_group = pending
                    .shadow_map
                    .and_then(|handle| self.shadow_bind_groups.get(handle.0 as usize))
                    .unwrap_or(&self.fallback_shadow.1);
                pass.set_bind_group(1, shadow_group, &[]);
            }

            for (index, draw) in pending.draws.iter().enumerate() {
                let Some(mesh) = self.meshes.get(draw.mesh) else {
                    continue;
                };
                let pipeline = self
                    .shaded
                    .for_variant(draw.variant)
                    .unwrap_or(&self.depth_pipeline.pipeline);
                pass.set_pipeline(pipeline);
                mesh.bind(&mut pass);
                let instance = index as u32;
                pass.draw_indexed(0..mesh.index_count, 0, instance..instance + 1);
            }
        }

        queue.submit(Some(encoder.finish()));
        self.passes_submitted += 1;
        log::trace!(
            "Submitted {:?} pass with {} draws",
            target,
            pending.draws.len()
        );
        Ok(())
    }
}

impl SceneRenderer for GpuSceneRenderer {
    fn supports_depth_texture(&self) -> bool {
        self.context.supports_depth_texture()
    }

    fn create_depth_texture(&mut self, resolution: u32) -> Result<DepthTextureHandle, RenderError> {
        if !self.supports_depth_texture() {
            return Err(RenderError::DepthTextureUnsupported);
        }
        if resolution == 0 || resolution > self.context.max_texture_dimension() {
            return Err(RenderError::InvalidResolution(resolution));
        }
        let device = &self.context.device;
        let map = ShadowMap::new(device, resolution);
        let group = map.bind_group(device, &self.shadow_layout);
        let handle = DepthTextureHandle(self.shadow_maps.len() as u32);
        self.shadow_maps.push(map);
        self.shadow_bind_groups.push(group);
        log::debug!("Created depth texture {handle:?} at {resolution}x{resolution}");
        Ok(handle)
    }

    fn canvas_size(&self) -> (u32, u32) {
        self.canvas.size()
    }

    fn bind_target(&mut self, target: RenderTarget) -> Result<(), RenderError> {
        if let Some(bound) = self.bound {
            return Err(RenderError::TargetAlreadyBound(bound));
        }
        self.target_size(target)?;
        self.bound = Some(target);
        self.pending = PendingPass::default();
        Ok(())
    }

    fn unbind_target(&mut self) -> Result<(), RenderError> {
        let target = self.bound.take().ok_or(RenderError::NoTargetBound)?;
        let pending = std::mem::take(&mut self.pending);
        self.flush(target, pending)
    }

    fn bound_target(&self) -> Option<RenderTarget> {
        self.bound
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<(), RenderError> {
        self.bound.ok_or(RenderError::NoTargetBound)?;
        self.pending.viewport = Some(viewport);
        Ok(())
    }

    fn clear(&mut self, op: ClearOp) -> Result<(), RenderError> {
        self.bound.ok_or(RenderError::NoTargetBound)?;
        self.pending.clear = Some(op);
        Ok(())
    }

    fn draw(&mut self, frame: &FrameState, call: &DrawCall) -> Result<(), RenderError> {
        let target = self.bound.ok_or(RenderError::NoTargetBound)?;
        let depth_draw = call.variant == ShaderVariant::DepthOnly;
        let depth_target = matches!(target, RenderTarget::Depth(_));
        if depth_draw != depth_target {
            return Err(RenderError::DrawFailed(format!(
                "{:?} draw cannot target {target:?}",
                call.variant
            )));
        }
        if self.pending.globals.is_none() {
            self.pending.globals = Some(GlobalsUniform::from_frame(frame));
            self.pending.shadow_map = frame.shadow_map;
        }
        self.pending
            .instances
            .push(InstanceData::new(call.transform, &call.material));
        self.pending.draws.push(PendingDraw {
            mesh: call.mesh,
            variant: call.variant,
        });
        Ok(())
    }
}

fn to_wgpu_color(color: Color) -> wgpu::Color {
    wgpu::Color {
        r: color.r as f64,
        g: color.g as f64,
        b: color.b as f64,
        a: color.a as f64,
    }
}

/// Keep a viewport inside its target; wgpu rejects out-of-bounds viewports.
fn clamp_viewport(viewport: Viewport, width: u32, height: u32) -> Viewport {
    let x = viewport.x.min(width.saturating_sub(1));
    let y = viewport.y.min(height.saturating_sub(1));
    Viewport {
        x,
        y,
        width: viewport.width.clamp(1, width - x),
        height: viewport.height.clamp(1, height - y),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::light_transform::ShadowSettings;
    use crate::material::Material;
    use crate::renderer::{CameraView, DrawItem, SceneLighting};
    use crate::shadow_pipeline::ShadowPipeline;
    use glam::{Mat4, Vec3, Vec4};
    use griffith_sky::LightDescriptor;

    fn create_test_renderer() -> Option<GpuSceneRenderer> {
        GpuSceneRenderer::new(64, 48).ok()
    }

    #[test]
    fn test_clamp_viewport_inside_target() {
        let vp = clamp_viewport(Viewport::full(4096, 4096), 2048, 2048);
        assert_eq!(vp, Viewport::full(2048, 2048));
        let vp = clamp_viewport(
            Viewport {
                x: 10,
                y: 10,
                width: 0,
                height: 100,
            },
            16,
            16,
        );
        assert_eq!(vp.width, 1);
        assert_eq!(vp.height, 6);
    }

    #[test]
    fn test_color_conversion() {
        let c = to_wgpu_color(Color::rgba(0.5, 0.25, 1.0, 0.0));
        assert_eq!((c.r, c.g, c.b, c.a), (0.5, 0.25, 1.0, 0.0));
    }

    #[test]
    fn test_depth_draw_on_canvas_rejected() {
        let Some(mut renderer) = create_test_renderer() else {
            return;
        };
        renderer.bind_target(RenderTarget::Canvas).unwrap();
        let frame = FrameState {
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            camera_position: Vec3::ZERO,
            lights: Vec::new(),
            light_view_projection: Mat4::IDENTITY,
            shadow_map: None,
        };
        let call = DrawCall {
            mesh: MeshKind::Cube,
            transform: Mat4::IDENTITY,
            material: Material::depth_only(),
            variant: ShaderVariant::DepthOnly,
        };
        assert!(matches!(
            renderer.draw(&frame, &call),
            Err(RenderError::DrawFailed(_))
        ));
        renderer.unbind_target().unwrap();
    }

    #[test]
    fn test_full_shadow_frame_submits_two_passes() {
        let Some(mut renderer) = create_test_renderer() else {
            return;
        };
        if !renderer.supports_depth_texture() {
            return;
        }
        let settings = ShadowSettings {
            resolution: 256,
            ..ShadowSettings::default()
        };
        let mut pipeline = ShadowPipeline::new(&mut renderer, settings).unwrap();
        let scene = vec![
            DrawItem::new(
                MeshKind::Cube,
                Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0)),
                Material::phong(Color::from_hex(0xdbdbdd), 0.5, 0.6, 0.2),
            ),
            DrawItem::new(
                MeshKind::Square,
                Mat4::from_rotation_x(-std::f32::consts::FRAC_PI_2)
                    * Mat4::from_scale(Vec3::new(50.0, 50.0, 1.0)),
                Material::phong(Color::from_hex(0x466d46), 1.0, 1.0, 0.0),
            ),
        ];
        let lighting = SceneLighting {
            clear_color: Color::rgb(0.59, 0.76, 0.94),
            lights: vec![LightDescriptor::point(
                Vec3::new(400.0, 5.0, 215.0),
                Color::WHITE,
                1.0e20,
            )],
        };
        let camera = CameraView::look_at(
            Vec3::new(-35.0, 13.0, -20.0),
            Vec3::new(0.0, 5.0, 25.0),
            std::f32::consts::FRAC_PI_4,
            64.0 / 48.0,
        );
        let stats = pipeline
            .render_frame(
                &mut renderer,
                Vec4::new(400.0, 5.0, 215.0, 1.0),
                &scene,
                &[],
                &camera,
                &lighting,
                true,
            )
            .unwrap();
        assert_eq!(stats.shadow_casters, 2);
        assert_eq!(renderer.passes_submitted(), 2);
        assert_eq!(renderer.bound_target(), None);
    }
}
