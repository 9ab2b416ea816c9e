//! Two-pass shadow mapping driven through a [`SceneRenderer`].
//!
//! Every frame walks a fixed sequence of stages:
//!
//! ```text
//! Idle -> LightTransformReady -> DepthTargetBound -> DepthWritten -> CanvasBound -> Idle
//! ```
//!
//! The depth target is held by a [`DepthPassGuard`] and the canvas by a
//! [`CanvasPass`]; both unbind when dropped, so a failed draw never leaves a
//! target bound. Calling a pass in the wrong stage is rejected before the
//! renderer is touched.

use std::ops::{Deref, DerefMut};

use glam::Vec4;

use crate::light_transform::{LightTransform, ShadowSettings};
use crate::material::{Material, ShaderVariant};
use crate::renderer::{
    CameraView, ClearOp, DepthTextureHandle, DrawCall, DrawItem, FrameState, RenderError,
    RenderTarget, SceneLighting, SceneRenderer, Viewport,
};

/// Where the pipeline is within the current frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShadowStage {
    Idle,
    LightTransformReady,
    DepthTargetBound,
    DepthWritten,
    CanvasBound,
}

#[derive(Debug, thiserror::Error)]
pub enum ShadowError {
    /// The backend cannot render into a sampleable depth texture.
    #[error("depth textures are not supported by this renderer; shadows are unavailable")]
    DepthTextureUnsupported,

    #[error("shadow pass out of order: expected {expected:?}, found {found:?}")]
    OutOfOrder {
        expected: ShadowStage,
        found: ShadowStage,
    },

    #[error("renderer error: {0}")]
    Render(#[from] RenderError),
}

/// Draw counts of one completed frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub shadow_casters: usize,
    pub camera_draws: usize,
}

/// Owns the shadow depth texture and sequences the two passes.
#[derive(Debug)]
pub struct ShadowPipeline {
    settings: ShadowSettings,
    depth_texture: DepthTextureHandle,
    stage: ShadowStage,
    light_transform: Option<LightTransform>,
}

impl ShadowPipeline {
    /// Check depth texture support and allocate the shadow map.
    pub fn new<R: SceneRenderer + ?Sized>(
        renderer: &mut R,
        settings: ShadowSettings,
    ) -> Result<Self, ShadowError> {
        if !renderer.supports_depth_texture() {
            log::error!("Renderer lacks depth texture support");
            return Err(ShadowError::DepthTextureUnsupported);
        }
        let depth_texture = renderer
            .create_depth_texture(settings.resolution)
            .map_err(|e| match e {
                RenderError::DepthTextureUnsupported => ShadowError::DepthTextureUnsupported,
                other => ShadowError::Render(other),
            })?;
        log::info!(
            "Shadow map {}x{} allocated ({:?})",
            settings.resolution,
            settings.resolution,
            depth_texture
        );
        Ok(Self {
            settings,
            depth_texture,
            stage: ShadowStage::Idle,
            light_transform: None,
        })
    }

    pub fn stage(&self) -> ShadowStage {
        self.stage
    }

    pub fn settings(&self) -> &ShadowSettings {
        &self.settings
    }

    pub fn depth_texture(&self) -> DepthTextureHandle {
        self.depth_texture
    }

    /// Light transform of the current frame, once computed.
    pub fn light_transform(&self) -> Option<&LightTransform> {
        self.light_transform.as_ref()
    }

    fn expect_stage(&self, expected: ShadowStage) -> Result<(), ShadowError> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(ShadowError::OutOfOrder {
                expected,
                found: self.stage,
            })
        }
    }

    fn abort_frame(&mut self) {
        self.stage = ShadowStage::Idle;
        self.light_transform = None;
    }

    /// Recompute the light matrices. Starts a frame; may be repeated before
    /// the depth pass.
    pub fn compute_light_transform(
        &mut self,
        light_position: Vec4,
    ) -> Result<LightTransform, ShadowError> {
        if self.stage != ShadowStage::LightTransformReady {
            self.expect_stage(ShadowStage::Idle)?;
        }
        let transform = LightTransform::from_light(light_position, &self.settings);
        self.light_transform = Some(transform);
        self.stage = ShadowStage::LightTransformReady;
        Ok(transform)
    }

    /// Draw every shadow caster in `scene` into the depth texture.
    ///
    /// Returns the number of casters drawn.
    pub fn render_depth_pass<R: SceneRenderer + ?Sized>(
        &mut self,
        renderer: &mut R,
        scene: &[DrawItem],
    ) -> Result<usize, ShadowError> {
        self.expect_stage(ShadowStage::LightTransformReady)?;
        let Some(transform) = self.light_transform else {
            return Err(ShadowError::OutOfOrder {
                expected: ShadowStage::LightTransformReady,
                found: ShadowStage::Idle,
            });
        };

        self.stage = ShadowStage::DepthTargetBound;
        match draw_depth_pass(renderer, self.depth_texture, &self.settings, &transform, scene) {
            Ok(drawn) => {
                self.stage = ShadowStage::DepthWritten;
                log::trace!("Depth pass drew {drawn} shadow casters");
                Ok(drawn)
            }
            Err(e) => {
                self.abort_frame();
                Err(e)
            }
        }
    }

    /// Bind the canvas and draw `scene` shaded with the shadow map.
    ///
    /// The returned [`CanvasPass`] keeps the canvas bound so further items
    /// (weather particles) can be drawn; dropping or finishing it ends the frame.
    pub fn render_camera_pass<'a, R: SceneRenderer + ?Sized>(
        &'a mut self,
        renderer: &'a mut R,
        scene: &[DrawItem],
        camera: &CameraView,
        lighting: &SceneLighting,
        is_daytime: bool,
    ) -> Result<CanvasPass<'a, R>, ShadowError> {
        self.expect_stage(ShadowStage::DepthWritten)?;
        let light_view_projection = self
            .light_transform
            .map(|t| t.view_projection)
            .unwrap_or_default();

        if let Err(e) = renderer.bind_target(RenderTarget::Canvas) {
            self.abort_frame();
            return Err(e.into());
        }
        self.stage = ShadowStage::CanvasBound;

        let (width, height) = renderer.canvas_size();
        let frame = FrameState {
            view: camera.view,
            projection: camera.projection,
            camera_position: camera.position,
            lights: lighting.lights.clone(),
            light_view_projection,
            shadow_map: Some(self.depth_texture),
        };
        let mut pass = CanvasPass {
            renderer,
            pipeline: self,
            frame,
            is_daytime,
            draws: 0,
            released: false,
        };
        pass.renderer.set_viewport(Viewport::full(width, height))?;
        pass.renderer
            .clear(ClearOp::color_and_depth(lighting.clear_color))?;
        pass.draw_items(scene)?;
        Ok(pass)
    }

    /// Run all three steps and draw `overlay` after the scene.
    #[allow(clippy::too_many_arguments)]
    pub fn render_frame<R: SceneRenderer + ?Sized>(
        &mut self,
        renderer: &mut R,
        light_position: Vec4,
        scene: &[DrawItem],
        overlay: &[DrawItem],
        camera: &CameraView,
        lighting: &SceneLighting,
        is_daytime: bool,
    ) -> Result<FrameStats, ShadowError> {
        self.compute_light_transform(light_position)?;
        let shadow_casters = self.render_depth_pass(renderer, scene)?;
        let mut pass = self.render_camera_pass(renderer, scene, camera, lighting, is_daytime)?;
        pass.draw_items(overlay)?;
        let camera_draws = pass.finish()?;
        Ok(FrameStats {
            shadow_casters,
            camera_draws,
        })
    }
}

fn draw_depth_pass<R: SceneRenderer + ?Sized>(
    renderer: &mut R,
    depth_texture: DepthTextureHandle,
    settings: &ShadowSettings,
    transform: &LightTransform,
    scene: &[DrawItem],
) -> Result<usize, ShadowError> {
    let frame = FrameState {
        view: transform.view,
        projection: transform.projection,
        camera_position: transform.view.inverse().w_axis.truncate(),
        lights: Vec::new(),
        light_view_projection: transform.view_projection,
        shadow_map: None,
    };

    let mut guard = DepthPassGuard::bind(renderer, depth_texture)?;
    guard.set_viewport(Viewport::full(settings.resolution, settings.resolution))?;
    guard.clear(ClearOp::depth_only())?;

    let mut drawn = 0;
    for item in scene.iter().filter(|item| item.material.casts_shadows) {
        guard.draw(
            &frame,
            &DrawCall {
                mesh: item.mesh,
                transform: item.transform,
                material: Material::depth_only(),
                variant: ShaderVariant::DepthOnly,
            },
        )?;
        drawn += 1;
    }
    guard.finish()?;
    Ok(drawn)
}

/// Keeps a depth texture bound; unbinds on drop.
pub struct DepthPassGuard<'r, R: SceneRenderer + ?Sized> {
    renderer: &'r mut R,
    released: bool,
}

impl<'r, R: SceneRenderer + ?Sized> DepthPassGuard<'r, R> {
    pub fn bind(renderer: &'r mut R, texture: DepthTextureHandle) -> Result<Self, RenderError> {
        renderer.bind_target(RenderTarget::Depth(texture))?;
        Ok(Self {
            renderer,
            released: false,
        })
    }

    /// Unbind now and report any backend error.
    pub fn finish(mut self) -> Result<(), RenderError> {
        self.released = true;
        self.renderer.unbind_target()
    }
}

impl<R: SceneRenderer + ?Sized> Deref for DepthPassGuard<'_, R> {
    type Target = R;

    fn deref(&self) -> &R {
        self.renderer
    }
}

impl<R: SceneRenderer + ?Sized> DerefMut for DepthPassGuard<'_, R> {
    fn deref_mut(&mut self) -> &mut R {
        self.renderer
    }
}

impl<R: SceneRenderer + ?Sized> Drop for DepthPassGuard<'_, R> {
    fn drop(&mut self) {
        if !self.released
            && let Err(e) = self.renderer.unbind_target()
        {
            log::warn!("Failed to release depth target: {e}");
        }
    }
}

/// The bound canvas of the camera pass. Unbinds and returns the pipeline to
/// [`ShadowStage::Idle`] on [`finish`](Self::finish) or drop.
pub struct CanvasPass<'a, R: SceneRenderer + ?Sized> {
    renderer: &'a mut R,
    pipeline: &'a mut ShadowPipeline,
    frame: FrameState,
    is_daytime: bool,
    draws: usize,
    released: bool,
}

impl<R: SceneRenderer + ?Sized> CanvasPass<'_, R> {
    pub fn frame(&self) -> &FrameState {
        &self.frame
    }

    /// Draws issued so far in this pass.
    pub fn draw_count(&self) -> usize {
        self.draws
    }

    /// Draw items shaded with the variant their material selects.
    pub fn draw_items(&mut self, items: &[DrawItem]) -> Result<usize, ShadowError> {
        for item in items {
            let call = DrawCall {
                mesh: item.mesh,
                transform: item.transform,
                material: item.material,
                variant: item.material.camera_variant(self.is_daytime),
            };
            self.renderer.draw(&self.frame, &call)?;
            self.draws += 1;
        }
        Ok(items.len())
    }

    /// Unbind the canvas. Returns the total draws of the pass.
    pub fn finish(mut self) -> Result<usize, ShadowError> {
        self.released = true;
        self.pipeline.stage = ShadowStage::Idle;
        self.pipeline.light_transform = None;
        self.renderer.unbind_target()?;
        Ok(self.draws)
    }
}

impl<R: SceneRenderer + ?Sized> Drop for CanvasPass<'_, R> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.pipeline.stage = ShadowStage::Idle;
        self.pipeline.light_transform = None;
        if let Err(e) = self.renderer.unbind_target() {
            log::warn!("Failed to release canvas: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::MeshKind;
    use crate::recorder::{RecordingRenderer, RenderCommand};
    use glam::{Mat4, Vec3};
    use griffith_sky::Color;

    fn scene() -> Vec<DrawItem> {
        let concrete = Material::phong(Color::from_hex(0xdbdbdd), 1.0, 1.0, 0.0);
        vec![
            DrawItem::new(
                MeshKind::Square,
                Mat4::from_scale(Vec3::new(1000.0, 1000.0, 1.0)),
                Material::phong(Color::from_hex(0x466d46), 1.0, 1.0, 0.0),
            ),
            DrawItem::new(MeshKind::Cube, Mat4::from_translation(Vec3::new(0.0, 3.0, 0.0)), concrete),
            DrawItem::new(
                MeshKind::Sphere,
                Mat4::from_translation(Vec3::new(0.0, 9.0, 0.0)),
                concrete.without_shadow_receiving(),
            ),
            DrawItem::new(
                MeshKind::Sphere,
                Mat4::from_translation(Vec3::new(400.0, 5.0, 215.0)),
                Material::unlit(Color::from_hex(0xfcba03)),
            ),
        ]
    }

    fn camera() -> CameraView {
        CameraView::look_at(Vec3::new(-35.0, 13.0, -20.0), Vec3::new(0.0, 5.0, 25.0), 0.78, 1.8)
    }

    fn lighting() -> SceneLighting {
        SceneLighting {
            clear_color: Color::rgb(0.59, 0.76, 0.94),
            lights: Vec::new(),
        }
    }

    const LIGHT: Vec4 = Vec4::new(400.0, 5.0, 215.0, 1.0);

    #[test]
    fn test_unsupported_depth_texture_is_fatal() {
        let mut renderer = RecordingRenderer::new(1080, 600).without_depth_textures();
        let err = ShadowPipeline::new(&mut renderer, ShadowSettings::default()).unwrap_err();
        assert!(matches!(err, ShadowError::DepthTextureUnsupported));
        assert!(renderer.commands().is_empty());
    }

    #[test]
    fn test_depth_texture_created_once() {
        let mut renderer = RecordingRenderer::new(1080, 600);
        let mut pipeline = ShadowPipeline::new(&mut renderer, ShadowSettings::default()).unwrap();
        for _ in 0..3 {
            pipeline
                .render_frame(&mut renderer, LIGHT, &scene(), &[], &camera(), &lighting(), true)
                .unwrap();
        }
        let creations = renderer
            .commands()
            .iter()
            .filter(|c| matches!(c, RenderCommand::CreateDepthTexture { .. }))
            .count();
        assert_eq!(creations, 1);
    }

    #[test]
    fn test_depth_pass_matches_camera_pass_casters() {
        let mut renderer = RecordingRenderer::new(1080, 600);
        let mut pipeline = ShadowPipeline::new(&mut renderer, ShadowSettings::default()).unwrap();
        let scene = scene();
        let stats = pipeline
            .render_frame(&mut renderer, LIGHT, &scene, &[], &camera(), &lighting(), true)
            .unwrap();
        assert_eq!(stats.shadow_casters, 3);
        assert_eq!(stats.camera_draws, 4);

        let depth = RenderTarget::Depth(pipeline.depth_texture());
        let depth_transforms: Vec<_> = renderer.draws_on(depth).map(|d| d.transform).collect();
        let caster_transforms: Vec<_> = renderer
            .draws_on(RenderTarget::Canvas)
            .filter(|d| d.material.casts_shadows)
            .map(|d| d.transform)
            .collect();
        assert_eq!(depth_transforms, caster_transforms);
        assert!(
            renderer
                .draws_on(depth)
                .all(|d| d.variant == ShaderVariant::DepthOnly)
        );
    }

    #[test]
    fn test_variants_follow_daytime() {
        for (is_day, expected) in [(true, ShaderVariant::Shadowed), (false, ShaderVariant::Phong)] {
            let mut renderer = RecordingRenderer::new(1080, 600);
            let mut pipeline = ShadowPipeline::new(&mut renderer, ShadowSettings::default()).unwrap();
            pipeline
                .render_frame(&mut renderer, LIGHT, &scene(), &[], &camera(), &lighting(), is_day)
                .unwrap();
            let variants: Vec<_> = renderer
                .draws_on(RenderTarget::Canvas)
                .map(|d| d.variant)
                .collect();
            assert_eq!(
                variants,
                vec![expected, expected, ShaderVariant::Phong, ShaderVariant::Unlit]
            );
        }
    }

    #[test]
    fn test_pass_sequence() {
        let mut renderer = RecordingRenderer::new(1080, 600);
        let mut pipeline = ShadowPipeline::new(&mut renderer, ShadowSettings::default()).unwrap();
        renderer.clear_commands();
        pipeline
            .render_frame(&mut renderer, LIGHT, &scene(), &[], &camera(), &lighting(), true)
            .unwrap();
        let depth = RenderTarget::Depth(pipeline.depth_texture());
        let commands = renderer.commands();
        assert_eq!(commands[0], RenderCommand::Bind(depth));
        assert_eq!(commands[1], RenderCommand::SetViewport(Viewport::full(2048, 2048)));
        assert_eq!(commands[2], RenderCommand::Clear(ClearOp::depth_only()));
        let unbind_depth = commands
            .iter()
            .position(|c| *c == RenderCommand::Unbind(depth))
            .unwrap();
        let bind_canvas = commands
            .iter()
            .position(|c| *c == RenderCommand::Bind(RenderTarget::Canvas))
            .unwrap();
        assert!(unbind_depth < bind_canvas);
        assert_eq!(
            commands[bind_canvas + 1],
            RenderCommand::SetViewport(Viewport::full(1080, 600))
        );
        assert_eq!(
            commands.last(),
            Some(&RenderCommand::Unbind(RenderTarget::Canvas))
        );
        assert_eq!(pipeline.stage(), ShadowStage::Idle);
    }

    #[test]
    fn test_out_of_order_calls_rejected() {
        let mut renderer = RecordingRenderer::new(1080, 600);
        let mut pipeline = ShadowPipeline::new(&mut renderer, ShadowSettings::default()).unwrap();
        renderer.clear_commands();

        let err = pipeline.render_depth_pass(&mut renderer, &scene()).unwrap_err();
        assert!(matches!(
            err,
            ShadowError::OutOfOrder {
                expected: ShadowStage::LightTransformReady,
                found: ShadowStage::Idle
            }
        ));

        let err = pipeline
            .render_camera_pass(&mut renderer, &scene(), &camera(), &lighting(), true)
            .err()
            .unwrap();
        assert!(matches!(
            err,
            ShadowError::OutOfOrder {
                expected: ShadowStage::DepthWritten,
                found: ShadowStage::Idle
            }
        ));

        pipeline.compute_light_transform(LIGHT).unwrap();
        pipeline.render_depth_pass(&mut renderer, &scene()).unwrap();
        let before = renderer.commands().len();
        let err = pipeline.compute_light_transform(LIGHT).unwrap_err();
        assert!(matches!(
            err,
            ShadowError::OutOfOrder {
                expected: ShadowStage::Idle,
                found: ShadowStage::DepthWritten
            }
        ));
        assert_eq!(renderer.commands().len(), before);
    }

    #[test]
    fn test_depth_target_released_when_draw_fails() {
        let mut renderer = RecordingRenderer::new(1080, 600).fail_draw_at(1);
        let mut pipeline = ShadowPipeline::new(&mut renderer, ShadowSettings::default()).unwrap();
        pipeline.compute_light_transform(LIGHT).unwrap();
        let err = pipeline.render_depth_pass(&mut renderer, &scene()).unwrap_err();
        assert!(matches!(err, ShadowError::Render(RenderError::DrawFailed(_))));
        assert_eq!(renderer.bound_target(), None);
        assert_eq!(
            renderer.commands().last(),
            Some(&RenderCommand::Unbind(RenderTarget::Depth(pipeline.depth_texture())))
        );
        assert_eq!(pipeline.stage(), ShadowStage::Idle);
    }

    #[test]
    fn test_dropped_canvas_pass_returns_to_idle() {
        let mut renderer = RecordingRenderer::new(1080, 600);
        let mut pipeline = ShadowPipeline::new(&mut renderer, ShadowSettings::default()).unwrap();
        pipeline.compute_light_transform(LIGHT).unwrap();
        pipeline.render_depth_pass(&mut renderer, &scene()).unwrap();
        {
            let pass = pipeline
                .render_camera_pass(&mut renderer, &scene(), &camera(), &lighting(), false)
                .unwrap();
            assert_eq!(pass.draw_count(), 4);
            assert!(pass.frame().shadow_map.is_some());
        }
        assert_eq!(pipeline.stage(), ShadowStage::Idle);
        assert_eq!(renderer.bound_target(), None);
    }

    #[test]
    fn test_overlay_is_not_shadow_cast() {
        let mut renderer = RecordingRenderer::new(1080, 600);
        let mut pipeline = ShadowPipeline::new(&mut renderer, ShadowSettings::default()).unwrap();
        let drop = DrawItem::new(
            MeshKind::Cube,
            Mat4::from_translation(Vec3::new(1.0, 20.0, 1.0)),
            Material::phong(Color::rgb(0.6, 0.7, 0.9), 0.6, 0.4, 0.2),
        );
        let stats = pipeline
            .render_frame(&mut renderer, LIGHT, &scene(), &[drop], &camera(), &lighting(), true)
            .unwrap();
        assert_eq!(stats.shadow_casters, 3);
        assert_eq!(stats.camera_draws, 5);
    }

    #[test]
    fn test_light_transform_recomputed_each_frame() {
        let mut renderer = RecordingRenderer::new(1080, 600);
        let mut pipeline = ShadowPipeline::new(&mut renderer, ShadowSettings::default()).unwrap();
        let a = pipeline.compute_light_transform(LIGHT).unwrap();
        let b = pipeline
            .compute_light_transform(Vec4::new(200.0, 205.0, 350.0, 1.0))
            .unwrap();
        assert_ne!(a.view, b.view);
        assert_eq!(pipeline.light_transform(), Some(&b));
    }
}
