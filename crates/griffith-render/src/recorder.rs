//! A [`SceneRenderer`] that records calls instead of drawing.
//!
//! Used for headless runs and to assert on pass ordering in tests. It applies
//! the same binding rules as the GPU backend.

use glam::Mat4;

use crate::material::{Material, ShaderVariant};
use crate::mesh::MeshKind;
use crate::renderer::{
    ClearOp, DepthTextureHandle, DrawCall, FrameState, RenderError, RenderTarget, SceneRenderer,
    Viewport,
};

/// A draw as seen by the recorder.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedDraw {
    pub target: RenderTarget,
    pub mesh: MeshKind,
    pub transform: Mat4,
    pub material: Material,
    pub variant: ShaderVariant,
    pub view_projection: Mat4,
    pub shadow_map: Option<DepthTextureHandle>,
    pub light_count: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RenderCommand {
    CreateDepthTexture {
        handle: DepthTextureHandle,
        resolution: u32,
    },
    Bind(RenderTarget),
    Unbind(RenderTarget),
    SetViewport(Viewport),
    Clear(ClearOp),
    Draw(RecordedDraw),
}

#[derive(Debug)]
pub struct RecordingRenderer {
    canvas: (u32, u32),
    depth_supported: bool,
    depth_textures: Vec<u32>,
    bound: Option<RenderTarget>,
    commands: Vec<RenderCommand>,
    fail_draw_at: Option<usize>,
    draws_attempted: usize,
    frames_completed: usize,
}

impl RecordingRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            canvas: (width.max(1), height.max(1)),
            depth_supported: true,
            depth_textures: Vec::new(),
            bound: None,
            commands: Vec::new(),
            fail_draw_at: None,
            draws_attempted: 0,
            frames_completed: 0,
        }
    }

    /// Report no depth texture support.
    pub fn without_depth_textures(mut self) -> Self {
        self.depth_supported = false;
        self
    }

    /// Make the `index`-th draw (zero-based, counted across the recorder's
    /// lifetime) fail.
    pub fn fail_draw_at(mut self, index: usize) -> Self {
        self.fail_draw_at = Some(index);
        self
    }

    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<RenderCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Number of times the canvas was unbound.
    pub fn frames_completed(&self) -> usize {
        self.frames_completed
    }

    /// Draws recorded against `target`, in issue order.
    pub fn draws_on(&self, target: RenderTarget) -> impl Iterator<Item = &RecordedDraw> {
        self.commands.iter().filter_map(move |c| match c {
            RenderCommand::Draw(draw) if draw.target == target => Some(draw),
            _ => None,
        })
    }

    fn require_bound(&self) -> Result<RenderTarget, RenderError> {
        self.bound.ok_or(RenderError::NoTargetBound)
    }
}

impl SceneRenderer for RecordingRenderer {
    fn supports_depth_texture(&self) -> bool {
        self.depth_supported
    }

    fn create_depth_texture(&mut self, resolution: u32) -> Result<DepthTextureHandle, RenderError> {
        if !self.depth_supported {
            return Err(RenderError::DepthTextureUnsupported);
        }
        if resolution == 0 {
            return Err(RenderError::InvalidResolution(resolution));
        }
        let handle = DepthTextureHandle(self.depth_textures.len() as u32);
        self.depth_textures.push(resolution);
        self.commands
            .push(RenderCommand::CreateDepthTexture { handle, resolution });
        Ok(handle)
    }

    fn canvas_size(&self) -> (u32, u32) {
        self.canvas
    }

    fn bind_target(&mut self, target: RenderTarget) -> Result<(), RenderError> {
        if let Some(bound) = self.bound {
            return Err(RenderError::TargetAlreadyBound(bound));
        }
        if let RenderTarget::Depth(handle) = target
            && handle.0 as usize >= self.depth_textures.len()
        {
            return Err(RenderError::UnknownDepthTexture(handle));
        }
        self.bound = Some(target);
        self.commands.push(RenderCommand::Bind(target));
        Ok(())
    }

    fn unbind_target(&mut self) -> Result<(), RenderError> {
        let target = self.bound.take().ok_or(RenderError::NoTargetBound)?;
        if target == RenderTarget::Canvas {
            self.frames_completed += 1;
        }
        self.commands.push(RenderCommand::Unbind(target));
        Ok(())
    }

    fn bound_target(&self) -> Option<RenderTarget> {
        self.bound
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<(), RenderError> {
        self.require_bound()?;
        self.commands.push(RenderCommand::SetViewport(viewport));
        Ok(())
    }

    fn clear(&mut self, op: ClearOp) -> Result<(), RenderError> {
        self.require_bound()?;
        self.commands.push(RenderCommand::Clear(op));
        Ok(())
    }

    fn draw(&mut self, frame: &FrameState, call: &DrawCall) -> Result<(), RenderError> {
        let target = self.require_bound()?;
        let index = self.draws_attempted;
        self.draws_attempted += 1;
        if self.fail_draw_at == Some(index) {
            return Err(RenderError::DrawFailed(format!(
                "injected failure at draw {index}"
            )));
        }
        self.commands.push(RenderCommand::Draw(RecordedDraw {
            target,
            mesh: call.mesh,
            transform: call.transform,
            material: call.material,
            variant: call.variant,
            view_projection: frame.view_projection(),
            shadow_map: frame.shadow_map,
            light_count: frame.lights.len(),
        }));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn frame() -> FrameState {
        FrameState {
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            camera_position: Vec3::ZERO,
            lights: Vec::new(),
            light_view_projection: Mat4::IDENTITY,
            shadow_map: None,
        }
    }

    fn call() -> DrawCall {
        DrawCall {
            mesh: MeshKind::Cube,
            transform: Mat4::IDENTITY,
            material: Material::depth_only(),
            variant: ShaderVariant::DepthOnly,
        }
    }

    #[test]
    fn test_draw_without_target_fails() {
        let mut r = RecordingRenderer::new(4, 4);
        assert!(matches!(
            r.draw(&frame(), &call()),
            Err(RenderError::NoTargetBound)
        ));
    }

    #[test]
    fn test_double_bind_rejected() {
        let mut r = RecordingRenderer::new(4, 4);
        r.bind_target(RenderTarget::Canvas).unwrap();
        assert!(matches!(
            r.bind_target(RenderTarget::Canvas),
            Err(RenderError::TargetAlreadyBound(RenderTarget::Canvas))
        ));
    }

    #[test]
    fn test_unknown_depth_texture_rejected() {
        let mut r = RecordingRenderer::new(4, 4);
        assert!(matches!(
            r.bind_target(RenderTarget::Depth(DepthTextureHandle(3))),
            Err(RenderError::UnknownDepthTexture(DepthTextureHandle(3)))
        ));
    }

    #[test]
    fn test_canvas_unbind_counts_frames() {
        let mut r = RecordingRenderer::new(4, 4);
        let handle = r.create_depth_texture(16).unwrap();
        r.bind_target(RenderTarget::Depth(handle)).unwrap();
        r.unbind_target().unwrap();
        r.bind_target(RenderTarget::Canvas).unwrap();
        r.draw(&frame(), &call()).unwrap();
        r.unbind_target().unwrap();
        assert_eq!(r.frames_completed(), 1);
        assert_eq!(r.draws_on(RenderTarget::Canvas).count(), 1);
        assert_eq!(r.draws_on(RenderTarget::Depth(handle)).count(), 0);
    }

    #[test]
    fn test_injected_failure_is_not_recorded() {
        let mut r = RecordingRenderer::new(4, 4).fail_draw_at(0);
        r.bind_target(RenderTarget::Canvas).unwrap();
        assert!(r.draw(&frame(), &call()).is_err());
        r.draw(&frame(), &call()).unwrap();
        assert_eq!(r.draws_on(RenderTarget::Canvas).count(), 1);
    }
}
