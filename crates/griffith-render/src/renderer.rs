//! The mesh-drawing seam between scene logic and a rendering backend.
//!
//! Scene code only ever talks to a [`SceneRenderer`]. The wgpu backend lives in
//! [`crate::gpu`]; [`crate::recorder::RecordingRenderer`] captures the same
//! calls for headless runs and tests.

use glam::{Mat4, Vec3};
use griffith_sky::{Color, LightDescriptor};

use crate::material::{Material, ShaderVariant};
use crate::mesh::MeshKind;

/// Failures reported by a rendering backend.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("a render target is already bound ({0:?})")]
    TargetAlreadyBound(RenderTarget),

    #[error("no render target is bound")]
    NoTargetBound,

    #[error("unknown depth texture {0:?}")]
    UnknownDepthTexture(DepthTextureHandle),

    #[error("depth textures are not supported by this backend")]
    DepthTextureUnsupported,

    #[error("invalid depth texture resolution {0}")]
    InvalidResolution(u32),

    #[error("draw rejected: {0}")]
    DrawFailed(String),
}

/// Opaque handle to a depth texture owned by the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DepthTextureHandle(pub u32);

/// Where draws land.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RenderTarget {
    /// The visible color canvas and its depth buffer.
    Canvas,
    /// A depth-only texture.
    Depth(DepthTextureHandle),
}

/// Pixel rectangle draws are mapped to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width.max(1) as f32 / self.height.max(1) as f32
    }
}

/// What a clear resets.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClearOp {
    pub color: Option<Color>,
    pub depth: bool,
}

impl ClearOp {
    pub fn depth_only() -> Self {
        Self {
            color: None,
            depth: true,
        }
    }

    pub fn color_and_depth(color: Color) -> Self {
        Self {
            color: Some(color),
            depth: true,
        }
    }
}

/// Per-pass state shared by every draw in it.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameState {
    pub view: Mat4,
    pub projection: Mat4,
    pub camera_position: Vec3,
    pub lights: Vec<LightDescriptor>,
    /// Light view-projection used for shadow lookups.
    pub light_view_projection: Mat4,
    /// Depth texture sampled by [`ShaderVariant::Shadowed`] draws.
    pub shadow_map: Option<DepthTextureHandle>,
}

impl FrameState {
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }
}

/// A camera as the renderer sees it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraView {
    pub view: Mat4,
    pub projection: Mat4,
    pub position: Vec3,
}

impl CameraView {
    pub const NEAR: f32 = 0.1;
    pub const FAR: f32 = 1000.0;

    /// Perspective camera looking from `eye` at `target`.
    pub fn look_at(eye: Vec3, target: Vec3, fov_y_radians: f32, aspect: f32) -> Self {
        Self::from_view(
            Mat4::look_at_rh(eye, target, Vec3::Y),
            eye,
            fov_y_radians,
            aspect,
        )
    }

    /// Perspective camera with an explicit world-to-view matrix.
    pub fn from_view(view: Mat4, position: Vec3, fov_y_radians: f32, aspect: f32) -> Self {
        Self {
            view,
            projection: Mat4::perspective_rh(fov_y_radians, aspect, Self::NEAR, Self::FAR),
            position,
        }
    }
}

/// One piece of scene geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawItem {
    pub mesh: MeshKind,
    pub transform: Mat4,
    pub material: Material,
}

impl DrawItem {
    pub fn new(mesh: MeshKind, transform: Mat4, material: Material) -> Self {
        Self {
            mesh,
            transform,
            material,
        }
    }
}

/// A fully resolved draw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawCall {
    pub mesh: MeshKind,
    pub transform: Mat4,
    pub material: Material,
    pub variant: ShaderVariant,
}

/// Lights and sky tint for the camera pass.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneLighting {
    pub clear_color: Color,
    pub lights: Vec<LightDescriptor>,
}

/// A backend able to draw primitive meshes into a canvas or a depth texture.
pub trait SceneRenderer {
    /// Whether a depth texture can be both rendered to and sampled.
    fn supports_depth_texture(&self) -> bool;

    /// Allocate a square depth texture.
    fn create_depth_texture(&mut self, resolution: u32) -> Result<DepthTextureHandle, RenderError>;

    /// Canvas size in pixels.
    fn canvas_size(&self) -> (u32, u32);

    fn bind_target(&mut self, target: RenderTarget) -> Result<(), RenderError>;

    /// Finish the bound target. Backends may flush work here.
    fn unbind_target(&mut self) -> Result<(), RenderError>;

    fn bound_target(&self) -> Option<RenderTarget>;

    fn set_viewport(&mut self, viewport: Viewport) -> Result<(), RenderError>;

    fn clear(&mut self, op: ClearOp) -> Result<(), RenderError>;

    fn draw(&mut self, frame: &FrameState, call: &DrawCall) -> Result<(), RenderError>;
}
