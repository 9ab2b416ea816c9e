//! Scene rendering: materials, primitive meshes, the two-pass shadow pipeline,
//! and the renderer backends it drives.

pub mod gpu;
pub mod light_transform;
pub mod material;
pub mod mesh;
pub mod recorder;
pub mod renderer;
pub mod shadow_pipeline;

pub use gpu::{GpuContext, GpuError, GpuSceneRenderer, init_headless_blocking};
pub use light_transform::{LIGHT_TARGET, LightTransform, ShadowSettings};
pub use material::{Material, ShaderVariant};
pub use mesh::{MeshData, MeshKind, MeshVertex};
pub use recorder::{RecordedDraw, RecordingRenderer, RenderCommand};
pub use renderer::{
    CameraView, ClearOp, DepthTextureHandle, DrawCall, DrawItem, FrameState, RenderError,
    RenderTarget, SceneLighting, SceneRenderer, Viewport,
};
pub use shadow_pipeline::{
    CanvasPass, DepthPassGuard, FrameStats, ShadowError, ShadowPipeline, ShadowStage,
};
