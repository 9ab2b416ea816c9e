//! wgpu backend: headless device, offscreen canvas, shadow maps and pipelines.

pub mod canvas;
pub mod context;
pub mod depth_pipeline;
pub mod mesh;
pub mod renderer;
pub mod shaded_pipeline;
pub mod shader;
pub mod shadow_map;
pub mod uniforms;

pub use canvas::OffscreenCanvas;
pub use context::{GpuContext, GpuError, init_headless_blocking};
pub use renderer::GpuSceneRenderer;
pub use shader::SCENE_SHADER_SOURCE;
pub use shadow_map::ShadowMap;
pub use uniforms::{GlobalsUniform, InstanceData, MAX_LIGHTS};
