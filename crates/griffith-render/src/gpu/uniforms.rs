//! GPU-side layouts of the per-pass globals and per-draw instances.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use griffith_sky::LightUniform;

use crate::material::Material;
use crate::renderer::FrameState;

/// Lights beyond this count are ignored by the shaders.
pub const MAX_LIGHTS: usize = 16;

/// Per-pass globals, 928 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct GlobalsUniform {
    pub view_proj: [f32; 16],
    pub light_view_proj: [f32; 16],
    pub camera_position: [f32; 4],
    /// x = active light count, yzw = padding.
    pub light_count: [u32; 4],
    pub lights: [LightUniform; MAX_LIGHTS],
}

static_assertions::assert_eq_size!(GlobalsUniform, [u8; 928]);

impl GlobalsUniform {
    pub fn from_frame(frame: &FrameState) -> Self {
        let mut lights = [LightUniform::zeroed(); MAX_LIGHTS];
        let count = frame.lights.len().min(MAX_LIGHTS);
        if frame.lights.len() > MAX_LIGHTS {
            log::warn!(
                "{} lights supplied, only the first {MAX_LIGHTS} are shaded",
                frame.lights.len()
            );
        }
        for (slot, light) in lights.iter_mut().zip(&frame.lights) {
            *slot = light.to_uniform();
        }
        Self {
            view_proj: frame.view_projection().to_cols_array(),
            light_view_proj: frame.light_view_projection.to_cols_array(),
            camera_position: frame.camera_position.extend(1.0).to_array(),
            light_count: [count as u32, 0, 0, 0],
            lights,
        }
    }
}

/// Per-draw data in the instance storage buffer, 160 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct InstanceData {
    pub model: [f32; 16],
    pub normal_matrix: [f32; 16],
    pub color: [f32; 4],
    /// x = ambient, y = diffusivity, z = specularity, w = smoothness.
    pub params: [f32; 4],
}

static_assertions::assert_eq_size!(InstanceData, [u8; 160]);

impl InstanceData {
    pub fn new(model: Mat4, material: &Material) -> Self {
        let uniform = material.to_uniform();
        Self {
            model: model.to_cols_array(),
            normal_matrix: normal_matrix(model).to_cols_array(),
            color: uniform.color,
            params: uniform.params,
        }
    }
}

/// Inverse-transpose of `model`, or identity for a degenerate transform.
fn normal_matrix(model: Mat4) -> Mat4 {
    if model.determinant().abs() < 1e-12 {
        Mat4::IDENTITY
    } else {
        model.inverse().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec3, Vec4};
    use griffith_sky::{Color, LightDescriptor};

    #[test]
    fn test_globals_light_count_is_capped() {
        let light = LightDescriptor::point(Vec3::ZERO, Color::WHITE, 9.0);
        let frame = FrameState {
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            camera_position: Vec3::ONE,
            lights: vec![light; 20],
            light_view_projection: Mat4::IDENTITY,
            shadow_map: None,
        };
        let globals = GlobalsUniform::from_frame(&frame);
        assert_eq!(globals.light_count[0], MAX_LIGHTS as u32);
        assert_eq!(globals.camera_position, [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_normal_matrix_undoes_nonuniform_scale() {
        let model = Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));
        let n = normal_matrix(model);
        let normal = n * Vec4::new(1.0, 1.0, 0.0, 0.0);
        assert!((normal.x - 0.5).abs() < 1e-6);
        assert!((normal.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_model_uses_identity_normals() {
        assert_eq!(normal_matrix(Mat4::from_scale(Vec3::ZERO)), Mat4::IDENTITY);
    }
}
