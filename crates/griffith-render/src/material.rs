//! Surface materials and the shader variant each one resolves to per pass.

use bytemuck::{Pod, Zeroable};
use griffith_sky::Color;

/// Shader program a draw is issued with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderVariant {
    /// Phong shading plus a shadow-map lookup.
    Shadowed,
    /// Plain Phong shading.
    Phong,
    /// Depth writes only, used while rendering from the light.
    DepthOnly,
    /// Flat color, no lighting.
    Unlit,
}

/// Phong material parameters plus shadow participation flags.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    pub color: Color,
    pub ambient: f32,
    pub diffusivity: f32,
    pub specularity: f32,
    pub smoothness: f32,
    /// Drawn into the shadow map.
    pub casts_shadows: bool,
    /// Samples the shadow map in the camera pass.
    pub supports_shadows: bool,
    /// Ignores lights entirely.
    pub unlit: bool,
}

impl Material {
    pub const DEFAULT_SMOOTHNESS: f32 = 40.0;

    /// Shadow-casting, shadow-receiving Phong material.
    pub fn phong(color: Color, ambient: f32, diffusivity: f32, specularity: f32) -> Self {
        Self {
            color,
            ambient,
            diffusivity,
            specularity,
            smoothness: Self::DEFAULT_SMOOTHNESS,
            casts_shadows: true,
            supports_shadows: true,
            unlit: false,
        }
    }

    /// Flat-colored material that neither casts nor receives shadows.
    pub fn unlit(color: Color) -> Self {
        Self {
            color,
            ambient: 1.0,
            diffusivity: 0.0,
            specularity: 0.0,
            smoothness: Self::DEFAULT_SMOOTHNESS,
            casts_shadows: false,
            supports_shadows: false,
            unlit: true,
        }
    }

    /// Replacement material for the light's depth pass.
    pub fn depth_only() -> Self {
        Self {
            color: Color::BLACK,
            ambient: 0.0,
            diffusivity: 0.0,
            specularity: 0.0,
            smoothness: 0.0,
            casts_shadows: true,
            supports_shadows: false,
            unlit: true,
        }
    }

    pub fn with_smoothness(mut self, smoothness: f32) -> Self {
        self.smoothness = smoothness;
        self
    }

    /// Keep the material out of the shadow map.
    pub fn without_shadow_casting(mut self) -> Self {
        self.casts_shadows = false;
        self
    }

    /// Shade without sampling the shadow map.
    pub fn without_shadow_receiving(mut self) -> Self {
        self.supports_shadows = false;
        self
    }

    /// Variant used in the camera pass.
    pub fn camera_variant(&self, is_daytime: bool) -> ShaderVariant {
        if self.unlit {
            ShaderVariant::Unlit
        } else if self.supports_shadows && is_daytime {
            ShaderVariant::Shadowed
        } else {
            ShaderVariant::Phong
        }
    }

    pub fn to_uniform(&self) -> MaterialUniform {
        MaterialUniform {
            color: self.color.to_array(),
            params: [
                self.ambient,
                self.diffusivity,
                self.specularity,
                self.smoothness,
            ],
        }
    }
}

/// GPU-side material, 32 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct MaterialUniform {
    pub color: [f32; 4],
    /// x = ambient, y = diffusivity, z = specularity, w = smoothness.
    pub params: [f32; 4],
}

static_assertions::assert_eq_size!(MaterialUniform, [u8; 32]);
