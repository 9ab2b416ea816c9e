//! Colors and the generic light descriptor handed to renderers.
//!
//! [`LightDescriptor`] is the CPU-side description; [`LightUniform`] is the
//! GPU-side representation written to a uniform buffer each frame.

use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};

/// Linear RGBA color.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);

    /// Opaque color from RGB components.
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Color from RGBA components.
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from a `0xRRGGBB` literal.
    pub const fn from_hex(hex: u32) -> Self {
        Self::rgb(
            ((hex >> 16) & 0xff) as f32 / 255.0,
            ((hex >> 8) & 0xff) as f32 / 255.0,
            (hex & 0xff) as f32 / 255.0,
        )
    }

    /// Same color with a different alpha.
    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Component-wise linear blend: `self` at `t = 0`, `other` at `t = 1`.
    pub fn mix(self, other: Color, t: f32) -> Color {
        Color::from(self.to_vec4().lerp(other.to_vec4(), t))
    }

    pub fn to_vec4(self) -> Vec4 {
        Vec4::new(self.r, self.g, self.b, self.a)
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Largest per-channel absolute difference, for approximate comparisons.
    pub fn max_difference(self, other: Color) -> f32 {
        (self.to_vec4() - other.to_vec4()).abs().max_element()
    }
}

impl From<Vec4> for Color {
    fn from(v: Vec4) -> Self {
        Self::rgba(v.x, v.y, v.z, v.w)
    }
}

impl From<Vec3> for Color {
    fn from(v: Vec3) -> Self {
        Self::rgb(v.x, v.y, v.z)
    }
}

/// A light as consumed by shading: homogeneous position (`w = 0` directional,
/// `w = 1` point), color, and an attenuation-or-size term.
///
/// A size of `0` turns the light off; very large sizes make it effectively
/// unattenuated.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightDescriptor {
    pub position: Vec4,
    pub color: Color,
    pub attenuation_or_size: f32,
}

impl LightDescriptor {
    /// A point light at `position`.
    pub fn point(position: Vec3, color: Color, size: f32) -> Self {
        Self {
            position: position.extend(1.0),
            color,
            attenuation_or_size: size,
        }
    }

    /// A directional light shining along `-direction_to_light`.
    pub fn directional(direction_to_light: Vec3, color: Color, size: f32) -> Self {
        Self {
            position: direction_to_light.extend(0.0),
            color,
            attenuation_or_size: size,
        }
    }

    pub fn is_directional(&self) -> bool {
        self.position.w == 0.0
    }

    /// Whether this light contributes anything.
    pub fn is_lit(&self) -> bool {
        self.attenuation_or_size > 0.0
    }

    /// Attenuation factor used by Phong shading: `1 / size` for a lit light,
    /// so the daytime [`SUN_RADIUS`](crate::SUN_RADIUS) gives about `1e-20` and
    /// falloff is negligible. A light with size `<= 0` gives infinity.
    pub fn attenuation_factor(&self) -> f32 {
        if self.attenuation_or_size <= 0.0 {
            f32::INFINITY
        } else {
            1.0 / self.attenuation_or_size
        }
    }

    /// Build the GPU-side uniform.
    pub fn to_uniform(&self) -> LightUniform {
        let factor = self.attenuation_factor();
        LightUniform {
            position: self.position.to_array(),
            color: self.color.to_array(),
            // WGSL has no infinity literal; a huge factor blacks the light out.
            attenuation_pad: [if factor.is_finite() { factor } else { 1.0e30 }, 0.0, 0.0, 0.0],
        }
    }
}

/// GPU-side light, 48 bytes, std140-compatible.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct LightUniform {
    /// Homogeneous position or direction.
    pub position: [f32; 4],
    /// Linear RGBA color.
    pub color: [f32; 4],
    /// x = attenuation factor, yzw = padding.
    pub attenuation_pad: [f32; 4],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex_decodes_channels() {
        let c = Color::from_hex(0x466d46);
        assert!((c.r - 70.0 / 255.0).abs() < 1e-6);
        assert!((c.g - 109.0 / 255.0).abs() < 1e-6);
        assert!((c.b - 70.0 / 255.0).abs() < 1e-6);
        assert_eq!(c.a, 1.0);
    }

    #[test]
    fn test_mix_endpoints_and_midpoint() {
        let a = Color::rgb(0.0, 0.2, 0.4);
        let b = Color::rgb(1.0, 0.4, 0.8);
        assert_eq!(a.mix(b, 0.0), a);
        assert!(a.mix(b, 1.0).max_difference(b) < 1e-6);
        assert!(a.mix(b, 0.5).max_difference(Color::rgb(0.5, 0.3, 0.6)) < 1e-6);
    }

    #[test]
    fn test_point_and_directional_w() {
        let p = LightDescriptor::point(Vec3::new(1.0, 2.0, 3.0), Color::WHITE, 9.0);
        let d = LightDescriptor::directional(Vec3::Y, Color::WHITE, 9.0);
        assert_eq!(p.position.w, 1.0);
        assert!(!p.is_directional());
        assert!(d.is_directional());
    }

    #[test]
    fn test_zero_size_light_is_off() {
        let light = LightDescriptor::point(Vec3::ZERO, Color::WHITE, 0.0);
        assert!(!light.is_lit());
        assert!(light.attenuation_factor().is_infinite());
        assert!(light.to_uniform().attenuation_pad[0].is_finite());
    }

    #[test]
    fn test_sun_radius_has_negligible_falloff() {
        let sun = LightDescriptor::point(Vec3::ZERO, Color::WHITE, crate::SUN_RADIUS);
        let factor = sun.attenuation_factor();
        assert!(factor > 0.0);
        assert_eq!(factor, 1.0 / crate::SUN_RADIUS);

        let lamp = LightDescriptor::point(Vec3::ZERO, Color::WHITE, 9.0);
        assert_eq!(lamp.attenuation_factor(), 1.0 / 9.0);
    }

    #[test]
    fn test_uniform_layout() {
        assert_eq!(std::mem::size_of::<LightUniform>(), 48);
        assert_eq!(std::mem::offset_of!(LightUniform, color), 16);
        assert_eq!(std::mem::offset_of!(LightUniform, attenuation_pad), 32);
    }
}
