//! View and projection used to render the scene from the light.

use glam::{Mat4, Vec3, Vec4};

/// Shadow map resolution and the light's perspective frustum.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowSettings {
    /// Width and height of the square depth texture.
    pub resolution: u32,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            resolution: 2048,
            fov_degrees: 130.0,
            near: 0.5,
            far: 500.0,
        }
    }
}

/// The light always looks at the scene origin.
pub const LIGHT_TARGET: Vec3 = Vec3::ZERO;

/// Light-space matrices for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightTransform {
    pub view: Mat4,
    pub projection: Mat4,
    pub view_projection: Mat4,
}

impl LightTransform {
    /// Look from `light_position` toward [`LIGHT_TARGET`].
    ///
    /// Uses +Y as up unless the light sits nearly straight above or below the
    /// target, where +Z is used instead. A light at the target itself is moved
    /// one unit up so the view stays well-formed.
    pub fn from_light(light_position: Vec4, settings: &ShadowSettings) -> Self {
        let mut eye = light_position.truncate();
        if (eye - LIGHT_TARGET).length_squared() < 1e-8 {
            eye = LIGHT_TARGET + Vec3::Y;
        }
        let forward = (LIGHT_TARGET - eye).normalize();
        let up = if forward.dot(Vec3::Y).abs() > 0.999 {
            Vec3::Z
        } else {
            Vec3::Y
        };

        let view = Mat4::look_at_rh(eye, LIGHT_TARGET, up);
        let projection = Mat4::perspective_rh(
            settings.fov_degrees.to_radians(),
            1.0,
            settings.near,
            settings.far,
        );
        Self {
            view,
            projection,
            view_projection: projection * view,
        }
    }

    /// Project a world point into light clip space and divide by w.
    pub fn project(&self, world: Vec3) -> Vec3 {
        self.view_projection.project_point3(world)
    }
}
