//! Weather particle bodies.
//!
//! A particle keeps its current and previous state so the renderer can
//! interpolate between fixed simulation ticks with [`Particle::blend`].

use glam::{Mat4, Vec3};

/// Uniform scale applied to every particle on top of its per-axis size.
pub const DROP_SIZE: f32 = 0.05;

/// Kind of weather a particle belongs to. Selects spawn rules and physics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParticleKind {
    Rain,
    Snow,
    Fog,
}

impl ParticleKind {
    pub const ALL: [ParticleKind; 3] =
        [ParticleKind::Rain, ParticleKind::Snow, ParticleKind::Fog];

    /// Pool size above which this kind stops spawning.
    pub fn cap(self) -> usize {
        match self {
            ParticleKind::Rain | ParticleKind::Snow => 1000,
            ParticleKind::Fog => 500,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ParticleKind::Rain => "rain",
            ParticleKind::Snow => "snow",
            ParticleKind::Fog => "fog",
        }
    }
}

/// A single simulated weather body.
#[derive(Debug, Clone)]
pub struct Particle {
    pub position: Vec3,
    pub previous_position: Vec3,
    /// Rotation only; never carries translation.
    pub orientation: Mat4,
    pub previous_orientation: Mat4,
    pub linear_velocity: Vec3,
    /// Radians per second around `spin_axis`.
    pub angular_velocity: f32,
    pub spin_axis: Vec3,
    /// Per-axis scale.
    pub size: Vec3,
    pub kind: ParticleKind,
    /// Seconds since the first floor bounce. Rain only.
    pub time_since_ground_impact: f32,
    hit_ground: bool,
}

impl Particle {
    /// Place a particle at rest orientation. A zero spin axis falls back to +Y.
    pub fn new(
        kind: ParticleKind,
        position: Vec3,
        linear_velocity: Vec3,
        angular_velocity: f32,
        spin_axis: Vec3,
        size: Vec3,
    ) -> Self {
        Self {
            position,
            previous_position: position,
            orientation: Mat4::IDENTITY,
            previous_orientation: Mat4::IDENTITY,
            linear_velocity,
            angular_velocity,
            spin_axis: spin_axis.normalize_or(Vec3::Y),
            size,
            kind,
            time_since_ground_impact: 0.0,
            hit_ground: false,
        }
    }

    /// Whether the particle has bounced off the floor at least once.
    pub fn has_hit_ground(&self) -> bool {
        self.hit_ground
    }

    /// Record a floor bounce; the impact timer runs from now on.
    pub(crate) fn mark_ground_impact(&mut self) {
        self.hit_ground = true;
    }

    /// Integrate one fixed step, keeping the prior state for blending.
    pub fn advance(&mut self, dt: f32) {
        self.previous_position = self.position;
        self.previous_orientation = self.orientation;
        self.position += self.linear_velocity * dt;
        let spin = Mat4::from_axis_angle(self.spin_axis, dt * self.angular_velocity);
        self.orientation = spin * self.orientation;
    }

    pub fn blended_position(&self, alpha: f32) -> Vec3 {
        self.previous_position.lerp(self.position, alpha)
    }

    /// Component-wise blend of the previous and current rotation.
    pub fn blended_orientation(&self, alpha: f32) -> Mat4 {
        let prev = &self.previous_orientation;
        let cur = &self.orientation;
        Mat4::from_cols(
            prev.x_axis.lerp(cur.x_axis, alpha),
            prev.y_axis.lerp(cur.y_axis, alpha),
            prev.z_axis.lerp(cur.z_axis, alpha),
            prev.w_axis.lerp(cur.w_axis, alpha),
        )
    }

    /// World transform to draw at interpolation `alpha`.
    pub fn blend(&self, alpha: f32) -> Mat4 {
        Mat4::from_translation(self.blended_position(alpha))
            * self.blended_orientation(alpha)
            * Mat4::from_scale(self.size)
            * Mat4::from_scale(Vec3::splat(DROP_SIZE))
    }

    /// Test whether `other`'s collider points, moved into this particle's
    /// local frame, penetrate the unit sphere. Always false against itself.
    pub fn check_if_colliding(
        &self,
        other: &Particle,
        collider: &SphereCollider,
        alpha: f32,
    ) -> bool {
        if std::ptr::eq(self, other) {
            return false;
        }
        let own = self.blend(alpha);
        if own.determinant().abs() <= f32::EPSILON * f32::EPSILON {
            return false;
        }
        let relative = own.inverse() * other.blend(alpha);
        collider
            .points()
            .iter()
            .any(|&p| collider.intersects(relative.transform_point3(p)))
    }
}

/// Point set tested against a unit sphere, with some leeway.
#[derive(Debug, Clone)]
pub struct SphereCollider {
    points: Vec<Vec3>,
    leeway: f32,
}

impl SphereCollider {
    /// Icosahedron vertices on the unit sphere.
    pub fn unit(leeway: f32) -> Self {
        let t = (1.0 + 5.0_f32.sqrt()) / 2.0;
        let points = [
            Vec3::new(-1.0, t, 0.0),
            Vec3::new(1.0, t, 0.0),
            Vec3::new(-1.0, -t, 0.0),
            Vec3::new(1.0, -t, 0.0),
            Vec3::new(0.0, -1.0, t),
            Vec3::new(0.0, 1.0, t),
            Vec3::new(0.0, -1.0, -t),
            Vec3::new(0.0, 1.0, -t),
            Vec3::new(t, 0.0, -1.0),
            Vec3::new(t, 0.0, 1.0),
            Vec3::new(-t, 0.0, -1.0),
            Vec3::new(-t, 0.0, 1.0),
        ]
        .into_iter()
        .map(Vec3::normalize)
        .collect();
        Self { points, leeway }
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn leeway(&self) -> f32 {
        self.leeway
    }

    /// Whether `p` lies inside the unit sphere grown by the leeway.
    pub fn intersects(&self, p: Vec3) -> bool {
        p.length_squared() < 1.0 + self.leeway
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drop_at(position: Vec3) -> Particle {
        Particle::new(
            ParticleKind::Rain,
            position,
            Vec3::new(0.0, -3.0, 0.0),
            1.0,
            Vec3::X,
            Vec3::ONE,
        )
    }

    #[test]
    fn test_advance_stores_previous_state() {
        let mut p = drop_at(Vec3::new(0.0, 10.0, 0.0));
        p.advance(0.5);
        assert_eq!(p.previous_position, Vec3::new(0.0, 10.0, 0.0));
        assert_eq!(p.position, Vec3::new(0.0, 8.5, 0.0));
        assert_eq!(p.previous_orientation, Mat4::IDENTITY);
        assert_ne!(p.orientation, Mat4::IDENTITY);
    }

    #[test]
    fn test_orientation_stays_pure_rotation() {
        let mut p = drop_at(Vec3::new(5.0, 5.0, 5.0));
        for _ in 0..10 {
            p.advance(0.05);
        }
        assert_eq!(p.orientation.w_axis, glam::Vec4::W);
    }

    #[test]
    fn test_blend_endpoints_and_midpoint() {
        let mut p = drop_at(Vec3::new(0.0, 10.0, 0.0));
        p.advance(1.0);

        assert_eq!(p.blended_position(0.0), p.previous_position);
        assert_eq!(p.blended_position(1.0), p.position);
        let mid = p.blended_position(0.5);
        assert!((mid - Vec3::new(0.0, 8.5, 0.0)).length() < 1e-5);

        let at_zero = p.blend(0.0);
        assert!((at_zero.w_axis.truncate() - p.previous_position).length() < 1e-5);
    }

    #[test]
    fn test_blend_applies_size_and_drop_scale() {
        let mut p = drop_at(Vec3::ZERO);
        p.angular_velocity = 0.0;
        p.size = Vec3::new(1.0, 2.0, 1.0);
        let m = p.blend(0.0);
        assert!((m.y_axis.length() - 2.0 * DROP_SIZE).abs() < 1e-6);
        assert!((m.x_axis.length() - DROP_SIZE).abs() < 1e-6);
    }

    #[test]
    fn test_zero_spin_axis_falls_back() {
        let p = Particle::new(
            ParticleKind::Fog,
            Vec3::ZERO,
            Vec3::ZERO,
            0.0,
            Vec3::ZERO,
            Vec3::ONE,
        );
        assert_eq!(p.spin_axis, Vec3::Y);
    }

    #[test]
    fn test_not_colliding_with_self() {
        let p = drop_at(Vec3::ZERO);
        let collider = SphereCollider::unit(0.1);
        assert!(!p.check_if_colliding(&p, &collider, 0.0));
    }

    #[test]
    fn test_overlapping_particles_collide() {
        let a = drop_at(Vec3::ZERO);
        let b = drop_at(Vec3::new(0.01, 0.0, 0.0));
        let collider = SphereCollider::unit(0.1);
        assert!(a.check_if_colliding(&b, &collider, 0.0));
    }

    #[test]
    fn test_distant_particles_do_not_collide() {
        let a = drop_at(Vec3::ZERO);
        let b = drop_at(Vec3::new(10.0, 0.0, 0.0));
        let collider = SphereCollider::unit(0.1);
        assert!(!a.check_if_colliding(&b, &collider, 0.0));
    }

    #[test]
    fn test_icosahedron_points_on_unit_sphere() {
        let collider = SphereCollider::unit(0.0);
        assert_eq!(collider.points().len(), 12);
        for p in collider.points() {
            assert!((p.length() - 1.0).abs() < 1e-6);
        }
        assert!(collider.intersects(Vec3::ZERO));
        assert!(!collider.intersects(Vec3::new(1.1, 0.0, 0.0)));
    }

    #[test]
    fn test_kind_caps() {
        assert_eq!(ParticleKind::Rain.cap(), 1000);
        assert_eq!(ParticleKind::Snow.cap(), 1000);
        assert_eq!(ParticleKind::Fog.cap(), 500);
    }
}
