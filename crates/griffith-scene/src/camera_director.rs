//! Scripted camera: an orbit around the observatory plus eased transitions
//! between poses.

use glam::{Mat4, Quat, Vec3};
use griffith_config::CameraConfig;
use griffith_render::CameraView;
use tracing::info;

/// Eye of the opening shot.
pub const INITIAL_EYE: Vec3 = Vec3::new(-35.0, 13.0, -20.0);
/// Look-at target of the opening shot.
pub const INITIAL_TARGET: Vec3 = Vec3::new(0.0, 5.0, 25.0);
/// Point the orbit circles: the observatory's main dome.
pub const ORBIT_CENTER: Vec3 = Vec3::new(0.0, 5.0, 25.0);
/// Eye height above the orbit center.
pub const ORBIT_HEIGHT: f32 = 8.0;

/// Who drives the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMode {
    /// Scripted orbit around the observatory.
    Orbit,
    /// User-driven; the director leaves the pose alone.
    Free,
}

/// Easing curves for camera transitions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EasingFunction {
    /// Constant speed, no acceleration.
    Linear,
    /// Slow start, fast end.
    EaseIn,
    /// Fast start, slow end.
    EaseOut,
    /// Slow start, fast middle, slow end.
    #[default]
    EaseInOut,
}

impl EasingFunction {
    /// Map linear progress in `[0, 1]` to eased progress.
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            EasingFunction::Linear => t,
            EasingFunction::EaseIn => t * t,
            EasingFunction::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            EasingFunction::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
        }
    }
}

/// Camera position and orientation (camera-to-world rotation).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl CameraPose {
    /// Pose at `eye` looking at `target` with +Y up.
    pub fn look_at(eye: Vec3, target: Vec3) -> Self {
        let view = Mat4::look_at_rh(eye, target, Vec3::Y);
        let (_, rotation, _) = view.inverse().to_scale_rotation_translation();
        Self {
            position: eye,
            rotation: rotation.normalize(),
        }
    }

    pub fn initial() -> Self {
        Self::look_at(INITIAL_EYE, INITIAL_TARGET)
    }

    /// World-to-view matrix.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position).inverse()
    }

    /// Direction the camera looks along.
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Position lerp and rotation slerp toward `to`.
    pub fn interpolate(&self, to: &CameraPose, t: f32) -> Self {
        Self {
            position: self.position.lerp(to.position, t),
            rotation: self.rotation.slerp(to.rotation, t),
        }
    }
}

/// An eased move from one pose to another.
#[derive(Clone, Copy, Debug)]
pub struct CameraTransition {
    pub from: CameraPose,
    pub to: CameraPose,
    /// Seconds; at least one frame's worth.
    pub duration: f32,
    pub elapsed: f32,
    pub easing: EasingFunction,
}

impl CameraTransition {
    pub fn new(from: CameraPose, to: CameraPose, duration: f32, easing: EasingFunction) -> Self {
        Self {
            from,
            to,
            duration: duration.max(f32::EPSILON),
            elapsed: 0.0,
            easing,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// Eased pose at the current progress.
    pub fn pose(&self) -> CameraPose {
        if self.is_finished() {
            return self.to;
        }
        let t = self.easing.apply(self.elapsed / self.duration);
        self.from.interpolate(&self.to, t)
    }
}

/// Drives the camera pose each frame.
pub struct CameraDirector {
    mode: CameraMode,
    pose: CameraPose,
    transition: Option<CameraTransition>,
    orbit_angle: f32,
    orbit_radius: f32,
    orbit_speed: f32,
    transition_seconds: f32,
    fov_y: f32,
    easing: EasingFunction,
}

impl CameraDirector {
    pub fn new(config: &CameraConfig) -> Self {
        let mode = if config.free_camera {
            CameraMode::Free
        } else {
            CameraMode::Orbit
        };
        let initial = CameraPose::initial();
        // Start the orbit where the opening shot stands.
        let offset = INITIAL_EYE - ORBIT_CENTER;
        let orbit_angle = offset.z.atan2(offset.x).rem_euclid(std::f32::consts::TAU);
        let mut director = Self {
            mode,
            pose: initial,
            transition: None,
            orbit_angle,
            orbit_radius: config.orbit_radius.max(1.0),
            orbit_speed: config.orbit_speed,
            transition_seconds: config.transition_seconds.max(0.0),
            fov_y: config.fov_degrees.clamp(1.0, 179.0).to_radians(),
            easing: EasingFunction::default(),
        };
        if mode == CameraMode::Orbit {
            director.start_transition(director.orbit_pose(orbit_angle));
        }
        director
    }

    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    pub fn pose(&self) -> CameraPose {
        self.pose
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    pub fn orbit_angle(&self) -> f32 {
        self.orbit_angle
    }

    pub fn set_easing(&mut self, easing: EasingFunction) {
        self.easing = easing;
    }

    /// Eye position on the orbit at `angle`.
    pub fn orbit_pose(&self, angle: f32) -> CameraPose {
        orbit_pose_at(self.orbit_radius, angle)
    }

    /// Advance the orbit and any running transition.
    pub fn update(&mut self, dt: f32) -> CameraPose {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        if self.mode == CameraMode::Orbit {
            self.orbit_angle =
                (self.orbit_angle + self.orbit_speed * dt).rem_euclid(std::f32::consts::TAU);
        }

        if let Some(transition) = self.transition.as_mut() {
            if self.mode == CameraMode::Orbit {
                // The orbit keeps moving while the camera catches up.
                transition.to = orbit_pose_at(self.orbit_radius, self.orbit_angle);
            }
            transition.elapsed += dt;
            self.pose = transition.pose();
            if transition.is_finished() {
                self.transition = None;
            }
        } else if self.mode == CameraMode::Orbit {
            self.pose = self.orbit_pose(self.orbit_angle);
        }

        self.pose
    }

    /// Switch between orbit and free mode. Entering the orbit eases onto it.
    pub fn toggle_mode(&mut self) {
        match self.mode {
            CameraMode::Orbit => {
                self.mode = CameraMode::Free;
                self.transition = None;
            }
            CameraMode::Free => {
                self.mode = CameraMode::Orbit;
                self.start_transition(self.orbit_pose(self.orbit_angle));
            }
        }
        info!("Camera mode {:?}", self.mode);
    }

    /// Ease back to the opening shot and hold it in free mode.
    pub fn reset(&mut self) {
        self.mode = CameraMode::Free;
        self.start_transition(CameraPose::initial());
        info!("Camera reset");
    }

    /// Place the camera directly, as user input does. Switches to free mode.
    pub fn set_free_pose(&mut self, pose: CameraPose) {
        self.mode = CameraMode::Free;
        self.transition = None;
        self.pose = pose;
    }

    fn start_transition(&mut self, to: CameraPose) {
        self.transition = Some(CameraTransition::new(
            self.pose,
            to,
            self.transition_seconds,
            self.easing,
        ));
    }

    /// Renderer-facing camera at the configured field of view.
    pub fn camera_view(&self, aspect: f32) -> CameraView {
        CameraView::from_view(self.pose.view_matrix(), self.pose.position, self.fov_y, aspect)
    }
}

fn orbit_pose_at(radius: f32, angle: f32) -> CameraPose {
    let eye = ORBIT_CENTER + Vec3::new(radius * angle.cos(), ORBIT_HEIGHT, radius * angle.sin());
    CameraPose::look_at(eye, ORBIT_CENTER)
}
