// orientation.rs — 三路角度贡献（拖动 / 朝向 / 偏移）与最终相机朝向

use crate::math;
use crate::panorama::{ControlMode, ProjectionMode};
use glam::{EulerRot, Quat, Vec3};

/// Camera pitch limit (radians) while touch input can move the camera.
pub const PITCH_LIMIT: f32 = 1.1;

/// Orientation handed to the rendering backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraOrientation {
    /// Euler angles (pitch x, yaw y, roll z), radians.
    Euler(Vec3),
    /// Full rotation, used when device attitude drives a spherical panorama.
    Quaternion(Quat),
}

impl CameraOrientation {
    pub fn to_quat(self) -> Quat {
        match self {
            CameraOrientation::Euler(e) => Quat::from_euler(EulerRot::YXZ, e.y, e.x, e.z),
            CameraOrientation::Quaternion(q) => q,
        }
    }

    /// Rotation about the vertical axis.
    pub fn yaw(self) -> f32 {
        match self {
            CameraOrientation::Euler(e) => e.y,
            CameraOrientation::Quaternion(q) => q.to_euler(EulerRot::YXZ).0,
        }
    }
}

impl Default for CameraOrientation {
    fn default() -> Self {
        CameraOrientation::Euler(Vec3::ZERO)
    }
}

impl ProjectionMode {
    /// Combines the angular contributions into a camera orientation.
    ///
    /// Cylindrical panoramas always use the vector sum. Spherical panoramas use
    /// the remapped device attitude once one is known, which avoids gimbal lock
    /// near the poles; before that they fall back to the vector sum.
    pub fn compose(
        self,
        sum: Vec3,
        attitude: Option<Quat>,
        control: ControlMode,
    ) -> CameraOrientation {
        let clamped = |v: Vec3| {
            if control.includes_touch() {
                math::clamp_x(v, PITCH_LIMIT)
            } else {
                v
            }
        };

        match self {
            ProjectionMode::Cylindrical => CameraOrientation::Euler(clamped(sum)),
            ProjectionMode::Spherical => match attitude {
                Some(q) => CameraOrientation::Quaternion(q),
                None => CameraOrientation::Euler(clamped(sum)),
            },
        }
    }
}

/// Angular state shared by the input adapters.
#[derive(Debug, Clone)]
pub struct OrientationState {
    pub(crate) panning: Vec3,
    pub(crate) heading: Vec3,
    pub(crate) offset: Vec3,
    initial_offset: Vec3,
    /// Set after the first motion sample has been absorbed into `offset`.
    pub(crate) gyro_started: bool,
    attitude: Option<Quat>,
    projection: ProjectionMode,
    control: ControlMode,
    camera: CameraOrientation,
}

impl OrientationState {
    pub fn new(projection: ProjectionMode, control: ControlMode, initial_offset: Vec3) -> Self {
        let mut state = Self {
            panning: Vec3::ZERO,
            heading: Vec3::ZERO,
            offset: initial_offset,
            initial_offset,
            gyro_started: false,
            attitude: None,
            projection,
            control,
            camera: CameraOrientation::default(),
        };
        state.recompute();
        state
    }

    pub fn panning(&self) -> Vec3 {
        self.panning
    }

    pub fn heading(&self) -> Vec3 {
        self.heading
    }

    pub fn offset(&self) -> Vec3 {
        self.offset
    }

    pub fn camera(&self) -> CameraOrientation {
        self.camera
    }

    pub fn projection(&self) -> ProjectionMode {
        self.projection
    }

    pub fn control(&self) -> ControlMode {
        self.control
    }

    pub fn gyro_started(&self) -> bool {
        self.gyro_started
    }

    /// Rotation angle reported to listeners.
    pub fn rotation_angle(&self) -> f32 {
        -self.camera.yaw()
    }

    pub fn recompute(&mut self) {
        let sum = self.panning + self.heading + self.offset;
        self.camera = self.projection.compose(sum, self.attitude, self.control);
    }

    /// Zeroes pan and heading, restores the configured offset and re-arms the
    /// first-sample heading absorption.
    pub fn reset(&mut self) {
        self.panning = Vec3::ZERO;
        self.heading = Vec3::ZERO;
        self.offset = self.initial_offset;
        self.gyro_started = false;
        self.attitude = None;
        self.recompute();
    }

    pub fn set_initial_offset(&mut self, offset: Vec3) {
        self.initial_offset = offset;
    }

    pub fn set_projection(&mut self, projection: ProjectionMode) {
        self.projection = projection;
        self.reset();
    }

    pub fn set_control(&mut self, control: ControlMode) {
        self.control = control;
        if !control.includes_motion() {
            // 朝向并入 offset：画面不动，再次启用陀螺仪时从当前视角继续
            self.offset += self.heading;
            self.heading = Vec3::ZERO;
            self.attitude = None;
            self.gyro_started = false;
        }
        self.recompute();
    }

    pub(crate) fn add_panning(&mut self, delta: Vec3) {
        self.panning += delta;
        self.recompute();
    }

    pub(crate) fn set_attitude(&mut self, camera: Quat) {
        self.attitude = Some(camera);
        self.recompute();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_cylindrical_is_vector_sum() {
        let mut state = OrientationState::new(
            ProjectionMode::Cylindrical,
            ControlMode::Motion,
            Vec3::new(0.0, 0.25, 0.0),
        );
        state.panning = Vec3::new(0.1, 0.2, 0.0);
        state.heading = Vec3::new(0.0, -0.5, 0.0);
        state.recompute();
        let CameraOrientation::Euler(e) = state.camera() else {
            panic!("cylindrical camera must be euler");
        };
        assert!(e.abs_diff_eq(Vec3::new(0.1, -0.05, 0.0), 1e-6));
    }

    #[test]
    fn test_pitch_clamped_when_touch_enabled() {
        for control in [ControlMode::Touch, ControlMode::Combo] {
            let mut state = OrientationState::new(ProjectionMode::Cylindrical, control, Vec3::ZERO);
            state.panning = Vec3::new(1.0, 0.0, 0.0);
            state.offset = Vec3::new(0.5, 0.0, 0.0);
            state.recompute();
            assert_eq!(state.camera(), CameraOrientation::Euler(Vec3::new(1.1, 0.0, 0.0)));

            state.panning = Vec3::new(-3.0, 0.0, 0.0);
            state.recompute();
            assert_eq!(state.camera(), CameraOrientation::Euler(Vec3::new(-1.1, 0.0, 0.0)));
        }
    }

    #[test]
    fn test_pitch_unclamped_for_motion_only() {
        let mut state =
            OrientationState::new(ProjectionMode::Cylindrical, ControlMode::Motion, Vec3::ZERO);
        state.heading = Vec3::new(1.5, 0.0, 0.0);
        state.recompute();
        assert_eq!(state.camera(), CameraOrientation::Euler(Vec3::new(1.5, 0.0, 0.0)));
    }

    #[test]
    fn test_spherical_prefers_attitude() {
        let mut state =
            OrientationState::new(ProjectionMode::Spherical, ControlMode::Motion, Vec3::ZERO);
        assert!(matches!(state.camera(), CameraOrientation::Euler(_)));

        let q = Quat::from_rotation_y(0.4);
        state.set_attitude(q);
        assert_eq!(state.camera(), CameraOrientation::Quaternion(q));
        assert!((state.rotation_angle() + 0.4).abs() < 1e-5);
    }

    #[test]
    fn test_reset_restores_initial_offset() {
        let offset = Vec3::new(0.0, FRAC_PI_2, 0.0);
        let mut state = OrientationState::new(ProjectionMode::Cylindrical, ControlMode::Touch, offset);
        state.add_panning(Vec3::new(0.3, 0.7, 0.0));
        state.heading = Vec3::new(0.0, 1.0, 0.0);
        state.gyro_started = true;

        state.reset();
        assert_eq!(state.panning(), Vec3::ZERO);
        assert_eq!(state.heading(), Vec3::ZERO);
        assert_eq!(state.offset(), offset);
        assert!(!state.gyro_started());
        assert!((state.rotation_angle() + FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_euler_to_quat_yaw_roundtrip() {
        let camera = CameraOrientation::Euler(Vec3::new(0.2, 1.0, 0.0));
        let q = CameraOrientation::Quaternion(camera.to_quat());
        assert!((q.yaw() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_leaving_motion_folds_heading_into_offset() {
        let mut state = OrientationState::new(ProjectionMode::Cylindrical, ControlMode::Motion, Vec3::ZERO);
        state.heading = Vec3::new(0.0, -0.7, 0.0);
        state.offset = Vec3::new(0.0, 0.3, 0.0);
        state.gyro_started = true;
        state.recompute();
        let before = state.camera();

        state.set_control(ControlMode::Touch);
        assert_eq!(state.heading(), Vec3::ZERO);
        assert!(!state.gyro_started());
        assert!((state.offset().y + 0.4).abs() < 1e-6);
        let (CameraOrientation::Euler(a), CameraOrientation::Euler(b)) = (before, state.camera()) else {
            panic!("cylindrical camera must be euler");
        };
        assert!(a.abs_diff_eq(b, 1e-6));
    }
}
