// motion.rs — 陀螺仪（设备姿态）输入
//
// 每个采样：由旋转矩阵求朝向 → headingVector；首个采样把朝向吸收进 offset，避免画面跳变；
// 设备越接近朝天/朝地，朝向越不稳定，此时按比例把朝向变化计入 offset。

use crate::math;
use crate::orientation::OrientationState;
use crate::remap::ScreenOrientation;
use crate::report::{MovementReporter, ReportCause};
use glam::{Mat3, Quat, Vec3};

/// One device-motion reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSample {
    /// Device attitude relative to the reference frame.
    pub attitude: Quat,
    /// Rows are the device axes expressed in the reference frame.
    pub rotation_matrix: Mat3,
    /// Elevation of the screen normal, see [`math::ground_plane_angle`].
    pub ground_plane_angle: f32,
    pub screen_orientation: ScreenOrientation,
}

impl MotionSample {
    /// Builds the derived fields from an attitude quaternion.
    pub fn from_attitude(attitude: Quat, screen_orientation: ScreenOrientation) -> Self {
        Self {
            attitude,
            rotation_matrix: Mat3::from_quat(attitude).transpose(),
            ground_plane_angle: math::ground_plane_angle(attitude),
            screen_orientation,
        }
    }
}

/// Feeds motion samples into the orientation state.
#[derive(Debug, Default)]
pub struct MotionAdapter {
    samples: u64,
}

impl MotionAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Samples applied since this adapter was created.
    pub fn samples(&self) -> u64 {
        self.samples
    }

    pub fn apply(
        &mut self,
        sample: &MotionSample,
        state: &mut OrientationState,
        reporter: &mut MovementReporter,
    ) {
        if !state.control().includes_motion() {
            return;
        }

        let previous = state.heading;
        let heading = Vec3::new(0.0, -math::user_heading(&sample.rotation_matrix), 0.0);
        state.heading = heading;

        let dy = if state.gyro_started {
            math::wrapped_delta(previous.y, heading.y)
        } else {
            // 首个采样：offset 抵消当前朝向
            state.offset -= heading;
            state.gyro_started = true;
            0.0
        };

        let ratio = math::face_up_or_down_ratio(sample.ground_plane_angle);
        let ratio = if ratio.is_finite() { ratio } else { 1.0 };
        state.offset.y += dy * ratio;

        // 柱面模式下 compose 只用向量和，姿态仅在球面模式生效
        state.set_attitude(sample.screen_orientation.remap(sample.attitude));

        self.samples += 1;
        reporter.report(state, ReportCause::Motion);
    }
}
