// math.rs — 角度向量与四元数工具
//
// 角度向量直接使用 glam::Vec3（x/y/z 分别是绕各轴的弧度），四元数使用 glam::Quat。
// Quat * Quat 即 Hamilton 积，顺序敏感。

use glam::{Mat3, Quat, Vec3};
use std::f32::consts::{FRAC_PI_2, PI, TAU};

/// Reference vector (pure quaternion) rotated by the attitude to find the screen normal.
const SCREEN_NORMAL: Quat = Quat::from_xyzw(0.0, 0.0, 1.0, 0.0);

/// Hamilton product `a * b`.
#[inline]
pub fn quat_multiply(a: Quat, b: Quat) -> Quat {
    a * b
}

/// Rotation of `angle` radians about a unit `axis`.
#[inline]
pub fn quat_from_axis_angle(axis: Vec3, angle: f32) -> Quat {
    Quat::from_axis_angle(axis, angle)
}

/// Elevation of the device's screen normal above the ground plane, in radians.
///
/// Rotates (0, 0, 1) by `q * e * conj(q)` and returns `atan(z / sqrt(x² + y²))`.
/// A zero horizontal component gives ±π/2; a degenerate quaternion gives NaN,
/// which is returned as is.
pub fn ground_plane_angle(attitude: Quat) -> f32 {
    let rotated = attitude * SCREEN_NORMAL * attitude.conjugate();
    let horizontal = (rotated.x * rotated.x + rotated.y * rotated.y).sqrt();
    (rotated.z / horizontal).atan()
}

/// 0 when the screen faces the horizon, 1 when the device lies face up or down.
pub fn face_up_or_down_ratio(ground_plane_angle: f32) -> f32 {
    ground_plane_angle.abs() / FRAC_PI_2
}

/// Heading in radians derived from a device rotation matrix.
///
/// `m31`/`m32` are the first two entries of the third row, i.e. the screen
/// normal expressed in the reference frame.
pub fn user_heading(rotation: &Mat3) -> f32 {
    let m31 = matrix_element(rotation, 3, 1);
    let m32 = matrix_element(rotation, 3, 2);
    PI - m32.atan2(m31) + FRAC_PI_2
}

/// One-based (row, column) access into a column-major glam matrix.
#[inline]
pub fn matrix_element(m: &Mat3, row: usize, col: usize) -> f32 {
    m.col(col - 1)[row - 1]
}

/// `new - previous` folded into (-π, π].
pub fn wrapped_delta(previous: f32, new: f32) -> f32 {
    let mut delta = new - previous;
    if delta > PI {
        delta -= TAU;
    } else if delta <= -PI {
        delta += TAU;
    }
    delta
}

/// Horizontal field of view (radians) for a vertical FOV and a viewport.
///
/// A viewport without height has no aspect ratio; the vertical FOV is returned.
pub fn horizontal_fov(vertical_fov_rad: f32, width: f32, height: f32) -> f32 {
    if height <= 0.0 {
        return vertical_fov_rad;
    }
    let aspect = width / height;
    2.0 * ((vertical_fov_rad / 2.0).tan() * aspect).atan()
}

/// Component-wise clamp of `v.x` to `[-limit, limit]`.
#[inline]
pub fn clamp_x(v: Vec3, limit: f32) -> Vec3 {
    Vec3::new(v.x.clamp(-limit, limit), v.y, v.z)
}
