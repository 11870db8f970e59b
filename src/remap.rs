// remap.rs — 按屏幕方向修正设备姿态四元数（仅球面模式）
//
// 每种屏幕方向对应一行固定数据：先依次左乘修正旋转，再对结果的 x/y 分量做交换/取反。
// z、w 分量在四种方向下都保持不变。

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, PI};

/// Interface orientation of the screen the panorama is shown on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScreenOrientation {
    #[default]
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
    /// Treated exactly like [`ScreenOrientation::Portrait`].
    Unknown,
}

#[derive(Debug, Clone, Copy)]
enum Axis {
    X,
    Y,
}

/// One row of the remap table.
#[derive(Debug)]
struct ScreenRemap {
    /// Axis-angle corrections, each one left-multiplied in order.
    corrections: &'static [(Vec3, f32)],
    /// Source component and sign for the output x.
    x: (Axis, f32),
    /// Source component and sign for the output y.
    y: (Axis, f32),
}

const PORTRAIT: ScreenRemap = ScreenRemap {
    corrections: &[(Vec3::X, -FRAC_PI_2)],
    x: (Axis::X, 1.0),
    y: (Axis::Y, 1.0),
};

const PORTRAIT_UPSIDE_DOWN: ScreenRemap = ScreenRemap {
    corrections: &[(Vec3::X, -FRAC_PI_2), (Vec3::Z, PI)],
    x: (Axis::X, -1.0),
    y: (Axis::Y, -1.0),
};

const LANDSCAPE_LEFT: ScreenRemap = ScreenRemap {
    corrections: &[(Vec3::Y, -FRAC_PI_2), (Vec3::X, -FRAC_PI_2)],
    x: (Axis::Y, 1.0),
    y: (Axis::X, -1.0),
};

const LANDSCAPE_RIGHT: ScreenRemap = ScreenRemap {
    corrections: &[(Vec3::Y, FRAC_PI_2), (Vec3::X, -FRAC_PI_2)],
    x: (Axis::Y, -1.0),
    y: (Axis::X, 1.0),
};

impl ScreenOrientation {
    fn table_row(self) -> &'static ScreenRemap {
        match self {
            ScreenOrientation::Portrait | ScreenOrientation::Unknown => &PORTRAIT,
            ScreenOrientation::PortraitUpsideDown => &PORTRAIT_UPSIDE_DOWN,
            ScreenOrientation::LandscapeLeft => &LANDSCAPE_LEFT,
            ScreenOrientation::LandscapeRight => &LANDSCAPE_RIGHT,
        }
    }

    /// Camera orientation for a device attitude seen through this screen orientation.
    pub fn remap(self, attitude: Quat) -> Quat {
        let row = self.table_row();
        let corrected = row
            .corrections
            .iter()
            .fold(attitude, |q, &(axis, angle)| Quat::from_axis_angle(axis, angle) * q);

        let pick = |(axis, sign): (Axis, f32)| match axis {
            Axis::X => corrected.x * sign,
            Axis::Y => corrected.y * sign,
        };
        Quat::from_xyzw(pick(row.x), pick(row.y), corrected.z, corrected.w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [ScreenOrientation; 5] = [
        ScreenOrientation::Portrait,
        ScreenOrientation::PortraitUpsideDown,
        ScreenOrientation::LandscapeLeft,
        ScreenOrientation::LandscapeRight,
        ScreenOrientation::Unknown,
    ];

    fn sample_attitudes() -> Vec<Quat> {
        vec![
            Quat::IDENTITY,
            Quat::from_rotation_x(FRAC_PI_2),
            Quat::from_rotation_z(1.3) * Quat::from_rotation_x(0.4),
            Quat::from_xyzw(0.2, -0.4, 0.1, 0.3),
        ]
    }

    #[test]
    fn test_remap_preserves_norm() {
        for orientation in ALL {
            for q in sample_attitudes() {
                let r = orientation.remap(q);
                assert!(
                    (r.length() - q.length()).abs() < 1e-5,
                    "{orientation:?}: {} vs {}",
                    r.length(),
                    q.length()
                );
            }
        }
    }

    #[test]
    fn test_unknown_matches_portrait() {
        for q in sample_attitudes() {
            let a = ScreenOrientation::Unknown.remap(q);
            let b = ScreenOrientation::Portrait.remap(q);
            assert!(a.abs_diff_eq(b, 1e-6));
        }
    }

    #[test]
    fn test_portrait_upright_device_looks_at_horizon() {
        // 竖持、屏幕朝向地平线的设备应得到单位旋转（相机平视）
        let upright = Quat::from_rotation_x(FRAC_PI_2);
        let camera = ScreenOrientation::Portrait.remap(upright);
        assert!(camera.abs_diff_eq(Quat::IDENTITY, 1e-5));
    }

    #[test]
    fn test_corrections_undo_their_own_attitude() {
        // 修正旋转按顺序左乘：姿态恰为修正的逆时，结果应为单位旋转（允许 q 与 -q）
        let cases = [
            (
                ScreenOrientation::PortraitUpsideDown,
                Quat::from_rotation_x(FRAC_PI_2) * Quat::from_rotation_z(PI),
            ),
            (
                ScreenOrientation::LandscapeLeft,
                Quat::from_rotation_y(FRAC_PI_2) * Quat::from_rotation_x(FRAC_PI_2),
            ),
            (
                ScreenOrientation::LandscapeRight,
                Quat::from_rotation_y(-FRAC_PI_2) * Quat::from_rotation_x(FRAC_PI_2),
            ),
        ];
        for (orientation, attitude) in cases {
            let camera = orientation.remap(attitude);
            assert!((camera.w.abs() - 1.0).abs() < 1e-5, "{orientation:?}: {camera:?}");
        }
    }

    #[test]
    fn test_landscape_swaps_x_and_y() {
        // 修正后仅有 x 分量时，横屏输出应落在 y 上
        let attitude = Quat::from_rotation_y(-FRAC_PI_2)
            * Quat::from_rotation_x(FRAC_PI_2)
            * Quat::from_rotation_x(0.6);
        let camera = ScreenOrientation::LandscapeRight.remap(attitude);
        assert!(camera.x.abs() < 1e-5);
        assert!((camera.y - (0.3f32).sin()).abs() < 1e-5);
    }
}
