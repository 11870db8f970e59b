// inertia.rs — 松手后的惯性滑动（每帧调用一次）
//
// 匀减速模型：减速度大小为 max(1000, |v|)，方向与速度相反；速度不会越过 0。
// 位移与拖动一样交叉映射：vx → panningVector.y，vy → panningVector.x。

use crate::orientation::OrientationState;
use crate::panorama::ProjectionMode;
use glam::{Vec2, Vec3};

/// Horizontal speed (points/s) below which the glide stops.
pub const STOP_VELOCITY: f32 = 0.05;
/// Smallest deceleration magnitude, points/s².
pub const MIN_DECELERATION: f32 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Glide {
    velocity: Vec2,
    last_time: f64,
}

#[derive(Debug, Clone)]
pub struct DecelerationEngine {
    enabled: bool,
    glide: Option<Glide>,
}

impl Default for DecelerationEngine {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Deceleration with the sign of `v` (so it opposes motion once subtracted).
fn deceleration(v: f32) -> f32 {
    if v > 0.0 {
        v.max(MIN_DECELERATION)
    } else {
        v.min(-MIN_DECELERATION)
    }
}

/// Advances one axis by `dt`, returning (displacement, new velocity).
fn integrate(v: f32, dt: f32) -> (f32, f32) {
    let a = deceleration(v);
    // 超过停止时刻的部分不再积分
    let t = dt.min(v / a);
    let displacement = (v - 0.5 * a * t) * t;
    let next = v - a * t;
    let next = if v > 0.0 { next.max(0.0) } else { next.min(0.0) };
    (displacement, next)
}

impl DecelerationEngine {
    pub fn new(enabled: bool) -> Self {
        Self { enabled, glide: None }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.glide = None;
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Starts a glide from a gesture release.
    pub fn release(&mut self, velocity: Vec2, timestamp: f64) {
        if !self.enabled {
            return;
        }
        self.glide = Some(Glide {
            velocity,
            last_time: timestamp,
        });
    }

    pub fn cancel(&mut self) {
        self.glide = None;
    }

    pub fn is_active(&self) -> bool {
        self.glide.is_some()
    }

    pub fn velocity(&self) -> Option<Vec2> {
        self.glide.map(|g| g.velocity)
    }

    /// Integrates up to `now` (seconds). Returns true when the camera moved.
    ///
    /// `pan_speed` must already have projection rules applied.
    pub fn step(
        &mut self,
        now: f64,
        panning: bool,
        pan_speed: Vec2,
        state: &mut OrientationState,
    ) -> bool {
        if panning || state.projection() != ProjectionMode::Cylindrical {
            return false;
        }
        let Some(glide) = self.glide.as_mut() else {
            return false;
        };
        if glide.velocity.x.abs() <= STOP_VELOCITY {
            self.glide = None;
            return false;
        }

        let dt = (now - glide.last_time) as f32;
        glide.last_time = now;
        if dt <= 0.0 {
            return false;
        }

        let (dx, vx) = integrate(glide.velocity.x, dt);
        let (dy, vy) = integrate(glide.velocity.y, dt);
        glide.velocity = Vec2::new(vx, vy);
        if vx.abs() <= STOP_VELOCITY {
            self.glide = None;
        }

        state.add_panning(Vec3::new(dy * pan_speed.y, dx * pan_speed.x, 0.0));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panorama::ControlMode;

    const SPEED: Vec2 = Vec2::new(0.005, 0.0);

    fn cylinder() -> OrientationState {
        OrientationState::new(ProjectionMode::Cylindrical, ControlMode::Touch, Vec3::ZERO)
    }

    #[test]
    fn test_velocity_decays_monotonically_without_sign_change() {
        for start in [1800.0f32, -1800.0, 40.0, -3.0] {
            let mut state = cylinder();
            let mut engine = DecelerationEngine::new(true);
            engine.release(Vec2::new(start, -start * 0.5), 0.0);

            let mut previous = start.abs();
            let mut t = 0.0;
            while engine.is_active() {
                t += 1.0 / 60.0;
                engine.step(t, false, SPEED, &mut state);
                let Some(v) = engine.velocity() else { break };
                assert!(v.x.abs() <= previous);
                assert!(v.x == 0.0 || v.x.signum() == start.signum());
                previous = v.x.abs();
                assert!(t < 10.0, "glide never stopped");
            }
        }
    }

    #[test]
    fn test_glide_continues_drag_direction() {
        let mut state = cylinder();
        let mut engine = DecelerationEngine::new(true);
        engine.release(Vec2::new(500.0, 0.0), 1.0);
        assert!(engine.step(1.0 + 1.0 / 60.0, false, SPEED, &mut state));
        assert!(state.panning().y > 0.0);
        assert_eq!(state.panning().x, 0.0);
    }

    #[test]
    fn test_single_step_kinematics() {
        let mut state = cylinder();
        let mut engine = DecelerationEngine::new(true);
        engine.release(Vec2::new(2000.0, 0.0), 0.0);
        engine.step(0.1, false, Vec2::new(1.0, 0.0), &mut state);
        // a = 2000, Δ = (2000 - 0.5*2000*0.1)*0.1 = 190
        assert!((state.panning().y - 190.0).abs() < 1e-2);
        assert!((engine.velocity().unwrap().x - 1800.0).abs() < 1e-2);
    }

    #[test]
    fn test_long_frame_stops_at_rest() {
        let mut state = cylinder();
        let mut engine = DecelerationEngine::new(true);
        engine.release(Vec2::new(100.0, 0.0), 0.0);
        engine.step(5.0, false, Vec2::new(1.0, 0.0), &mut state);
        // v²/2a = 100² / 2000
        assert!((state.panning().y - 5.0).abs() < 1e-3);
        assert!(!engine.is_active());
    }

    #[test]
    fn test_inactive_while_panning_or_spherical() {
        let mut state = cylinder();
        let mut engine = DecelerationEngine::new(true);
        engine.release(Vec2::new(500.0, 0.0), 0.0);
        assert!(!engine.step(0.1, true, SPEED, &mut state));
        assert_eq!(state.panning(), Vec3::ZERO);

        let mut sphere = OrientationState::new(ProjectionMode::Spherical, ControlMode::Touch, Vec3::ZERO);
        assert!(!engine.step(0.2, false, SPEED, &mut sphere));
        assert_eq!(sphere.panning(), Vec3::ZERO);
    }

    #[test]
    fn test_slow_release_does_not_glide() {
        let mut state = cylinder();
        let mut engine = DecelerationEngine::new(true);
        engine.release(Vec2::new(0.04, 200.0), 0.0);
        assert!(!engine.step(0.1, false, SPEED, &mut state));
        assert!(!engine.is_active());
    }

    #[test]
    fn test_disabled_engine_ignores_release() {
        let mut engine = DecelerationEngine::new(false);
        engine.release(Vec2::new(500.0, 0.0), 0.0);
        assert!(!engine.is_active());
    }
}
