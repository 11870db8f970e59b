// gesture.rs — 拖动手势 → panningVector
//
// Changed 事件携带的是自 Began 以来的累计位移，这里与上一个采样求差。

use crate::orientation::OrientationState;
use crate::panorama::ProjectionMode;
use crate::report::{MovementReporter, ReportCause};
use glam::{Vec2, Vec3};

/// Default pan speed, radians per point of drag.
pub const DEFAULT_PAN_SPEED: Vec2 = Vec2::new(0.005, 0.005);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent {
    Began,
    /// Translation accumulated since `Began`, in points.
    Changed { translation: Vec2 },
    /// Release velocity in points per second; `timestamp` in seconds on the frame clock.
    Ended { velocity: Vec2, timestamp: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanPhase {
    Idle,
    Panning { previous: Vec2 },
}

/// What the adapter did with an event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureOutcome {
    Ignored,
    Started,
    Moved,
    Released { velocity: Vec2, timestamp: f64 },
}

#[derive(Debug, Clone)]
pub struct TouchPanAdapter {
    phase: PanPhase,
    pan_speed: Vec2,
}

impl TouchPanAdapter {
    pub fn new(pan_speed: Vec2) -> Self {
        Self {
            phase: PanPhase::Idle,
            pan_speed,
        }
    }

    pub fn phase(&self) -> PanPhase {
        self.phase
    }

    pub fn is_panning(&self) -> bool {
        matches!(self.phase, PanPhase::Panning { .. })
    }

    pub fn set_pan_speed(&mut self, pan_speed: Vec2) {
        self.pan_speed = pan_speed;
    }

    /// Pan speed after projection rules; cylinders never pan vertically.
    pub fn effective_speed(&self, projection: ProjectionMode) -> Vec2 {
        match projection {
            ProjectionMode::Cylindrical => Vec2::new(self.pan_speed.x, 0.0),
            ProjectionMode::Spherical => self.pan_speed,
        }
    }

    pub fn handle(
        &mut self,
        event: GestureEvent,
        state: &mut OrientationState,
        reporter: &mut MovementReporter,
    ) -> GestureOutcome {
        // 球面 + combo 不支持拖动：显式忽略，整体退化为仅陀螺仪
        if !state.control().accepts_pan(state.projection()) {
            if event == GestureEvent::Began {
                log::debug!("pan ignored: {:?} + combo is motion only", state.projection());
            }
            return GestureOutcome::Ignored;
        }

        match (event, self.phase) {
            (GestureEvent::Began, _) => {
                self.phase = PanPhase::Panning { previous: Vec2::ZERO };
                GestureOutcome::Started
            }
            (GestureEvent::Changed { translation }, PanPhase::Panning { previous }) => {
                let delta = translation - previous;
                let speed = self.effective_speed(state.projection());
                state.add_panning(Vec3::new(delta.y * speed.y, delta.x * speed.x, 0.0));
                self.phase = PanPhase::Panning { previous: translation };
                reporter.report(state, ReportCause::Gesture);
                GestureOutcome::Moved
            }
            (GestureEvent::Ended { velocity, timestamp }, PanPhase::Panning { .. }) => {
                self.phase = PanPhase::Idle;
                GestureOutcome::Released { velocity, timestamp }
            }
            (_, PanPhase::Idle) => GestureOutcome::Ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panorama::ControlMode;

    fn changed(x: f32, y: f32) -> GestureEvent {
        GestureEvent::Changed { translation: Vec2::new(x, y) }
    }

    fn setup(projection: ProjectionMode, control: ControlMode) -> (OrientationState, MovementReporter) {
        (
            OrientationState::new(projection, control, Vec3::ZERO),
            MovementReporter::new(70.0),
        )
    }

    #[test]
    fn test_pan_accumulates_deltas() {
        let (mut state, mut reporter) = setup(ProjectionMode::Spherical, ControlMode::Touch);
        let mut pan = TouchPanAdapter::new(Vec2::new(0.01, 0.02));

        assert_eq!(pan.handle(GestureEvent::Began, &mut state, &mut reporter), GestureOutcome::Started);
        pan.handle(changed(10.0, 5.0), &mut state, &mut reporter);
        pan.handle(changed(30.0, -5.0), &mut state, &mut reporter);

        // 总位移 (30, -5)
        assert!(state.panning().abs_diff_eq(Vec3::new(-5.0 * 0.02, 30.0 * 0.01, 0.0), 1e-6));
        assert_eq!(reporter.reports(), 2);
    }

    #[test]
    fn test_cylindrical_suppresses_vertical_pan() {
        let (mut state, mut reporter) = setup(ProjectionMode::Cylindrical, ControlMode::Touch);
        let mut pan = TouchPanAdapter::new(DEFAULT_PAN_SPEED);
        pan.handle(GestureEvent::Began, &mut state, &mut reporter);
        pan.handle(changed(20.0, 80.0), &mut state, &mut reporter);
        assert_eq!(state.panning().x, 0.0);
        assert!((state.panning().y - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_began_resets_previous_location() {
        let (mut state, mut reporter) = setup(ProjectionMode::Cylindrical, ControlMode::Touch);
        let mut pan = TouchPanAdapter::new(Vec2::new(0.01, 0.01));
        pan.handle(GestureEvent::Began, &mut state, &mut reporter);
        pan.handle(changed(10.0, 0.0), &mut state, &mut reporter);
        pan.handle(GestureEvent::Ended { velocity: Vec2::ZERO, timestamp: 0.0 }, &mut state, &mut reporter);

        pan.handle(GestureEvent::Began, &mut state, &mut reporter);
        pan.handle(changed(10.0, 0.0), &mut state, &mut reporter);
        assert!((state.panning().y - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_events_without_begin_are_ignored() {
        let (mut state, mut reporter) = setup(ProjectionMode::Cylindrical, ControlMode::Touch);
        let mut pan = TouchPanAdapter::new(DEFAULT_PAN_SPEED);
        assert_eq!(pan.handle(changed(50.0, 0.0), &mut state, &mut reporter), GestureOutcome::Ignored);
        let end = GestureEvent::Ended { velocity: Vec2::X, timestamp: 1.0 };
        assert_eq!(pan.handle(end, &mut state, &mut reporter), GestureOutcome::Ignored);
        assert_eq!(state.panning(), Vec3::ZERO);
        assert_eq!(reporter.reports(), 0);
    }

    #[test]
    fn test_release_returns_velocity() {
        let (mut state, mut reporter) = setup(ProjectionMode::Cylindrical, ControlMode::Combo);
        let mut pan = TouchPanAdapter::new(DEFAULT_PAN_SPEED);
        pan.handle(GestureEvent::Began, &mut state, &mut reporter);
        assert!(pan.is_panning());
        let outcome = pan.handle(
            GestureEvent::Ended { velocity: Vec2::new(300.0, 10.0), timestamp: 2.5 },
            &mut state,
            &mut reporter,
        );
        assert_eq!(
            outcome,
            GestureOutcome::Released { velocity: Vec2::new(300.0, 10.0), timestamp: 2.5 }
        );
        assert_eq!(pan.phase(), PanPhase::Idle);
    }

    #[test]
    fn test_spherical_combo_pan_is_noop() {
        let (mut state, mut reporter) = setup(ProjectionMode::Spherical, ControlMode::Combo);
        let mut pan = TouchPanAdapter::new(DEFAULT_PAN_SPEED);
        assert_eq!(pan.handle(GestureEvent::Began, &mut state, &mut reporter), GestureOutcome::Ignored);
        assert_eq!(pan.handle(changed(40.0, 40.0), &mut state, &mut reporter), GestureOutcome::Ignored);
        assert_eq!(state.panning(), Vec3::ZERO);
        assert_eq!(reporter.reports(), 0);
        assert!(!pan.is_panning());
    }
}
