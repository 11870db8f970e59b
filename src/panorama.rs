// panorama.rs — 投影模式、控制模式与全景控制器
//
// 控制器持有朝向状态、上报器、两个输入适配器、惯性引擎和传感器源。
// 所有回调（手势、传感器采样、每帧渲染）都在同一线程上调用，状态无需加锁。

use crate::backend::RenderBackend;
use crate::config::ViewerConfig;
use crate::error::ConfigError;
use crate::gesture::{GestureEvent, GestureOutcome, TouchPanAdapter};
use crate::inertia::DecelerationEngine;
use crate::motion::MotionAdapter;
use crate::orientation::{CameraOrientation, OrientationState};
use crate::report::{CompassListener, MovementHandler, MovementReport, MovementReporter, ReportCause};
use crate::sensor::MotionSource;
use glam::{Vec2, Vec3};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionMode {
    #[default]
    Cylindrical, // 柱面：只能水平转动
    Spherical, // 球面：360°×180°
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlMode {
    #[default]
    Touch,
    Motion,
    Combo, // 拖动 + 陀螺仪，仅柱面
}

impl ProjectionMode {
    pub const ALL: [ProjectionMode; 2] = [ProjectionMode::Cylindrical, ProjectionMode::Spherical];
}

impl ControlMode {
    pub const ALL: [ControlMode; 3] = [ControlMode::Touch, ControlMode::Motion, ControlMode::Combo];

    pub fn includes_touch(self) -> bool {
        matches!(self, ControlMode::Touch | ControlMode::Combo)
    }

    pub fn includes_motion(self) -> bool {
        matches!(self, ControlMode::Motion | ControlMode::Combo)
    }

    /// Combo is only defined for cylindrical panoramas.
    pub fn is_supported_with(self, projection: ProjectionMode) -> bool {
        !(self == ControlMode::Combo && projection == ProjectionMode::Spherical)
    }

    /// Whether pan gestures move the camera.
    ///
    /// Spherical + combo is unsupported: pan input is dropped and the
    /// panorama follows device motion only.
    pub fn accepts_pan(self, projection: ProjectionMode) -> bool {
        self.includes_touch() && self.is_supported_with(projection)
    }
}

impl fmt::Display for ProjectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectionMode::Cylindrical => write!(f, "cylindrical"),
            ProjectionMode::Spherical => write!(f, "spherical"),
        }
    }
}

impl fmt::Display for ControlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlMode::Touch => write!(f, "touch"),
            ControlMode::Motion => write!(f, "motion"),
            ControlMode::Combo => write!(f, "combo"),
        }
    }
}

impl FromStr for ProjectionMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProjectionMode::ALL
            .into_iter()
            .find(|m| m.to_string() == s)
            .ok_or_else(|| ConfigError::UnknownValue {
                key: "projection",
                value: s.to_string(),
            })
    }
}

impl FromStr for ControlMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ControlMode::ALL
            .into_iter()
            .find(|m| m.to_string() == s)
            .ok_or_else(|| ConfigError::UnknownValue {
                key: "control",
                value: s.to_string(),
            })
    }
}

pub struct PanoramaController {
    state: OrientationState,
    reporter: MovementReporter,
    touch: Option<TouchPanAdapter>,
    motion: Option<MotionAdapter>,
    inertia: DecelerationEngine,
    source: Box<dyn MotionSource>,
    pan_speed: Vec2,
    motion_interval: Duration,
    active: bool,
}

impl PanoramaController {
    pub fn new(config: &ViewerConfig, source: Box<dyn MotionSource>) -> Self {
        Self {
            state: OrientationState::new(config.projection, config.control, config.initial_offset()),
            reporter: MovementReporter::new(config.vertical_fov_deg),
            touch: None,
            motion: None,
            inertia: DecelerationEngine::new(config.deceleration),
            source,
            pan_speed: config.pan_speed(),
            motion_interval: config.motion_interval(),
            active: false,
        }
    }

    /// Creates the input adapters for the current control mode and starts
    /// motion sampling if needed.
    pub fn activate(&mut self) {
        self.active = true;
        self.state.reset();
        self.rebuild_adapters();
        self.reporter.report(&self.state, ReportCause::Reset);
    }

    /// Stops motion sampling and drops the adapters. Safe to call repeatedly.
    pub fn teardown(&mut self) {
        self.active = false;
        self.source.stop();
        self.touch = None;
        self.motion = None;
        self.inertia.cancel();
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn state(&self) -> &OrientationState {
        &self.state
    }

    pub fn camera(&self) -> CameraOrientation {
        self.state.camera()
    }

    pub fn projection(&self) -> ProjectionMode {
        self.state.projection()
    }

    pub fn control(&self) -> ControlMode {
        self.state.control()
    }

    pub fn last_report(&self) -> Option<MovementReport> {
        self.reporter.last()
    }

    pub fn reports(&self) -> u64 {
        self.reporter.reports()
    }

    pub fn field_of_view(&self) -> f32 {
        self.reporter.field_of_view()
    }

    /// Vertical field of view, degrees.
    pub fn vertical_fov(&self) -> f32 {
        self.reporter.vertical_fov()
    }

    pub fn is_panning(&self) -> bool {
        self.touch.as_ref().is_some_and(|t| t.is_panning())
    }

    pub fn is_gliding(&self) -> bool {
        self.inertia.is_active()
    }

    pub fn is_motion_active(&self) -> bool {
        self.motion.is_some() && self.source.is_active()
    }

    pub fn pan_speed(&self) -> Vec2 {
        self.pan_speed
    }

    pub fn set_compass(&mut self, compass: Option<Box<dyn CompassListener>>) {
        self.reporter.set_compass(compass);
    }

    pub fn set_movement_handler(&mut self, handler: Option<MovementHandler>) {
        self.reporter.set_handler(handler);
    }

    pub fn set_pan_speed(&mut self, pan_speed: Vec2) {
        self.pan_speed = pan_speed;
        if let Some(touch) = self.touch.as_mut() {
            touch.set_pan_speed(pan_speed);
        }
    }

    pub fn set_initial_offset(&mut self, offset: Vec3) {
        self.state.set_initial_offset(offset);
    }

    pub fn set_deceleration(&mut self, enabled: bool) {
        self.inertia.set_enabled(enabled);
    }

    pub fn set_vertical_fov(&mut self, degrees: f32) {
        self.reporter.set_vertical_fov(degrees);
        self.reporter.report(&self.state, ReportCause::Resize);
    }

    pub fn reset(&mut self) {
        self.inertia.cancel();
        self.state.reset();
        self.reporter.report(&self.state, ReportCause::Reset);
    }

    pub fn set_projection_mode(&mut self, projection: ProjectionMode) {
        if projection == self.state.projection() {
            return;
        }
        log::info!("projection: {} -> {}", self.state.projection(), projection);
        warn_if_unsupported(projection, self.state.control());
        self.inertia.cancel();
        self.state.set_projection(projection);
        self.reporter.report(&self.state, ReportCause::ProjectionChange);
    }

    pub fn set_control_mode(&mut self, control: ControlMode) {
        if control == self.state.control() {
            return;
        }
        log::info!("control: {} -> {}", self.state.control(), control);
        warn_if_unsupported(self.state.projection(), control);
        self.state.set_control(control);
        if self.active {
            self.rebuild_adapters();
        }
    }

    /// Uploads `image` for the current projection.
    pub fn load_panorama(&self, image: &RgbaImage, backend: &mut dyn RenderBackend) {
        backend.set_geometry_and_material(self.state.projection(), image);
    }

    /// Re-reads the backend viewport and refreshes listeners.
    pub fn sync_viewport(&mut self, backend: &dyn RenderBackend) {
        let (width, height) = backend.viewport();
        self.resize(width, height);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.reporter.set_viewport(width, height);
        self.reporter.report(&self.state, ReportCause::Resize);
    }

    pub fn handle_gesture(&mut self, event: GestureEvent) -> GestureOutcome {
        let Some(touch) = self.touch.as_mut() else {
            return GestureOutcome::Ignored;
        };
        let outcome = touch.handle(event, &mut self.state, &mut self.reporter);
        match outcome {
            GestureOutcome::Started => self.inertia.cancel(),
            GestureOutcome::Released { velocity, timestamp } => {
                self.inertia.release(velocity, timestamp)
            }
            GestureOutcome::Moved | GestureOutcome::Ignored => {}
        }
        outcome
    }

    /// Applies every pending motion sample. Returns how many were applied.
    ///
    /// A sensor error stops sampling. It is logged and retried only after a
    /// control-mode switch or re-activation.
    pub fn pump_motion(&mut self) -> usize {
        if self.motion.is_none() {
            return 0;
        }

        let mut applied = 0;
        while let Some(event) = self.source.poll() {
            match event {
                Ok(sample) => {
                    if let Some(adapter) = self.motion.as_mut() {
                        adapter.apply(&sample, &mut self.state, &mut self.reporter);
                    }
                    applied += 1;
                }
                Err(e) => {
                    log::error!("stopping device motion: {e}");
                    self.source.stop();
                    self.motion = None;
                    return applied;
                }
            }
        }
        applied
    }

    /// Advances per-frame physics to `timestamp` (seconds) and returns the
    /// orientation to render.
    pub fn advance_frame(&mut self, timestamp: f64) -> CameraOrientation {
        let panning = self.is_panning();
        let speed = match self.touch.as_ref() {
            Some(touch) => touch.effective_speed(self.state.projection()),
            None => Vec2::ZERO,
        };
        if self.inertia.step(timestamp, panning, speed, &mut self.state) {
            self.reporter.report(&self.state, ReportCause::Deceleration);
        }
        self.state.camera()
    }

    /// Frame callback: physics first, then the camera snapshot goes to the backend.
    pub fn render_frame(&mut self, timestamp: f64, backend: &mut dyn RenderBackend) {
        let camera = self.advance_frame(timestamp);
        backend.set_camera_orientation(camera);
    }

    fn rebuild_adapters(&mut self) {
        let control = self.state.control();

        if control.includes_touch() {
            if self.touch.is_none() {
                self.touch = Some(TouchPanAdapter::new(self.pan_speed));
            }
        } else {
            self.touch = None;
            self.inertia.cancel();
        }

        if control.includes_motion() {
            if self.motion.is_none() {
                self.start_motion();
            }
        } else {
            self.source.stop();
            self.motion = None;
        }
    }

    fn start_motion(&mut self) {
        if !self.source.is_available() {
            log::info!("device motion unavailable; {} control stays inert", self.state.control());
            return;
        }
        match self.source.start(self.motion_interval) {
            Ok(()) => {
                log::debug!("device motion started every {:?}", self.motion_interval);
                self.motion = Some(MotionAdapter::new());
            }
            Err(e) => log::warn!("device motion failed to start: {e}"),
        }
    }
}

impl Drop for PanoramaController {
    fn drop(&mut self) {
        self.source.stop();
    }
}

fn warn_if_unsupported(projection: ProjectionMode, control: ControlMode) {
    if !control.is_supported_with(projection) {
        log::warn!("{control} control is not supported for {projection} panoramas; pan input is ignored");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::ScriptedMotionSource;

    fn controller(projection: ProjectionMode, control: ControlMode) -> (PanoramaController, ScriptedMotionSource) {
        let config = ViewerConfig {
            projection,
            control,
            ..ViewerConfig::default()
        };
        let source = ScriptedMotionSource::new();
        (PanoramaController::new(&config, Box::new(source.clone())), source)
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("spherical".parse::<ProjectionMode>().unwrap(), ProjectionMode::Spherical);
        assert_eq!("combo".parse::<ControlMode>().unwrap(), ControlMode::Combo);
        assert!("gyro".parse::<ControlMode>().is_err());
    }

    #[test]
    fn test_accepts_pan() {
        assert!(ControlMode::Touch.accepts_pan(ProjectionMode::Spherical));
        assert!(ControlMode::Combo.accepts_pan(ProjectionMode::Cylindrical));
        assert!(!ControlMode::Combo.accepts_pan(ProjectionMode::Spherical));
        assert!(!ControlMode::Motion.accepts_pan(ProjectionMode::Cylindrical));
    }

    #[test]
    fn test_activation_starts_motion_for_motion_modes() {
        let (mut c, source) = controller(ProjectionMode::Cylindrical, ControlMode::Combo);
        c.activate();
        assert!(c.is_motion_active());
        assert_eq!(source.interval(), Some(Duration::from_millis(15)));
        assert_eq!(c.reports(), 1);
    }

    #[test]
    fn test_switching_away_from_motion_stops_source() {
        let (mut c, source) = controller(ProjectionMode::Cylindrical, ControlMode::Motion);
        c.activate();
        c.set_control_mode(ControlMode::Touch);
        assert!(!c.is_motion_active());
        assert_eq!(source.stop_count(), 1);

        c.teardown();
        c.teardown();
        assert_eq!(source.stop_count(), 1);
    }

    #[test]
    fn test_drop_stops_source() {
        let (mut c, source) = controller(ProjectionMode::Cylindrical, ControlMode::Motion);
        c.activate();
        drop(c);
        assert_eq!(source.stop_count(), 1);
    }

    #[test]
    fn test_gesture_before_activation_is_ignored() {
        let (mut c, _) = controller(ProjectionMode::Cylindrical, ControlMode::Touch);
        assert_eq!(c.handle_gesture(GestureEvent::Began), GestureOutcome::Ignored);
    }

    #[test]
    fn test_new_gesture_cancels_glide() {
        let (mut c, _) = controller(ProjectionMode::Cylindrical, ControlMode::Touch);
        c.activate();
        c.handle_gesture(GestureEvent::Began);
        c.handle_gesture(GestureEvent::Ended { velocity: Vec2::new(800.0, 0.0), timestamp: 0.0 });
        assert!(c.is_gliding());
        c.handle_gesture(GestureEvent::Began);
        assert!(!c.is_gliding());
    }

    #[test]
    fn test_projection_change_resets_and_reports() {
        let (mut c, _) = controller(ProjectionMode::Cylindrical, ControlMode::Touch);
        c.activate();
        c.handle_gesture(GestureEvent::Began);
        c.handle_gesture(GestureEvent::Changed { translation: Vec2::new(100.0, 0.0) });
        assert!(c.state().panning().y > 0.0);

        let before = c.reports();
        c.set_projection_mode(ProjectionMode::Spherical);
        assert_eq!(c.state().panning(), Vec3::ZERO);
        assert_eq!(c.reports(), before + 1);
    }
}
